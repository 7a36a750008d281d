// Document store abstraction: paths, batched writes, and the store trait.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode document {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },

    #[error("fold on {path} failed: {message}")]
    Fold { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Paths and documents
// ---------------------------------------------------------------------------

/// Full address of one document: its collection path and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        DocPath {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document returned from a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub data: Value,
}

impl Document {
    pub fn id(&self) -> &str {
        &self.path.id
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        decode(&self.path, self.data.clone())
    }
}

/// Decode a raw document value, attaching the path to any error.
pub fn decode<T: DeserializeOwned>(path: &DocPath, data: Value) -> Result<T, StoreError> {
    serde_json::from_value(data).map_err(|source| StoreError::Decode {
        path: path.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Write batches
// ---------------------------------------------------------------------------

/// Read-modify-write step run inside the commit transaction. Receives the
/// current document (if any) and returns a patch that is merged into it.
pub type FoldFn = Box<dyn FnOnce(Option<&Value>) -> Result<Value, StoreError> + Send>;

pub enum WriteOp {
    /// Replace the whole document.
    Set { path: DocPath, data: Value },
    /// Deep-merge `data` into the document, creating it if missing.
    Merge { path: DocPath, data: Value },
    Fold { path: DocPath, fold: FoldFn },
}

impl WriteOp {
    pub fn path(&self) -> &DocPath {
        match self {
            WriteOp::Set { path, .. }
            | WriteOp::Merge { path, .. }
            | WriteOp::Fold { path, .. } => path,
        }
    }

    /// Produce the document that results from applying this op to `current`.
    pub fn apply(self, current: Option<Value>) -> Result<Value, StoreError> {
        match self {
            WriteOp::Set { data, .. } => Ok(data),
            WriteOp::Merge { data, .. } => {
                let mut doc = current.unwrap_or_else(|| Value::Object(Map::new()));
                merge_json(&mut doc, data);
                Ok(doc)
            }
            WriteOp::Fold { fold, .. } => {
                let patch = fold(current.as_ref())?;
                let mut doc = current.unwrap_or_else(|| Value::Object(Map::new()));
                merge_json(&mut doc, patch);
                Ok(doc)
            }
        }
    }
}

impl fmt::Debug for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Set { path, .. } => write!(f, "Set({path})"),
            WriteOp::Merge { path, .. } => write!(f, "Merge({path})"),
            WriteOp::Fold { path, .. } => write!(f, "Fold({path})"),
        }
    }
}

/// Writes staged for one atomic commit.
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocPath, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Set { path, data });
        self
    }

    pub fn merge(&mut self, path: DocPath, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Merge { path, data });
        self
    }

    pub fn fold<F>(&mut self, path: DocPath, fold: F) -> &mut Self
    where
        F: FnOnce(Option<&Value>) -> Result<Value, StoreError> + Send + 'static,
    {
        self.ops.push(WriteOp::Fold {
            path,
            fold: Box::new(fold),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// A document database with equality queries and atomic batch commits.
pub trait DocumentStore: Send + Sync {
    fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError>;

    /// All documents in `collection` whose top-level fields equal every
    /// `(field, value)` filter.
    fn query(&self, collection: &str, filters: &[(&str, Value)]) -> Result<Vec<Document>, StoreError>;

    /// Apply every op in order, all or nothing. Returns the number of ops
    /// applied.
    fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError>;
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Deep-merge `patch` into `target`. Objects merge key by key; any other
/// value replaces what was there.
pub fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                let nested = value.is_object() && dst.get(&key).is_some_and(Value::is_object);
                match dst.get_mut(&key) {
                    Some(existing) if nested => merge_json(existing, value),
                    _ => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Whether `doc` matches every equality filter.
pub fn matches_filters(doc: &Value, filters: &[(&str, Value)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| doc.get(field).is_some_and(|v| json_eq(v, expected)))
}

/// Equality that treats integer and float encodings of the same number as
/// equal.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
