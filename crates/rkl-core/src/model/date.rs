// Calendar dates as they appear on game and lineup documents ("3/15/2025").

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format used when writing dates back onto documents.
const DISPLAY_FORMAT: &str = "%-m/%-d/%Y";

/// Formats accepted when reading a date string, tried in order.
const PARSE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// A game day. Serialized as `M/D/YYYY`, the shape the schedule sync writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameDate(NaiveDate);

impl GameDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(GameDate)
    }

    /// Whether `doc[field]` names this day in any accepted date format.
    /// Stored dates are not normalized, so equality on the raw string would
    /// miss `03/15/2025` or `2025-03-15` when looking for `3/15/2025`.
    pub fn matches_field(&self, doc: &serde_json::Value, field: &str) -> bool {
        doc.get(field)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<GameDate>().ok())
            .is_some_and(|d| d == *self)
    }

    /// Document-id form of the date (`2025-03-15`). Slashes are not usable
    /// in document ids.
    pub fn key(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DISPLAY_FORMAT))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized date `{0}` (expected M/D/YYYY)")]
pub struct DateParseError(String);

impl FromStr for GameDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PARSE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .map(GameDate)
            .ok_or_else(|| DateParseError(s.to_string()))
    }
}

impl Serialize for GameDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
