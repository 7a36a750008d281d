// The season document and its per-day counter ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What one processed game day added to the season counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonDay {
    pub gp: u32,
    pub karma: f64,
}

/// Top-level season container. Only the counters this service maintains are
/// modeled; other fields written by season scaffolding are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Season {
    #[serde(default)]
    pub current_week: u32,
    /// Games played.
    #[serde(default)]
    pub gp: u32,
    /// Games scheduled.
    #[serde(default)]
    pub gs: u32,
    #[serde(default)]
    pub season_karma: f64,
    /// Contribution already applied for each processed day, keyed by
    /// `{phase}:{date}`.
    #[serde(default)]
    pub processed_days: BTreeMap<String, SeasonDay>,
}
