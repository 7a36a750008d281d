// Seasonal folds: player stats, team records, and season counters.
//
// Each fold runs inside the batch commit and keys its contribution by day (or
// game), replacing any earlier contribution for the same key. Folding the same
// day twice therefore leaves totals unchanged, and days can fold in any order.

pub mod player;
pub mod season;
pub mod team;

use rkl_core::model::date::GameDate;
use rkl_core::model::game::Phase;

/// Ledger key for one day of one phase, e.g. `reg:2025-03-15`.
pub fn day_key(phase: Phase, date: GameDate) -> String {
    format!("{}:{}", phase.slug(), date.key())
}
