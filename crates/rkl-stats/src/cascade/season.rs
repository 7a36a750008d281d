// Season counters: games played, season karma, and the week pointer.

use serde_json::{json, Value};

use rkl_core::model::season::{Season, SeasonDay};
use rkl_core::store::{DocPath, StoreError, WriteBatch};

/// Apply one day's contribution to the season document. A day already in
/// `processed_days` contributes only the difference from what it added
/// before. `week` raises `current_week` when it is larger.
pub fn fold_season(
    existing: Option<&Value>,
    key: &str,
    day: SeasonDay,
    week: Option<u32>,
) -> Result<Value, StoreError> {
    let season: Season = match existing {
        Some(doc) => serde_json::from_value(doc.clone()).map_err(|e| StoreError::Fold {
            path: "season".to_string(),
            message: e.to_string(),
        })?,
        None => Season::default(),
    };
    let previous = season.processed_days.get(key).copied().unwrap_or_default();

    let gp = (season.gp + day.gp).saturating_sub(previous.gp);
    let season_karma = season.season_karma + day.karma - previous.karma;
    let current_week = week.map_or(season.current_week, |w| w.max(season.current_week));

    Ok(json!({
        "gp": gp,
        "season_karma": season_karma,
        "current_week": current_week,
        "processed_days": { key: day },
    }))
}

/// Stage the season fold.
pub fn stage_writes(batch: &mut WriteBatch, season: DocPath, key: String, day: SeasonDay, week: Option<u32>) {
    batch.fold(season, move |existing| fold_season(existing, &key, day, week));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkl_core::store::merge_json;

    fn apply(doc: &mut Value, key: &str, gp: u32, karma: f64, week: Option<u32>) {
        let patch = fold_season(Some(doc), key, SeasonDay { gp, karma }, week).unwrap();
        merge_json(doc, patch);
    }

    #[test]
    fn counters_grow_by_each_day() {
        let mut doc = json!({"gp": 0, "gs": 48, "season_karma": 0.0, "current_week": 1});
        apply(&mut doc, "reg:2025-03-15", 2, 150.0, Some(3));
        apply(&mut doc, "reg:2025-03-16", 3, 50.0, Some(3));
        assert_eq!(doc["gp"], json!(5));
        assert_eq!(doc["season_karma"].as_f64(), Some(200.0));
        assert_eq!(doc["current_week"], json!(3));
        assert_eq!(doc["gs"], json!(48));
    }

    #[test]
    fn reprocessing_a_day_applies_only_the_difference() {
        let mut doc = json!({"gp": 10, "season_karma": 1000.0});
        apply(&mut doc, "reg:2025-03-15", 2, 150.0, None);
        let snapshot = doc.clone();
        apply(&mut doc, "reg:2025-03-15", 2, 150.0, None);
        assert_eq!(doc, snapshot);

        // A corrected day moves totals by the correction only.
        apply(&mut doc, "reg:2025-03-15", 2, 175.0, None);
        assert_eq!(doc["gp"], json!(12));
        assert_eq!(doc["season_karma"].as_f64(), Some(1175.0));
    }

    #[test]
    fn week_pointer_never_moves_backwards() {
        let mut doc = json!({"current_week": 5});
        apply(&mut doc, "reg:2025-03-01", 1, 1.0, Some(2));
        assert_eq!(doc["current_week"], json!(5));
        apply(&mut doc, "post:2025-04-01", 1, 1.0, None);
        assert_eq!(doc["current_week"], json!(5));
    }

    #[test]
    fn missing_season_starts_from_zero() {
        let patch = fold_season(None, "reg:2025-03-15", SeasonDay { gp: 2, karma: 30.0 }, Some(1)).unwrap();
        assert_eq!(patch["gp"], json!(2));
        assert_eq!(patch["processed_days"]["reg:2025-03-15"]["gp"], json!(2));
    }
}
