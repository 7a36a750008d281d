// Daily Aggregator: day-level baselines and per-entry advanced metrics.
//
// Everything here is a pure function of the day's started lineup entries, so
// recomputing a day overwrites the same values.

use rkl_core::model::daily::{DailyBaseline, EntryMetrics};
use rkl_core::model::date::GameDate;
use rkl_core::model::lineup::LineupEntry;
use rkl_core::store::{DocPath, StoreError, WriteBatch};

use crate::stats::{mean, median, pct_above, ratio, replacement_level, win_value};

/// A lineup entry together with the metrics computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedEntry {
    pub path: DocPath,
    pub entry: LineupEntry,
    pub metrics: EntryMetrics,
}

impl EnhancedEntry {
    pub fn points(&self) -> f64 {
        self.entry.points()
    }
}

/// The day's baseline and every contributing entry, enhanced.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub baseline: DailyBaseline,
    pub entries: Vec<EnhancedEntry>,
}

impl DailyAggregate {
    pub fn total_points(&self) -> f64 {
        self.entries.iter().map(EnhancedEntry::points).sum()
    }
}

/// Compute the day's baseline from its started entries. Entries without
/// adjusted points count as zero.
pub fn compute_baseline(date: GameDate, week: &str, entries: &[LineupEntry]) -> DailyBaseline {
    let points: Vec<f64> = entries.iter().map(LineupEntry::points).collect();
    let med = median(&points);
    DailyBaseline {
        date,
        week: week.to_string(),
        player_count: points.len() as u32,
        mean: mean(&points),
        median: med,
        replacement: replacement_level(med),
        win: win_value(med),
    }
}

/// Derived metrics for one entry against the day's baseline. Percentages
/// and the win-value score are 0 when their denominator is 0.
pub fn entry_metrics(points: f64, baseline: &DailyBaseline) -> EntryMetrics {
    let above_mean = points - baseline.mean;
    let above_median = points - baseline.median;
    EntryMetrics {
        above_mean,
        is_above_mean: above_mean > 0.0,
        pct_above_mean: pct_above(points, baseline.mean),
        above_median,
        is_above_median: above_median > 0.0,
        pct_above_median: pct_above(points, baseline.median),
        war: ratio(points - baseline.replacement, baseline.win),
    }
}

/// Run the aggregator over one day's entries. Entries that did not start are
/// dropped before anything is computed.
pub fn aggregate_day(
    date: GameDate,
    week: &str,
    entries: Vec<(DocPath, LineupEntry)>,
) -> DailyAggregate {
    let started: Vec<(DocPath, LineupEntry)> =
        entries.into_iter().filter(|(_, e)| e.started).collect();
    let plain: Vec<LineupEntry> = started.iter().map(|(_, e)| e.clone()).collect();
    let baseline = compute_baseline(date, week, &plain);

    let entries = started
        .into_iter()
        .map(|(path, entry)| {
            let metrics = entry_metrics(entry.points(), &baseline);
            EnhancedEntry {
                path,
                entry,
                metrics,
            }
        })
        .collect();

    DailyAggregate { baseline, entries }
}

/// Stage the baseline document (overwrite) and the per-entry metrics (merged
/// onto each lineup entry).
pub fn stage_writes(
    batch: &mut WriteBatch,
    baseline_path: DocPath,
    aggregate: &DailyAggregate,
) -> Result<(), StoreError> {
    batch.set(baseline_path, serde_json::to_value(&aggregate.baseline)?);
    for enhanced in &aggregate.entries {
        batch.merge(enhanced.path.clone(), serde_json::to_value(enhanced.metrics)?);
    }
    Ok(())
}
