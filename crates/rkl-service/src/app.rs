// Application loop: decode trigger frames and run one pipeline invocation per
// game write event.
//
// Invocations run on the blocking pool since the store is synchronous. Events
// for different games run concurrently; the same-day gate and the idempotent
// folds keep the outcome independent of their interleaving.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use rkl_core::model::event::GameWriteEvent;
use rkl_core::naming::LeagueNaming;
use rkl_core::store::DocumentStore;
use rkl_stats::pipeline::{Outcome, Pipeline, PipelineError};

use crate::trigger_server::TriggerEvent;

/// Tally of what the loop handled before its channel closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Frames that were not a valid game write event.
    pub invalid: usize,
    pub ignored: usize,
    pub deferred: usize,
    pub aggregated: usize,
    /// Completed days that had no started lineups, plus excluded phases.
    pub skipped: usize,
    pub failed: usize,
}

impl RunStats {
    fn record(&mut self, result: Result<Outcome, PipelineError>) {
        match result {
            Ok(Outcome::Ignored) => self.ignored += 1,
            Ok(Outcome::Deferred { .. }) => self.deferred += 1,
            Ok(Outcome::Aggregated(_)) => self.aggregated += 1,
            Ok(Outcome::NoLineups | Outcome::Excluded) => self.skipped += 1,
            // Already logged with context by the pipeline.
            Err(_) => self.failed += 1,
        }
    }
}

pub fn decode_event(text: &str) -> Result<GameWriteEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Run until every sender is dropped and all in-flight invocations finish.
pub async fn run<S>(
    mut rx: mpsc::Receiver<TriggerEvent>,
    store: Arc<S>,
    naming: LeagueNaming,
) -> anyhow::Result<RunStats>
where
    S: DocumentStore + 'static,
{
    info!("application loop started");
    let mut stats = RunStats::default();
    let mut tasks: JoinSet<Result<Outcome, PipelineError>> = JoinSet::new();

    while let Some(event) = rx.recv().await {
        match event {
            TriggerEvent::Connected { addr } => info!("trigger source connected from {addr}"),
            TriggerEvent::Disconnected { addr } => info!("trigger source {addr} disconnected"),
            TriggerEvent::Message(text) => match decode_event(&text) {
                Ok(event) => {
                    debug!("game write for {} in season {}", event.game_id, event.season_id);
                    let store = Arc::clone(&store);
                    tasks.spawn_blocking(move || Pipeline::new(store.as_ref(), &naming).handle(&event));
                }
                Err(e) => {
                    warn!("dropping invalid trigger frame: {e}");
                    stats.invalid += 1;
                }
            },
        }

        while let Some(done) = tasks.try_join_next() {
            stats.record(done?);
        }
    }

    while let Some(done) = tasks.join_next().await {
        stats.record(done?);
    }

    info!("application loop finished: {stats:?}");
    if stats.failed > 0 {
        error!("{} invocations failed", stats.failed);
    }
    Ok(stats)
}
