// Replay of recorded game write events, one JSON object per line.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use crate::source::EventSource;
use crate::trigger_server::TriggerEvent;

pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: PathBuf) -> Self {
        ReplaySource { path }
    }
}

#[async_trait]
impl EventSource for ReplaySource {
    fn describe(&self) -> String {
        format!("replay of {}", self.path.display())
    }

    async fn run(self: Box<Self>, tx: mpsc::Sender<TriggerEvent>) -> anyhow::Result<()> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .with_context(|| format!("failed to open replay file {}", self.path.display()))?;
        let sent = replay_lines(BufReader::new(file), &tx).await?;
        info!("replayed {sent} events from {}", self.path.display());
        Ok(())
    }
}

/// Send every non-blank line as one event. Lines starting with `#` are
/// comments. Stops early if the receiver is gone.
pub async fn replay_lines<R>(reader: R, tx: &mpsc::Sender<TriggerEvent>) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if tx.send(TriggerEvent::Message(line.to_string())).await.is_err() {
            break;
        }
        sent += 1;
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_blank_and_comment_lines() {
        let input = "# 3/15 slate\n{\"game_id\":\"g1\"}\n\n   \n{\"game_id\":\"g2\"}\n";
        let (tx, mut rx) = mpsc::channel(8);

        let sent = replay_lines(input.as_bytes(), &tx).await.unwrap();
        assert_eq!(sent, 2);
        assert_eq!(
            rx.recv().await.unwrap(),
            TriggerEvent::Message("{\"game_id\":\"g1\"}".into())
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            TriggerEvent::Message("{\"game_id\":\"g2\"}".into())
        );
    }

    #[tokio::test]
    async fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let sent = replay_lines("a\nb\n".as_bytes(), &tx).await.unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let (tx, _rx) = mpsc::channel(8);
        let source = Box::new(ReplaySource::new(PathBuf::from("/nonexistent/events.jsonl")));
        let err = source.run(tx).await.unwrap_err();
        assert!(err.to_string().contains("failed to open replay file"));
    }
}
