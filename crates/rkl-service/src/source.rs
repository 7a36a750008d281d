// Where trigger events come from: a live WebSocket listener or a recorded
// JSON-lines file.

use async_trait::async_trait;
use tokio::sync::mpsc;

use rkl_core::config::Config;

use crate::replay::ReplaySource;
use crate::trigger_server::{self, TriggerEvent};

#[async_trait]
pub trait EventSource: Send {
    fn describe(&self) -> String;

    /// Feed events into `tx` until the source is exhausted. Returning drops
    /// the sender, which lets the application loop drain and stop.
    async fn run(self: Box<Self>, tx: mpsc::Sender<TriggerEvent>) -> anyhow::Result<()>;
}

pub struct WebSocketSource {
    pub port: u16,
}

#[async_trait]
impl EventSource for WebSocketSource {
    fn describe(&self) -> String {
        format!("WebSocket listener on 127.0.0.1:{}", self.port)
    }

    async fn run(self: Box<Self>, tx: mpsc::Sender<TriggerEvent>) -> anyhow::Result<()> {
        trigger_server::run(self.port, tx).await
    }
}

/// A replay file takes precedence over the listener.
pub fn from_config(config: &Config) -> Box<dyn EventSource> {
    match &config.replay_path {
        Some(path) => Box::new(ReplaySource::new(path.clone())),
        None => Box::new(WebSocketSource {
            port: config.listener_port,
        }),
    }
}
