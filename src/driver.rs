//! Driver runs a session on its own task

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::latency::Clock;
use crate::render::{RenderEvent, WatchSink};
use crate::session::{ReceiverSession, SessionSummary};
use crate::transport::Transport;

/// Result of spawning a session task
pub struct DriverChannels {
    /// Latest render event, `None` until the first fix is decoded
    pub events: watch::Receiver<Option<Arc<RenderEvent>>>,
    /// Cancellation token for stopping the session early
    pub cancel: CancellationToken,
    /// Resolves to the summary, or `None` when cancelled
    pub task: JoinHandle<Option<SessionSummary>>,
}

/// Spawns a session task that publishes render events on a watch channel.
///
/// The session itself still processes every frame in order. Only observers
/// of the channel may skip events, seeing the newest one when they look.
pub struct Driver;

impl Driver {
    /// Spawn `session` over `transport`.
    pub fn spawn<T, C>(session: ReceiverSession<C>, transport: T) -> DriverChannels
    where
        T: Transport,
        C: Clock + 'static,
    {
        let (event_tx, event_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        let task = tokio::spawn(async move {
            let mut sink = WatchSink::new(event_tx);
            tokio::select! {
                _ = cancel_task.cancelled() => {
                    info!("Session task cancelled");
                    None
                }
                summary = session.run(transport, &mut sink) => Some(summary),
            }
        });

        DriverChannels { events: event_rx, cancel, task }
    }
}
