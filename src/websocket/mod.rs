//! Per-poll realtime channel. `connect` and `disconnect` bump a generation
//! counter that the background task checks before every transition.

pub mod heartbeat;
pub mod reconnect;
pub mod subscribers;

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message;

use crate::config::ChannelConfig;
use crate::connection::{self, SessionEnd};
use crate::error::ChannelError;
use crate::models::events::ChannelState;
use crate::models::poll::Poll;

pub use heartbeat::Heartbeat;
pub use reconnect::ReconnectPolicy;
pub use subscribers::{Subscribers, SubscriptionId};

#[derive(Debug, Clone)]
struct Target {
    poll_id: i64,
    credential: String,
}

struct WsHandle {
    shutdown_tx: oneshot::Sender<()>,
}

impl WsHandle {
    fn shutdown(self) {
        info!("Shutting down WebSocket");
        let _ = self.shutdown_tx.send(());
    }
}

struct Inner {
    target: Option<Target>,
    generation: u64,
    policy: ReconnectPolicy,
    heartbeat: Option<Heartbeat>,
    ws_handle: Option<WsHandle>,
}

struct Shared {
    config: ChannelConfig,
    inner: Mutex<Inner>,
    subscribers: Subscribers,
    state_tx: watch::Sender<ChannelState>,
}

pub struct PollChannel {
    shared: Arc<Shared>,
}

impl PollChannel {
    pub fn new(config: ChannelConfig) -> Self {
        let policy =
            ReconnectPolicy::new(config.reconnect_base_delay, config.max_reconnect_attempts);
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);

        Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(Inner {
                    target: None,
                    generation: 0,
                    policy,
                    heartbeat: None,
                    ws_handle: None,
                }),
                subscribers: Subscribers::new(),
                state_tx,
            }),
        }
    }

    // Replaces any existing connection; subscribers are kept.
    pub fn connect(&self, poll_id: i64, credential: &str) -> Result<(), ChannelError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;

        let previous = {
            let mut inner = self.shared.inner.lock();
            inner.generation += 1;
            inner.target = Some(Target {
                poll_id,
                credential: credential.to_owned(),
            });
            inner.policy.reset();
            if let Some(mut heartbeat) = inner.heartbeat.take() {
                heartbeat.stop();
            }

            let generation = inner.generation;
            let (shutdown_tx, shutdown_rx) = oneshot::channel();
            runtime.spawn(run_channel(
                Arc::clone(&self.shared),
                generation,
                shutdown_rx,
            ));
            self.shared.state_tx.send_replace(ChannelState::Connecting);

            inner.ws_handle.replace(WsHandle { shutdown_tx })
        };

        if let Some(handle) = previous {
            info!("Replacing existing realtime connection");
            handle.shutdown();
        }
        info!("Connecting to realtime updates for poll {}", poll_id);
        Ok(())
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Poll) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.unsubscribe(id)
    }

    pub fn disconnect(&self) {
        let handle = {
            let mut inner = self.shared.inner.lock();
            if let Some(mut heartbeat) = inner.heartbeat.take() {
                heartbeat.stop();
            }
            if inner.target.take().is_some() {
                inner.generation += 1;
                info!("Disconnecting realtime channel");
            }
            inner.policy.reset();
            self.shared.state_tx.send_replace(ChannelState::Disconnected);
            inner.ws_handle.take()
        };

        if let Some(handle) = handle {
            handle.shutdown();
        }
        self.shared.subscribers.clear();
    }

    pub fn state(&self) -> ChannelState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state_tx.subscribe()
    }

    pub fn poll_id(&self) -> Option<i64> {
        self.shared.inner.lock().target.as_ref().map(|t| t.poll_id)
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.inner.lock().policy.attempts()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }
}

impl Drop for PollChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Shared {
    fn current_target(&self, generation: u64) -> Option<Target> {
        let inner = self.inner.lock();
        if inner.generation != generation {
            return None;
        }
        let target = inner.target.clone()?;
        self.state_tx.send_replace(ChannelState::Connecting);
        Some(target)
    }

    fn mark_open(&self, generation: u64, outbound: mpsc::UnboundedSender<Message>) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.target.is_none() {
            return false;
        }
        inner.policy.reset();
        if let Some(mut stale) = inner.heartbeat.replace(Heartbeat::start(
            self.config.heartbeat_interval,
            outbound,
        )) {
            stale.stop();
        }
        self.state_tx.send_replace(ChannelState::Connected);
        true
    }

    fn stop_heartbeat(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            if let Some(mut heartbeat) = inner.heartbeat.take() {
                heartbeat.stop();
            }
        }
    }

    // None means the task should exit.
    fn schedule_retry(&self, generation: u64) -> Option<Duration> {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.target.is_none() {
            return None;
        }

        match inner.policy.next_delay() {
            Some(delay) => {
                let attempt = inner.policy.attempts();
                warn!(
                    "Reconnecting in {}ms (attempt {})",
                    delay.as_millis(),
                    attempt
                );
                self.state_tx
                    .send_replace(ChannelState::PendingRetry { attempt, delay });
                Some(delay)
            }
            None => {
                warn!(
                    "Giving up on realtime updates after {} reconnect attempts",
                    inner.policy.attempts()
                );
                self.state_tx.send_replace(ChannelState::Exhausted);
                None
            }
        }
    }
}

async fn run_channel(
    shared: Arc<Shared>,
    generation: u64,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        let Some(target) = shared.current_target(generation) else {
            break;
        };
        let url =
            connection::endpoint_url(&shared.config.endpoint, target.poll_id, &target.credential);

        let opened = tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            result = connection::open(&url) => result,
        };

        let end = match opened {
            Ok(ws_stream) => {
                let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                if !shared.mark_open(generation, outbound_tx) {
                    break;
                }
                info!("WebSocket connected to poll {}", target.poll_id);

                let end =
                    connection::run_session(ws_stream, outbound_rx, &mut shutdown_rx, |event| {
                        shared.subscribers.dispatch(event.poll());
                    })
                    .await;

                shared.stop_heartbeat(generation);
                info!("WebSocket disconnected from poll {}", target.poll_id);
                end
            }
            Err(e) => {
                warn!("Failed to connect to poll {}: {}", target.poll_id, e);
                SessionEnd::Closed
            }
        };

        if end == SessionEnd::Shutdown {
            break;
        }

        let Some(delay) = shared.schedule_retry(generation) else {
            break;
        };

        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
