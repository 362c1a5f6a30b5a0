use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

use crate::config::DEFAULT_HEARTBEAT_INTERVAL;
use crate::models::websocket::HEARTBEAT;

/// Periodic `"ping"` sender for one open connection.
pub struct Heartbeat {
    task: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// The first heartbeat is sent one full `period` after start.
    pub fn start(period: Duration, outbound: UnboundedSender<Message>) -> Self {
        let period = if period.is_zero() {
            warn!(
                "Heartbeat period must be non-zero, using {}s",
                DEFAULT_HEARTBEAT_INTERVAL.as_secs()
            );
            DEFAULT_HEARTBEAT_INTERVAL
        } else {
            period
        };

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if outbound.send(Message::text(HEARTBEAT)).is_err() {
                    break;
                }
                debug!("Heartbeat sent");
            }
        });

        Self { task: Some(task) }
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Heartbeat stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn sends_ping_every_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let _heartbeat = Heartbeat::start(Duration::from_secs(30), tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first, Message::text("ping"));
        assert!(start.elapsed() >= Duration::from_secs(30));

        rx.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_sent_before_first_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _heartbeat = Heartbeat::start(Duration::from_secs(30), tx);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_uses_default_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let heartbeat = Heartbeat::start(Duration::ZERO, tx);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(heartbeat.is_running());
        assert!(rx.try_recv().is_err());

        assert_eq!(rx.recv().await, Some(Message::text("ping")));
        assert!(start.elapsed() >= DEFAULT_HEARTBEAT_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_final() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut heartbeat = Heartbeat::start(Duration::from_secs(30), tx);
        assert!(heartbeat.is_running());

        heartbeat.stop();
        heartbeat.stop();
        assert!(!heartbeat.is_running());

        // The aborted task drops its sender, so the queue closes without a ping.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_connection_queue_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let heartbeat = Heartbeat::start(Duration::from_secs(1), tx);
        drop(rx);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!heartbeat.is_running());
    }
}
