use std::time::Duration;

/// Observable state of a realtime channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// The connection dropped and a retry is scheduled after `delay`.
    PendingRetry { attempt: u32, delay: Duration },
    /// Every retry failed. The channel stays idle until it is connected again.
    Exhausted,
}

impl ChannelState {
    /// True when no connection is open and none will be attempted.
    pub fn is_inert(&self) -> bool {
        matches!(self, ChannelState::Disconnected | ChannelState::Exhausted)
    }
}
