pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod websocket;

pub use config::ChannelConfig;
pub use error::ChannelError;
pub use models::events::ChannelState;
pub use models::poll::{Poll, PollOption};
pub use models::websocket::UpdateEvent;
pub use websocket::{PollChannel, SubscriptionId};
