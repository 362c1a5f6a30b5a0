pub mod auth;
pub mod events;
pub mod poll;
pub mod websocket;
