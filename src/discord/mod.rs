//! Notification Dispatcher and the Discord channel behind it.

pub mod backend;
pub mod connection;
pub mod dispatcher;
pub mod errors;

pub use backend::{ChatBackend, DiscordBackend};
pub use connection::ChannelConnection;
pub use dispatcher::Dispatcher;
