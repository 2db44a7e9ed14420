pub mod connection;
pub mod hub;
pub mod messages;
pub mod server;

pub use hub::{BroadcastHub, HubConfig, HubHandle, OrderUpdate, Topic};
pub use messages::{ClientMessage, WsEnvelope, WILDCARD_TOPIC};
pub use server::WebSocketServer;
