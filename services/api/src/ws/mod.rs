//! WebSocket Streaming Proxies
//!
//! - `endpoint`: adapts an accepted browser WebSocket into a relay `Connection`.
//! - `proxy`: the upgrade handler that pairs each browser socket with a fresh
//!   upstream connection.

mod endpoint;
mod proxy;

pub use endpoint::client_connection;
pub use proxy::stream_handler;
