//! Network layer: accept loop and per-connection session handling.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;
