//! chatterd - a line-oriented chat daemon.
//!
//! One async server accepts many concurrent TCP connections, authenticates
//! each via a challenge-response handshake, and routes newline-terminated
//! text among connected clients: broadcast, room-wide chat, private delivery,
//! and slash-commands.

pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod network;
pub mod state;
