//! Shared test harness: in-process server plus a line-protocol client.

#![allow(dead_code)]

pub mod client;
pub mod server;

pub use client::TestClient;
pub use server::TestServer;

use chatterd::state::Roster;
use std::time::Duration;

/// Poll until the roster reaches the expected size or give up loudly.
pub async fn wait_for_sessions(roster: &Roster, expected: usize) {
    for _ in 0..100 {
        if roster.len() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "roster never reached {} sessions (currently {})",
        expected,
        roster.len()
    );
}
