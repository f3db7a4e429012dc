//! Per-connection session state.

use tokio::sync::mpsc;
use tracing::debug;

/// A message queued for a session's socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// One line of text, written newline-terminated.
    Line(String),
    /// Terminate the session: the connection task closes the socket.
    Close,
}

/// Server-side state for one connected, possibly-authenticated client.
///
/// The session's socket lives in its connection task; the roster holds this
/// handle, whose queue sender reaches that task even while its read is
/// blocked. The connection id is the peer's ephemeral port and never changes.
#[derive(Debug)]
pub struct Session {
    conn_id: u16,
    username: String,
    outbound: mpsc::Sender<Outbound>,
}

impl Session {
    pub(crate) fn new(
        conn_id: u16,
        outbound: mpsc::Sender<Outbound>,
        username: Option<String>,
    ) -> Self {
        let username = username.unwrap_or_else(|| generated_username(conn_id));
        Self {
            conn_id,
            username,
            outbound,
        }
    }

    pub fn conn_id(&self) -> u16 {
        self.conn_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn set_username(&mut self, username: &str) {
        self.username = username.to_string();
    }

    /// Queue one line for delivery. Fire-and-forget: a full or closed queue
    /// means the line is dropped and the failure reported to the caller.
    pub(crate) fn deliver(&self, line: &str) -> bool {
        match self.outbound.try_send(Outbound::Line(line.to_string())) {
            Ok(()) => true,
            Err(e) => {
                debug!(conn_id = self.conn_id, error = %e, "line dropped");
                false
            }
        }
    }

    /// Ask the connection task to close this session. Effective even while
    /// the task's socket read is pending.
    pub(crate) fn close(&self) {
        let _ = self.outbound.try_send(Outbound::Close);
    }
}

/// Placeholder name for a session the handshake never named: `chat` plus the
/// digits of the connection id after the first three.
fn generated_username(conn_id: u16) -> String {
    let id = conn_id.to_string();
    let tail = id.get(3..).unwrap_or("");
    format!("chat{tail}")
}
