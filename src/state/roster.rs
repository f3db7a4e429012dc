//! The session roster: registry plus message-routing primitives.
//!
//! One mutex guards the whole insertion-ordered table. Fan-out iterates the
//! table under that lock so broadcasts see a consistent snapshot while other
//! connection tasks add and remove sessions concurrently. Deliveries are
//! synchronous queue pushes, so the lock is never held across an await.

use crate::state::session::{Outbound, Session};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// In-memory table of active sessions, keyed by connection id.
#[derive(Debug, Default)]
pub struct Roster {
    sessions: Mutex<Vec<Session>>,
}

/// Resolve a duplex socket's pair of ports to the registry key.
///
/// The registry is keyed by the peer's ephemeral port. On a server-side
/// socket the local port is the listen port, so the peer port is the key; a
/// reverse half may report them the other way around, so prefer whichever
/// port is not the server's own.
pub fn resolve_conn_id(local_port: u16, peer_port: u16, listen_port: u16) -> u16 {
    if local_port == listen_port {
        peer_port
    } else {
        local_port
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. A generated placeholder name is assigned when no
    /// username is given; the handshake overwrites it on success.
    pub fn add(&self, conn_id: u16, outbound: mpsc::Sender<Outbound>, username: Option<String>) {
        info!(conn_id, "adding client");
        let mut sessions = self.sessions.lock();
        sessions.push(Session::new(conn_id, outbound, username));
    }

    /// Deregister a session. A no-op when the id is absent.
    pub fn remove(&self, conn_id: u16) {
        info!(conn_id, "removing client");
        let mut sessions = self.sessions.lock();
        sessions.retain(|s| s.conn_id() != conn_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    pub fn contains(&self, conn_id: u16) -> bool {
        self.sessions.lock().iter().any(|s| s.conn_id() == conn_id)
    }

    /// Find the session a socket belongs to, given its two endpoint ports.
    pub fn find_by_socket(
        &self,
        local_port: u16,
        peer_port: u16,
        listen_port: u16,
    ) -> Option<u16> {
        let conn_id = resolve_conn_id(local_port, peer_port, listen_port);
        self.contains(conn_id).then_some(conn_id)
    }

    /// Assign the authenticated username onto a session.
    pub fn set_username(&self, conn_id: u16, username: &str) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.iter_mut().find(|s| s.conn_id() == conn_id) {
            session.set_username(username);
        }
    }

    pub fn username_of(&self, conn_id: u16) -> Option<String> {
        self.sessions
            .lock()
            .iter()
            .find(|s| s.conn_id() == conn_id)
            .map(|s| s.username().to_string())
    }

    pub fn conn_id_of(&self, username: &str) -> Option<u16> {
        self.sessions
            .lock()
            .iter()
            .find(|s| s.username() == username)
            .map(Session::conn_id)
    }

    /// Usernames of all sessions, in insertion order.
    pub fn usernames(&self) -> Vec<String> {
        self.sessions
            .lock()
            .iter()
            .map(|s| s.username().to_string())
            .collect()
    }

    /// Write one line to a single session without routing it. Used for
    /// command replies and server notices to the issuer.
    pub fn send_to(&self, conn_id: u16, line: &str) -> bool {
        let sessions = self.sessions.lock();
        match sessions.iter().find(|s| s.conn_id() == conn_id) {
            Some(session) => session.deliver(line),
            None => false,
        }
    }

    /// Ask a session's connection task to close, from any task.
    pub fn close(&self, conn_id: u16) {
        let sessions = self.sessions.lock();
        if let Some(session) = sessions.iter().find(|s| s.conn_id() == conn_id) {
            session.close();
        }
    }

    /// Send `Announce: <text>` to every session, the sender included.
    pub fn broadcast(&self, text: &str) {
        let sessions = self.sessions.lock();
        for session in sessions.iter() {
            if !session.deliver(&format!("Announce: {text}")) {
                warn!(conn_id = session.conn_id(), "broadcast delivery failed");
            }
        }
        info!("[broadcast] {text}");
    }

    /// Send `<sender>: <text>` to every session except the sender's own.
    pub fn message(&self, text: &str, sender_id: u16, sender_name: &str) {
        let sessions = self.sessions.lock();
        for session in sessions.iter() {
            if session.conn_id() == sender_id {
                continue;
            }
            if !session.deliver(&format!("{sender_name}: {text}")) {
                warn!(conn_id = session.conn_id(), "message delivery failed");
            }
        }
        info!("[message] {sender_name}: {text}");
    }

    /// Send `<sender_label>: <text>` to exactly one session.
    pub fn private(&self, text: &str, sender_label: &str, recipient_id: u16) {
        let sessions = self.sessions.lock();
        let Some(recipient) = sessions.iter().find(|s| s.conn_id() == recipient_id) else {
            warn!(recipient_id, "private delivery to unknown session");
            return;
        };
        if !recipient.deliver(&format!("{sender_label}: {text}")) {
            warn!(conn_id = recipient_id, "private delivery failed");
        }
        info!(
            "[private] {sender_label} to {}: {text}",
            recipient.username()
        );
    }
}
