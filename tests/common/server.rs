//! In-process test server.

use chatterd::auth::CredentialStore;
use chatterd::commands::Registry;
use chatterd::network::Gateway;
use chatterd::state::Roster;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A chatterd instance running inside the test process.
///
/// Running in-process keeps the roster inspectable, so tests can assert that
/// failed handshakes leave no residual session behind.
pub struct TestServer {
    addr: SocketAddr,
    pub roster: Arc<Roster>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a server with the built-in commands and the default handshake
    /// timeout.
    pub async fn spawn() -> Self {
        Self::spawn_with(Registry::new(), Duration::from_secs(2)).await
    }

    /// Spawn a server with a custom command registry and handshake timeout.
    pub async fn spawn_with(registry: Registry, auth_timeout: Duration) -> Self {
        let creds = CredentialStore::from_users([("alice", "p4s$w0rd!"), ("bob", "hunter2")]);
        let roster = Arc::new(Roster::new());

        let gateway = Gateway::bind(
            "127.0.0.1:0".parse().expect("loopback address"),
            Arc::clone(&roster),
            Arc::new(registry),
            Arc::new(creds),
            auth_timeout,
        )
        .await
        .expect("bind test gateway");

        let addr = gateway.local_addr().expect("local address");
        let handle = tokio::spawn(async move {
            let _ = gateway.run().await;
        });

        Self {
            addr,
            roster,
            handle,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
