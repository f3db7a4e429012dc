//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds one socket and spawns a Connection task per accepted
//! client.

use crate::auth::CredentialStore;
use crate::commands::Registry;
use crate::network::Connection;
use crate::state::{Roster, resolve_conn_id};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// Accepts incoming TCP connections and spawns session handlers.
pub struct Gateway {
    listener: TcpListener,
    roster: Arc<Roster>,
    registry: Arc<Registry>,
    creds: Arc<CredentialStore>,
    auth_timeout: Duration,
}

impl Gateway {
    /// Bind the gateway to the given address.
    pub async fn bind(
        addr: SocketAddr,
        roster: Arc<Roster>,
        registry: Arc<Registry>,
        creds: Arc<CredentialStore>,
        auth_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listener bound");
        Ok(Self {
            listener,
            roster,
            registry,
            creds,
            auth_timeout,
        })
    }

    /// The address the gateway actually listens on (useful with port 0).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        let listen_port = self.listener.local_addr()?.port();
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let local = stream.local_addr()?;
                    // Sessions are keyed by the peer's ephemeral port.
                    let conn_id = resolve_conn_id(local.port(), peer.port(), listen_port);
                    info!(%peer, conn_id, "connection accepted");

                    let connection = Connection::new(
                        conn_id,
                        stream,
                        peer,
                        Arc::clone(&self.roster),
                        Arc::clone(&self.registry),
                        Arc::clone(&self.creds),
                        self.auth_timeout,
                    );
                    tokio::spawn(async move {
                        connection.run().await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
