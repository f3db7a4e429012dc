//! Line-protocol test client.

use chatterd::auth::salted_response;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// A test client speaking the newline-terminated wire protocol.
pub struct TestClient {
    framed: Framed<TcpStream, LinesCodec>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect to server");
        Self {
            framed: Framed::new(stream, LinesCodec::new()),
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.framed
            .send(line.to_string())
            .await
            .expect("send line");
    }

    /// Receive one line, panicking on timeout or a closed connection.
    pub async fn recv(&mut self) -> String {
        self.try_recv()
            .await
            .expect("timed out waiting for a line")
            .expect("connection closed while expecting a line")
    }

    /// Receive one line within the timeout. `Ok(None)` means the server
    /// closed the connection; `Err(())` means nothing arrived in time.
    pub async fn try_recv(&mut self) -> Result<Option<String>, ()> {
        match timeout(RECV_TIMEOUT, self.framed.next()).await {
            Ok(Some(Ok(line))) => Ok(Some(line)),
            Ok(Some(Err(_))) | Ok(None) => Ok(None),
            Err(_) => Err(()),
        }
    }

    /// Assert the connection is closed (EOF within the timeout).
    pub async fn expect_closed(&mut self) {
        match self.try_recv().await {
            Ok(None) => {}
            Ok(Some(line)) => panic!("expected closed connection, got line: {line}"),
            Err(()) => panic!("expected closed connection, got silence"),
        }
    }

    /// Assert that no line arrives within the given window.
    pub async fn expect_silence(&mut self, window: Duration) {
        match timeout(window, self.framed.next()).await {
            Err(_) => {}
            Ok(Some(Ok(line))) => panic!("expected silence, got line: {line}"),
            Ok(_) => panic!("expected silence, connection closed"),
        }
    }

    /// Run the challenge-response handshake and return the verdict line.
    pub async fn handshake(&mut self, username: &str, password: &str) -> String {
        self.send(username).await;
        let authkey = self.recv().await;
        self.send(&salted_response(&authkey, password)).await;
        self.recv().await
    }

    /// Authenticate and consume the welcome line, panicking on denial.
    pub async fn login(&mut self, username: &str, password: &str) -> String {
        let verdict = self.handshake(username, password).await;
        assert_eq!(verdict, "AUTHORIZED", "login as {username} denied");
        self.recv().await
    }
}
