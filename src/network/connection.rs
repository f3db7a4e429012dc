//! Connection - handles an individual client session.
//!
//! Each Connection runs in its own Tokio task, in two phases:
//!
//! 1. Handshake: sequential challenge-response reads and writes under a
//!    hard deadline.
//! 2. Active loop: `tokio::select!` over inbound lines and the session's
//!    outbound queue, so routed messages flow out while a read is pending
//!    and a queued `Close` terminates the session promptly.

use crate::auth::{self, CredentialStore};
use crate::commands::{Context, HandlerError, Registry, parse_command};
use crate::error::HandshakeError;
use crate::state::{Outbound, Roster};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{info, instrument, warn};

const MAX_LINE_LENGTH: usize = 4096;
const OUTBOUND_QUEUE_SIZE: usize = 64;

type Reader = FramedRead<OwnedReadHalf, LinesCodec>;
type Writer = FramedWrite<OwnedWriteHalf, LinesCodec>;

/// A client session handler.
pub struct Connection {
    conn_id: u16,
    peer: SocketAddr,
    stream: TcpStream,
    roster: Arc<Roster>,
    registry: Arc<Registry>,
    creds: Arc<CredentialStore>,
    auth_timeout: Duration,
}

impl Connection {
    pub fn new(
        conn_id: u16,
        stream: TcpStream,
        peer: SocketAddr,
        roster: Arc<Roster>,
        registry: Arc<Registry>,
        creds: Arc<CredentialStore>,
        auth_timeout: Duration,
    ) -> Self {
        Self {
            conn_id,
            peer,
            stream,
            roster,
            registry,
            creds,
            auth_timeout,
        }
    }

    /// Run the session to completion: Connecting, Authenticating, Active,
    /// Closing.
    #[instrument(skip(self), fields(conn_id = self.conn_id, peer = %self.peer), name = "session")]
    pub async fn run(self) {
        let Self {
            conn_id,
            peer: _,
            stream,
            roster,
            registry,
            creds,
            auth_timeout,
        } = self;

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(
            read_half,
            LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        );
        let mut writer = FramedWrite::new(
            write_half,
            LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        );
        let (outbound_tx, mut outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);

        // Connecting: register before the handshake, under a placeholder
        // name until authentication assigns the real one.
        roster.add(conn_id, outbound_tx, None);
        info!("client connected");

        serve(
            conn_id,
            &roster,
            &registry,
            &creds,
            auth_timeout,
            &mut reader,
            &mut writer,
            &mut outbound_rx,
        )
        .await;

        // Closing: deregister exactly once, whichever event ended the
        // session. The socket closes when the framed halves drop.
        roster.remove(conn_id);
        info!("session closed");
    }
}

#[allow(clippy::too_many_arguments)]
async fn serve(
    conn_id: u16,
    roster: &Arc<Roster>,
    registry: &Arc<Registry>,
    creds: &CredentialStore,
    auth_timeout: Duration,
    reader: &mut Reader,
    writer: &mut Writer,
    outbound_rx: &mut mpsc::Receiver<Outbound>,
) {
    // Authenticating. The deadline covers the whole exchange; a denial is
    // sent on every failure path, including the deadline firing while a
    // read is still pending.
    let verdict = timeout(auth_timeout, authenticate(creds, reader, writer)).await;
    let username = match verdict {
        Ok(Ok(username)) => username,
        Ok(Err(e)) => {
            warn!(code = e.error_code(), error = %e, "handshake failed");
            let _ = writer.send("NOT AUTHORIZED".to_string()).await;
            return;
        }
        Err(_) => {
            warn!(code = HandshakeError::Timeout.error_code(), "handshake failed");
            let _ = writer.send("NOT AUTHORIZED".to_string()).await;
            return;
        }
    };

    roster.set_username(conn_id, &username);
    info!(username = %username, "session authorized");

    if writer
        .send(format!("Welcome {username}! Type /help to list commands."))
        .await
        .is_err()
    {
        return;
    }

    // Active: lines are processed strictly in arrival order for this
    // session; routed traffic drains from the outbound queue.
    loop {
        tokio::select! {
            inbound = reader.next() => match inbound {
                Some(Ok(line)) => {
                    if line.is_empty() {
                        continue;
                    }
                    if let Some((name, raw_args)) = parse_command(&line) {
                        let ctx = Context {
                            roster,
                            registry,
                            conn_id,
                            username: &username,
                        };
                        match registry.dispatch(&ctx, name, raw_args).await {
                            Ok(()) => {}
                            Err(HandlerError::SessionClosing) => break,
                        }
                    } else {
                        roster.message(&line, conn_id, &username);
                    }
                }
                Some(Err(e)) => {
                    warn!(username = %username, error = %e, "read error");
                    break;
                }
                None => {
                    info!(username = %username, "client disconnected");
                    break;
                }
            },
            queued = outbound_rx.recv() => match queued {
                Some(Outbound::Line(line)) => {
                    if let Err(e) = writer.send(line).await {
                        warn!(username = %username, error = %e, "write error");
                        break;
                    }
                }
                Some(Outbound::Close) | None => break,
            },
        }
    }

    // Flush replies queued by the final command, the quit farewell in
    // particular. A queued Close ends the flush.
    while let Ok(Outbound::Line(line)) = outbound_rx.try_recv() {
        if writer.send(line).await.is_err() {
            break;
        }
    }
}

/// The challenge-response state machine: AwaitingUsername, ChallengeIssued,
/// AwaitingResponse, then Verified or Denied.
async fn authenticate(
    creds: &CredentialStore,
    reader: &mut Reader,
    writer: &mut Writer,
) -> Result<String, HandshakeError> {
    let username = read_line(reader).await?;
    if username.is_empty() {
        return Err(HandshakeError::EmptyField("username"));
    }

    let authkey = auth::authkey(&username);
    writer.send(authkey.clone()).await?;

    let response = read_line(reader).await?;
    if response.is_empty() {
        return Err(HandshakeError::EmptyField("response"));
    }
    if !creds.contains(&username) {
        return Err(HandshakeError::UnknownUser(username));
    }
    if !creds.verify(&username, &authkey, &response) {
        return Err(HandshakeError::BadResponse);
    }

    writer.send("AUTHORIZED".to_string()).await?;
    Ok(username)
}

/// Read one line, mapping clean EOF and codec failures to handshake errors.
async fn read_line(reader: &mut Reader) -> Result<String, HandshakeError> {
    match reader.next().await {
        Some(Ok(line)) => Ok(line),
        Some(Err(e)) => Err(HandshakeError::Codec(e)),
        None => Err(HandshakeError::ConnectionClosed),
    }
}
