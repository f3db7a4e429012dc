//! Error types for the session subsystem.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors that can fail the authentication handshake.
///
/// Every variant is connection-local: the session gets `NOT AUTHORIZED`, its
/// socket is closed, and the rest of the server is untouched.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("handshake timed out")]
    Timeout,

    #[error("client disconnected mid-handshake")]
    ConnectionClosed,

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("challenge response did not match")]
    BadResponse,

    #[error("empty {0} in handshake")]
    EmptyField(&'static str),

    #[error("line codec error: {0}")]
    Codec(#[from] LinesCodecError),
}

impl HandshakeError {
    /// Static error code for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionClosed => "connection_closed",
            Self::UnknownUser(_) => "unknown_user",
            Self::BadResponse => "bad_response",
            Self::EmptyField(_) => "empty_field",
            Self::Codec(_) => "codec_error",
        }
    }
}
