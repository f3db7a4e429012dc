//! Credential storage and challenge-response primitives.
//!
//! The handshake protocol is deliberately simple: the server issues a
//! single-use key (a digest over the username and the current time), and the
//! client answers with `Sha256(authkey ++ password)`. The server recomputes
//! the same digest from its stored secret and compares in constant time.
//! This is a fast message digest, not a hardened password scheme; the
//! credentials file is trusted and the channel is plaintext.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Errors loading the credentials file. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse credentials file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("credentials file has no users")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct PasswdFile {
    users: HashMap<String, String>,
}

/// Username -> secret mapping, loaded once at startup and immutable after.
#[derive(Debug)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Load credentials from a TOML file with a `[users]` table.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CredentialError> {
        let content = std::fs::read_to_string(path)?;
        let file: PasswdFile = toml::from_str(&content)?;
        if file.users.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self { users: file.users })
    }

    /// Build a store from in-memory pairs. Used by tests.
    pub fn from_users<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    /// Whether a username is present in the store.
    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Verify a client's salted response against the stored secret.
    ///
    /// Rejects empty usernames, keys, and responses outright; otherwise
    /// recomputes `Sha256(authkey ++ secret)` and compares in constant time.
    pub fn verify(&self, username: &str, authkey: &str, response: &str) -> bool {
        if username.is_empty() || authkey.is_empty() || response.is_empty() {
            return false;
        }
        let Some(secret) = self.users.get(username) else {
            return false;
        };
        let expected = salted_response(authkey, secret);
        expected.as_bytes().ct_eq(response.as_bytes()).into()
    }
}

/// Generate a single-use challenge key for a username.
///
/// The key folds in the current wall-clock second, so two challenges for the
/// same user at distinct instants differ.
pub fn authkey(username: &str) -> String {
    authkey_at(username, chrono::Utc::now().timestamp())
}

pub(crate) fn authkey_at(username: &str, timestamp: i64) -> String {
    digest_hex(&format!("{username}{timestamp}"))
}

/// Compute the salted response the client is expected to send:
/// `Sha256(authkey ++ password)`, hex-encoded.
pub fn salted_response(authkey: &str, password: &str) -> String {
    digest_hex(&format!("{authkey}{password}"))
}

fn digest_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
