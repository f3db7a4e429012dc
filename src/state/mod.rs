//! Shared server state: the session roster and its routing primitives.

mod roster;
mod session;

pub use roster::{Roster, resolve_conn_id};
pub use session::{Outbound, Session};
