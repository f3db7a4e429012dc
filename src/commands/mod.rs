//! Slash-command registry and dispatch.
//!
//! Commands are registered once at startup: each descriptor carries a name,
//! a human description, an explicit arity (user-supplied parameters beyond
//! the implicit server/session context), and a boxed handler. Dispatch
//! resolves `/name rest` lines against the table and partitions the raw
//! argument text by arity before invoking the handler.

mod builtin;

pub use builtin::{HelpCommand, QuitCommand, UsersCommand};

use crate::state::Roster;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Context passed to every command handler.
pub struct Context<'a> {
    /// Shared session roster.
    pub roster: &'a Arc<Roster>,
    /// The registry itself, for commands that enumerate commands.
    pub registry: &'a Registry,
    /// Connection id of the issuing session.
    pub conn_id: u16,
    /// Username of the issuing session.
    pub username: &'a str,
}

/// Errors a command handler can surface to the session loop.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The issuing session asked to terminate; the loop transitions to
    /// Closing after flushing queued replies.
    #[error("session closing")]
    SessionClosing,
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Run the command with the parameters the dispatcher split out.
    async fn handle(&self, ctx: &Context<'_>, params: Vec<String>) -> HandlerResult;
}

/// A registered command: metadata plus its handler.
pub struct Command {
    name: &'static str,
    description: &'static str,
    arity: usize,
    handler: Box<dyn Handler>,
}

impl Command {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// Process-wide command table, built once at startup. No removal path.
#[derive(Default)]
pub struct Registry {
    commands: Vec<Command>,
}

impl Registry {
    /// Create a registry with the built-in commands registered.
    pub fn new() -> Self {
        let mut registry = Self {
            commands: Vec::new(),
        };
        registry.register("quit", "Disconnect from chat", 0, Box::new(QuitCommand));
        registry.register("users", "List active users", 0, Box::new(UsersCommand));
        registry.register("help", "List available commands", 0, Box::new(HelpCommand));
        registry
    }

    /// Register a command. A duplicate name replaces the earlier descriptor.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        arity: usize,
        handler: Box<dyn Handler>,
    ) {
        self.commands.retain(|c| c.name != name);
        self.commands.push(Command {
            name,
            description,
            arity,
            handler,
        });
    }

    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Registered commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Resolve and run a command for the issuing session.
    ///
    /// An unknown name gets a reply to the issuer only and is not an error;
    /// whatever side effects the handler performs are the command's entire
    /// visible behavior.
    pub async fn dispatch(&self, ctx: &Context<'_>, name: &str, raw_args: &str) -> HandlerResult {
        let Some(command) = self.find(name) else {
            warn!(
                conn_id = ctx.conn_id,
                username = ctx.username,
                command = name,
                "unknown command"
            );
            ctx.roster
                .send_to(ctx.conn_id, &format!("Server: Unknown command [{name}]"));
            return Ok(());
        };

        let params = split_args(raw_args, command.arity);
        debug!(
            conn_id = ctx.conn_id,
            username = ctx.username,
            command = command.name,
            "dispatching command"
        );
        command.handler.handle(ctx, params).await
    }
}

/// Parse a line for command syntax: `/name` plus optional argument text
/// separated by one space. Returns `None` for plain chat text.
pub fn parse_command(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('/')?;
    let (name, args) = match rest.split_once(' ') {
        Some((name, args)) => (name, args),
        None => (rest, ""),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, args))
}

/// Partition raw argument text into positional parameters.
///
/// Arity 0 ignores the text entirely; arity 1 passes it through untouched;
/// arity k >= 2 takes the first k-1 single-space-delimited tokens verbatim
/// and folds the remaining words, embedded spaces included, into the final
/// parameter.
pub fn split_args(raw: &str, arity: usize) -> Vec<String> {
    match arity {
        0 => Vec::new(),
        1 => vec![raw.to_string()],
        k => raw.splitn(k, ' ').map(str::to_string).collect(),
    }
}
