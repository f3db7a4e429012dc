//! Built-in commands: quit, users, help.

use super::{Context, Handler, HandlerError, HandlerResult};
use async_trait::async_trait;
use tracing::info;

/// `/quit` - say goodbye and terminate the issuing session.
pub struct QuitCommand;

#[async_trait]
impl Handler for QuitCommand {
    async fn handle(&self, ctx: &Context<'_>, _params: Vec<String>) -> HandlerResult {
        ctx.roster.send_to(ctx.conn_id, "Server: Later dude.");
        info!(
            "[command quit] {} on {} quit.",
            ctx.username, ctx.conn_id
        );
        Err(HandlerError::SessionClosing)
    }
}

/// `/users` - list the usernames of every active session to the issuer.
pub struct UsersCommand;

#[async_trait]
impl Handler for UsersCommand {
    async fn handle(&self, ctx: &Context<'_>, _params: Vec<String>) -> HandlerResult {
        for username in ctx.roster.usernames() {
            ctx.roster.send_to(ctx.conn_id, &username);
        }
        info!("[command users] Listed users for {}.", ctx.username);
        Ok(())
    }
}

/// `/help` - list every registered command's name, description, and arity.
pub struct HelpCommand;

#[async_trait]
impl Handler for HelpCommand {
    async fn handle(&self, ctx: &Context<'_>, _params: Vec<String>) -> HandlerResult {
        let issuer = ctx.conn_id;
        ctx.roster.send_to(issuer, "");
        ctx.roster.send_to(issuer, "Available Commands");
        ctx.roster
            .send_to(issuer, "  prepend command name with slash to run, e.g. /users");
        ctx.roster.send_to(
            issuer,
            "  anything typed without a command will be sent to all other users.",
        );
        ctx.roster.send_to(issuer, "");
        for command in ctx.registry.iter() {
            ctx.roster.send_to(issuer, command.name());
            ctx.roster
                .send_to(issuer, &format!(" - {}", command.description()));
            ctx.roster
                .send_to(issuer, &format!(" - Parameters: {}", command.arity()));
            ctx.roster.send_to(issuer, "");
        }
        info!("[command help] Listed available commands for {}", ctx.username);
        Ok(())
    }
}
