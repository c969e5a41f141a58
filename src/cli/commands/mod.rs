//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! Everything past argument parsing talks to the network, so `dispatch`
//! builds one tokio runtime per invocation and blocks on the handler.

mod auth;
mod completion;
mod products;

pub use completion::completion;

use anyhow::Result;

use super::args::{AuthAction, Command, ProductsAction};
use super::{Context, Services};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let services = Services::build(&ctx.config)?;

    match command {
        Command::Auth { action } => match action {
            AuthAction::Login {
                login,
                password_stdin,
            } => runtime.block_on(auth::login(ctx, &services, login, password_stdin)),
            AuthAction::Register {
                login,
                name,
                password_stdin,
            } => runtime.block_on(auth::register(ctx, &services, login, name, password_stdin)),
            AuthAction::Logout => runtime.block_on(auth::logout(ctx, &services)),
            AuthAction::Status => auth::status(ctx, &services),
        },
        Command::Products { action } => match action {
            ProductsAction::List => runtime.block_on(products::list(ctx, &services)),
            ProductsAction::Delete { id } => runtime.block_on(products::delete(ctx, &services, id)),
        },
        Command::Completion { shell } => completion(shell),
    }
}
