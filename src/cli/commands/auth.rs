//! cli::commands::auth
//!
//! Session commands: login, register, logout and status.
//!
//! # Security
//!
//! Passwords come from a masked prompt or from stdin, never from argv.
//! Tokens are never printed.
//!
//! # Example
//!
//! ```bash
//! # Interactive
//! foodcare auth login
//!
//! # Non-interactive
//! printf '%s\n' "$PASSWORD" | foodcare auth login --login alice --password-stdin
//!
//! # Check status
//! foodcare -q auth status
//! ```

use anyhow::{anyhow, bail, Context as _, Result};

use crate::auth::AuthError;
use crate::cli::{Context, Services};
use crate::ui::{output, prompts};

/// Sign in and store the session.
pub async fn login(
    ctx: &Context,
    services: &Services,
    login: Option<String>,
    password_stdin: bool,
) -> Result<()> {
    let login = required_input(ctx, login, "Login", "--login")?;
    let password = read_password(ctx, password_stdin, "Password")?;

    services
        .session
        .login(&login, &password)
        .await
        .map_err(to_user_error)?;

    let name = services
        .session
        .current_user()
        .and_then(|user| user.display_name.or(user.login))
        .unwrap_or(login);
    output::print(format!("Logged in as {}.", name), ctx.verbosity);
    Ok(())
}

/// Create an account.
pub async fn register(
    ctx: &Context,
    services: &Services,
    login: Option<String>,
    name: Option<String>,
    password_stdin: bool,
) -> Result<()> {
    let login = required_input(ctx, login, "Login", "--login")?;
    let name = required_input(ctx, name, "Name", "--name")?;
    let (password, confirm) = if password_stdin {
        let password = prompts::stdin_line().context("Failed to read password from stdin")?;
        (password.clone(), password)
    } else {
        (
            read_password(ctx, false, "Password")?,
            read_password(ctx, false, "Repeat password")?,
        )
    };

    let message = services
        .session
        .register(&login, &name, &password, &confirm)
        .await
        .map_err(to_user_error)?;

    output::print(message, ctx.verbosity);
    output::print(
        format!("Run 'foodcare auth login --login {}' to sign in.", login.trim()),
        ctx.verbosity,
    );
    Ok(())
}

/// Remove the stored session.
pub async fn logout(ctx: &Context, services: &Services) -> Result<()> {
    services.session.logout().await;
    output::print("Logged out.", ctx.verbosity);
    Ok(())
}

/// Show whether a session is stored.
pub fn status(ctx: &Context, services: &Services) -> Result<()> {
    let user = services
        .session
        .current_user()
        .filter(|_| services.session.is_authenticated());

    if ctx.verbosity.is_quiet() {
        // Machine-readable output
        output::plain(if user.is_some() {
            "authenticated"
        } else {
            "not_authenticated"
        });
        return Ok(());
    }

    match user {
        Some(user) => {
            let who = match (&user.display_name, &user.login) {
                (Some(name), Some(login)) => format!("{} ({})", name, login),
                (Some(name), None) => name.clone(),
                (None, Some(login)) => login.clone(),
                (None, None) => user.user_id.clone(),
            };
            output::print(format!("Logged in as {}.", who), ctx.verbosity);
            output::print(format!("User id: {}", user.user_id), ctx.verbosity);
        }
        None => {
            output::print("Not logged in.", ctx.verbosity);
            output::print("Run 'foodcare auth login' to sign in.", ctx.verbosity);
        }
    }
    Ok(())
}

/// Turn an [`AuthError`] into the message shown to the user.
pub(super) fn to_user_error(err: AuthError) -> anyhow::Error {
    anyhow!(err.user_message())
}

fn required_input(ctx: &Context, value: Option<String>, label: &str, flag: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    if !ctx.interactive {
        bail!("{} required. Use {} or run interactively.", label, flag);
    }
    prompts::input(label, ctx.interactive).with_context(|| format!("Failed to read {}", label))
}

fn read_password(ctx: &Context, from_stdin: bool, label: &str) -> Result<String> {
    if from_stdin {
        return prompts::stdin_line().context("Failed to read password from stdin");
    }
    if !ctx.interactive {
        bail!("Password required. Use --password-stdin or run interactively.");
    }
    prompts::password(label, ctx.interactive).context("Failed to read password")
}
