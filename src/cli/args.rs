//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the search path
//! - `--api-url <url>`: Override `api.base_url`
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal, machine-readable output; no prompts

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// foodcare - sign in to FoodCare and manage your tracked products
#[derive(Parser, Debug)]
#[command(name = "foodcare")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// API root, overriding the configured one
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; never prompts
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Prompts are shown only when stdin is a terminal and not in quiet mode.
    pub fn interactive(&self) -> bool {
        !self.quiet && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in, sign out, register and show the session
    #[command(
        long_about = "Manage the FoodCare session.\n\n\
            The session (user id and token pair) is kept in the configured \
            secret store and reused by every other command. Expired access \
            tokens are refreshed automatically.",
        after_help = "\
EXAMPLES:
    # Sign in interactively
    foodcare auth login

    # Sign in from a script
    echo \"$PASSWORD\" | foodcare auth login --login alice --password-stdin

    # Check the session (prints authenticated / not_authenticated)
    foodcare -q auth status"
    )]
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// List and remove tracked products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// `foodcare auth` subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Sign in and store the session
    Login {
        /// Login id; prompted for when omitted
        #[arg(long)]
        login: Option<String>,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Create an account (does not sign in)
    Register {
        /// Login id; prompted for when omitted
        #[arg(long)]
        login: Option<String>,

        /// Display name; prompted for when omitted
        #[arg(long)]
        name: Option<String>,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Remove the stored session
    Logout,

    /// Show whether a session is stored
    Status,
}

/// `foodcare products` subcommands.
#[derive(Subcommand, Debug)]
pub enum ProductsAction {
    /// List the signed-in user's products
    List,

    /// Remove a product from the user's list
    Delete {
        /// Order product id, as shown by `foodcare products list`
        id: Uuid,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
