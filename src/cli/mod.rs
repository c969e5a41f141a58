//! cli
//!
//! Command-line interface layer for foodcare.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and build the session services
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. [`Services`] is the only place the store, the
//! API, the refresher and the controller are wired together; handlers
//! borrow it and never touch the secret store directly.

pub mod args;
pub mod commands;

pub use args::{AuthAction, Cli, Command, ProductsAction, Shell};

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::api::{AuthApi, HttpAuthApi, ProductsApi};
use crate::auth::{AuthRequestSigner, CredentialStore, SessionController, TokenRefresher};
use crate::config::{ApiConfig, Config};
use crate::secrets;
use crate::transport::ApiClient;
use crate::ui::output::Verbosity;

/// Per-invocation settings shared by all handlers.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub verbosity: Verbosity,
    pub interactive: bool,
}

impl Context {
    /// Load configuration and apply the global flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(url) = &cli.api_url {
            config
                .file
                .api
                .get_or_insert_with(ApiConfig::default)
                .base_url = Some(url.clone());
            config.file.validate().context("Invalid --api-url")?;
        }

        Ok(Self {
            config,
            verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
            interactive: cli.interactive(),
        })
    }
}

/// The wired session stack.
pub struct Services {
    pub session: SessionController,
    pub products: ProductsApi,
}

impl Services {
    /// Open the configured secret store and build everything on top of it.
    pub fn build(config: &Config) -> Result<Self> {
        let backend = secrets::create_store(config.secrets_provider())
            .context("Failed to initialize secret store")?;
        let store = Arc::new(CredentialStore::open(backend));

        let timeout = config.request_timeout();
        let api: Arc<dyn AuthApi> = Arc::new(
            HttpAuthApi::new(config.base_url(), timeout)?.with_refresh_path(config.refresh_path()),
        );
        let refresher = Arc::new(TokenRefresher::new(
            Arc::clone(&store),
            Arc::clone(&api),
            config.refresh_path(),
            timeout,
        ));
        let client = ApiClient::new(
            config.base_url(),
            timeout,
            AuthRequestSigner::new(Arc::clone(&store)),
            refresher,
        )?;

        Ok(Self {
            session: SessionController::new(store, api, config.session_options()),
            products: ProductsApi::new(Arc::new(client)),
        })
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    if let Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let ctx = Context::from_cli(&cli)?;
    commands::dispatch(cli.command, &ctx)
}
