//! auth::session
//!
//! SessionController: login, registration and logout, and the observable
//! session state derived from them.
//!
//! # Design
//!
//! [`SessionState`] is never stored. It is computed from the credential
//! snapshot and the two operation statuses whenever it is read, so it cannot
//! drift from the credentials.
//!
//! # Supersession
//!
//! Each operation keeps a generation counter. Starting a call bumps it, and
//! a call may only commit while its generation is still the newest. For
//! login the check runs inside [`CredentialStore::write_if`], under the
//! store's write lock. A superseded call returns [`AuthError::Superseded`]
//! and leaves credentials and status alone. Its network request is not
//! aborted.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::credentials::{Credentials, UserProfile};
use super::errors::{AuthError, ErrorKind};
use super::store::CredentialStore;
use super::validation::ValidationPolicy;
use crate::api::{AuthApi, LoginRequest, RegisterRequest};

/// Default timeout for auth calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress of one login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    InProgress,
    /// Finished; carries the message to show.
    Success(String),
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl OperationStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, OperationStatus::InProgress)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            OperationStatus::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Operation currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingOperation {
    #[default]
    None,
    LoggingIn,
    Registering,
}

/// What collaborators see of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub pending_operation: PendingOperation,
    pub last_error: Option<ErrorKind>,
}

impl SessionState {
    fn project(
        credentials: &Credentials,
        login: &OperationStatus,
        register: &OperationStatus,
    ) -> Self {
        let pending_operation = if login.is_in_progress() {
            PendingOperation::LoggingIn
        } else if register.is_in_progress() {
            PendingOperation::Registering
        } else {
            PendingOperation::None
        };

        Self {
            is_authenticated: credentials.is_authenticated(),
            pending_operation,
            last_error: login.error_kind().or_else(|| register.error_kind()),
        }
    }
}

/// Settings for a [`SessionController`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub policy: ValidationPolicy,
    /// Keep a successful login in memory when the store cannot persist it.
    pub allow_memory_only: bool,
    pub request_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::default(),
            allow_memory_only: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Generation counter and status of one operation.
struct Operation {
    generation: AtomicU64,
    status: watch::Sender<OperationStatus>,
}

impl Operation {
    fn new() -> Self {
        let (status, _) = watch::channel(OperationStatus::Idle);
        Self {
            generation: AtomicU64::new(0),
            status,
        }
    }

    /// Start a call; every earlier call is superseded.
    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(OperationStatus::InProgress);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Supersede any call in flight and go back to idle.
    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.status.send_replace(OperationStatus::Idle);
    }

    fn reset(&self) {
        self.status.send_replace(OperationStatus::Idle);
    }

    /// Record the outcome, unless a newer call has started.
    fn settle<T>(&self, generation: u64, result: &Result<T, AuthError>, success: impl FnOnce(&T) -> String) {
        let next = match result {
            Ok(value) => OperationStatus::Success(success(value)),
            Err(e) => OperationStatus::Failed {
                kind: e.kind(),
                message: e.user_message(),
            },
        };
        self.status.send_if_modified(|status| {
            if !self.is_current(generation) {
                return false;
            }
            *status = next;
            true
        });
    }
}

/// Owner of login, registration and logout.
pub struct SessionController {
    store: Arc<CredentialStore>,
    api: Arc<dyn AuthApi>,
    options: SessionOptions,
    login: Operation,
    register: Operation,
}

impl SessionController {
    pub fn new(store: Arc<CredentialStore>, api: Arc<dyn AuthApi>, options: SessionOptions) -> Self {
        Self {
            store,
            api,
            options,
            login: Operation::new(),
            register: Operation::new(),
        }
    }

    /// The credential store this controller writes to.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Log in and store the new session.
    ///
    /// Input is validated before any request. After the login call, the
    /// user's profile is fetched with the new access token; if that fetch
    /// fails the typed login id is kept and the display name is left empty.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] on bad input, with no request made
    /// - [`AuthError::Protocol`] when the response lacks the user id or a
    ///   token; nothing is written
    /// - [`AuthError::Superseded`] when a newer login or a logout started
    ///   before this call committed
    /// - [`AuthError::Storage`] when the session cannot be persisted and
    ///   memory-only sessions are not allowed
    pub async fn login(&self, login_id: &str, password: &str) -> Result<(), AuthError> {
        let generation = self.login.begin();
        debug!(generation, "login started");

        let result = self.run_login(generation, login_id, password).await;
        match &result {
            Ok(()) => info!("logged in"),
            Err(AuthError::Superseded) => debug!(generation, "login superseded"),
            Err(e) => warn!(error = %e, "login failed"),
        }

        self.login
            .settle(generation, &result, |_| "Logged in.".to_string());
        result
    }

    async fn run_login(&self, generation: u64, login_id: &str, password: &str) -> Result<(), AuthError> {
        self.options.policy.validate_login(login_id, password)?;
        let login_id = login_id.trim();

        let response = self
            .timed(self.api.login(&LoginRequest::new(login_id, password)))
            .await?;
        let (user_id, tokens) = response.into_login()?;

        if !self.login.is_current(generation) {
            return Err(AuthError::Superseded);
        }

        let (login, display_name) = match self
            .timed(self.api.fetch_user(&user_id, &tokens.access_token))
            .await
        {
            Ok(user) => (
                user.user_login
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| login_id.to_string()),
                user.user_name.filter(|n| !n.trim().is_empty()),
            ),
            Err(e) => {
                warn!(error = %e, "cannot fetch user profile, continuing without it");
                (login_id.to_string(), None)
            }
        };

        let credentials = Credentials::logged_in(user_id, Some(login), display_name, tokens);
        let still_current = |_: &Credentials| self.login.is_current(generation);

        match self.store.write_if(credentials.clone(), still_current).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::Superseded),
            Err(e) if self.options.allow_memory_only => {
                warn!(error = %e, "cannot persist session, keeping it in memory");
                if self
                    .store
                    .write_in_memory_if(credentials, still_current)
                    .await
                {
                    Ok(())
                } else {
                    Err(AuthError::Superseded)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create an account. Does not log in.
    ///
    /// Returns the server's message, or a generic one when it sent none.
    pub async fn register(
        &self,
        login_id: &str,
        display_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<String, AuthError> {
        let generation = self.register.begin();
        debug!(generation, "registration started");

        let result = self
            .run_register(generation, login_id, display_name, password, confirm_password)
            .await;
        match &result {
            Ok(_) => info!("registered"),
            Err(AuthError::Superseded) => debug!(generation, "registration superseded"),
            Err(e) => warn!(error = %e, "registration failed"),
        }

        self.register
            .settle(generation, &result, |message| message.clone());
        result
    }

    async fn run_register(
        &self,
        generation: u64,
        login_id: &str,
        display_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<String, AuthError> {
        self.options
            .policy
            .validate_register(login_id, display_name, password, confirm_password)?;

        let request = RegisterRequest {
            user_login: login_id.trim().to_string(),
            password: password.to_string(),
            user_name: display_name.trim().to_string(),
        };
        let response = self.timed(self.api.register(&request)).await?;

        if !self.register.is_current(generation) {
            return Err(AuthError::Superseded);
        }

        Ok(response
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Registration successful.".to_string()))
    }

    /// End the session.
    ///
    /// Always clears the in-memory credentials, and supersedes a login in
    /// flight. A failure to remove the persisted record is only logged.
    pub async fn logout(&self) {
        self.login.cancel();
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "cannot remove stored credentials");
        }
        info!("logged out");
    }

    pub fn state(&self) -> SessionState {
        SessionState::project(
            &self.store.read(),
            &self.login.status.borrow(),
            &self.register.status.borrow(),
        )
    }

    /// Subscribe to session state changes.
    pub fn watch(&self) -> SessionWatcher {
        SessionWatcher {
            credentials: self.store.observe(),
            login: self.login.status.subscribe(),
            register: self.register.status.subscribe(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.read().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.store.read().profile()
    }

    pub fn login_status(&self) -> OperationStatus {
        self.login.status.borrow().clone()
    }

    pub fn register_status(&self) -> OperationStatus {
        self.register.status.borrow().clone()
    }

    pub fn reset_login(&self) {
        self.login.reset();
    }

    pub fn reset_register(&self) {
        self.register.reset();
    }

    async fn timed<T>(&self, call: impl Future<Output = Result<T, AuthError>>) -> Result<T, AuthError> {
        tokio::time::timeout(self.options.request_timeout, call).await?
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Stream of [`SessionState`] values.
///
/// Several changes that land before the watcher is polled may be reported
/// once; the reported state is always the latest.
pub struct SessionWatcher {
    credentials: watch::Receiver<Credentials>,
    login: watch::Receiver<OperationStatus>,
    register: watch::Receiver<OperationStatus>,
}

impl SessionWatcher {
    /// State as of now.
    pub fn current(&self) -> SessionState {
        SessionState::project(
            &self.credentials.borrow(),
            &self.login.borrow(),
            &self.register.borrow(),
        )
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the controller and its store are gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        let alive = tokio::select! {
            r = self.credentials.changed() => r.is_ok(),
            r = self.login.changed() => r.is_ok(),
            r = self.register.changed() => r.is_ok(),
        };
        if !alive {
            return None;
        }

        let credentials = self.credentials.borrow_and_update().clone();
        let login = self.login.borrow_and_update().clone();
        let register = self.register.borrow_and_update().clone();
        Some(SessionState::project(&credentials, &login, &register))
    }
}

impl fmt::Debug for SessionWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionWatcher")
            .field("current", &self.current())
            .finish()
    }
}
