//! auth::credentials
//!
//! The credential record and its persisted form.
//!
//! # Design
//!
//! [`Credentials`] holds the user identity and an optional [`TokenPair`].
//! Keeping both tokens in one `Option` means a record can never carry an
//! access token without its refresh token. The access-token expiry lives in
//! the pair, so replacing the pair replaces the expiry with it.
//!
//! [`StoredCredentials`] is the JSON document written to the secret store.
//! Its token fields are flat and optional so that records written by older
//! layouts still parse; a record with only one token is rejected as partial.
//!
//! # Security
//!
//! `Debug` output redacts token values. JSON output does contain them, since
//! that is what gets stored.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind identifier for the persisted record.
pub const CREDENTIALS_KIND: &str = "foodcare.session";

/// Current schema version of the persisted record.
pub const CREDENTIALS_VERSION: u32 = 1;

/// Secret store key under which the record is kept.
pub const CREDENTIALS_SECRET_KEY: &str = "foodcare.session";

/// Buffer before access-token expiry that triggers a proactive refresh (5 minutes).
pub const EXPIRY_BUFFER_SECS: i64 = 300;

/// Access and refresh token, always stored together.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of `access_token`, when the server reported one.
    pub access_token_expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    /// Build a pair from a token response.
    ///
    /// `expires_in` is the access-token lifetime in seconds, if known. A
    /// lifetime too large to place on the calendar is treated as unknown.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: Option<u64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            access_token_expires_at: expires_in.and_then(expiry_after),
        }
    }

    /// Access-token expiry as epoch milliseconds.
    pub fn expiry_epoch_millis(&self) -> Option<i64> {
        self.access_token_expires_at.map(|at| at.timestamp_millis())
    }

    /// True once the access token is within [`EXPIRY_BUFFER_SECS`] of expiring.
    ///
    /// A pair without a known expiry never needs a proactive refresh. An
    /// expiry so early that the buffer cannot be subtracted counts as due.
    pub fn needs_refresh(&self) -> bool {
        self.access_token_expires_at
            .map(|at| {
                at.checked_sub_signed(Duration::seconds(EXPIRY_BUFFER_SECS))
                    .map_or(true, |due| Utc::now() >= due)
            })
            .unwrap_or(false)
    }
}

/// `secs` from now, or `None` when that falls outside chrono's range.
fn expiry_after(secs: u64) -> Option<DateTime<Utc>> {
    let lifetime = i64::try_from(secs).ok().and_then(Duration::try_seconds)?;
    Utc::now().checked_add_signed(lifetime)
}

/// Public identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub login: Option<String>,
    pub display_name: Option<String>,
}

/// Current user identity and tokens.
///
/// The default value is the empty (logged-out) record.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    pub tokens: Option<TokenPair>,
}

impl Credentials {
    /// Full record produced by a successful login.
    pub fn logged_in(
        user_id: impl Into<String>,
        login: Option<String>,
        display_name: Option<String>,
        tokens: TokenPair,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            login,
            display_name,
            tokens: Some(tokens),
        }
    }

    /// True when a token pair is present.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.refresh_token.as_str())
    }

    pub fn access_token_expiry_epoch_millis(&self) -> Option<i64> {
        self.tokens.as_ref().and_then(TokenPair::expiry_epoch_millis)
    }

    /// Profile of the logged-in user, if a user id is stored.
    pub fn profile(&self) -> Option<UserProfile> {
        self.user_id.as_ref().map(|id| UserProfile {
            user_id: id.clone(),
            login: self.login.clone(),
            display_name: self.display_name.clone(),
        })
    }

    /// Same identity with a new token pair.
    pub fn with_tokens(&self, tokens: TokenPair) -> Self {
        Self {
            tokens: Some(tokens),
            ..self.clone()
        }
    }
}

/// Reasons a persisted record cannot be turned back into [`Credentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Not JSON, or not the expected shape.
    Malformed(String),
    /// Wrong `kind`.
    UnexpectedKind(String),
    /// Unsupported `schema_version`.
    UnsupportedVersion(u32),
    /// Exactly one of the two tokens is present.
    PartialTokens,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Malformed(msg) => write!(f, "malformed record: {}", msg),
            RecordError::UnexpectedKind(kind) => write!(
                f,
                "unexpected kind '{}', expected '{}'",
                kind, CREDENTIALS_KIND
            ),
            RecordError::UnsupportedVersion(v) => write!(
                f,
                "unsupported schema version {}, expected {}",
                v, CREDENTIALS_VERSION
            ),
            RecordError::PartialTokens => write!(f, "record holds only one of the two tokens"),
        }
    }
}

/// Persisted credential record.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub kind: String,
    pub schema_version: u32,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub access_token_expiry_epoch_millis: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCredentials {
    /// Snapshot `credentials` into the persisted layout.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let tokens = credentials.tokens.as_ref();
        Self {
            kind: CREDENTIALS_KIND.to_string(),
            schema_version: CREDENTIALS_VERSION,
            user_id: credentials.user_id.clone(),
            login: credentials.login.clone(),
            display_name: credentials.display_name.clone(),
            access_token: tokens.map(|t| t.access_token.clone()),
            refresh_token: tokens.map(|t| t.refresh_token.clone()),
            access_token_expiry_epoch_millis: credentials.access_token_expiry_epoch_millis(),
            updated_at: Utc::now(),
        }
    }

    /// Parse and validate a persisted record.
    pub fn parse(json: &str) -> Result<Self, RecordError> {
        let record: Self =
            serde_json::from_str(json).map_err(|e| RecordError::Malformed(e.to_string()))?;

        if record.kind != CREDENTIALS_KIND {
            return Err(RecordError::UnexpectedKind(record.kind));
        }
        if record.schema_version != CREDENTIALS_VERSION {
            return Err(RecordError::UnsupportedVersion(record.schema_version));
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Convert back into [`Credentials`].
    ///
    /// Empty token strings count as absent. An expiry without tokens is
    /// dropped.
    pub fn into_credentials(self) -> Result<Credentials, RecordError> {
        let access = self.access_token.filter(|t| !t.is_empty());
        let refresh = self.refresh_token.filter(|t| !t.is_empty());

        let tokens = match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Some(TokenPair {
                access_token,
                refresh_token,
                access_token_expires_at: self
                    .access_token_expiry_epoch_millis
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            }),
            (None, None) => None,
            _ => return Err(RecordError::PartialTokens),
        };

        Ok(Credentials {
            user_id: self.user_id,
            login: self.login,
            display_name: self.display_name,
            tokens,
        })
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("access_token_expires_at", &self.access_token_expires_at)
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("login", &self.login)
            .field("display_name", &self.display_name)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("StoredCredentials")
            .field("kind", &self.kind)
            .field("schema_version", &self.schema_version)
            .field("user_id", &self.user_id)
            .field("login", &self.login)
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}
