//! api::models
//!
//! Wire types for the FoodCare auth endpoints.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, TokenPair};

/// Body of `POST /login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub user_login: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(user_login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_login: user_login.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /register`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub user_login: String,
    pub password: String,
    pub user_name: String,
}

/// Body of `POST /refresh`.
#[derive(Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response of `/login` and `/refresh`.
///
/// Every field is optional on the wire; [`TokenResponse::into_login`] and
/// [`TokenResponse::into_token_pair`] enforce what each call requires.
#[derive(Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Access-token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Token pair, requiring both tokens to be non-empty.
    pub fn into_token_pair(self) -> Result<TokenPair, AuthError> {
        let access = non_empty(self.access_token, "access_token")?;
        let refresh = non_empty(self.refresh_token, "refresh_token")?;
        Ok(TokenPair::new(access, refresh, self.expires_in))
    }

    /// User id and token pair, requiring all three to be non-empty.
    pub fn into_login(mut self) -> Result<(String, TokenPair), AuthError> {
        let user_id = non_empty(self.user_id.take(), "user_id")?;
        Ok((user_id, self.into_token_pair()?))
    }
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, AuthError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AuthError::Protocol(format!("response is missing {}", field)))
}

/// Response of `POST /register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// One entry of `GET /get_user_by_id/{user_id}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(default)]
    pub user_login: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_login_response_parses() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"user_id":"u1","access_token":"A1","refresh_token":"R1","token_type":"bearer"}"#,
        )
        .expect("parse");
        let (user_id, tokens) = response.into_login().expect("login");
        assert_eq!(user_id, "u1");
        assert_eq!(tokens.access_token, "A1");
        assert_eq!(tokens.refresh_token, "R1");
        assert!(tokens.access_token_expires_at.is_none());
    }

    #[test]
    fn missing_refresh_token_is_protocol_error() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"user_id":"u1","access_token":"A1"}"#).expect("parse");
        match response.into_login() {
            Err(AuthError::Protocol(msg)) => assert!(msg.contains("refresh_token")),
            other => panic!("expected protocol error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn blank_user_id_is_protocol_error() {
        let response = TokenResponse {
            user_id: Some("  ".into()),
            access_token: Some("A1".into()),
            refresh_token: Some("R1".into()),
            ..Default::default()
        };
        assert!(matches!(response.into_login(), Err(AuthError::Protocol(_))));
    }

    #[test]
    fn refresh_response_with_expiry() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"A2","refresh_token":"R2","expires_in":900}"#,
        )
        .expect("parse");
        let tokens = response.into_token_pair().expect("pair");
        assert!(tokens.access_token_expires_at.is_some());
    }

    #[test]
    fn huge_expires_in_leaves_expiry_unknown() {
        let login: TokenResponse = serde_json::from_str(
            r#"{"user_id":"u1","access_token":"A1","refresh_token":"R1","expires_in":100000000000000}"#,
        )
        .expect("parse");
        let (_, tokens) = login.into_login().expect("login");
        assert_eq!(tokens.access_token, "A1");
        assert!(tokens.access_token_expires_at.is_none());

        let refresh = TokenResponse {
            access_token: Some("A2".into()),
            refresh_token: Some("R2".into()),
            expires_in: Some(u64::MAX),
            ..Default::default()
        };
        let tokens = refresh.into_token_pair().expect("pair");
        assert_eq!(tokens.refresh_token, "R2");
        assert!(tokens.access_token_expires_at.is_none());
    }

    #[test]
    fn register_message_is_optional() {
        let response: RegisterResponse = serde_json::from_str(r#"{"user_id":"u1"}"#).expect("parse");
        assert!(response.message.is_none());
    }
}
