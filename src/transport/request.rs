//! transport::request
//!
//! Request and failed-response values that flow through the signer and the
//! refresher.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use tracing::warn;

use crate::auth::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// An outgoing API request.
///
/// `path` is relative to the configured base URL. Requests are cheap to
/// clone so the refresher can hand back a re-signed copy for the retry.
#[derive(Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, AuthError> {
        let value = serde_json::to_value(body)
            .map_err(|e| AuthError::Validation(format!("cannot encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Set `Authorization: Bearer <token>`, replacing any previous value.
    ///
    /// A token that is not a valid header value is not attached; the request
    /// then goes out unauthenticated and fails with 401.
    pub fn with_bearer(mut self, token: &str) -> Self {
        match HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                warn!(path = %self.path, "access token is not a valid header value, not attached");
                self.headers.remove(AUTHORIZATION);
            }
        }
        self
    }

    /// The bearer token carried by this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix(BEARER_PREFIX)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Absolute URL of this request under `base_url`.
    pub fn url(&self, base_url: &str) -> Result<Url, AuthError> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| AuthError::Validation(format!("invalid request URL '{}': {}", joined, e)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("signed", &self.bearer_token().is_some())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// An authentication failure, linked to the failures that preceded it for
/// the same logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResponse {
    pub status: StatusCode,
    pub path: String,
    pub prior: Option<Box<FailedResponse>>,
}

impl FailedResponse {
    /// First failure of a request.
    pub fn new(status: StatusCode, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
            prior: None,
        }
    }

    /// Failure of a retry; `self` becomes the prior of the new response.
    pub fn followed_by(self, status: StatusCode) -> Self {
        Self {
            status,
            path: self.path.clone(),
            prior: Some(Box::new(self)),
        }
    }

    /// Number of responses in the chain, this one included.
    pub fn chain_len(&self) -> usize {
        let mut len = 1;
        let mut current = self.prior.as_deref();
        while let Some(prior) = current {
            len += 1;
            current = prior.prior.as_deref();
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_roundtrip() {
        let request = ApiRequest::get("/items").with_bearer("A1");
        assert_eq!(request.bearer_token(), Some("A1"));

        let resigned = request.with_bearer("A2");
        assert_eq!(resigned.bearer_token(), Some("A2"));
        assert_eq!(resigned.headers().get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn invalid_token_is_not_attached() {
        let request = ApiRequest::get("/items")
            .with_bearer("A1")
            .with_bearer("bad\ntoken");
        assert!(request.bearer_token().is_none());
    }

    #[test]
    fn unsigned_request_has_no_bearer() {
        assert!(ApiRequest::get("/items").bearer_token().is_none());
    }

    #[test]
    fn url_joins_base_path_and_query() {
        let request = ApiRequest::get("order/getallproductsuser").with_query("user_id", "u 1");
        let url = request.url("http://localhost:8000/").expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/order/getallproductsuser?user_id=u+1"
        );

        let url = ApiRequest::post("/refresh")
            .url("http://localhost:8000/api")
            .expect("url");
        assert_eq!(url.as_str(), "http://localhost:8000/api/refresh");
    }

    #[test]
    fn url_rejects_bad_base() {
        let err = ApiRequest::get("/x").url("not a url").unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn json_body_is_kept() {
        let request = ApiRequest::post("/login")
            .with_json(&serde_json::json!({"user_login": "alice"}))
            .expect("body");
        assert_eq!(request.body().expect("body")["user_login"], "alice");
    }

    #[test]
    fn debug_hides_token() {
        let debug = format!("{:?}", ApiRequest::get("/x").with_bearer("A1_secret"));
        assert!(!debug.contains("A1_secret"));
        assert!(debug.contains("signed: true"));
    }

    #[test]
    fn chain_len_counts_priors() {
        let first = FailedResponse::new(StatusCode::UNAUTHORIZED, "/items");
        assert_eq!(first.chain_len(), 1);

        let chain = first
            .followed_by(StatusCode::UNAUTHORIZED)
            .followed_by(StatusCode::UNAUTHORIZED)
            .followed_by(StatusCode::UNAUTHORIZED);
        assert_eq!(chain.chain_len(), 4);
        assert_eq!(chain.path, "/items");
    }
}
