//! Credential handling and interactive session login.
//!
//! The exchange authenticates stream and REST operations with an opaque
//! session token obtained by posting account credentials to the SSO
//! endpoint, identified by the application key header. The token has no
//! expiry tracked here; invalidation is discovered through failed
//! operations.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Default SSO login endpoint.
pub const SSO_URL: &str = "https://identitysso.betfair.com/api/login";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("login rejected: {0}")]
    Rejected(String),

    #[error("login succeeded but no session token returned")]
    MissingToken,
}

/// Exchange account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub app_key: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Loads credentials from the environment, if all three are set.
    pub fn from_env() -> Option<Self> {
        let app_key = std::env::var("BETFAIR_APP_KEY").ok()?;
        let username = std::env::var("BETFAIR_USERNAME").ok()?;
        let password = std::env::var("BETFAIR_PASSWORD").ok()?;

        Some(Self {
            app_key,
            username,
            password,
        })
    }

    pub fn new(app_key: String, username: String, password: String) -> Self {
        Self {
            app_key,
            username,
            password,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &"[REDACTED]")
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    session_token: Option<String>,
    login_status: String,
}

/// Authenticates against the SSO endpoint and returns the session token.
pub async fn login(
    http: &reqwest::Client,
    sso_url: &str,
    credentials: &Credentials,
) -> Result<String, AuthError> {
    info!("authenticating with exchange");

    let response = http
        .post(sso_url)
        .header("X-Application", &credentials.app_key)
        .header("Accept", "application/json")
        .form(&[
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AuthError::Rejected(format!("HTTP {}", response.status())));
    }

    let body: LoginResponse = response.json().await?;
    if body.login_status != "SUCCESS" {
        return Err(AuthError::Rejected(body.login_status));
    }

    let token = body.session_token.ok_or(AuthError::MissingToken)?;
    info!("exchange authentication successful");
    Ok(token)
}
