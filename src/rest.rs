//! HTTP adapter for the hosted backend-as-a-service.
//!
//! Speaks the provider's GoTrue-style auth endpoints (`/auth/v1/...`) and
//! PostgREST-style table reads (`/rest/v1/user_profiles`). Every request
//! carries the project's publishable key; reads made while signed in also
//! carry the current access token so row-level security applies.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::inactivity::now_ms;
use crate::profile::ProfileRecord;
use crate::provider::{AuthProvider, ProfileStore};
use crate::session::{AuthUser, OtpPurpose, Session, SignupMetadata, SignupOutcome};

const PROFILE_TABLE: &str = "user_profiles";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`.
    pub base_url: String,
    /// Publishable (anon) API key sent with every request.
    pub anon_key: String,
}

impl RestConfig {
    /// Load from `BACKEND_URL` and `BACKEND_ANON_KEY`. Returns `None` if
    /// either is missing (auth pages will render signed-out).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("BACKEND_URL").ok()?;
        let anon_key = std::env::var("BACKEND_ANON_KEY").ok()?;
        Some(Self { base_url, anon_key })
    }

    fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    fn table_endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }
}

/// Sign-up responses come back in two shapes: a full session when email
/// confirmation is disabled, or just the user record when a code was sent.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Session(Session),
    UserOnly(AuthUser),
}

/// `reqwest`-backed implementation of [`AuthProvider`] and [`ProfileStore`].
pub struct RestClient {
    config: RestConfig,
    http: reqwest::Client,
    /// Session adopted by the most recent sign-in/verify on this client.
    session: Mutex<Option<Session>>,
}

impl RestClient {
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            session: Mutex::new(None),
        }
    }

    fn remember(&self, session: &Session) {
        *self.lock_session() = Some(session.clone());
    }

    fn forget(&self) {
        *self.lock_session() = None;
    }

    fn current(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn bearer(&self) -> String {
        self.current()
            .map_or_else(|| self.config.anon_key.clone(), |s| s.access_token)
    }

    async fn post_auth(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ProviderError> {
        let mut request = self
            .http
            .post(self.config.auth_endpoint(path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer())
            .json(body);
        if !query.is_empty() {
            request = request.query(query);
        }
        request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }

    async fn select<T: serde::de::DeserializeOwned>(&self, query: &[(&str, &str)]) -> Result<Vec<T>, ProviderError> {
        let resp = self
            .http
            .get(self.config.table_endpoint(PROFILE_TABLE))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer())
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(into_api_error(resp).await);
        }
        resp.json::<Vec<T>>()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }
}

#[async_trait]
impl AuthProvider for RestClient {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        if !session_expired(&session, now_ms()) {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.clone() else {
            self.forget();
            return Ok(None);
        };
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let resp = self.post_auth("token", &[("grant_type", "refresh_token")], &body).await?;
        if !resp.status().is_success() {
            // A rejected refresh means the session is gone, not that the
            // call itself failed.
            let err = into_api_error(resp).await;
            tracing::debug!(error = %err, "session refresh rejected");
            self.forget();
            return Ok(None);
        }
        let refreshed: Session = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        self.remember(&refreshed);
        Ok(Some(refreshed))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let resp = self.post_auth("token", &[("grant_type", "password")], &body).await?;
        if !resp.status().is_success() {
            return Err(into_api_error(resp).await);
        }
        let session: Session = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        self.remember(&session);
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<SignupOutcome, ProviderError> {
        let body = serde_json::json!({ "email": email, "password": password, "data": metadata });
        let resp = self.post_auth("signup", &[], &body).await?;
        if !resp.status().is_success() {
            return Err(into_api_error(resp).await);
        }
        let parsed: SignupResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(match parsed {
            SignupResponse::Session(session) => {
                self.remember(&session);
                SignupOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignupResponse::UserOnly(user) => SignupOutcome { user, session: None },
        })
    }

    async fn verify_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<Session, ProviderError> {
        let body = serde_json::json!({ "email": email, "token": code, "type": purpose.as_str() });
        let resp = self.post_auth("verify", &[], &body).await?;
        if !resp.status().is_success() {
            return Err(into_api_error(resp).await);
        }
        let session: Session = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        self.remember(&session);
        Ok(session)
    }

    async fn resend_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), ProviderError> {
        let body = serde_json::json!({ "email": email, "type": purpose.as_str() });
        let resp = self.post_auth("resend", &[], &body).await?;
        if !resp.status().is_success() {
            return Err(into_api_error(resp).await);
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let token = self.current().map(|s| s.access_token);
        self.forget();
        let Some(token) = token else {
            return Ok(());
        };
        let resp = self
            .http
            .post(self.config.auth_endpoint("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        // 401 just means the token was already dead; either way we are out.
        if resp.status().is_success() || resp.status().as_u16() == 401 {
            Ok(())
        } else {
            Err(into_api_error(resp).await)
        }
    }
}

#[async_trait]
impl ProfileStore for RestClient {
    async fn profile_by_id(&self, id: Uuid) -> Result<Option<ProfileRecord>, ProviderError> {
        let rows: Vec<ProfileRecord> = self
            .select(&[("id", &format!("eq.{id}")), ("select", "*"), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn email_for_username(&self, username: &str) -> Result<Option<String>, ProviderError> {
        #[derive(Deserialize)]
        struct EmailRow {
            email: String,
        }
        let rows: Vec<EmailRow> = self
            .select(&[("username", &format!("eq.{username}")), ("select", "email"), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next().map(|r| r.email))
    }

    async fn username_taken(&self, username: &str) -> Result<bool, ProviderError> {
        let rows: Vec<serde_json::Value> = self
            .select(&[
                ("username", &format!("eq.{username}")),
                ("select", "username"),
                ("limit", "1"),
            ])
            .await?;
        Ok(!rows.is_empty())
    }
}

/// Whether the access token's expiry instant has passed.
fn session_expired(session: &Session, now_epoch_ms: i64) -> bool {
    session
        .expires_at
        .is_some_and(|at| at.saturating_mul(1000) <= now_epoch_ms)
}

async fn into_api_error(resp: reqwest::Response) -> ProviderError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    ProviderError::Api {
        status,
        message: extract_error_message(&body),
    }
}

/// Pull the human-readable message out of a provider error body. GoTrue
/// bodies carry one of `error_description`, `msg`, or `message`; PostgREST
/// uses `message`. Falls back to the raw body text.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_owned();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request failed".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
