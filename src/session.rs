//! Session and user projections of the external auth provider, plus the
//! session-change notifications its event stream delivers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token bundle issued by the external provider. Held only for the
/// lifetime of the tab; the provider owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds when the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Projection of the session's subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// RFC 3339 confirmation instant; `None` until the signup code is used.
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    /// Raw signup metadata (first/last name, username, dob, profession).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Metadata embedded in the provider's sign-up call and echoed back on the
/// user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupMetadata {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub date_of_birth: String,
    pub profession: String,
}

/// What the provider handed back from sign-up.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub user: AuthUser,
    /// Absent when the provider withholds the session pending email
    /// verification.
    pub session: Option<Session>,
}

/// Purpose tag carried on one-time-code calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Signup,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
        }
    }
}

/// Session-change notification kinds delivered by the provider stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    InitialSession,
    PasswordRecovery,
}

/// A session-change notification.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
