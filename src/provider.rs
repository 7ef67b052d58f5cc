//! Collaborator trait seams for the external backend.
//!
//! DESIGN
//! ======
//! The coordinator never talks HTTP directly; it drives these traits so the
//! state machine can be exercised against scripted in-memory collaborators
//! while production pages hand it the `rest` adapter. All payload shapes are
//! dictated by the provider's contract, not owned here.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::profile::ProfileRecord;
use crate::session::{OtpPurpose, Session, SignupMetadata, SignupOutcome};

/// External auth/session provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Return the session for this tab, if the provider still has one.
    async fn get_session(&self) -> Result<Option<Session>, ProviderError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<SignupOutcome, ProviderError>;

    async fn verify_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<Session, ProviderError>;

    async fn resend_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// External profile store: point lookups keyed by user id or username.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile_by_id(&self, id: Uuid) -> Result<Option<ProfileRecord>, ProviderError>;

    /// Resolve a username to the email it was registered with.
    async fn email_for_username(&self, username: &str) -> Result<Option<String>, ProviderError>;

    /// Whether the (case-normalized) username already has a profile row.
    async fn username_taken(&self, username: &str) -> Result<bool, ProviderError>;
}

/// Durable client-side storage for the shared last-active timestamp (epoch
/// milliseconds). Cross-tab coordination through it is best-effort only:
/// there is no lock, just a value each tab reads on load/visibility-restore
/// and writes on hide/unload.
pub trait LastActiveStore: Send + Sync {
    fn load(&self) -> Option<i64>;
    fn store(&self, epoch_ms: i64);
    fn clear(&self);
}

/// In-memory [`LastActiveStore`], the stand-in for real browser storage in
/// tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryLastActive {
    slot: std::sync::Mutex<Option<i64>>,
}

impl LastActiveStore for MemoryLastActive {
    fn load(&self) -> Option<i64> {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn store(&self, epoch_ms: i64) {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(epoch_ms);
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
