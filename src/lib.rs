//! Client-side session and authentication state coordination for the ADV
//! Technologies site.
//!
//! ARCHITECTURE
//! ============
//! Authentication itself is delegated to a hosted backend-as-a-service; this
//! crate owns the one piece of real state on the client: whether the visitor
//! is signed in, the mirror of the provider's session-event stream, the
//! client-side inactivity timeout, and the guarded entry points page scripts
//! call (login, signup with email verification, logout, username checks).
//! DOM work (validation bubbles, modals, navigation) stays in the pages:
//! the coordinator hands them [`Effect`] values to perform instead of
//! touching the document, and collaborators are injected traits so the state
//! machine tests against scripted fakes.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod inactivity;
pub mod profile;
pub mod provider;
pub mod rest;
pub mod session;
pub mod signup;
pub mod username;

pub use config::CoordinatorConfig;
pub use coordinator::{
    AuthSnapshot, Effect, NoticeKind, PageAccess, SessionCoordinator, SignupAccepted, VerifyOutcome,
};
pub use error::{ErrorCategory, LoginError, ProviderError, ResendError, SignupError, VerifyError};
pub use profile::{ProfileRecord, Role};
pub use provider::{AuthProvider, LastActiveStore, MemoryLastActive, ProfileStore};
pub use rest::{RestClient, RestConfig};
pub use session::{AuthUser, OtpPurpose, Session, SessionEvent, SessionEventKind, SignupMetadata, SignupOutcome};
pub use signup::{FieldViolation, SignupField, SignupForm};
pub use username::{suggest_usernames, suggest_usernames_default, validate_username};
