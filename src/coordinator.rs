//! The session/auth state coordinator.
//!
//! ARCHITECTURE
//! ============
//! One coordinator instance owns the only mutable auth state on the client:
//! the current user, the cached profile row, the pending-verification flag,
//! and the single inactivity-timer handle. Collaborators (auth provider,
//! profile store, durable last-active storage) are injected traits, so the
//! whole state machine runs against scripted fakes in tests.
//!
//! Page scripts call the public operations and drain the [`Effect`] channel;
//! the coordinator never touches the DOM itself. Session-change events from
//! the provider stream are planned by a pure function ([`plan_event`]) and
//! then applied, so applying the same event twice cannot duplicate timers or
//! leave stale profile data.
//!
//! TRADE-OFFS
//! ==========
//! There is no cancellation token for in-flight provider calls. A profile
//! fetch that resolves after a sign-out or a different sign-in is discarded
//! by comparing the auth epoch captured at request time against the epoch
//! current at resolution time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::error::{ErrorCategory, LoginError, ResendError, SignupError, VerifyError};
use crate::inactivity::{self, InactivityTimer, now_ms};
use crate::profile::{ProfileRecord, Role, profile_grants};
use crate::provider::{AuthProvider, LastActiveStore, ProfileStore};
use crate::session::{AuthUser, OtpPurpose, Session, SessionEvent, SessionEventKind, SignupMetadata};
use crate::signup::{FieldViolation, SignupField, SignupForm, normalize_code, normalize_email, validate_signup};
use crate::username::validate_username;

const INACTIVITY_NOTICE: &str = "You have been logged out due to inactivity. Please log in again to continue.";
const DEFAULT_BAN_NOTICE: &str = "This account has been suspended.";

// =============================================================================
// PUBLIC TYPES
// =============================================================================

/// Side effect the page glue must perform. The coordinator reports these on
/// its channel instead of touching the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Navigate the tab to this page.
    Redirect(String),
    /// Show a toast-style notice.
    Notice { kind: NoticeKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Point-in-time view of the coordinator's state.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
    pub profile: Option<ProfileRecord>,
    pub pending_verification: bool,
}

/// Successful signup submission.
#[derive(Debug, Clone)]
pub struct SignupAccepted {
    pub user: AuthUser,
    /// `true` when the provider withheld a session until the emailed code is
    /// confirmed.
    pub needs_verification: bool,
}

/// How a verification attempt concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code accepted; a session was adopted.
    SignedIn,
    /// The email was already confirmed. Treated as success; the session (if
    /// any) arrives through the provider's event stream.
    AlreadyVerified,
}

/// Result of a page guard check.
#[derive(Debug, Clone)]
pub enum PageAccess {
    Granted(AuthSnapshot),
    RedirectToLogin,
    Denied,
}

// =============================================================================
// STATE
// =============================================================================

/// Signup submitted, one-time code not yet confirmed. Blocks premature
/// dismissal of the verification step.
#[derive(Debug, Clone)]
struct PendingVerification {
    email: String,
}

#[derive(Default)]
struct CoordinatorState {
    authenticated: bool,
    user: Option<AuthUser>,
    profile: Option<ProfileRecord>,
    pending_verification: Option<PendingVerification>,
    /// Bumped on every adoption of a different user and on every clear;
    /// in-flight profile fetches compare it before applying their result.
    auth_epoch: u64,
    timer: InactivityTimer,
}

impl CoordinatorState {
    /// Whether a fetch issued at (`user_id`, `epoch`) still matches reality.
    fn still_current(&self, user_id: Uuid, epoch: u64) -> bool {
        self.auth_epoch == epoch && self.user.as_ref().is_some_and(|u| u.id == user_id)
    }
}

/// What an incoming session event should do to local state, decided without
/// touching the network.
#[derive(Debug, Clone)]
enum EventPlan {
    /// Adopt the session (and refresh the profile).
    Adopt(Session),
    /// Clear every local entity; the provider already ended the session.
    Clear,
    /// Keep the session, restart the inactivity clock.
    RefreshTimer,
    /// Update the user projection in place and refresh the profile.
    UpdateUser(AuthUser),
    Ignore,
}

/// Pure dispatch for the provider's session-change notifications.
fn plan_event(authenticated: bool, event: &SessionEvent) -> EventPlan {
    match (event.kind, &event.session) {
        (SessionEventKind::SignedIn | SessionEventKind::InitialSession | SessionEventKind::TokenRefreshed, Some(session)) => {
            EventPlan::Adopt(session.clone())
        }
        (SessionEventKind::SignedOut, _) => EventPlan::Clear,
        (SessionEventKind::TokenRefreshed, None) => {
            if authenticated {
                EventPlan::RefreshTimer
            } else {
                EventPlan::Ignore
            }
        }
        (SessionEventKind::UserUpdated, Some(session)) => {
            if authenticated {
                EventPlan::UpdateUser(session.user.clone())
            } else {
                EventPlan::Adopt(session.clone())
            }
        }
        (
            SessionEventKind::SignedIn | SessionEventKind::InitialSession | SessionEventKind::UserUpdated,
            None,
        )
        | (SessionEventKind::PasswordRecovery, _) => EventPlan::Ignore,
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// The one stateful component on the client. Cheap to clone; clones share
/// state.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Mutex<CoordinatorState>>,
    provider: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    last_active: Arc<dyn LastActiveStore>,
    config: Arc<CoordinatorConfig>,
    effects: mpsc::UnboundedSender<Effect>,
}

impl SessionCoordinator {
    /// Build a coordinator and the channel its side effects arrive on.
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileStore>,
        last_active: Arc<dyn LastActiveStore>,
        config: CoordinatorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Effect>) {
        let (effects, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            inner: Arc::new(Mutex::new(CoordinatorState::default())),
            provider,
            profiles,
            last_active,
            config: Arc::new(config),
            effects,
        };
        (coordinator, rx)
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        let state = self.lock();
        AuthSnapshot {
            authenticated: state.authenticated,
            user: state.user.clone(),
            profile: state.profile.clone(),
            pending_verification: state.pending_verification.is_some(),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().authenticated
    }

    /// Email awaiting its one-time code, if a signup is mid-verification.
    #[must_use]
    pub fn pending_verification_email(&self) -> Option<String> {
        self.lock().pending_verification.as_ref().map(|p| p.email.clone())
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Restore any existing provider session and settle the initial state.
    ///
    /// Never fails the page: provider errors downgrade to signed-out and are
    /// logged. Concludes with a snapshot the caller uses to refresh UI
    /// affordances; activity listeners should then be wired to
    /// [`record_activity`](Self::record_activity) and the visibility hooks.
    pub async fn initialize(&self) -> AuthSnapshot {
        match self.provider.get_session().await {
            Ok(Some(session)) => {
                // A tab can come back long after its last interaction; the
                // stored last-active timestamp decides before we adopt.
                let stale = self
                    .last_active
                    .load()
                    .is_some_and(|stored| inactivity::exceeded(stored, now_ms(), self.config.inactivity_timeout));
                if stale {
                    tracing::info!("stored last-active timestamp exceeds the inactivity timeout");
                    self.force_logout(INACTIVITY_NOTICE).await;
                    return self.snapshot();
                }
                let epoch = self.adopt(&session);
                self.load_profile(session.user.id, epoch).await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "session restore failed; starting signed out");
            }
        }
        self.snapshot()
    }

    /// End the session and send the visitor home. Safe to call signed-out.
    pub async fn logout(&self) {
        self.end_session().await;
        self.emit(Effect::Redirect(self.config.home_page.clone()));
    }

    // =========================================================================
    // LOGIN
    // =========================================================================

    /// Sign in with an email, or (when configured) a username resolved to
    /// an email through the profile store.
    ///
    /// # Errors
    ///
    /// Returns a field-scoped [`LoginError`]; never panics and never leaks a
    /// raw transport failure.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthSnapshot, LoginError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(LoginError::EmptyIdentifier);
        }
        if password.is_empty() {
            return Err(LoginError::EmptyPassword);
        }

        let email = self.resolve_identifier(identifier).await?;

        match self.provider.sign_in_with_password(&email, password).await {
            Ok(session) => {
                let epoch = self.adopt(&session);
                self.load_profile(session.user.id, epoch).await;
                Ok(self.snapshot())
            }
            Err(e) => {
                tracing::info!(error = %e, "password sign-in rejected");
                Err(match ErrorCategory::classify(&e) {
                    ErrorCategory::BadCredentials => LoginError::BadCredentials,
                    ErrorCategory::EmailUnconfirmed => LoginError::EmailUnconfirmed,
                    _ => LoginError::Other(e.to_string()),
                })
            }
        }
    }

    /// Turn the login identifier into the email to hand the provider. A
    /// lookup miss never reaches the password endpoint.
    async fn resolve_identifier(&self, identifier: &str) -> Result<String, LoginError> {
        if let Some(email) = normalize_email(identifier) {
            return Ok(email);
        }
        if !self.config.login_with_username {
            return Err(LoginError::IdentifierNotFound);
        }
        let handle = identifier.to_ascii_lowercase();
        match self.profiles.email_for_username(&handle).await {
            Ok(Some(email)) => Ok(email),
            Ok(None) => Err(LoginError::IdentifierNotFound),
            Err(e) => {
                tracing::warn!(error = %e, "username lookup failed");
                Err(LoginError::Other(e.to_string()))
            }
        }
    }

    // =========================================================================
    // SIGNUP + VERIFICATION
    // =========================================================================

    /// Validate and submit the signup form.
    ///
    /// All field violations are collected locally before any network call;
    /// the availability pre-check runs on the lowercased username, and the
    /// provider's own duplicate detection backstops the race the pre-check
    /// cannot close.
    ///
    /// # Errors
    ///
    /// [`SignupError::Invalid`] carries every violation; the remaining
    /// variants classify provider rejections.
    pub async fn signup(&self, form: &SignupForm) -> Result<SignupAccepted, SignupError> {
        let violations = validate_signup(form);
        if !violations.is_empty() {
            return Err(SignupError::Invalid(violations));
        }

        let username = form.username.to_ascii_lowercase();
        match self.profiles.username_taken(&username).await {
            Ok(false) => {}
            Ok(true) => return Err(SignupError::UsernameTaken),
            Err(e) => {
                // Availability could not be proven; fail closed rather than
                // race toward a duplicate.
                tracing::warn!(error = %e, "availability check failed during signup");
                return Err(SignupError::UsernameTaken);
            }
        }

        let Some(email) = normalize_email(&form.email) else {
            return Err(SignupError::Invalid(vec![FieldViolation::new(
                SignupField::Email,
                "enter a valid email address",
            )]));
        };
        let metadata = SignupMetadata {
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
            username,
            date_of_birth: form.date_of_birth.trim().to_owned(),
            profession: form.profession.trim().to_owned(),
        };

        match self.provider.sign_up(&email, &form.password, &metadata).await {
            Ok(outcome) => {
                let needs_verification = outcome.session.is_none();
                if let Some(session) = &outcome.session {
                    let epoch = self.adopt(session);
                    self.load_profile(session.user.id, epoch).await;
                } else {
                    self.lock().pending_verification = Some(PendingVerification { email });
                }
                Ok(SignupAccepted {
                    user: outcome.user,
                    needs_verification,
                })
            }
            Err(e) => {
                tracing::info!(error = %e, "provider sign-up rejected");
                Err(match ErrorCategory::classify(&e) {
                    ErrorCategory::AlreadyRegistered => SignupError::EmailRegistered,
                    ErrorCategory::DuplicateUsername => SignupError::UsernameTaken,
                    _ => SignupError::Other(e.to_string()),
                })
            }
        }
    }

    /// Confirm the emailed one-time code for a fresh signup.
    ///
    /// # Errors
    ///
    /// Code-shape failures are local and synchronous; provider rejections
    /// are classified into expired (resend) vs other.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<VerifyOutcome, VerifyError> {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return Err(VerifyError::EmptyEmail);
        }
        let Some(code) = normalize_code(code) else {
            return Err(VerifyError::BadCodeFormat);
        };

        match self.provider.verify_otp(&email, &code, OtpPurpose::Signup).await {
            Ok(session) => {
                let epoch = self.adopt(&session);
                self.load_profile(session.user.id, epoch).await;
                Ok(VerifyOutcome::SignedIn)
            }
            Err(e) => match ErrorCategory::classify(&e) {
                ErrorCategory::ExpiredCode => Err(VerifyError::ExpiredCode),
                ErrorCategory::AlreadyVerified => {
                    self.lock().pending_verification = None;
                    Ok(VerifyOutcome::AlreadyVerified)
                }
                _ => {
                    tracing::info!(error = %e, "code verification rejected");
                    Err(VerifyError::Other(e.to_string()))
                }
            },
        }
    }

    /// Ask the provider to email a fresh code. Leaves the pending flag
    /// untouched.
    ///
    /// # Errors
    ///
    /// Rate limiting is surfaced distinctly so the page can show a wait
    /// hint.
    pub async fn resend_code(&self, email: &str) -> Result<(), ResendError> {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return Err(ResendError::EmptyEmail);
        }
        match self.provider.resend_otp(&email, OtpPurpose::Signup).await {
            Ok(()) => Ok(()),
            Err(e) => match ErrorCategory::classify(&e) {
                ErrorCategory::RateLimited => Err(ResendError::RateLimited),
                _ => {
                    tracing::info!(error = %e, "code resend rejected");
                    Err(ResendError::Other(e.to_string()))
                }
            },
        }
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    /// Load and cache the current user's profile row.
    ///
    /// Returns `None` when signed out, when no row exists yet (a
    /// provisioning race after signup), when the store call fails, or when a
    /// ban forced the session closed. Callers must treat `None` as least
    /// privilege.
    pub async fn fetch_profile(&self) -> Option<ProfileRecord> {
        let (user_id, epoch) = {
            let state = self.lock();
            let user = state.user.as_ref()?;
            (user.id, state.auth_epoch)
        };
        self.load_profile(user_id, epoch).await
    }

    /// Fetch the row for `user_id`, applying the result only if the
    /// coordinator is still on `epoch` when the fetch resolves.
    async fn load_profile(&self, user_id: Uuid, epoch: u64) -> Option<ProfileRecord> {
        let fetched = match self.profiles.profile_by_id(user_id).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "profile fetch failed; treating as no profile");
                return None;
            }
        };

        match fetched {
            Some(profile) if profile.is_banned => {
                if !self.lock().still_current(user_id, epoch) {
                    tracing::debug!(%user_id, "discarding stale profile fetch result");
                    return None;
                }
                tracing::warn!(%user_id, "banned account detected, forcing logout");
                let notice = profile.ban_reason.unwrap_or_else(|| DEFAULT_BAN_NOTICE.to_owned());
                self.force_logout(&notice).await;
                None
            }
            Some(profile) => {
                let mut state = self.lock();
                if !state.still_current(user_id, epoch) {
                    tracing::debug!(%user_id, "discarding stale profile fetch result");
                    return None;
                }
                state.profile = Some(profile.clone());
                Some(profile)
            }
            None => None,
        }
    }

    // =========================================================================
    // USERNAMES
    // =========================================================================

    /// Whether `name` can still be claimed.
    ///
    /// Invalid format is `false` with no network call. A store failure is
    /// also `false`: an availability outage must not open a
    /// duplicate-username race.
    pub async fn check_username_available(&self, name: &str) -> bool {
        if validate_username(name).is_err() {
            return false;
        }
        match self.profiles.username_taken(name).await {
            Ok(taken) => !taken,
            Err(e) => {
                tracing::warn!(error = %e, "availability check failed; reporting unavailable");
                false
            }
        }
    }

    // =========================================================================
    // ACTIVITY + VISIBILITY
    // =========================================================================

    /// Note a tracked user interaction: push the pending logout out by the
    /// full timeout. While signed out this only clears any leftover timer.
    pub fn record_activity(&self) {
        let mut state = self.lock();
        if state.authenticated {
            self.arm_timer_locked(&mut state);
        } else {
            state.timer.cancel();
        }
    }

    /// The tab went hidden (or is unloading): persist the last-active
    /// instant so a future tab can evaluate the gap.
    pub fn tab_hidden(&self) {
        self.last_active.store(now_ms());
    }

    /// The tab became visible again: either the visitor was away too long
    /// (force the logout now) or the clock restarts.
    pub async fn tab_visible(&self) {
        if self.lock().authenticated {
            let away_too_long = self
                .last_active
                .load()
                .is_some_and(|stored| inactivity::exceeded(stored, now_ms(), self.config.inactivity_timeout));
            if away_too_long {
                self.force_logout(INACTIVITY_NOTICE).await;
                return;
            }
        }
        self.record_activity();
    }

    // =========================================================================
    // PAGE GUARD
    // =========================================================================

    /// Gate a protected page, emitting the matching redirect effect.
    ///
    /// A role requirement is only satisfied by a present profile whose role
    /// grants it; a missing row means least privilege, never an assumed
    /// role.
    pub async fn guard_page(&self, required_role: Option<Role>) -> PageAccess {
        let snapshot = self.snapshot();
        if !snapshot.authenticated {
            self.emit(Effect::Redirect(self.config.login_page.clone()));
            return PageAccess::RedirectToLogin;
        }
        let Some(required) = required_role else {
            return PageAccess::Granted(snapshot);
        };

        // The row may still be provisioning; try once more before denying.
        let profile = match snapshot.profile {
            Some(profile) => Some(profile),
            None => self.fetch_profile().await,
        };
        if !self.lock().authenticated {
            // A ban surfaced mid-check; its effects are already queued.
            return PageAccess::RedirectToLogin;
        }
        if profile_grants(profile.as_ref(), required) {
            return PageAccess::Granted(self.snapshot());
        }
        self.emit(Effect::Notice {
            kind: NoticeKind::Error,
            message: "Access denied.".to_owned(),
        });
        self.emit(Effect::Redirect(self.config.fallback_page.clone()));
        PageAccess::Denied
    }

    // =========================================================================
    // EVENT STREAM
    // =========================================================================

    /// Mirror one provider session-change notification into local state.
    ///
    /// Idempotent: adoption re-arms (never duplicates) the timer, and
    /// clearing an already-clear state is a no-op.
    pub async fn apply_session_event(&self, event: &SessionEvent) {
        let plan = plan_event(self.lock().authenticated, event);
        match plan {
            EventPlan::Adopt(session) => {
                let epoch = self.adopt(&session);
                self.load_profile(session.user.id, epoch).await;
            }
            EventPlan::Clear => {
                let mut state = self.lock();
                state.authenticated = false;
                state.user = None;
                state.profile = None;
                // The verification step stays up: this notification cannot
                // abandon a signup that never had a session.
                state.auth_epoch += 1;
                state.timer.cancel();
                drop(state);
                self.last_active.clear();
            }
            EventPlan::RefreshTimer => {
                let mut state = self.lock();
                if state.authenticated {
                    self.arm_timer_locked(&mut state);
                }
            }
            EventPlan::UpdateUser(user) => {
                let (user_id, epoch) = {
                    let mut state = self.lock();
                    if !state.authenticated {
                        return;
                    }
                    let id = user.id;
                    state.user = Some(user);
                    (id, state.auth_epoch)
                };
                self.load_profile(user_id, epoch).await;
            }
            EventPlan::Ignore => {}
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Adopt a provider session as the current user and arm the timer.
    /// Returns the auth epoch the adoption settled on.
    fn adopt(&self, session: &Session) -> u64 {
        let mut state = self.lock();
        let same_user = state.user.as_ref().is_some_and(|u| u.id == session.user.id);
        state.authenticated = true;
        state.user = Some(session.user.clone());
        if !same_user {
            // Never let the previous user's row show through.
            state.profile = None;
            state.auth_epoch += 1;
        }
        state.pending_verification = None;
        let epoch = state.auth_epoch;
        self.arm_timer_locked(&mut state);
        drop(state);
        self.last_active.store(now_ms());
        epoch
    }

    /// Clear local state first, then tell the provider. Nobody can observe
    /// an authenticated coordinator once a forced logout has started.
    async fn end_session(&self) {
        {
            let mut state = self.lock();
            state.authenticated = false;
            state.user = None;
            state.profile = None;
            state.pending_verification = None;
            state.auth_epoch += 1;
            state.timer.cancel();
        }
        self.last_active.clear();
        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!(error = %e, "provider sign-out failed; local state cleared anyway");
        }
    }

    async fn force_logout(&self, notice: &str) {
        self.end_session().await;
        self.emit(Effect::Notice {
            kind: NoticeKind::Error,
            message: notice.to_owned(),
        });
        self.emit(Effect::Redirect(self.config.login_page.clone()));
    }

    async fn handle_inactivity_expiry(&self) {
        if !self.lock().authenticated {
            return;
        }
        tracing::info!("inactivity timeout reached, ending session");
        self.force_logout(INACTIVITY_NOTICE).await;
    }

    /// Spawn the logout task and hand it to the timer slot, which aborts any
    /// prior task so at most one firing is ever pending.
    fn arm_timer_locked(&self, state: &mut CoordinatorState) {
        let coordinator = self.clone();
        let timeout = self.config.inactivity_timeout;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            coordinator.handle_inactivity_expiry().await;
        });
        state.timer.arm(handle);
    }

    fn emit(&self, effect: Effect) {
        // A page that stopped draining effects is shutting down; drop them.
        let _ = self.effects.send(effect);
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
