//! Session/view state controller for the login shell.
//!
//! SYSTEM CONTEXT
//! ==============
//! One controller per page session. Views call the transition methods; the
//! controller talks to the auth backend and the persistent store and folds
//! every outcome back into [`ControllerState`]. Nothing it does returns an
//! error to the view layer.
//!
//! DESIGN
//! ======
//! The view is `login`, `signup` or `authenticated`; a pending request is the
//! orthogonal `in_flight` flag, not a fourth view. State sits behind a
//! `Mutex` that is never held across an `.await`, so a second submit issued
//! while the first is still waiting on the backend observes `in_flight` and
//! is dropped.
//!
//! INVARIANTS
//! ==========
//! - A `Session` is in memory iff the view is `authenticated`.
//! - The persisted token and email keys are written together and removed
//!   together. A half-written pair is rolled back.
//! - The form is cleared every time the view changes.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::config::ClientConfig;
use crate::net::api::{AuthApi, HttpAuthApi};
use crate::net::types::{AuthError, Credentials};
use crate::util::storage::{EMAIL_KEY, FileStore, PersistentStore, StoreError, TOKEN_KEY};

pub const LOGIN_FAILED: &str = "Login failed";
pub const SIGNUP_FAILED: &str = "Signup failed";
pub const SESSION_NOT_SAVED: &str = "Could not save session";
pub const SESSION_NOT_CLEARED: &str = "Signed out, but the saved session could not be cleared";

// =============================================================================
// STATE TYPES
// =============================================================================

/// Which screen is active. Exactly one at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Login,
    Signup,
    Authenticated,
}

/// An authenticated identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Input buffer for whichever form is showing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormState")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of the most recent backend call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestStatus {
    pub in_flight: bool,
    pub error_message: Option<String>,
}

/// How much to trust a persisted session at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestorePolicy {
    /// Any complete record restores.
    #[default]
    Trust,
    /// Skip records whose token is a JWT with an `exp` in the past.
    RejectExpired,
}

/// What a submit call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Not dispatched: a request was already in flight or the wrong form is showing.
    Suppressed,
    Succeeded,
    Failed,
}

/// Everything a view needs to render. Obtained via [`SessionController::snapshot`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControllerState {
    view: ViewState,
    form: FormState,
    request: RequestStatus,
    session: Option<Session>,
}

impl ControllerState {
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view
    }

    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub fn request(&self) -> &RequestStatus {
        &self.request
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.request.error_message.as_deref()
    }

    /// Email shown on the signed-in screen.
    #[must_use]
    pub fn signed_in_as(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.email.as_str())
    }

    /// Label for the primary button of the current view.
    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        match (self.view, self.request.in_flight) {
            (ViewState::Login, false) => "Login",
            (ViewState::Login, true) => "Logging in...",
            (ViewState::Signup, false) => "Sign Up",
            (ViewState::Signup, true) => "Signing up...",
            (ViewState::Authenticated, _) => "Logout",
        }
    }

    fn authenticate(&mut self, session: Session) {
        self.view = ViewState::Authenticated;
        self.form = FormState::default();
        self.session = Some(session);
    }

    /// Move to an anonymous view, dropping any session.
    fn enter(&mut self, view: ViewState) {
        debug_assert_ne!(view, ViewState::Authenticated);
        if self.view != view {
            self.form = FormState::default();
        }
        self.view = view;
        self.session = None;
    }
}

// =============================================================================
// RESTORATION
// =============================================================================

/// Hydrate a session from `store` without touching the network.
///
/// Fails open: an empty, partial or unreadable store yields `None`.
pub fn restore<S: PersistentStore + ?Sized>(store: &S, policy: RestorePolicy) -> Option<Session> {
    restore_at(store, policy, unix_now())
}

fn restore_at<S: PersistentStore + ?Sized>(store: &S, policy: RestorePolicy, now: u64) -> Option<Session> {
    let token = read_key(store, TOKEN_KEY)?;
    let email = read_key(store, EMAIL_KEY)?;

    if policy == RestorePolicy::RejectExpired && jwt_expired(&token, now) == Some(true) {
        tracing::info!(%email, "stored session token expired; starting signed out");
        return None;
    }

    tracing::info!(%email, "restored session");
    Some(Session { email, token })
}

fn read_key<S: PersistentStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(Some(value)) if !value.is_empty() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, key, "session store unreadable; starting signed out");
            None
        }
    }
}

/// `Some(true)` if `token` is a JWT whose `exp` is at or before `now`.
/// `None` when the token is not a decodable JWT or has no `exp`.
#[allow(clippy::cast_precision_loss)]
fn jwt_expired(token: &str, now: u64) -> Option<bool> {
    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_f64()?;
    Some(exp <= now as f64)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct SessionController<A, S> {
    api: A,
    store: S,
    state: Mutex<ControllerState>,
}

impl<A: AuthApi, S: PersistentStore> SessionController<A, S> {
    /// Build a controller, restoring any persisted session as-is.
    pub fn new(api: A, store: S) -> Self {
        Self::with_policy(api, store, RestorePolicy::Trust)
    }

    /// Build a controller with an explicit restore policy.
    pub fn with_policy(api: A, store: S, policy: RestorePolicy) -> Self {
        let mut state = ControllerState::default();
        if let Some(session) = restore(&store, policy) {
            state.authenticate(session);
        }
        Self { api, store, state: Mutex::new(state) }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> ControllerState {
        self.lock().clone()
    }

    #[must_use]
    pub fn view(&self) -> ViewState {
        self.lock().view
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    // -------------------------------------------------------------------------
    // form input
    // -------------------------------------------------------------------------

    pub fn set_email(&self, email: impl Into<String>) {
        let mut state = self.lock();
        if state.view != ViewState::Authenticated {
            state.form.email = email.into();
        }
    }

    pub fn set_password(&self, password: impl Into<String>) {
        let mut state = self.lock();
        if state.view != ViewState::Authenticated {
            state.form.password = password.into();
        }
    }

    // -------------------------------------------------------------------------
    // view switches
    // -------------------------------------------------------------------------

    /// `login -> signup`. Returns `false` from any other view.
    pub fn switch_to_signup(&self) -> bool {
        self.switch(ViewState::Login, ViewState::Signup)
    }

    /// `signup -> login`. Returns `false` from any other view.
    pub fn switch_to_login(&self) -> bool {
        self.switch(ViewState::Signup, ViewState::Login)
    }

    fn switch(&self, from: ViewState, to: ViewState) -> bool {
        let mut state = self.lock();
        if state.view != from {
            return false;
        }
        state.enter(to);
        state.request.error_message = None;
        true
    }

    // -------------------------------------------------------------------------
    // submits
    // -------------------------------------------------------------------------

    /// Mark a request in flight and copy out the credentials, or `None` if
    /// the submit must be dropped.
    fn begin_submit(&self, form_view: ViewState) -> Option<Credentials> {
        let mut state = self.lock();
        if state.request.in_flight || state.view != form_view {
            return None;
        }
        state.request.in_flight = true;
        state.request.error_message = None;
        Some(Credentials::new(state.form.email.clone(), state.form.password.clone()))
    }

    /// Submit the login form.
    pub async fn submit_login(&self) -> SubmitOutcome {
        let Some(credentials) = self.begin_submit(ViewState::Login) else {
            tracing::debug!("login submit suppressed");
            return SubmitOutcome::Suppressed;
        };

        let token = match self.api.login(&credentials).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, email = %credentials.email, "login failed");
                self.fail(ViewState::Login, e.user_message(LOGIN_FAILED));
                return SubmitOutcome::Failed;
            }
        };

        let session = Session { email: credentials.email, token: token.access_token };
        if let Err(e) = persist(&self.store, &session) {
            tracing::error!(error = %e, email = %session.email, "could not persist session; staying signed out");
            self.fail(ViewState::Login, SESSION_NOT_SAVED.to_owned());
            return SubmitOutcome::Failed;
        }

        tracing::info!(email = %session.email, "signed in");
        let mut state = self.lock();
        state.request.in_flight = false;
        state.authenticate(session);
        SubmitOutcome::Succeeded
    }

    /// Submit the signup form. Success lands on an empty login form.
    pub async fn submit_signup(&self) -> SubmitOutcome {
        let Some(credentials) = self.begin_submit(ViewState::Signup) else {
            tracing::debug!("signup submit suppressed");
            return SubmitOutcome::Suppressed;
        };

        match self.api.signup(&credentials).await {
            Ok(()) => {
                tracing::info!(email = %credentials.email, "account created");
                let mut state = self.lock();
                state.request.in_flight = false;
                state.enter(ViewState::Login);
                state.form = FormState::default();
                SubmitOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!(error = %e, email = %credentials.email, "signup failed");
                self.fail(ViewState::Signup, e.user_message(SIGNUP_FAILED));
                SubmitOutcome::Failed
            }
        }
    }

    fn fail(&self, view: ViewState, message: String) {
        let mut state = self.lock();
        state.request.in_flight = false;
        state.enter(view);
        state.request.error_message = Some(message);
    }

    // -------------------------------------------------------------------------
    // logout
    // -------------------------------------------------------------------------

    /// `authenticated -> login`. Returns `false` from any other view.
    ///
    /// The in-memory session is always dropped; a store that refuses the
    /// removal is reported through the error message.
    pub fn logout(&self) -> bool {
        let mut state = self.lock();
        if state.view != ViewState::Authenticated {
            return false;
        }
        let email = state.session.as_ref().map(|s| s.email.clone()).unwrap_or_default();
        state.enter(ViewState::Login);
        state.request.error_message = None;

        match clear_persisted(&self.store) {
            Ok(()) => tracing::info!(%email, "signed out"),
            Err(e) => {
                tracing::error!(error = %e, %email, "signed out but persisted session could not be removed");
                state.request.error_message = Some(SESSION_NOT_CLEARED.to_owned());
            }
        }
        true
    }
}

impl SessionController<HttpAuthApi, FileStore> {
    /// Wire the HTTP backend client and the file store from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AuthError> {
        let api = HttpAuthApi::new(config.api_base_url.clone(), config.timeouts)?;
        let store = FileStore::new(&config.store_path);
        Ok(Self::with_policy(api, store, config.restore_policy))
    }
}

/// Write both keys, rolling back on partial failure.
fn persist<S: PersistentStore + ?Sized>(store: &S, session: &Session) -> Result<(), StoreError> {
    let written = store
        .set(TOKEN_KEY, &session.token)
        .and_then(|()| store.set(EMAIL_KEY, &session.email));
    if let Err(e) = written {
        if let Err(rollback) = clear_persisted(store) {
            tracing::warn!(error = %rollback, "rollback of partial session write failed");
        }
        return Err(e);
    }
    Ok(())
}

/// Remove both keys, attempting each even if the first fails.
fn clear_persisted<S: PersistentStore + ?Sized>(store: &S) -> Result<(), StoreError> {
    let token = store.remove(TOKEN_KEY);
    let email = store.remove(EMAIL_KEY);
    token.and(email)
}
