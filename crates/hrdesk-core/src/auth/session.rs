//! Session lifecycle: login, restore-on-startup and logout.
//!
//! `SessionManager` is the single owner of the bearer token and the current
//! user. Feature code gets credentials only through [`SessionManager::gateway`],
//! which binds an `ApiClient` to whatever token is held at that moment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::store::{self, KeyValueStore};
use super::{AuthError, Credentials};
use crate::api::{ApiClient, RequestOptions};
use crate::models::{MeResponse, User};

const LOGIN_ENDPOINT: &str = "/api/auth/login";
const ME_ENDPOINT: &str = "/api/auth/me";

/// Where the session manager currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// A login request is in flight
    Authenticating,
    /// A restored token is being checked against the backend
    Validating,
    Authenticated,
}

impl AuthState {
    /// Dependent views may load once this is true.
    pub fn is_ready(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AuthState::Authenticating | AuthState::Validating)
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticating => write!(f, "authenticating"),
            AuthState::Validating => write!(f, "validating"),
            AuthState::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// What to do with the persisted session when its validation call never
/// reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// Any validation failure clears the persisted session.
    #[default]
    FailClosed,
    /// Transport failures leave the persisted pair in place for the next
    /// restore; server rejections still clear it.
    KeepOnTransportError,
}

/// Result of [`SessionManager::restore_session`].
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Nothing persisted; no request was made.
    NoSession,
    /// The persisted token was accepted.
    Restored,
    /// Validation failed and the persisted session was cleared.
    Invalidated(AuthError),
    /// Validation could not reach the server; the persisted session was kept.
    Deferred(AuthError),
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreOutcome::Restored)
    }
}

/// An authenticated session.
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub authenticated_at: DateTime<Utc>,
}

impl Session {
    fn new(token: String, user: User) -> Self {
        Self {
            token,
            user,
            authenticated_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    employee: User,
}

/// Publishes a transient state and falls back to `Unauthenticated` if the
/// operation is dropped before it settles.
struct PhaseGuard {
    status: Arc<watch::Sender<AuthState>>,
    settled: bool,
}

impl PhaseGuard {
    fn enter(status: &Arc<watch::Sender<AuthState>>, phase: AuthState) -> Self {
        status.send_replace(phase);
        Self {
            status: Arc::clone(status),
            settled: false,
        }
    }

    fn settle(mut self, state: AuthState) {
        self.status.send_replace(state);
        self.settled = true;
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Auth operation abandoned before completion");
            self.status.send_replace(AuthState::Unauthenticated);
        }
    }
}

pub struct SessionManager {
    api: ApiClient,
    store: Box<dyn KeyValueStore>,
    policy: RestorePolicy,
    session: Option<Session>,
    status: Arc<watch::Sender<AuthState>>,
}

impl SessionManager {
    /// `api` is used as a template; its own token, if any, is never used.
    pub fn new(api: ApiClient, store: Box<dyn KeyValueStore>) -> Self {
        let (status, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            api: api.without_token(),
            store,
            policy: RestorePolicy::default(),
            session: None,
            status: Arc::new(status),
        }
    }

    pub fn with_policy(mut self, policy: RestorePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> AuthState {
        *self.status.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// Observe state changes. The value becomes `Authenticated` when a login
    /// or restore succeeds.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.status.subscribe()
    }

    /// Gateway carrying the current token, or no credentials when signed out.
    pub fn gateway(&self) -> ApiClient {
        match self.session {
            Some(ref session) => self.api.with_token(session.token.clone()),
            None => self.api.without_token(),
        }
    }

    /// Authenticate with email and password.
    ///
    /// Signing in while already authenticated first signs the current user
    /// out. On failure the manager is `Unauthenticated` and nothing is
    /// persisted.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        let credentials = Credentials::new(email, password);
        if credentials.is_incomplete() {
            return Err(AuthError::MissingCredentials);
        }

        if self.session.is_some() {
            info!("Replacing existing session");
            self.logout();
        }

        let phase = PhaseGuard::enter(&self.status, AuthState::Authenticating);
        debug!(email = %credentials.email, "Logging in");

        let options = RequestOptions::post().json(&credentials)?;
        let response: LoginResponse = match self.api.send_json(LOGIN_ENDPOINT, options).await {
            Ok(response) => response,
            Err(e) => {
                let err = AuthError::from(e);
                warn!(error = %err, "Login failed");
                phase.settle(AuthState::Unauthenticated);
                return Err(err);
            }
        };

        if response.access_token.is_empty() {
            phase.settle(AuthState::Unauthenticated);
            return Err(AuthError::InvalidResponse(
                "login succeeded without an access token".to_string(),
            ));
        }

        if let Err(e) = store::save_pair(self.store.as_mut(), &response.access_token, &response.employee) {
            phase.settle(AuthState::Unauthenticated);
            return Err(e.into());
        }

        info!(user_id = response.employee.id.as_ref().map(display), "Login successful");
        self.session = Some(Session::new(response.access_token, response.employee));
        phase.settle(AuthState::Authenticated);
        Ok(())
    }

    /// Resume a persisted session, validating its token with the backend.
    ///
    /// With nothing persisted this returns immediately without a request.
    /// A token persisted without its user snapshot (or the reverse) is a
    /// torn write: it is cleared and reported as `NoSession`, also without a
    /// request. Otherwise exactly one call to the identity endpoint is made
    /// and its user record replaces the persisted snapshot.
    pub async fn restore_session(&mut self) -> RestoreOutcome {
        self.session = None;

        let stored = match store::load_pair(self.store.as_mut()) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("No persisted session");
                self.status.send_replace(AuthState::Unauthenticated);
                return RestoreOutcome::NoSession;
            }
            Err(e) => {
                warn!(error = %e, "Persisted session unreadable, clearing it");
                self.clear_persisted();
                self.status.send_replace(AuthState::Unauthenticated);
                return RestoreOutcome::Invalidated(e.into());
            }
        };

        let phase = PhaseGuard::enter(&self.status, AuthState::Validating);
        debug!(has_snapshot = stored.user.is_some(), "Validating persisted session");

        let api = self.api.with_token(stored.token.clone());
        let user = match api.get_json::<MeResponse>(ME_ENDPOINT).await {
            Ok(me) => me.into_user(),
            Err(e) => {
                let keep = self.policy == RestorePolicy::KeepOnTransportError && e.is_transport();
                let err = AuthError::from_validation(e);
                phase.settle(AuthState::Unauthenticated);
                if keep {
                    warn!(error = %err, "Could not reach server, keeping persisted session");
                    return RestoreOutcome::Deferred(err);
                }
                warn!(error = %err, "Persisted session rejected, clearing it");
                self.clear_persisted();
                return RestoreOutcome::Invalidated(err);
            }
        };

        if stored.user.as_ref() != Some(&user) {
            debug!(user_id = user.id.as_ref().map(display), "User record changed since last login");
        }
        if let Err(e) = store::save_user(self.store.as_mut(), &user) {
            warn!(error = %e, "Failed to refresh persisted user snapshot");
        }

        info!(user_id = user.id.as_ref().map(display), "Session restored");
        self.session = Some(Session::new(stored.token, user));
        phase.settle(AuthState::Authenticated);
        RestoreOutcome::Restored
    }

    /// Sign out locally. Never touches the network and always ends
    /// `Unauthenticated`.
    pub fn logout(&mut self) {
        let had_session = self.session.take().is_some();
        self.clear_persisted();
        self.status.send_replace(AuthState::Unauthenticated);
        info!(had_session, "Logged out");
    }

    fn clear_persisted(&mut self) {
        if let Err(e) = store::clear_pair(self.store.as_mut()) {
            warn!(error = %e, "Failed to clear persisted session");
        }
    }
}
