//! Session identity and the bearer credential.
//!
//! # Lifecycle
//!
//! A new store starts in [`AuthState::Loading`]. [`AuthStore::hydrate`]
//! reads the persisted session and moves it to `Authenticated` or
//! `Anonymous`; anything gated on login should await
//! [`AuthStore::wait_ready`] first rather than treat `Loading` as anonymous.
//!
//! The store is the only holder of the token. The API client asks it for
//! the token on every request through [`CredentialSource`], and a 401 comes
//! back through [`CredentialSource::revoke`], which tears the session down
//! and publishes [`SessionEvent::Expired`]. Hooks registered with
//! [`AuthStore::on_expired`] run just before the event goes out.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use teeshop_core::{User, UserId, UserPatch};

use super::persist::{PersistError, SessionStorage};
use crate::api::CredentialSource;

/// Storage key of the persisted session.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";
const PERSIST_VERSION: u32 = 1;
const EVENT_CAPACITY: usize = 16;

type ExpiryHook = Arc<dyn Fn() + Send + Sync>;

/// A signed-in user and their credential.
#[derive(Clone)]
pub struct AuthSession {
    pub user: User,
    token: SecretString,
}

impl AuthSession {
    #[must_use]
    pub const fn new(user: User, token: SecretString) -> Self {
        Self { user, token }
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone)]
pub enum AuthState {
    /// Persisted state not read yet.
    Loading,
    Authenticated(AuthSession),
    Anonymous,
}

impl AuthState {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Loading | Self::Anonymous => None,
        }
    }
}

/// Session transitions, for front ends that react to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(UserId),
    LoggedOut,
    /// The backend rejected the credential; the user must log in again.
    Expired,
}

/// On-disk shape: `{"state": {...}, "version": 1}`.
#[derive(Serialize, Deserialize)]
struct PersistedEnvelope {
    state: PersistedAuth,
    version: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedAuth {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    is_authenticated: bool,
}

impl PersistedAuth {
    fn from_session(session: &AuthSession) -> Self {
        Self {
            user: Some(session.user.clone()),
            token: Some(session.token.expose_secret().to_string()),
            is_authenticated: true,
        }
    }

    fn into_state(self) -> AuthState {
        match (self.is_authenticated, self.user, self.token) {
            (true, Some(user), Some(token)) if !token.is_empty() => {
                AuthState::Authenticated(AuthSession::new(user, SecretString::from(token)))
            }
            _ => AuthState::Anonymous,
        }
    }
}

/// Auth identity store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    state: watch::Sender<AuthState>,
    events: broadcast::Sender<SessionEvent>,
    storage: Arc<dyn SessionStorage>,
    on_expired: Mutex<Vec<ExpiryHook>>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// A store in the `Loading` state backed by `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(AuthStoreInner {
                state: watch::Sender::new(AuthState::Loading),
                events,
                storage,
                on_expired: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Read the persisted session and leave the `Loading` state.
    ///
    /// Missing, corrupt or unknown-version data hydrates as anonymous. A
    /// login or logout that lands while storage is being read wins over
    /// the persisted copy.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> AuthState {
        let state = match self.inner.storage.load(AUTH_STORAGE_KEY).await {
            Ok(Some(value)) => decode_persisted(value),
            Ok(None) => AuthState::Anonymous,
            Err(e) => {
                warn!(error = %e, "Could not read persisted session, starting anonymous");
                AuthState::Anonymous
            }
        };
        let applied = self.inner.state.send_if_modified(|current| {
            if current.is_ready() {
                false
            } else {
                *current = state;
                true
            }
        });
        if applied {
            debug!(authenticated = self.is_authenticated(), "Session hydrated");
        } else {
            debug!("Session changed while hydrating, keeping it");
        }
        self.state()
    }

    /// Resolve once hydration has finished.
    pub async fn wait_ready(&self) -> AuthState {
        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(AuthState::is_ready).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Start a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the session could not be saved; the
    /// in-memory session is active regardless.
    #[instrument(skip(self, user, token), fields(user_id = %user.id))]
    pub async fn login(&self, user: User, token: SecretString) -> Result<(), PersistError> {
        let session = AuthSession::new(user, token);
        let user_id = session.user.id.clone();
        let persisted = PersistedAuth::from_session(&session);

        self.inner
            .state
            .send_replace(AuthState::Authenticated(session));
        let _ = self.inner.events.send(SessionEvent::LoggedIn(user_id));
        info!("Logged in");

        self.persist(persisted).await
    }

    /// End the session and purge the persisted credential.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the persisted copy could not be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), PersistError> {
        self.inner.state.send_replace(AuthState::Anonymous);
        let _ = self.inner.events.send(SessionEvent::LoggedOut);
        info!("Logged out");
        self.inner.storage.remove(AUTH_STORAGE_KEY).await
    }

    /// Logout forced by the backend rejecting the credential.
    ///
    /// Does nothing unless a session is active.
    #[instrument(skip(self))]
    pub async fn teardown(&self) {
        let was_authenticated = self.inner.state.send_if_modified(|state| {
            if state.is_authenticated() {
                *state = AuthState::Anonymous;
                true
            } else {
                false
            }
        });
        if !was_authenticated {
            return;
        }

        let hooks = self
            .inner
            .on_expired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in hooks {
            hook();
        }
        let _ = self.inner.events.send(SessionEvent::Expired);
        warn!("Session expired");
        if let Err(e) = self.inner.storage.remove(AUTH_STORAGE_KEY).await {
            warn!(error = %e, "Failed to purge persisted session");
        }
    }

    /// Run `hook` every time [`AuthStore::teardown`] ends a live session,
    /// before [`SessionEvent::Expired`] goes out.
    pub fn on_expired(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner
            .on_expired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    /// Shallow-merge profile fields into the current user.
    ///
    /// Returns `false` when no session is active; nothing changes then.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the updated session could not be saved.
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, patch: UserPatch) -> Result<bool, PersistError> {
        let mut persisted = None;
        self.inner.state.send_if_modified(|state| match state {
            AuthState::Authenticated(session) => {
                session.user.apply(patch);
                persisted = Some(PersistedAuth::from_session(session));
                true
            }
            AuthState::Loading | AuthState::Anonymous => false,
        });

        match persisted {
            Some(persisted) => self.persist(persisted).await.map(|()| true),
            None => Ok(false),
        }
    }

    async fn persist(&self, state: PersistedAuth) -> Result<(), PersistError> {
        let envelope = PersistedEnvelope {
            state,
            version: PERSIST_VERSION,
        };
        let value = serde_json::to_value(envelope)?;
        self.inner.storage.save(AUTH_STORAGE_KEY, value).await
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner
            .state
            .borrow()
            .session()
            .map(|session| session.user.clone())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner
            .state
            .borrow()
            .session()
            .is_some_and(|session| session.user.is_admin)
    }

    /// Session transitions from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Watch the lifecycle state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }
}

fn decode_persisted(value: serde_json::Value) -> AuthState {
    match serde_json::from_value::<PersistedEnvelope>(value) {
        Ok(envelope) if envelope.version == PERSIST_VERSION => envelope.state.into_state(),
        Ok(envelope) => {
            warn!(version = envelope.version, "Unknown persisted session version, ignoring");
            AuthState::Anonymous
        }
        Err(e) => {
            warn!(error = %e, "Corrupt persisted session, ignoring");
            AuthState::Anonymous
        }
    }
}

#[async_trait]
impl CredentialSource for AuthStore {
    fn bearer_token(&self) -> Option<SecretString> {
        self.inner
            .state
            .borrow()
            .session()
            .map(|session| session.token.clone())
    }

    async fn revoke(&self) {
        self.teardown().await;
    }
}
