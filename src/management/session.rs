use std::{
    fmt,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, RwLock, broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use url::Url;

use crate::{
    config::SpotifyConfig,
    error::{ClientError, Result},
    info,
    management::{FileStorage, TokenStore},
    spotify::auth::OAuthClient,
    success,
    types::TokenRecord,
    utils, warning,
};

/// Where the session stands in the login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Storage has not been read yet.
    Unresolved,
    Unauthenticated,
    /// Login URL handed out, verifier stored, no token yet.
    Authenticating,
    Authenticated,
    /// Access token expired, refresh request in flight.
    Refreshing,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated | SessionState::Refreshing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Unresolved => "unresolved",
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated => "authenticated",
            SessionState::Refreshing => "refreshing",
        };
        f.write_str(label)
    }
}

/// Process-wide authentication state for one user.
///
/// The [`TokenStore`] is the source of truth; the session keeps a cached copy
/// of the record for cheap reads and publishes every state change on a
/// `watch` channel.
///
/// Operations that mutate tokens (login, code exchange, refresh, logout) pass
/// through a single gate so they never overlap. A refresh requested while
/// another mutation was in flight reuses that outcome instead of sending a
/// second request.
pub struct AuthSession {
    oauth: OAuthClient,
    store: TokenStore,
    cached: RwLock<Option<TokenRecord>>,
    state: watch::Sender<SessionState>,
    gate: Mutex<()>,
    // bumped after every completed token mutation
    epoch: AtomicU64,
}

impl AuthSession {
    pub fn new(config: SpotifyConfig, store: TokenStore) -> Self {
        let (state, _) = watch::channel(SessionState::Unresolved);
        Self {
            oauth: OAuthClient::new(config, store.clone()),
            store,
            cached: RwLock::new(None),
            state,
            gate: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Creates a session on the default storage file and resolves its state.
    pub async fn load(config: SpotifyConfig) -> Result<Self> {
        let session = Self::new(config, TokenStore::load().await?);
        session.initialize().await?;
        Ok(session)
    }

    /// Opens a session on the storage file at `path` that follows changes
    /// written by other processes.
    ///
    /// The file is polled every `poll_interval`. Logins completed, refreshed
    /// or cleared elsewhere are reconciled into this session, which is what
    /// lets a running `serve` finish a login started by `auth`.
    pub async fn open_synced(
        config: SpotifyConfig,
        path: impl Into<PathBuf>,
        poll_interval: Duration,
    ) -> Result<Arc<Self>> {
        let storage = Arc::new(FileStorage::open(path).await?);
        storage.spawn_watcher(poll_interval);

        let session = Arc::new(Self::new(config, TokenStore::new(storage)));
        session.initialize().await?;
        session.spawn_storage_listener();
        Ok(session)
    }

    pub fn config(&self) -> &SpotifyConfig {
        self.oauth.config()
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receives every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Cached access token, without expiry checks.
    pub async fn access_token(&self) -> Option<String> {
        self.cached
            .read()
            .await
            .as_ref()
            .map(|record| record.access_token.clone())
    }

    pub async fn token_record(&self) -> Option<TokenRecord> {
        self.cached.read().await.clone()
    }

    /// Reads storage for the first time and leaves `Unresolved`.
    pub async fn initialize(&self) -> Result<SessionState> {
        self.reconcile().await
    }

    /// Re-derives the state from the token store.
    ///
    /// Used before protected operations and whenever storage reports a
    /// change, so logouts and logins from other processes are picked up.
    pub async fn reconcile(&self) -> Result<SessionState> {
        let _gate = self.gate.lock().await;
        self.reconcile_locked().await
    }

    /// Starts a login attempt and returns the URL the user has to open.
    ///
    /// An earlier attempt that was never completed is replaced.
    pub async fn login(&self) -> Result<Url> {
        let _gate = self.gate.lock().await;
        let url = self.oauth.build_login_url().await?;
        if !self.state().is_authenticated() {
            self.set_state(SessionState::Authenticating);
        }
        info!("Login started, waiting for Spotify to redirect back.");
        Ok(url)
    }

    /// Completes a login with the code from the callback.
    ///
    /// Without a stored verifier nothing is touched and the state is
    /// re-derived from storage. Any other failure clears all tokens.
    pub async fn complete_login(&self, code: &str) -> Result<TokenRecord> {
        let _gate = self.gate.lock().await;
        let outcome = self.oauth.exchange_code(code).await;
        match outcome {
            Ok(record) => {
                *self.cached.write().await = Some(record.clone());
                self.bump_epoch();
                self.set_state(SessionState::Authenticated);
                success!("Logged in to Spotify.");
                Ok(record)
            }
            Err(ClientError::MissingVerifier) => {
                warning!("Callback received without a login in progress.");
                self.reconcile_locked().await?;
                Err(ClientError::MissingVerifier)
            }
            Err(e) => {
                warning!("Login failed: {}", e);
                self.clear_locked().await?;
                Err(e)
            }
        }
    }

    /// Abandons the login in flight and clears all tokens.
    pub async fn fail_login(&self) -> Result<()> {
        let _gate = self.gate.lock().await;
        self.clear_locked().await
    }

    /// Refreshes the access token.
    ///
    /// Callers that were queued behind another token mutation get that
    /// mutation's result instead of issuing a request of their own. A
    /// rejected refresh token ends the session.
    pub async fn refresh(&self) -> Result<TokenRecord> {
        let observed = self.epoch.load(Ordering::SeqCst);
        let _gate = self.gate.lock().await;

        if self.epoch.load(Ordering::SeqCst) != observed {
            return self.cached.read().await.clone().ok_or_else(|| {
                ClientError::RefreshFailed("session ended while waiting for refresh".into())
            });
        }

        let previous = self.state();
        self.set_state(SessionState::Refreshing);

        match self.oauth.refresh().await {
            Ok(record) => {
                *self.cached.write().await = Some(record.clone());
                self.bump_epoch();
                self.set_state(SessionState::Authenticated);
                info!("Access token refreshed.");
                Ok(record)
            }
            Err(ClientError::NoRefreshToken) => {
                self.set_state(previous);
                Err(ClientError::NoRefreshToken)
            }
            Err(e) => {
                warning!("{}", e);
                self.clear_locked().await?;
                Err(e)
            }
        }
    }

    /// Returns an access token that has not expired, refreshing first when
    /// needed.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session. Refresh failures end
    /// the session and are returned as is.
    pub async fn valid_access_token(&self) -> Result<String> {
        self.reconcile().await?;

        let record = self
            .cached
            .read()
            .await
            .clone()
            .ok_or(ClientError::Unauthorized)?;

        if !record.is_expired_at(utils::now_millis()) {
            return Ok(record.access_token);
        }

        match self.refresh().await {
            Ok(record) => Ok(record.access_token),
            Err(e) => {
                self.force_logout().await?;
                Err(e)
            }
        }
    }

    /// Clears all tokens. Logging out twice is harmless.
    pub async fn logout(&self) -> Result<()> {
        let _gate = self.gate.lock().await;
        self.clear_locked().await?;
        info!("Logged out.");
        Ok(())
    }

    /// Ends the session after Spotify rejected its token.
    pub async fn force_logout(&self) -> Result<()> {
        let _gate = self.gate.lock().await;
        if self.state() != SessionState::Unauthenticated {
            warning!("Session is no longer valid, logging out.");
        }
        self.clear_locked().await
    }

    /// Reconciles the session whenever storage reports a token change.
    ///
    /// The listener holds only a weak reference and ends with the session.
    pub fn spawn_storage_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.store.subscribe();
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let relevant = match events.recv().await {
                    Ok(event) => {
                        if event.external && TokenStore::is_token_key(&event.key) {
                            info!("Storage changed outside this process ({}).", event.key);
                        }
                        TokenStore::is_token_key(&event.key)
                    }
                    Err(RecvError::Lagged(_)) => true,
                    Err(RecvError::Closed) => break,
                };

                if !relevant {
                    continue;
                }
                let Some(session) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = session.reconcile().await {
                    warning!("Failed to reconcile session with storage: {}", e);
                }
            }
        })
    }

    async fn reconcile_locked(&self) -> Result<SessionState> {
        let record = self.store.record().await?;
        let verifier = self.store.code_verifier().await?;

        let next = match (&record, verifier) {
            (Some(_), _) => SessionState::Authenticated,
            (None, Some(_)) => SessionState::Authenticating,
            (None, None) => SessionState::Unauthenticated,
        };

        *self.cached.write().await = record;
        self.set_state(next);
        Ok(next)
    }

    async fn clear_locked(&self) -> Result<()> {
        // cache and state first: even if storage fails the session is over
        *self.cached.write().await = None;
        self.bump_epoch();
        self.set_state(SessionState::Unauthenticated);
        self.store.clear().await
    }

    fn set_state(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}
