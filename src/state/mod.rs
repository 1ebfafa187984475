/// List / Detail / Media screen state machine.
pub mod navigation;
pub mod reconciliation;
pub mod records;
/// Per-login session context.
pub mod session;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Credentials},
    dao::sheet_store::SheetStore,
    error::ServiceError,
};

use self::session::Session;

/// State shared by every handler.
pub type SharedState = Arc<AppState>;
/// A session is processed one request at a time.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Central application state: storage handle, configuration and live sessions.
pub struct AppState {
    sheet_store: RwLock<Option<Arc<dyn SheetStore>>>,
    config: AppConfig,
    credentials: Credentials,
    sessions: DashMap<Uuid, SessionHandle>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, credentials: Credentials) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            sheet_store: RwLock::new(None),
            config,
            credentials,
            sessions: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current sheet store, if one is installed.
    pub async fn sheet_store(&self) -> Option<Arc<dyn SheetStore>> {
        let guard = self.sheet_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current sheet store or [`ServiceError::Degraded`].
    pub async fn require_sheet_store(&self) -> Result<Arc<dyn SheetStore>, ServiceError> {
        self.sheet_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new sheet store implementation and leave degraded mode.
    pub async fn set_sheet_store(&self, store: Arc<dyn SheetStore>) {
        {
            let mut guard = self.sheet_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current sheet store and enter degraded mode.
    pub async fn clear_sheet_store(&self) {
        {
            let mut guard = self.sheet_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared login.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Register a fresh authenticated session and return its token.
    pub fn open_session(&self) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions
            .insert(token, Arc::new(Mutex::new(Session::new())));
        token
    }

    /// Look up a live session.
    pub fn session(&self, token: Uuid) -> Option<SessionHandle> {
        self.sessions.get(&token).map(|entry| entry.value().clone())
    }

    /// Drop a session; returns whether it existed.
    pub fn close_session(&self, token: Uuid) -> bool {
        self.sessions.remove(&token).is_some()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
