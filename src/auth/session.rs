//! Session management for authentication
//!
//! [`SessionStore`] is the single owner of the bearer token and the cached
//! profile. It is created once, handed to every resource client, and shared by
//! cloning. Listeners registered with [`SessionStore::subscribe`] are told
//! about every sign-in, profile change and sign-out.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::types::{default_token_type, UserProfile};
use crate::error::Error;

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The bearer token
    pub access_token: String,

    /// The token type
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Cached profile of the signed-in user
    pub user: UserProfile,
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, user: UserProfile) -> Self {
        Self {
            access_token,
            token_type: default_token_type(),
            user,
        }
    }
}

/// Where the session lives between runs
pub trait SessionStorage: Send + Sync {
    /// Load a previously saved session
    fn load(&self) -> Result<Option<Session>, Error>;

    /// Save the session
    fn save(&self, session: &Session) -> Result<(), Error>;

    /// Forget the saved session
    fn remove(&self) -> Result<(), Error>;
}

/// Storage that keeps nothing across restarts
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<Session>>,
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, Error> {
        Ok(self.saved.lock().map_err(|_| poisoned())?.clone())
    }

    fn save(&self, session: &Session) -> Result<(), Error> {
        *self.saved.lock().map_err(|_| poisoned())? = Some(session.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), Error> {
        *self.saved.lock().map_err(|_| poisoned())? = None;
        Ok(())
    }
}

/// Storage backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, session: &Session) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Whether the user is signed in, as far as the client knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// The stored session has not been loaded yet
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Change notifications sent to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(UserProfile),
    ProfileUpdated(UserProfile),
    SignedOut,
}

/// Handle returned by [`SessionStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

struct Inner {
    initialized: RwLock<bool>,
    session: RwLock<Option<Session>>,
    storage: Box<dyn SessionStorage>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

/// Shared holder of the current session
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .finish()
    }
}

impl SessionStore {
    /// Create a store on top of the given storage. Call [`init`](Self::init)
    /// before reading the state.
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self {
            inner: Arc::new(Inner {
                initialized: RwLock::new(false),
                session: RwLock::new(None),
                storage,
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Create a store that forgets the session on restart
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::default()))
    }

    /// Load the stored session. A corrupt session file is discarded.
    pub fn init(&self) -> Result<AuthState, Error> {
        let loaded = match self.inner.storage.load() {
            Ok(loaded) => loaded,
            Err(Error::Json(err)) => {
                warn!("Discarding unreadable stored session: {}", err);
                self.inner.storage.remove()?;
                None
            }
            Err(err) => return Err(err),
        };

        if let Ok(mut session) = self.inner.session.write() {
            if loaded.is_some() {
                debug!("Restored stored session");
            }
            *session = loaded;
        }
        if let Ok(mut initialized) = self.inner.initialized.write() {
            *initialized = true;
        }

        Ok(self.state())
    }

    /// Current authentication state
    pub fn state(&self) -> AuthState {
        let initialized = self.inner.initialized.read().map(|i| *i).unwrap_or(false);
        if !initialized {
            AuthState::Loading
        } else if self.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Whether a token is held
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .session
            .read()
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    /// Get the current session
    pub fn session(&self) -> Option<Session> {
        self.inner.session.read().ok().and_then(|s| s.clone())
    }

    /// The bearer token, if signed in
    pub fn token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.access_token.clone()))
    }

    /// The cached profile, if signed in
    pub fn user(&self) -> Option<UserProfile> {
        self.inner
            .session
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.user.clone()))
    }

    /// Start a session
    pub fn set(&self, session: Session) {
        let user = session.user.clone();
        self.persist(&session);
        if let Ok(mut current) = self.inner.session.write() {
            *current = Some(session);
        }
        self.mark_initialized();
        self.notify(&SessionEvent::SignedIn(user));
    }

    /// Replace the cached profile. Does nothing when signed out.
    pub fn update_user(&self, user: UserProfile) {
        let updated = match self.inner.session.write() {
            Ok(mut current) => match current.as_mut() {
                Some(session) => {
                    session.user = user.clone();
                    Some(session.clone())
                }
                None => None,
            },
            Err(_) => None,
        };

        if let Some(session) = updated {
            self.persist(&session);
            self.notify(&SessionEvent::ProfileUpdated(user));
        }
    }

    /// End the session. Subscribers are only notified if one existed.
    pub fn clear(&self) {
        let previous = match self.inner.session.write() {
            Ok(mut current) => current.take(),
            Err(_) => None,
        };
        self.finish_clear(previous);
    }

    /// End the session only if it still holds `token`. Returns whether it
    /// was cleared.
    ///
    /// A rejected request may have been signed by a session that was since
    /// replaced; that newer session is kept.
    pub fn clear_if_token(&self, token: &str) -> bool {
        let previous = match self.inner.session.write() {
            Ok(mut current) => {
                if current.as_ref().map(|s| s.access_token.as_str()) == Some(token) {
                    current.take()
                } else {
                    None
                }
            }
            Err(_) => None,
        };

        if previous.is_none() {
            return false;
        }
        self.finish_clear(previous);
        true
    }

    fn finish_clear(&self, previous: Option<Session>) {
        if let Err(err) = self.inner.storage.remove() {
            warn!("Failed to remove stored session: {}", err);
        }
        self.mark_initialized();

        if previous.is_some() {
            self.notify(&SessionEvent::SignedOut);
        }
    }

    /// Register a listener for session changes
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.inner.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(existing, _)| *existing != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.inner.storage.save(session) {
            warn!("Failed to persist session: {}", err);
        }
    }

    fn mark_initialized(&self) {
        if let Ok(mut initialized) = self.inner.initialized.write() {
            *initialized = true;
        }
    }

    fn notify(&self, event: &SessionEvent) {
        // Listeners may call back into the store, so don't hold the lock.
        let listeners: Vec<Listener> = match self.inner.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(event);
        }
    }
}

fn poisoned() -> Error {
    Error::general("session storage lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: 42,
            email: "owner@aqarak.jo".to_string(),
            name: Some("Owner".to_string()),
            phone: None,
        }
    }

    #[test]
    fn state_is_loading_until_init() {
        let store = SessionStore::in_memory();
        assert_eq!(store.state(), AuthState::Loading);
        assert_eq!(store.init().unwrap(), AuthState::Unauthenticated);
    }

    #[test]
    fn set_and_clear_notify_subscribers() {
        let store = SessionStore::in_memory();
        store.init().unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let id = store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        store.set(Session::new("tok".to_string(), profile()));
        assert_eq!(store.state(), AuthState::Authenticated);
        assert_eq!(store.token().as_deref(), Some("tok"));

        store.clear();
        store.clear();
        assert_eq!(store.state(), AuthState::Unauthenticated);

        assert!(store.unsubscribe(id));
        store.set(Session::new("tok2".to_string(), profile()));

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![SessionEvent::SignedIn(profile()), SessionEvent::SignedOut]
        );
    }

    #[test]
    fn clear_if_token_keeps_a_newer_session() {
        let store = SessionStore::in_memory();
        store.init().unwrap();
        store.set(Session::new("old".to_string(), profile()));
        store.set(Session::new("new".to_string(), profile()));

        assert!(!store.clear_if_token("old"));
        assert_eq!(store.token().as_deref(), Some("new"));

        assert!(store.clear_if_token("new"));
        assert_eq!(store.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn update_user_is_ignored_when_signed_out() {
        let store = SessionStore::in_memory();
        store.init().unwrap();
        store.update_user(profile());
        assert_eq!(store.user(), None);
    }

    #[test]
    fn file_storage_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::new(Box::new(FileStorage::new(&path)));
        store.init().unwrap();
        store.set(Session::new("persisted".to_string(), profile()));

        let restarted = SessionStore::new(Box::new(FileStorage::new(&path)));
        assert_eq!(restarted.init().unwrap(), AuthState::Authenticated);
        assert_eq!(restarted.user(), Some(profile()));

        restarted.clear();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_session_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let store = SessionStore::new(Box::new(FileStorage::new(&path)));
        assert_eq!(store.init().unwrap(), AuthState::Unauthenticated);
        assert!(!path.exists());
    }
}
