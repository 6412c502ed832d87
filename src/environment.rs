//! The hosting environment seen by the in-application guards.
//!
//! Guards only read the credential and ask for navigation; storage, history and
//! event delivery belong to the host. In-memory implementations are provided for
//! headless hosts and tests.

use crate::config::AppConfig;

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

/// Local persistent storage, as the client sees it.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Navigator
///
/// The host's navigation system. Guards only ever `replace`, so redirects do not
/// grow the history.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn replace(&self, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// ClientEvent
///
/// The two signals a mounted guard reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    VisibilityChanged(Visibility),
    /// A storage entry changed in another tab. `key` is `None` when the whole
    /// storage area was cleared.
    StorageChanged { key: Option<String> },
}

type Listener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

struct Registration {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Registration>>,
}

/// ClientEvents
///
/// Delivers host events to subscribed listeners, one event at a time, in
/// registration order. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct ClientEvents {
    registry: Arc<Registry>,
}

impl ClientEvents {
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Registration>> {
        // No listener runs under this lock.
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// subscribe
    ///
    /// Registers `listener` until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        self.listeners().push(Registration {
            id,
            active: active.clone(),
            listener: Arc::new(listener),
        });

        Subscription {
            id,
            active,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// emit
    ///
    /// Runs every live listener to completion. The registry lock is released
    /// before listeners run, so a listener may unsubscribe itself or others; a
    /// listener cancelled mid-delivery is skipped.
    pub fn emit(&self, event: &ClientEvent) {
        let snapshot: Vec<(Arc<AtomicBool>, Listener)> = self
            .listeners()
            .iter()
            .map(|r| (r.active.clone(), r.listener.clone()))
            .collect();

        for (active, listener) in snapshot {
            if active.load(Ordering::Acquire) {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }
}

/// Subscription
///
/// Handle to one registered listener. Dropping it unsubscribes synchronously.
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    registry: std::sync::Weak<Registry>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            registry
                .listeners
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .retain(|r| r.id != self.id);
        }
    }
}

/// In-memory [`CredentialStore`].
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.entries().remove(key);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl CredentialStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }
}

/// MemoryHistory
///
/// In-memory [`Navigator`] that records every replacement it is asked for.
pub struct MemoryHistory {
    current: Mutex<String>,
    replacements: Mutex<Vec<String>>,
}

impl MemoryHistory {
    pub fn new(start: &str) -> Self {
        Self {
            current: Mutex::new(start.to_string()),
            replacements: Mutex::new(Vec::new()),
        }
    }

    /// Simulates the user following a link; not a guard redirect.
    pub fn visit(&self, path: &str) {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = path.to_string();
    }

    pub fn replacements(&self) -> Vec<String> {
        self.replacements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for MemoryHistory {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, path: &str) {
        self.visit(path);
        self.replacements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());
    }
}

/// ClientContext
///
/// Everything a mounted guard needs from its host.
#[derive(Clone)]
pub struct ClientContext {
    pub store: Arc<dyn CredentialStore>,
    pub navigator: Arc<dyn Navigator>,
    pub events: ClientEvents,
    /// The storage key the credential lives under.
    pub storage_key: String,
}

impl ClientContext {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        events: ClientEvents,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            navigator,
            events,
            storage_key: storage_key.into(),
        }
    }

    /// from_config
    ///
    /// Builds a context reading the credential under the configured
    /// `AppConfig::token_storage_key`.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        events: ClientEvents,
    ) -> Self {
        Self::new(store, navigator, events, config.token_storage_key.clone())
    }

    pub fn credential(&self) -> Option<String> {
        self.store.get(&self.storage_key)
    }

    /// Whether a storage notification concerns the credential.
    pub fn touches_credential(&self, event: &ClientEvent) -> bool {
        match event {
            ClientEvent::StorageChanged { key: Some(key) } => key == &self.storage_key,
            ClientEvent::StorageChanged { key: None } => true,
            ClientEvent::VisibilityChanged(_) => false,
        }
    }
}
