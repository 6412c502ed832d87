use std::{collections::HashMap, hash::Hash, sync::Mutex};

use crate::policy::Area;

/// MenuState
///
/// Open/closed state of the navigation menu, kept separately per area. One
/// registry serves every dashboard area; toggling one area never touches another.
/// Everything starts closed.
pub struct MenuState<K = Area> {
    open: Mutex<HashMap<K, bool>>,
}

impl<K> Default for MenuState<K> {
    fn default() -> Self {
        Self {
            open: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> MenuState<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut HashMap<K, bool>) -> R) -> R {
        let mut open = self
            .open
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut open)
    }

    pub fn is_open(&self, area: &K) -> bool {
        self.with(|open| open.get(area).copied().unwrap_or(false))
    }

    /// Flips the area's menu and returns the new state.
    pub fn toggle(&self, area: &K) -> bool {
        self.with(|open| {
            let state = open.entry(area.clone()).or_insert(false);
            *state = !*state;
            *state
        })
    }

    pub fn open(&self, area: &K) {
        self.set(area, true);
    }

    pub fn close(&self, area: &K) {
        self.set(area, false);
    }

    pub fn set(&self, area: &K, is_open: bool) {
        self.with(|open| {
            open.insert(area.clone(), is_open);
        });
    }
}
