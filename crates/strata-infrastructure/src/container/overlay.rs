//! Copy-on-write snapshot overlay
//!
//! [`OverlayMap`] is a two-layer store: a base map plus, while a snapshot is
//! active, a staged diff of writes and tombstones. Reads consult the diff
//! first and fall through to the base. Ending the snapshot drops the diff, so
//! the base comes back exactly as it was when the snapshot began.

use std::hash::Hash;

use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct Staged<K, V> {
    /// `None` marks a deletion
    entries: IndexMap<K, Option<V>>,
    /// Every base entry is hidden
    cleared: bool,
}

impl<K, V> Default for Staged<K, V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            cleared: false,
        }
    }
}

/// Insertion-ordered map with an optional staging layer
#[derive(Debug, Clone)]
pub struct OverlayMap<K, V> {
    base: IndexMap<K, V>,
    staged: Option<Staged<K, V>>,
}

impl<K, V> Default for OverlayMap<K, V> {
    fn default() -> Self {
        Self {
            base: IndexMap::new(),
            staged: None,
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> OverlayMap<K, V> {
    /// Empty map with no staging layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Start buffering writes; returns `false` if already staging
    pub fn begin(&mut self) -> bool {
        if self.staged.is_some() {
            return false;
        }
        self.staged = Some(Staged::default());
        true
    }

    /// Drop every staged change; returns `false` if not staging
    pub fn end(&mut self) -> bool {
        self.staged.take().is_some()
    }

    /// Whether writes are currently buffered
    pub fn is_staging(&self) -> bool {
        self.staged.is_some()
    }

    /// Current value for `key`
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.staged {
            Some(staged) => match staged.entries.get(key) {
                Some(entry) => entry.as_ref(),
                None if staged.cleared => None,
                None => self.base.get(key),
            },
            None => self.base.get(key),
        }
    }

    /// Value for `key` in the base layer, ignoring staged writes
    pub fn committed(&self, key: &K) -> Option<&V> {
        self.base.get(key)
    }

    /// Whether `key` is currently present
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace `key`
    pub fn insert(&mut self, key: K, value: V) {
        match &mut self.staged {
            Some(staged) => {
                staged.entries.insert(key, Some(value));
            }
            None => {
                self.base.insert(key, value);
            }
        }
    }

    /// Remove `key`, returning its current value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if self.staged.is_none() {
            return self.base.shift_remove(key);
        }
        let previous = self.get(key).cloned();
        if previous.is_some() {
            if let Some(staged) = &mut self.staged {
                staged.entries.insert(key.clone(), None);
            }
        }
        previous
    }

    /// Apply `update` to the current value of `key`, copying it into the
    /// staging layer first when one is active. Returns whether `key` existed.
    pub fn update<F: FnOnce(&mut V)>(&mut self, key: &K, update: F) -> bool {
        if self.staged.is_none() {
            return match self.base.get_mut(key) {
                Some(value) => {
                    update(value);
                    true
                }
                None => false,
            };
        }
        let Some(mut value) = self.get(key).cloned() else {
            return false;
        };
        update(&mut value);
        self.insert(key.clone(), value);
        true
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        match &mut self.staged {
            Some(staged) => {
                staged.entries.clear();
                staged.cleared = true;
            }
            None => self.base.clear(),
        }
    }

    /// Current entries; base order first, then keys first written while staging
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let staged = self.staged.as_ref();
        let base = self.base.iter().filter_map(move |(key, value)| match staged {
            None => Some((key, value)),
            Some(staged) => match staged.entries.get(key) {
                Some(entry) => entry.as_ref().map(|value| (key, value)),
                None if staged.cleared => None,
                None => Some((key, value)),
            },
        });
        let fresh = staged
            .into_iter()
            .flat_map(|staged| staged.entries.iter())
            .filter(move |(key, _)| !self.base.contains_key(*key))
            .filter_map(|(key, entry)| entry.as_ref().map(|value| (key, value)));
        base.chain(fresh)
    }

    /// Current keys in iteration order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Number of current entries
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether there are no current entries
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
