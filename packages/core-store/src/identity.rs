//! Definition identities and the two-tier per-owner cache keyed by them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

/// Stable identity of a class-level definition.
///
/// Generated once when a definition is created and carried unchanged by
/// every specialization and clone of it, so an owner can find "its" copy
/// of a given child definition.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct DefinitionId(Uuid);

impl DefinitionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DefinitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which tier of a [`TieredCache`] an entry lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// The owner carries its own instance overrides.
    Hard,
    /// The owner is a bare prototype; entries are shared.
    Soft,
}

/// Per-owner cache split into an owner-private "hard" map and a "soft" map.
///
/// The soft map is reference counted: a specialized copy of an owner shares
/// the soft map of the prototype it was copied from, which is where
/// promotion finds its origin. The hard map is always private.
pub(crate) struct TieredCache<T> {
    hard: HashMap<DefinitionId, T>,
    soft: Rc<RefCell<HashMap<DefinitionId, T>>>,
}

impl<T: Clone> TieredCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            hard: HashMap::new(),
            soft: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// A cache with an empty hard tier sharing this cache's soft tier.
    pub(crate) fn sharing_soft(&self) -> Self {
        Self {
            hard: HashMap::new(),
            soft: Rc::clone(&self.soft),
        }
    }

    pub(crate) fn get(&self, tier: Tier, id: &DefinitionId) -> Option<T> {
        match tier {
            Tier::Hard => self.hard.get(id).cloned(),
            Tier::Soft => self.soft.borrow().get(id).cloned(),
        }
    }

    pub(crate) fn insert(&mut self, tier: Tier, id: DefinitionId, value: T) {
        match tier {
            Tier::Hard => {
                self.hard.insert(id, value);
            }
            Tier::Soft => {
                self.soft.borrow_mut().insert(id, value);
            }
        }
    }

    /// Snapshot of one tier's entries.
    pub(crate) fn entries(&self, tier: Tier) -> Vec<(DefinitionId, T)> {
        match tier {
            Tier::Hard => self.hard.iter().map(|(k, v)| (*k, v.clone())).collect(),
            Tier::Soft => self
                .soft
                .borrow()
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }

    pub(crate) fn len(&self, tier: Tier) -> usize {
        match tier {
            Tier::Hard => self.hard.len(),
            Tier::Soft => self.soft.borrow().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(DefinitionId::new(), DefinitionId::new());
    }

    #[test]
    fn tiers_are_separate() {
        let mut cache = TieredCache::new();
        let id = DefinitionId::new();
        cache.insert(Tier::Soft, id, 1);
        assert_eq!(cache.get(Tier::Soft, &id), Some(1));
        assert_eq!(cache.get(Tier::Hard, &id), None);
        cache.insert(Tier::Hard, id, 2);
        assert_eq!(cache.get(Tier::Hard, &id), Some(2));
        assert_eq!(cache.get(Tier::Soft, &id), Some(1));
    }

    #[test]
    fn sharing_soft_sees_the_same_soft_entries() {
        let mut prototype = TieredCache::new();
        let mut copy = prototype.sharing_soft();
        let id = DefinitionId::new();

        prototype.insert(Tier::Soft, id, "shared");
        assert_eq!(copy.get(Tier::Soft, &id), Some("shared"));

        copy.insert(Tier::Hard, id, "private");
        assert_eq!(prototype.get(Tier::Hard, &id), None);
        assert_eq!(copy.len(Tier::Hard), 1);
    }
}
