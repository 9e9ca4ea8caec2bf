//! Owner-scoped specialization and cloning of containers.
//!
//! Each owner keeps a two-tier cache keyed by definition identity. A bare
//! prototype owner caches its specializations in the soft tier, which its
//! own specializations and clones share; an instantiated owner keeps
//! private copies in the hard tier, promoting a soft entry when one exists
//! so that values already written through it are preserved.

use std::rc::Rc;

use log::debug;

use crate::chain::{ResolutionChain, Segment};
use crate::container::ContainerState;
use crate::identity::{TieredCache, Tier};
use crate::layer::{Layer, LocalStore};
use crate::{Container, Error, Key, Result, Value};

impl Container {
    /// The copy of this definition scoped to `owner`, created on first access.
    ///
    /// Repeated calls with the same owner return the same container until
    /// the owner's tier changes. Non-recursive definitions are returned as is.
    pub fn specialize(&self, owner: &Container) -> Result<Container> {
        if !self.class().is_recursive() {
            return Ok(self.clone());
        }
        self.check_acyclic(owner)?;

        let id = self.id();
        let tier = if owner.is_instantiated() {
            Tier::Hard
        } else {
            Tier::Soft
        };

        let cached = owner.state().children.get(tier, &id);
        if let Some(hit) = cached {
            debug!("{}: {:?} cache hit for {}", self.class().name(), tier, id);
            return Ok(hit);
        }

        let origin = match tier {
            Tier::Hard => owner.state().children.get(Tier::Soft, &id),
            Tier::Soft => None,
        };
        let specialized = match origin {
            Some(origin) => {
                debug!("{}: promoting soft entry {} to hard", self.class().name(), id);
                origin.derive(owner)
            }
            None => {
                debug!("{}: {:?} cache miss for {}", self.class().name(), tier, id);
                self.derive(owner)
            }
        };

        owner
            .state_mut()
            .children
            .insert(tier, id, specialized.clone());
        Ok(specialized)
    }

    /// An owner-less copy with `overrides` written into its new local store.
    ///
    /// Values coming from the owner chain are dropped; cached children are
    /// cloned recursively, each staying in the cache tier it came from.
    ///
    /// The stores of the source's instance segment are shared, not copied:
    /// the clone writes to its own new local store, but later writes to the
    /// source stay visible through the clone.
    pub fn clone_with<K: Into<Key>, V: Into<Value>>(
        &self,
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Container {
        debug!("cloning {} ({})", self.class().name(), self.id());
        let clone = self.clone_under(None);
        clone
            .local()
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        clone
    }

    /// [`clone_with`](Container::clone_with) without overrides.
    pub fn clone_detached(&self) -> Container {
        self.clone_with(Vec::<(Key, Value)>::new())
    }

    /// Number of cached specializations in one tier.
    pub fn cached_children(&self, tier: Tier) -> usize {
        self.state().children.len(tier)
    }

    /// Build the owner-scoped copy of `self` (a definition or a soft origin).
    fn derive(&self, owner: &Container) -> Container {
        let state = self.state();
        let owner_state = owner.state();

        let mut inherited = state.chain.segment(Segment::Inherited).to_vec();
        inherited.extend_from_slice(owner_state.chain.segment(Segment::Instance));
        inherited.extend_from_slice(owner_state.chain.segment(Segment::Inherited));

        let chain = ResolutionChain::new(
            LocalStore::new(),
            state.chain.segment(Segment::Instance).to_vec(),
            state.chain.segment(Segment::Class).to_vec(),
            inherited,
        );

        Container::from_state(ContainerState {
            id: state.id,
            class: Rc::clone(&state.class),
            chain,
            blocked: state.blocked.clone(),
            prototypes: state.prototypes.clone(),
            owner: Some(owner.downgrade()),
            children: state.children.sharing_soft(),
            functions: state.functions.sharing_soft(),
        })
    }

    fn clone_under(&self, owner: Option<&Container>) -> Container {
        let state = self.state();

        let inherited: Vec<Layer> = match owner {
            Some(owner) => {
                let owner_state = owner.state();
                let mut layers = owner_state.chain.segment(Segment::Instance).to_vec();
                layers.extend_from_slice(owner_state.chain.segment(Segment::Inherited));
                layers
            }
            None => Vec::new(),
        };

        let clone = Container::from_state(ContainerState {
            id: state.id,
            class: Rc::clone(&state.class),
            chain: ResolutionChain::new(
                LocalStore::new(),
                state.chain.segment(Segment::Instance).to_vec(),
                state.chain.segment(Segment::Class).to_vec(),
                inherited,
            ),
            blocked: state.blocked.clone(),
            prototypes: state.prototypes.clone(),
            owner: owner.map(Container::downgrade),
            children: TieredCache::new(),
            functions: TieredCache::new(),
        });

        for tier in [Tier::Hard, Tier::Soft] {
            for (id, child) in state.children.entries(tier) {
                let child_clone = child.clone_under(Some(&clone));
                clone.state_mut().children.insert(tier, id, child_clone);
            }
            for (id, overrides) in state.functions.entries(tier) {
                clone.state_mut().functions.insert(tier, id, overrides.fork());
            }
        }
        clone
    }

    /// Reject an owner whose ownership chain contains this definition.
    fn check_acyclic(&self, owner: &Container) -> Result<()> {
        let id = self.id();
        let mut current = Some(owner.clone());
        while let Some(ancestor) = current {
            if ancestor.ptr_eq(self) || ancestor.id() == id {
                return Err(Error::CyclicOwnership {
                    message: format!(
                        "'{}' ({}) cannot be specialized through its own descendant",
                        self.class().name(),
                        id
                    ),
                });
            }
            current = ancestor.owner().ok();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Class, ClassBuilder};

    fn tree() -> (Rc<Class>, Rc<Class>) {
        let motor = ClassBuilder::new("Motor")
            .parameter("speed", 10)
            .build()
            .unwrap();
        let axis = ClassBuilder::new("Axis")
            .parameter("unit", "mm")
            .child("motor", Container::new(&motor))
            .build()
            .unwrap();
        (motor, axis)
    }

    #[test]
    fn soft_cache_is_stable() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        let m1 = a.child("motor").unwrap();
        let m2 = a.child("motor").unwrap();
        assert!(m1.ptr_eq(&m2));
        assert_eq!(a.cached_children(Tier::Soft), 1);
        assert_eq!(a.cached_children(Tier::Hard), 0);
    }

    #[test]
    fn specialization_reads_owner_values() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        a.set("speed", 99).unwrap();
        a.set("port", 3).unwrap();
        let m = a.child("motor").unwrap();
        // own class segment wins over the owner
        assert_eq!(m.get("speed").unwrap(), Value::from(10));
        assert_eq!(m.get("port").unwrap(), Value::from(3));
        // owner's class segment is not inherited
        assert!(m.get("unit").unwrap_err().is_key_not_found());
        assert!(m.is_instantiated());
        assert!(m.owner().unwrap().ptr_eq(&a));
    }

    #[test]
    fn blocked_keys_skip_the_owner_only() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        a.set("port", 3).unwrap();
        a.set("speed", 1).unwrap();
        let m = a.child("motor").unwrap();
        m.block(["port", "speed"]);
        assert!(m.get("port").unwrap_err().is_key_not_found());
        assert_eq!(m.get("speed").unwrap(), Value::from(10));
        m.release(["port"]);
        assert_eq!(m.get("port").unwrap(), Value::from(3));
    }

    #[test]
    fn dropped_owner_gives_no_parent() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        a.set("port", 3).unwrap();
        let m = a.child("motor").unwrap();
        drop(a);
        assert!(matches!(m.get("port"), Err(Error::NoParent)));
        assert!(matches!(m.owner(), Err(Error::NoParent)));
        // class segment still answers
        assert_eq!(m.get("speed").unwrap(), Value::from(10));
    }

    #[test]
    fn non_recursive_definition_is_returned_as_is() {
        let plain = ClassBuilder::new("Plain").non_recursive().build().unwrap();
        let definition = Container::new(&plain);
        let holder = ClassBuilder::new("Holder")
            .child("plain", definition.clone())
            .build()
            .unwrap();
        let h = Container::new(&holder);
        assert!(h.child("plain").unwrap().ptr_eq(&definition));
    }

    #[test]
    fn self_ownership_is_rejected() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        let err = a.specialize(&a).unwrap_err();
        assert!(matches!(err, Error::CyclicOwnership { .. }));

        let m = a.child("motor").unwrap();
        let definition = axis.child("motor").unwrap();
        assert!(matches!(
            definition.specialize(&m),
            Err(Error::CyclicOwnership { .. })
        ));
    }

    #[test]
    fn clone_drops_owner_values_and_is_independent() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        a.set("port", 3).unwrap();
        let m = a.child("motor").unwrap();
        m.set("speed", 20).unwrap();

        let m2 = m.clone_with([("extra", 1)]);
        assert!(m2.get("port").unwrap_err().is_key_not_found());
        assert_eq!(m2.get("speed").unwrap(), Value::from(20));
        assert_eq!(m2.get("extra").unwrap(), Value::from(1));
        assert!(matches!(m2.owner(), Err(Error::NoParent)));

        m2.set("speed", 30).unwrap();
        assert_eq!(m.get("speed").unwrap(), Value::from(20));
    }

    #[test]
    fn clone_shares_source_instance_stores() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        let b = a.clone_detached();

        a.set("k", 7).unwrap();
        assert_eq!(b.get("k").unwrap(), Value::from(7));

        b.set("k", 8).unwrap();
        assert_eq!(a.get("k").unwrap(), Value::from(7));
        assert_eq!(b.get("k").unwrap(), Value::from(8));
    }

    #[test]
    fn clone_keeps_cached_children_in_their_tier() {
        let (_, axis) = tree();
        let a = Container::new(&axis);
        a.child("motor").unwrap().set("speed", 5).unwrap();

        let b = a.clone_detached();
        assert_eq!(b.cached_children(Tier::Soft), 1);
        assert_eq!(b.cached_children(Tier::Hard), 0);

        // b is instantiated, so its access promotes the cloned soft entry
        let bm = b.child("motor").unwrap();
        assert_eq!(bm.get("speed").unwrap(), Value::from(5));
        bm.set("speed", 6).unwrap();
        assert_eq!(a.child("motor").unwrap().get("speed").unwrap(), Value::from(5));
    }
}
