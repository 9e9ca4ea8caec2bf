//! ResolutionChain: an ordered list of layers split into three segments.
//!
//! Lookup scans front to back and the first layer holding the key wins, so
//! earlier layers shadow later ones. The segment boundaries are kept as index
//! ranges so chains can be sliced and recombined without re-deriving which
//! layer belongs to which tier.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::layer::{Layer, LocalStore};
use crate::{Key, Value};

/// The three contiguous regions of a chain, most specific first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    /// The container's own stores.
    Instance,
    /// Stores coming from class-level definitions.
    Class,
    /// Stores coming from the owner chain.
    Inherited,
}

/// Index ranges of the three segments within a chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segments {
    pub instance: Range<usize>,
    pub class: Range<usize>,
    pub inherited: Range<usize>,
}

impl Segments {
    fn from_lengths(instance: usize, class: usize, inherited: usize) -> Self {
        let class_end = instance + class;
        Self {
            instance: 0..instance,
            class: instance..class_end,
            inherited: class_end..class_end + inherited,
        }
    }

    pub fn range(&self, segment: Segment) -> Range<usize> {
        match segment {
            Segment::Instance => self.instance.clone(),
            Segment::Class => self.class.clone(),
            Segment::Inherited => self.inherited.clone(),
        }
    }
}

/// An ordered sequence of layers.
///
/// Invariant: the instance segment is never empty and its first layer is
/// the owning container's local store.
#[derive(Clone, Debug)]
pub struct ResolutionChain {
    local: LocalStore,
    layers: Vec<Layer>,
    segments: Segments,
}

impl ResolutionChain {
    /// Build a chain from its segments. `local` becomes the first layer.
    pub fn new(
        local: LocalStore,
        instance: Vec<Layer>,
        class: Vec<Layer>,
        inherited: Vec<Layer>,
    ) -> Self {
        let segments = Segments::from_lengths(instance.len() + 1, class.len(), inherited.len());
        let mut layers = Vec::with_capacity(segments.inherited.end);
        layers.push(Layer::Local(local.clone()));
        layers.extend(instance);
        layers.extend(class);
        layers.extend(inherited);
        Self {
            local,
            layers,
            segments,
        }
    }

    /// The store writes land in.
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn segments(&self) -> &Segments {
        &self.segments
    }

    pub fn segment(&self, segment: Segment) -> &[Layer] {
        &self.layers[self.segments.range(segment)]
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Append a layer at the tail of the inherited segment.
    pub fn push_inherited(&mut self, layer: Layer) {
        self.layers.push(layer);
        self.segments.inherited.end = self.layers.len();
    }

    /// Search the instance and class segments.
    pub fn find_own(&self, key: &Key) -> Option<(Layer, Value)> {
        find_in(&self.layers[..self.segments.class.end], key)
    }

    /// Search the inherited segment.
    pub fn find_inherited(&self, key: &Key) -> Option<(Layer, Value)> {
        find_in(self.segment(Segment::Inherited), key)
    }

    /// True if any layer of the chain aliases `layer`.
    pub fn contains_layer(&self, layer: &Layer) -> bool {
        self.layers.iter().any(|l| l.ptr_eq(layer))
    }

    /// Flatten the whole chain; more specific layers overwrite less specific.
    pub fn merged(&self) -> BTreeMap<Key, Value> {
        let mut merged = BTreeMap::new();
        for layer in self.layers.iter().rev() {
            merged.extend(layer.entries());
        }
        merged
    }

    /// Every entry of every layer, most specific layer first, duplicates kept.
    pub fn all_entries(&self) -> Vec<(Key, Value)> {
        self.layers.iter().flat_map(Layer::entries).collect()
    }
}

fn find_in(layers: &[Layer], key: &Key) -> Option<(Layer, Value)> {
    layers
        .iter()
        .find_map(|layer| layer.lookup(key).map(|value| (layer.clone(), value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(&str, i64)]) -> LocalStore {
        let store = LocalStore::new();
        for (k, v) in entries {
            store.insert(Key::from(*k), Value::from(*v));
        }
        store
    }

    #[test]
    fn segments_are_contiguous() {
        let chain = ResolutionChain::new(
            LocalStore::new(),
            vec![store(&[]).into()],
            vec![store(&[]).into(), store(&[]).into()],
            vec![store(&[]).into()],
        );
        assert_eq!(chain.segments().instance, 0..2);
        assert_eq!(chain.segments().class, 2..4);
        assert_eq!(chain.segments().inherited, 4..5);
        assert_eq!(chain.len(), 5);
        assert!(chain.segment(Segment::Instance)[0]
            .ptr_eq(&Layer::Local(chain.local().clone())));
    }

    #[test]
    fn most_specific_wins() {
        let chain = ResolutionChain::new(
            store(&[("k", 1)]),
            vec![],
            vec![store(&[("k", 2)]).into()],
            vec![store(&[("k", 3), ("p", 4)]).into()],
        );
        assert_eq!(chain.find_own(&Key::from("k")).unwrap().1, Value::from(1));
        assert!(chain.find_own(&Key::from("p")).is_none());
        assert_eq!(
            chain.find_inherited(&Key::from("p")).unwrap().1,
            Value::from(4)
        );
    }

    #[test]
    fn merged_and_all_entries() {
        let chain = ResolutionChain::new(
            store(&[("k", 1)]),
            vec![],
            vec![store(&[("k", 2), ("c", 5)]).into()],
            vec![],
        );
        let merged = chain.merged();
        assert_eq!(merged.get(&Key::from("k")), Some(&Value::from(1)));
        assert_eq!(merged.get(&Key::from("c")), Some(&Value::from(5)));
        assert_eq!(merged.len(), 2);

        let all = chain.all_entries();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], (Key::from("k"), Value::from(1)));
    }

    #[test]
    fn push_inherited_extends_the_tail() {
        let mut chain = ResolutionChain::new(LocalStore::new(), vec![], vec![], vec![]);
        assert!(chain.segment(Segment::Inherited).is_empty());
        chain.push_inherited(store(&[("x", 1)]).into());
        assert_eq!(chain.segment(Segment::Inherited).len(), 1);
        assert_eq!(chain.segments().inherited, 1..2);
    }
}
