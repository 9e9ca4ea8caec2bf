//! Generated hierarchies and navigation through their instances.

use std::fmt;
use std::rc::Rc;

use recstore_core::{Class, Container, Error, Result};

use crate::spec::{IdForm, LevelId};

/// One generated level.
pub struct Level {
    pub(crate) name: String,
    pub(crate) key: String,
    pub(crate) form: Option<IdForm>,
    pub(crate) ids: Vec<LevelId>,
    pub(crate) class: Rc<Class>,
}

impl Level {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key each instance stores its id under, also the attribute of a
    /// single-instance level.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn form(&self) -> Option<IdForm> {
        self.form
    }

    pub fn ids(&self) -> &[LevelId] {
        &self.ids
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Attribute name under the parent for `id`, or `None` if `id` does not
    /// name an instance of this level.
    pub fn attribute(&self, id: Option<&LevelId>) -> Option<String> {
        let Some(form) = self.form else {
            return id.is_none().then(|| self.key.clone());
        };
        let id = id.filter(|id| self.ids.contains(id))?;
        match (form, id) {
            (IdForm::Numbered, LevelId::Number(n)) => Some(format!("{}{}", self.key, n)),
            (IdForm::Prefixed, LevelId::Name(s)) => Some(format!("{}_{}", self.key, s)),
            (IdForm::Named, LevelId::Name(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("form", &self.form)
            .field("ids", &self.ids)
            .finish()
    }
}

/// A generated class hierarchy: the root class and its levels, outermost
/// first.
#[derive(Debug)]
pub struct Hierarchy {
    root: Rc<Class>,
    levels: Vec<Level>,
}

impl Hierarchy {
    pub(crate) fn new(root: Rc<Class>, levels: Vec<Level>) -> Self {
        Self { root, levels }
    }

    pub fn root(&self) -> &Rc<Class> {
        &self.root
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// A fresh prototype of the root class.
    pub fn instantiate(&self) -> Container {
        Container::new(&self.root)
    }

    /// The instance of `level` with `id` directly under `container`.
    ///
    /// `container` must belong to the level just above `level`. Pass `None`
    /// for single-instance levels.
    pub fn select(
        &self,
        container: &Container,
        level: &str,
        id: Option<&LevelId>,
    ) -> Result<Container> {
        let target = self.level_index(level)?;
        let depth = self.depth_of(container)?;
        if target != depth {
            return Err(no_attribute(container, level));
        }
        let level = &self.levels[target];
        let attribute = level.attribute(id).ok_or_else(|| match id {
            Some(id) => no_attribute(container, &id.to_string()),
            None => no_attribute(container, &level.key),
        })?;
        container.child(&attribute)
    }

    /// Every instance of `level` directly under `container`, in id order.
    ///
    /// Instances are specialized lazily as the iterator advances. An unknown
    /// level fails up front.
    pub fn iter_level<'a>(
        &'a self,
        container: &'a Container,
        level: &'a str,
    ) -> Result<impl Iterator<Item = Result<Container>> + 'a> {
        let lvl = &self.levels[self.level_index(level)?];
        let ids: Vec<Option<&LevelId>> = if lvl.ids.is_empty() {
            vec![None]
        } else {
            lvl.ids.iter().map(Some).collect()
        };
        Ok(ids
            .into_iter()
            .map(move |id| self.select(container, level, id)))
    }

    /// Jump from `container` to the instance of `level` with `id`, any
    /// number of levels down.
    ///
    /// For every intermediate level with ids, the instance is chosen by the
    /// value its key resolves to on the container reached so far. A missing
    /// selector fails with `KeyNotFound`; a selector naming no instance fails
    /// with `NoAttribute`.
    pub fn bridge(
        &self,
        container: &Container,
        level: &str,
        id: Option<&LevelId>,
    ) -> Result<Container> {
        let target = self.level_index(level)?;
        let depth = self.depth_of(container)?;
        if target < depth {
            return Err(no_attribute(container, level));
        }

        let mut current = container.clone();
        for intermediate in &self.levels[depth..target] {
            let attribute = if intermediate.ids.is_empty() {
                intermediate.key.clone()
            } else {
                let selector = LevelId::from_value(&current.get(intermediate.key.as_str())?)?;
                intermediate
                    .attribute(Some(&selector))
                    .ok_or_else(|| no_attribute(&current, &selector.to_string()))?
            };
            current = current.child(&attribute)?;
        }
        self.select(&current, level, id)
    }

    fn level_index(&self, name: &str) -> Result<usize> {
        self.levels
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| Error::NoAttribute {
                class: self.root.name().to_string(),
                name: name.to_string(),
            })
    }

    /// 0 for the root, `i + 1` for an instance of `levels[i]`.
    fn depth_of(&self, container: &Container) -> Result<usize> {
        let class = container.class();
        if Rc::ptr_eq(&class, &self.root) {
            return Ok(0);
        }
        self.levels
            .iter()
            .position(|l| Rc::ptr_eq(&class, &l.class))
            .map(|i| i + 1)
            .ok_or_else(|| {
                Error::other(format!(
                    "'{}' is not part of the '{}' hierarchy",
                    class.name(),
                    self.root.name()
                ))
            })
    }
}

fn no_attribute(container: &Container, name: &str) -> Error {
    Error::NoAttribute {
        class: container.class().name().to_string(),
        name: name.to_string(),
    }
}
