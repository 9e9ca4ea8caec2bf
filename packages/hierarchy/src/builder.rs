//! Class generation from a hierarchy description.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use recstore_core::{Class, ClassBuilder, Container, Error, Result};

use crate::navigate::{Hierarchy, Level};
use crate::spec::{level_key, validate_class_name, HierarchySpec, LevelSpec};

type Configure = Box<dyn FnOnce(ClassBuilder) -> ClassBuilder>;

/// Builds the classes of a hierarchy, innermost level first.
///
/// ```rust
/// use recstore_hierarchy::{HierarchyBuilder, LevelSpec};
///
/// let hierarchy = HierarchyBuilder::new("Machine")
///     .level(LevelSpec::named("Axis", ["x", "y"]))
///     .level(LevelSpec::numbered("Motor", [1, 2]))
///     .configure("Motor", |class| class.parameter("gain", 1))
///     .build()
///     .unwrap();
///
/// let machine = hierarchy.instantiate();
/// let x = machine.child("x").unwrap();
/// let motor = x.child("motor2").unwrap();
/// assert_eq!(motor.get("axis").unwrap(), "x".into());
/// assert_eq!(motor.get("motor").unwrap(), 2.into());
/// ```
pub struct HierarchyBuilder {
    root: String,
    levels: Vec<LevelSpec>,
    configure: HashMap<String, Configure>,
}

impl HierarchyBuilder {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            levels: Vec::new(),
            configure: HashMap::new(),
        }
    }

    /// Append a level below the previous one.
    pub fn level(mut self, level: LevelSpec) -> Self {
        self.levels.push(level);
        self
    }

    /// Customize the generated class `class_name` (the root or a level)
    /// before it is built: add parameters, functions, bases.
    pub fn configure(
        mut self,
        class_name: impl Into<String>,
        f: impl FnOnce(ClassBuilder) -> ClassBuilder + 'static,
    ) -> Self {
        self.configure.insert(class_name.into(), Box::new(f));
        self
    }

    pub fn build(mut self) -> Result<Hierarchy> {
        validate_class_name(&self.root)?;

        let mut seen = HashSet::new();
        seen.insert(self.root.clone());
        for level in &self.levels {
            if !seen.insert(level.name.clone()) {
                return Err(Error::configuration(format!(
                    "class '{}' appears twice in the hierarchy",
                    level.name
                )));
            }
        }
        if let Some(unknown) = self.configure.keys().find(|name| !seen.contains(*name)) {
            return Err(Error::configuration(format!(
                "cannot configure '{}': no such class in the hierarchy",
                unknown
            )));
        }

        let specs = std::mem::take(&mut self.levels);
        let mut levels: Vec<Level> = Vec::with_capacity(specs.len());
        for spec in specs.iter().rev() {
            let resolved = spec.resolve_ids()?;
            let class = self.generate(&spec.name, levels.last())?;
            let (form, ids) = match resolved {
                Some((form, ids)) => (Some(form), ids),
                None => (None, Vec::new()),
            };
            levels.push(Level {
                name: spec.name.clone(),
                key: level_key(&spec.name),
                form,
                ids,
                class,
            });
        }
        let root_name = self.root.clone();
        let root = self.generate(&root_name, levels.last())?;
        levels.reverse();

        Ok(Hierarchy::new(root, levels))
    }

    /// Build one class, attaching the instances of the level below.
    fn generate(&mut self, name: &str, below: Option<&Level>) -> Result<Rc<Class>> {
        let mut builder = ClassBuilder::new(name);
        if let Some(lower) = below {
            if lower.ids.is_empty() {
                builder = builder.child(lower.key.clone(), Container::new(&lower.class));
            } else {
                for id in &lower.ids {
                    let attribute = lower.attribute(Some(id)).ok_or_else(|| {
                        Error::configuration(format!("'{}' is not an id of '{}'", id, lower.name))
                    })?;
                    let instance =
                        Container::with_values(&lower.class, [(lower.key.clone(), id.to_value())])?;
                    builder = builder.child(attribute, instance);
                }
            }
        }
        if let Some(f) = self.configure.remove(name) {
            builder = f(builder);
        }

        debug!(
            "generated class {} ({} instances below)",
            name,
            below.map_or(0, |l| l.ids.len().max(1))
        );
        builder.build()
    }
}

impl From<HierarchySpec> for HierarchyBuilder {
    fn from(spec: HierarchySpec) -> Self {
        spec.levels
            .into_iter()
            .fold(HierarchyBuilder::new(spec.root), HierarchyBuilder::level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_core::Value;

    #[test]
    fn single_instance_levels() {
        let hierarchy = HierarchyBuilder::new("Machine")
            .level(LevelSpec::single("Motor"))
            .level(LevelSpec::single("Encoder"))
            .build()
            .unwrap();
        let machine = hierarchy.instantiate();
        let encoder = machine.child("motor").unwrap().child("encoder").unwrap();
        assert_eq!(encoder.class().name(), "Encoder");
    }

    #[test]
    fn instances_carry_their_id() {
        let hierarchy = HierarchyBuilder::new("Bench")
            .level(LevelSpec::named("Axis", ["_left", "_right"]))
            .build()
            .unwrap();
        let bench = hierarchy.instantiate();
        let left = bench.child("axis_left").unwrap();
        assert_eq!(left.get("axis").unwrap(), Value::from("left"));
        assert!(bench.child("left").is_err());
    }

    #[test]
    fn configure_adds_parameters() {
        let hierarchy = HierarchyBuilder::new("Machine")
            .level(LevelSpec::numbered("Motor", [1, 2]))
            .configure("Machine", |c| c.shared("site", "lab").parameter("bay", 2))
            .configure("Motor", |c| c.parameter("gain", 3))
            .build()
            .unwrap();
        let machine = hierarchy.instantiate();
        let motor = machine.child("motor1").unwrap();
        assert_eq!(motor.get("gain").unwrap(), Value::from(3));
        assert_eq!(motor.get("site").unwrap(), Value::from("lab"));
        // the owner's class segment is not inherited
        assert_eq!(machine.get("bay").unwrap(), Value::from(2));
        assert!(motor.get("bay").unwrap_err().is_key_not_found());
    }

    #[test]
    fn rejects_bad_descriptions() {
        let lowercase = HierarchyBuilder::new("machine").build();
        assert!(matches!(lowercase, Err(Error::Configuration { .. })));

        let duplicate = HierarchyBuilder::new("Machine")
            .level(LevelSpec::single("Motor"))
            .level(LevelSpec::single("Motor"))
            .build();
        assert!(matches!(duplicate, Err(Error::Configuration { .. })));

        let unknown = HierarchyBuilder::new("Machine")
            .configure("Pump", |c| c)
            .build();
        assert!(matches!(unknown, Err(Error::Configuration { .. })));

        let bad_level = HierarchyBuilder::new("Machine")
            .level(LevelSpec::single("motor"))
            .build();
        assert!(matches!(bad_level, Err(Error::Configuration { .. })));
    }

    #[test]
    fn from_description() {
        let spec = HierarchySpec::from_json_str(
            r#"{ "root": "Machine", "levels": [ { "name": "Motor", "ids": [1] } ] }"#,
        )
        .unwrap();
        let hierarchy = HierarchyBuilder::from(spec).build().unwrap();
        assert_eq!(hierarchy.levels().len(), 1);
        assert!(hierarchy.instantiate().child("motor1").is_ok());
    }
}
