//! Dotted payload paths: `.child.grandchild[key]`.

use std::fmt;

use recstore_core::Key;

/// Errors related to payload path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path component is not a valid Unicode identifier.
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path string is invalid.
    InvalidPath { path: String, message: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidComponent {
                component,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid path component '{}' at position {}: {}",
                    component, position, message
                )
            }
            PathError::InvalidPath { path, message } => {
                write!(f, "invalid path '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A parsed dotted path.
///
/// `children` names the chain of child containers to walk (never empty);
/// `key` is the bracketed key to set on the last one, if any.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NestedPath {
    pub children: Vec<String>,
    pub key: Option<Key>,
}

impl NestedPath {
    /// Parse a dotted path.
    ///
    /// # Path Syntax
    ///
    /// - The path starts with `.`
    /// - Child names are separated by `.` and must be identifiers
    /// - The last component may end with `[key]`; numeric keys become
    ///   [`Key::Index`], anything else [`Key::Name`]
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recstore_core::Key;
    /// use recstore_payload::NestedPath;
    ///
    /// let path = NestedPath::parse(".motor.encoder[3]").unwrap();
    /// assert_eq!(path.children, vec!["motor", "encoder"]);
    /// assert_eq!(path.key, Some(Key::Index(3)));
    ///
    /// assert!(NestedPath::parse("motor").is_err());
    /// assert!(NestedPath::parse(".motor[3]x").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let invalid = |message: &str| PathError::InvalidPath {
            path: s.to_string(),
            message: message.to_string(),
        };

        let body = s
            .strip_prefix('.')
            .ok_or_else(|| invalid("must start with '.'"))?;

        let (body, key) = match body.split_once('[') {
            None => (body, None),
            Some((head, rest)) => {
                let inner = rest
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("unterminated or trailing characters after ']'"))?;
                if inner.is_empty() || inner.contains(['[', ']']) {
                    return Err(invalid("bracket key must be a single non-empty key"));
                }
                (head, Some(Self::parse_key(inner)))
            }
        };

        let children: Vec<String> = body.split('.').map(str::to_string).collect();
        for (i, component) in children.iter().enumerate() {
            Self::validate_component(component, i)?;
        }

        Ok(NestedPath { children, key })
    }

    fn parse_key(inner: &str) -> Key {
        let trimmed = inner.trim();
        match trimmed.parse::<i64>() {
            Ok(i) => Key::Index(i),
            Err(_) => Key::Name(trimmed.to_string()),
        }
    }

    /// Validate a single child name.
    fn validate_component(component: &str, position: usize) -> Result<(), PathError> {
        let fail = |message: &str| PathError::InvalidComponent {
            component: component.to_string(),
            position,
            message: message.to_string(),
        };

        let mut chars = component.chars();
        let Some(first) = chars.next() else {
            return Err(fail("empty component"));
        };

        // First char: XID_Start or underscore
        if !(first == '_' || unicode_ident::is_xid_start(first)) {
            return Err(fail("must start with a letter or underscore"));
        }

        for c in chars {
            if !unicode_ident::is_xid_continue(c) {
                return Err(fail(&format!("invalid character '{}'", c)));
            }
        }

        Ok(())
    }
}

impl fmt::Display for NestedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for child in &self.children {
            write!(f, ".{}", child)?;
        }
        if let Some(key) = &self.key {
            write!(f, "[{}]", key)?;
        }
        Ok(())
    }
}
