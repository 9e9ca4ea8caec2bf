//! ArgSpec: a callable's parameter contract and argument substitution.
//!
//! Substitution fills in the arguments a caller did not supply by resolving
//! parameter names against a [`Resolver`]: missing mandatory positionals are
//! an error, missing optional keywords are left to the callable's defaults.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Key, Resolver, Result, Value};

/// Keyword arguments.
pub type Kwargs = BTreeMap<String, Value>;

/// One element of an explicit signature description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureItem {
    /// Number of mandatory positional parameters. Only valid first.
    Count(usize),
    /// First: accept any positional arguments. After the positional names:
    /// accept any keyword arguments.
    Unbounded,
    /// A parameter name.
    Name(String),
}

impl From<usize> for SignatureItem {
    fn from(n: usize) -> Self {
        SignatureItem::Count(n)
    }
}

impl From<&str> for SignatureItem {
    fn from(name: &str) -> Self {
        SignatureItem::Name(name.to_string())
    }
}

impl From<bool> for SignatureItem {
    fn from(_: bool) -> Self {
        SignatureItem::Unbounded
    }
}

/// A callable's declared parameter list, as it would be introspected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<String>,
    /// How many trailing parameters have defaults.
    pub defaults: usize,
    pub var_positional: bool,
    pub var_keyword: bool,
}

impl Signature {
    pub fn new<S: Into<String>>(params: impl IntoIterator<Item = S>) -> Self {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn defaults(mut self, n: usize) -> Self {
        self.defaults = n;
        self
    }

    pub fn var_positional(mut self) -> Self {
        self.var_positional = true;
        self
    }

    pub fn var_keyword(mut self) -> Self {
        self.var_keyword = true;
        self
    }
}

/// Parameter contract of a callable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArgSpec {
    mandatory_positional: usize,
    names: Vec<String>,
    any_positional: bool,
    any_keyword: bool,
    mandatory_keywords: BTreeSet<String>,
}

impl ArgSpec {
    /// `n` mandatory positionals named by the first `n` names; the rest
    /// are optional keywords.
    pub fn new<S: Into<String>>(n: usize, names: impl IntoIterator<Item = S>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() < n {
            return Err(Error::configuration(format!(
                "{} mandatory positional parameters but only {} names",
                n,
                names.len()
            )));
        }
        Ok(Self {
            mandatory_positional: n,
            names,
            ..Self::default()
        })
    }

    /// Build from an explicit description.
    ///
    /// The first item is either `Count(n)` or `Unbounded` (any positional,
    /// `n = 0`); names follow. `Unbounded` placed right after the `n`
    /// positional names turns on any-keyword and must be the last item.
    ///
    /// ```rust
    /// use recstore_core::{ArgSpec, SignatureItem};
    ///
    /// let spec = ArgSpec::from_items(vec![2.into(), "a".into(), "b".into(), "c".into()]).unwrap();
    /// assert_eq!(spec.mandatory_positional(), 2);
    /// assert_eq!(spec.names(), ["a", "b", "c"]);
    ///
    /// let err = ArgSpec::from_items(vec![0.into(), SignatureItem::Unbounded, "a".into()]);
    /// assert!(err.is_err());
    /// ```
    pub fn from_items(items: Vec<SignatureItem>) -> Result<Self> {
        let mut items = items.into_iter().peekable();
        let (n, any_positional) = match items.peek() {
            None => return Ok(Self::default()),
            Some(SignatureItem::Count(n)) => {
                let n = *n;
                items.next();
                (n, false)
            }
            Some(SignatureItem::Unbounded) => {
                items.next();
                (0, true)
            }
            Some(SignatureItem::Name(_)) => (0, false),
        };

        let mut names = Vec::new();
        let mut any_keyword = false;
        for item in items {
            if any_keyword {
                return Err(Error::configuration(
                    "no more items accepted after the any-keyword marker",
                ));
            }
            match item {
                SignatureItem::Name(name) => names.push(name),
                SignatureItem::Unbounded if names.len() == n => any_keyword = true,
                SignatureItem::Unbounded => {
                    return Err(Error::configuration(format!(
                        "any-keyword marker must follow the {} positional names",
                        n
                    )));
                }
                SignatureItem::Count(_) => {
                    return Err(Error::configuration(
                        "positional count is only accepted as the first item",
                    ));
                }
            }
        }

        let mut spec = Self::new(n, names)?;
        spec.any_positional = any_positional;
        spec.any_keyword = any_keyword;
        Ok(spec)
    }

    /// Build from a declared signature: everything without a default is
    /// mandatory unless positionals are variadic.
    pub fn from_signature(signature: &Signature) -> Self {
        let n = signature
            .params
            .len()
            .saturating_sub(signature.defaults);
        Self {
            mandatory_positional: if signature.var_positional { 0 } else { n },
            names: signature.params.clone(),
            any_positional: signature.var_positional,
            any_keyword: signature.var_keyword,
            mandatory_keywords: BTreeSet::new(),
        }
    }

    /// Require keywords to be present once substitution is done.
    pub fn with_mandatory_keywords<S: Into<String>>(
        mut self,
        keywords: impl IntoIterator<Item = S>,
    ) -> Self {
        self.mandatory_keywords
            .extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn mandatory_positional(&self) -> usize {
        self.mandatory_positional
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn accepts_any_positional(&self) -> bool {
        self.any_positional
    }

    pub fn accepts_any_keyword(&self) -> bool {
        self.any_keyword
    }

    pub fn mandatory_keywords(&self) -> &BTreeSet<String> {
        &self.mandatory_keywords
    }

    /// Fill in missing arguments from `source`.
    ///
    /// `offset` skips leading parameter names reserved for an implicit
    /// argument (1 for method-like calls, whose first parameter is the owner).
    pub fn substitute(
        &self,
        source: &dyn Resolver,
        mut args: Vec<Value>,
        mut kwargs: Kwargs,
        offset: usize,
    ) -> Result<(Vec<Value>, Kwargs)> {
        let tail = self.names.get(offset..).unwrap_or_default();
        let mut remaining: Vec<&str> = tail.iter().map(String::as_str).collect();

        if !self.any_positional {
            let positional = self
                .names
                .get(offset..self.mandatory_positional)
                .unwrap_or_default();
            let supplied = args.len();
            for (i, name) in positional.iter().enumerate() {
                if i >= supplied {
                    let value = match source.resolve(&Key::from(name)) {
                        Ok(value) => value,
                        Err(e) if e.is_key_not_found() => {
                            return Err(Error::Substitution {
                                index: offset + i,
                                name: name.clone(),
                            });
                        }
                        Err(e) => return Err(e),
                    };
                    args.push(value);
                }
                remaining.retain(|r| *r != name.as_str());
            }
        }

        if self.any_keyword {
            let mut all: Kwargs = source
                .resolved_items()?
                .into_iter()
                .filter_map(|(k, v)| match k {
                    Key::Name(name) => Some((name, v)),
                    Key::Index(_) => None,
                })
                .collect();
            all.append(&mut kwargs);
            kwargs = all;
        } else {
            remaining.retain(|r| !kwargs.contains_key(*r));
            for name in remaining {
                match source.resolve(&Key::from(name)) {
                    Ok(value) => {
                        kwargs.insert(name.to_string(), value);
                    }
                    Err(e) if e.is_key_not_found() => {}
                    Err(e) => return Err(e),
                }
            }
        }

        if let Some(missing) = self
            .mandatory_keywords
            .iter()
            .find(|k| !kwargs.contains_key(*k))
        {
            return Err(Error::MissingKeyword {
                name: missing.clone(),
            });
        }

        Ok((args, kwargs))
    }
}
