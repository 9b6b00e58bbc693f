//! Theme registry and name validation.
//!
//! A [`ThemeRegistry`] is the closed set of theme names a scope is
//! configured with, each paired with an opaque class token (a style
//! identifier this crate passes through without interpreting). The
//! registry is built once, stays immutable, and is the only way to
//! obtain a [`ThemeName`]: arbitrary strings enter through
//! [`ThemeRegistry::validate`] and come out typed or not at all.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::RegistryError;

/// A theme name that passed validation against a registry.
///
/// Cheap to clone (`Arc<str>` internally). Application code cannot
/// construct one directly; it is produced by [`ThemeRegistry::validate`]
/// or derived from the OS color scheme. Holding a `ThemeName` therefore
/// means the string went through the boundary check once — downstream
/// code never re-validates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThemeName(Arc<str>);

impl ThemeName {
    pub(crate) fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ThemeName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ThemeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ThemeName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for ThemeName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Serialize for ThemeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// One registry entry: a theme name and its associated class token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// The theme name applications select by (e.g. "dark").
    pub name: String,
    /// Opaque style identifier associated with the name (e.g. "theme-dark").
    pub class_name: String,
}

/// The closed, ordered set of valid theme names for one scope.
///
/// The mapping form (name → class token) is the general shape; the
/// flat-list form is derived by [`ThemeRegistry::from_names`], which
/// uses each name as its own token.
///
/// # Example
///
/// ```rust
/// use themescope::ThemeRegistry;
///
/// let registry = ThemeRegistry::new()
///     .add("light", "theme-light")
///     .add("dark", "theme-dark");
///
/// let name = registry.validate(Some("dark")).unwrap();
/// assert_eq!(registry.class_name(&name), Some("theme-dark"));
/// assert!(registry.validate(Some("solarized")).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeRegistry {
    entries: Vec<RegistryEntry>,
}

impl ThemeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a theme name with its class token, returning the updated
    /// registry for chaining.
    ///
    /// Entries keep insertion order; when the same name is added twice,
    /// the first entry wins at validation time. Use
    /// [`ThemeRegistry::validate_entries`] to surface duplicates early.
    pub fn add(mut self, name: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.entries.push(RegistryEntry {
            name: name.into(),
            class_name: class_name.into(),
        });
        self
    }

    /// Builds a registry from a flat list of names, using each name as
    /// its own class token.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                RegistryEntry {
                    class_name: name.clone(),
                    name,
                }
            })
            .collect();
        Self { entries }
    }

    /// Validates an arbitrary, possibly absent string against the
    /// registered names.
    ///
    /// Walks the entries in definition order and returns the first exact
    /// (case-sensitive) match as a typed [`ThemeName`]. Absent input and
    /// unrecognized strings both yield `None`: an unknown theme is "no
    /// explicit preference", never an error.
    pub fn validate(&self, candidate: Option<&str>) -> Option<ThemeName> {
        let candidate = candidate?;
        self.entries
            .iter()
            .find(|entry| entry.name == candidate)
            .map(|entry| ThemeName::new(&entry.name))
    }

    /// Returns the class token for a validated name, or `None` if this
    /// registry does not map it.
    ///
    /// A `ThemeName` derived from the OS color scheme may legitimately
    /// be absent from the registry; the lookup degrades rather than
    /// panicking.
    pub fn class_name(&self, name: &ThemeName) -> Option<&str> {
        self.class_of(name.as_str())
    }

    pub(crate) fn class_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.class_name.as_str())
    }

    /// Returns true if the registry contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Iterates registered names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Returns the number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no themes are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the registry for duplicate names.
    ///
    /// Duplicates are not fatal at lookup time (first entry wins), but
    /// they usually indicate a configuration mistake. This is called
    /// explicitly by embedders that load registries from config.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] for the first duplicated
    /// name found.
    pub fn validate_entries(&self) -> Result<(), RegistryError> {
        for (second, entry) in self.entries.iter().enumerate() {
            if let Some(first) = self.entries[..second]
                .iter()
                .position(|earlier| earlier.name == entry.name)
            {
                return Err(RegistryError::DuplicateName {
                    name: entry.name.clone(),
                    first,
                    second,
                });
            }
        }
        Ok(())
    }
}
