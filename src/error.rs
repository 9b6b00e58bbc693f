//! Registry construction errors.

/// Error returned when registry entry validation fails.
///
/// Nothing on the theme resolution path itself can fail; this only
/// surfaces configuration mistakes caught by
/// [`ThemeRegistry::validate_entries`](crate::ThemeRegistry::validate_entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same theme name appears in two entries.
    DuplicateName {
        /// The duplicated name.
        name: String,
        /// Index of the entry that wins at lookup time.
        first: usize,
        /// Index of the shadowed entry.
        second: usize,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateName {
                name,
                first,
                second,
            } => {
                write!(
                    f,
                    "theme '{}' is registered twice (entries {} and {}); the first entry wins",
                    name, first, second
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}
