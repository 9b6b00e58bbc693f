//! Theme name resolution and scoped propagation.
//!
//! `themescope` resolves which UI theme is in effect — reconciling an
//! explicit selection, the operating system's color-scheme preference,
//! and a default fallback — and makes the result readable by arbitrarily
//! nested code without parameter threading. It computes and distributes
//! a value; it draws nothing.
//!
//! This crate provides:
//!
//! - [`ThemeRegistry`]: the closed set of valid theme names, each with
//!   an opaque class token
//! - [`ThemeName`]: a name that passed validation against a registry
//! - [`ColorScheme`] / [`SchemeSource`]: the host's dark/light
//!   preference, queryable and watchable
//! - [`ThemeStore`]: explicit selection + live OS preference, with
//!   change broadcasts
//! - [`ThemeScope`] / [`current_theme`]: scoped providers and consumer
//!   handles
//!
//! Nothing on the resolution path fails: unknown theme names, hosts
//! without a preference signal, and consumers outside any provider all
//! degrade to `None` values and no-op setters.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use themescope::{current_theme, ColorScheme, ManualSchemeSource, ThemeRegistry, ThemeScope};
//!
//! let registry = ThemeRegistry::new()
//!     .add("light", "theme-light")
//!     .add("dark", "theme-dark");
//!
//! // Tests and embedders with their own event source inject one;
//! // `ThemeScope::new` uses the OS preference instead.
//! let source = ManualSchemeSource::new(Some(ColorScheme::Light));
//! let scope = ThemeScope::with_source(registry, Arc::new(source.clone()));
//!
//! scope.provide(Some("dark"), || {
//!     let theme = current_theme();
//!     assert_eq!(theme.active_theme().as_deref(), Some("dark"));
//!     assert_eq!(theme.theme_class_name().as_deref(), Some("theme-dark"));
//!
//!     // Clearing the selection falls back to the OS preference, which
//!     // is tracked live.
//!     theme.set_theme_name(None);
//!     source.set_scheme(ColorScheme::Dark);
//!     assert_eq!(theme.active_theme().as_deref(), Some("dark"));
//! });
//! ```

mod error;
mod registry;
mod scheme;
mod scope;
mod store;

pub use error::RegistryError;
pub use registry::{RegistryEntry, ThemeName, ThemeRegistry};
pub use scheme::{
    ColorScheme, ManualSchemeSource, NullSchemeSource, SchemeCallback, SchemeSource,
    SchemeSubscription, SystemSchemeSource,
};
pub use scope::{current_theme, ThemeHandle, ThemeScope};
pub use store::{ListenerId, ThemeSnapshot, ThemeStore};
