//! Scoped theme propagation: providers, consumer handles, and the
//! construction API.
//!
//! A [`ThemeScope`] is the factory the embedding application builds
//! once per registry: it bundles the validator, the provider, and the
//! class-token lookup, all closed over that registry. Each scope is
//! independent — nothing here is a process-wide singleton.
//!
//! Providers are scoped to a closure rather than a component subtree:
//! [`ThemeScope::provide`] pushes one store onto a thread-local stack
//! for the duration of the closure, and [`current_theme`] reads the
//! nearest (innermost) provider. Code that runs with no provider in
//! scope gets a detached handle with all-`None` reads and a no-op
//! setter, never an error.

use std::cell::RefCell;
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;

use crate::registry::{ThemeName, ThemeRegistry};
use crate::scheme::{SchemeSource, SystemSchemeSource};
use crate::store::{ListenerId, StoreShared, ThemeSnapshot, ThemeStore};

/// The one shared system source backing scopes that don't inject their
/// own. It is read-only shared state; every provider subscribes to it
/// independently.
static SYSTEM_SOURCE: Lazy<Arc<SystemSchemeSource>> =
    Lazy::new(|| Arc::new(SystemSchemeSource::new()));

thread_local! {
    static PROVIDERS: RefCell<Vec<Arc<ThemeStore>>> = RefCell::new(Vec::new());
}

/// Factory bound to one registry: validator, provider, and class-token
/// lookup in a single value.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use themescope::{current_theme, ColorScheme, ManualSchemeSource, ThemeRegistry, ThemeScope};
///
/// let registry = ThemeRegistry::new()
///     .add("light", "theme-light")
///     .add("dark", "theme-dark");
/// let source = ManualSchemeSource::new(Some(ColorScheme::Light));
/// let scope = ThemeScope::with_source(registry, Arc::new(source));
///
/// scope.provide(Some("dark"), || {
///     let theme = current_theme();
///     assert_eq!(theme.theme_name().as_deref(), Some("dark"));
///     assert_eq!(theme.os_theme_name().as_deref(), Some("light"));
///     assert_eq!(theme.theme_class_name().as_deref(), Some("theme-dark"));
/// });
/// ```
#[derive(Clone)]
pub struct ThemeScope {
    registry: Arc<ThemeRegistry>,
    source: Arc<dyn SchemeSource>,
}

impl ThemeScope {
    /// Creates a scope over `registry` using the shared OS scheme
    /// source.
    pub fn new(registry: ThemeRegistry) -> Self {
        let source: Arc<dyn SchemeSource> = SYSTEM_SOURCE.clone();
        Self::with_source(registry, source)
    }

    /// Creates a scope with an explicit scheme source (a
    /// [`ManualSchemeSource`](crate::ManualSchemeSource) in tests, or an
    /// embedder's own event-driven source).
    pub fn with_source(registry: ThemeRegistry, source: Arc<dyn SchemeSource>) -> Self {
        Self {
            registry: Arc::new(registry),
            source,
        }
    }

    /// The registry this scope is closed over.
    pub fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    /// Validates an arbitrary string against this scope's registry.
    /// See [`ThemeRegistry::validate`].
    pub fn validate(&self, candidate: Option<&str>) -> Option<ThemeName> {
        self.registry.validate(candidate)
    }

    /// Direct class-token lookup for a validated name.
    pub fn class_name(&self, name: &ThemeName) -> Option<&str> {
        self.registry.class_name(name)
    }

    /// Runs `f` with a fresh theme store in scope.
    ///
    /// The store seeds its selection from `initial_theme` (validated;
    /// unknown names degrade to no selection), tracks the scheme source
    /// live while `f` runs, and is torn down — watch detached, exactly
    /// once — when `f` returns or unwinds. Nested calls shadow outer
    /// providers for the inner closure only.
    pub fn provide<R>(&self, initial_theme: Option<&str>, f: impl FnOnce() -> R) -> R {
        let store = Arc::new(ThemeStore::new(
            Arc::clone(&self.registry),
            initial_theme,
            self.source.as_ref(),
        ));
        let _guard = ProviderGuard::push(store);
        f()
    }
}

impl std::fmt::Debug for ThemeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeScope")
            .field("registry", &self.registry)
            .finish()
    }
}

/// Pops the provider stack when the `provide` closure exits, unwinding
/// included.
struct ProviderGuard;

impl ProviderGuard {
    fn push(store: Arc<ThemeStore>) -> Self {
        PROVIDERS.with(|stack| stack.borrow_mut().push(store));
        ProviderGuard
    }
}

impl Drop for ProviderGuard {
    fn drop(&mut self) {
        PROVIDERS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Returns a handle to the nearest enclosing provider on this thread.
///
/// With no provider in scope the handle is detached: every read returns
/// `None` and the setter is a no-op, so consumers are safe to use before
/// a theme context is established.
pub fn current_theme() -> ThemeHandle {
    PROVIDERS.with(|stack| {
        stack
            .borrow()
            .last()
            .map(|store| ThemeHandle {
                shared: Some(store.shared_weak()),
            })
            .unwrap_or_else(ThemeHandle::detached)
    })
}

/// Consumer handle onto the nearest provider's theme state.
///
/// Reads are live — each call re-reads the store, so the handle observes
/// setter calls and OS preference changes without re-acquisition. The
/// handle holds only a weak reference: once its provider tears down it
/// degrades to the detached defaults instead of keeping the store alive.
#[derive(Clone)]
pub struct ThemeHandle {
    shared: Option<Weak<StoreShared>>,
}

impl ThemeHandle {
    fn detached() -> Self {
        Self { shared: None }
    }

    fn store(&self) -> Option<Arc<StoreShared>> {
        self.shared.as_ref().and_then(Weak::upgrade)
    }

    /// True if a live provider backs this handle.
    pub fn is_attached(&self) -> bool {
        self.store().is_some()
    }

    /// The explicitly selected theme, if any.
    pub fn theme_name(&self) -> Option<ThemeName> {
        self.store().and_then(|store| store.theme_name())
    }

    /// The host's preferred theme, if the host has an opinion.
    pub fn os_theme_name(&self) -> Option<ThemeName> {
        self.store().and_then(|store| store.os_theme_name())
    }

    /// The resolved theme in effect: selection, else OS preference.
    pub fn active_theme(&self) -> Option<ThemeName> {
        self.store().and_then(|store| store.active_theme())
    }

    /// Class token of the active theme, if the registry maps it.
    pub fn theme_class_name(&self) -> Option<String> {
        self.store().and_then(|store| store.theme_class_name())
    }

    /// Replaces the explicit selection (validated names only; see
    /// [`ThemeRegistry::validate`](crate::ThemeRegistry::validate)).
    /// No-op on a detached handle.
    pub fn set_theme_name(&self, name: Option<ThemeName>) {
        if let Some(store) = self.store() {
            store.set_theme_name(name);
        }
    }

    /// Current broadcast value as one coherent snapshot; all-`None` when
    /// detached.
    pub fn snapshot(&self) -> ThemeSnapshot {
        self.store()
            .map(|store| store.snapshot())
            .unwrap_or_else(ThemeSnapshot::empty)
    }

    /// Registers a change listener on the backing store; `None` when
    /// detached. The listener lives until removed or until the provider
    /// tears down.
    pub fn on_change<F>(&self, listener: F) -> Option<ListenerId>
    where
        F: Fn(&ThemeSnapshot) + Send + Sync + 'static,
    {
        self.store()
            .map(|store| store.on_change(Arc::new(listener)))
    }

    /// Removes a previously registered listener. No-op when detached or
    /// for unknown ids.
    pub fn remove_listener(&self, id: ListenerId) {
        if let Some(store) = self.store() {
            store.remove_listener(id);
        }
    }
}

impl std::fmt::Debug for ThemeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}
