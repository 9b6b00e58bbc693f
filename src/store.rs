//! Theme state: explicit selection, live OS preference, derived values.
//!
//! A [`ThemeStore`] reconciles the explicitly chosen theme with the
//! host's color-scheme preference. The selection is seeded by validating
//! a caller string against the registry; the OS side is seeded with one
//! read of the scheme source and then tracked live until the store is
//! dropped, at which point the watch is detached exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use log::{debug, trace};

use crate::registry::{ThemeName, ThemeRegistry};
use crate::scheme::{ColorScheme, SchemeSource, SchemeSubscription};

/// Identifier for a registered change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Point-in-time view of a store's broadcast value.
///
/// This is the read shape consumers observe: the explicit selection, the
/// OS-driven value, and the class token of whichever of the two is
/// active. The setter travels separately on the consumer handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSnapshot {
    /// The explicitly selected theme, if any.
    pub theme_name: Option<ThemeName>,
    /// The host's preferred theme, if the host has an opinion.
    pub os_theme_name: Option<ThemeName>,
    /// Class token of the active theme, if the registry maps it.
    pub theme_class_name: Option<String>,
}

impl ThemeSnapshot {
    /// The snapshot observed when no provider is in scope.
    pub(crate) fn empty() -> Self {
        Self {
            theme_name: None,
            os_theme_name: None,
            theme_class_name: None,
        }
    }
}

type Listener = Arc<dyn Fn(&ThemeSnapshot) + Send + Sync>;

/// Shared interior of a [`ThemeStore`].
///
/// Consumer handles keep a `Weak` to this so they degrade to the
/// detached defaults once the owning provider tears down, and the scheme
/// callback does the same so a change event arriving after teardown is a
/// no-op instead of a dangling notification.
pub(crate) struct StoreShared {
    registry: Arc<ThemeRegistry>,
    selection: RwLock<Option<ThemeName>>,
    os_theme: RwLock<Option<ThemeName>>,
    listeners: Mutex<HashMap<ListenerId, Listener>>,
    next_listener_id: AtomicU64,
}

impl StoreShared {
    pub(crate) fn theme_name(&self) -> Option<ThemeName> {
        self.selection.read().unwrap().clone()
    }

    pub(crate) fn set_theme_name(&self, name: Option<ThemeName>) {
        {
            let mut selection = self.selection.write().unwrap();
            debug!("theme switched: {:?} -> {:?}", *selection, name);
            *selection = name;
        }
        self.notify();
    }

    pub(crate) fn os_theme_name(&self) -> Option<ThemeName> {
        self.os_theme.read().unwrap().clone()
    }

    /// Active theme: explicit selection if present, else OS preference.
    /// Recomputed on every read.
    pub(crate) fn active_theme(&self) -> Option<ThemeName> {
        self.theme_name().or_else(|| self.os_theme_name())
    }

    pub(crate) fn theme_class_name(&self) -> Option<String> {
        self.active_theme()
            .and_then(|name| self.registry.class_of(&name).map(str::to_string))
    }

    pub(crate) fn snapshot(&self) -> ThemeSnapshot {
        ThemeSnapshot {
            theme_name: self.theme_name(),
            os_theme_name: self.os_theme_name(),
            theme_class_name: self.theme_class_name(),
        }
    }

    pub(crate) fn on_change(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().unwrap().insert(id, listener);
        id
    }

    pub(crate) fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().remove(&id);
    }

    /// One scheme event, one recomputation, one broadcast. The explicit
    /// selection is untouched.
    fn scheme_changed(&self, scheme: ColorScheme) {
        {
            let mut os_theme = self.os_theme.write().unwrap();
            *os_theme = Some(ThemeName::new(scheme.theme_name()));
        }
        debug!("os preference changed: {:?}", scheme);
        self.notify();
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        // Snapshot the listener set so callbacks run outside the lock
        // and may themselves register or remove listeners.
        let listeners: Vec<Listener> = self.listeners.lock().unwrap().values().cloned().collect();
        trace!("broadcasting to {} listener(s)", listeners.len());
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Holds the current theme selection and the live OS preference for one
/// provider scope.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use themescope::{ColorScheme, ManualSchemeSource, ThemeRegistry, ThemeStore};
///
/// let registry = Arc::new(
///     ThemeRegistry::new()
///         .add("light", "theme-light")
///         .add("dark", "theme-dark"),
/// );
/// let source = ManualSchemeSource::new(Some(ColorScheme::Light));
/// let store = ThemeStore::new(registry, Some("dark"), &source);
///
/// // Explicit selection wins over the OS preference.
/// assert_eq!(store.active_theme().as_deref(), Some("dark"));
/// assert_eq!(store.theme_class_name().as_deref(), Some("theme-dark"));
///
/// // The OS side keeps tracking underneath.
/// source.set_scheme(ColorScheme::Dark);
/// assert_eq!(store.os_theme_name().as_deref(), Some("dark"));
/// ```
pub struct ThemeStore {
    shared: Arc<StoreShared>,
    // Dropped with the store: the watch detaches exactly once.
    _subscription: SchemeSubscription,
}

impl ThemeStore {
    /// Creates a store bound to `registry`, seeding the selection from
    /// `initial_theme` (validated; unknown names degrade to no
    /// selection) and the OS side from one read of `source`, then
    /// subscribing to `source` for live updates.
    pub fn new(
        registry: Arc<ThemeRegistry>,
        initial_theme: Option<&str>,
        source: &dyn SchemeSource,
    ) -> Self {
        let selection = registry.validate(initial_theme);
        let os_theme = source
            .current()
            .map(|scheme| ThemeName::new(scheme.theme_name()));

        let shared = Arc::new(StoreShared {
            registry,
            selection: RwLock::new(selection),
            os_theme: RwLock::new(os_theme),
            listeners: Mutex::new(HashMap::new()),
            next_listener_id: AtomicU64::new(1),
        });

        let weak = Arc::downgrade(&shared);
        let subscription = source.watch(Box::new(move |scheme| {
            if let Some(shared) = weak.upgrade() {
                shared.scheme_changed(scheme);
            }
        }));

        Self {
            shared,
            _subscription: subscription,
        }
    }

    /// The explicitly selected theme, if any.
    pub fn theme_name(&self) -> Option<ThemeName> {
        self.shared.theme_name()
    }

    /// Replaces the explicit selection and broadcasts the new state.
    ///
    /// Takes an already-validated [`ThemeName`] (or `None` to clear);
    /// arbitrary strings must go through
    /// [`ThemeRegistry::validate`](crate::ThemeRegistry::validate) first.
    pub fn set_theme_name(&self, name: Option<ThemeName>) {
        self.shared.set_theme_name(name);
    }

    /// The host's preferred theme, updated live by the scheme source.
    pub fn os_theme_name(&self) -> Option<ThemeName> {
        self.shared.os_theme_name()
    }

    /// The resolved theme in effect: selection, else OS preference.
    pub fn active_theme(&self) -> Option<ThemeName> {
        self.shared.active_theme()
    }

    /// Class token of the active theme, or `None` when there is no
    /// active theme or the registry does not map it.
    pub fn theme_class_name(&self) -> Option<String> {
        self.shared.theme_class_name()
    }

    /// Current broadcast value as one coherent snapshot.
    pub fn snapshot(&self) -> ThemeSnapshot {
        self.shared.snapshot()
    }

    /// Registers a listener invoked on every broadcast (setter calls and
    /// OS preference changes).
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ThemeSnapshot) + Send + Sync + 'static,
    {
        self.shared.on_change(Arc::new(listener))
    }

    /// Removes a listener by id. Unknown ids are ignored.
    pub fn remove_listener(&self, id: ListenerId) {
        self.shared.remove_listener(id);
    }

    /// The registry this store validates and resolves against.
    pub fn registry(&self) -> &ThemeRegistry {
        &self.shared.registry
    }

    pub(crate) fn shared_weak(&self) -> Weak<StoreShared> {
        Arc::downgrade(&self.shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{ManualSchemeSource, NullSchemeSource};
    use std::sync::atomic::AtomicUsize;

    fn registry() -> Arc<ThemeRegistry> {
        Arc::new(
            ThemeRegistry::new()
                .add("light", "theme-light")
                .add("dark", "theme-dark"),
        )
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    #[test]
    fn test_initial_theme_is_validated() {
        let source = ManualSchemeSource::new(None);
        let store = ThemeStore::new(registry(), Some("dark"), &source);
        assert_eq!(store.theme_name().as_deref(), Some("dark"));

        let store = ThemeStore::new(registry(), Some("no-such-theme"), &source);
        assert!(store.theme_name().is_none());

        let store = ThemeStore::new(registry(), None, &source);
        assert!(store.theme_name().is_none());
    }

    #[test]
    fn test_os_theme_seeded_from_source() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Dark));
        let store = ThemeStore::new(registry(), None, &source);
        assert_eq!(store.os_theme_name().as_deref(), Some("dark"));
    }

    #[test]
    fn test_no_capability_host() {
        let store = ThemeStore::new(registry(), None, &NullSchemeSource);
        assert!(store.os_theme_name().is_none());
        assert!(store.active_theme().is_none());
        assert!(store.theme_class_name().is_none());
    }

    // =========================================================================
    // Active theme resolution
    // =========================================================================

    #[test]
    fn test_selection_wins_over_os_preference() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        let store = ThemeStore::new(registry(), Some("dark"), &source);
        assert_eq!(store.active_theme().as_deref(), Some("dark"));
    }

    #[test]
    fn test_os_preference_fills_in_without_selection() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        let store = ThemeStore::new(registry(), None, &source);
        assert_eq!(store.active_theme().as_deref(), Some("light"));
    }

    #[test]
    fn test_clearing_selection_falls_back_to_os() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        let store = ThemeStore::new(registry(), Some("dark"), &source);

        store.set_theme_name(None);
        assert_eq!(store.active_theme().as_deref(), Some("light"));
    }

    #[test]
    fn test_class_name_follows_active_theme() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        let store = ThemeStore::new(registry(), Some("dark"), &source);
        assert_eq!(store.theme_class_name().as_deref(), Some("theme-dark"));

        store.set_theme_name(None);
        assert_eq!(store.theme_class_name().as_deref(), Some("theme-light"));
    }

    #[test]
    fn test_class_name_none_for_unmapped_os_theme() {
        // Registry without the conventional names: the OS value is still
        // reported, but the class lookup misses.
        let registry = Arc::new(ThemeRegistry::new().add("sepia", "theme-sepia"));
        let source = ManualSchemeSource::new(Some(ColorScheme::Dark));
        let store = ThemeStore::new(registry, None, &source);

        assert_eq!(store.os_theme_name().as_deref(), Some("dark"));
        assert!(store.theme_class_name().is_none());
    }

    // =========================================================================
    // Live tracking and broadcasts
    // =========================================================================

    #[test]
    fn test_scheme_change_updates_os_theme_only() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        let store = ThemeStore::new(registry(), Some("dark"), &source);

        source.set_scheme(ColorScheme::Dark);
        assert_eq!(store.os_theme_name().as_deref(), Some("dark"));
        assert_eq!(store.theme_name().as_deref(), Some("dark"));

        source.set_scheme(ColorScheme::Light);
        assert_eq!(store.os_theme_name().as_deref(), Some("light"));
        // Explicit selection untouched.
        assert_eq!(store.theme_name().as_deref(), Some("dark"));
    }

    #[test]
    fn test_one_broadcast_per_change() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        let store = ThemeStore::new(registry(), None, &source);

        let broadcasts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&broadcasts);
        store.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        source.set_scheme(ColorScheme::Dark);
        assert_eq!(broadcasts.load(Ordering::SeqCst), 1);

        source.set_scheme(ColorScheme::Light);
        source.set_scheme(ColorScheme::Dark);
        assert_eq!(broadcasts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_broadcast_carries_fresh_snapshot() {
        let source = ManualSchemeSource::new(None);
        let store = ThemeStore::new(registry(), None, &source);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.on_change(move |snapshot| {
            sink.lock().unwrap().push(snapshot.clone());
        });

        source.set_scheme(ColorScheme::Dark);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].os_theme_name.as_deref(), Some("dark"));
        assert_eq!(seen[0].theme_class_name.as_deref(), Some("theme-dark"));
        assert!(seen[0].theme_name.is_none());
    }

    #[test]
    fn test_setter_broadcasts() {
        let source = ManualSchemeSource::new(None);
        let store = ThemeStore::new(registry(), None, &source);

        let broadcasts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&broadcasts);
        store.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let dark = store.registry().validate(Some("dark"));
        store.set_theme_name(dark);
        assert_eq!(broadcasts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_listener() {
        let source = ManualSchemeSource::new(None);
        let store = ThemeStore::new(registry(), None, &source);

        let broadcasts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&broadcasts);
        let id = store.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.remove_listener(id);
        source.set_scheme(ColorScheme::Dark);
        assert_eq!(broadcasts.load(Ordering::SeqCst), 0);
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    #[test]
    fn test_drop_detaches_watch() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        let store = ThemeStore::new(registry(), None, &source);
        assert_eq!(source.watcher_count(), 1);

        drop(store);
        assert_eq!(source.watcher_count(), 0);

        // A further host change reaches nobody and panics nothing.
        source.set_scheme(ColorScheme::Dark);
    }

    #[test]
    fn test_immediate_drop_after_creation() {
        let source = ManualSchemeSource::new(Some(ColorScheme::Light));
        drop(ThemeStore::new(registry(), None, &source));
        assert_eq!(source.watcher_count(), 0);
    }
}
