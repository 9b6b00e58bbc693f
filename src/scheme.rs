//! OS color-scheme detection and live change tracking.
//!
//! This module answers one question for the rest of the crate: "does the
//! host currently prefer a dark color scheme, and can I be told when
//! that changes?" It provides:
//!
//! - [`ColorScheme`]: the host's binary preference signal
//! - [`SchemeSource`]: the query/subscribe trait the store consumes
//! - [`SystemSchemeSource`]: the default source over OS settings
//! - [`ManualSchemeSource`]: an in-process source driven by the embedder
//! - [`NullSchemeSource`]: a capability-free host (headless contexts)
//! - [`SchemeSubscription`]: RAII handle that detaches a listener on drop

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use dark_light::{detect as detect_os_scheme, Mode as OsSchemeMode};
use log::{debug, trace};

/// The host environment's preferred color scheme.
///
/// "No preference" is deliberately conflated with `Light`: a host that
/// is fully light-unaware defaults to light. A host with no signal at
/// all is represented by `None` at the [`SchemeSource`] level instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    /// The conventional theme name for this scheme: `"light"` or `"dark"`.
    pub fn theme_name(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

/// Callback invoked when the preferred scheme changes.
pub type SchemeCallback = Box<dyn Fn(ColorScheme) + Send + Sync + 'static>;

/// A queryable, watchable origin for the host's color-scheme preference.
///
/// Implementations never fail: a host without the capability reports
/// `None` from [`SchemeSource::current`] and delivers no change events.
pub trait SchemeSource: Send + Sync {
    /// Returns the current preferred scheme, or `None` if the host
    /// offers no such signal.
    fn current(&self) -> Option<ColorScheme>;

    /// Starts delivering change notifications to `callback`.
    ///
    /// The returned subscription detaches the listener when dropped;
    /// after that no further invocations occur. Change events arrive on
    /// the source's own delivery timeline, possibly from another thread.
    fn watch(&self, callback: SchemeCallback) -> SchemeSubscription;
}

/// RAII handle for an active scheme watch.
///
/// Dropping the subscription detaches the listener exactly once; a
/// subscription dropped immediately after creation is equally fine.
pub struct SchemeSubscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl SchemeSubscription {
    pub(crate) fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription with nothing to detach, handed out by sources
    /// that never deliver events.
    pub fn detached() -> Self {
        Self { detach: None }
    }

    /// Explicitly detaches the listener (equivalent to dropping).
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SchemeSubscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
            debug!("scheme watch detached");
        }
    }
}

impl std::fmt::Debug for SchemeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeSubscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

/// Scheme source backed by the operating system's reported preference.
///
/// Reads go straight to the OS setting. Because the underlying detection
/// API is poll-only, [`SchemeSource::watch`] spawns a thread that
/// re-detects at a fixed interval and fires the callback on transitions;
/// dropping the subscription stops the thread at its next tick.
#[derive(Debug, Clone)]
pub struct SystemSchemeSource {
    poll_interval: Duration,
}

impl SystemSchemeSource {
    /// Default interval between preference re-detections.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Creates a source with the default poll interval.
    pub fn new() -> Self {
        Self::with_poll_interval(Self::DEFAULT_POLL_INTERVAL)
    }

    /// Creates a source that re-detects every `poll_interval`.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Default for SystemSchemeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeSource for SystemSchemeSource {
    fn current(&self) -> Option<ColorScheme> {
        Some(detect_system_scheme())
    }

    fn watch(&self, callback: SchemeCallback) -> SchemeSubscription {
        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let interval = self.poll_interval;

        thread::spawn(move || {
            let mut last = detect_system_scheme();
            while flag.load(Ordering::Relaxed) {
                thread::sleep(interval);
                if !flag.load(Ordering::Relaxed) {
                    break;
                }
                let now = detect_system_scheme();
                if now != last {
                    trace!("system scheme changed: {:?} -> {:?}", last, now);
                    last = now;
                    callback(now);
                }
            }
        });

        debug!("system scheme watch started (interval {:?})", interval);
        SchemeSubscription::new(move || alive.store(false, Ordering::Relaxed))
    }
}

/// Maps the OS detection result onto [`ColorScheme`].
fn detect_system_scheme() -> ColorScheme {
    match detect_os_scheme() {
        OsSchemeMode::Dark => ColorScheme::Dark,
        OsSchemeMode::Light => ColorScheme::Light,
    }
}

struct ManualInner {
    scheme: Mutex<Option<ColorScheme>>,
    listeners: Mutex<HashMap<u64, Arc<dyn Fn(ColorScheme) + Send + Sync>>>,
    next_id: AtomicU64,
}

/// Scheme source driven explicitly by the embedding application.
///
/// Useful both for tests and for embedders that already receive
/// preference-change events from their platform layer and want to
/// forward them instead of polling.
///
/// # Example
///
/// ```rust
/// use themescope::{ColorScheme, ManualSchemeSource, SchemeSource};
///
/// let source = ManualSchemeSource::new(Some(ColorScheme::Light));
/// assert_eq!(source.current(), Some(ColorScheme::Light));
///
/// source.set_scheme(ColorScheme::Dark);
/// assert_eq!(source.current(), Some(ColorScheme::Dark));
/// ```
#[derive(Clone)]
pub struct ManualSchemeSource {
    inner: Arc<ManualInner>,
}

impl ManualSchemeSource {
    /// Creates a source reporting `initial` as the current preference.
    pub fn new(initial: Option<ColorScheme>) -> Self {
        Self {
            inner: Arc::new(ManualInner {
                scheme: Mutex::new(initial),
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Updates the preference and notifies all active watchers.
    pub fn set_scheme(&self, scheme: ColorScheme) {
        *self.inner.scheme.lock().unwrap() = Some(scheme);

        // Snapshot listeners so callbacks run outside the lock.
        let listeners: Vec<_> = self
            .inner
            .listeners
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        trace!(
            "manual scheme set to {:?}, notifying {} watcher(s)",
            scheme,
            listeners.len()
        );
        for listener in listeners {
            listener(scheme);
        }
    }

    /// Number of currently attached watchers.
    pub fn watcher_count(&self) -> usize {
        self.inner.listeners.lock().unwrap().len()
    }
}

impl std::fmt::Debug for ManualSchemeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualSchemeSource")
            .field("scheme", &*self.inner.scheme.lock().unwrap())
            .field("watchers", &self.watcher_count())
            .finish()
    }
}

impl SchemeSource for ManualSchemeSource {
    fn current(&self) -> Option<ColorScheme> {
        *self.inner.scheme.lock().unwrap()
    }

    fn watch(&self, callback: SchemeCallback) -> SchemeSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap()
            .insert(id, Arc::from(callback));

        let inner: Weak<ManualInner> = Arc::downgrade(&self.inner);
        SchemeSubscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.lock().unwrap().remove(&id);
            }
        })
    }
}

/// Scheme source for hosts with no preference capability at all.
///
/// `current` is always `None` and no change events are ever delivered,
/// mirroring non-interactive execution contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSchemeSource;

impl SchemeSource for NullSchemeSource {
    fn current(&self) -> Option<ColorScheme> {
        None
    }

    fn watch(&self, _callback: SchemeCallback) -> SchemeSubscription {
        SchemeSubscription::detached()
    }
}
