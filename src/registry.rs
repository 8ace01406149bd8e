//! Registry of currently running bars.
//!
//! Other live-updating components need to answer "is a progress bar drawing on
//! this terminal right now?" before writing over the same region. Rather than
//! a hidden global list, the registry is an explicit object: bars announce
//! themselves to whichever [`Registry`] their template was configured with,
//! and collaborators hold a reference to the same one. [`Registry::global`]
//! provides the process-wide default used when nothing is injected.
//!
//! The registry holds weak back-references only. A bar that stops deregisters
//! itself; a bar whose every handle is dropped simply disappears from query
//! results.

use crate::bar::{ActiveBar, BarCore};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// A process-scoped collection of the bars that have been started.
pub struct Registry {
    bars: Mutex<Vec<Weak<BarCore>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            bars: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide default registry, shared by every bar that was not
    /// configured with an explicit one.
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    pub(crate) fn register(&self, core: &Arc<BarCore>) {
        self.lock().push(Arc::downgrade(core));
    }

    pub(crate) fn deregister(&self, core: &Arc<BarCore>) {
        self.lock().retain(|weak| match weak.upgrade() {
            Some(live) => !Arc::ptr_eq(&live, core),
            None => false,
        });
    }

    /// Handles to every bar that is registered and still active.
    pub fn active_bars(&self) -> Vec<ActiveBar> {
        self.lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|core| core.is_active())
            .map(ActiveBar::from_core)
            .collect()
    }

    /// Number of registered bars that are still active.
    pub fn active_count(&self) -> usize {
        self.lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|core| core.is_active())
            .count()
    }

    /// Whether any registered bar is currently running.
    pub fn is_any_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Drops entries whose bar no longer exists.
    pub fn prune(&self) {
        self.lock().retain(|weak| weak.strong_count() > 0);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<BarCore>>> {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::{ProgressBar, Sink};
    use std::io;

    fn quiet_bar(registry: &Arc<Registry>) -> ProgressBar {
        ProgressBar::new()
            .with_total(10)
            .with_show_elapsed_time(false)
            .with_writer(Sink::new(io::sink()))
            .with_registry(Arc::clone(registry))
    }

    #[test]
    fn start_registers_and_stop_deregisters() {
        let registry = Arc::new(Registry::new());
        let live = quiet_bar(&registry).start().unwrap();
        assert!(registry.is_any_active());
        assert_eq!(registry.active_count(), 1);

        live.stop().unwrap();
        assert!(!registry.is_any_active());
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn dropped_bars_vanish_from_queries() {
        let registry = Arc::new(Registry::new());
        let live = quiet_bar(&registry).start().unwrap();
        assert_eq!(registry.active_count(), 1);

        drop(live);
        assert_eq!(registry.active_count(), 0);
        registry.prune();
        assert!(registry.active_bars().is_empty());
    }

    #[test]
    fn active_bars_returns_usable_handles() {
        let registry = Arc::new(Registry::new());
        let live = quiet_bar(&registry).start().unwrap();

        let handles = registry.active_bars();
        assert_eq!(handles.len(), 1);
        handles[0].add(3).unwrap();
        assert_eq!(live.current(), 3);
        live.stop().unwrap();
    }

    #[test]
    fn global_registry_is_shared() {
        assert!(Arc::ptr_eq(&Registry::global(), &Registry::global()));
    }
}
