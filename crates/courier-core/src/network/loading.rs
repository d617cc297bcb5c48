//! Reference-counted loading overlay with a debounced close.
//!
//! Every request that wants the overlay calls [`LoadingCoordinator::show`]
//! and holds the returned guard until it settles. The overlay opens when the
//! first such request starts and closes a short while after the last one
//! ends, so back-to-back requests do not make it flicker.

use crate::config::LoadingConfig;
use crate::notify::DynOverlay;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Delayed-task slot with cancel-and-reschedule semantics.
///
/// Scheduling a task aborts the one scheduled before it, so only the most
/// recent call ever runs.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, replacing any task still waiting.
    ///
    /// Outside a tokio runtime the task runs immediately.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.cancel();
            task();
            return;
        };

        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        if let Some(previous) = self.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Drop the waiting task, if any. Returns whether one was still pending.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Default)]
struct LoadingState {
    /// Requests currently holding the overlay.
    count: usize,
    overlay_open: bool,
}

struct LoadingInner {
    state: Mutex<LoadingState>,
    overlay: DynOverlay,
    debounce: Duration,
    teardown: Debouncer,
}

impl LoadingInner {
    fn lock(&self) -> MutexGuard<'_, LoadingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn close_if_idle(&self) {
        let mut state = self.lock();
        if state.count == 0 && state.overlay_open {
            state.overlay_open = false;
            self.overlay.close();
            debug!("Loading overlay closed");
        }
    }
}

/// Shared loading state of one orchestrator.
#[derive(Clone)]
pub struct LoadingCoordinator {
    inner: Arc<LoadingInner>,
}

impl LoadingCoordinator {
    pub fn new(overlay: DynOverlay) -> Self {
        Self::with_debounce(overlay, LoadingConfig::HIDE_DEBOUNCE)
    }

    pub fn with_debounce(overlay: DynOverlay, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(LoadingInner {
                state: Mutex::new(LoadingState::default()),
                overlay,
                debounce,
                teardown: Debouncer::new(),
            }),
        }
    }

    /// Take a hold on the overlay, opening it if nothing else holds it.
    ///
    /// An overlay still waiting for its debounced close is reused rather than
    /// opened a second time.
    pub fn show(&self, target: &str, attempt: u32) -> LoadingGuard {
        let mut state = self.inner.lock();
        if state.count == 0 {
            if state.overlay_open {
                self.inner.teardown.cancel();
            } else {
                self.inner.overlay.open(target, attempt);
                state.overlay_open = true;
                debug!(target_selector = target, attempt, "Loading overlay opened");
            }
        }
        state.count += 1;

        LoadingGuard {
            coordinator: self.clone(),
        }
    }

    /// Release one hold. Reaching zero schedules the debounced close.
    ///
    /// Extra calls at zero are harmless and just push the close back.
    pub fn hide(&self) {
        let idle = {
            let mut state = self.inner.lock();
            state.count = state.count.saturating_sub(1);
            state.count == 0
        };

        if idle {
            let inner: Weak<LoadingInner> = Arc::downgrade(&self.inner);
            self.inner.teardown.schedule(self.inner.debounce, move || {
                if let Some(inner) = inner.upgrade() {
                    inner.close_if_idle();
                }
            });
        }
    }

    /// Close the overlay now if nothing holds it, skipping the debounce.
    ///
    /// Meant for shutdown, where a pending delayed close would never run.
    pub fn flush(&self) {
        self.inner.teardown.cancel();
        self.inner.close_if_idle();
    }

    /// Number of requests currently holding the overlay.
    pub fn count(&self) -> usize {
        self.inner.lock().count
    }

    pub fn is_visible(&self) -> bool {
        self.inner.lock().overlay_open
    }
}

impl std::fmt::Debug for LoadingCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("LoadingCoordinator")
            .field("count", &state.count)
            .field("overlay_open", &state.overlay_open)
            .field("debounce", &self.inner.debounce)
            .finish()
    }
}

/// A single hold on the overlay; released on drop.
#[derive(Debug)]
pub struct LoadingGuard {
    coordinator: LoadingCoordinator,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.coordinator.hide();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LoadingOverlay;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingOverlay {
        opened: AtomicU32,
        closed: AtomicU32,
        last_attempt: AtomicU32,
    }

    impl LoadingOverlay for CountingOverlay {
        fn open(&self, _target: &str, attempt: u32) {
            self.opened.fetch_add(1, Ordering::SeqCst);
            self.last_attempt.store(attempt, Ordering::SeqCst);
        }

        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup() -> (Arc<CountingOverlay>, LoadingCoordinator) {
        let overlay = Arc::new(CountingOverlay::default());
        let coordinator = LoadingCoordinator::new(overlay.clone());
        (overlay, coordinator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_once_for_concurrent_holds() {
        let (overlay, coordinator) = setup();

        let a = coordinator.show("body", 0);
        let b = coordinator.show("body", 0);
        assert_eq!(overlay.opened.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.count(), 2);

        drop(a);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(coordinator.is_visible());
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 0);

        drop(b);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!coordinator.is_visible());
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_debounced() {
        let (overlay, coordinator) = setup();

        drop(coordinator.show("body", 0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(coordinator.is_visible());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!coordinator.is_visible());
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_hides_coalesce_into_one_close() {
        let (overlay, coordinator) = setup();

        drop(coordinator.show("body", 0));
        // These extra hides land inside the window.
        coordinator.hide();
        tokio::time::sleep(Duration::from_millis(100)).await;
        coordinator.hide();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_inside_window_reuses_overlay() {
        let (overlay, coordinator) = setup();

        drop(coordinator.show("body", 0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let guard = coordinator.show("body", 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(overlay.opened.load(Ordering::SeqCst), 1);
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 0);
        assert!(coordinator.is_visible());

        drop(guard);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_closes_idle_overlay_immediately() {
        let (overlay, coordinator) = setup();

        let guard = coordinator.show("body", 0);
        coordinator.flush();
        assert!(coordinator.is_visible());

        drop(guard);
        coordinator.flush();
        assert!(!coordinator.is_visible());
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(overlay.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_never_negative() {
        let (_overlay, coordinator) = setup();
        coordinator.hide();
        coordinator.hide();
        assert_eq!(coordinator.count(), 0);

        let guard = coordinator.show("body", 0);
        assert_eq!(coordinator.count(), 1);
        drop(guard);
        assert_eq!(coordinator.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_after_close_carries_attempt() {
        let (overlay, coordinator) = setup();

        drop(coordinator.show("body", 0));
        tokio::time::sleep(Duration::from_millis(400)).await;

        let _guard = coordinator.show("#table", 2);
        assert_eq!(overlay.opened.load(Ordering::SeqCst), 2);
        assert_eq!(overlay.last_attempt.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debouncer_without_runtime_runs_immediately() {
        let debouncer = Debouncer::new();
        let ran = Arc::new(AtomicU32::new(0));
        let counter = ran.clone();
        debouncer.schedule(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_reschedule_replaces_task() {
        let debouncer = Debouncer::new();
        let ran = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let counter = ran.clone();
            debouncer.schedule(Duration::from_millis(300), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
