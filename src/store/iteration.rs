//! Tracked result sequences
//!
//! Every sequence handed out by a connection is registered with that
//! connection so `close()` can force-close whatever the caller left open.
//! A force-closed sequence yields no further items; closing or dropping a
//! sequence deregisters it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

static NEXT_ITERATION_ID: AtomicU64 = AtomicU64::new(0);

/// Shared handle through which a connection can force-close a sequence it
/// handed out.
#[derive(Debug)]
pub(crate) struct IterationHandle {
    id: u64,
    closed: AtomicBool,
}

impl IterationHandle {
    fn new() -> Self {
        Self {
            id: NEXT_ITERATION_ID.fetch_add(1, Ordering::Relaxed),
            closed: AtomicBool::new(false),
        }
    }

    /// Mark the sequence closed. Returns `true` iff it was still open.
    pub(crate) fn force_close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Registry of the sequences a connection has handed out and not yet seen
/// closed. Weak entries keep dropped sequences free.
pub(crate) type IterationRegistry = Arc<Mutex<Vec<Weak<IterationHandle>>>>;

/// A result sequence registered with its originating connection.
///
/// Independently closeable by the caller; exhausting it closes it as well.
pub struct TrackedIteration<T> {
    inner: Option<Box<dyn Iterator<Item = T> + Send>>,
    handle: Arc<IterationHandle>,
    registry: IterationRegistry,
}

impl<T> TrackedIteration<T> {
    pub(crate) fn register(
        inner: Box<dyn Iterator<Item = T> + Send>,
        registry: &IterationRegistry,
    ) -> Self {
        let handle = Arc::new(IterationHandle::new());
        if let Ok(mut entries) = registry.lock() {
            entries.retain(|weak| weak.strong_count() > 0);
            entries.push(Arc::downgrade(&handle));
        }
        Self {
            inner: Some(inner),
            handle,
            registry: Arc::clone(registry),
        }
    }

    /// Close this sequence and deregister it from its connection.
    pub fn close(&mut self) {
        self.handle.force_close();
        self.inner = None;
        if let Ok(mut entries) = self.registry.lock() {
            entries.retain(|weak| match weak.upgrade() {
                Some(handle) => handle.id != self.handle.id,
                None => false,
            });
        }
    }

    /// True once this sequence has been closed, by the caller or by the
    /// connection.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl<T> Iterator for TrackedIteration<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.handle.is_closed() {
            self.inner = None;
            return None;
        }
        match self.inner.as_mut().and_then(|iter| iter.next()) {
            Some(item) => Some(item),
            None => {
                self.close();
                None
            }
        }
    }
}

impl<T> Drop for TrackedIteration<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> IterationRegistry {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn live_count(registry: &IterationRegistry) -> usize {
        registry
            .lock()
            .unwrap()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    #[test]
    fn test_iterates_and_autocloses() {
        let registry = registry();
        let mut iter = TrackedIteration::register(Box::new(vec![1, 2, 3].into_iter()), &registry);
        assert_eq!(live_count(&registry), 1);

        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), Some(3));
        assert_eq!(iter.next(), None);
        assert!(iter.is_closed());
        assert_eq!(live_count(&registry), 0);
    }

    #[test]
    fn test_force_close_stops_iteration() {
        let registry = registry();
        let mut iter = TrackedIteration::register(Box::new(vec![1, 2, 3].into_iter()), &registry);
        assert_eq!(iter.next(), Some(1));

        let handle = registry.lock().unwrap()[0].upgrade().unwrap();
        assert!(handle.force_close());
        assert_eq!(iter.next(), None);
        assert!(iter.is_closed());

        // Second force-close reports already closed
        assert!(!handle.force_close());
    }

    #[test]
    fn test_drop_deregisters() {
        let registry = registry();
        let iter = TrackedIteration::register(Box::new(std::iter::empty::<u32>()), &registry);
        assert_eq!(live_count(&registry), 1);
        drop(iter);
        assert_eq!(live_count(&registry), 0);
    }
}
