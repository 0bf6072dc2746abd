// SPDX-License-Identifier: GPL-3.0-only

//! Scoped locks for the two pieces of shared pipeline state
//!
//! The pipeline owns exactly two locks: the graph lock (frame pulls against
//! state changes) and the overlay lock (registry mutation against the render
//! pass). They are distinct types with distinct guards, and a thread may hold
//! at most one of them at a time. Acquiring either while already holding one
//! is treated like a poisoned mutex: the process aborts.

use std::cell::Cell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};
use tracing::error;

thread_local! {
    /// Name of the pipeline lock held by the current thread, if any
    static HELD: Cell<Option<&'static str>> = const { Cell::new(None) };
}

/// Abort the process with a diagnostic.
///
/// Reserved for corrupted synchronization state. Everything recoverable goes
/// through `Result`.
pub fn fatal(message: &str) -> ! {
    error!(reason = message, "Unrecoverable synchronization failure");
    eprintln!("PANIC: {}", message);
    std::process::abort()
}

/// Marker trait naming a lock domain
pub trait LockDomain {
    const NAME: &'static str;
}

/// Domain of the graph lock
#[derive(Debug)]
pub struct Graph;

/// Domain of the overlay lock
#[derive(Debug)]
pub struct Overlays;

impl LockDomain for Graph {
    const NAME: &'static str = "graph lock";
}

impl LockDomain for Overlays {
    const NAME: &'static str = "overlay lock";
}

/// Mutex bound to one lock domain
#[derive(Debug)]
pub struct ScopedLock<T, D: LockDomain> {
    inner: Mutex<T>,
    _domain: PhantomData<D>,
}

/// Lock serializing frame pulls against graph state changes
pub type GraphLock<T> = ScopedLock<T, Graph>;

/// Lock serializing overlay mutation against the render pass
pub type OverlayLock<T> = ScopedLock<T, Overlays>;

/// Guard returned by [`ScopedLock::acquire`]
pub struct ScopedGuard<'a, T, D: LockDomain> {
    guard: MutexGuard<'a, T>,
    _domain: PhantomData<D>,
}

pub type GraphGuard<'a, T> = ScopedGuard<'a, T, Graph>;
pub type OverlayGuard<'a, T> = ScopedGuard<'a, T, Overlays>;

impl<T, D: LockDomain> ScopedLock<T, D> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            _domain: PhantomData,
        }
    }

    /// Acquire the lock, aborting on poison or nested acquisition
    pub fn acquire(&self) -> ScopedGuard<'_, T, D> {
        HELD.with(|held| {
            if let Some(other) = held.get() {
                fatal(&format!(
                    "Attempted to acquire the {} while holding the {}",
                    D::NAME,
                    other
                ));
            }
        });

        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(_) => fatal(&format!("Couldn't acquire the {}: poisoned", D::NAME)),
        };

        HELD.with(|held| held.set(Some(D::NAME)));
        ScopedGuard {
            guard,
            _domain: PhantomData,
        }
    }

    /// Exclusive access without locking (teardown)
    pub fn get_mut(&mut self) -> &mut T {
        match self.inner.get_mut() {
            Ok(value) => value,
            Err(_) => fatal(&format!("The {} was poisoned", D::NAME)),
        }
    }
}

impl<T, D: LockDomain> Drop for ScopedGuard<'_, T, D> {
    fn drop(&mut self) {
        HELD.with(|held| held.set(None));
    }
}

impl<T, D: LockDomain> Deref for ScopedGuard<'_, T, D> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, D: LockDomain> DerefMut for ScopedGuard<'_, T, D> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

/// Returns the lock currently held by this thread (diagnostics and tests)
pub fn held_lock() -> Option<&'static str> {
    HELD.with(|held| held.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_tracks_held_lock() {
        let graph: GraphLock<u32> = GraphLock::new(1);
        assert_eq!(held_lock(), None);
        {
            let mut guard = graph.acquire();
            *guard += 1;
            assert_eq!(held_lock(), Some("graph lock"));
        }
        assert_eq!(held_lock(), None);

        let overlays: OverlayLock<Vec<u8>> = OverlayLock::new(Vec::new());
        overlays.acquire().push(7);
        assert_eq!(held_lock(), None);
        assert_eq!(*overlays.acquire(), vec![7]);
    }

    #[test]
    fn test_sequential_acquisition_is_allowed() {
        let graph: GraphLock<()> = GraphLock::new(());
        let overlays: OverlayLock<()> = OverlayLock::new(());
        drop(graph.acquire());
        drop(overlays.acquire());
        drop(graph.acquire());
    }

    #[test]
    fn test_locks_are_independent_across_threads() {
        use std::sync::Arc;

        let overlays: Arc<OverlayLock<u32>> = Arc::new(OverlayLock::new(0));
        let graph: GraphLock<()> = GraphLock::new(());
        let _graph_guard = graph.acquire();

        // Another thread may take the overlay lock while this one holds the graph lock
        let remote = Arc::clone(&overlays);
        std::thread::spawn(move || *remote.acquire() += 1)
            .join()
            .unwrap();
        drop(_graph_guard);
        assert_eq!(*overlays.acquire(), 1);
    }
}
