//! The global runtime lock.
//!
//! The dynamic runtime assumes it is driven by one thread at a time. Every
//! operation that reads a dynamic value takes this lock first. The lock is
//! reentrant: comparing two descriptors recursively compares their
//! submodules, and each level takes the lock again.
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, const_reentrant_mutex};

static RUNTIME_LOCK: ReentrantMutex<()> = const_reentrant_mutex(());

/// Scoped ownership of the runtime lock. Released on drop.
#[must_use = "the runtime lock is released as soon as the guard is dropped"]
pub struct RuntimeGuard {
    _guard: ReentrantMutexGuard<'static, ()>,
}

/// Acquire the runtime lock, blocking until it is available. Reentrant on the
/// calling thread.
pub fn lock() -> RuntimeGuard {
    RuntimeGuard {
        _guard: RUNTIME_LOCK.lock(),
    }
}

/// `true` if some thread currently holds the runtime lock.
pub fn is_locked() -> bool {
    RUNTIME_LOCK.is_locked()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_is_reentrant() {
        let outer = lock();
        let inner = lock();
        assert!(is_locked());
        drop(inner);
        assert!(is_locked());
        drop(outer);
    }

    #[test]
    fn lock_excludes_other_threads() {
        let guard = lock();
        let handle = std::thread::spawn(|| RUNTIME_LOCK.try_lock().is_some());
        assert!(!handle.join().unwrap());
        drop(guard);
    }
}
