//! Synchronization utilities for handling poisoned locks.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Extension trait for `Mutex` that treats poisoning as recoverable.
///
/// A poisoned lock means some thread panicked while holding the guard.
/// The state protected here (key pool slots, mock call history) stays
/// coherent through a panic, so the guard is returned anyway instead of
/// propagating a second failure.
pub trait IgnoreLock<T> {
    /// Lock the mutex, clearing any poison flag.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnoreLock<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
