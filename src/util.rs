//! Small synchronization helpers shared by the producer and render paths

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a producer panicked while holding it
///
/// Every critical section in this crate only copies or swaps buffers, so the
/// protected data stays consistent even when the holder unwound.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
