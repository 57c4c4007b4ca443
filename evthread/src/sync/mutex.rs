use crate::clock::Timeout;
use crate::error::LockError;

use log::debug;
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError};
use std::time::Instant;

/// A named mutex with timed acquisition.
///
/// Unlike `std::sync::Mutex`, acquisition can give up after a timeout
/// or fail immediately with [`NO_WAIT`](crate::clock::NO_WAIT). The
/// mutex is not reentrant: locking it again from the thread that holds
/// it waits for the timeout like any other contender.
pub struct Mutex<T: ?Sized> {
    /// Diagnostic name.
    name: String,

    /// Whether some guard currently holds the lock.
    locked: StdMutex<bool>,

    /// Signalled when a guard releases the lock.
    released: Condvar,

    /// The protected value.
    ///
    /// Only reachable through a guard, which guarantees exclusivity.
    data: UnsafeCell<T>,
}

// Safety: the value moves with the mutex.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
// Safety: at most one guard exists at a time, so shared access to the
// mutex only ever hands out exclusive access to `T`.
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Creates an unlocked mutex holding `value`.
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            locked: StdMutex::new(false),
            released: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Consumes the mutex and returns the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// The diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> StdMutexGuard<'_, bool> {
        self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the mutex, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// - [`LockError::WouldBlock`] if `timeout` is `NoWait` and the mutex is held,
    /// - [`LockError::Timeout`] if a finite timeout elapsed first.
    pub fn lock(&self, timeout: Timeout) -> Result<MutexGuard<'_, T>, LockError> {
        let mut locked = self.state();

        match timeout {
            Timeout::NoWait => {
                if *locked {
                    debug!("mutex \"{}\" is held, not waiting", self.name);
                    return Err(LockError::WouldBlock);
                }
            }
            Timeout::Forever => {
                while *locked {
                    locked = self
                        .released
                        .wait(locked)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
            Timeout::After(duration) => {
                let deadline = Instant::now().checked_add(duration);

                while *locked {
                    locked = match deadline {
                        None => self
                            .released
                            .wait(locked)
                            .unwrap_or_else(PoisonError::into_inner),
                        Some(deadline) => {
                            let now = Instant::now();
                            if now >= deadline {
                                debug!("mutex \"{}\" not acquired within {duration:?}", self.name);
                                return Err(LockError::Timeout(duration));
                            }

                            self.released
                                .wait_timeout(locked, deadline - now)
                                .unwrap_or_else(PoisonError::into_inner)
                                .0
                        }
                    };
                }
            }
        }

        *locked = true;
        Ok(MutexGuard { mutex: self })
    }

    /// Acquires the mutex only if it is free right now.
    pub fn try_lock(&self) -> Result<MutexGuard<'_, T>, LockError> {
        self.lock(Timeout::NoWait)
    }

    /// Attempts acquisition and returns a guard that remembers the outcome.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let lock = counter.scoped_lock(NO_WAIT);
    /// if let Some(count) = lock.get() {
    ///     println!("count = {count}");
    /// }
    /// ```
    pub fn scoped_lock(&self, timeout: Timeout) -> ScopedLock<'_, T> {
        ScopedLock {
            guard: self.lock(timeout).ok(),
        }
    }

    /// Mutable access without locking; the borrow checker proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    fn unlock(&self) {
        *self.state() = false;
        self.released.notify_one();
    }
}

impl<T: ?Sized> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("name", &self.name)
            .field("locked", &*self.state())
            .finish_non_exhaustive()
    }
}

/// Proof that a [`Mutex`] is held.
///
/// Dereferences to the protected value and releases the mutex on drop.
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,
}

// Safety: sharing the guard shares `&T`.
unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// The outcome of a timed acquisition, held for a scope.
///
/// When acquisition succeeded the mutex stays locked until the
/// `ScopedLock` is dropped. When it failed the value is inert: the
/// accessors return `None` and dropping it releases nothing.
pub struct ScopedLock<'a, T: ?Sized> {
    guard: Option<MutexGuard<'a, T>>,
}

impl<'a, T: ?Sized> ScopedLock<'a, T> {
    /// Whether the mutex was acquired.
    pub fn is_locked(&self) -> bool {
        self.guard.is_some()
    }

    /// Shared access to the value, if the mutex was acquired.
    pub fn get(&self) -> Option<&T> {
        self.guard.as_deref()
    }

    /// Exclusive access to the value, if the mutex was acquired.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.guard.as_deref_mut()
    }

    /// Converts into the underlying guard, if the mutex was acquired.
    pub fn into_guard(self) -> Option<MutexGuard<'a, T>> {
        self.guard
    }
}
