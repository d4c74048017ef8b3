//! Minimal concurrency primitives shared between caller threads and the two
//! interrupt vectors: a spinning, timeout-bounded mutex that serializes
//! concurrent [`transfer`](super::adapter::I2cAdapter::transfer) calls, and a
//! single-slot signal the event/error ISRs raise to wake a thread blocked on
//! one in progress.
//!
//! Both are built directly on `critical_section::Mutex<Cell<_>>`, the same
//! primitive this HAL already uses to share state with interrupt context
//! elsewhere, rather than on `cortex_m::interrupt` directly, so they also
//! work under the `critical-section/std` backend used by this crate's host
//! tests.

use core::cell::Cell;
use critical_section::Mutex as CsMutex;

use crate::communication::Timeout;

/// A single-slot binary semaphore. `signal` is safe to call from interrupt
/// context; `wait_timeout` spins in thread context until either `signal` has
/// been called or the timeout expires.
pub(crate) struct Signal {
    raised: CsMutex<Cell<bool>>,
}

impl Signal {
    pub(crate) const fn new() -> Self {
        Self {
            raised: CsMutex::new(Cell::new(false)),
        }
    }

    /// Raises the signal. Called from the event/error ISRs on transfer
    /// completion or failure.
    pub(crate) fn signal(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(true));
    }

    /// Clears any pending signal without waiting. Used before starting a new
    /// transfer so a stale signal from a prior timed-out transfer can't be
    /// mistaken for this one's completion.
    pub(crate) fn clear(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(false));
    }

    /// Takes and clears the signal if it was raised, without blocking.
    fn try_take(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.raised.borrow(cs);
            let was_raised = cell.get();
            cell.set(false);
            was_raised
        })
    }

    /// Blocks, spinning, until the signal is raised or `timeout` elapses.
    /// Returns `true` if the signal was observed.
    pub(crate) fn wait_timeout<T: Timeout>(&self, timeout: &mut T) -> bool {
        timeout.reset();
        loop {
            if self.try_take() {
                return true;
            }
            if timeout.poll() {
                return false;
            }
        }
    }
}

/// A spinning mutex with timeout-bounded acquisition, guarding the section
/// of [`I2cAdapter::transfer`](super::adapter::I2cAdapter::transfer) that
/// must not run concurrently from two caller threads. Never taken from
/// interrupt context.
pub(crate) struct TimedMutex {
    locked: CsMutex<Cell<bool>>,
}

/// RAII guard releasing a [`TimedMutex`] on drop.
pub(crate) struct MutexGuard<'a> {
    mutex: &'a TimedMutex,
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        critical_section::with(|cs| self.mutex.locked.borrow(cs).set(false));
    }
}

impl TimedMutex {
    pub(crate) const fn new() -> Self {
        Self {
            locked: CsMutex::new(Cell::new(false)),
        }
    }

    /// Non-blocking check of whether the mutex is currently held, for
    /// diagnostics (`check_clear`) rather than acquisition.
    pub(crate) fn is_locked(&self) -> bool {
        critical_section::with(|cs| self.locked.borrow(cs).get())
    }

    fn try_lock(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.locked.borrow(cs);
            if cell.get() {
                false
            } else {
                cell.set(true);
                true
            }
        })
    }

    /// Spins until the mutex is acquired or `timeout` elapses.
    pub(crate) fn lock_timeout<T: Timeout>(&self, timeout: &mut T) -> Option<MutexGuard<'_>> {
        timeout.reset();
        loop {
            if self.try_lock() {
                return Some(MutexGuard { mutex: self });
            }
            if timeout.poll() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    struct CountingTimeout {
        polls_until_expired: u32,
    }

    impl Timeout for CountingTimeout {
        fn poll(&mut self) -> bool {
            if self.polls_until_expired == 0 {
                true
            } else {
                self.polls_until_expired -= 1;
                false
            }
        }
        fn reset(&mut self) {}
        fn duration(&self) -> Duration {
            Duration::from_millis(0)
        }
    }

    #[test]
    fn signal_wait_returns_true_once_raised() {
        let signal = Signal::new();
        signal.signal();
        let mut timeout = CountingTimeout { polls_until_expired: 5 };
        assert!(signal.wait_timeout(&mut timeout));
    }

    #[test]
    fn signal_wait_times_out_when_never_raised() {
        let signal = Signal::new();
        let mut timeout = CountingTimeout { polls_until_expired: 3 };
        assert!(!signal.wait_timeout(&mut timeout));
    }

    #[test]
    fn clear_discards_a_stale_signal() {
        let signal = Signal::new();
        signal.signal();
        signal.clear();
        let mut timeout = CountingTimeout { polls_until_expired: 1 };
        assert!(!signal.wait_timeout(&mut timeout));
    }

    #[test]
    fn mutex_relocks_after_guard_dropped() {
        let mutex = TimedMutex::new();
        let mut timeout = CountingTimeout { polls_until_expired: 2 };
        let guard = mutex.lock_timeout(&mut timeout).expect("first lock succeeds");
        drop(guard);
        let mut timeout2 = CountingTimeout { polls_until_expired: 2 };
        assert!(mutex.lock_timeout(&mut timeout2).is_some());
    }

    #[test]
    fn mutex_lock_times_out_while_held() {
        let mutex = TimedMutex::new();
        let mut first_timeout = CountingTimeout { polls_until_expired: 2 };
        let _guard = mutex.lock_timeout(&mut first_timeout).expect("first lock succeeds");
        let mut second_timeout = CountingTimeout { polls_until_expired: 2 };
        assert!(mutex.lock_timeout(&mut second_timeout).is_none());
    }
}
