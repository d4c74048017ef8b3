//! Platform-independent timeout abstraction shared by peripherals that need
//! to bound a poll loop without depending on a concrete timer type.

use core::time::Duration;

/// Represents a timeout that can be polled and reset, independent of the
/// underlying clock source.
pub trait Timeout {
    /// Polls the timer to see if time is up, returning ``true`` if it is up.
    fn poll(&mut self) -> bool;

    /// Resets the timer back to its original duration.
    fn reset(&mut self);

    /// Gets the total duration of the timer.
    fn duration(&self) -> Duration;
}
