//! Error type returned by [`I2cAdapter`](super::adapter::I2cAdapter) operations.

use embedded_hal::i2c::{Error, ErrorKind, NoAcknowledgeSource};

/// Errors an I2C transfer, init, or bus check can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cError {
    /// The slave did not acknowledge its address or a data byte.
    Nack,
    /// The FSM latched an unrecoverable bus condition (arbitration loss,
    /// malformed START/STOP, a data error, or a transition the table has no
    /// entry for).
    BusError,
    /// The bus was stuck (SDA held low) and recovery did not clear it.
    RecoveryFailed,
    /// A bounded wait (mutex acquisition, transfer completion, or STOP
    /// completion) exceeded its timeout.
    Timeout,
    /// `transfer` was called with an empty transaction list.
    EmptyTransfer,
    /// The adapter was used before `init` or after a failed `init`.
    Uninitialized,
}

impl Error for I2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            I2cError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            I2cError::BusError => ErrorKind::Bus,
            I2cError::RecoveryFailed => ErrorKind::Bus,
            I2cError::Timeout => ErrorKind::Other,
            I2cError::EmptyTransfer => ErrorKind::Other,
            I2cError::Uninitialized => ErrorKind::Other,
        }
    }
}

/// Reasons [`I2cAdapter::check_clear`](super::adapter::I2cAdapter::check_clear)
/// can report the bus as not ready for a transfer, without mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckClearError {
    /// A transfer is already in flight on another caller thread.
    BusyLocked,
    /// The FSM is not in `Stopped` (a transfer is mid-flight on this thread's
    /// own call stack, or the adapter hasn't settled from a prior fault yet).
    NotStopped,
    /// SCL or SDA reads low while the bus should be idle.
    LinesLow,
}
