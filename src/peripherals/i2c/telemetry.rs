//! Optional, allocation-free telemetry: counters for the failure modes
//! listed in this adapter's error taxonomy, plus a short rolling history of
//! FSM states and events for post-mortem inspection after a fault.
//!
//! Kept separate from [`I2cAdapter`](super::adapter::I2cAdapter) so a caller
//! that doesn't need it pays only for the `Option` check, not the storage;
//! `I2cAdapter::telemetry` is `None` unless constructed with telemetry
//! enabled.

use core::cell::{Cell, RefCell};
use critical_section::Mutex as CsMutex;
use heapless::{HistoryBuffer, Vec};

use super::fsm::{Event, State};

const HISTORY_LEN: usize = 16;

/// A point-in-time copy of the counters and rolling history, safe to hold
/// and inspect outside a critical section.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    /// Number of NACKs observed (address or data byte).
    pub nack_count: u32,
    /// Number of bounded waits that expired.
    pub timeout_count: u32,
    /// Number of IRQ-classified events the FSM had no transition for.
    pub bad_event_count: u32,
    /// Number of times the FSM landed in `FsmFault`.
    pub fsm_fault_count: u32,
    /// Number of times the error vector fired for a reason other than NACK.
    pub error_irq_count: u32,
    /// Most recent FSM states, oldest first.
    pub recent_states: Vec<State, HISTORY_LEN>,
    /// Most recent FSM events, oldest first.
    pub recent_events: Vec<Event, HISTORY_LEN>,
}

/// Counters and rolling history, all mutated from interrupt context under a
/// critical section.
pub struct Telemetry {
    state_history: CsMutex<RefCell<HistoryBuffer<State, HISTORY_LEN>>>,
    event_history: CsMutex<RefCell<HistoryBuffer<Event, HISTORY_LEN>>>,
    nack_count: CsMutex<Cell<u32>>,
    timeout_count: CsMutex<Cell<u32>>,
    bad_event_count: CsMutex<Cell<u32>>,
    fsm_fault_count: CsMutex<Cell<u32>>,
    error_irq_count: CsMutex<Cell<u32>>,
}

impl Telemetry {
    pub(crate) const fn new() -> Self {
        Self {
            state_history: CsMutex::new(RefCell::new(HistoryBuffer::new())),
            event_history: CsMutex::new(RefCell::new(HistoryBuffer::new())),
            nack_count: CsMutex::new(Cell::new(0)),
            timeout_count: CsMutex::new(Cell::new(0)),
            bad_event_count: CsMutex::new(Cell::new(0)),
            fsm_fault_count: CsMutex::new(Cell::new(0)),
            error_irq_count: CsMutex::new(Cell::new(0)),
        }
    }

    pub(crate) fn record_transition(&self, cs: critical_section::CriticalSection<'_>, state: State, event: Event) {
        self.state_history.borrow(cs).borrow_mut().write(state);
        self.event_history.borrow(cs).borrow_mut().write(event);
        if state == State::FsmFault {
            let cell = self.fsm_fault_count.borrow(cs);
            cell.set(cell.get() + 1);
        }
    }

    pub(crate) fn record_bad_event(&self, cs: critical_section::CriticalSection<'_>) {
        let cell = self.bad_event_count.borrow(cs);
        cell.set(cell.get() + 1);
    }

    pub(crate) fn record_nack(&self, cs: critical_section::CriticalSection<'_>) {
        let cell = self.nack_count.borrow(cs);
        cell.set(cell.get() + 1);
    }

    pub(crate) fn record_error_irq(&self, cs: critical_section::CriticalSection<'_>) {
        let cell = self.error_irq_count.borrow(cs);
        cell.set(cell.get() + 1);
    }

    pub(crate) fn record_timeout(&self) {
        critical_section::with(|cs| {
            let cell = self.timeout_count.borrow(cs);
            cell.set(cell.get() + 1);
        });
    }

    /// Copies out a consistent snapshot of every counter and the rolling
    /// history in one critical section.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        critical_section::with(|cs| TelemetrySnapshot {
            nack_count: self.nack_count.borrow(cs).get(),
            timeout_count: self.timeout_count.borrow(cs).get(),
            bad_event_count: self.bad_event_count.borrow(cs).get(),
            fsm_fault_count: self.fsm_fault_count.borrow(cs).get(),
            error_irq_count: self.error_irq_count.borrow(cs).get(),
            recent_states: self.state_history.borrow(cs).borrow().oldest_ordered().copied().collect(),
            recent_events: self.event_history.borrow(cs).borrow().oldest_ordered().copied().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_fsm_faults_from_transitions() {
        let telemetry = Telemetry::new();
        critical_section::with(|cs| {
            telemetry.record_transition(cs, State::Starting, Event::Start);
            telemetry.record_transition(cs, State::FsmFault, Event::BusError);
        });
        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.fsm_fault_count, 1);
        assert_eq!(snapshot.recent_states.as_slice(), &[State::Starting, State::FsmFault]);
    }

    #[test]
    fn independent_counters_do_not_interfere() {
        let telemetry = Telemetry::new();
        critical_section::with(|cs| {
            telemetry.record_nack(cs);
            telemetry.record_nack(cs);
            telemetry.record_error_irq(cs);
        });
        telemetry.record_timeout();
        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.nack_count, 2);
        assert_eq!(snapshot.timeout_count, 1);
        assert_eq!(snapshot.error_irq_count, 1);
        assert_eq!(snapshot.bad_event_count, 0);
    }

    #[test]
    fn history_wraps_past_capacity() {
        let telemetry = Telemetry::new();
        critical_section::with(|cs| {
            for _ in 0..(HISTORY_LEN + 4) {
                telemetry.record_transition(cs, State::Stopped, Event::Stopped);
            }
        });
        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.recent_states.len(), HISTORY_LEN);
    }
}
