//! Maps raw interrupt-flag snapshots onto the FSM's [`Event`](super::fsm::Event)
//! vocabulary.
//!
//! The transaction this adapter is built from classified a single packed
//! "last event" status word against a table of hardware-specific magic
//! values (`0x00030001` and friends), because that hardware exposed one
//! register that already folded "address acknowledged" and "so send/receive
//! the first byte" into adjacent but distinct event codes. This peripheral
//! exposes that as a single `addr_ack` flag instead, so one interrupt here
//! does the work of two events there: address-ack classification always
//! yields both the `Started*` transition (which direction, more-or-last
//! transaction) and the paired `AddrSentLen*` transition (how many bytes are
//! left to move) from the same flag read. Everything downstream of
//! [`next_state`](super::fsm::next_state) is unaffected by the collapse,
//! since both events still fire in the same order the table expects.
//!
//! There is no equivalent here of the original's spurious-value allowlist:
//! that table existed to recognize hardware-specific bit patterns its event
//! register could latch that meant nothing to the FSM (stray repeated-START
//! indications, reserved bits). This peripheral's interrupt-flag register
//! only ever sets flags this module already reads, so nothing unclassified
//! can reach the FSM; any flag combination this module doesn't recognize
//! degrades to `BusError` rather than being silently dropped.

use super::fsm::Event;
use super::txn::Direction;

/// Bytes remaining in the active transaction, bucketed the way the FSM's
/// transition table distinguishes "last byte", "second-to-last", and
/// "more than two to go".
fn bucket_remaining(remaining: usize) -> RemainingBucket {
    match remaining {
        0 => RemainingBucket::Zero,
        1 => RemainingBucket::One,
        2 => RemainingBucket::Two,
        _ => RemainingBucket::MoreThanTwo,
    }
}

enum RemainingBucket {
    Zero,
    One,
    Two,
    MoreThanTwo,
}

fn addr_sent_event(remaining: usize) -> Event {
    match bucket_remaining(remaining) {
        RemainingBucket::Zero => Event::AddrSentLenEq0,
        RemainingBucket::One => Event::AddrSentLenEq1,
        RemainingBucket::Two => Event::AddrSentLenEq2,
        RemainingBucket::MoreThanTwo => Event::AddrSentLenGt2,
    }
}

fn transfer_done_event(remaining: usize) -> Event {
    match bucket_remaining(remaining) {
        RemainingBucket::Zero => Event::TransferDoneLenEq0,
        RemainingBucket::One => Event::TransferDoneLenEq1,
        RemainingBucket::Two => Event::TransferDoneLenEq2,
        RemainingBucket::MoreThanTwo => Event::TransferDoneLenGt2,
    }
}

fn started_event(direction: Direction, is_last_txn: bool) -> Event {
    match (direction, is_last_txn) {
        (Direction::Read, false) => Event::StartedMoreTxnRead,
        (Direction::Read, true) => Event::StartedLastTxnRead,
        (Direction::Write, false) => Event::StartedMoreTxnWrite,
        (Direction::Write, true) => Event::StartedLastTxnWrite,
    }
}

/// Up to two FSM events raised by one pass through the event interrupt
/// handler. `heapless::Vec` keeps this allocation-free; callers drain it
/// with a plain `for` loop.
pub(crate) type EventBatch = heapless::Vec<Event, 2>;

/// Classifies the event-vector interrupt.
///
/// `addr_ack` and `done` are mutually exclusive in practice (the peripheral
/// only latches one per interrupt), but both are accepted here so the
/// caller can pass a single flag snapshot without re-reading registers
/// between checks.
pub(crate) fn classify_event_irq(
    direction: Direction,
    is_last_txn: bool,
    addr_ack: bool,
    done: bool,
    remaining: usize,
) -> EventBatch {
    let mut events = EventBatch::new();
    if addr_ack {
        let _ = events.push(started_event(direction, is_last_txn));
        let _ = events.push(addr_sent_event(remaining));
    } else if done {
        let _ = events.push(transfer_done_event(remaining));
    }
    events
}

/// Classifies the error-vector interrupt. A dedicated acknowledge-failure
/// flag means NACK; anything else this vector can latch is an
/// unrecoverable bus condition.
pub(crate) fn classify_error_irq(nack: bool) -> Event {
    if nack {
        Event::Nack
    } else {
        Event::BusError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_ack_yields_started_and_addr_sent_pair() {
        let events = classify_event_irq(Direction::Read, false, true, false, 6);
        assert_eq!(events.as_slice(), &[Event::StartedMoreTxnRead, Event::AddrSentLenGt2]);
    }

    #[test]
    fn addr_ack_on_last_txn_write_single_byte() {
        let events = classify_event_irq(Direction::Write, true, true, false, 1);
        assert_eq!(events.as_slice(), &[Event::StartedLastTxnWrite, Event::AddrSentLenEq1]);
    }

    #[test]
    fn done_yields_transfer_done_only() {
        let events = classify_event_irq(Direction::Read, true, false, true, 0);
        assert_eq!(events.as_slice(), &[Event::TransferDoneLenEq0]);
    }

    #[test]
    fn neither_flag_yields_nothing() {
        let events = classify_event_irq(Direction::Read, true, false, false, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn error_irq_nack_flag_set() {
        assert_eq!(classify_error_irq(true), Event::Nack);
    }

    #[test]
    fn error_irq_without_nack_is_bus_error() {
        assert_eq!(classify_error_irq(false), Event::BusError);
    }

    #[test]
    fn remaining_buckets_match_fsm_granularity() {
        assert_eq!(addr_sent_event(0), Event::AddrSentLenEq0);
        assert_eq!(addr_sent_event(1), Event::AddrSentLenEq1);
        assert_eq!(addr_sent_event(2), Event::AddrSentLenEq2);
        assert_eq!(addr_sent_event(3), Event::AddrSentLenGt2);
        assert_eq!(addr_sent_event(200), Event::AddrSentLenGt2);
    }
}
