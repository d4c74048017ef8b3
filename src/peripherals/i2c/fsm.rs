//! The adapter's finite state machine: states, events, and the transition table.
//!
//! This module is pure logic — no register access — so it can be exercised
//! entirely on the host. Entry-action *side effects* live in
//! [`super::adapter`]; this module only says which state follows which
//! `(state, event)` pair.

/// A state of the I2C adapter FSM.
///
/// Grouped as terminals/bootstrap, read branches (split on whether more
/// transactions follow in the list), and write branches (same split).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Idle; no transfer in flight, no peripheral interrupts enabled.
    Stopped,
    /// STOP has been requested; waiting for it to complete.
    Stopping,
    /// A transfer or a chained transaction has just been (re)started.
    Starting,
    /// An event arrived with no mapped transition for the current state.
    FsmFault,
    /// The peripheral reported a bus error or arbitration loss.
    BusError,
    /// The slave NACKed an address or data byte.
    Nack,

    /// Address phase of a read, with more transactions to follow.
    RMoreTxnAddr,
    /// Single-byte read, more transactions follow: ACK disarmed, restart armed.
    RMoreTxnPreOne,
    /// Entering a multi-byte read, more transactions follow: ACK armed.
    RMoreTxnPreFirst,
    /// Interior bytes of a multi-byte read, more transactions follow.
    RMoreTxnPreMiddle,
    /// Penultimate byte of a multi-byte read, more transactions follow.
    RMoreTxnPreLast,
    /// Final byte of a read, more transactions follow.
    RMoreTxnPostLast,

    /// Address phase of a read, last transaction in the list.
    RLastTxnAddr,
    /// Single-byte read, last transaction: ACK disarmed, STOP armed.
    RLastTxnPreOne,
    /// Entering a multi-byte read, last transaction: ACK armed.
    RLastTxnPreFirst,
    /// Interior bytes of a multi-byte read, last transaction.
    RLastTxnPreMiddle,
    /// Penultimate byte of a multi-byte read, last transaction.
    RLastTxnPreLast,
    /// Final byte of a read, last transaction.
    RLastTxnPostLast,

    /// Address phase of a write, more transactions to follow.
    WMoreTxnAddr,
    /// Interior bytes of a write, more transactions to follow.
    WMoreTxnMiddle,
    /// Final byte of a write, more transactions to follow.
    WMoreTxnLast,

    /// Address phase of a write, last transaction in the list.
    WLastTxnAddr,
    /// Interior bytes of a write, last transaction.
    WLastTxnMiddle,
    /// Final byte of a write, last transaction.
    WLastTxnLast,
}

/// An event that can drive the FSM forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Caller requested a transfer; kicks off `Starting`.
    Start,
    /// START (or repeated START) was acknowledged; current transaction is a
    /// read and more transactions follow it.
    StartedMoreTxnRead,
    /// Same, but the current transaction is a write.
    StartedMoreTxnWrite,
    /// START (or repeated START) was acknowledged; current transaction is a
    /// read and it is the last in the list.
    StartedLastTxnRead,
    /// Same, but the current transaction is a write.
    StartedLastTxnWrite,
    /// Address byte acknowledged; zero bytes remain in this transaction.
    AddrSentLenEq0,
    /// Address byte acknowledged; exactly one byte remains.
    AddrSentLenEq1,
    /// Address byte acknowledged; exactly two bytes remain.
    AddrSentLenEq2,
    /// Address byte acknowledged; more than two bytes remain.
    AddrSentLenGt2,
    /// A byte finished transferring; zero bytes remain.
    TransferDoneLenEq0,
    /// A byte finished transferring; exactly one byte remains.
    TransferDoneLenEq1,
    /// A byte finished transferring; exactly two bytes remain.
    TransferDoneLenEq2,
    /// A byte finished transferring; more than two bytes remain.
    TransferDoneLenGt2,
    /// The slave refused to acknowledge an address or data byte.
    Nack,
    /// The peripheral confirmed the STOP condition completed.
    Stopped,
    /// A bus error, arbitration loss, or undefined status was observed.
    BusError,
    /// Synthetic event: chain forward immediately, no external stimulus.
    Auto,
}

/// Looks up the next state for `(state, event)`.
///
/// Returns `None` when the pair has no mapped transition; callers must treat
/// that as an FSM fault (see [`super::adapter::I2cAdapter::inject_event`]).
pub(crate) fn next_state(state: State, event: Event) -> Option<State> {
    use Event::*;
    use State::*;

    match (state, event) {
        (FsmFault, Auto) => Some(Stopping),
        (BusError, Auto) => Some(Stopping),

        (Stopped, Start) => Some(Starting),
        (Stopped, BusError) => Some(self::State::BusError),

        (Stopping, Stopped) => Some(self::State::Stopped),
        (Stopping, BusError) => Some(self::State::BusError),

        (Starting, StartedMoreTxnRead) => Some(RMoreTxnAddr),
        (Starting, StartedMoreTxnWrite) => Some(WMoreTxnAddr),
        (Starting, StartedLastTxnRead) => Some(RLastTxnAddr),
        (Starting, StartedLastTxnWrite) => Some(WLastTxnAddr),
        (Starting, Nack) => Some(self::State::Nack),
        (Starting, BusError) => Some(self::State::BusError),

        // Read, more transactions follow.
        (RMoreTxnAddr, AddrSentLenEq1) => Some(RMoreTxnPreOne),
        (RMoreTxnAddr, AddrSentLenEq2) => Some(RMoreTxnPreFirst),
        (RMoreTxnAddr, AddrSentLenGt2) => Some(RMoreTxnPreFirst),
        (RMoreTxnAddr, BusError) => Some(self::State::BusError),

        (RMoreTxnPreOne, TransferDoneLenEq1) => Some(RMoreTxnPostLast),
        (RMoreTxnPreOne, BusError) => Some(self::State::BusError),

        (RMoreTxnPreFirst, TransferDoneLenEq2) => Some(RMoreTxnPreLast),
        (RMoreTxnPreFirst, TransferDoneLenGt2) => Some(RMoreTxnPreMiddle),
        (RMoreTxnPreFirst, BusError) => Some(self::State::BusError),

        (RMoreTxnPreMiddle, TransferDoneLenEq2) => Some(RMoreTxnPreLast),
        (RMoreTxnPreMiddle, TransferDoneLenGt2) => Some(RMoreTxnPreMiddle),
        (RMoreTxnPreMiddle, BusError) => Some(self::State::BusError),

        (RMoreTxnPreLast, TransferDoneLenEq1) => Some(RMoreTxnPostLast),
        (RMoreTxnPreLast, BusError) => Some(self::State::BusError),

        (RMoreTxnPostLast, Auto) => Some(Starting),

        // Read, last transaction in the list.
        (RLastTxnAddr, AddrSentLenEq1) => Some(RLastTxnPreOne),
        (RLastTxnAddr, AddrSentLenEq2) => Some(RLastTxnPreFirst),
        (RLastTxnAddr, AddrSentLenGt2) => Some(RLastTxnPreFirst),
        (RLastTxnAddr, BusError) => Some(self::State::BusError),

        (RLastTxnPreOne, TransferDoneLenEq1) => Some(RLastTxnPostLast),
        (RLastTxnPreOne, BusError) => Some(self::State::BusError),

        (RLastTxnPreFirst, TransferDoneLenEq2) => Some(RLastTxnPreLast),
        (RLastTxnPreFirst, TransferDoneLenGt2) => Some(RLastTxnPreMiddle),
        (RLastTxnPreFirst, BusError) => Some(self::State::BusError),

        (RLastTxnPreMiddle, TransferDoneLenEq2) => Some(RLastTxnPreLast),
        (RLastTxnPreMiddle, TransferDoneLenGt2) => Some(RLastTxnPreMiddle),
        (RLastTxnPreMiddle, BusError) => Some(self::State::BusError),

        (RLastTxnPreLast, TransferDoneLenEq1) => Some(RLastTxnPostLast),
        (RLastTxnPreLast, BusError) => Some(self::State::BusError),

        (RLastTxnPostLast, Auto) => Some(Stopping),

        // Write, more transactions follow.
        (WMoreTxnAddr, AddrSentLenEq1) => Some(WMoreTxnLast),
        (WMoreTxnAddr, AddrSentLenEq2) => Some(WMoreTxnMiddle),
        (WMoreTxnAddr, AddrSentLenGt2) => Some(WMoreTxnMiddle),
        (WMoreTxnAddr, Nack) => Some(self::State::Nack),
        (WMoreTxnAddr, BusError) => Some(self::State::BusError),

        (WMoreTxnMiddle, TransferDoneLenEq1) => Some(WMoreTxnLast),
        (WMoreTxnMiddle, TransferDoneLenEq2) => Some(WMoreTxnMiddle),
        (WMoreTxnMiddle, TransferDoneLenGt2) => Some(WMoreTxnMiddle),
        (WMoreTxnMiddle, Nack) => Some(self::State::Nack),
        (WMoreTxnMiddle, BusError) => Some(self::State::BusError),

        (WMoreTxnLast, TransferDoneLenEq0) => Some(Starting),
        (WMoreTxnLast, Nack) => Some(self::State::Nack),
        (WMoreTxnLast, BusError) => Some(self::State::BusError),

        // Write, last transaction in the list.
        (WLastTxnAddr, AddrSentLenEq1) => Some(WLastTxnLast),
        (WLastTxnAddr, AddrSentLenEq2) => Some(WLastTxnMiddle),
        (WLastTxnAddr, AddrSentLenGt2) => Some(WLastTxnMiddle),
        (WLastTxnAddr, Nack) => Some(self::State::Nack),
        (WLastTxnAddr, BusError) => Some(self::State::BusError),

        (WLastTxnMiddle, TransferDoneLenEq1) => Some(WLastTxnLast),
        (WLastTxnMiddle, TransferDoneLenEq2) => Some(WLastTxnMiddle),
        (WLastTxnMiddle, TransferDoneLenGt2) => Some(WLastTxnMiddle),
        (WLastTxnMiddle, Nack) => Some(self::State::Nack),
        (WLastTxnMiddle, BusError) => Some(self::State::BusError),

        (WLastTxnLast, TransferDoneLenEq0) => Some(Stopping),
        (WLastTxnLast, Nack) => Some(self::State::Nack),
        (WLastTxnLast, BusError) => Some(self::State::BusError),

        (self::State::Nack, Auto) => Some(Stopping),

        _ => None,
    }
}

/// Whether `state` is one of the two states a transfer must reach before the
/// exit path may proceed (see invariant 4 in the data model).
pub(crate) fn is_terminal(state: State) -> bool {
    matches!(state, State::Stopping | State::Stopped)
}

/// Whether `state` has a self-driven `Auto` transition and should be
/// re-injected with [`Event::Auto`] immediately rather than waiting for the
/// next hardware interrupt. Every other state is waiting on a real event.
pub(crate) fn auto_chains(state: State) -> bool {
    matches!(
        state,
        State::FsmFault | State::BusError | State::Nack | State::RMoreTxnPostLast | State::RLastTxnPostLast
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_chains_fault_and_bus_error_into_stopping() {
        assert_eq!(next_state(State::FsmFault, Event::Auto), Some(State::Stopping));
        assert_eq!(next_state(State::BusError, Event::Auto), Some(State::Stopping));
        assert_eq!(next_state(State::Nack, Event::Auto), Some(State::Stopping));
    }

    #[test]
    fn read_post_last_autos_to_starting_when_more_follow() {
        assert_eq!(next_state(State::RMoreTxnPostLast, Event::Auto), Some(State::Starting));
        assert_eq!(next_state(State::RLastTxnPostLast, Event::Auto), Some(State::Stopping));
    }

    #[test]
    fn single_byte_read_takes_the_pre_one_branch() {
        assert_eq!(
            next_state(State::RMoreTxnAddr, Event::AddrSentLenEq1),
            Some(State::RMoreTxnPreOne)
        );
        assert_eq!(
            next_state(State::RLastTxnAddr, Event::AddrSentLenEq1),
            Some(State::RLastTxnPreOne)
        );
    }

    #[test]
    fn multi_byte_read_self_loops_on_pre_middle_until_two_remain() {
        assert_eq!(
            next_state(State::RLastTxnPreFirst, Event::TransferDoneLenGt2),
            Some(State::RLastTxnPreMiddle)
        );
        assert_eq!(
            next_state(State::RLastTxnPreMiddle, Event::TransferDoneLenGt2),
            Some(State::RLastTxnPreMiddle)
        );
        assert_eq!(
            next_state(State::RLastTxnPreMiddle, Event::TransferDoneLenEq2),
            Some(State::RLastTxnPreLast)
        );
    }

    #[test]
    fn nack_only_valid_from_address_and_write_states() {
        assert_eq!(next_state(State::Starting, Event::Nack), Some(State::Nack));
        assert_eq!(next_state(State::WMoreTxnAddr, Event::Nack), Some(State::Nack));
        assert_eq!(next_state(State::WLastTxnMiddle, Event::Nack), Some(State::Nack));
        // Not a valid source for NACK: reading states never see it.
        assert_eq!(next_state(State::RLastTxnPreMiddle, Event::Nack), None);
    }

    #[test]
    fn bus_error_is_a_catch_all_from_every_active_state() {
        for state in [
            State::Starting,
            State::RMoreTxnAddr,
            State::RMoreTxnPreOne,
            State::RMoreTxnPreFirst,
            State::RMoreTxnPreMiddle,
            State::RMoreTxnPreLast,
            State::RLastTxnAddr,
            State::RLastTxnPreOne,
            State::RLastTxnPreFirst,
            State::RLastTxnPreMiddle,
            State::RLastTxnPreLast,
            State::WMoreTxnAddr,
            State::WMoreTxnMiddle,
            State::WMoreTxnLast,
            State::WLastTxnAddr,
            State::WLastTxnMiddle,
            State::WLastTxnLast,
            State::Stopped,
            State::Stopping,
        ] {
            assert_eq!(next_state(state, Event::BusError), Some(State::BusError), "{state:?}");
        }
    }

    #[test]
    fn unmapped_pair_is_a_fault() {
        assert_eq!(next_state(State::Stopped, Event::Auto), None);
        assert_eq!(next_state(State::RMoreTxnPostLast, Event::Nack), None);
    }

    #[test]
    fn auto_chains_matches_exactly_the_self_driven_states() {
        assert!(auto_chains(State::FsmFault));
        assert!(auto_chains(State::BusError));
        assert!(auto_chains(State::Nack));
        assert!(auto_chains(State::RMoreTxnPostLast));
        assert!(auto_chains(State::RLastTxnPostLast));
        assert!(!auto_chains(State::WMoreTxnLast));
        assert!(!auto_chains(State::Starting));
        assert!(!auto_chains(State::Stopped));
    }

    #[test]
    fn is_terminal_matches_stopped_and_stopping_only() {
        assert!(is_terminal(State::Stopped));
        assert!(is_terminal(State::Stopping));
        assert!(!is_terminal(State::Starting));
        assert!(!is_terminal(State::RMoreTxnAddr));
    }
}
