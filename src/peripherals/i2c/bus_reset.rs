//! Bit-banged recovery for a slave holding SDA low (clock-stretch past
//! recovery, or a slave that dropped off mid-byte leaving SDA asserted).
//!
//! Grounded on `i2c_bitbang.rs`'s `BBGCRI2C` bit-bang register surface and
//! on the six-step procedure this crate's bus-recovery routine was
//! distilled from: reconfigure the lines as open-drain outputs driven high,
//! clock SCL by hand while SDA is stuck low, hand-drive a STOP, then bring
//! the peripheral back into its normal master-mode configuration.

use max78000::GCR;

use super::regs::{I2cRegs, RecoveryPins};

/// Upper bound on SCL pulses issued while trying to shake a stuck slave
/// loose. Matches the retry bound the recovery procedure this module
/// generalizes used.
const MAX_RETRY_COUNT: u32 = 10;

/// Approximate half-period delay (in `cortex_m::asm::delay` cycles) between
/// edges while bit-banging. Callers running at a different core clock can
/// rescale by passing a different `half_period_cycles` to [`recover`].
const DEFAULT_HALF_PERIOD_CYCLES: u32 = 200;

/// Bound on how long `recover` will wait for the bus to settle while
/// clock-stretching or waiting for both lines to read high, in half-period
/// ticks.
const STRETCH_WAIT_ITERATIONS: u32 = 10_000;

/// Outcome of a bus-recovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Both lines read high and the peripheral was reinitialized.
    Recovered,
    /// SDA was still low after exhausting the retry budget.
    StillStuck,
}

/// Drives the bus-recovery sequence described in the module docs, then
/// restores the peripheral to master mode at `clk_div`.
///
/// `regs` must implement both register traits the sequence needs: the
/// bit-bang pin control surface and the normal master-mode configuration
/// surface used to reinitialize the peripheral afterwards. `gcr` is the
/// GCR block backing `R`'s `I2cRegs::peripheral_clock_disable`/
/// `peripheral_clock_enable`/`reset_peripheral`, needed for step 1's
/// deinit and step 6's conditional software reset.
pub(crate) fn recover<R>(regs: &mut R, gcr: &GCR, clk_div: u32) -> RecoveryOutcome
where
    R: I2cRegs + RecoveryPins,
{
    // Step 1: deinitialize the peripheral block before taking the pins over
    // for bit-banging, so the peripheral's own state machine can't fight the
    // manual SCL/SDA toggling below.
    R::peripheral_clock_disable(gcr);

    regs.enter_bitbang_mode();
    regs.release_scl();
    regs.release_sda();
    delay(DEFAULT_HALF_PERIOD_CYCLES);

    let mut retries = 0;
    while !regs.read_sda() && retries < MAX_RETRY_COUNT {
        regs.drive_scl_low();
        delay(DEFAULT_HALF_PERIOD_CYCLES);
        regs.release_scl();
        wait_for_scl_high(regs);
        delay(DEFAULT_HALF_PERIOD_CYCLES);
        retries += 1;
    }

    let outcome = if regs.read_sda() {
        // Hand-drive a START then a STOP to leave the bus in a known idle
        // state even if no slave was actually listening.
        regs.drive_sda_low();
        delay(DEFAULT_HALF_PERIOD_CYCLES);
        regs.drive_scl_low();
        delay(DEFAULT_HALF_PERIOD_CYCLES);
        regs.release_scl();
        wait_for_scl_high(regs);
        regs.release_sda();
        delay(DEFAULT_HALF_PERIOD_CYCLES);
        RecoveryOutcome::Recovered
    } else {
        RecoveryOutcome::StillStuck
    };

    regs.exit_bitbang_mode();
    // Step 6: reinitialize the peripheral now that the pins are back under
    // its control, then fall back to a software reset if BUSY is still
    // latched (a slave wedged mid-byte won't always clear on reinit alone).
    R::peripheral_clock_enable(gcr);
    regs.configure_master(clk_div);
    regs.flush_fifo();
    regs.clear_interrupt_flags();
    if regs.is_busy() {
        R::reset_peripheral(gcr);
        regs.configure_master(clk_div);
        regs.flush_fifo();
        regs.clear_interrupt_flags();
    }
    outcome
}

fn wait_for_scl_high<R: RecoveryPins>(regs: &R) {
    let mut waited = 0;
    while !regs.read_scl() && waited < STRETCH_WAIT_ITERATIONS {
        delay(1);
        waited += 1;
    }
}

#[cfg(not(test))]
fn delay(cycles: u32) {
    cortex_m::asm::delay(cycles);
}

#[cfg(test)]
fn delay(_cycles: u32) {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use critical_section::Mutex;

    // peripheral_clock_disable/enable/reset_peripheral are associated
    // functions (no &self), so a mock needs module-level counters rather
    // than per-instance fields to observe that `recover` called them.
    static CLOCK_DISABLE_CALLS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
    static CLOCK_ENABLE_CALLS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
    static RESET_CALLS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

    fn reset_call_counters() {
        critical_section::with(|cs| {
            CLOCK_DISABLE_CALLS.borrow(cs).set(0);
            CLOCK_ENABLE_CALLS.borrow(cs).set(0);
            RESET_CALLS.borrow(cs).set(0);
        });
    }

    struct MockRecoveryRegs {
        scl: Cell<bool>,
        sda: Cell<bool>,
        bitbang: Cell<bool>,
        sda_releases_after: Cell<u32>,
        busy: Cell<bool>,
    }

    impl RecoveryPins for MockRecoveryRegs {
        fn enter_bitbang_mode(&mut self) {
            self.bitbang.set(true);
        }
        fn exit_bitbang_mode(&mut self) {
            self.bitbang.set(false);
        }
        fn release_scl(&mut self) {
            self.scl.set(true);
        }
        fn drive_scl_low(&mut self) {
            self.scl.set(false);
        }
        fn release_sda(&mut self) {
            if self.sda_releases_after.get() == 0 {
                self.sda.set(true);
            } else {
                self.sda_releases_after.set(self.sda_releases_after.get() - 1);
            }
        }
        fn drive_sda_low(&mut self) {
            self.sda.set(false);
        }
        fn read_scl(&self) -> bool {
            self.scl.get()
        }
        fn read_sda(&self) -> bool {
            self.sda.get()
        }
    }

    impl I2cRegs for MockRecoveryRegs {
        fn peripheral_clock_disable(_gcr: &max78000::GCR) {
            critical_section::with(|cs| {
                let cell = CLOCK_DISABLE_CALLS.borrow(cs);
                cell.set(cell.get() + 1);
            });
        }
        fn peripheral_clock_enable(_gcr: &max78000::GCR) {
            critical_section::with(|cs| {
                let cell = CLOCK_ENABLE_CALLS.borrow(cs);
                cell.set(cell.get() + 1);
            });
        }
        fn reset_peripheral(_gcr: &max78000::GCR) {
            critical_section::with(|cs| {
                let cell = RESET_CALLS.borrow(cs);
                cell.set(cell.get() + 1);
            });
        }
        fn configure_master(&mut self, _clk_div: u32) {}
        fn write_fifo(&mut self, _byte: u8) {}
        fn read_fifo(&mut self) -> u8 {
            0
        }
        fn issue_start(&mut self) {}
        fn issue_restart(&mut self) {}
        fn issue_stop(&mut self) {}
        fn stop_pending(&self) -> bool {
            false
        }
        fn arm_ack(&mut self) {}
        fn disarm_ack(&mut self) {}
        fn enable_event_it(&mut self) {}
        fn disable_event_it(&mut self) {}
        fn enable_error_it(&mut self) {}
        fn disable_error_it(&mut self) {}
        fn enable_rx_buf_it(&mut self) {}
        fn disable_rx_buf_it(&mut self) {}
        fn is_addr_ack(&self) -> bool {
            false
        }
        fn is_done(&self) -> bool {
            false
        }
        fn is_nack(&self) -> bool {
            false
        }
        fn clear_nack(&mut self) {}
        fn is_busy(&self) -> bool {
            self.busy.get()
        }
        fn flush_fifo(&mut self) {}
        fn clear_interrupt_flags(&mut self) {}
        fn is_rx_fifo_empty(&self) -> bool {
            true
        }
    }

    #[test]
    fn recovers_once_sda_releases() {
        reset_call_counters();
        let gcr = unsafe { max78000::GCR::steal() };
        let mut regs = MockRecoveryRegs {
            scl: Cell::new(true),
            sda: Cell::new(false),
            bitbang: Cell::new(false),
            sda_releases_after: Cell::new(3),
            busy: Cell::new(false),
        };
        let outcome = recover(&mut regs, &gcr, 0x10);
        assert_eq!(outcome, RecoveryOutcome::Recovered);
        assert!(!regs.bitbang.get());
        critical_section::with(|cs| {
            assert_eq!(CLOCK_DISABLE_CALLS.borrow(cs).get(), 1);
            assert_eq!(CLOCK_ENABLE_CALLS.borrow(cs).get(), 1);
            assert_eq!(RESET_CALLS.borrow(cs).get(), 0);
        });
    }

    #[test]
    fn reports_still_stuck_when_retries_exhausted() {
        reset_call_counters();
        let gcr = unsafe { max78000::GCR::steal() };
        let mut regs = MockRecoveryRegs {
            scl: Cell::new(true),
            sda: Cell::new(false),
            bitbang: Cell::new(false),
            sda_releases_after: Cell::new(100),
            busy: Cell::new(false),
        };
        let outcome = recover(&mut regs, &gcr, 0x10);
        assert_eq!(outcome, RecoveryOutcome::StillStuck);
    }

    #[test]
    fn resets_peripheral_when_busy_persists_after_reinit() {
        reset_call_counters();
        let gcr = unsafe { max78000::GCR::steal() };
        let mut regs = MockRecoveryRegs {
            scl: Cell::new(true),
            sda: Cell::new(false),
            bitbang: Cell::new(false),
            sda_releases_after: Cell::new(3),
            busy: Cell::new(true),
        };
        let outcome = recover(&mut regs, &gcr, 0x10);
        assert_eq!(outcome, RecoveryOutcome::Recovered);
        critical_section::with(|cs| {
            assert_eq!(RESET_CALLS.borrow(cs).get(), 1);
            assert_eq!(CLOCK_ENABLE_CALLS.borrow(cs).get(), 1);
        });
    }
}
