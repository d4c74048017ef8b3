//! Platform HAL shim: the thin register-level surface the FSM's entry
//! actions, IRQ classifier, and bus-recovery procedure are built on.
//!
//! A narrow trait implemented once per I2C instance via macro, so the FSM
//! engine above it is generic over "some I2C peripheral" rather than tied to
//! `I2C0` specifically.

use max78000::{GCR, I2C0, I2C1, I2C2};

/// Register-level operations the adapter needs from an I2C peripheral
/// instance: FIFO access, START/STOP/restart control, per-byte ACK
/// arm/disarm, interrupt enables, and the status flags the FSM's event and
/// error vectors classify.
///
/// Deliberately has no supertrait tying it to the PAC's register block type:
/// every operation the FSM engine needs is declared here explicitly, which
/// is what lets a host-side mock implement this trait without a real (or
/// faked) memory-mapped register block behind it.
pub trait I2cRegs {
    /// Disable the peripheral's clock via the GCR.
    fn peripheral_clock_disable(gcr: &GCR);
    /// Enable the peripheral's clock via the GCR.
    fn peripheral_clock_enable(gcr: &GCR);
    /// Pulse the peripheral's software reset via the GCR.
    fn reset_peripheral(gcr: &GCR);

    /// Configure master mode, disable slave-only features, and set the clock
    /// divider for the requested bus speed.
    fn configure_master(&mut self, clk_div: u32);

    /// Push one byte (already shifted to include the R/W bit, for an
    /// address byte) into the transmit FIFO.
    fn write_fifo(&mut self, byte: u8);
    /// Pop one byte from the receive FIFO. Caller must ensure it is non-empty.
    fn read_fifo(&mut self) -> u8;

    /// Issue a START condition.
    fn issue_start(&mut self);
    /// Issue a repeated START condition.
    fn issue_restart(&mut self);
    /// Issue a STOP condition.
    fn issue_stop(&mut self);
    /// Whether a STOP is still pending completion.
    fn stop_pending(&self) -> bool;

    /// Arm automatic ACK of incoming receive bytes (multi-byte read).
    fn arm_ack(&mut self);
    /// Disarm automatic ACK so the next received byte is NACKed (last byte
    /// of a read).
    fn disarm_ack(&mut self);

    /// Enable the address-ack / transfer-done / error-class event interrupts.
    fn enable_event_it(&mut self);
    /// Disable the address-ack / transfer-done / error-class event interrupts.
    fn disable_event_it(&mut self);
    /// Enable the acknowledge-failure interrupt.
    fn enable_error_it(&mut self);
    /// Disable the acknowledge-failure interrupt.
    fn disable_error_it(&mut self);
    /// Enable the receive-buffer-not-empty interrupt (reads only).
    fn enable_rx_buf_it(&mut self);
    /// Disable the receive-buffer-not-empty interrupt.
    fn disable_rx_buf_it(&mut self);
    /// Disable every interrupt this adapter ever enables.
    fn disable_all_it(&mut self) {
        self.disable_event_it();
        self.disable_error_it();
        self.disable_rx_buf_it();
    }

    /// Address-acknowledge flag (EV5/EV6-equivalent on this peripheral).
    fn is_addr_ack(&self) -> bool;
    /// Byte-transfer-complete flag (EV7/EV8_2-equivalent).
    fn is_done(&self) -> bool;
    /// Acknowledge-failure flag, raised by the error vector.
    fn is_nack(&self) -> bool;
    /// Clear the acknowledge-failure flag.
    fn clear_nack(&mut self);
    /// Whether the peripheral's BUSY status bit is still asserted, i.e. a
    /// START has been observed on the bus with no matching STOP yet. Bus
    /// recovery consults this after reinitializing the peripheral to decide
    /// whether a software reset is still needed.
    fn is_busy(&self) -> bool;

    /// Flush transmit and receive FIFOs.
    fn flush_fifo(&mut self);
    /// Clear every latched interrupt flag.
    fn clear_interrupt_flags(&mut self);
    /// Is the receive FIFO empty? Consulted before every `read_fifo` call as
    /// a guard against reading a byte that was never latched (a misrouted or
    /// spurious event interrupt reaching a read entry action).
    fn is_rx_fifo_empty(&self) -> bool;
}

macro_rules! gen_impl_i2cregs {
    ($register:ty, $lowercaseName:ident, $rstReg:ident, $pclkdisReg:ident) => {
        impl I2cRegs for $register {
            fn peripheral_clock_disable(gcr: &GCR) {
                gcr.$pclkdisReg().modify(|_, w| w.$lowercaseName().bit(true));
            }
            fn peripheral_clock_enable(gcr: &GCR) {
                gcr.$pclkdisReg().modify(|_, w| w.$lowercaseName().bit(false));
            }
            fn reset_peripheral(gcr: &GCR) {
                gcr.$rstReg().modify(|_, w| w.$lowercaseName().bit(true));
                while gcr.$rstReg().read().$lowercaseName().bit() {}
            }

            fn configure_master(&mut self, clk_div: u32) {
                self.ctrl().modify(|_, w| {
                    w.mst_mode()
                        .bit(true)
                        .gc_addr_en()
                        .bit(false)
                        .irxm_en()
                        .bit(false)
                        .clkstr_dis()
                        .bit(false)
                        .hs_en()
                        .bit(false)
                        .bb_mode()
                        .bit(false)
                        .en()
                        .bit(true)
                });
                unsafe {
                    self.clkhi().modify(|_, w| w.bits(clk_div));
                    self.clklo().modify(|_, w| w.bits(clk_div));
                }
            }

            fn write_fifo(&mut self, byte: u8) {
                self.fifo().write(|w| w.data().variant(byte));
            }
            fn read_fifo(&mut self) -> u8 {
                self.fifo().read().data().bits()
            }

            fn issue_start(&mut self) {
                self.mstctrl().modify(|_, w| w.start().bit(true));
            }
            fn issue_restart(&mut self) {
                self.mstctrl().modify(|_, w| w.restart().bit(true));
            }
            fn issue_stop(&mut self) {
                self.mstctrl().modify(|_, w| w.stop().bit(true));
            }
            fn stop_pending(&self) -> bool {
                self.mstctrl().read().stop().bit()
            }

            fn arm_ack(&mut self) {
                self.rxctrl1().modify(|_, w| w.cnt().variant(0));
            }
            fn disarm_ack(&mut self) {
                self.rxctrl1().modify(|_, w| w.cnt().variant(1));
            }

            fn enable_event_it(&mut self) {
                self.inten0().modify(|_, w| w.addr_ack().bit(true).done().bit(true));
            }
            fn disable_event_it(&mut self) {
                self.inten0().modify(|_, w| w.addr_ack().bit(false).done().bit(false));
            }
            fn enable_error_it(&mut self) {
                self.inten0().modify(|_, w| {
                    w.arb_err()
                        .bit(true)
                        .to_err()
                        .bit(true)
                        .data_err()
                        .bit(true)
                        .addr_nack_err()
                        .bit(true)
                        .start_err()
                        .bit(true)
                        .stop_err()
                        .bit(true)
                        .dnr_err()
                        .bit(true)
                });
            }
            fn disable_error_it(&mut self) {
                self.inten0().modify(|_, w| {
                    w.arb_err()
                        .bit(false)
                        .to_err()
                        .bit(false)
                        .data_err()
                        .bit(false)
                        .addr_nack_err()
                        .bit(false)
                        .start_err()
                        .bit(false)
                        .stop_err()
                        .bit(false)
                        .dnr_err()
                        .bit(false)
                });
            }
            fn enable_rx_buf_it(&mut self) {
                self.inten0().modify(|_, w| w.rx_thd().bit(true));
            }
            fn disable_rx_buf_it(&mut self) {
                self.inten0().modify(|_, w| w.rx_thd().bit(false));
            }

            fn is_addr_ack(&self) -> bool {
                self.intfl0().read().addr_ack().bit()
            }
            fn is_done(&self) -> bool {
                self.intfl0().read().done().bit()
            }
            fn is_nack(&self) -> bool {
                self.intfl0().read().addr_nack_err().bit()
            }
            fn clear_nack(&mut self) {
                self.intfl0().modify(|_, w| w.addr_nack_err().bit(true));
            }
            fn is_busy(&self) -> bool {
                self.status().read().busy().bit()
            }

            fn flush_fifo(&mut self) {
                self.rxctrl0().modify(|_, w| w.flush().bit(true));
                self.txctrl0().modify(|_, w| w.flush().bit(true));
                while self.rxctrl0().read().flush().bit() || self.txctrl0().read().flush().bit() {}
            }
            fn clear_interrupt_flags(&mut self) {
                self.intfl0().modify(|_, w| {
                    w.wr_addr_match()
                        .bit(true)
                        .rd_addr_match()
                        .bit(true)
                        .tx_lockout()
                        .bit(true)
                        .stop_err()
                        .bit(true)
                        .start_err()
                        .bit(true)
                        .dnr_err()
                        .bit(true)
                        .data_err()
                        .bit(true)
                        .addr_nack_err()
                        .bit(true)
                        .to_err()
                        .bit(true)
                        .arb_err()
                        .bit(true)
                        .addr_ack()
                        .bit(true)
                        .stop()
                        .bit(true)
                        .rx_thd()
                        .bit(true)
                        .addr_match()
                        .bit(true)
                        .gc_addr_match()
                        .bit(true)
                        .irxm()
                        .bit(true)
                        .done()
                        .bit(true)
                });
            }
            fn is_rx_fifo_empty(&self) -> bool {
                self.status().read().rx_em().bit()
            }
        }
    };
}

gen_impl_i2cregs!(I2C0, i2c0, rst0, pclkdis0);
gen_impl_i2cregs!(I2C1, i2c1, rst1, pclkdis0);
gen_impl_i2cregs!(I2C2, i2c2, rst1, pclkdis1);

/// Bit-bang access to SCL/SDA through the peripheral's own open-drain
/// control bits, used only by [`super::bus_reset`]. Mirrors the register
/// surface this peripheral's bit-bang mode already exposes for a fully
/// software-clocked master.
pub trait RecoveryPins {
    /// Switch the peripheral into bit-bang mode, releasing both lines high.
    fn enter_bitbang_mode(&mut self);
    /// Leave bit-bang mode, returning control to the normal master state
    /// machine.
    fn exit_bitbang_mode(&mut self);
    /// Release SCL (let the pull-up take it high).
    fn release_scl(&mut self);
    /// Drive SCL low.
    fn drive_scl_low(&mut self);
    /// Release SDA (let the pull-up take it high).
    fn release_sda(&mut self);
    /// Drive SDA low.
    fn drive_sda_low(&mut self);
    /// Read the current level of SCL.
    fn read_scl(&self) -> bool;
    /// Read the current level of SDA.
    fn read_sda(&self) -> bool;
}

macro_rules! gen_impl_recovery_pins {
    ($register:ty) => {
        impl RecoveryPins for $register {
            fn enter_bitbang_mode(&mut self) {
                self.ctrl().modify(|_, w| {
                    w.bb_mode().bit(true).scl_out().bit(true).sda_out().bit(true)
                });
            }
            fn exit_bitbang_mode(&mut self) {
                self.ctrl().modify(|_, w| w.bb_mode().bit(false));
            }
            fn release_scl(&mut self) {
                self.ctrl().modify(|_, w| w.scl_out().bit(true));
            }
            fn drive_scl_low(&mut self) {
                self.ctrl().modify(|_, w| w.scl_out().bit(false));
            }
            fn release_sda(&mut self) {
                self.ctrl().modify(|_, w| w.sda_out().bit(true));
            }
            fn drive_sda_low(&mut self) {
                self.ctrl().modify(|_, w| w.sda_out().bit(false));
            }
            fn read_scl(&self) -> bool {
                self.ctrl().read().scl().bit()
            }
            fn read_sda(&self) -> bool {
                self.ctrl().read().sda().bit()
            }
        }
    };
}

gen_impl_recovery_pins!(I2C0);
gen_impl_recovery_pins!(I2C1);
gen_impl_recovery_pins!(I2C2);
