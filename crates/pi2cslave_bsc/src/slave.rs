//! BSC controller operated as an I2C slave.
//!
//! The engine infers the bus direction from flag bits on every call instead
//! of keeping a state variable: an empty RX FIFO is taken to mean "the
//! master is not writing to us". It is meant to be driven by a single
//! polling thread alternating [`BscSlave::read_poll`] and
//! [`BscSlave::write`]; concurrent use needs external locking.

mod receive;
mod transmit;

use std::time::Duration;

use anyhow::{bail, Result};

use crate::bank::RegisterBank;
use crate::config::SlaveConfig;
use crate::gpio::Gpio;
use crate::regs::{BscReg, Control, Flags, RawStatus};

/// Running totals of the transient FIFO conditions seen so far.
///
/// These never fail a call; they are logged and counted so a caller can
/// tell whether a short transfer was the master's doing or ours.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorCounts {
    /// RX FIFO was full when a byte arrived; that byte was lost.
    pub overruns: u64,
    /// The master clocked a byte while the TX FIFO was empty.
    pub underruns: u64,
}

pub struct BscSlave<B: RegisterBank> {
    bank: B,
    write_interval: Duration,
    counts: ErrorCounts,
    enabled: bool,
}

impl<B: RegisterBank> BscSlave<B> {
    /// Mux the pins and bring the controller up as an I2C slave answering
    /// at `config.address`.
    pub fn init<G: RegisterBank>(
        bank: B,
        gpio: &mut Gpio<G>,
        config: &SlaveConfig,
    ) -> Result<Self> {
        let addr = config.slave_address();
        // 0000xxx and 1111xxx are reserved by the I2C specification.
        if !(0x08..=0x77).contains(&addr) {
            log::error!("invalid slave address: {:#04x}", config.address);
            bail!(
                "bus address {:#04x} maps to reserved 7-bit address {:#04x}",
                config.address,
                addr
            );
        }

        gpio.mux_bsc_slave()?;

        let mut slave = Self::attach(bank, config);
        let bank = &mut slave.bank;
        bank.write(BscReg::Cr.word(), Control::BRK.bits());
        bank.write(BscReg::Rsr.word(), 0);
        bank.write(BscReg::Imsc.word(), 0xF);
        bank.write(BscReg::Icr.word(), 0xF);
        bank.write(BscReg::Slv.word(), addr as u32);
        bank.write(
            BscReg::Cr.word(),
            (Control::TXE | Control::RXE | Control::I2C | Control::EN).bits(),
        );
        slave.enabled = true;

        // BRK does not empty the TX FIFO, so anything left over from a
        // previous session would otherwise go out on the first read.
        slave.flush_tx_fifo();

        log::info!("BSC slave enabled at {:#04x}", addr);
        Ok(slave)
    }

    /// Wrap a controller that has already been set up.
    ///
    /// Nothing is written; the controller is only disabled on drop if
    /// [`init`](BscSlave::init) enabled it.
    pub fn attach(bank: B, config: &SlaveConfig) -> Self {
        Self {
            bank,
            write_interval: config.write_interval,
            counts: ErrorCounts::default(),
            enabled: false,
        }
    }

    /// Disable the controller. Also runs on drop, before the bank itself
    /// is released.
    pub fn shutdown(&mut self) {
        self.bank.write(BscReg::Cr.word(), 0);
        if self.enabled {
            log::info!("BSC slave disabled");
        }
        self.enabled = false;
    }

    /// Whether the master is in the middle of writing to us.
    pub fn receiving(&mut self) -> bool {
        self.flags().contains(Flags::RXBUSY)
    }

    pub fn error_counts(&self) -> ErrorCounts {
        self.counts
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    #[inline]
    fn flags(&mut self) -> Flags {
        Flags::from_raw(self.bank.read(BscReg::Fr.word()))
    }

    #[inline]
    fn rx_empty(&mut self) -> bool {
        self.flags().contains(Flags::RXFE)
    }

    /// Returns true and clears the bit if `status` was raised.
    fn take_status(&mut self, status: RawStatus) -> bool {
        let rsr = RawStatus::from_bits_retain(self.bank.read(BscReg::Rsr.word()));
        if !rsr.contains(status) {
            return false;
        }
        self.bank.write(BscReg::Rsr.word(), (rsr - status).bits());
        true
    }
}

impl<B: RegisterBank> Drop for BscSlave<B> {
    fn drop(&mut self) {
        if self.enabled {
            self.shutdown();
        }
    }
}
