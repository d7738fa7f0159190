//! Simulated BSC slave register bank.
//!
//! Models just enough of the controller to exercise the engine: both
//! FIFOs, the RSR error bits, the send latch that sits between the TX FIFO
//! and the wire, and the two hardware quirks the engine works around.
//!
//! - TXFE and TXFLEVEL only look at the FIFO, so a byte in the latch is
//!   invisible to them.
//! - CR.BRK leaves the FIFOs alone. Dropping TXE discards the latched
//!   byte and raising it again loads the next one.
//!
//! The master side is scripted with [`SimBsc::on_flag_read`], a hook that
//! runs every time FR is read. That is the engine's polling point, so it
//! is where bus activity appears to happen.

use std::collections::VecDeque;

use crate::bank::RegisterBank;
use crate::regs::{BscReg, Control, Flags, RawStatus, FIFO_DEPTH};

/// Controller state visible to master scripts.
#[derive(Debug, Default)]
pub struct SimState {
    pub rx: VecDeque<u8>,
    pub tx: VecDeque<u8>,
    /// Byte loaded for sending, not counted by TXFLEVEL.
    pub latch: Option<u8>,
    /// Everything the master has clocked out of us.
    pub sent: Vec<u8>,
    pub rsr: u32,
    pub cr: u32,
    /// Drives FR.RXBUSY.
    pub rx_busy: bool,
    /// Other registers, stored without side effects.
    pub regs: [u32; 16],
    /// Every register write, in order.
    pub writes: Vec<(BscReg, u32)>,
    /// Total register accesses, reads included.
    pub accesses: usize,
}

impl SimState {
    fn tx_enabled(&self) -> bool {
        Control::from_bits_retain(self.cr).contains(Control::TXE)
    }

    fn load_latch(&mut self) {
        if self.latch.is_none() && self.tx_enabled() {
            self.latch = self.tx.pop_front();
        }
    }

    /// Master writes `bytes`. Bytes that do not fit raise the overrun bit
    /// and are lost.
    pub fn master_write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.rx.len() < FIFO_DEPTH {
                self.rx.push_back(byte);
            } else {
                self.rsr |= RawStatus::OE.bits();
            }
        }
    }

    /// Master clocks one byte out of us. With nothing latched the bus
    /// reads idle-high and the underrun bit is raised.
    pub fn master_read(&mut self) -> u8 {
        match self.latch.take() {
            Some(byte) => {
                self.sent.push(byte);
                self.load_latch();
                byte
            }
            None => {
                self.rsr |= RawStatus::UE.bits();
                0xFF
            }
        }
    }

    pub fn flags(&self) -> Flags {
        let mut flags = Flags::empty();
        flags.set(Flags::RXFE, self.rx.is_empty());
        flags.set(Flags::RXFF, self.rx.len() >= FIFO_DEPTH);
        flags.set(Flags::TXFE, self.tx.is_empty());
        flags.set(Flags::TXFF, self.tx.len() >= FIFO_DEPTH);
        flags.set(Flags::RXBUSY, self.rx_busy);
        flags.set(Flags::TXBUSY, self.latch.is_some());
        flags
    }

    fn fr(&self) -> u32 {
        self.flags().with_levels(self.tx.len() as u32, self.rx.len() as u32)
    }

    fn write_cr(&mut self, value: u32) {
        let old = Control::from_bits_retain(self.cr);
        let new = Control::from_bits_retain(value);
        self.cr = value;
        if old.contains(Control::TXE) && !new.contains(Control::TXE) {
            self.latch = None;
        }
        if !old.contains(Control::TXE) && new.contains(Control::TXE) {
            self.load_latch();
        }
    }
}

type MasterScript = Box<dyn FnMut(&mut SimState) + Send>;

#[derive(Default)]
pub struct SimBsc {
    pub state: SimState,
    master: Option<MasterScript>,
}

impl SimBsc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the master script run on every FR read.
    pub fn on_flag_read(&mut self, script: impl FnMut(&mut SimState) + Send + 'static) {
        self.master = Some(Box::new(script));
    }

    fn reg(word: usize) -> BscReg {
        const REGS: [BscReg; 16] = [
            BscReg::Dr,
            BscReg::Rsr,
            BscReg::Slv,
            BscReg::Cr,
            BscReg::Fr,
            BscReg::Ifls,
            BscReg::Imsc,
            BscReg::Ris,
            BscReg::Mis,
            BscReg::Icr,
            BscReg::Dmacr,
            BscReg::Tdr,
            BscReg::Gpustat,
            BscReg::Hctrl,
            BscReg::Debug1,
            BscReg::Debug2,
        ];
        REGS[word]
    }
}

impl RegisterBank for SimBsc {
    fn read(&mut self, word: usize) -> u32 {
        self.state.accesses += 1;
        match Self::reg(word) {
            BscReg::Dr => self.state.rx.pop_front().map_or(0, u32::from),
            BscReg::Rsr => self.state.rsr,
            BscReg::Cr => self.state.cr,
            BscReg::Fr => {
                if let Some(script) = self.master.as_mut() {
                    script(&mut self.state);
                }
                self.state.fr()
            }
            _ => self.state.regs[word],
        }
    }

    fn write(&mut self, word: usize, value: u32) {
        let reg = Self::reg(word);
        self.state.accesses += 1;
        self.state.writes.push((reg, value));
        match reg {
            BscReg::Dr => {
                if self.state.tx.len() < FIFO_DEPTH {
                    self.state.tx.push_back(value as u8);
                }
                self.state.load_latch();
            }
            // Write-zero-to-clear.
            BscReg::Rsr => self.state.rsr &= value,
            BscReg::Cr => self.state.write_cr(value),
            BscReg::Fr => {}
            _ => self.state.regs[word] = value,
        }
    }
}
