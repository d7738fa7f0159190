//! BSC slave register map.
//!
//! Offsets are word indices into the mapped controller window. Bit positions
//! follow the BCM2835 ARM Peripherals document, with the FIFO depth
//! measured on hardware since the document leaves it out.

use bitflags::bitflags;

/// Depth of both the receive and the transmit FIFO.
pub const FIFO_DEPTH: usize = 16;

/// Size in bytes of the BSC slave register window.
pub const BSC_LEN: usize = 0x40;
/// Offset of the BSC slave window from the peripheral base.
pub const BSC_OFFSET: u64 = 0x21_4000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(usize)]
pub enum BscReg {
    /// Data: reads drain the RX FIFO, writes fill the TX FIFO.
    Dr = 0,
    /// Operation status and error clear.
    Rsr = 1,
    /// Slave address.
    Slv = 2,
    /// Control.
    Cr = 3,
    /// Flags.
    Fr = 4,
    /// Interrupt FIFO level select.
    Ifls = 5,
    /// Interrupt mask set/clear.
    Imsc = 6,
    /// Raw interrupt status.
    Ris = 7,
    /// Masked interrupt status.
    Mis = 8,
    /// Interrupt clear.
    Icr = 9,
    /// DMA control.
    Dmacr = 10,
    /// FIFO test data.
    Tdr = 11,
    /// GPU status.
    Gpustat = 12,
    /// Host control.
    Hctrl = 13,
    /// I2C debug.
    Debug1 = 14,
    /// SPI debug.
    Debug2 = 15,
}

impl BscReg {
    #[inline]
    pub const fn word(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// CR register.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct Control: u32 {
        const EN = 1 << 0;
        const SPI = 1 << 1;
        const I2C = 1 << 2;
        const CPHA = 1 << 3;
        const CPOL = 1 << 4;
        const ENSTAT = 1 << 5;
        const ENCTRL = 1 << 6;
        /// Break current operation. Does not clear the TX FIFO on real
        /// silicon despite what the datasheet says.
        const BRK = 1 << 7;
        const TXE = 1 << 8;
        const RXE = 1 << 9;
        const INV_RXF = 1 << 10;
        const TESTFIFO = 1 << 11;
        const HOSTCTRLEN = 1 << 12;
        const INV_TXF = 1 << 13;
    }
}

bitflags! {
    /// FR register. The two FIFO level fields are not flags; read them
    /// through [`Flags::tx_level`] and [`Flags::rx_level`].
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct Flags: u32 {
        const TXBUSY = 1 << 0;
        const RXFE = 1 << 1;
        const TXFF = 1 << 2;
        const RXFF = 1 << 3;
        const TXFE = 1 << 4;
        const RXBUSY = 1 << 5;
    }
}

impl Flags {
    pub const TXFLEVEL_SHIFT: u32 = 6;
    pub const RXFLEVEL_SHIFT: u32 = 11;
    pub const LEVEL_MASK: u32 = 0x1F;

    /// Interpret a raw FR read, keeping the level fields.
    #[inline]
    pub const fn from_raw(value: u32) -> Self {
        Self::from_bits_retain(value)
    }

    /// Bytes waiting in the TX FIFO. The byte already loaded into the
    /// send latch is not counted.
    #[inline]
    pub const fn tx_level(self) -> u32 {
        (self.bits() >> Self::TXFLEVEL_SHIFT) & Self::LEVEL_MASK
    }

    /// Bytes waiting in the RX FIFO.
    #[inline]
    pub const fn rx_level(self) -> u32 {
        (self.bits() >> Self::RXFLEVEL_SHIFT) & Self::LEVEL_MASK
    }

    /// Compose a raw FR value from flags and levels.
    pub const fn with_levels(self, tx_level: u32, rx_level: u32) -> u32 {
        self.bits()
            | ((tx_level & Self::LEVEL_MASK) << Self::TXFLEVEL_SHIFT)
            | ((rx_level & Self::LEVEL_MASK) << Self::RXFLEVEL_SHIFT)
    }
}

bitflags! {
    /// RSR register. Writing 0 to a bit clears it.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct RawStatus: u32 {
        /// RX overrun.
        const OE = 1 << 0;
        /// TX underrun.
        const UE = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_round_trip_through_raw_fr() {
        let raw = (Flags::TXFE | Flags::RXBUSY).with_levels(3, 16);
        let fr = Flags::from_raw(raw);
        assert!(fr.contains(Flags::TXFE | Flags::RXBUSY));
        assert!(!fr.contains(Flags::RXFE));
        assert_eq!(fr.tx_level(), 3);
        assert_eq!(fr.rx_level(), 16);
    }

    #[test]
    fn level_fields_do_not_alias_flags() {
        let fr = Flags::from_raw(Flags::empty().with_levels(0x1F, 0x1F));
        assert_eq!(fr.bits() & Flags::all().bits(), 0);
    }

    #[test]
    fn register_words_match_hardware_layout() {
        assert_eq!(BscReg::Dr.word(), 0);
        assert_eq!(BscReg::Cr.word(), 3);
        assert_eq!(BscReg::Fr.word(), 4);
        assert_eq!(BscReg::Debug2.word() * 4 + 4, BSC_LEN);
    }
}
