//! GPIO function select and output control.

use anyhow::{bail, Result};

use crate::bank::RegisterBank;

/// Offset of the GPIO window from the peripheral base.
pub const GPIO_OFFSET: u64 = 0x20_0000;
/// Size in bytes of the GPIO window.
pub const GPIO_LEN: usize = 0xF4;

/// User accessible GPIOs on the 40-pin header.
pub const GPIO_COUNT: u32 = 28;

/// BSC slave data line.
pub const GPIO_SDA: u32 = 18;
/// BSC slave clock line.
pub const GPIO_SCL: u32 = 19;

const FUNCTION_BITS: u32 = 3;
const FUNCTION_MASK: u32 = 0x7;
const FUNCTIONS_PER_REG: u32 = 10;

/// Word index of GPSET0 (byte offset 0x1C).
const GPSET0: usize = 0x1C / 4;
/// Word index of GPCLR0 (byte offset 0x28).
const GPCLR0: usize = 0x28 / 4;

/// Function select codes. The ALT numbering is not monotonic in hardware.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum GpioFunction {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
    Alt1 = 0b101,
    Alt2 = 0b110,
    Alt3 = 0b111,
    Alt4 = 0b011,
    Alt5 = 0b010,
}

/// Output state for [`Gpio::set_output`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GpioState {
    /// Released. The Pi has no open-drain mode, so the pin is turned into
    /// an input instead.
    Float,
    Low,
    High,
}

pub struct Gpio<B> {
    bank: B,
}

impl<B: RegisterBank> Gpio<B> {
    pub fn new(bank: B) -> Self {
        Self { bank }
    }

    pub fn into_inner(self) -> B {
        self.bank
    }

    fn check_pin(pin: u32) -> Result<()> {
        if pin >= GPIO_COUNT {
            log::error!("invalid GPIO: {}", pin);
            bail!("invalid GPIO {pin}, expected 0..{GPIO_COUNT}");
        }
        Ok(())
    }

    pub fn set_function(&mut self, pin: u32, function: GpioFunction) -> Result<()> {
        Self::check_pin(pin)?;
        let word = (pin / FUNCTIONS_PER_REG) as usize;
        let shift = (pin % FUNCTIONS_PER_REG) * FUNCTION_BITS;
        let value = self.bank.read(word) & !(FUNCTION_MASK << shift);
        self.bank.write(word, value | ((function as u32) << shift));
        Ok(())
    }

    pub fn function(&mut self, pin: u32) -> Result<GpioFunction> {
        Self::check_pin(pin)?;
        let word = (pin / FUNCTIONS_PER_REG) as usize;
        let shift = (pin % FUNCTIONS_PER_REG) * FUNCTION_BITS;
        let code = (self.bank.read(word) >> shift) & FUNCTION_MASK;
        Ok(match code {
            0b000 => GpioFunction::Input,
            0b001 => GpioFunction::Output,
            0b100 => GpioFunction::Alt0,
            0b101 => GpioFunction::Alt1,
            0b110 => GpioFunction::Alt2,
            0b111 => GpioFunction::Alt3,
            0b011 => GpioFunction::Alt4,
            _ => GpioFunction::Alt5,
        })
    }

    /// Drive `pin` to `state`. The level is latched before the pin is
    /// switched to output so it never glitches to the old level.
    pub fn set_output(&mut self, pin: u32, state: GpioState) -> Result<()> {
        Self::check_pin(pin)?;
        match state {
            GpioState::Float => self.set_function(pin, GpioFunction::Input),
            GpioState::Low => {
                self.bank.write(GPCLR0, 1 << pin);
                self.set_function(pin, GpioFunction::Output)
            }
            GpioState::High => {
                self.bank.write(GPSET0, 1 << pin);
                self.set_function(pin, GpioFunction::Output)
            }
        }
    }

    /// Hand SDA and SCL over to the BSC slave (ALT3).
    pub fn mux_bsc_slave(&mut self) -> Result<()> {
        self.set_function(GPIO_SDA, GpioFunction::Alt3)?;
        self.set_function(GPIO_SCL, GpioFunction::Alt3)?;
        log::debug!("GPIO{}/GPIO{} switched to ALT3", GPIO_SDA, GPIO_SCL);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::MemoryBank;

    fn gpio() -> Gpio<MemoryBank> {
        Gpio::new(MemoryBank::new(GPIO_LEN / 4))
    }

    #[test]
    fn bsc_pins_land_in_fsel1() {
        let mut gpio = gpio();
        gpio.mux_bsc_slave().unwrap();
        let bank = gpio.into_inner();
        // GPIO18 and GPIO19 are slots 8 and 9 of GPFSEL1.
        assert_eq!(bank.words[1], (0b111 << 24) | (0b111 << 27));
        assert_eq!(bank.words[0], 0);
        assert_eq!(bank.words[2], 0);
    }

    #[test]
    fn set_function_preserves_neighbours() {
        let mut gpio = gpio();
        gpio.set_function(10, GpioFunction::Alt0).unwrap();
        gpio.set_function(11, GpioFunction::Output).unwrap();
        gpio.set_function(10, GpioFunction::Alt5).unwrap();
        assert_eq!(gpio.function(10).unwrap(), GpioFunction::Alt5);
        assert_eq!(gpio.function(11).unwrap(), GpioFunction::Output);
    }

    #[test]
    fn high_and_low_use_set_and_clear_registers() {
        let mut gpio = gpio();
        gpio.set_output(4, GpioState::High).unwrap();
        gpio.set_output(5, GpioState::Low).unwrap();
        assert_eq!(gpio.function(4).unwrap(), GpioFunction::Output);
        assert_eq!(gpio.function(5).unwrap(), GpioFunction::Output);
        let bank = gpio.into_inner();
        assert_eq!(bank.words[GPSET0], 1 << 4);
        assert_eq!(bank.words[GPCLR0], 1 << 5);
    }

    #[test]
    fn float_turns_pin_into_input() {
        let mut gpio = gpio();
        gpio.set_output(17, GpioState::High).unwrap();
        gpio.set_output(17, GpioState::Float).unwrap();
        assert_eq!(gpio.function(17).unwrap(), GpioFunction::Input);
    }

    #[test]
    fn invalid_pin_is_rejected_without_touching_registers() {
        let mut gpio = gpio();
        assert!(gpio.set_output(GPIO_COUNT, GpioState::High).is_err());
        assert!(gpio.set_function(40, GpioFunction::Alt3).is_err());
        let bank = gpio.into_inner();
        assert!(bank.words.iter().all(|&w| w == 0));
    }
}
