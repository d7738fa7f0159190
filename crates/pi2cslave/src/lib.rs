use std::io::BufRead;

use anyhow::{Context, Result};
use pi2cslave_bsc::{BscSlave, Gpio, PeripheralMap, SlaveConfig};
use pi2cslave_common::CancelToken;

pub mod responder;

pub use responder::{Activity, RegisterFile, Responder};

/// Default 8-bit bus address (0x20 once the R/W bit is shifted out).
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Parse an 8-bit bus address given in hex, with or without `0x`.
pub fn parse_address(text: &str) -> Result<u8> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u8::from_str_radix(digits, 16).with_context(|| format!("invalid I2C address '{}'", text))
}

/// Block on one line of `input` and cancel once it arrives.
///
/// End of input or a read error leaves `cancel` alone, so a daemonized
/// process with stdin on /dev/null keeps serving. Returns whether it
/// cancelled.
pub fn stop_on_enter<R: BufRead>(mut input: R, cancel: &CancelToken) -> bool {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(n) if n > 0 => {
            cancel.cancel();
            true
        }
        Ok(_) => {
            log::info!("stdin closed, serving until killed");
            false
        }
        Err(e) => {
            log::warn!("unable to read stdin, serving until killed: {}", e);
            false
        }
    }
}

/// Map the peripherals, bring the slave up and serve a [`RegisterFile`]
/// until `cancel` fires.
///
/// Returning tears things down in order: the controller is disabled, then
/// the register windows are unmapped.
pub fn run(config: &SlaveConfig, cancel: &CancelToken) -> Result<()> {
    let PeripheralMap { bsc, gpio } = PeripheralMap::open(&config.mem_path, config.soc)?;
    let mut gpio = Gpio::new(gpio);
    let slave = BscSlave::init(bsc, &mut gpio, config).context("unable to start BSC slave")?;

    let mut responder = Responder::new(slave, RegisterFile::default());
    log::info!("serving register file at {:#04x}", config.address);
    responder.serve(cancel, config.write_interval);
    Ok(())
}
