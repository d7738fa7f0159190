use std::path::PathBuf;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::mmap::SocModel;

/// Pause between transmit FIFO refills while waiting on the master.
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_micros(25);

pub const DEFAULT_MEM_PATH: &str = "/dev/mem";

#[derive(TypedBuilder, Clone, Debug)]
pub struct SlaveConfig {
    /// 8-bit bus address, R/W bit included. The controller is programmed
    /// with `address >> 1`.
    pub address: u8,
    #[builder(default)]
    pub soc: SocModel,
    /// Zero turns the transmit loop into a pure spin, which is what the
    /// simulated bank wants.
    #[builder(default = DEFAULT_WRITE_INTERVAL)]
    pub write_interval: Duration,
    #[builder(default = PathBuf::from(DEFAULT_MEM_PATH), setter(into))]
    pub mem_path: PathBuf,
}

impl SlaveConfig {
    /// The 7-bit address as programmed into SLV.
    #[inline]
    pub const fn slave_address(&self) -> u8 {
        self.address >> 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = SlaveConfig::builder().address(0x40).build();
        assert_eq!(config.slave_address(), 0x20);
        assert_eq!(config.soc, SocModel::Bcm2837);
        assert_eq!(config.write_interval, DEFAULT_WRITE_INTERVAL);
        assert_eq!(config.mem_path, PathBuf::from("/dev/mem"));
    }

    #[test]
    fn builder_overrides() {
        let config = SlaveConfig::builder()
            .address(0x41)
            .soc(SocModel::Bcm2711)
            .write_interval(Duration::ZERO)
            .mem_path("/tmp/mem")
            .build();
        assert_eq!(config.slave_address(), 0x20);
        assert_eq!(config.soc, SocModel::Bcm2711);
        assert!(config.write_interval.is_zero());
        assert_eq!(config.mem_path, PathBuf::from("/tmp/mem"));
    }
}
