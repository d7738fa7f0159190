pub mod bank;
pub mod config;
pub mod gpio;
pub mod mmap;
pub mod regs;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod slave;

pub use bank::RegisterBank;
pub use config::SlaveConfig;
pub use gpio::{Gpio, GpioFunction, GpioState};
pub use mmap::{MappedRegion, PeripheralMap, SocModel};
pub use slave::{BscSlave, ErrorCounts};

pub use pi2cslave_common::{Addr, ByteProducer, CancelToken, Cancelled};
