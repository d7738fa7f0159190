//! `/dev/mem` register windows.

use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr::NonNull;

use anyhow::{Context, Result};

use crate::bank::RegisterBank;
use crate::gpio::{GPIO_LEN, GPIO_OFFSET};
use crate::regs::{BSC_LEN, BSC_OFFSET};

/// SoC family, which decides where the peripherals sit on the ARM bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum SocModel {
    /// Pi 1, Zero.
    Bcm2835,
    /// Pi 2, Pi 3, Zero 2.
    #[default]
    Bcm2837,
    /// Pi 4.
    Bcm2711,
}

impl SocModel {
    pub const fn peripheral_base(self) -> u64 {
        match self {
            SocModel::Bcm2835 => 0x2000_0000,
            SocModel::Bcm2837 => 0x3F00_0000,
            SocModel::Bcm2711 => 0xFE00_0000,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bcm2835" | "pi1" | "zero" => Some(SocModel::Bcm2835),
            "bcm2836" | "bcm2837" | "pi2" | "pi3" => Some(SocModel::Bcm2837),
            "bcm2711" | "pi4" => Some(SocModel::Bcm2711),
            _ => None,
        }
    }
}

// 32-bit glibc keeps `off_t` at 32 bits, too small for the BCM2711
// peripherals at 0xFE00_0000, so go through the 64-bit entry point there.
#[cfg(target_env = "gnu")]
type Offset = libc::off64_t;
#[cfg(target_env = "gnu")]
use libc::mmap64 as map_shared;

#[cfg(not(target_env = "gnu"))]
type Offset = libc::off_t;
#[cfg(not(target_env = "gnu"))]
use libc::mmap as map_shared;

fn physical_offset(base: u64) -> Result<Offset> {
    Offset::try_from(base)
        .with_context(|| format!("physical address {base:#x} does not fit a file offset"))
}

/// A physical register window mapped into this process.
///
/// Accesses are volatile 32-bit loads and stores. The mapping is released
/// on drop, so anything that still has to write to the hardware (such as
/// disabling the controller) must run before this value goes away.
pub struct MappedRegion {
    ptr: NonNull<u32>,
    len: usize,
    base: u64,
}

// Every access takes `&mut self`, so only the owning thread touches it.
unsafe impl Send for MappedRegion {}

impl MappedRegion {
    pub fn open(path: impl AsRef<Path>, base: u64, len: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .with_context(|| format!("unable to open {}", path.display()))?;

        let offset = physical_offset(base)?;

        // SAFETY: a fresh shared mapping of a device file; the kernel picks
        // the address and we check for failure before using it.
        let ptr = unsafe {
            map_shared(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_LOCKED,
                file.as_raw_fd(),
                offset,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(std::io::Error::last_os_error())
                .with_context(|| format!("unable to mmap {len:#x} bytes at {base:#x}"));
        }
        let ptr = NonNull::new(ptr.cast::<u32>()).context("mmap returned a null mapping")?;

        log::debug!(
            "mapped {:#x} bytes at physical {:#x} from {}",
            len,
            base,
            path.display()
        );
        Ok(Self { ptr, len, base })
    }

    #[inline]
    fn words(&self) -> usize {
        self.len / std::mem::size_of::<u32>()
    }
}

impl RegisterBank for MappedRegion {
    fn read(&mut self, word: usize) -> u32 {
        assert!(word < self.words(), "register word {} out of range", word);
        // SAFETY: bounds checked above; the mapping lives as long as self.
        unsafe { self.ptr.as_ptr().add(word).read_volatile() }
    }

    fn write(&mut self, word: usize, value: u32) {
        assert!(word < self.words(), "register word {} out of range", word);
        // SAFETY: bounds checked above; the mapping lives as long as self.
        unsafe { self.ptr.as_ptr().add(word).write_volatile(value) }
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/len are exactly what mmap handed back.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if rc != 0 {
            log::error!(
                "munmap of {:#x} failed: {}",
                self.base,
                std::io::Error::last_os_error()
            );
        } else {
            log::debug!("unmapped {:#x}", self.base);
        }
    }
}

/// Both windows the slave needs: the BSC controller and the GPIO block.
pub struct PeripheralMap {
    pub bsc: MappedRegion,
    pub gpio: MappedRegion,
}

impl PeripheralMap {
    pub fn open(path: impl AsRef<Path>, soc: SocModel) -> Result<Self> {
        let path = path.as_ref();
        let base = soc.peripheral_base();
        let bsc = MappedRegion::open(path, base + BSC_OFFSET, BSC_LEN)
            .context("unable to map BSC registers")?;
        let gpio = MappedRegion::open(path, base + GPIO_OFFSET, GPIO_LEN)
            .context("unable to map GPIO registers")?;
        log::info!("mapped {:?} peripherals at {:#x}", soc, base);
        Ok(Self { bsc, gpio })
    }
}
