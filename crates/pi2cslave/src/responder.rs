use std::time::Duration;

use pi2cslave_bsc::{BscSlave, RegisterBank};
use pi2cslave_common::{Addr, ByteProducer, CancelToken, Cancelled};

pub const MEMORY_SIZE: usize = 256;

/// 256 bytes of device memory behind an auto-incrementing pointer, the
/// way most small I2C peripherals (EEPROMs, sensors) present themselves.
///
/// The first byte of every master write selects the pointer; any further
/// bytes are stored starting there. Master reads stream from the pointer.
pub struct RegisterFile {
    memory: [u8; MEMORY_SIZE],
    pointer: u8,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            memory: [0; MEMORY_SIZE],
            pointer: 0,
        }
    }
}

impl RegisterFile {
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    /// Preload `data` at `offset`, wrapping at the end of memory.
    pub fn load(&mut self, offset: u8, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.memory[offset.wrapping_add(i as u8) as usize] = byte;
        }
    }

    fn store(&mut self, byte: u8) {
        self.memory[self.pointer as usize] = byte;
        self.pointer = self.pointer.wrapping_add(1);
    }

    /// Move the pointer past `count` bytes the master has read.
    fn advance(&mut self, count: usize) {
        self.pointer = self.pointer.wrapping_add((count % MEMORY_SIZE) as u8);
    }
}

impl ByteProducer for RegisterFile {
    fn produce(&mut self, addr: Addr) -> Option<u8> {
        Some(self.memory[addr as usize % MEMORY_SIZE])
    }
}

/// What a single [`Responder::poll`] did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Activity {
    /// The master is mid-write and nothing new had arrived yet.
    Idle,
    /// Bytes taken from a master write.
    Received(usize),
    /// Bytes the master read before writing again.
    Sent(usize),
}

/// Serves a [`RegisterFile`] over a BSC slave.
pub struct Responder<B: RegisterBank> {
    slave: BscSlave<B>,
    file: RegisterFile,
    buf: [u8; 16],
    /// Next received byte starts a new transaction.
    expect_pointer: bool,
}

impl<B: RegisterBank> Responder<B> {
    pub fn new(slave: BscSlave<B>, file: RegisterFile) -> Self {
        Self {
            slave,
            file,
            buf: [0; 16],
            expect_pointer: true,
        }
    }

    pub fn file(&self) -> &RegisterFile {
        &self.file
    }

    pub fn slave(&self) -> &BscSlave<B> {
        &self.slave
    }

    pub fn slave_mut(&mut self) -> &mut BscSlave<B> {
        &mut self.slave
    }

    /// One round of the receive/transmit alternation.
    ///
    /// Drains anything the master wrote. Once the bus has gone quiet the
    /// TX FIFO is kept primed from the pointer until the master writes
    /// again, so this can spend a long time inside the transmit loop.
    pub fn poll(&mut self, cancel: &CancelToken) -> Result<Activity, Cancelled> {
        let n = self.slave.read_poll(&mut self.buf, cancel)?;
        if n > 0 {
            for &byte in &self.buf[..n] {
                if self.expect_pointer {
                    self.file.pointer = byte;
                    self.expect_pointer = false;
                } else {
                    self.file.store(byte);
                }
            }
            log::debug!("received {} bytes, pointer now {:#04x}", n, self.file.pointer);
            return Ok(Activity::Received(n));
        }

        if self.slave.receiving() {
            return Ok(Activity::Idle);
        }

        let start = self.file.pointer as Addr;
        let sent = self.slave.write(&mut self.file, start, cancel)?;
        self.file.advance(sent);
        self.expect_pointer = true;
        if sent > 0 {
            log::debug!("sent {} bytes from {:#04x}", sent, start);
        }
        Ok(Activity::Sent(sent))
    }

    /// Keep polling until `cancel` fires, sleeping `idle` whenever the
    /// master is mid-write with nothing new to drain.
    pub fn serve(&mut self, cancel: &CancelToken, idle: Duration) {
        loop {
            match self.poll(cancel) {
                Ok(Activity::Idle) => {
                    if !idle.is_zero() {
                        std::thread::sleep(idle);
                    }
                }
                Ok(_) => {}
                Err(Cancelled) => break,
            }
        }
        let counts = self.slave.error_counts();
        log::info!(
            "responder stopped: {} overruns, {} underruns",
            counts.overruns,
            counts.underruns
        );
    }
}
