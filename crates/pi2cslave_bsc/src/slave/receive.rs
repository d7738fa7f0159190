use pi2cslave_common::{CancelToken, Cancelled};

use super::BscSlave;
use crate::bank::RegisterBank;
use crate::regs::{BscReg, RawStatus};

impl<B: RegisterBank> BscSlave<B> {
    /// Copy whatever the master has written so far into `buf`, without
    /// waiting for more.
    ///
    /// Returns the number of bytes copied, anywhere from zero to
    /// `buf.len()`. An empty `buf` returns zero without touching the
    /// hardware. On cancellation the bytes already copied are abandoned.
    pub fn read_poll(
        &mut self,
        buf: &mut [u8],
        cancel: &CancelToken,
    ) -> Result<usize, Cancelled> {
        cancel.checkpoint()?;
        if buf.is_empty() {
            return Ok(0);
        }

        let mut read = 0;
        while read < buf.len() && !self.rx_empty() {
            cancel.checkpoint()?;
            if self.take_status(RawStatus::OE) {
                self.counts.overruns += 1;
                log::warn!("RX overrun, incoming byte dropped");
            }
            buf[read] = (self.bank.read(BscReg::Dr.word()) & 0xFF) as u8;
            read += 1;
        }

        if read > 0 {
            log::trace!("read {} bytes from RX FIFO", read);
        }
        Ok(read)
    }
}
