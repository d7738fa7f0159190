use pi2cslave_common::{Addr, ByteProducer, CancelToken, Cancelled};

use super::BscSlave;
use crate::bank::RegisterBank;
use crate::regs::{BscReg, Control, Flags, RawStatus};

impl<B: RegisterBank> BscSlave<B> {
    /// Answer master reads with bytes pulled from `producer`, starting at
    /// `addr`, until the master starts writing to us again.
    ///
    /// A `None` from the producer stops the current refill pass only; the
    /// producer is asked again on the next pass with the same address.
    /// Returns how many bytes the master actually clocked out, which is
    /// usually fewer than were pulled. Unsent bytes are purged from the
    /// TX FIFO before returning.
    pub fn write<P>(
        &mut self,
        producer: &mut P,
        addr: Addr,
        cancel: &CancelToken,
    ) -> Result<usize, Cancelled>
    where
        P: ByteProducer + ?Sized,
    {
        cancel.checkpoint()?;
        let mut addr = addr;
        let mut offered: usize = 0;

        // An empty RX FIFO stands in for "master is not writing". It only
        // flips once the first written byte lands, which is good enough
        // since a write always delivers a byte before anything else.
        while self.rx_empty() {
            cancel.checkpoint()?;

            while !self.flags().contains(Flags::TXFF) {
                cancel.checkpoint()?;
                if self.take_status(RawStatus::UE) {
                    self.counts.underruns += 1;
                    log::warn!("TX underrun, master read an empty FIFO");
                }
                let Some(byte) = producer.produce(addr) else {
                    break;
                };
                self.bank.write(BscReg::Dr.word(), byte as u32);
                addr = addr.wrapping_add(1);
                offered += 1;
            }

            if !self.write_interval.is_zero() {
                std::thread::sleep(self.write_interval);
            }
        }

        // TXFLEVEL does not count the byte already sitting in the send
        // latch, and that byte never made it out either.
        let resident = self.flags().tx_level() as i64;
        let sent = offered as i64 - resident - 1;

        self.flush_tx_fifo();

        log::debug!(
            "write done: offered {}, resident {}, sent {}",
            offered,
            resident,
            sent.max(0)
        );
        // Early bring-up has shown register readings that drive this
        // negative.
        Ok(sent.max(0) as usize)
    }

    /// Throw away everything still queued for transmission.
    ///
    /// CR.BRK is supposed to do this and does not. What does work is
    /// toggling TXE: each off/on cycle drops the latched byte and loads the
    /// next one from the FIFO. TXFE already reads set while the last byte
    /// is still latched, hence one more cycle after the loop. Not
    /// cancellable: stopping halfway leaves stale bytes for the next read.
    pub(crate) fn flush_tx_fifo(&mut self) {
        let cr = BscReg::Cr.word();
        let mut cycles = 0u32;
        while !self.flags().contains(Flags::TXFE) {
            self.bank.clear_bits(cr, Control::TXE.bits());
            self.bank.set_bits(cr, Control::TXE.bits());
            cycles += 1;
        }
        self.bank.clear_bits(cr, Control::TXE.bits());
        self.bank.set_bits(cr, Control::TXE.bits());

        if cycles > 0 {
            log::trace!("flushed {} stale bytes from TX FIFO", cycles);
        }
    }
}
