use crate::Addr;

/// Source of outgoing bytes for the slave-to-master direction.
///
/// `produce` is called with a rolling address that only advances after a
/// byte was supplied. Returning `None` means "nothing more right now"; the
/// caller may ask again later with the same address.
///
/// Having a byte pulled does not mean the master received it, only that it
/// was queued for transmission.
pub trait ByteProducer {
    fn produce(&mut self, addr: Addr) -> Option<u8>;
}

impl<F> ByteProducer for F
where
    F: FnMut(Addr) -> Option<u8>,
{
    #[inline]
    fn produce(&mut self, addr: Addr) -> Option<u8> {
        self(addr)
    }
}

/// Serves bytes from a slice, keyed by address relative to `base`.
#[derive(Copy, Clone, Debug)]
pub struct SliceProducer<'a> {
    data: &'a [u8],
    base: Addr,
}

impl<'a> SliceProducer<'a> {
    pub fn new(data: &'a [u8], base: Addr) -> Self {
        Self { data, base }
    }
}

impl ByteProducer for SliceProducer<'_> {
    fn produce(&mut self, addr: Addr) -> Option<u8> {
        let index = addr.wrapping_sub(self.base) as usize;
        self.data.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_a_producer() {
        let mut calls = Vec::new();
        let mut producer = |addr: Addr| {
            calls.push(addr);
            (addr < 2).then_some(addr as u8 * 10)
        };
        assert_eq!(producer.produce(0), Some(0));
        assert_eq!(producer.produce(1), Some(10));
        assert_eq!(producer.produce(2), None);
        assert_eq!(calls, vec![0, 1, 2]);
    }

    #[test]
    fn slice_producer_is_relative_to_base() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut producer = SliceProducer::new(&data, 0x100);
        assert_eq!(producer.produce(0x100), Some(0xAA));
        assert_eq!(producer.produce(0x102), Some(0xCC));
        assert_eq!(producer.produce(0x103), None);
        assert_eq!(producer.produce(0x0FF), None);
    }
}
