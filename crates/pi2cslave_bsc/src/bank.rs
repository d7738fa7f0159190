/// Abstraction over a window of 32-bit hardware registers.
///
/// The engine never touches memory directly; every access goes through
/// this trait so that the `/dev/mem` mapping can be swapped for a
/// simulated bank in tests. Reads take `&mut self` because reading some
/// registers (the data register in particular) has side effects.
pub trait RegisterBank {
    fn read(&mut self, word: usize) -> u32;
    fn write(&mut self, word: usize, value: u32);

    /// Read-modify-write that sets `mask`.
    fn set_bits(&mut self, word: usize, mask: u32) {
        let value = self.read(word);
        self.write(word, value | mask);
    }

    /// Read-modify-write that clears `mask`.
    fn clear_bits(&mut self, word: usize, mask: u32) {
        let value = self.read(word);
        self.write(word, value & !mask);
    }
}

impl<B: RegisterBank + ?Sized> RegisterBank for &mut B {
    fn read(&mut self, word: usize) -> u32 {
        (**self).read(word)
    }

    fn write(&mut self, word: usize, value: u32) {
        (**self).write(word, value)
    }
}

/// Plain memory-backed bank with no side effects. Useful for GPIO tests
/// and as scratch space.
#[derive(Clone, Debug, Default)]
pub struct MemoryBank {
    pub words: Vec<u32>,
}

impl MemoryBank {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len],
        }
    }
}

impl RegisterBank for MemoryBank {
    fn read(&mut self, word: usize) -> u32 {
        self.words[word]
    }

    fn write(&mut self, word: usize, value: u32) {
        self.words[word] = value;
    }
}
