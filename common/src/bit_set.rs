//! Fixed-length bitset packed into `u64` words.
//!
//! Sized once and cleared in place, so a worker can reuse one instance for
//! every row it scans.

/// Number of bits per storage word.
const BITS_PER_WORD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    /// Packed bit storage, LSB first.
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    /// Create a bitset of `len` bits, all cleared.
    #[inline]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0u64; len.div_ceil(BITS_PER_WORD)],
            len,
        }
    }

    /// Set bit `idx` and report whether it was previously clear.
    #[inline]
    pub fn insert_new(&mut self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        let word = &mut self.words[idx / BITS_PER_WORD];
        let mask = 1u64 << (idx % BITS_PER_WORD);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    /// Clear every bit without releasing storage.
    #[inline]
    pub fn clear(&mut self) {
        self.words.fill(0);
    }
}
