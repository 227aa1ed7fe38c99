//! Fixed-capacity bit queue
//!
//! Used for both directions of a channel. Bits are stored in arrival order;
//! nothing is allocated after construction.

use heapless::Deque;

/// Capacity of the channel FIFOs in bits
pub const FIFO_CAPACITY: usize = 64;

/// Circular queue of single bits
#[derive(Debug, Clone)]
pub struct BitFifo<const N: usize = FIFO_CAPACITY> {
    bits: Deque<bool, N>,
}

impl<const N: usize> Default for BitFifo<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BitFifo<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self { bits: Deque::new() }
    }

    /// Append a bit
    ///
    /// Returns the bit back if the queue is full; the queue is unchanged.
    pub fn push(&mut self, bit: bool) -> Result<(), bool> {
        self.bits.push_back(bit)
    }

    /// Remove the oldest bit
    pub fn pull(&mut self) -> Option<bool> {
        self.bits.pop_front()
    }

    /// Append 8 bits, most significant first, or nothing at all
    ///
    /// Returns the byte back if fewer than 8 slots are free.
    pub fn push_byte(&mut self, byte: u8) -> Result<(), u8> {
        if self.free() < 8 {
            return Err(byte);
        }
        for shift in (0..8).rev() {
            // Cannot fail: free space was checked above
            let _ = self.bits.push_back((byte >> shift) & 1 != 0);
        }
        Ok(())
    }

    /// Remove 8 bits as a byte, most significant first
    ///
    /// Returns `None` and leaves the queue unchanged if fewer than 8 bits
    /// are stored.
    pub fn pull_byte(&mut self) -> Option<u8> {
        if self.len() < 8 {
            return None;
        }
        let mut byte = 0u8;
        for _ in 0..8 {
            let bit = self.bits.pop_front()?;
            byte = (byte << 1) | u8::from(bit);
        }
        Some(byte)
    }

    /// Check if the queue holds no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Check if the queue cannot accept another bit
    pub fn is_full(&self) -> bool {
        self.bits.is_full()
    }

    /// Number of stored bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Number of bits that can still be pushed
    pub fn free(&self) -> usize {
        N - self.bits.len()
    }

    /// Total capacity in bits
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop all stored bits
    pub fn clear(&mut self) {
        self.bits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_fifo() {
        let mut fifo: BitFifo = BitFifo::new();
        assert!(fifo.is_empty());
        assert!(!fifo.is_full());
        assert_eq!(fifo.len(), 0);
        assert_eq!(fifo.capacity(), FIFO_CAPACITY);
        assert_eq!(fifo.pull(), None);
    }

    #[test]
    fn test_push_fails_when_full() {
        let mut fifo: BitFifo = BitFifo::new();
        for i in 0..FIFO_CAPACITY {
            assert!(fifo.push(i % 3 == 0).is_ok());
        }
        assert!(fifo.is_full());

        // 65th push is rejected and hands the bit back
        assert_eq!(fifo.push(true), Err(true));
        assert_eq!(fifo.len(), FIFO_CAPACITY);

        // Stored content unchanged
        for i in 0..FIFO_CAPACITY {
            assert_eq!(fifo.pull(), Some(i % 3 == 0));
        }
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_byte_msb_first() {
        let mut fifo: BitFifo = BitFifo::new();
        fifo.push_byte(0b1000_0010).unwrap();

        assert_eq!(fifo.pull(), Some(true));
        for _ in 0..5 {
            assert_eq!(fifo.pull(), Some(false));
        }
        assert_eq!(fifo.pull(), Some(true));
        assert_eq!(fifo.pull(), Some(false));
    }

    #[test]
    fn test_push_byte_is_all_or_nothing() {
        let mut fifo: BitFifo = BitFifo::new();
        for _ in 0..FIFO_CAPACITY - 7 {
            fifo.push(false).unwrap();
        }

        assert_eq!(fifo.push_byte(0xFF), Err(0xFF));
        assert_eq!(fifo.free(), 7);
    }

    #[test]
    fn test_pull_byte_needs_eight_bits() {
        let mut fifo: BitFifo = BitFifo::new();
        for _ in 0..7 {
            fifo.push(true).unwrap();
        }
        assert_eq!(fifo.pull_byte(), None);
        assert_eq!(fifo.len(), 7);

        fifo.push(false).unwrap();
        assert_eq!(fifo.pull_byte(), Some(0xFE));
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_wraps_around() {
        let mut fifo: BitFifo<4> = BitFifo::new();
        for round in 0..10 {
            fifo.push(round % 2 == 0).unwrap();
            fifo.push(true).unwrap();
            assert_eq!(fifo.pull(), Some(round % 2 == 0));
            assert_eq!(fifo.pull(), Some(true));
        }
        assert!(fifo.is_empty());
    }

    proptest! {
        #[test]
        fn prop_bits_come_back_in_order(bits in proptest::collection::vec(any::<bool>(), 0..=FIFO_CAPACITY)) {
            let mut fifo: BitFifo = BitFifo::new();
            for &bit in &bits {
                prop_assert!(fifo.push(bit).is_ok());
            }
            prop_assert_eq!(fifo.len(), bits.len());
            for &bit in &bits {
                prop_assert_eq!(fifo.pull(), Some(bit));
            }
            prop_assert_eq!(fifo.pull(), None);
        }
    }
}
