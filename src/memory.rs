use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Word-granular data memory. Callers guarantee `addr % 4 == 0`.
pub trait Bus {
    fn read_u32(&self, addr: u32) -> u32;
    fn write_u32(&mut self, addr: u32, val: u32);
}

/// Sparse memory: only written words are stored, everything else reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMemory {
    words: BTreeMap<u32, u32>,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Bus for SparseMemory {
    fn read_u32(&self, addr: u32) -> u32 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    fn write_u32(&mut self, addr: u32, val: u32) {
        self.words.insert(addr, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_words_read_zero() {
        let mut m = SparseMemory::new();
        assert_eq!(m.read_u32(0x1000), 0);
        m.write_u32(0x1000, 7);
        m.write_u32(0x1000, 8);
        assert_eq!((m.read_u32(0x1000), m.len()), (8, 1));
    }
}
