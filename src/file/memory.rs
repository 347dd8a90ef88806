//! In-memory image backend.

use super::Backend;
use crate::{Error::OutOfBounds, Result};

/// An image held in an owned buffer.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Wrap an owned buffer.
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory() {
        let mut data = vec![0x00_u8; 1024];
        data[0x10] = 0xC3;
        data[0x11] = 0x00;
        data[0x12] = 0x80;

        let memory = Memory::new(data);

        assert_eq!(memory.len(), 1024);
        assert_eq!(memory.data()[0], 0x00);
        assert_eq!(memory.data_slice(0x10, 3).unwrap(), &[0xC3, 0x00, 0x80]);

        assert!(memory.data_slice(usize::MAX, 2).is_err());
        assert!(memory.data_slice(0, 1025).is_err());
    }
}
