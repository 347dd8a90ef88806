//! Byte stream cursor used by the instruction decoders.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor over a loaded memory
//! image. The decoders pull opcode and operand bytes through it, while the listing code uses
//! [`crate::file::parser::Parser::inspect_at`] to preview raw bytes without disturbing the
//! decode position.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to specific position
//! - [`crate::file::parser::Parser::advance`] - Move forward by one byte
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by specified bytes
//! - [`crate::file::parser::Parser::pos`] - Get current position
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read a byte as `u8` or `i8`
//! - [`crate::file::parser::Parser::peek_byte`] - Peek at current byte without advancing
//! - [`crate::file::parser::Parser::inspect_at`] - Copy bytes at any offset without advancing
//!
//! # Usage Examples
//!
//! ```rust
//! use z80scope::Parser;
//!
//! let data = [0x3E, 0x42, 0xC9]; // LD A, $42 / RET
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u8>()?, 0x3E);
//! assert_eq!(parser.read_le::<u8>()?, 0x42);
//! assert_eq!(parser.inspect_at(0, 2), vec![0x3E, 0x42]);
//! assert_eq!(parser.pos(), 2);
//! # Ok::<(), z80scope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, BinIO},
    Result,
};

/// A cursor over a byte buffer.
///
/// `Parser` tracks the current offset, provides bounds-checked reads and raises
/// [`crate::Error::OutOfBounds`] when a read would run past the end of the buffer. Failed
/// reads never move the cursor.
///
/// # Examples
///
/// ```rust
/// use z80scope::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut parser = Parser::new(&data);
///
/// let first = parser.read_le::<u8>()?;
/// assert_eq!(first, 0x01);
/// assert_eq!(parser.read_le::<i8>()?, 0x02);
///
/// parser.seek(3)?;
/// assert_eq!(parser.read_le::<u8>()?, 0x04);
/// assert!(parser.read_le::<u8>().is_err());
/// # Ok::<(), z80scope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by one byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if self.position + step > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        Ok(self.data[self.position])
    }

    /// Copy up to `len` bytes starting at `offset`, without touching the position.
    ///
    /// The result is truncated at the end of the buffer, and empty if `offset` lies beyond it.
    ///
    /// # Arguments
    /// * `offset` - The absolute buffer offset to start at
    /// * `len` - The maximum number of bytes to copy
    #[must_use]
    pub fn inspect_at(&self, offset: usize, len: usize) -> Vec<u8> {
        if offset >= self.data.len() {
            return Vec::new();
        }

        let end = offset.saturating_add(len).min(self.data.len());
        self.data[offset..end].to_vec()
    }

    /// Read a type `T` from the current position and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: BinIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn sequential_reads() {
        let data = [0x21, 0x34, 0x12, 0xFE];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u8>().unwrap(), 0x21);
        assert_eq!(parser.read_le::<u8>().unwrap(), 0x34);
        assert_eq!(parser.read_le::<u8>().unwrap(), 0x12);
        assert_eq!(parser.read_le::<i8>().unwrap(), -2);
        assert!(!parser.has_more_data());
    }

    #[test]
    fn failed_read_keeps_position() {
        let data = [0xC3, 0x00];
        let mut parser = Parser::new(&data);

        parser.advance_by(2).unwrap();
        assert!(matches!(parser.read_le::<u8>(), Err(Error::OutOfBounds)));
        assert_eq!(parser.pos(), 2);
        assert!(matches!(parser.read_le::<i8>(), Err(Error::OutOfBounds)));
        assert_eq!(parser.pos(), 2);
    }

    #[test]
    fn seek_bounds() {
        let data = [0x00, 0x00, 0x00];
        let mut parser = Parser::new(&data);

        assert!(parser.seek(2).is_ok());
        assert_eq!(parser.pos(), 2);
        assert!(parser.seek(3).is_err());
        assert_eq!(parser.pos(), 2);
    }

    #[test]
    fn advance_bounds() {
        let data = [0x00, 0x00];
        let mut parser = Parser::new(&data);

        assert!(parser.advance_by(2).is_ok());
        assert!(parser.advance().is_err());
    }

    #[test]
    fn peek() {
        let data = [0xCB, 0x11];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.peek_byte().unwrap(), 0xCB);
        assert_eq!(parser.pos(), 0);
        parser.advance_by(2).unwrap();
        assert!(parser.peek_byte().is_err());
    }

    #[test]
    fn inspect() {
        let data = [0x01, 0x02, 0x03];
        let parser = Parser::new(&data);

        assert_eq!(parser.inspect_at(1, 4), vec![0x02, 0x03]);
        assert_eq!(parser.inspect_at(0, 0), Vec::<u8>::new());
        assert!(parser.inspect_at(3, 1).is_empty());
        assert_eq!(parser.pos(), 0);
    }
}
