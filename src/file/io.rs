//! Bounds-checked primitive reads.
//!
//! This module provides the reads that back the [`crate::file::parser::Parser`]. Z80 code is
//! consumed one byte at a time, because a truncated operand must still report how many bytes
//! it took, so only the single-byte primitives are readable.
//!
//! # Key Components
//!
//! - [`crate::file::io::BinIO`] - Trait describing how a primitive is built from its bytes
//! - [`crate::file::io::read_le_at`] - Read a value at an offset
//!
//! All reads are bounds-checked and leave the offset untouched on failure.

use crate::{Error::OutOfBounds, Result};

/// Trait for primitives that can be read from a byte buffer.
pub trait BinIO: Sized {
    /// The fixed-size byte array representation of the type
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Build the value from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_bin_io {
    ($($ty:ty => $len:expr),* $(,)?) => {
        $(
            impl BinIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_bin_io! {
    u8 => 1,
    i8 => 1,
}

/// Reads a value of type `T` from `data` at `offset` and advances `offset` by the size of `T`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would exceed the buffer; `offset` is left
/// unchanged in that case.
pub fn read_le_at<T: BinIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 4] = [0x01, 0x02, 0xFE, 0x04];

    #[test]
    fn read_le_u8() {
        let mut offset = 0;
        let result = read_le_at::<u8>(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(result, 0x01);
        assert_eq!(offset, 1);
    }

    #[test]
    fn read_le_i8() {
        let mut offset = 2;
        let result = read_le_at::<i8>(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(result, -2);
        assert_eq!(offset, 3);
    }

    #[test]
    fn errors() {
        let buffer = [0xFF, 0xFF, 0xFF];

        let mut offset = 3;
        let result = read_le_at::<u8>(&buffer, &mut offset);
        assert!(matches!(result, Err(OutOfBounds)));
        assert_eq!(offset, 3);

        let mut offset = usize::MAX;
        let result = read_le_at::<i8>(&buffer, &mut offset);
        assert!(matches!(result, Err(OutOfBounds)));
        assert_eq!(offset, usize::MAX);
    }
}
