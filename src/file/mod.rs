//! Memory image loading and byte-level access.
//!
//! A Z80 program image is a flat run of bytes that gets mapped at a load address. This module
//! wraps the two ways of getting such a run into the process: memory-mapping a file from disk
//! ([`physical::Physical`]) or taking ownership of an in-memory buffer ([`memory::Memory`]).
//! Both sit behind the [`Backend`] trait so the rest of the crate only ever sees a `&[u8]`.
//!
//! # Example
//!
//! ```rust
//! use z80scope::Image;
//!
//! let image = Image::from_mem(vec![0x00, 0xC9])?;
//! assert_eq!(image.len(), 2);
//! assert_eq!(image.data_slice(1, 1)?, &[0xC9]);
//! # Ok::<(), z80scope::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use memory::Memory;
use physical::Physical;

/// Storage abstraction for a loaded image.
pub trait Backend {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the full data buffer.
    fn data(&self) -> &[u8];

    /// Returns the length of the data buffer.
    fn len(&self) -> usize;
}

/// A raw program image, either memory-mapped from disk or owned in memory.
pub struct Image {
    data: Box<dyn Backend>,
}

impl Image {
    /// Memory-map an image from disk.
    ///
    /// # Arguments
    /// * `file` - Path to the raw binary
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file can not be opened,
    /// [`crate::Error::Empty`] if it has no content.
    pub fn from_file(file: &Path) -> Result<Image> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Take ownership of an in-memory image.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<Image> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<Image> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(Image {
            data: Box::new(data),
        })
    }

    /// Returns the size of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked slice of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }
}
