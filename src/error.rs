use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

macro_rules! corrupt_discovery_error {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::CorruptDiscovery(format!($fmt $(, $arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Decoding problems (a truncated instruction, an undefined opcode) are reported through
/// [`Error::OutOfBounds`] and [`Error::Malformed`]. The
/// [`crate::disassembler::DecompileWalker`] absorbs both of them as failed decode regions, so
/// they only surface when the lower level decoding functions are used directly.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::OutOfBounds`] - Attempted to read beyond the image boundaries
/// - [`Error::Malformed`] - Undefined opcode or unusable image layout
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::InvalidAddress`] - An address that does not map into the loaded image
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Error`] - Miscellaneous failures (e.g. memory mapping)
///
/// ## Analysis Errors
/// - [`Error::CorruptDiscovery`] - The discovery tables violate a structural invariant
///
/// # Examples
///
/// ```rust
/// use z80scope::{disassembler::DecompileWalker, Error};
///
/// match DecompileWalker::new(&[], 0x8000, 0x8000) {
///     Err(Error::Empty) => {}
///     _ => panic!("an empty image can not be walked"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An out of bound access was attempted while reading the image.
    ///
    /// This is the range signal raised by the [`crate::Parser`] when an instruction needs
    /// more bytes than the buffer holds.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The input could not be decoded.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// The address does not map into the loaded image.
    #[error("Address ${0:04X} is outside of the loaded image")]
    InvalidAddress(u16),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// The seen map or the label tables are inconsistent.
    ///
    /// This is never caused by the decoded bytes themselves. It indicates that the walker's
    /// own bookkeeping has been corrupted, and the listing can not be trusted.
    #[error("Corrupted discovery table - {0}")]
    CorruptDiscovery(String),
}
