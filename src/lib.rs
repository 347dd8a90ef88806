// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
// - 'file/physical.rs' opts back in to map a file into memory

//! # z80scope
//!
//! A static disassembler for Z80 machine code. `z80scope` decodes a raw program image from
//! an entry point, follows jumps and calls to discover the reachable code, propagates
//! constant register values to resolve indirect jumps and data addresses, and renders the
//! result as a labelled assembler listing.
//!
//! ## Features
//!
//! - **Complete instruction set** - Unprefixed, `CB`, `ED`, `DD`/`FD` and `DD CB`/`FD CB`
//!   tables, including the undocumented index register halves and `SLL`
//! - **Control flow discovery** - Linear decoding with automatic resume at unexplored
//!   jump and call targets
//! - **Constant propagation** - Known register and memory values flow through loads,
//!   arithmetic, the stack and bit operations
//! - **Labelled listings** - Functions, jumps and data locations get labels, undecoded
//!   bytes become `DS` reservations
//!
//! ## Quick Start
//!
//! ```rust
//! use z80scope::prelude::*;
//!
//! // LD HL, $8010 ; CALL $8008 ; JR $8006 (itself) ; RET
//! let code = [0x21, 0x10, 0x80, 0xCD, 0x08, 0x80, 0x18, 0xFE, 0xC9];
//! let image = Image::from_mem(code.to_vec())?;
//!
//! let mut walker = DecompileWalker::new(image.data(), 0x8000, 0x8000)?;
//! walker.run()?;
//!
//! let listing = walker.dump()?;
//! assert!(listing.lines[2].contains("CALL fn0"));
//! assert!(listing.lines[4].starts_with("fn0     RET"));
//! # Ok::<(), z80scope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - Image loading and the byte cursor ([`Parser`])
//! - [`disassembler`] - Instruction decoding, machine state, control flow and listings
//! - [`utils`] - Hex formatting and the visited-byte bitmap
//! - [`prelude`] - Re-exports of the commonly used types
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Decoding problems inside the image (truncated or undefined instructions) do not abort a
//! walk; they are recorded and the walk continues elsewhere. Errors are returned for invalid
//! input and for inconsistent discovery tables:
//!
//! ```rust
//! use z80scope::{disassembler::DecompileWalker, Error};
//!
//! match DecompileWalker::new(&[0xC9], 0x8000, 0x9000) {
//!     Err(Error::InvalidAddress(address)) => assert_eq!(address, 0x9000),
//!     _ => unreachable!(),
//! }
//! ```

#[macro_use]
pub(crate) mod error;

/// Image loading and byte-level parsing.
pub mod file;

/// Convenient re-exports of the most commonly used types.
///
/// ```rust
/// use z80scope::prelude::*;
///
/// let mut walker = DecompileWalker::new(&[0x00, 0xC9], 0, 0)?;
/// assert_eq!(walker.run()?, 2);
/// # Ok::<(), Error>(())
/// ```
pub mod prelude;

/// Z80 decoding, constant propagation and control flow discovery.
pub mod disassembler;

/// Formatting helpers and shared data structures.
pub mod utils;

/// `z80scope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `z80scope` Error type
///
/// Returned by every fallible operation of the crate.
pub use error::Error;

/// A loaded program image.
pub use file::Image;

/// Byte cursor used by all instruction handlers.
pub use file::parser::Parser;
