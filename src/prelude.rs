//! # z80scope Prelude
//!
//! The most commonly used types of the crate, for glob imports.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all z80scope operations
pub use crate::Error;

/// The result type used throughout z80scope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Image loading and the byte cursor
pub use crate::{Image, Parser};

/// The control flow engine and its configuration
pub use crate::disassembler::{DebugOptions, DecompileWalker, WalkerOptions};

/// Listing output
pub use crate::disassembler::{Frequency, Listing, MemoryRegion, OutOfRange, SeenEntry};

// ================================================================================================
// Decoding
// ================================================================================================

/// Single instruction decoding
pub use crate::disassembler::{decode_instruction, DecodeContext, DecodedInstruction, Operand};

/// Registers and conditions
pub use crate::disassembler::{Condition, IndexRegister, Register16, Register8, RegisterRef};

/// Symbolic machine state
pub use crate::disassembler::{MachineState, RegisterStored};

/// Discovery tables
pub use crate::disassembler::{JumpTarget, MemoryLocations, TargetKind, TargetTable};
