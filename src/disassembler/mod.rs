//! Z80 instruction decoding, constant propagation and control flow discovery.
//!
//! This module turns a raw program image into a listing. Decoding is driven by a small tree
//! of [`InstructionHandler`]s that mirrors the opcode tables of the CPU. While decoding, the
//! handlers track which register and memory values are known at compile time
//! ([`MachineState`]), which addresses are branched or called to ([`TargetTable`]) and which
//! addresses are accessed as data ([`MemoryLocations`]). The [`DecompileWalker`] uses this
//! to discover code reachable from an entry point and renders it with [`DecompileWalker::dump`].
//!
//! # Key Types
//! - [`DecompileWalker`] - Walks the image and renders the listing
//! - [`DecodedInstruction`] - A decoded instruction with its operands and identity tag
//! - [`DecodeContext`] - The state handlers read from and report into
//! - [`MachineState`] - Known register and memory values
//!
//! # Example
//! ```rust
//! use z80scope::disassembler::{decode_instruction, DecodeContext, Register8, WalkerOptions};
//! use z80scope::Parser;
//!
//! let code = [0x3E, 0x2A, 0xC9]; // LD A, $2A ; RET
//! let mut parser = Parser::new(&code);
//! let mut context = DecodeContext::new(0x4000, code.len(), WalkerOptions::default());
//!
//! let instruction = decode_instruction(&mut parser, &mut context)?;
//! assert_eq!(instruction.to_string(), "LD A, $2A");
//! assert_eq!(context.state().get_atomic(Register8::A), Some(0x2A));
//! # Ok::<(), z80scope::Error>(())
//! ```

mod bitview;
mod context;
mod fields;
mod handlers;
mod instruction;
mod listing;
mod options;
mod registers;
mod state;
mod targets;
mod walker;

pub use bitview::BitView;
pub use context::DecodeContext;
pub use fields::{
    classify, copy_registers, is_from_memory, is_to_memory, reg, reg_or_indirect,
    source_register, target_register, RegisterCopy, RegisterOrIndirect, HL_INDIRECT,
};
pub use handlers::{
    decode_instruction, Bits, Direction, Extended, Indexed, IndirectLoad, Initial,
    InstructionHandler, Primary, RelJump, Trivial,
};
pub use instruction::{DecodedInstruction, LabelMap, Operand};
pub use listing::{Frequency, Listing, MemoryRegion};
pub use options::{DebugOptions, WalkerOptions};
pub use registers::{Condition, IndexRegister, Register16, Register8, RegisterRef};
pub use state::{ListenerId, MachineState, RegisterStored};
pub use targets::{JumpTarget, MemoryLocations, TargetKind, TargetTable};
pub use walker::{DecompileWalker, OutOfRange, SeenEntry};
