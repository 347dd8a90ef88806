//! The instruction handler tree.
//!
//! Every handler recognises one opcode family and turns the bytes at the parser position into a
//! [`DecodedInstruction`], applying the instruction's effects on the [`DecodeContext`] once all
//! of its bytes have been read. A handler that runs out of bytes returns
//! [`crate::Error::OutOfBounds`] before touching the context.
//!
//! ```text
//! Initial ──┬── Primary(HL) ── Trivial / IndirectLoad / RelJump
//!           ├── Bits(HL)
//!           ├── Extended ───── Trivial
//!           └── Indexed(IX|IY) ──┬── Primary(IX|IY)
//!                                └── Bits(IX|IY)
//! ```
//!
//! # Example
//!
//! ```rust
//! use z80scope::disassembler::{decode_instruction, DecodeContext, WalkerOptions};
//! use z80scope::Parser;
//!
//! let code = [0xDD, 0x36, 0x02, 0x7F]; // LD (IX+$02), $7F
//! let mut parser = Parser::new(&code);
//! let mut context = DecodeContext::new(0x4000, code.len(), WalkerOptions::default());
//!
//! let instruction = decode_instruction(&mut parser, &mut context)?;
//! assert_eq!(instruction.to_string(), "LD (IX+$02), $7F");
//! assert_eq!(instruction.length, 4);
//! # Ok::<(), z80scope::Error>(())
//! ```

mod bits;
mod extended;
mod indexed;
mod indirect;
mod initial;
mod primary;
mod reljump;
mod trivial;

pub use bits::Bits;
pub use extended::Extended;
pub use indexed::Indexed;
pub use indirect::{Direction, IndirectLoad};
pub use initial::Initial;
pub use primary::Primary;
pub use reljump::RelJump;
pub use trivial::Trivial;

use crate::{
    disassembler::{
        context::DecodeContext,
        fields,
        instruction::{DecodedInstruction, Operand},
        registers::{IndexRegister, Register16, Register8},
    },
    file::parser::Parser,
    Result,
};

/// A decoding strategy for one opcode pattern or prefix family.
pub trait InstructionHandler {
    /// Decode the instruction at the parser position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the instruction is truncated, or
    /// [`crate::Error::Malformed`] for an undefined opcode.
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction>;
}

/// Decode a single instruction at the parser position.
///
/// The context is prepared for a step starting at the current parser position.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the instruction is truncated, or
/// [`crate::Error::Malformed`] for an undefined opcode.
pub fn decode_instruction(
    parser: &mut Parser<'_>,
    context: &mut DecodeContext,
) -> Result<DecodedInstruction> {
    context.begin(parser.pos());
    Initial.resolve(parser, context)
}

/// Read an unsigned byte operand.
pub(crate) fn read_u8(parser: &mut Parser<'_>) -> Result<u8> {
    parser.read_le::<u8>()
}

/// Read a displacement byte.
pub(crate) fn read_i8(parser: &mut Parser<'_>) -> Result<i8> {
    parser.read_le::<i8>()
}

/// Read a little-endian word, one byte at a time so a truncated word consumes the bytes that
/// exist.
pub(crate) fn read_u16(parser: &mut Parser<'_>) -> Result<u16> {
    let low = parser.read_le::<u8>()?;
    let high = parser.read_le::<u8>()?;
    Ok(u16::from_le_bytes([low, high]))
}

/// A register field with `H` and `L` replaced by the halves of the index register.
pub(crate) fn reg_indexed(code: u8, index: IndexRegister) -> Option<Register8> {
    match fields::reg(code)? {
        Register8::H => Some(index.high()),
        Register8::L => Some(index.low()),
        register => Some(register),
    }
}

/// Like [`reg_indexed`] for opcodes whose field can not select memory.
pub(crate) fn register(code: u8, index: IndexRegister) -> Result<Register8> {
    reg_indexed(code, index)
        .ok_or_else(|| malformed_error!("Register field {} selects a memory operand", code))
}

/// The `rp` table: `BC DE HL SP`.
pub(crate) fn rp(p: u8, index: IndexRegister) -> Register16 {
    match p & 0b11 {
        0 => Register16::BC,
        1 => Register16::DE,
        2 => index.pair(),
        _ => Register16::SP,
    }
}

/// The `rp2` table: `BC DE HL AF`.
pub(crate) fn rp2(p: u8, index: IndexRegister) -> Register16 {
    match p & 0b11 {
        0 => Register16::BC,
        1 => Register16::DE,
        2 => index.pair(),
        _ => Register16::AF,
    }
}

/// Read the memory operand of an `(HL)` form: `(HL)` itself, or `(IX+d)` with its
/// displacement byte.
pub(crate) fn memory_operand(parser: &mut Parser<'_>, index: IndexRegister) -> Result<(Operand, i8)> {
    if index.is_indexed() {
        let displacement = read_i8(parser)?;
        Ok((
            Operand::Indexed {
                register: index.pair(),
                displacement,
            },
            displacement,
        ))
    } else {
        Ok((Operand::Indirect(Register16::HL), 0))
    }
}

/// The accumulator operations of the `alu` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub(crate) fn from_code(code: u8) -> AluOp {
        match code & 0b111 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }

    pub(crate) fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Adc => "ADC",
            AluOp::Sub => "SUB",
            AluOp::Sbc => "SBC",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Or => "OR",
            AluOp::Cp => "CP",
        }
    }

    /// `ADD`, `ADC` and `SBC` name the accumulator explicitly.
    pub(crate) fn operands(self, operand: Operand) -> Vec<Operand> {
        match self {
            AluOp::Add | AluOp::Adc | AluOp::Sbc => {
                vec![Operand::Register(Register8::A), operand]
            }
            _ => vec![operand],
        }
    }

    /// The new accumulator value. `with_self` marks `A` as its own operand, which makes
    /// `SUB A` and `XOR A` known even when `A` is not.
    pub(crate) fn apply(self, a: Option<u8>, b: Option<u8>, with_self: bool) -> Option<u8> {
        if with_self {
            match self {
                AluOp::Sub | AluOp::Xor => return Some(0),
                AluOp::And | AluOp::Or | AluOp::Cp => return a,
                _ => {}
            }
        }

        match self {
            AluOp::Cp => a,
            AluOp::Adc | AluOp::Sbc => None,
            AluOp::Add => Some(a?.wrapping_add(b?)),
            AluOp::Sub => Some(a?.wrapping_sub(b?)),
            AluOp::And => Some(a? & b?),
            AluOp::Xor => Some(a? ^ b?),
            AluOp::Or => Some(a? | b?),
        }
    }
}

/// Apply an accumulator operation to the machine state.
pub(crate) fn apply_alu(context: &mut DecodeContext, op: AluOp, value: Option<u8>, with_self: bool) {
    let a = context.state().get_atomic(Register8::A);
    let result = op.apply(a, value, with_self);
    context.state_mut().store_atomic(Register8::A, result);
    context.clobber_flags();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disassembler::WalkerOptions, Error};

    fn decode(code: &[u8]) -> Result<DecodedInstruction> {
        let mut parser = Parser::new(code);
        let mut context = DecodeContext::new(0, code.len(), WalkerOptions::default());
        decode_instruction(&mut parser, &mut context)
    }

    #[test]
    fn words_are_read_bytewise() {
        let code = [0x34];
        let mut parser = Parser::new(&code);
        assert!(matches!(read_u16(&mut parser), Err(Error::OutOfBounds)));
        assert_eq!(parser.pos(), 1);

        let code = [0x34, 0x12];
        let mut parser = Parser::new(&code);
        assert_eq!(read_u16(&mut parser).unwrap(), 0x1234);
    }

    #[test]
    fn alu_folding() {
        assert_eq!(AluOp::Add.apply(Some(0xFF), Some(2), false), Some(1));
        assert_eq!(AluOp::Sub.apply(Some(0), Some(1), false), Some(0xFF));
        assert_eq!(AluOp::And.apply(Some(0xF0), Some(0x3C), false), Some(0x30));
        assert_eq!(AluOp::Cp.apply(Some(7), None, false), Some(7));
        assert_eq!(AluOp::Adc.apply(Some(1), Some(1), false), None);
        assert_eq!(AluOp::Or.apply(None, Some(1), false), None);
        assert_eq!(AluOp::Xor.apply(None, None, true), Some(0));
        assert_eq!(AluOp::Sub.apply(None, None, true), Some(0));
        assert_eq!(AluOp::And.apply(Some(9), Some(9), true), Some(9));
    }

    #[test]
    fn tables() {
        assert_eq!(rp(2, IndexRegister::IY), Register16::IY);
        assert_eq!(rp(3, IndexRegister::IX), Register16::SP);
        assert_eq!(rp2(3, IndexRegister::HL), Register16::AF);
        assert_eq!(reg_indexed(4, IndexRegister::IX), Some(Register8::IXH));
        assert_eq!(reg_indexed(5, IndexRegister::HL), Some(Register8::L));
        assert_eq!(reg_indexed(6, IndexRegister::IX), None);
    }

    #[test]
    fn decodes_each_family() {
        assert_eq!(decode(&[0x00]).unwrap().to_string(), "NOP");
        assert_eq!(decode(&[0xCB, 0x11]).unwrap().to_string(), "RL C");
        assert_eq!(decode(&[0xED, 0xB0]).unwrap().to_string(), "LDIR");
        assert_eq!(decode(&[0xFD, 0x21, 0x3A, 0x5C]).unwrap().to_string(), "LD IY, $5C3A");
        assert_eq!(
            decode(&[0xDD, 0xCB, 0xFE, 0x46]).unwrap().to_string(),
            "BIT 0, (IX-$02)"
        );
    }

    #[test]
    fn truncation_is_out_of_bounds() {
        assert!(matches!(decode(&[0xC3, 0x00]), Err(Error::OutOfBounds)));
        assert!(matches!(decode(&[0xDD]), Err(Error::OutOfBounds)));
        assert!(matches!(decode(&[0xED, 0x43, 0x00]), Err(Error::OutOfBounds)));
    }
}
