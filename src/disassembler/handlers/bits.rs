//! The `CB` bit-operation table.
//!
//! Covers the rotates and shifts, `BIT`, `RES` and `SET`. Under an index prefix the
//! displacement comes before the final opcode byte (`DD CB d op`), and forms with a register
//! field other than `(HL)` also copy the result into that register.

use crate::{
    disassembler::{
        bitview::BitView,
        context::DecodeContext,
        fields::{self, RegisterOrIndirect},
        handlers::{read_i8, read_u8, InstructionHandler},
        instruction::{DecodedInstruction, Operand},
        registers::{IndexRegister, Register16, Register8},
    },
    file::parser::Parser,
    Result,
};

/// The rotate and shift operations of the `rot` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
}

impl Shift {
    fn from_code(code: u8) -> Shift {
        match code & 0b111 {
            0 => Shift::Rlc,
            1 => Shift::Rrc,
            2 => Shift::Rl,
            3 => Shift::Rr,
            4 => Shift::Sla,
            5 => Shift::Sra,
            6 => Shift::Sll,
            _ => Shift::Srl,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Shift::Rlc => "RLC",
            Shift::Rrc => "RRC",
            Shift::Rl => "RL",
            Shift::Rr => "RR",
            Shift::Sla => "SLA",
            Shift::Sra => "SRA",
            Shift::Sll => "SLL",
            Shift::Srl => "SRL",
        }
    }

    /// The shifted value. `RL` and `RR` shift the carry in, which is never known.
    fn apply(self, value: u8) -> Option<u8> {
        match self {
            Shift::Rlc => Some(value.rotate_left(1)),
            Shift::Rrc => Some(value.rotate_right(1)),
            Shift::Rl | Shift::Rr => None,
            Shift::Sla => Some(value << 1),
            Shift::Sra => Some((value >> 1) | (value & 0x80)),
            Shift::Sll => Some((value << 1) | 1),
            Shift::Srl => Some(value >> 1),
        }
    }
}

/// The `CB` table of rotates, shifts and bit operations.
///
/// With `IX` or `IY` this is the `DD CB d op` form, where the displacement comes before the
/// opcode and every operation works on `(IX+d)`. When such an opcode names a register other
/// than `(HL)`, the result is also copied into that register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bits {
    index: IndexRegister,
}

impl Bits {
    /// Create the table for the given index register.
    #[must_use]
    pub fn new(index: IndexRegister) -> Self {
        Bits { index }
    }
}

enum Location {
    Register(Register8),
    Memory(Option<u16>),
}

impl InstructionHandler for Bits {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let (displacement, view) = if self.index.is_indexed() {
            let displacement = read_i8(parser)?;
            (displacement, BitView::new(read_u8(parser)?))
        } else {
            (0, BitView::new(read_u8(parser)?))
        };

        let (location, operand, copy) = if self.index.is_indexed() {
            let address = context.touch_memory(self.index.pair(), displacement);
            let operand = Operand::Indexed {
                register: self.index.pair(),
                displacement,
            };
            // BIT only tests, every other operation also writes the named register
            let copy = if view.x() == 1 {
                None
            } else {
                fields::reg(view.z())
            };
            (Location::Memory(address), operand, copy)
        } else {
            match fields::reg_or_indirect(view.z()) {
                RegisterOrIndirect::Register(register) => (
                    Location::Register(register),
                    Operand::Register(register),
                    None,
                ),
                RegisterOrIndirect::IndirectHL => (
                    Location::Memory(context.touch_memory(Register16::HL, 0)),
                    Operand::Indirect(Register16::HL),
                    None,
                ),
            }
        };

        let bit = view.y();
        let current = read(context, &location);
        let (mnemonic, mut operands, result) = match view.x() {
            0 => {
                let shift = Shift::from_code(bit);
                context.clobber_flags();
                (
                    shift.mnemonic(),
                    vec![operand],
                    Some(current.and_then(|value| shift.apply(value))),
                )
            }
            1 => {
                context.clobber_flags();
                ("BIT", vec![Operand::Bit(bit), operand], None)
            }
            2 => (
                "RES",
                vec![Operand::Bit(bit), operand],
                Some(current.map(|value| value & !(1 << bit))),
            ),
            _ => (
                "SET",
                vec![Operand::Bit(bit), operand],
                Some(current.map(|value| value | (1 << bit))),
            ),
        };

        if let Some(value) = result {
            write(context, &location, copy, value);
        }
        if let Some(copy) = copy {
            operands.push(Operand::Register(copy));
        }

        Ok(context.finish(parser, mnemonic, operands))
    }
}

fn read(context: &DecodeContext, location: &Location) -> Option<u8> {
    match location {
        Location::Register(register) => context.state().get_atomic(*register),
        Location::Memory(address) => context.memory_byte(*address),
    }
}

fn write(context: &mut DecodeContext, location: &Location, copy: Option<Register8>, value: Option<u8>) {
    match location {
        Location::Register(register) => context.state_mut().store_atomic(*register, value),
        Location::Memory(address) => context.store_memory_byte(*address, value),
    }

    if let Some(copy) = copy {
        context.state_mut().store_atomic(copy, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disassembler::WalkerOptions, Error};

    fn run(index: IndexRegister, code: &[u8], context: &mut DecodeContext) -> Result<DecodedInstruction> {
        let mut parser = Parser::new(code);
        context.begin(0);
        parser.advance_by(if index.is_indexed() { 2 } else { 1 })?;
        Bits::new(index).resolve(&mut parser, context)
    }

    fn fresh() -> DecodeContext {
        DecodeContext::new(0, 0x100, WalkerOptions::default())
    }

    #[test]
    fn mnemonics() {
        let cases: &[(IndexRegister, &[u8], &str)] = &[
            (IndexRegister::HL, &[0xCB, 0x00], "RLC B"),
            (IndexRegister::HL, &[0xCB, 0x1E], "RR (HL)"),
            (IndexRegister::HL, &[0xCB, 0x37], "SLL A"),
            (IndexRegister::HL, &[0xCB, 0x3F], "SRL A"),
            (IndexRegister::HL, &[0xCB, 0x7E], "BIT 7, (HL)"),
            (IndexRegister::HL, &[0xCB, 0x87], "RES 0, A"),
            (IndexRegister::HL, &[0xCB, 0xFC], "SET 7, H"),
            (IndexRegister::IX, &[0xDD, 0xCB, 0x05, 0x46], "BIT 0, (IX+$05)"),
            (IndexRegister::IX, &[0xDD, 0xCB, 0x05, 0x40], "BIT 0, (IX+$05)"),
            (IndexRegister::IY, &[0xFD, 0xCB, 0xFF, 0xCE], "SET 1, (IY-$01)"),
            (IndexRegister::IY, &[0xFD, 0xCB, 0x02, 0x26], "SLA (IY+$02)"),
            (IndexRegister::IX, &[0xDD, 0xCB, 0x03, 0x00], "RLC (IX+$03), B"),
            (IndexRegister::IX, &[0xDD, 0xCB, 0x03, 0x97], "RES 2, (IX+$03), A"),
        ];

        for (index, code, text) in cases {
            let instruction = run(*index, code, &mut fresh()).unwrap();
            assert_eq!(instruction.to_string(), *text, "{code:02X?}");
            assert_eq!(instruction.length, code.len(), "{code:02X?}");
        }
    }

    #[test]
    fn register_effects() {
        let mut context = fresh();
        context.state_mut().store_atomic(Register8::A, Some(0b1000_0001));

        run(IndexRegister::HL, &[0xCB, 0x07], &mut context).unwrap(); // RLC A
        assert_eq!(context.state().get_atomic(Register8::A), Some(0b0000_0011));

        run(IndexRegister::HL, &[0xCB, 0xFF], &mut context).unwrap(); // SET 7, A
        assert_eq!(context.state().get_atomic(Register8::A), Some(0b1000_0011));

        run(IndexRegister::HL, &[0xCB, 0x87], &mut context).unwrap(); // RES 0, A
        assert_eq!(context.state().get_atomic(Register8::A), Some(0b1000_0010));

        run(IndexRegister::HL, &[0xCB, 0x17], &mut context).unwrap(); // RL A
        assert_eq!(context.state().get_atomic(Register8::A), None);
    }

    #[test]
    fn memory_effects_with_copy() {
        let mut context = fresh();
        context.state_mut().store_compound(Register16::IY, Some(0x5C00));
        context.state_mut().store_memory_bytes(0x5C3B, Some(0x10), 1);

        run(IndexRegister::IY, &[0xFD, 0xCB, 0x3B, 0xC8], &mut context).unwrap(); // SET 1, (IY+$3B), B
        assert_eq!(context.state().get_memory_bytes(0x5C3B, 1, 0), Some(0x12));
        assert_eq!(context.state().get_atomic(Register8::B), Some(0x12));
        assert!(context.memory_locations().is_confirmed(0x5C3B));

        run(IndexRegister::IY, &[0xFD, 0xCB, 0x3B, 0x56], &mut context).unwrap(); // BIT 2, (IY+$3B)
        assert_eq!(context.state().get_memory_bytes(0x5C3B, 1, 0), Some(0x12));
    }

    #[test]
    fn truncated() {
        let code = [0xDD, 0xCB, 0x05];
        let mut parser = Parser::new(&code);
        parser.advance_by(2).unwrap();
        let mut context = fresh();
        assert!(matches!(
            Bits::new(IndexRegister::IX).resolve(&mut parser, &mut context),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(parser.pos(), 3);
    }
}
