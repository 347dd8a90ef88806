//! Byte loads and stores through a register pointer.
//!
//! `LD A, (BC)`, `LD (DE), A` and the `(HL)`/`(IX+d)` forms share one handler, which confirms
//! the addressed location and moves known values between the register and symbolic memory.

use crate::{
    disassembler::{
        context::DecodeContext,
        handlers::{memory_operand, InstructionHandler},
        instruction::{DecodedInstruction, Operand},
        registers::{IndexRegister, Register16, Register8},
    },
    file::parser::Parser,
    Result,
};

/// Which way an [`IndirectLoad`] moves the byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `LD r, (rr)`
    Load,
    /// `LD (rr), r`
    Store,
}

/// A byte moved between a register and memory addressed by a 16-bit register.
///
/// Covers `LD A, (BC)`, `LD (DE), A`, and the `(HL)` forms of the register copy block, where
/// `(HL)` becomes `(IX+d)` or `(IY+d)` under an index prefix. The access confirms the memory
/// location when the pointer is known, and the value travels along when it is known as well.
#[derive(Debug, Clone, Copy)]
pub struct IndirectLoad {
    register: Register8,
    pointer: Register16,
    index: IndexRegister,
    direction: Direction,
}

impl IndirectLoad {
    /// Access through `BC` or `DE`.
    #[must_use]
    pub fn new(register: Register8, pointer: Register16, direction: Direction) -> Self {
        IndirectLoad {
            register,
            pointer,
            index: IndexRegister::HL,
            direction,
        }
    }

    /// Access through `(HL)`, or `(IX+d)` / `(IY+d)` for indexed forms.
    #[must_use]
    pub fn through(register: Register8, index: IndexRegister, direction: Direction) -> Self {
        IndirectLoad {
            register,
            pointer: index.pair(),
            index,
            direction,
        }
    }
}

impl InstructionHandler for IndirectLoad {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let (memory, displacement) = if self.pointer == self.index.pair() {
            memory_operand(parser, self.index)?
        } else {
            (Operand::Indirect(self.pointer), 0)
        };

        let address = context.touch_memory(self.pointer, displacement);
        let register = Operand::Register(self.register);
        let operands = match self.direction {
            Direction::Load => {
                let value = context.memory_byte(address);
                context.state_mut().store_atomic(self.register, value);
                vec![register, memory]
            }
            Direction::Store => {
                let value = context.state().get_atomic(self.register);
                context.store_memory_byte(address, value);
                vec![memory, register]
            }
        };

        Ok(context.finish(parser, "LD", operands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disassembler::WalkerOptions, Error};

    #[test]
    fn load_known_memory() {
        let code = [0x0A];
        let mut parser = Parser::new(&code);
        parser.advance().unwrap();
        let mut context = DecodeContext::new(0, 1, WalkerOptions::default());
        context.state_mut().store_compound(Register16::BC, Some(0x6000));
        context.state_mut().store_memory_bytes(0x6000, Some(0x42), 1);
        context.state_mut().store_atomic(Register8::A, Some(0));

        let handler = IndirectLoad::new(Register8::A, Register16::BC, Direction::Load);
        let instruction = handler.resolve(&mut parser, &mut context).unwrap();

        assert_eq!(instruction.to_string(), "LD A, (BC)");
        assert_eq!(context.state().get_atomic(Register8::A), Some(0x42));
        assert!(context.memory_locations().is_confirmed(0x6000));
    }

    #[test]
    fn load_unknown_memory() {
        let code = [0x7E];
        let mut parser = Parser::new(&code);
        parser.advance().unwrap();
        let mut context = DecodeContext::new(0, 1, WalkerOptions::default());
        context.state_mut().store_atomic(Register8::A, Some(1));

        let handler = IndirectLoad::through(Register8::A, IndexRegister::HL, Direction::Load);
        let instruction = handler.resolve(&mut parser, &mut context).unwrap();

        assert_eq!(instruction.to_string(), "LD A, (HL)");
        assert_eq!(context.state().get_atomic(Register8::A), None);
        assert!(context.memory_locations().confirmed().is_empty());
    }

    #[test]
    fn indexed_store() {
        let code = [0xDD, 0x70, 0x04];
        let mut parser = Parser::new(&code);
        parser.advance_by(2).unwrap();
        let mut context = DecodeContext::new(0, 3, WalkerOptions::default());
        context.state_mut().store_compound(Register16::IX, Some(0x7000));
        context.state_mut().store_atomic(Register8::B, Some(0x99));

        let handler = IndirectLoad::through(Register8::B, IndexRegister::IX, Direction::Store);
        let instruction = handler.resolve(&mut parser, &mut context).unwrap();

        assert_eq!(instruction.to_string(), "LD (IX+$04), B");
        assert_eq!(instruction.uid, "LD (IX+d), B");
        assert_eq!(instruction.length, 3);
        assert_eq!(context.state().get_memory_bytes(0x7004, 1, 0), Some(0x99));
        assert!(context.memory_locations().is_confirmed(0x7004));
    }

    #[test]
    fn truncated_displacement() {
        let code = [0xFD, 0x7E];
        let mut parser = Parser::new(&code);
        parser.advance_by(2).unwrap();
        let mut context = DecodeContext::new(0, 2, WalkerOptions::default());
        context.state_mut().store_atomic(Register8::A, Some(3));

        let handler = IndirectLoad::through(Register8::A, IndexRegister::IY, Direction::Load);
        assert!(matches!(
            handler.resolve(&mut parser, &mut context),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(context.state().get_atomic(Register8::A), Some(3));
    }
}
