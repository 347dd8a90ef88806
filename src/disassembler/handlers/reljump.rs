//! Relative branches.

use crate::{
    disassembler::{
        context::DecodeContext,
        handlers::{read_i8, InstructionHandler},
        instruction::{DecodedInstruction, Operand},
        registers::{Condition, Register8},
    },
    file::parser::Parser,
    Result,
};

/// The relative branches `JR e`, `JR cc, e` and `DJNZ e`.
///
/// The displacement counts from the byte after the instruction. That is the instruction
/// address plus `e + 2`, or `e + 3` when an ignored `DD`/`FD` prefix precedes the opcode.
/// Only the unconditional `JR` ends the linear run; the other forms record their target and
/// fall through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelJump {
    /// `JR e`
    Always,
    /// `JR cc, e`
    Conditional(Condition),
    /// `DJNZ e`
    DecrementB,
}

impl RelJump {
    /// Returns `true` if the branch is always taken.
    #[must_use]
    pub fn is_unconditional(self) -> bool {
        self == RelJump::Always
    }
}

impl InstructionHandler for RelJump {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let displacement = read_i8(parser)?;
        let consumed = parser.pos().saturating_sub(context.start_point());
        let offset = i32::from(displacement) + consumed as i32;

        let target = if self.is_unconditional() {
            context.add_jump_to_rel(offset);
            context.instruction_address().wrapping_add(offset as u16)
        } else {
            context.add_target_rel(offset)
        };
        let relative = Operand::Relative { offset, target };

        let (mnemonic, operands) = match self {
            RelJump::Always => ("JR", vec![relative]),
            RelJump::Conditional(condition) => ("JR", vec![Operand::Condition(*condition), relative]),
            RelJump::DecrementB => {
                let b = context.state().get_atomic(Register8::B);
                context
                    .state_mut()
                    .store_atomic(Register8::B, b.map(|b| b.wrapping_sub(1)));
                ("DJNZ", vec![relative])
            }
        };

        Ok(context.finish(parser, mnemonic, operands))
    }
}
