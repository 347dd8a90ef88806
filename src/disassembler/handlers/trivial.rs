//! Instructions with a fixed rendering, whose only effect is making some registers unknown.

use crate::{
    disassembler::{
        context::DecodeContext,
        handlers::InstructionHandler,
        instruction::{DecodedInstruction, Operand},
        registers::RegisterRef,
    },
    file::parser::Parser,
    Result,
};

/// A fixed instruction without operand bytes.
///
/// `clobbers` lists the registers the instruction leaves unknown, e.g. `BC`, `DE` and `HL`
/// for `LDIR`.
#[derive(Debug, Clone, Copy)]
pub struct Trivial {
    mnemonic: &'static str,
    operands: &'static [Operand],
    clobbers: &'static [RegisterRef],
}

impl Trivial {
    /// A bare mnemonic with no operands and no effects.
    #[must_use]
    pub const fn new(mnemonic: &'static str) -> Self {
        Trivial {
            mnemonic,
            operands: &[],
            clobbers: &[],
        }
    }

    /// A mnemonic with fixed operands.
    #[must_use]
    pub const fn with_operands(mnemonic: &'static str, operands: &'static [Operand]) -> Self {
        Trivial {
            mnemonic,
            operands,
            clobbers: &[],
        }
    }

    /// Registers that become unknown.
    #[must_use]
    pub const fn clobbering(self, clobbers: &'static [RegisterRef]) -> Self {
        Trivial { clobbers, ..self }
    }
}

impl InstructionHandler for Trivial {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        for register in self.clobbers {
            match register {
                RegisterRef::Atomic(register) => context.state_mut().clear_atomic(*register),
                RegisterRef::Compound(register) => context.state_mut().clear_compound(*register),
            }
        }

        Ok(context.finish(parser, self.mnemonic, self.operands.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disassembler::{Register16, WalkerOptions};

    #[test]
    fn clobbers_registers() {
        const EXX: Trivial = Trivial::new("EXX").clobbering(&[
            RegisterRef::Compound(Register16::BC),
            RegisterRef::Compound(Register16::DE),
        ]);

        let code = [0xD9];
        let mut parser = Parser::new(&code);
        parser.advance().unwrap();
        let mut context = DecodeContext::new(0, 1, WalkerOptions::default());
        context.state_mut().store_compound(Register16::BC, Some(1));
        context.state_mut().store_compound(Register16::HL, Some(2));

        let instruction = EXX.resolve(&mut parser, &mut context).unwrap();
        assert_eq!(instruction.to_string(), "EXX");
        assert_eq!(instruction.length, 1);
        assert_eq!(context.state().get_compound(Register16::BC), None);
        assert_eq!(context.state().get_compound(Register16::HL), Some(2));
    }

    #[test]
    fn fixed_operands() {
        const IM1: Trivial = Trivial::with_operands("IM", &[Operand::Mode(1)]);

        let code = [0xED, 0x56];
        let mut parser = Parser::new(&code);
        parser.advance_by(2).unwrap();
        let mut context = DecodeContext::new(0, 2, WalkerOptions::default());

        let instruction = IM1.resolve(&mut parser, &mut context).unwrap();
        assert_eq!(instruction.to_string(), "IM 1");
        assert_eq!(instruction.length, 2);
    }
}
