//! `DD` and `FD` prefix handling.

use crate::{
    disassembler::{
        context::DecodeContext,
        handlers::{read_u8, Bits, InstructionHandler, Primary},
        instruction::{DecodedInstruction, Operand},
        registers::IndexRegister,
    },
    file::parser::Parser,
    Result,
};

/// The `DD` and `FD` prefixes, applied to the byte after the prefix.
///
/// Both prefixes share this handler and only differ in the index register that replaces `HL`.
/// A prefix directly followed by another prefix has no effect on the CPU, so it is emitted as a
/// single `DB` byte and decoding continues at the following prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indexed {
    index: IndexRegister,
}

impl Indexed {
    /// Create the prefix handler for `IX` or `IY`.
    #[must_use]
    pub fn new(index: IndexRegister) -> Self {
        Indexed { index }
    }
}

impl InstructionHandler for Indexed {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let Some(prefix) = self.index.prefix() else {
            return Primary::new(IndexRegister::HL).resolve(parser, context);
        };

        match parser.peek_byte()? {
            0xDD | 0xED | 0xFD => {
                Ok(context.finish(parser, "DB", vec![Operand::Immediate8(prefix)]))
            }
            0xCB => {
                parser.advance()?;
                Bits::new(self.index).resolve(parser, context)
            }
            _ => {
                let opcode = read_u8(parser)?;
                Primary::new(self.index).decode(opcode, parser, context)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disassembler::{Register16, Register8, WalkerOptions},
        Error,
    };

    fn run(code: &[u8], context: &mut DecodeContext) -> Result<DecodedInstruction> {
        let mut parser = Parser::new(code);
        parser.advance()?;
        context.begin(0);
        let index = if code[0] == 0xDD {
            IndexRegister::IX
        } else {
            IndexRegister::IY
        };
        Indexed::new(index).resolve(&mut parser, context)
    }

    fn fresh() -> DecodeContext {
        DecodeContext::new(0, 0x100, WalkerOptions::default())
    }

    #[test]
    fn mnemonics() {
        let cases: &[(&[u8], &str)] = &[
            (&[0xDD, 0x21, 0x00, 0x40], "LD IX, $4000"),
            (&[0xFD, 0x09], "ADD IY, BC"),
            (&[0xDD, 0x29], "ADD IX, IX"),
            (&[0xDD, 0x22, 0x00, 0x50], "LD ($5000), IX"),
            (&[0xFD, 0x23], "INC IY"),
            (&[0xDD, 0x24], "INC IXH"),
            (&[0xFD, 0x2D], "DEC IYL"),
            (&[0xDD, 0x34, 0x01], "INC (IX+$01)"),
            (&[0xDD, 0x36, 0xFF, 0x00], "LD (IX-$01), $00"),
            (&[0xDD, 0x26, 0x12], "LD IXH, $12"),
            (&[0xDD, 0x66, 0x03], "LD H, (IX+$03)"),
            (&[0xFD, 0x75, 0x00], "LD (IY+$00), L"),
            (&[0xDD, 0x65], "LD IXH, IXL"),
            (&[0xDD, 0x44], "LD B, IXH"),
            (&[0xFD, 0x96, 0x02], "SUB (IY+$02)"),
            (&[0xDD, 0x85], "ADD A, IXL"),
            (&[0xDD, 0xE1], "POP IX"),
            (&[0xFD, 0xE5], "PUSH IY"),
            (&[0xDD, 0xE9], "JP (IX)"),
            (&[0xFD, 0xF9], "LD SP, IY"),
            (&[0xDD, 0xE3], "EX (SP), IX"),
            (&[0xDD, 0xEB], "EX DE, HL"),
            (&[0xDD, 0xCB, 0x02, 0x06], "RLC (IX+$02)"),
            (&[0xDD, 0x00], "NOP"),
        ];

        for (code, text) in cases {
            let instruction = run(code, &mut fresh()).unwrap();
            assert_eq!(instruction.to_string(), *text, "{code:02X?}");
            assert_eq!(instruction.length, code.len(), "{code:02X?}");
        }
    }

    #[test]
    fn prefix_chain_is_a_byte() {
        for code in [[0xDD, 0xDD], [0xDD, 0xFD], [0xFD, 0xED]] {
            let instruction = run(&code, &mut fresh()).unwrap();
            assert_eq!(instruction.mnemonic, "DB");
            assert_eq!(instruction.length, 1);
            assert_eq!(instruction.uid, "DB n");
        }

        let instruction = run(&[0xFD, 0xDD], &mut fresh()).unwrap();
        assert_eq!(instruction.to_string(), "DB $FD");
    }

    #[test]
    fn index_registers_are_tracked() {
        let mut context = fresh();
        run(&[0xDD, 0x21, 0x00, 0x40], &mut context).unwrap();
        assert_eq!(context.state().get_compound(Register16::IX), Some(0x4000));
        assert!(context.memory_locations().is_confirmed(0x4000));

        run(&[0xDD, 0x36, 0x05, 0x99], &mut context).unwrap();
        assert!(context.memory_locations().is_confirmed(0x4005));
        run(&[0xDD, 0x7E, 0x05], &mut context).unwrap();
        assert_eq!(context.state().get_atomic(Register8::A), Some(0x99));

        run(&[0xDD, 0x2C], &mut context).unwrap(); // INC IXL
        assert_eq!(context.state().get_compound(Register16::IX), Some(0x4001));
        assert_eq!(context.state().get_compound(Register16::HL), None);
    }

    #[test]
    fn truncated_prefix() {
        let code = [0xDD];
        let mut parser = Parser::new(&code);
        parser.advance().unwrap();
        let mut context = fresh();
        assert!(matches!(
            Indexed::new(IndexRegister::IX).resolve(&mut parser, &mut context),
            Err(Error::OutOfBounds)
        ));
    }
}
