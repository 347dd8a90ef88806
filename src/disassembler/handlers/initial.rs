//! Entry point of the handler tree, dispatching on the first opcode byte.

use crate::{
    disassembler::{
        context::DecodeContext,
        handlers::{read_u8, Bits, Extended, Indexed, InstructionHandler, Primary},
        instruction::DecodedInstruction,
        registers::IndexRegister,
    },
    file::parser::Parser,
    Result,
};

/// The top level dispatcher: routes the prefix bytes to their tables and everything else to
/// the unprefixed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Initial;

impl InstructionHandler for Initial {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        match read_u8(parser)? {
            0xCB => Bits::new(IndexRegister::HL).resolve(parser, context),
            0xDD => Indexed::new(IndexRegister::IX).resolve(parser, context),
            0xED => Extended.resolve(parser, context),
            0xFD => Indexed::new(IndexRegister::IY).resolve(parser, context),
            opcode => Primary::new(IndexRegister::HL).decode(opcode, parser, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disassembler::WalkerOptions;

    #[test]
    fn dispatch() {
        let cases: &[(&[u8], &str)] = &[
            (&[0xCB, 0x47], "BIT 0, A"),
            (&[0xDD, 0x46, 0x01], "LD B, (IX+$01)"),
            (&[0xED, 0x4B, 0x00, 0x80], "LD BC, ($8000)"),
            (&[0xFD, 0x36, 0x00, 0x01], "LD (IY+$00), $01"),
            (&[0x18, 0xFE], "JR $+$00"),
        ];

        for (code, text) in cases {
            let mut parser = Parser::new(code);
            let mut context = DecodeContext::new(0, code.len(), WalkerOptions::default());
            context.begin(0);
            let instruction = Initial.resolve(&mut parser, &mut context).unwrap();
            assert_eq!(instruction.to_string(), *text);
            assert_eq!(instruction.length, code.len());
        }
    }
}
