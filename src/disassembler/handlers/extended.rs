//! The `ED` table: block transfers, 16-bit carry arithmetic, port I/O through `C`, interrupt
//! control and the `I`/`R` loads. Opcodes without a documented meaning are rejected.

use crate::{
    disassembler::{
        bitview::BitView,
        context::DecodeContext,
        fields,
        handlers::{read_u16, read_u8, rp, InstructionHandler, Trivial},
        instruction::{DecodedInstruction, Operand},
        registers::{IndexRegister, Register16, Register8, RegisterRef},
    },
    file::parser::Parser,
    Result,
};

const BC: RegisterRef = RegisterRef::Compound(Register16::BC);
const DE: RegisterRef = RegisterRef::Compound(Register16::DE);
const HL: RegisterRef = RegisterRef::Compound(Register16::HL);
const B: RegisterRef = RegisterRef::Atomic(Register8::B);
const F: RegisterRef = RegisterRef::Atomic(Register8::F);

/// Block transfer, search and I/O instructions, indexed by `[y - 4][z]`.
const BLOCK: [[Trivial; 4]; 4] = [
    [
        Trivial::new("LDI").clobbering(&[BC, DE, HL, F]),
        Trivial::new("CPI").clobbering(&[BC, HL, F]),
        Trivial::new("INI").clobbering(&[B, HL, F]),
        Trivial::new("OUTI").clobbering(&[B, HL, F]),
    ],
    [
        Trivial::new("LDD").clobbering(&[BC, DE, HL, F]),
        Trivial::new("CPD").clobbering(&[BC, HL, F]),
        Trivial::new("IND").clobbering(&[B, HL, F]),
        Trivial::new("OUTD").clobbering(&[B, HL, F]),
    ],
    [
        Trivial::new("LDIR").clobbering(&[BC, DE, HL, F]),
        Trivial::new("CPIR").clobbering(&[BC, HL, F]),
        Trivial::new("INIR").clobbering(&[B, HL, F]),
        Trivial::new("OTIR").clobbering(&[B, HL, F]),
    ],
    [
        Trivial::new("LDDR").clobbering(&[BC, DE, HL, F]),
        Trivial::new("CPDR").clobbering(&[BC, HL, F]),
        Trivial::new("INDR").clobbering(&[B, HL, F]),
        Trivial::new("OTDR").clobbering(&[B, HL, F]),
    ],
];

/// Interrupt modes, indexed by `y`. The undocumented mirrors of mode 0 are listed as 0.
const IM: [Trivial; 4] = [
    Trivial::with_operands("IM", &[Operand::Mode(0)]),
    Trivial::with_operands("IM", &[Operand::Mode(0)]),
    Trivial::with_operands("IM", &[Operand::Mode(1)]),
    Trivial::with_operands("IM", &[Operand::Mode(2)]),
];

/// The `ED` table.
///
/// Opcodes outside the documented set and the well known `IN (C)` / `OUT (C), 0` forms are
/// reported as malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extended;

impl InstructionHandler for Extended {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let opcode = read_u8(parser)?;
        let view = BitView::new(opcode);

        match view.x() {
            1 => self.quadrant1(view, parser, context),
            2 if view.z() <= 3 && view.y() >= 4 => {
                BLOCK[usize::from(view.y() - 4)][usize::from(view.z())].resolve(parser, context)
            }
            _ => Err(malformed_error!("Undefined opcode ED {:02X}", opcode)),
        }
    }
}

impl Extended {
    fn quadrant1(
        &self,
        view: BitView,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        match view.z() {
            0 => {
                context.clobber_flags();
                match fields::reg(view.y()) {
                    Some(register) => {
                        context.state_mut().clear_atomic(register);
                        Ok(context.finish(
                            parser,
                            "IN",
                            vec![Operand::Register(register), Operand::PortC],
                        ))
                    }
                    None => Ok(context.finish(parser, "IN", vec![Operand::PortC])),
                }
            }
            1 => {
                let source = match fields::reg(view.y()) {
                    Some(register) => Operand::Register(register),
                    None => Operand::Zero,
                };
                Ok(context.finish(parser, "OUT", vec![Operand::PortC, source]))
            }
            2 => {
                let pair = rp(view.p(), IndexRegister::HL);
                context.state_mut().clear_compound(Register16::HL);
                context.clobber_flags();
                let mnemonic = if view.q() == 0 { "SBC" } else { "ADC" };
                Ok(context.finish(
                    parser,
                    mnemonic,
                    vec![Operand::Pair(Register16::HL), Operand::Pair(pair)],
                ))
            }
            3 => {
                let address = read_u16(parser)?;
                let pair = rp(view.p(), IndexRegister::HL);
                context.add_memory_location(address);
                let memory = Operand::MemoryAddress(address);

                let operands = if view.q() == 0 {
                    let value = context.state().get_compound(pair);
                    context
                        .state_mut()
                        .store_memory_bytes(address, value.map(u32::from), 2);
                    vec![memory, Operand::Pair(pair)]
                } else {
                    let value = context.state().get_memory_bytes(address, 2, 0);
                    context.store_compound(pair, value.map(|value| value as u16));
                    vec![Operand::Pair(pair), memory]
                };
                Ok(context.finish(parser, "LD", operands))
            }
            4 => {
                let a = context.state().get_atomic(Register8::A);
                context
                    .state_mut()
                    .store_atomic(Register8::A, a.map(|a| 0_u8.wrapping_sub(a)));
                context.clobber_flags();
                Ok(context.finish(parser, "NEG", Vec::new()))
            }
            5 => {
                context.set_unknown_jump();
                let mnemonic = if view.y() == 1 { "RETI" } else { "RETN" };
                Ok(context.finish(parser, mnemonic, Vec::new()))
            }
            6 => IM[usize::from(view.y() & 0b11)].resolve(parser, context),
            _ => self.special(view, parser, context),
        }
    }

    fn special(
        &self,
        view: BitView,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let a = Operand::Register(Register8::A);
        let (mnemonic, operands) = match view.y() {
            0 | 1 => {
                let target = if view.y() == 0 {
                    Register8::I
                } else {
                    Register8::R
                };
                let value = context.state().get_atomic(Register8::A);
                context.state_mut().store_atomic(target, value);
                ("LD", vec![Operand::Register(target), a])
            }
            2 => {
                let value = context.state().get_atomic(Register8::I);
                context.state_mut().store_atomic(Register8::A, value);
                context.clobber_flags();
                ("LD", vec![a, Operand::Register(Register8::I)])
            }
            3 => {
                // R counts instruction fetches
                context.state_mut().clear_atomic(Register8::A);
                context.clobber_flags();
                ("LD", vec![a, Operand::Register(Register8::R)])
            }
            y @ (4 | 5) => {
                let address = context.touch_memory(Register16::HL, 0);
                context.store_memory_byte(address, None);
                context.state_mut().clear_atomic(Register8::A);
                context.clobber_flags();
                (if y == 4 { "RRD" } else { "RLD" }, Vec::new())
            }
            _ => {
                return Err(malformed_error!(
                    "Undefined opcode ED {:02X}",
                    view.byte()
                ))
            }
        };

        Ok(context.finish(parser, mnemonic, operands))
    }
}
