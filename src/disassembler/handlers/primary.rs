//! The unprefixed opcode table, reused under the index prefixes.

use crate::{
    disassembler::{
        bitview::BitView,
        context::DecodeContext,
        fields::{classify, RegisterCopy},
        handlers::{
            apply_alu, memory_operand, read_u16, read_u8, register, rp, rp2, AluOp, Bits,
            Direction, Extended, Indexed, IndirectLoad, InstructionHandler, RelJump, Trivial,
        },
        instruction::{DecodedInstruction, Operand},
        registers::{Condition, IndexRegister, Register16, Register8, RegisterRef},
        targets::TargetKind,
    },
    file::parser::Parser,
    Result,
};

const NOP: Trivial = Trivial::new("NOP");
const HALT: Trivial = Trivial::new("HALT");
const DI: Trivial = Trivial::new("DI");
const EI: Trivial = Trivial::new("EI");
const EX_AF: Trivial = Trivial::with_operands("EX", &[Operand::Pair(Register16::AF), Operand::AltAF])
    .clobbering(&[RegisterRef::Compound(Register16::AF)]);
const EXX: Trivial = Trivial::new("EXX").clobbering(&[
    RegisterRef::Compound(Register16::BC),
    RegisterRef::Compound(Register16::DE),
    RegisterRef::Compound(Register16::HL),
]);

/// The unprefixed opcode table.
///
/// Under a `DD` or `FD` prefix the same table applies with `HL` replaced by `IX` or `IY`: `H`
/// and `L` become the index halves, and `(HL)` becomes `(IX+d)`. In an `(IX+d)` form the other
/// register operand keeps its plain `H` or `L` meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primary {
    index: IndexRegister,
}

impl Primary {
    /// Create the table for the given index register.
    #[must_use]
    pub fn new(index: IndexRegister) -> Self {
        Primary { index }
    }

    /// Decode an opcode byte that has already been consumed.
    pub(crate) fn decode(
        &self,
        opcode: u8,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let view = BitView::new(opcode);
        match view.x() {
            0 => self.quadrant0(view, parser, context),
            1 => self.quadrant1(view, parser, context),
            2 => self.quadrant2(view, parser, context),
            _ => self.quadrant3(view, parser, context),
        }
    }

    fn quadrant0(
        &self,
        view: BitView,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let index = self.index;
        match view.z() {
            0 => match view.y() {
                0 => NOP.resolve(parser, context),
                1 => EX_AF.resolve(parser, context),
                2 => RelJump::DecrementB.resolve(parser, context),
                3 => RelJump::Always.resolve(parser, context),
                y => RelJump::Conditional(Condition::from_code(y - 4)).resolve(parser, context),
            },
            1 => {
                let pair = rp(view.p(), index);
                if view.q() == 0 {
                    let value = read_u16(parser)?;
                    context.store_register16(pair, value);
                    Ok(context.finish(
                        parser,
                        "LD",
                        vec![Operand::Pair(pair), Operand::Immediate16(value)],
                    ))
                } else {
                    let target = index.pair();
                    let state = context.state();
                    let sum = state
                        .get_compound(target)
                        .zip(state.get_compound(pair))
                        .map(|(a, b)| a.wrapping_add(b));
                    context.store_compound(target, sum);
                    context.clobber_flags();
                    Ok(context.finish(
                        parser,
                        "ADD",
                        vec![Operand::Pair(target), Operand::Pair(pair)],
                    ))
                }
            }
            2 => match (view.q(), view.p()) {
                (0, 0) => IndirectLoad::new(Register8::A, Register16::BC, Direction::Store)
                    .resolve(parser, context),
                (0, 1) => IndirectLoad::new(Register8::A, Register16::DE, Direction::Store)
                    .resolve(parser, context),
                (1, 0) => IndirectLoad::new(Register8::A, Register16::BC, Direction::Load)
                    .resolve(parser, context),
                (1, 1) => IndirectLoad::new(Register8::A, Register16::DE, Direction::Load)
                    .resolve(parser, context),
                (q, p) => {
                    let address = read_u16(parser)?;
                    context.add_memory_location(address);
                    let memory = Operand::MemoryAddress(address);

                    let operands = match (q, p) {
                        (0, 2) => {
                            let value = context.state().get_compound(index.pair());
                            context
                                .state_mut()
                                .store_memory_bytes(address, value.map(u32::from), 2);
                            vec![memory, Operand::Pair(index.pair())]
                        }
                        (1, 2) => {
                            let value = context.state().get_memory_bytes(address, 2, 0);
                            context
                                .store_compound(index.pair(), value.map(|value| value as u16));
                            vec![Operand::Pair(index.pair()), memory]
                        }
                        (0, _) => {
                            let value = context.state().get_atomic(Register8::A);
                            context.store_memory_byte(Some(address), value);
                            vec![memory, Operand::Register(Register8::A)]
                        }
                        _ => {
                            let value = context.memory_byte(Some(address));
                            context.state_mut().store_atomic(Register8::A, value);
                            vec![Operand::Register(Register8::A), memory]
                        }
                    };
                    Ok(context.finish(parser, "LD", operands))
                }
            },
            3 => {
                let pair = rp(view.p(), index);
                let increment = view.q() == 0;
                let value = context.state().get_compound(pair).map(|value| {
                    if increment {
                        value.wrapping_add(1)
                    } else {
                        value.wrapping_sub(1)
                    }
                });
                context.store_compound(pair, value);

                let mnemonic = if increment { "INC" } else { "DEC" };
                Ok(context.finish(parser, mnemonic, vec![Operand::Pair(pair)]))
            }
            z @ (4 | 5) => {
                let step = |value: u8| {
                    if z == 4 {
                        value.wrapping_add(1)
                    } else {
                        value.wrapping_sub(1)
                    }
                };

                let operand = if view.y() == 6 {
                    let (operand, displacement) = memory_operand(parser, index)?;
                    let address = context.touch_memory(index.pair(), displacement);
                    let value = context.memory_byte(address).map(step);
                    context.store_memory_byte(address, value);
                    operand
                } else {
                    let target = register(view.y(), index)?;
                    let value = context.state().get_atomic(target).map(step);
                    context.state_mut().store_atomic(target, value);
                    Operand::Register(target)
                };
                context.clobber_flags();

                let mnemonic = if z == 4 { "INC" } else { "DEC" };
                Ok(context.finish(parser, mnemonic, vec![operand]))
            }
            6 => {
                let operand = if view.y() == 6 {
                    let (operand, displacement) = memory_operand(parser, index)?;
                    let value = read_u8(parser)?;
                    let address = context.touch_memory(index.pair(), displacement);
                    context.store_memory_byte(address, Some(value));
                    (operand, value)
                } else {
                    let value = read_u8(parser)?;
                    let target = register(view.y(), index)?;
                    context.state_mut().store_atomic(target, Some(value));
                    (Operand::Register(target), value)
                };

                Ok(context.finish(
                    parser,
                    "LD",
                    vec![operand.0, Operand::Immediate8(operand.1)],
                ))
            }
            _ => {
                let a = context.state().get_atomic(Register8::A);
                let (mnemonic, result) = match view.y() {
                    0 => ("RLCA", a.map(|a| a.rotate_left(1))),
                    1 => ("RRCA", a.map(|a| a.rotate_right(1))),
                    2 => ("RLA", None),
                    3 => ("RRA", None),
                    4 => ("DAA", None),
                    5 => ("CPL", a.map(|a| !a)),
                    6 => ("SCF", a),
                    _ => ("CCF", a),
                };
                context.state_mut().store_atomic(Register8::A, result);
                context.clobber_flags();
                Ok(context.finish(parser, mnemonic, Vec::new()))
            }
        }
    }

    fn quadrant1(
        &self,
        view: BitView,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let index = self.index;
        match classify(view) {
            RegisterCopy::Registers(_, _) => {
                let target = register(view.y(), index)?;
                let source = register(view.z(), index)?;
                let value = context.state().get_atomic(source);
                context.state_mut().store_atomic(target, value);
                Ok(context.finish(
                    parser,
                    "LD",
                    vec![Operand::Register(target), Operand::Register(source)],
                ))
            }
            RegisterCopy::ToMemory(source) => {
                IndirectLoad::through(source, index, Direction::Store).resolve(parser, context)
            }
            RegisterCopy::FromMemory(target) => {
                IndirectLoad::through(target, index, Direction::Load).resolve(parser, context)
            }
            RegisterCopy::NotACopy => HALT.resolve(parser, context),
        }
    }

    fn quadrant2(
        &self,
        view: BitView,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let op = AluOp::from_code(view.y());

        let operand = if view.z() == 6 {
            let (operand, displacement) = memory_operand(parser, self.index)?;
            let address = context.touch_memory(self.index.pair(), displacement);
            let value = context.memory_byte(address);
            apply_alu(context, op, value, false);
            operand
        } else {
            let source = register(view.z(), self.index)?;
            let value = context.state().get_atomic(source);
            apply_alu(context, op, value, source == Register8::A);
            Operand::Register(source)
        };

        Ok(context.finish(parser, op.mnemonic(), op.operands(operand)))
    }

    fn quadrant3(
        &self,
        view: BitView,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let index = self.index;
        let condition = Operand::Condition(Condition::from_code(view.y()));
        match view.z() {
            0 => Ok(context.finish(parser, "RET", vec![condition])),
            1 if view.q() == 0 => {
                let pair = rp2(view.p(), index);
                let value = pop(context);
                context.store_compound(pair, value);
                Ok(context.finish(parser, "POP", vec![Operand::Pair(pair)]))
            }
            1 => match view.p() {
                0 => {
                    context.set_unknown_jump();
                    Ok(context.finish(parser, "RET", Vec::new()))
                }
                1 => EXX.resolve(parser, context),
                2 => {
                    context.add_jump_to_register(index.pair());
                    Ok(context.finish(parser, "JP", vec![Operand::Indirect(index.pair())]))
                }
                _ => {
                    let value = context.state().get_compound(index.pair());
                    context.store_compound(Register16::SP, value);
                    Ok(context.finish(
                        parser,
                        "LD",
                        vec![Operand::Pair(Register16::SP), Operand::Pair(index.pair())],
                    ))
                }
            },
            2 => {
                let address = read_u16(parser)?;
                context.add_target(address, TargetKind::Jump);
                Ok(context.finish(parser, "JP", vec![condition, Operand::Address(address)]))
            }
            3 => match view.y() {
                0 => {
                    let address = read_u16(parser)?;
                    context.add_jump_to(address);
                    Ok(context.finish(parser, "JP", vec![Operand::Address(address)]))
                }
                1 => Bits::new(index).resolve(parser, context),
                2 => {
                    let port = read_u8(parser)?;
                    Ok(context.finish(
                        parser,
                        "OUT",
                        vec![Operand::Port(port), Operand::Register(Register8::A)],
                    ))
                }
                3 => {
                    let port = read_u8(parser)?;
                    context.state_mut().clear_atomic(Register8::A);
                    Ok(context.finish(
                        parser,
                        "IN",
                        vec![Operand::Register(Register8::A), Operand::Port(port)],
                    ))
                }
                4 => {
                    let pair = index.pair();
                    let address = context.touch_memory(Register16::SP, 0);
                    let stacked = address
                        .and_then(|address| context.state().get_memory_bytes(address, 2, 0));
                    let value = context.state().get_compound(pair);
                    if let Some(address) = address {
                        context
                            .state_mut()
                            .store_memory_bytes(address, value.map(u32::from), 2);
                    }
                    context.store_compound(pair, stacked.map(|value| value as u16));
                    Ok(context.finish(
                        parser,
                        "EX",
                        vec![Operand::Indirect(Register16::SP), Operand::Pair(pair)],
                    ))
                }
                5 => {
                    let de = context.state().get_compound(Register16::DE);
                    let hl = context.state().get_compound(Register16::HL);
                    context.store_compound(Register16::DE, hl);
                    context.store_compound(Register16::HL, de);
                    Ok(context.finish(
                        parser,
                        "EX",
                        vec![Operand::Pair(Register16::DE), Operand::Pair(Register16::HL)],
                    ))
                }
                6 => DI.resolve(parser, context),
                _ => EI.resolve(parser, context),
            },
            4 => {
                let address = read_u16(parser)?;
                context.add_target(address, TargetKind::Function);
                context.after_call();
                Ok(context.finish(parser, "CALL", vec![condition, Operand::Address(address)]))
            }
            5 if view.q() == 0 => {
                let pair = rp2(view.p(), index);
                let value = context.state().get_compound(pair);
                push(context, value);
                Ok(context.finish(parser, "PUSH", vec![Operand::Pair(pair)]))
            }
            5 => match view.p() {
                0 => {
                    let address = read_u16(parser)?;
                    context.add_target(address, TargetKind::Function);
                    context.after_call();
                    Ok(context.finish(parser, "CALL", vec![Operand::Address(address)]))
                }
                1 => Indexed::new(IndexRegister::IX).resolve(parser, context),
                2 => Extended.resolve(parser, context),
                _ => Indexed::new(IndexRegister::IY).resolve(parser, context),
            },
            6 => {
                let op = AluOp::from_code(view.y());
                let value = read_u8(parser)?;
                apply_alu(context, op, Some(value), false);
                Ok(context.finish(
                    parser,
                    op.mnemonic(),
                    op.operands(Operand::Immediate8(value)),
                ))
            }
            _ => {
                let vector = u16::from(view.y()) * 8;
                context.add_target(vector, TargetKind::Function);
                context.after_call();
                Ok(context.finish(parser, "RST", vec![Operand::Restart(vector)]))
            }
        }
    }
}

/// Push a word when `SP` is known.
fn push(context: &mut DecodeContext, value: Option<u16>) {
    if let Some(sp) = context.state().get_compound(Register16::SP) {
        let sp = sp.wrapping_sub(2);
        context
            .state_mut()
            .store_memory_bytes(sp, value.map(u32::from), 2);
        context.store_register16(Register16::SP, sp);
    }
}

/// Pop a word when `SP` is known, returning the stacked value if that is known too.
fn pop(context: &mut DecodeContext) -> Option<u16> {
    let sp = context.state().get_compound(Register16::SP)?;
    let value = context.state().get_memory_bytes(sp, 2, 0);
    context.store_register16(Register16::SP, sp.wrapping_add(2));
    value.map(|value| value as u16)
}

impl InstructionHandler for Primary {
    fn resolve(
        &self,
        parser: &mut Parser<'_>,
        context: &mut DecodeContext,
    ) -> Result<DecodedInstruction> {
        let opcode = read_u8(parser)?;
        self.decode(opcode, parser, context)
    }
}
