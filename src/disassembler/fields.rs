//! Register-field decoding for the `x = 1` style two-register opcodes.
//!
//! A 3-bit field selects one of `B C D E H L (HL) A`. Code `0b110` is the memory operand
//! addressed through `HL`, which turns a register copy into a load or a store.

use crate::disassembler::{bitview::BitView, registers::Register8};

/// The field code that selects the `(HL)` memory operand.
pub const HL_INDIRECT: u8 = 0b110;

/// A register field that may also select the memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOrIndirect {
    /// A plain register
    Register(Register8),
    /// The `(HL)` memory operand
    IndirectHL,
}

/// How a two-field opcode moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterCopy {
    /// Both fields are registers: `(destination, source)`.
    Registers(Register8, Register8),
    /// The destination is memory, the register is the value written.
    ToMemory(Register8),
    /// The source is memory, the register receives the value.
    FromMemory(Register8),
    /// Both fields select memory, which is not a copy (`0x76` is `HALT`).
    NotACopy,
}

/// Map a field code to its register. `0b110` has no register and yields `None`.
#[must_use]
pub fn reg(code: u8) -> Option<Register8> {
    match code & 0b111 {
        0 => Some(Register8::B),
        1 => Some(Register8::C),
        2 => Some(Register8::D),
        3 => Some(Register8::E),
        4 => Some(Register8::H),
        5 => Some(Register8::L),
        7 => Some(Register8::A),
        _ => None,
    }
}

/// Map a field code to a register or the `(HL)` memory operand.
#[must_use]
pub fn reg_or_indirect(code: u8) -> RegisterOrIndirect {
    match reg(code) {
        Some(register) => RegisterOrIndirect::Register(register),
        None => RegisterOrIndirect::IndirectHL,
    }
}

/// The source field (`z`) selects memory.
#[must_use]
pub fn is_from_memory(view: BitView) -> bool {
    view.b3() == HL_INDIRECT
}

/// The destination field (`y`) selects memory.
#[must_use]
pub fn is_to_memory(view: BitView) -> bool {
    view.a3() == HL_INDIRECT
}

/// `(destination, source)` when neither field selects memory.
#[must_use]
pub fn copy_registers(view: BitView) -> Option<(Register8, Register8)> {
    if is_from_memory(view) || is_to_memory(view) {
        return None;
    }

    Some((reg(view.a3())?, reg(view.b3())?))
}

/// The register stored to memory, when exactly the destination field selects memory.
#[must_use]
pub fn source_register(view: BitView) -> Option<Register8> {
    if is_to_memory(view) && !is_from_memory(view) {
        reg(view.b3())
    } else {
        None
    }
}

/// The register loaded from memory, when exactly the source field selects memory.
#[must_use]
pub fn target_register(view: BitView) -> Option<Register8> {
    if is_from_memory(view) && !is_to_memory(view) {
        reg(view.a3())
    } else {
        None
    }
}

/// Classify a two-field opcode.
///
/// ```rust
/// use z80scope::disassembler::{classify, BitView, Register8, RegisterCopy};
///
/// assert_eq!(classify(BitView::new(0x78)), RegisterCopy::Registers(Register8::A, Register8::B));
/// assert_eq!(classify(BitView::new(0x77)), RegisterCopy::ToMemory(Register8::A));
/// assert_eq!(classify(BitView::new(0x7E)), RegisterCopy::FromMemory(Register8::A));
/// assert_eq!(classify(BitView::new(0x76)), RegisterCopy::NotACopy);
/// ```
#[must_use]
pub fn classify(view: BitView) -> RegisterCopy {
    if let Some((destination, source)) = copy_registers(view) {
        RegisterCopy::Registers(destination, source)
    } else if let Some(register) = source_register(view) {
        RegisterCopy::ToMemory(register)
    } else if let Some(register) = target_register(view) {
        RegisterCopy::FromMemory(register)
    } else {
        RegisterCopy::NotACopy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(y: u8, z: u8) -> BitView {
        BitView::new(0b0100_0000 | (y << 3) | z)
    }

    #[test]
    fn register_codes() {
        assert_eq!(reg(0), Some(Register8::B));
        assert_eq!(reg(5), Some(Register8::L));
        assert_eq!(reg(7), Some(Register8::A));
        assert_eq!(reg(HL_INDIRECT), None);
        assert_eq!(reg_or_indirect(HL_INDIRECT), RegisterOrIndirect::IndirectHL);
        assert_eq!(
            reg_or_indirect(3),
            RegisterOrIndirect::Register(Register8::E)
        );
    }

    #[test]
    fn indirect_on_exactly_one_side() {
        for other in (0..8).filter(|code| *code != HL_INDIRECT) {
            let to_memory = view(HL_INDIRECT, other);
            assert!(is_to_memory(to_memory));
            assert!(!is_from_memory(to_memory));
            assert_eq!(source_register(to_memory), reg(other));
            assert_eq!(target_register(to_memory), None);
            assert!(matches!(classify(to_memory), RegisterCopy::ToMemory(_)));

            let from_memory = view(other, HL_INDIRECT);
            assert!(is_from_memory(from_memory));
            assert_eq!(target_register(from_memory), reg(other));
            assert_eq!(source_register(from_memory), None);
            assert!(matches!(classify(from_memory), RegisterCopy::FromMemory(_)));
        }
    }

    #[test]
    fn both_sides_indirect() {
        let both = view(HL_INDIRECT, HL_INDIRECT);
        assert_eq!(copy_registers(both), None);
        assert_eq!(source_register(both), None);
        assert_eq!(target_register(both), None);
        assert_eq!(classify(both), RegisterCopy::NotACopy);
    }

    #[test]
    fn neither_side_indirect() {
        for y in (0..8).filter(|code| *code != HL_INDIRECT) {
            for z in (0..8).filter(|code| *code != HL_INDIRECT) {
                let plain = view(y, z);
                assert_eq!(copy_registers(plain), Some((reg(y).unwrap(), reg(z).unwrap())));
                assert_eq!(source_register(plain), None);
                assert_eq!(target_register(plain), None);
            }
        }
    }
}
