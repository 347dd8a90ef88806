//! Decoded instruction records and their operands.
//!
//! A [`DecodedInstruction`] is produced once per decode step and never changes afterwards.
//! Symbolic names for addresses are only known once discovery has finished, so operands keep
//! raw addresses and [`DecodedInstruction::render`] substitutes labels at listing time.

use std::{collections::HashMap, fmt};

use crate::{
    disassembler::registers::{Condition, Register16, Register8},
    utils::format,
};

/// Labels assigned to memory addresses, as produced by the listing.
pub type LabelMap = HashMap<u16, String>;

/// A single instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// An 8-bit register
    Register(Register8),
    /// A 16-bit register
    Pair(Register16),
    /// The shadow `AF'` pair, only seen in `EX AF, AF'`
    AltAF,
    /// Memory addressed by a register, `(HL)`
    Indirect(Register16),
    /// Memory addressed by an index register plus displacement, `(IX+$05)`
    Indexed {
        /// `IX` or `IY`
        register: Register16,
        /// Signed displacement added to the register
        displacement: i8,
    },
    /// An 8-bit immediate
    Immediate8(u8),
    /// A 16-bit immediate
    Immediate16(u16),
    /// An absolute branch or call destination
    Address(u16),
    /// Memory at an absolute address, `($4000)`
    MemoryAddress(u16),
    /// A relative branch
    Relative {
        /// Distance of the target from the start of the instruction
        offset: i32,
        /// The absolute destination
        target: u16,
    },
    /// A branch condition
    Condition(Condition),
    /// An I/O port given as immediate, `($FE)`
    Port(u8),
    /// The I/O port held in `C`, `(C)`
    PortC,
    /// A bit number of `BIT`, `SET` and `RES`
    Bit(u8),
    /// An interrupt mode of `IM`
    Mode(u8),
    /// The restart vector of `RST`
    Restart(u16),
    /// The literal `0` of `OUT (C), 0`
    Zero,
}

impl Operand {
    /// The shape of the operand, which keeps registers and replaces every value with a
    /// placeholder.
    #[must_use]
    pub fn shape(&self) -> String {
        match self {
            Operand::Register(register) => register.to_string(),
            Operand::Pair(register) => register.to_string(),
            Operand::AltAF => "AF'".to_string(),
            Operand::Indirect(register) => format!("({register})"),
            Operand::Indexed { register, .. } => format!("({register}+d)"),
            Operand::Immediate8(_) => "n".to_string(),
            Operand::Immediate16(_) | Operand::Address(_) => "nn".to_string(),
            Operand::MemoryAddress(_) => "(nn)".to_string(),
            Operand::Relative { .. } => "e".to_string(),
            Operand::Condition(condition) => condition.to_string(),
            Operand::Port(_) => "(n)".to_string(),
            Operand::PortC => "(C)".to_string(),
            Operand::Bit(bit) => bit.to_string(),
            Operand::Mode(mode) => mode.to_string(),
            Operand::Restart(vector) => format::u8(*vector as u8),
            Operand::Zero => "0".to_string(),
        }
    }

    /// Render the operand, replacing addresses that carry a label.
    #[must_use]
    pub fn render(&self, labels: &LabelMap) -> String {
        match self {
            Operand::Address(address) => labels
                .get(address)
                .cloned()
                .unwrap_or_else(|| format::addr(*address)),
            Operand::MemoryAddress(address) => match labels.get(address) {
                Some(label) => format!("({label})"),
                None => format!("({})", format::addr(*address)),
            },
            Operand::Relative { offset, target } => labels
                .get(target)
                .cloned()
                .unwrap_or_else(|| format!("${}", format::rel(*offset))),
            Operand::Restart(vector) => labels
                .get(vector)
                .cloned()
                .unwrap_or_else(|| format::u8(*vector as u8)),
            Operand::Indexed {
                register,
                displacement,
            } => format!("({register}{})", format::rel(i32::from(*displacement))),
            Operand::Immediate8(value) => format::u8(*value),
            Operand::Immediate16(value) => format::u16(*value),
            Operand::Port(port) => format!("({})", format::u8(*port)),
            _ => self.shape(),
        }
    }
}

/// An instruction produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// The mnemonic, e.g. `LD`
    pub mnemonic: &'static str,
    /// Operands in assembler order
    pub operands: Vec<Operand>,
    /// The offset of the first byte inside the image
    pub offset: usize,
    /// The memory address of the first byte
    pub address: u16,
    /// The amount of bytes the instruction occupies
    pub length: usize,
    /// Identity tag: the mnemonic with operand shapes, e.g. `LD A, n`
    pub uid: String,
}

impl DecodedInstruction {
    /// Create a new instruction and derive its identity tag.
    #[must_use]
    pub fn new(
        mnemonic: &'static str,
        operands: Vec<Operand>,
        offset: usize,
        address: u16,
        length: usize,
    ) -> Self {
        let uid = Self::join(mnemonic, operands.iter().map(Operand::shape));

        DecodedInstruction {
            mnemonic,
            operands,
            offset,
            address,
            length,
            uid,
        }
    }

    /// Render the instruction with addresses replaced by `labels` where available.
    ///
    /// ```rust
    /// use z80scope::disassembler::{DecodedInstruction, LabelMap, Operand};
    ///
    /// let call = DecodedInstruction::new("CALL", vec![Operand::Address(0x8010)], 0, 0x8000, 3);
    /// let mut labels = LabelMap::new();
    /// assert_eq!(call.render(&labels), "CALL $8010");
    ///
    /// labels.insert(0x8010, "fn0".to_string());
    /// assert_eq!(call.render(&labels), "CALL fn0");
    /// assert_eq!(call.uid, "CALL nn");
    /// ```
    #[must_use]
    pub fn render(&self, labels: &LabelMap) -> String {
        Self::join(
            self.mnemonic,
            self.operands.iter().map(|operand| operand.render(labels)),
        )
    }

    /// The offset of the byte following the instruction.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    fn join(mnemonic: &str, operands: impl Iterator<Item = String>) -> String {
        let operands: Vec<String> = operands.collect();
        if operands.is_empty() {
            mnemonic.to_string()
        } else {
            format!("{mnemonic} {}", operands.join(", "))
        }
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&LabelMap::new()))
    }
}
