//! The Z80 register catalog.
//!
//! Atomic registers ([`Register8`]) carry the actual storage. Compound registers ([`Register16`])
//! are views over two atomic halves, most-significant half first. `SP` has no architectural
//! 8-bit halves, so the catalog introduces the pseudo registers `S` and `P` for it; they are
//! never rendered as operands.

use strum::{Display, EnumCount, EnumIter};

/// An 8-bit register with independent storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount,
)]
#[allow(clippy::upper_case_acronyms)]
pub enum Register8 {
    /// Accumulator
    A,
    /// Flags
    F,
    /// High byte of `BC`
    B,
    /// Low byte of `BC`
    C,
    /// High byte of `DE`
    D,
    /// Low byte of `DE`
    E,
    /// High byte of `HL`
    H,
    /// Low byte of `HL`
    L,
    /// Interrupt vector
    I,
    /// Memory refresh counter
    R,
    /// High byte of `IX`
    IXH,
    /// Low byte of `IX`
    IXL,
    /// High byte of `IY`
    IYH,
    /// Low byte of `IY`
    IYL,
    /// High byte of `SP`
    S,
    /// Low byte of `SP`
    P,
}

impl Register8 {
    /// Every compound register that has `self` as one of its halves.
    #[must_use]
    pub fn compounds(self) -> &'static [Register16] {
        match self {
            Register8::A | Register8::F => &[Register16::AF],
            Register8::B | Register8::C => &[Register16::BC],
            Register8::D | Register8::E => &[Register16::DE],
            Register8::H | Register8::L => &[Register16::HL],
            Register8::S | Register8::P => &[Register16::SP],
            Register8::IXH | Register8::IXL => &[Register16::IX],
            Register8::IYH | Register8::IYL => &[Register16::IY],
            Register8::I | Register8::R => &[],
        }
    }

    /// Storage slot of the register inside [`crate::disassembler::MachineState`].
    #[must_use]
    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// A 16-bit register formed by two atomic registers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount,
)]
#[allow(clippy::upper_case_acronyms)]
pub enum Register16 {
    /// Accumulator and flags
    AF,
    /// `B` and `C`
    BC,
    /// `D` and `E`
    DE,
    /// `H` and `L`
    HL,
    /// Stack pointer
    SP,
    /// Index register `IX`
    IX,
    /// Index register `IY`
    IY,
}

impl Register16 {
    /// The atomic halves of the register, most-significant first.
    ///
    /// ```rust
    /// use z80scope::disassembler::{Register16, Register8};
    ///
    /// assert_eq!(Register16::HL.halves(), [Register8::H, Register8::L]);
    /// assert_eq!(Register16::IY.halves(), [Register8::IYH, Register8::IYL]);
    /// ```
    #[must_use]
    pub fn halves(self) -> [Register8; 2] {
        match self {
            Register16::AF => [Register8::A, Register8::F],
            Register16::BC => [Register8::B, Register8::C],
            Register16::DE => [Register8::D, Register8::E],
            Register16::HL => [Register8::H, Register8::L],
            Register16::SP => [Register8::S, Register8::P],
            Register16::IX => [Register8::IXH, Register8::IXL],
            Register16::IY => [Register8::IYH, Register8::IYL],
        }
    }
}

/// Either kind of register, as reported to machine state listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterRef {
    /// An 8-bit register
    Atomic(Register8),
    /// A 16-bit register
    Compound(Register16),
}

impl std::fmt::Display for RegisterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterRef::Atomic(register) => write!(f, "{register}"),
            RegisterRef::Compound(register) => write!(f, "{register}"),
        }
    }
}

impl From<Register8> for RegisterRef {
    fn from(register: Register8) -> Self {
        RegisterRef::Atomic(register)
    }
}

impl From<Register16> for RegisterRef {
    fn from(register: Register16) -> Self {
        RegisterRef::Compound(register)
    }
}

/// Branch conditions, in `cc` field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
#[allow(clippy::upper_case_acronyms)]
pub enum Condition {
    /// Zero flag reset
    NZ,
    /// Zero flag set
    Z,
    /// Carry flag reset
    NC,
    /// Carry flag set
    C,
    /// Parity odd
    PO,
    /// Parity even
    PE,
    /// Sign positive
    P,
    /// Sign negative
    M,
}

impl Condition {
    /// Decode a 3-bit `cc` field. Only the low three bits are used.
    #[must_use]
    pub fn from_code(code: u8) -> Condition {
        match code & 0b111 {
            0 => Condition::NZ,
            1 => Condition::Z,
            2 => Condition::NC,
            3 => Condition::C,
            4 => Condition::PO,
            5 => Condition::PE,
            6 => Condition::P,
            _ => Condition::M,
        }
    }
}

/// The register that `HL` style opcodes address, as selected by the `DD`/`FD` prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[allow(clippy::upper_case_acronyms)]
pub enum IndexRegister {
    /// No prefix, `HL` and `(HL)`
    HL,
    /// `DD` prefix, `IX` and `(IX+d)`
    IX,
    /// `FD` prefix, `IY` and `(IY+d)`
    IY,
}

impl IndexRegister {
    /// The compound register behind the index.
    #[must_use]
    pub fn pair(self) -> Register16 {
        match self {
            IndexRegister::HL => Register16::HL,
            IndexRegister::IX => Register16::IX,
            IndexRegister::IY => Register16::IY,
        }
    }

    /// The register that replaces `H` in opcodes without memory operand.
    #[must_use]
    pub fn high(self) -> Register8 {
        self.pair().halves()[0]
    }

    /// The register that replaces `L` in opcodes without memory operand.
    #[must_use]
    pub fn low(self) -> Register8 {
        self.pair().halves()[1]
    }

    /// Returns `true` for `IX` and `IY`, whose memory operands carry a displacement byte.
    #[must_use]
    pub fn is_indexed(self) -> bool {
        self != IndexRegister::HL
    }

    /// The prefix byte that selects the register.
    #[must_use]
    pub fn prefix(self) -> Option<u8> {
        match self {
            IndexRegister::HL => None,
            IndexRegister::IX => Some(0xDD),
            IndexRegister::IY => Some(0xFD),
        }
    }
}
