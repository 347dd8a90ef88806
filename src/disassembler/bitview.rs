//! Bit-field view of an opcode byte.
//!
//! Z80 opcodes are organised in octal groups: `x` selects the quadrant, `y` and `z` pick the
//! operation or register, and `y` further splits into `p` and `q` for the 16-bit forms.
//!
//! ```text
//!  7 6 | 5 4 3 | 2 1 0
//!   x  |   y   |   z
//!      | p   q |
//! ```

/// A decomposed opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitView {
    byte: u8,
}

impl BitView {
    /// Wrap an opcode byte.
    #[must_use]
    pub fn new(byte: u8) -> Self {
        BitView { byte }
    }

    /// The raw opcode byte.
    #[must_use]
    pub fn byte(self) -> u8 {
        self.byte
    }

    /// Bits 7-6.
    #[must_use]
    pub fn x(self) -> u8 {
        self.byte >> 6
    }

    /// Bits 5-3, the destination register field of two-register forms.
    #[must_use]
    pub fn y(self) -> u8 {
        (self.byte >> 3) & 0b111
    }

    /// Bits 2-0, the source register field of two-register forms.
    #[must_use]
    pub fn z(self) -> u8 {
        self.byte & 0b111
    }

    /// Bits 5-4.
    #[must_use]
    pub fn p(self) -> u8 {
        self.y() >> 1
    }

    /// Bit 3.
    #[must_use]
    pub fn q(self) -> u8 {
        self.y() & 1
    }

    /// Alias of [`BitView::y`].
    #[must_use]
    pub fn a3(self) -> u8 {
        self.y()
    }

    /// Alias of [`BitView::z`].
    #[must_use]
    pub fn b3(self) -> u8 {
        self.z()
    }
}

impl From<u8> for BitView {
    fn from(byte: u8) -> Self {
        BitView::new(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields() {
        // LD B, (HL)
        let view = BitView::new(0x46);
        assert_eq!(view.x(), 1);
        assert_eq!(view.y(), 0);
        assert_eq!(view.z(), 6);

        // ADD HL, SP
        let view = BitView::new(0x39);
        assert_eq!(view.x(), 0);
        assert_eq!(view.z(), 1);
        assert_eq!(view.p(), 3);
        assert_eq!(view.q(), 1);
        assert_eq!(view.a3(), view.y());
        assert_eq!(view.b3(), view.z());
        assert_eq!(view.byte(), 0x39);
    }
}
