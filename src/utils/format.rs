//! Number formatting used by operand rendering and the listing.
//!
//! Operands use the `$` prefixed upper-case hex notation of Z80 assemblers (`$4000`, `$FF`),
//! while the listing columns use bare lower-case hex (`3e 42`, `@8000`).

/// Formats an absolute address as `$XXXX`.
#[must_use]
pub fn addr(value: u16) -> String {
    format!("${value:04X}")
}

/// Formats an 8-bit operand as `$XX`.
#[must_use]
pub fn u8(value: u8) -> String {
    format!("${value:02X}")
}

/// Formats a 16-bit operand as `$XXXX`.
#[must_use]
pub fn u16(value: u16) -> String {
    format!("${value:04X}")
}

/// Formats raw bytes as space separated lower-case hex pairs.
///
/// ```rust
/// use z80scope::utils::format::u8r;
///
/// assert_eq!(u8r(&[0x3e, 0x0a, 0xc9]), "3e 0a c9");
/// assert_eq!(u8r(&[]), "");
/// ```
#[must_use]
pub fn u8r(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a 16-bit value as four lower-case hex digits without prefix.
#[must_use]
pub fn u16r(value: u16) -> String {
    format!("{value:04x}")
}

/// Formats a signed offset with an explicit sign and a hex magnitude, `+$02` or `-$10`.
///
/// ```rust
/// use z80scope::utils::format::rel;
///
/// assert_eq!(rel(2), "+$02");
/// assert_eq!(rel(0), "+$00");
/// assert_eq!(rel(-126), "-$7E");
/// ```
#[must_use]
pub fn rel(value: i32) -> String {
    let sign = if value < 0 { '-' } else { '+' };
    format!("{sign}${:02X}", value.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses() {
        assert_eq!(addr(0), "$0000");
        assert_eq!(addr(0xBEEF), "$BEEF");
        assert_eq!(u16(0x38), "$0038");
        assert_eq!(u8(0x0A), "$0A");
        assert_eq!(u16r(0x8A0F), "8a0f");
    }

    #[test]
    fn bytes() {
        assert_eq!(u8r(&[0xDD, 0xCB, 0x05, 0xC6]), "dd cb 05 c6");
        assert_eq!(u8r(&[0x00]), "00");
    }

    #[test]
    fn relative() {
        assert_eq!(rel(129), "+$81");
        assert_eq!(rel(-1), "-$01");
        assert_eq!(rel(-128), "-$80");
        assert!(rel(-5).starts_with('-'));
    }
}
