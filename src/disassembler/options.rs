//! Walker configuration.

use bitflags::bitflags;

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
    /// Diagnostic channels that the walker reports through `log::debug!`
    pub struct DebugOptions : u8 {
        /// Trace target registration and automatic resumes
        const JUMP = 0x01;
        /// Print the machine state summary after every decode step
        const STATE = 0x02;
    }
}

/// Tunables of [`crate::disassembler::DecompileWalker`].
///
/// ```rust
/// use z80scope::disassembler::{DebugOptions, WalkerOptions};
///
/// let options = WalkerOptions {
///     debug: DebugOptions::JUMP,
///     ..WalkerOptions::default()
/// };
/// assert_eq!(options.preview_bytes, 4);
/// assert!(options.clear_registers_after_call);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerOptions {
    /// Enabled debug channels
    pub debug: DebugOptions,
    /// Raw bytes shown per listing row before the preview is cut with `...`
    pub preview_bytes: usize,
    /// Forget register values after `CALL` and `RST`, since the callee may change any of them
    pub clear_registers_after_call: bool,
}

impl Default for WalkerOptions {
    fn default() -> Self {
        WalkerOptions {
            debug: DebugOptions::empty(),
            preview_bytes: 4,
            clear_registers_after_call: true,
        }
    }
}
