//! The state that instruction handlers read and report into while decoding.
//!
//! A [`DecodeContext`] owns the discovery tables and the machine state of one walk. Handlers
//! see it for the duration of a single decode step and report branch targets, memory accesses
//! and register loads through it. The walker inspects the pending-jump and unknown-jump
//! markers after every step to decide where decoding continues.

use crate::{
    disassembler::{
        instruction::{DecodedInstruction, Operand},
        options::{DebugOptions, WalkerOptions},
        registers::{Register16, Register8},
        state::MachineState,
        targets::{MemoryLocations, TargetKind, TargetTable},
    },
    file::parser::Parser,
    utils::format,
};

/// Per-walk decode state shared with the handlers.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    load_address: u16,
    image_len: usize,
    start_point: usize,
    jump_to: Option<u16>,
    unknown_jump: bool,
    targets: TargetTable,
    memory: MemoryLocations,
    state: MachineState,
    options: WalkerOptions,
}

impl DecodeContext {
    /// Create a context for an image of `image_len` bytes mapped at `load_address`.
    #[must_use]
    pub fn new(load_address: u16, image_len: usize, options: WalkerOptions) -> Self {
        DecodeContext {
            load_address,
            image_len,
            start_point: 0,
            jump_to: None,
            unknown_jump: false,
            targets: TargetTable::new(),
            memory: MemoryLocations::new(),
            state: MachineState::new(),
            options,
        }
    }

    /// Prepare a decode step starting at image offset `start_point`.
    pub fn begin(&mut self, start_point: usize) {
        self.start_point = start_point;
        self.jump_to = None;
        self.unknown_jump = false;
    }

    /// Build the instruction that spans from the step's start point to the parser position.
    #[must_use]
    pub fn finish(
        &self,
        parser: &Parser<'_>,
        mnemonic: &'static str,
        operands: Vec<Operand>,
    ) -> DecodedInstruction {
        DecodedInstruction::new(
            mnemonic,
            operands,
            self.start_point,
            self.instruction_address(),
            parser.pos().saturating_sub(self.start_point),
        )
    }

    /// The address the image is mapped at.
    #[must_use]
    pub fn load_address(&self) -> u16 {
        self.load_address
    }

    /// The image offset of the instruction being decoded.
    #[must_use]
    pub fn start_point(&self) -> usize {
        self.start_point
    }

    /// The memory address of the instruction being decoded.
    #[must_use]
    pub fn instruction_address(&self) -> u16 {
        self.address_of(self.start_point)
    }

    /// The memory address of an image offset.
    #[must_use]
    pub fn address_of(&self, offset: usize) -> u16 {
        self.load_address.wrapping_add(offset as u16)
    }

    /// The image offset of a memory address, if it lies inside the image.
    #[must_use]
    pub fn offset_of(&self, address: u16) -> Option<usize> {
        let offset = usize::from(address.checked_sub(self.load_address)?);
        (offset < self.image_len).then_some(offset)
    }

    /// Returns `true` if the address lies inside the loaded image.
    #[must_use]
    pub fn in_range(&self, address: u16) -> bool {
        self.offset_of(address).is_some()
    }

    /// The unconditional jump destination set by the current step.
    #[must_use]
    pub fn jump_to(&self) -> Option<u16> {
        self.jump_to
    }

    /// Returns `true` if the current step left to an unknown destination.
    #[must_use]
    pub fn unknown_jump(&self) -> bool {
        self.unknown_jump
    }

    /// Flag that execution leaves to an unknown destination.
    pub fn set_unknown_jump(&mut self) {
        self.unknown_jump = true;
    }

    /// Record a direct reference to `address` from the current instruction.
    pub fn add_target(&mut self, address: u16, kind: TargetKind) {
        if self.options.debug.contains(DebugOptions::JUMP) {
            log::debug!("JT {}", format::addr(address));
        }

        let caller = self.instruction_address();
        if self.targets.add_direct(address, kind, caller) {
            self.report_new_target(address);
        }
    }

    /// Record a relative reference `displacement` bytes from the start of the current
    /// instruction, returning the target address.
    pub fn add_target_rel(&mut self, displacement: i32) -> u16 {
        let caller = self.instruction_address();
        let address = caller.wrapping_add(displacement as u16);
        if self.options.debug.contains(DebugOptions::JUMP) {
            log::debug!(
                "JTR {}{} -> {}",
                format::addr(caller),
                format::rel(displacement),
                format::addr(address)
            );
        }

        if self.targets.add_relative(address, caller) {
            self.report_new_target(address);
        }
        address
    }

    fn report_new_target(&self, address: u16) {
        if !self.in_range(address) {
            log::warn!(
                "Jump target {} is out of range of the image at {}..{}",
                format::addr(address),
                format::addr(self.load_address),
                format::addr(self.address_of(self.image_len.saturating_sub(1)))
            );
        }
    }

    /// Record an unconditional absolute jump.
    pub fn add_jump_to(&mut self, address: u16) {
        self.add_target(address, TargetKind::Jump);
        self.jump_to = Some(address);
    }

    /// Record an unconditional relative jump.
    pub fn add_jump_to_rel(&mut self, displacement: i32) {
        self.jump_to = Some(self.add_target_rel(displacement));
    }

    /// Record a jump through a register, which is only followed if its value is known.
    pub fn add_jump_to_register(&mut self, register: Register16) {
        match self.state.get_compound(register) {
            Some(address) => self.add_jump_to(address),
            None => self.unknown_jump = true,
        }
    }

    /// Record an address that is read or written as data.
    pub fn add_memory_location(&mut self, address: u16) {
        self.memory.confirm(address);
    }

    /// Load a known 16-bit value into a register and apply the address heuristics: a value
    /// in `HL` might be an address, a value in `IX`, `IY` or `SP` is one.
    pub fn store_register16(&mut self, register: Register16, value: u16) {
        self.state.store_compound(register, Some(value));

        match register {
            Register16::HL => {
                if !self.memory.is_confirmed(value) && !self.targets.contains(value) {
                    self.memory.suspect(value);
                }
            }
            Register16::IX | Register16::IY | Register16::SP => self.memory.confirm(value),
            _ => {}
        }
    }

    /// Store a 16-bit value that may be unknown. Known values go through
    /// [`DecodeContext::store_register16`], so every path that writes a pair sees the
    /// address heuristics.
    pub fn store_compound(&mut self, register: Register16, value: Option<u16>) {
        match value {
            Some(value) => self.store_register16(register, value),
            None => self.state.clear_compound(register),
        }
    }

    /// Read a byte of memory through a register and the given displacement, confirming the
    /// location when the register value is known. Returns the effective address.
    pub fn touch_memory(&mut self, pointer: Register16, displacement: i8) -> Option<u16> {
        let address = self
            .state
            .get_compound(pointer)?
            .wrapping_add_signed(i16::from(displacement));
        self.memory.confirm(address);
        Some(address)
    }

    /// The known byte at `address`, if any.
    #[must_use]
    pub fn memory_byte(&self, address: Option<u16>) -> Option<u8> {
        address
            .and_then(|address| self.state.get_memory_bytes(address, 1, 0))
            .map(|value| value as u8)
    }

    /// Store a byte of memory, if the address is known.
    pub fn store_memory_byte(&mut self, address: Option<u16>, value: Option<u8>) {
        if let Some(address) = address {
            self.state
                .store_memory_bytes(address, value.map(u32::from), 1);
        }
    }

    /// Forget register values after a call, when configured to.
    pub fn after_call(&mut self) {
        if self.options.clear_registers_after_call {
            self.state.clear_registers();
        }
    }

    /// Mark the flag register as unknown.
    pub fn clobber_flags(&mut self) {
        self.state.clear_atomic(Register8::F);
    }

    /// The symbolic machine state.
    #[must_use]
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Mutable access to the symbolic machine state.
    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    /// The target table.
    #[must_use]
    pub fn targets(&self) -> &TargetTable {
        &self.targets
    }

    /// The memory location sets.
    #[must_use]
    pub fn memory_locations(&self) -> &MemoryLocations {
        &self.memory
    }

    pub(crate) fn memory_locations_mut(&mut self) -> &mut MemoryLocations {
        &mut self.memory
    }

    /// The options of the walk.
    #[must_use]
    pub fn options(&self) -> &WalkerOptions {
        &self.options
    }
}
