//! Symbolic machine state used for constant propagation.
//!
//! The [`MachineState`] records which atomic registers and memory bytes hold a known constant.
//! Compound registers have no storage of their own; they are read and written through their
//! two halves. Every register write is reported to the registered listeners, once for the
//! register written and once for each register that overlaps it.
//!
//! Cloning a state forks the value stores while the clone keeps delivering to the same listener
//! list, so analysis can branch off a snapshot without losing observers.
//!
//! # Example
//!
//! ```rust
//! use z80scope::disassembler::{MachineState, Register16, Register8};
//!
//! let mut state = MachineState::new();
//! state.store_compound(Register16::HL, Some(0x4000));
//! assert_eq!(state.get_atomic(Register8::H), Some(0x40));
//!
//! state.clear_atomic(Register8::L);
//! assert_eq!(state.get_compound(Register16::HL), None);
//! assert_eq!(state.get_atomic(Register8::H), Some(0x40));
//! ```

use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use strum::{EnumCount, IntoEnumIterator};

use crate::disassembler::registers::{Register16, Register8, RegisterRef};

/// Notification delivered to listeners after a register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterStored {
    /// The register whose value changed
    pub register: RegisterRef,
    /// The new value, `None` when it is unknown
    pub value: Option<u16>,
}

/// Handle returned by [`MachineState::on_register_stored`].
pub type ListenerId = usize;

type Listener = Box<dyn FnMut(&RegisterStored)>;

#[derive(Default)]
struct Listeners {
    next_id: ListenerId,
    entries: Vec<(ListenerId, Listener)>,
}

/// Known register and memory values.
#[derive(Clone)]
pub struct MachineState {
    registers: [Option<u8>; Register8::COUNT],
    memory: BTreeMap<u16, u8>,
    listeners: Rc<RefCell<Listeners>>,
    changed: bool,
}

impl Default for MachineState {
    fn default() -> Self {
        MachineState {
            registers: [None; Register8::COUNT],
            memory: BTreeMap::new(),
            listeners: Rc::new(RefCell::new(Listeners::default())),
            changed: false,
        }
    }
}

impl MachineState {
    /// Create an empty state, where nothing is known.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for register writes.
    ///
    /// Listeners are shared with every clone of this state. A write made from inside a listener
    /// is applied but not reported again.
    pub fn on_register_stored<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&RegisterStored) + 'static,
    {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if the id was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _)| *entry != id);
        listeners.entries.len() != before
    }

    fn emit(&self, register: RegisterRef, value: Option<u16>) {
        let Ok(mut listeners) = self.listeners.try_borrow_mut() else {
            return;
        };

        let event = RegisterStored { register, value };
        for (_, listener) in &mut listeners.entries {
            listener(&event);
        }
    }

    /// Store an atomic register.
    pub fn store_atomic(&mut self, register: Register8, value: Option<u8>) {
        self.changed = true;
        self.registers[register.slot()] = value;

        self.emit(register.into(), value.map(u16::from));
        for compound in register.compounds() {
            self.emit((*compound).into(), self.get_compound(*compound));
        }
    }

    /// Store a compound register by writing both halves, most-significant first.
    pub fn store_compound(&mut self, register: Register16, value: Option<u16>) {
        self.changed = true;
        let bytes = value.map(u16::to_be_bytes);

        for (index, half) in register.halves().into_iter().enumerate() {
            let byte = bytes.map(|bytes| bytes[index]);
            self.registers[half.slot()] = byte;
            self.emit(half.into(), byte.map(u16::from));
        }
        self.emit(register.into(), value);
    }

    /// Mark an atomic register as unknown.
    pub fn clear_atomic(&mut self, register: Register8) {
        self.store_atomic(register, None);
    }

    /// Mark both halves of a compound register as unknown.
    pub fn clear_compound(&mut self, register: Register16) {
        self.store_compound(register, None);
    }

    /// Forget every register value. Memory knowledge is kept.
    pub fn clear_registers(&mut self) {
        self.changed = true;
        self.registers = [None; Register8::COUNT];
    }

    /// The value of an atomic register, if known.
    #[must_use]
    pub fn get_atomic(&self, register: Register8) -> Option<u8> {
        self.registers[register.slot()]
    }

    /// The value of a compound register, if both halves are known.
    #[must_use]
    pub fn get_compound(&self, register: Register16) -> Option<u16> {
        let [high, low] = register.halves();
        Some(u16::from_be_bytes([
            self.get_atomic(high)?,
            self.get_atomic(low)?,
        ]))
    }

    /// Read `length` bytes starting at `address + offset` as a little-endian value.
    ///
    /// Returns `None` if any byte is unknown or `length` is not within `1..=4`. Addresses wrap
    /// around at the end of the address space.
    #[must_use]
    pub fn get_memory_bytes(&self, address: u16, length: usize, offset: i16) -> Option<u32> {
        if !(1..=4).contains(&length) {
            return None;
        }

        let start = address.wrapping_add_signed(offset);
        let mut value = 0_u32;
        for index in 0..length {
            let byte = self.memory.get(&start.wrapping_add(index as u16))?;
            value |= u32::from(*byte) << (8 * index);
        }
        Some(value)
    }

    /// Write the low `length` bytes of `value` starting at `address`, little-endian. `None`
    /// marks the bytes as unknown.
    ///
    /// As with [`MachineState::get_memory_bytes`], `length` must be within `1..=4`; other
    /// lengths leave memory untouched.
    pub fn store_memory_bytes(&mut self, address: u16, value: Option<u32>, length: usize) {
        if !(1..=4).contains(&length) {
            return;
        }
        self.changed = true;

        for index in 0..length {
            let location = address.wrapping_add(index as u16);
            match value {
                Some(value) => {
                    self.memory.insert(location, (value >> (8 * index)) as u8);
                }
                None => {
                    self.memory.remove(&location);
                }
            }
        }
    }

    /// Returns `true` if anything was stored since the last [`MachineState::reset_changed`].
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Reset the change flag.
    pub fn reset_changed(&mut self) {
        self.changed = false;
    }

    /// Runs of known memory bytes as `(start, bytes)`.
    fn memory_runs(&self) -> Vec<(u16, Vec<u8>)> {
        let mut runs: Vec<(u16, Vec<u8>)> = Vec::new();
        for (address, byte) in &self.memory {
            match runs.last_mut() {
                Some((start, bytes))
                    if usize::from(*start) + bytes.len() == usize::from(*address) =>
                {
                    bytes.push(*byte);
                }
                _ => runs.push((*address, vec![*byte])),
            }
        }
        runs
    }
}

/// Hex dump of a byte run where five or more repeats of a byte are shortened to
/// `aaaa(...N*...)aaaa`.
fn byte_run(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        let repeat = bytes[index..].iter().take_while(|b| **b == byte).count();
        if repeat >= 5 {
            out.push_str(&format!(
                "{byte:02x}{byte:02x}(...{}*...){byte:02x}{byte:02x}",
                repeat - 4
            ));
        } else {
            for _ in 0..repeat {
                out.push_str(&format!("{byte:02x}"));
            }
        }
        index += repeat;
    }
    out
}

impl fmt::Display for MachineState {
    /// A one line summary of the known memory runs and register values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .memory_runs()
            .iter()
            .map(|(start, bytes)| format!("{start:x}={}", byte_run(bytes)))
            .collect();

        let mut covered = Vec::new();
        for compound in Register16::iter() {
            if let Some(value) = self.get_compound(compound) {
                parts.push(format!("{compound}={value:x}"));
                covered.extend(compound.halves());
            }
        }

        for register in Register8::iter() {
            if covered.contains(&register) {
                continue;
            }
            if let Some(value) = self.get_atomic(register) {
                parts.push(format!("{register}={value:x}"));
            }
        }

        if parts.is_empty() {
            write!(f, "initial state")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

impl fmt::Debug for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineState")
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}
