//! Discovery tables: branch targets and memory locations.

use std::collections::{BTreeSet, HashMap};

/// How a target was first reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TargetKind {
    /// Entered through `CALL` or `RST`
    #[strum(serialize = "fn")]
    Function,
    /// Entered through `JP`, `JR` or `DJNZ`
    #[strum(serialize = "j")]
    Jump,
}

/// The call sites that reference one target address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTarget {
    /// Addresses of relative branches to the target
    pub relative: Vec<u16>,
    /// Addresses of absolute branches and calls to the target
    pub direct: Vec<u16>,
    /// Fixed by the first reference
    pub kind: TargetKind,
}

impl JumpTarget {
    fn new(kind: TargetKind) -> Self {
        JumpTarget {
            relative: Vec::new(),
            direct: Vec::new(),
            kind,
        }
    }

    /// Returns `true` if the target is only ever reached through relative branches.
    #[must_use]
    pub fn is_relative_only(&self) -> bool {
        self.direct.is_empty()
    }
}

/// Every target address seen so far, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetTable {
    order: Vec<u16>,
    entries: HashMap<u16, JumpTarget>,
}

impl TargetTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a direct reference from `caller`. Returns `true` if the target is new.
    pub fn add_direct(&mut self, address: u16, kind: TargetKind, caller: u16) -> bool {
        let is_new = self.entry(address, kind);
        if let Some(target) = self.entries.get_mut(&address) {
            target.direct.push(caller);
        }
        is_new
    }

    /// Record a relative reference from `caller`. Returns `true` if the target is new.
    pub fn add_relative(&mut self, address: u16, caller: u16) -> bool {
        let is_new = self.entry(address, TargetKind::Jump);
        if let Some(target) = self.entries.get_mut(&address) {
            target.relative.push(caller);
        }
        is_new
    }

    fn entry(&mut self, address: u16, kind: TargetKind) -> bool {
        if self.entries.contains_key(&address) {
            return false;
        }

        self.entries.insert(address, JumpTarget::new(kind));
        self.order.push(address);
        true
    }

    /// Look up a target.
    #[must_use]
    pub fn get(&self, address: u16) -> Option<&JumpTarget> {
        self.entries.get(&address)
    }

    /// Returns `true` if the address has been recorded as a target.
    #[must_use]
    pub fn contains(&self, address: u16) -> bool {
        self.entries.contains_key(&address)
    }

    /// Number of distinct targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no target was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Target addresses in the order they were discovered.
    pub fn discovery_order(&self) -> impl Iterator<Item = u16> + '_ {
        self.order.iter().copied()
    }

    /// Targets sorted by address.
    #[must_use]
    pub fn sorted(&self) -> Vec<(u16, &JumpTarget)> {
        let mut targets: Vec<(u16, &JumpTarget)> = self
            .order
            .iter()
            .filter_map(|address| Some((*address, self.entries.get(address)?)))
            .collect();
        targets.sort_unstable_by_key(|(address, _)| *address);
        targets
    }
}

/// Confirmed and probable data addresses.
///
/// An address is in at most one of the two sets. Confirmed entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLocations {
    confirmed: BTreeSet<u16>,
    probable: BTreeSet<u16>,
}

impl MemoryLocations {
    /// Create empty sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirm an address as data, promoting it out of the probable set.
    pub fn confirm(&mut self, address: u16) {
        self.probable.remove(&address);
        self.confirmed.insert(address);
    }

    /// Suspect an address of being data. Confirmed addresses are left alone.
    pub fn suspect(&mut self, address: u16) {
        if !self.confirmed.contains(&address) {
            self.probable.insert(address);
        }
    }

    /// Drop a probable address, e.g. once it turns out to be code.
    pub fn discard_probable(&mut self, address: u16) -> bool {
        self.probable.remove(&address)
    }

    /// Confirmed data addresses.
    #[must_use]
    pub fn confirmed(&self) -> &BTreeSet<u16> {
        &self.confirmed
    }

    /// Probable data addresses.
    #[must_use]
    pub fn probable(&self) -> &BTreeSet<u16> {
        &self.probable
    }

    /// Returns `true` if the address is confirmed data.
    #[must_use]
    pub fn is_confirmed(&self, address: u16) -> bool {
        self.confirmed.contains(&address)
    }

    /// Confirmed and probable addresses merged, ascending.
    #[must_use]
    pub fn all(&self) -> Vec<u16> {
        let mut all: Vec<u16> = self.confirmed.union(&self.probable).copied().collect();
        all.sort_unstable();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_fixes_kind() {
        let mut table = TargetTable::new();

        assert!(table.add_direct(0x8010, TargetKind::Function, 0x8000));
        assert!(!table.add_direct(0x8010, TargetKind::Jump, 0x8003));
        assert!(!table.add_relative(0x8010, 0x8006));

        let target = table.get(0x8010).unwrap();
        assert_eq!(target.kind, TargetKind::Function);
        assert_eq!(target.direct, vec![0x8000, 0x8003]);
        assert_eq!(target.relative, vec![0x8006]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn discovery_and_sorted_order() {
        let mut table = TargetTable::new();
        table.add_relative(0x30, 0x00);
        table.add_direct(0x10, TargetKind::Jump, 0x02);
        table.add_direct(0x20, TargetKind::Function, 0x04);

        assert_eq!(table.discovery_order().collect::<Vec<_>>(), vec![0x30, 0x10, 0x20]);
        let sorted: Vec<u16> = table.sorted().iter().map(|(address, _)| *address).collect();
        assert_eq!(sorted, vec![0x10, 0x20, 0x30]);
        assert!(table.get(0x30).unwrap().is_relative_only());
        assert!(!table.get(0x10).unwrap().is_relative_only());
    }

    #[test]
    fn memory_promotion() {
        let mut memory = MemoryLocations::new();

        memory.suspect(0x5000);
        assert!(memory.probable().contains(&0x5000));

        memory.confirm(0x5000);
        assert!(memory.is_confirmed(0x5000));
        assert!(memory.probable().is_empty());

        memory.suspect(0x5000);
        assert!(memory.probable().is_empty());

        memory.suspect(0x4000);
        assert_eq!(memory.all(), vec![0x4000, 0x5000]);
        assert!(memory.discard_probable(0x4000));
        assert!(!memory.discard_probable(0x5000));
        assert!(memory.is_confirmed(0x5000));
    }
}
