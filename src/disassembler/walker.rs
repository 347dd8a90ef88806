//! Control flow discovery over a loaded image.
//!
//! The [`DecompileWalker`] decodes linearly from an entry point and follows unconditional
//! jumps. Whenever the current path ends (an unknown jump, code that was already decoded,
//! a decode failure or the end of the image), it resumes at the first recorded target that
//! has not been decoded yet, in the order the targets were discovered. The walk finishes
//! when no such target is left.
//!
//! # Example
//!
//! ```rust
//! use z80scope::disassembler::DecompileWalker;
//!
//! // LD A, $0A ; JR $ (back to itself)
//! let image = [0x3E, 0x0A, 0x18, 0xFE];
//! let mut walker = DecompileWalker::new(&image, 0x8000, 0x8000)?;
//!
//! let first = walker.decode()?.expect("an instruction");
//! assert_eq!(first.to_string(), "LD A, $0A");
//! assert_eq!(walker.run()?, 1);
//! assert!(walker.is_finished());
//! assert!(walker.targets().contains(0x8002));
//! # Ok::<(), z80scope::Error>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    disassembler::{
        context::DecodeContext,
        handlers::decode_instruction,
        instruction::DecodedInstruction,
        options::{DebugOptions, WalkerOptions},
        state::MachineState,
        targets::{TargetKind, TargetTable},
    },
    file::parser::Parser,
    utils::{format, VisitedMap},
    Error, Result,
};

/// What the walker recorded for an image offset it tried to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenEntry {
    /// A successfully decoded instruction
    Decoded(DecodedInstruction),
    /// A decode that failed after consuming `length` bytes
    Failed {
        /// Bytes consumed before the failure
        length: usize,
    },
    /// A decoded instruction that was dropped because it overlaps decoded code
    Discarded {
        /// Length of the dropped instruction
        length: usize,
    },
}

impl SeenEntry {
    /// The amount of bytes covered by the entry.
    #[must_use]
    pub fn length(&self) -> usize {
        match self {
            SeenEntry::Decoded(instruction) => instruction.length,
            SeenEntry::Failed { length } | SeenEntry::Discarded { length } => *length,
        }
    }

    /// The decoded instruction, if the decode succeeded.
    #[must_use]
    pub fn instruction(&self) -> Option<&DecodedInstruction> {
        match self {
            SeenEntry::Decoded(instruction) => Some(instruction),
            SeenEntry::Failed { .. } | SeenEntry::Discarded { .. } => None,
        }
    }
}

/// Addresses that were referenced but lie outside the image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutOfRange {
    /// Confirmed and probable memory locations
    pub memory_locations: Vec<u16>,
    /// Plain jump targets
    pub jumps: Vec<u16>,
    /// Call targets
    pub functions: Vec<u16>,
}

/// The control flow engine.
pub struct DecompileWalker<'a> {
    image: &'a [u8],
    parser: Parser<'a>,
    seen: BTreeMap<usize, SeenEntry>,
    visited: VisitedMap,
    entry_point: u16,
    finished: bool,
    last_end_point: usize,
    context: DecodeContext,
}

impl<'a> DecompileWalker<'a> {
    /// Create a walker with default options.
    ///
    /// # Arguments
    /// * `image`         - The raw bytes
    /// * `load_address`  - The address of the first byte
    /// * `entry_point`   - The address decoding starts at
    ///
    /// # Errors
    /// See [`DecompileWalker::with_options`].
    pub fn new(image: &'a [u8], load_address: u16, entry_point: u16) -> Result<Self> {
        Self::with_options(image, load_address, entry_point, WalkerOptions::default())
    }

    /// Create a walker.
    ///
    /// # Errors
    /// Returns [`Error::Empty`] for an empty image, [`Error::Malformed`] if the image does
    /// not fit between the load address and the end of the address space, and
    /// [`Error::InvalidAddress`] if the entry point lies outside the image.
    pub fn with_options(
        image: &'a [u8],
        load_address: u16,
        entry_point: u16,
        options: WalkerOptions,
    ) -> Result<Self> {
        if image.is_empty() {
            return Err(Error::Empty);
        }

        if usize::from(load_address) + image.len() > 0x1_0000 {
            return Err(malformed_error!(
                "Image of {} bytes does not fit at {}",
                image.len(),
                format::addr(load_address)
            ));
        }

        let context = DecodeContext::new(load_address, image.len(), options);
        let Some(offset) = context.offset_of(entry_point) else {
            return Err(Error::InvalidAddress(entry_point));
        };

        let mut parser = Parser::new(image);
        parser.seek(offset)?;

        Ok(DecompileWalker {
            image,
            parser,
            seen: BTreeMap::new(),
            visited: VisitedMap::new(image.len()),
            entry_point,
            finished: false,
            last_end_point: 0,
            context,
        })
    }

    /// Decode the next instruction on the walk.
    ///
    /// Returns `Ok(None)` once the walk is finished. Decode failures are recorded in
    /// [`DecompileWalker::seen`] and the walk continues at the next unexplored target.
    ///
    /// # Errors
    /// Only fails if the walker reaches a position it cannot seek to, which indicates
    /// corrupted discovery tables.
    pub fn decode(&mut self) -> Result<Option<DecodedInstruction>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            let start = self.parser.pos();
            if start >= self.image.len()
                || self.seen.contains_key(&start)
                || self.visited.get(start)
            {
                self.resume()?;
                continue;
            }

            let instruction = match decode_instruction(&mut self.parser, &mut self.context) {
                Ok(instruction) => instruction,
                Err(error) => {
                    if !matches!(error, Error::OutOfBounds) {
                        log::warn!(
                            "Decode failed at {}: {}",
                            format::addr(self.context.address_of(start)),
                            error
                        );
                    }

                    let length = self.parser.pos().saturating_sub(start);
                    self.seen.insert(start, SeenEntry::Failed { length });
                    self.resume()?;
                    continue;
                }
            };

            if self.visited.any_in_range(start, instruction.length) {
                log::warn!(
                    "Discarding {} at {}, it overlaps decoded code",
                    instruction,
                    format::addr(instruction.address)
                );
                self.seen.insert(
                    start,
                    SeenEntry::Discarded {
                        length: instruction.length,
                    },
                );
                self.resume()?;
                continue;
            }

            self.visited.set_range(start, instruction.length);
            self.last_end_point = self.parser.pos();
            self.seen
                .insert(start, SeenEntry::Decoded(instruction.clone()));

            if self.context.options().debug.contains(DebugOptions::STATE) {
                log::debug!(
                    "{} {}: {}",
                    format::addr(instruction.address),
                    instruction,
                    self.context.state()
                );
            }

            let mut unknown = self.context.unknown_jump();
            if let Some(target) = self.context.jump_to() {
                if self.context.in_range(target) {
                    self.enter(target)?;
                } else {
                    unknown = true;
                }
            }

            let next = self.parser.pos();
            if unknown
                || next >= self.image.len()
                || self.seen.contains_key(&next)
                || self.visited.get(next)
            {
                self.resume()?;
            }

            return Ok(Some(instruction));
        }
    }

    /// Decode until the walk is finished, returning the amount of decoded instructions.
    ///
    /// # Errors
    /// See [`DecompileWalker::decode`].
    pub fn run(&mut self) -> Result<usize> {
        let mut count = 0;
        while self.decode()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Continue at the first discovered target that was not decoded yet.
    fn resume(&mut self) -> Result<()> {
        let next = self.context.targets().discovery_order().find(|&address| {
            self.context
                .offset_of(address)
                .is_some_and(|offset| !self.seen.contains_key(&offset) && !self.visited.get(offset))
        });

        match next {
            Some(address) => {
                if self.context.options().debug.contains(DebugOptions::JUMP) {
                    log::debug!("Auto-jump {}", format::addr(address));
                }
                self.enter(address)
            }
            None => {
                self.finished = true;
                Ok(())
            }
        }
    }

    /// Move the cursor to `address` with no register knowledge.
    fn enter(&mut self, address: u16) -> Result<()> {
        let offset = self
            .context
            .offset_of(address)
            .ok_or(Error::InvalidAddress(address))?;

        self.parser.seek(offset)?;
        self.context.memory_locations_mut().discard_probable(address);
        self.context.state_mut().clear_registers();
        self.entry_point = address;
        Ok(())
    }

    /// Restart the walk at `address`, clearing all register knowledge.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if the address lies outside the image.
    pub fn set_entry_point(&mut self, address: u16) -> Result<()> {
        self.enter(address)?;
        self.finished = false;
        Ok(())
    }

    /// Returns `true` once no unexplored target is left.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Where the current linear run started.
    #[must_use]
    pub fn entry_point(&self) -> u16 {
        self.entry_point
    }

    /// The image offset of the most recently attempted instruction.
    #[must_use]
    pub fn start_point(&self) -> usize {
        self.context.start_point()
    }

    /// The image offset after the most recently decoded instruction.
    #[must_use]
    pub fn last_end_point(&self) -> usize {
        self.last_end_point
    }

    /// The raw image.
    #[must_use]
    pub fn image(&self) -> &'a [u8] {
        self.image
    }

    /// The address of the first byte of the image.
    #[must_use]
    pub fn load_address(&self) -> u16 {
        self.context.load_address()
    }

    /// Every attempted decode, keyed by image offset.
    #[must_use]
    pub fn seen(&self) -> &BTreeMap<usize, SeenEntry> {
        &self.seen
    }

    /// The image offsets and consumed lengths of failed decodes.
    #[must_use]
    pub fn failed_decodes(&self) -> Vec<(usize, usize)> {
        self.seen
            .iter()
            .filter_map(|(offset, entry)| match entry {
                SeenEntry::Failed { length } => Some((*offset, *length)),
                _ => None,
            })
            .collect()
    }

    /// The jump and call targets discovered so far.
    #[must_use]
    pub fn targets(&self) -> &TargetTable {
        self.context.targets()
    }

    /// Addresses known to be accessed as data.
    #[must_use]
    pub fn memory_locations(&self) -> &BTreeSet<u16> {
        self.context.memory_locations().confirmed()
    }

    /// Addresses that were loaded into `HL` and might be data.
    #[must_use]
    pub fn probable_addresses(&self) -> &BTreeSet<u16> {
        self.context.memory_locations().probable()
    }

    /// The decode context shared with the handlers.
    #[must_use]
    pub fn context(&self) -> &DecodeContext {
        &self.context
    }

    /// The current machine state.
    #[must_use]
    pub fn state(&self) -> &MachineState {
        self.context.state()
    }

    /// Mutable access to the machine state, e.g. to seed known register values.
    pub fn state_mut(&mut self) -> &mut MachineState {
        self.context.state_mut()
    }

    /// The referenced addresses that lie outside the image, sorted.
    #[must_use]
    pub fn out_of_range_content(&self) -> OutOfRange {
        let outside = |address: &u16| !self.context.in_range(*address);
        let targets = self.context.targets().sorted();
        let of_kind = |kind: TargetKind| {
            targets
                .iter()
                .filter(|(address, target)| target.kind == kind && outside(address))
                .map(|(address, _)| *address)
                .collect()
        };

        OutOfRange {
            memory_locations: self
                .context
                .memory_locations()
                .all()
                .into_iter()
                .filter(outside)
                .collect(),
            jumps: of_kind(TargetKind::Jump),
            functions: of_kind(TargetKind::Function),
        }
    }
}
