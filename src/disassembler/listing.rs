//! Assembler-style rendering of a finished walk.
//!
//! Decoded instructions are printed in address order. Bytes between them are emitted as
//! `DS n` reservations, split at every known memory location so that each location gets a
//! line (and a label) of its own. Targets and memory locations are labelled per category:
//!
//! | Prefix | Meaning                                   |
//! |--------|-------------------------------------------|
//! | `fn`   | call targets                              |
//! | `jp`   | jump targets with an absolute reference   |
//! | `mp`   | confirmed or probable memory locations    |
//! | `re`   | jump targets only reached relatively      |
//!
//! Label indices are zero padded to the digit count of the largest index in their category.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use crate::{
    disassembler::{
        instruction::LabelMap,
        targets::TargetKind,
        walker::{DecompileWalker, SeenEntry},
    },
    utils::format,
    Result,
};

/// A contiguous run of memory locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// First address of the run
    pub start: u16,
    /// Amount of consecutive addresses
    pub length: usize,
}

/// How often an instruction identity tag was decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frequency {
    /// The identity tag, e.g. `LD A, n`
    pub uid: String,
    /// The amount of decoded instances
    pub count: usize,
}

/// The rendered listing together with the diagnostics collected while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// The listing, one line per entry
    pub lines: Vec<String>,
    /// Contiguous runs of all known memory locations, in or out of the image
    pub memory_regions: Vec<MemoryRegion>,
    /// Memory locations inside the image that did not get a line of their own
    pub missing_memory_locations: Vec<u16>,
    /// Decode counts per identity tag, most frequent first
    pub frequencies: Vec<Frequency>,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Merge sorted addresses into contiguous runs.
fn memory_regions(addresses: &[u16]) -> Vec<MemoryRegion> {
    let mut regions: Vec<MemoryRegion> = Vec::new();
    for &address in addresses {
        match regions.last_mut() {
            Some(region) if usize::from(region.start) + region.length == usize::from(address) => {
                region.length += 1;
            }
            _ => regions.push(MemoryRegion {
                start: address,
                length: 1,
            }),
        }
    }
    regions
}

/// The digit count of the largest index among `count` labels.
fn label_width(count: usize) -> usize {
    (count as i64 - 1).to_string().len()
}

fn assign_labels(labels: &mut LabelMap, prefix: &str, addresses: &[u16]) {
    let width = label_width(addresses.len());
    for (index, address) in addresses.iter().enumerate() {
        labels.insert(*address, format!("{prefix}{index:0width$}"));
    }
}

fn label_at(labels: &LabelMap, address: u16) -> &str {
    labels.get(&address).map_or("", String::as_str)
}

/// Row formatter bound to the image of a walk.
struct Rows<'w> {
    image: &'w [u8],
    load_address: u16,
    preview: usize,
    lines: Vec<String>,
}

impl Rows<'_> {
    fn meta(&mut self, content: &str) {
        self.lines.push(format!("{:7} {:<40}", "", content));
    }

    fn row(&mut self, label: &str, content: &str, offset: usize, length: usize) {
        let shown = length.min(self.preview);
        let end = (offset + shown).min(self.image.len());
        let mut bytes = format::u8r(self.image.get(offset..end).unwrap_or_default());
        if length > self.preview {
            bytes.push_str("...");
        }

        self.lines.push(format!(
            "{:<7} {:<16} ; {:<14} @{}",
            label,
            content,
            bytes,
            format::u16r(self.load_address.wrapping_add(offset as u16))
        ));
    }

    /// A reservation of `length` bytes, continued on unlabelled rows every `preview` bytes.
    fn block(&mut self, label: &str, offset: usize, length: usize) {
        let step = self.preview.max(1);
        let content = format!("DS {length}");
        for i in (0..length).step_by(step) {
            let part = (length - i).min(step);
            if i == 0 {
                self.row(label, &content, offset, part);
            } else {
                self.row("", "", offset + i, part);
            }
        }
    }
}

impl DecompileWalker<'_> {
    /// Render the decoded code as an assembler listing.
    ///
    /// The listing starts with an `ORG` line for the first decoded instruction and ends with
    /// the last one; bytes after it are not listed. Memory locations that could not be given
    /// a line of their own are reported in [`Listing::missing_memory_locations`].
    ///
    /// ```rust
    /// use z80scope::disassembler::DecompileWalker;
    ///
    /// // JR $8003 ; DB ; RET
    /// let image = [0x18, 0x01, 0xFF, 0xC9];
    /// let mut walker = DecompileWalker::new(&image, 0x8000, 0x8000)?;
    /// walker.run()?;
    ///
    /// let listing = walker.dump()?;
    /// assert_eq!(listing.lines[0].trim_end(), "        ORG $8000");
    /// assert_eq!(listing.lines[1], "        JR re0           ; 18 01          @8000");
    /// assert_eq!(listing.lines[2], "        DS 1             ; ff             @8002");
    /// assert_eq!(listing.lines[3], "re0     RET              ; c9             @8003");
    /// # Ok::<(), z80scope::Error>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`crate::Error::CorruptDiscovery`] if two decoded instructions overlap.
    pub fn dump(&self) -> Result<Listing> {
        let context = self.context();
        let load_address = context.load_address();
        let in_range = |address: &u16| context.in_range(*address);

        let all_memory = context.memory_locations().all();
        let memory_regions = memory_regions(&all_memory);
        let memory_in_range: Vec<u16> = all_memory.iter().copied().filter(in_range).collect();

        let targets = context.targets().sorted();
        let select = |keep: &dyn Fn(TargetKind, bool) -> bool| -> Vec<u16> {
            targets
                .iter()
                .filter(|(address, target)| {
                    in_range(address) && keep(target.kind, target.is_relative_only())
                })
                .map(|(address, _)| *address)
                .collect()
        };
        let functions = select(&|kind, _| kind == TargetKind::Function);
        let direct_jumps = select(&|kind, relative| kind == TargetKind::Jump && !relative);
        let relative_jumps = select(&|kind, relative| kind == TargetKind::Jump && relative);

        let mut labels = LabelMap::new();
        assign_labels(&mut labels, "fn", &functions);
        assign_labels(&mut labels, "jp", &direct_jumps);
        assign_labels(&mut labels, "mp", &memory_in_range);
        assign_labels(&mut labels, "re", &relative_jumps);

        let decoded: BTreeMap<usize, _> = self
            .seen()
            .iter()
            .filter_map(|(offset, entry)| match entry {
                SeenEntry::Decoded(instruction) => Some((*offset, instruction)),
                _ => None,
            })
            .collect();

        let mut rows = Rows {
            image: self.image(),
            load_address,
            preview: context.options().preview_bytes,
            lines: Vec::new(),
        };
        let origin = decoded
            .keys()
            .next()
            .map_or(load_address, |offset| context.address_of(*offset));
        rows.meta(&format!("ORG {}", format::addr(origin)));

        let mut seen_memory = BTreeSet::new();
        let mut stats: HashMap<&str, usize> = HashMap::new();
        let mut offset = 0;

        for (&start, instruction) in &decoded {
            if start < offset {
                return Err(corrupt_discovery_error!(
                    "{} at {} overlaps the instruction ending at {}",
                    instruction,
                    format::addr(instruction.address),
                    format::addr(context.address_of(offset))
                ));
            }

            if start > offset {
                let gap: Vec<usize> = memory_in_range
                    .iter()
                    .map(|address| usize::from(address.wrapping_sub(load_address)))
                    .filter(|location| (offset..start).contains(location))
                    .collect();

                for (i, &location) in gap.iter().enumerate() {
                    if location > offset {
                        rows.block("", offset, location - offset);
                        offset = location;
                    }
                    seen_memory.insert(context.address_of(location));

                    let label = label_at(&labels, context.address_of(offset));
                    let next_point = gap.get(i + 1).copied().unwrap_or(start);
                    if offset + 1 < next_point {
                        rows.block(label, offset, next_point - offset);
                        offset = next_point;
                    } else {
                        rows.row(label, "DS 1", offset, 1);
                        offset += 1;
                    }
                }

                if start > offset {
                    rows.block("", offset, start - offset);
                }
            }

            rows.row(
                label_at(&labels, instruction.address),
                &instruction.render(&labels),
                start,
                instruction.length,
            );
            *stats.entry(instruction.uid.as_str()).or_default() += 1;
            offset = start + instruction.length;
        }

        let missing_memory_locations: Vec<u16> = memory_in_range
            .iter()
            .copied()
            .filter(|address| !seen_memory.contains(address))
            .collect();
        if !missing_memory_locations.is_empty() {
            log::warn!(
                "Missing memory locations (>= {} and < {}): {}",
                format::addr(load_address),
                format::addr(context.address_of(self.image().len())),
                missing_memory_locations
                    .iter()
                    .map(|address| format::addr(*address))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let mut frequencies: Vec<Frequency> = stats
            .into_iter()
            .map(|(uid, count)| Frequency {
                uid: uid.to_string(),
                count,
            })
            .collect();
        frequencies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.uid.cmp(&b.uid)));

        log::warn!("Dumping instruction frequency");
        for (rank, frequency) in frequencies.iter().enumerate() {
            log::info!("{} {}x {}", rank + 1, frequency.count, frequency.uid);
        }

        Ok(Listing {
            lines: rows.lines,
            memory_regions,
            missing_memory_locations,
            frequencies,
        })
    }
}
