//! Bitfield map for tracking which image bytes belong to a decoded region.
//!
//! The [`VisitedMap`] struct marks every byte covered by a decode attempt. The walker consults it
//! to avoid starting a new decode inside bytes that already belong to another instruction, which
//! keeps the regions recorded in the seen map disjoint.

const BITS: usize = u64::BITS as usize;

/// This structure tracks the bytes of the image that is being analysed, in order to avoid double
/// processing of the same locations.
#[derive(Debug, Clone)]
pub struct VisitedMap {
    data: Vec<u64>,
    elements: usize,
}

impl VisitedMap {
    /// Create a new instance of the `VisitedMap`
    ///
    /// ## Arguments
    /// * 'elements' - The amount of bytes to track
    pub fn new(elements: usize) -> VisitedMap {
        VisitedMap {
            data: vec![0_u64; elements.div_ceil(BITS)],
            elements,
        }
    }

    /// Returns the max amount of elements this instance can track
    pub fn len(&self) -> usize {
        self.elements
    }

    /// Check if the visited map is empty (has no trackable elements)
    pub fn is_empty(&self) -> bool {
        self.elements == 0
    }

    /// Check if a certain byte has already been visited. Bytes outside the map never are.
    ///
    /// # Arguments
    /// * 'element' - The byte that should be looked up
    pub fn get(&self, element: usize) -> bool {
        if element >= self.elements {
            return false;
        }

        self.data
            .get(element / BITS)
            .is_some_and(|word| (word >> (element % BITS)) & 1 != 0)
    }

    /// Returns `true` if any byte of `[element, element + len)` has been visited.
    ///
    /// # Arguments
    /// * 'element' - The first byte of the range
    /// * 'len'     - The length of the range
    pub fn any_in_range(&self, element: usize, len: usize) -> bool {
        let end = element.saturating_add(len).min(self.elements);
        (element..end).any(|e| self.get(e))
    }

    /// Mark `[element, element + len)` as visited. The part of the range outside the map is
    /// ignored.
    ///
    /// # Arguments
    /// * 'element' - The first byte to mark
    /// * 'len'     - The count of bytes to mark
    pub fn set_range(&mut self, element: usize, len: usize) {
        let end = element.saturating_add(len).min(self.elements);
        for e in element..end {
            if let Some(word) = self.data.get_mut(e / BITS) {
                *word |= 1_u64 << (e % BITS);
            }
        }
    }

    /// Returns the number of visited bytes.
    pub fn count(&self) -> usize {
        self.data.iter().map(|word| word.count_ones() as usize).sum()
    }
}
