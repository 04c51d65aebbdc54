use crate::error::{Error, Result};

/// One decoded codeword: the symbol it carries and the codeword length in
/// bits. Popping `length` bits off the bitstream consumes the codeword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    /// The symbol value the codeword maps to.
    pub value: u8,
    /// The codeword length, in `1..=16`.
    pub length: u8,
}

/// The two table classes a DHT segment can define.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HuffmanTableClass {
    /// DC difference magnitudes.
    DC,
    /// AC run/size pairs.
    AC,
}

/// A canonical JPEG Huffman table, flattened into a two-level lookup.
///
/// JPEG codewords are at most 16 bits and canonically ordered, which packs
/// all codes of 8 bits or fewer to the left of the 8-bit prefix space. The
/// first `n` slots of `storage` cover those prefixes directly; each of the
/// remaining prefixes owns a contiguous 256-entry subtable, so the slot for
/// a long codeword `c` sits at `c - 255 * n`. A decode is a single indexed
/// load either way, with no bit-by-bit tree walk.
pub struct HuffmanTable {
    storage: Vec<Entry>,
    /// Count of level-0 slots, each covering a 256-codeword slice.
    n: usize,
    /// One past the largest 16-bit codeword that maps into `storage`; the
    /// reserved all-ones codeword is always at or above this.
    bound: usize,
}

impl HuffmanTable {
    /// Builds a table from the 16 per-length leaf counts and the leaf values
    /// in canonical order, as serialized in a DHT segment.
    pub fn new(counts: &[u8; 16], values: &[u8]) -> Result<HuffmanTable> {
        let total: usize = counts.iter().map(|&count| usize::from(count)).sum();
        if total != values.len() {
            return Err(Error::InvalidHuffmanTable("leaf count does not match values"));
        }

        let (n, z) = precalculate(counts)
            .ok_or(Error::InvalidHuffmanTable("malformed code length histogram"))?;

        // The shadow tracks how many slots one codeword of the current
        // length covers: the high byte spans the level-0 table (a 1-bit code
        // covers 128 of its 256 slots), the low byte spans a 256-entry
        // subtable, and the level-8 transition falls out of the right shift.
        let mut storage = Vec::with_capacity(z);
        let mut shadow: u16 = 0x8080;
        let mut leaf = 0;

        for (level, &count) in counts.iter().enumerate() {
            let span = usize::from(shadow as u8);
            let length = level as u8 + 1;

            for _ in 0..count {
                let value = values[leaf];
                leaf += 1;

                let filled = storage.len() + span;
                storage.resize(filled, Entry { value, length });
            }

            shadow >>= 1;
        }

        debug_assert_eq!(storage.len(), z);

        Ok(HuffmanTable {
            storage,
            n,
            bound: z + n * 255,
        })
    }

    /// Looks up the codeword at the front of a 16-bit window (MSB-first,
    /// arbitrary trailing bits).
    ///
    /// Returns `None` for the reserved region at and above the table's upper
    /// bound: a well-formed stream never encodes there, so `None` means
    /// either corrupt data or the all-ones end-of-data padding.
    pub fn decode(&self, codeword: u16) -> Option<Entry> {
        let index = usize::from(codeword >> 8);

        if index < self.n {
            Some(self.storage[index])
        } else if usize::from(codeword) < self.bound {
            // Subtable `index` starts at `n + (index - n) * 256`, which
            // collapses to this offset arithmetic.
            Some(self.storage[usize::from(codeword) - 255 * self.n])
        } else {
            None
        }
    }
}

/// Walks the implied binary tree level by level, validating the leaf-count
/// histogram and sizing the flattened table.
///
/// Returns `(n, z)`: the number of level-0 slots covered by leaves after the
/// first 8 levels, and the total number of storage slots. `None` if the
/// histogram oversubscribes a level or saturates the tree (the all-ones
/// codeword must remain reserved).
fn precalculate(counts: &[u8; 16]) -> Option<(usize, usize)> {
    let mut internal: i32 = 1;
    let mut n = 0;
    let mut z = 0;

    for (level, &count) in counts.iter().enumerate() {
        internal = 2 * internal - i32::from(count);
        if internal < 0 {
            return None;
        }

        if level == 7 {
            n = 256 - internal as usize;
            z = n;
        } else if level > 7 {
            z += usize::from(count) << (15 - level);
        }
    }

    if internal == 0 {
        return None;
    }

    Some((n, z))
}
