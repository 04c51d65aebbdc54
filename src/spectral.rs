use std::cmp;
use std::ops::{Index, Range};

use crate::context::Context;
use crate::entropy::Bitstream;
use crate::error::{Error, Result};
use crate::huffman::HuffmanTable;
use crate::parser::{FrameInfo, ScanInfo};

/// Coefficient positions per data block.
const BLOCK_SIZE: usize = 64;

/// Decodes a JPEG signed amplitude: the top `count` bits of `pattern`, for
/// `count` in `1..=15`, MSB-first.
///
/// A leading 1 bit means the value is the bit pattern itself; a leading 0
/// means it is the pattern minus `2^count - 1`. Written branchlessly: a
/// flipped sign bit contributes +1 and a sign extension of `-2^count`.
pub fn amplitude(count: u8, pattern: u16) -> i16 {
    debug_assert!((1..16).contains(&count));

    let flip = i32::from(!(pattern >> 15) & 1);
    let magnitude = i32::from(pattern >> (16 - count));

    (magnitude + flip - (flip << count)) as i16
}

/// The spectral-coefficient store a decode accumulates into.
///
/// A 3-D array indexed by `(group, block, k)`: the MCU index, the block
/// within the interleaved MCU layout, and the coefficient position in
/// zig-zag order. Backed by one contiguous `i16` buffer that grows by whole
/// MCU groups as decoding proceeds; the group count is discovered by
/// draining each entropy-coded segment rather than from the frame geometry,
/// which is what lets a zero-height frame decode ahead of its DNL segment.
pub struct Spectra {
    storage: Vec<i16>,
    /// Element strides per group and per block.
    stride: (usize, usize),
}

struct ComponentPlan<'a> {
    blocks: usize,
    dc: Option<&'a HuffmanTable>,
    ac: Option<&'a HuffmanTable>,
}

impl Spectra {
    pub(crate) fn new(frame: &FrameInfo) -> Spectra {
        let blocks: usize = frame.components.iter().map(|c| c.blocks_per_mcu()).sum();

        Spectra {
            storage: Vec::new(),
            stride: (blocks * BLOCK_SIZE, BLOCK_SIZE),
        }
    }

    /// Number of MCU groups decoded so far.
    pub fn groups(&self) -> usize {
        self.storage.len() / self.stride.0
    }

    /// Number of blocks in each MCU group.
    pub fn blocks_per_group(&self) -> usize {
        self.stride.0 / self.stride.1
    }

    fn offset(&self, group: usize, block: usize, k: usize) -> usize {
        group * self.stride.0 + block * self.stride.1 + k
    }

    /// Zero-fills the backing buffer through MCU `group`.
    fn reserve(&mut self, group: usize) {
        let needed = (group + 1) * self.stride.0;
        if self.storage.len() < needed {
            self.storage.resize(needed, 0);
        }
    }

    /// Decodes one entropy-coded segment's worth of MCUs starting at group
    /// index `base`, draining the bitstream. Returns the next group index.
    pub(crate) fn decode_segment(
        &mut self,
        bitstream: &mut Bitstream,
        frame: &FrameInfo,
        scan: &ScanInfo,
        context: &Context,
        base: usize,
    ) -> Result<usize> {
        let mut plan = Vec::with_capacity(scan.components.len());
        for (component, selector) in frame.components.iter().zip(&scan.components) {
            let dc = if scan.band.start == 0 {
                Some(context.dc_table(selector.dc_table_index).ok_or_else(|| {
                    Error::Syntax("scan references an unset dc huffman table".to_owned())
                })?)
            } else {
                None
            };
            let ac = if scan.band.end > 1 {
                Some(context.ac_table(selector.ac_table_index).ok_or_else(|| {
                    Error::Syntax("scan references an unset ac huffman table".to_owned())
                })?)
            } else {
                None
            };

            plan.push(ComponentPlan {
                blocks: component.blocks_per_mcu(),
                dc,
                ac,
            });
        }

        // Section G.1.2.2: an end-of-band run spans blocks, but not segments.
        let mut eob_run = 0u16;
        let mut group = base;

        while bitstream.front().is_some() {
            self.reserve(group);

            let mut block = 0;
            for component in &plan {
                for _ in 0..component.blocks {
                    self.decode_block(
                        bitstream,
                        group,
                        block,
                        &scan.band,
                        scan.exponent,
                        component,
                        &mut eob_run,
                    )?;
                    block += 1;
                }
            }

            group += 1;
        }

        Ok(group)
    }

    fn decode_block(
        &mut self,
        bitstream: &mut Bitstream,
        group: usize,
        block: usize,
        band: &Range<u8>,
        exponent: u8,
        tables: &ComponentPlan<'_>,
        eob_run: &mut u16,
    ) -> Result<()> {
        if let Some(dc_table) = tables.dc {
            // Section F.2.2.1: the symbol is the bit count of the DC
            // difference; the difference itself follows raw. A reserved
            // codeword here means corrupt or truncated data.
            let entry = dc_table
                .decode(bitstream.window())
                .ok_or_else(reserved_codeword)?;
            bitstream.pop(entry.length);

            let size = entry.value;
            if size > 15 {
                return Err(Error::Syntax(format!("dc difference of {} bits", size)));
            }
            if size > 0 {
                let difference = amplitude(size, bitstream.window());
                bitstream.pop(size);

                let offset = self.offset(group, block, 0);
                self.storage[offset] |= ((i32::from(difference)) << exponent) as i16;
            }
        }

        let ac_table = match tables.ac {
            Some(table) => table,
            None => return Ok(()),
        };

        if *eob_run > 0 {
            *eob_run -= 1;
            return Ok(());
        }

        // Section F.1.2.2.1: run of zeroes in the high nibble, amplitude bit
        // count in the low nibble. The reserved codeword acts as an
        // end-of-block sentinel, which also ends the block cleanly when the
        // segment runs into its all-ones padding.
        let mut k = cmp::max(band.start, 1);
        while k < band.end {
            let entry = match ac_table.decode(bitstream.window()) {
                Some(entry) => entry,
                // Benign at the segment's all-ones padding; corrupt data
                // anywhere else.
                None if bitstream.front().is_none() => break,
                None => return Err(reserved_codeword()),
            };
            bitstream.pop(entry.length);

            let run = entry.value >> 4;
            let size = entry.value & 0x0F;

            if size == 0 {
                if run == 15 {
                    // ZRL: sixteen zero coefficients.
                    k = k.saturating_add(16);
                    continue;
                }

                *eob_run = (1 << run) - 1;
                if run > 0 {
                    let extra = bitstream.window() >> (16 - run);
                    bitstream.pop(run);
                    *eob_run += extra;
                }
                break;
            }

            k += run;
            if k >= band.end {
                break;
            }

            let value = amplitude(size, bitstream.window());
            bitstream.pop(size);

            let offset = self.offset(group, block, usize::from(k));
            self.storage[offset] |= ((i32::from(value)) << exponent) as i16;
            k += 1;
        }

        Ok(())
    }
}

fn reserved_codeword() -> Error {
    Error::Syntax("reserved huffman codeword in entropy-coded data".to_owned())
}

impl Index<(usize, usize, usize)> for Spectra {
    type Output = i16;

    fn index(&self, (group, block, k): (usize, usize, usize)) -> &i16 {
        &self.storage[self.offset(group, block, k)]
    }
}

#[cfg(test)]
mod tests {
    use super::{amplitude, Spectra, BLOCK_SIZE};
    use crate::parser::parse_sof;

    #[test]
    fn amplitude_decodes_both_signs() {
        assert_eq!(amplitude(5, 0b1011_0000_0000_0000), 22);
        assert_eq!(amplitude(5, 0b0100_1000_0000_0000), -22);
    }

    #[test]
    fn amplitude_extremes() {
        assert_eq!(amplitude(1, 0b1000_0000_0000_0000), 1);
        assert_eq!(amplitude(1, 0b0000_0000_0000_0000), -1);
        assert_eq!(amplitude(15, 0xFFFE), 0x7FFF);
        assert_eq!(amplitude(15, 0x0000), -0x7FFF);
        // Trailing window bits do not affect the value.
        assert_eq!(amplitude(3, 0b1010_1111_1111_1111), 5);
    }

    #[test]
    fn layout_follows_sampling_factors() {
        // 2x2 luma + two 1x1 chroma components: 6 blocks per MCU.
        let frame = parse_sof(
            0,
            &[8, 0, 16, 0, 16, 3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1],
        )
        .unwrap();
        let mut spectra = Spectra::new(&frame);
        assert_eq!(spectra.blocks_per_group(), 6);
        assert_eq!(spectra.groups(), 0);

        spectra.reserve(1);
        assert_eq!(spectra.groups(), 2);
        assert_eq!(spectra.storage.len(), 2 * 6 * BLOCK_SIZE);
    }

    #[test]
    fn indexing_uses_group_and_block_strides() {
        let frame = parse_sof(0, &[8, 0, 8, 0, 8, 1, 1, 0x21, 0]).unwrap();
        let mut spectra = Spectra::new(&frame);
        spectra.reserve(2);

        let offset = spectra.offset(2, 1, 5);
        assert_eq!(offset, 2 * (2 * BLOCK_SIZE) + BLOCK_SIZE + 5);
        spectra.storage[offset] = -3;
        assert_eq!(spectra[(2, 1, 5)], -3);
        assert_eq!(spectra[(2, 1, 4)], 0);
    }
}
