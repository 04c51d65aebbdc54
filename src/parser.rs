use std::ops::Range;

use crate::error::{Error, Result, UnsupportedFeature};
use crate::huffman::{HuffmanTable, HuffmanTableClass};

/// Frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Number of samples per line.
    pub width: u16,
    /// Number of lines. May be 0 at SOF time, to be supplied by a DNL
    /// segment after the first scan.
    pub height: u16,
}

/// The coding processes this decoder handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodingProcess {
    /// Baseline sequential DCT (SOF0).
    Baseline,
    /// Extended sequential DCT (SOF1).
    Extended,
    /// Progressive DCT (SOF2).
    Progressive,
}

/// One image component as declared by the frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Component {
    /// The component identifier, unique within a frame.
    pub identifier: u8,
    /// Horizontal sampling factor, in `1..=4`.
    pub horizontal_sampling_factor: u8,
    /// Vertical sampling factor, in `1..=4`.
    pub vertical_sampling_factor: u8,
    /// Quantization table slot this component dequantizes through, in `0..=3`.
    pub quantization_table_index: u8,
}

impl Component {
    /// Number of data blocks this component contributes to one interleaved
    /// MCU.
    pub fn blocks_per_mcu(&self) -> usize {
        usize::from(self.horizontal_sampling_factor) * usize::from(self.vertical_sampling_factor)
    }
}

/// A parsed frame header.
///
/// The height is the one mutable attribute: a frame may declare zero lines
/// and fix the real value with a DNL segment after its first scan.
#[derive(Clone, Debug)]
pub struct FrameInfo {
    /// The coding process selected by the SOF marker.
    pub coding_process: CodingProcess,
    /// Sample precision in bits, 8 or 12.
    pub precision: u8,
    /// Frame dimensions.
    pub image_size: Dimensions,
    /// The frame components, in declaration order.
    pub components: Vec<Component>,
}

impl FrameInfo {
    pub(crate) fn update_height(&mut self, height: u16) {
        self.image_size.height = height;
    }
}

/// JFIF pixel density units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityUnit {
    /// No unit; the densities specify the pixel aspect ratio only.
    PixelAspectRatio,
    /// Dots per inch.
    DotsPerInch,
    /// Dots per centimeter.
    DotsPerCm,
}

/// The metadata carried by a JFIF APP0 segment. Thumbnail data is skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JfifInfo {
    /// JFIF version as (major, minor); major is always 1.
    pub version: (u8, u8),
    /// Unit for the density fields.
    pub density_unit: DensityUnit,
    /// Horizontal and vertical pixel density.
    pub density: (u16, u16),
}

/// A dequantization table parsed from a DQT segment, in the 8- or 16-bit
/// element width the segment declared. Elements stay in zig-zag order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuantizationTable {
    /// 64 8-bit elements.
    Precision8([u8; 64]),
    /// 64 16-bit elements, read big-endian.
    Precision16([u16; 64]),
}

/// One component's entry in a scan header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanComponent {
    /// Identifier of a component declared by the frame header.
    pub identifier: u8,
    /// DC Huffman table slot, in `0..=3`.
    pub dc_table_index: u8,
    /// AC Huffman table slot, in `0..=3`.
    pub ac_table_index: u8,
}

/// A parsed scan header.
#[derive(Clone, Debug)]
pub struct ScanInfo {
    /// The components this scan carries, in scan order.
    pub components: Vec<ScanComponent>,
    /// Half-open range of spectral coefficient positions the scan carries;
    /// `0..64` for a sequential scan.
    pub band: Range<u8>,
    /// The successive-approximation point transform (Al): decoded
    /// coefficients are shifted left by this amount.
    pub exponent: u8,
}

/// Parses a JFIF APP0 payload.
pub fn parse_jfif(payload: &[u8]) -> Result<JfifInfo> {
    if payload.len() < 12 {
        return Err(Error::InvalidJfifHeader("payload too short"));
    }
    if &payload[..5] != b"JFIF\0" {
        return Err(Error::InvalidJfifHeader("missing JFIF identifier"));
    }

    let version = (payload[5], payload[6]);
    if version.0 != 1 || version.1 > 2 {
        return Err(Error::InvalidJfifHeader("unrecognized JFIF version"));
    }

    let density_unit = match payload[7] {
        0 => DensityUnit::PixelAspectRatio,
        1 => DensityUnit::DotsPerInch,
        2 => DensityUnit::DotsPerCm,
        unit => return Err(Error::Unsupported(UnsupportedFeature::DensityUnit(unit))),
    };

    Ok(JfifInfo {
        version,
        density_unit,
        density: (
            u16::from_be_bytes([payload[8], payload[9]]),
            u16::from_be_bytes([payload[10], payload[11]]),
        ),
    })
}

/// Parses an SOF payload into a frame header, rejecting the coding processes
/// this decoder does not handle.
///
/// `sof` is the low nibble of the SOF marker byte, e.g. 2 for SOF2.
pub fn parse_sof(sof: u8, payload: &[u8]) -> Result<FrameInfo> {
    let coding_process = match sof {
        0 => CodingProcess::Baseline,
        1 => CodingProcess::Extended,
        2 => CodingProcess::Progressive,
        3 => return Err(Error::Unsupported(UnsupportedFeature::Lossless)),
        9 | 10 | 11 => {
            return Err(Error::Unsupported(UnsupportedFeature::ArithmeticEntropyCoding))
        }
        5 | 6 | 7 | 13 | 14 | 15 => {
            return Err(Error::Unsupported(UnsupportedFeature::Hierarchical))
        }
        _ => return Err(Error::Syntax(format!("reserved marker FF {:02X}", 0xC0 + sof))),
    };

    if payload.len() < 6 {
        return Err(Error::InvalidFrameHeader("payload too short"));
    }

    let precision = payload[0];
    match (coding_process, precision) {
        (CodingProcess::Baseline, 8) => {}
        (CodingProcess::Extended, 8) | (CodingProcess::Extended, 12) => {}
        (CodingProcess::Progressive, 8) | (CodingProcess::Progressive, 12) => {}
        _ => return Err(Error::Unsupported(UnsupportedFeature::SamplePrecision(precision))),
    }

    let height = u16::from_be_bytes([payload[1], payload[2]]);
    let width = u16::from_be_bytes([payload[3], payload[4]]);

    let count = usize::from(payload[5]);
    if count == 0 {
        return Err(Error::InvalidFrameHeader("no components"));
    }
    if coding_process == CodingProcess::Progressive && count > 4 {
        return Err(Error::InvalidFrameHeader("progressive frame with more than 4 components"));
    }
    if payload.len() != 6 + 3 * count {
        return Err(Error::InvalidFrameHeader("payload length does not match component count"));
    }

    let mut components = Vec::with_capacity(count);
    for triple in payload[6..].chunks(3) {
        let identifier = triple[0];
        if components.iter().any(|c: &Component| c.identifier == identifier) {
            return Err(Error::InvalidFrameHeader("duplicate component identifier"));
        }

        let horizontal_sampling_factor = triple[1] >> 4;
        let vertical_sampling_factor = triple[1] & 0x0F;
        if !(1..=4).contains(&horizontal_sampling_factor)
            || !(1..=4).contains(&vertical_sampling_factor)
        {
            return Err(Error::InvalidFrameHeader("sampling factor out of range"));
        }

        let quantization_table_index = triple[2];
        if quantization_table_index > 3 {
            return Err(Error::InvalidFrameHeader("quantization table index out of range"));
        }

        components.push(Component {
            identifier,
            horizontal_sampling_factor,
            vertical_sampling_factor,
            quantization_table_index,
        });
    }

    Ok(FrameInfo {
        coding_process,
        precision,
        image_size: Dimensions { width, height },
        components,
    })
}

/// Parses an SOS payload into a scan header, validated against the frame it
/// belongs to.
pub fn parse_sos(payload: &[u8], frame: &FrameInfo) -> Result<ScanInfo> {
    if payload.is_empty() {
        return Err(Error::InvalidScanHeader("payload too short"));
    }

    let count = usize::from(payload[0]);
    if !(1..=4).contains(&count) {
        return Err(Error::InvalidScanHeader("component count out of range"));
    }
    if payload.len() != 1 + 2 * count + 3 {
        return Err(Error::InvalidScanHeader("payload length does not match component count"));
    }

    let mut components = Vec::with_capacity(count);
    for pair in payload[1..1 + 2 * count].chunks(2) {
        let identifier = pair[0];
        if !frame.components.iter().any(|c| c.identifier == identifier) {
            return Err(Error::InvalidScanHeader("component not declared by the frame"));
        }
        if components.iter().any(|c: &ScanComponent| c.identifier == identifier) {
            return Err(Error::InvalidScanHeader("duplicate component identifier"));
        }

        let dc_table_index = pair[1] >> 4;
        let ac_table_index = pair[1] & 0x0F;
        if dc_table_index > 3 || ac_table_index > 3 {
            return Err(Error::InvalidScanHeader("huffman table index out of range"));
        }

        components.push(ScanComponent {
            identifier,
            dc_table_index,
            ac_table_index,
        });
    }

    let start = payload[1 + 2 * count];
    let end = payload[2 + 2 * count];
    if start > 63 || end > 63 || end < start {
        return Err(Error::InvalidScanHeader("spectral selection out of range"));
    }

    let approximation = payload[3 + 2 * count];
    let high = approximation >> 4;
    let low = approximation & 0x0F;
    if high > 13 || low > 13 {
        return Err(Error::InvalidScanHeader("successive approximation out of range"));
    }

    Ok(ScanInfo {
        components,
        band: start..end + 1,
        exponent: low,
    })
}

/// Parses a DQT payload: a concatenation of tables, each a flags byte
/// (precision nibble, slot nibble) followed by 64 or 128 element bytes.
///
/// Returns `(slot, table)` pairs in payload order.
pub fn parse_dqt(payload: &[u8]) -> Result<Vec<(usize, QuantizationTable)>> {
    let mut tables = Vec::new();
    let mut rest = payload;

    while let Some((&flags, body)) = rest.split_first() {
        let slot = usize::from(flags & 0x0F);
        if slot > 3 {
            return Err(Error::InvalidQuantizationTable("slot out of range"));
        }

        let table = match flags >> 4 {
            0 => {
                if body.len() < 64 {
                    return Err(Error::InvalidQuantizationTable("payload runs short"));
                }
                let mut elements = [0u8; 64];
                elements.copy_from_slice(&body[..64]);
                rest = &body[64..];
                QuantizationTable::Precision8(elements)
            }
            1 => {
                if body.len() < 128 {
                    return Err(Error::InvalidQuantizationTable("payload runs short"));
                }
                let mut elements = [0u16; 64];
                for (element, pair) in elements.iter_mut().zip(body.chunks(2)) {
                    *element = u16::from_be_bytes([pair[0], pair[1]]);
                }
                rest = &body[128..];
                QuantizationTable::Precision16(elements)
            }
            _ => return Err(Error::InvalidQuantizationTable("precision out of range")),
        };

        tables.push((slot, table));
    }

    if tables.is_empty() {
        return Err(Error::InvalidQuantizationTable("empty payload"));
    }

    Ok(tables)
}

/// Parses a DHT payload: a concatenation of sub-tables, each a flags byte
/// (class nibble, slot nibble), 16 leaf counts, and the leaf values.
///
/// Returns `(class, slot, table)` triples in payload order, with the tables
/// already built into their flattened decode form.
pub fn parse_dht(payload: &[u8]) -> Result<Vec<(HuffmanTableClass, usize, HuffmanTable)>> {
    let mut tables = Vec::new();
    let mut rest = payload;

    while let Some((&flags, body)) = rest.split_first() {
        let class = match flags >> 4 {
            0 => HuffmanTableClass::DC,
            1 => HuffmanTableClass::AC,
            _ => return Err(Error::InvalidHuffmanTable("class out of range")),
        };
        let slot = usize::from(flags & 0x0F);
        if slot > 3 {
            return Err(Error::InvalidHuffmanTable("slot out of range"));
        }

        if body.len() < 16 {
            return Err(Error::InvalidHuffmanTable("payload runs short"));
        }
        let mut counts = [0u8; 16];
        counts.copy_from_slice(&body[..16]);

        let total: usize = counts.iter().map(|&count| usize::from(count)).sum();
        if total > 256 {
            return Err(Error::InvalidHuffmanTable("more than 256 leaves"));
        }
        if body.len() < 16 + total {
            return Err(Error::InvalidHuffmanTable("payload runs short"));
        }

        tables.push((class, slot, HuffmanTable::new(&counts, &body[16..16 + total])?));
        rest = &body[16 + total..];
    }

    if tables.is_empty() {
        return Err(Error::InvalidHuffmanTable("empty payload"));
    }

    Ok(tables)
}

/// Parses a DNL payload: exactly two bytes of big-endian line count.
pub fn parse_dnl(payload: &[u8]) -> Result<u16> {
    match payload {
        [high, low] => Ok(u16::from_be_bytes([*high, *low])),
        _ => Err(Error::InvalidDnlSegment("payload is not 2 bytes")),
    }
}
