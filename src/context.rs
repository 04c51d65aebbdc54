use crate::error::{Error, Result, UnsupportedFeature};
use crate::huffman::{HuffmanTable, HuffmanTableClass};
use crate::marker::Marker;
use crate::parser::{parse_dht, parse_dqt, QuantizationTable};
use crate::reader::JpegRead;

/// The table state a decode carries between segments: four selector-addressed
/// slots each of quantization, DC Huffman and AC Huffman tables, plus the
/// restart interval.
///
/// Created once per decode and mutated by the ancillary segments that may
/// precede any frame or scan header. Installing a table replaces the
/// previous occupant of its slot.
pub struct Context {
    quantization_tables: [Option<QuantizationTable>; 4],
    dc_tables: [Option<HuffmanTable>; 4],
    ac_tables: [Option<HuffmanTable>; 4],
    restart_interval: u16,
}

impl Context {
    pub(crate) fn new() -> Context {
        Context {
            quantization_tables: [None, None, None, None],
            dc_tables: [None, None, None, None],
            ac_tables: [None, None, None, None],
            restart_interval: 0,
        }
    }

    /// Ingests the run of ancillary segments starting at `marker`: DQT and
    /// DHT update table slots, APPn and COM payloads are discarded, DRI and
    /// DAC are rejected. The first marker that is none of these is returned
    /// for the caller to dispatch.
    pub(crate) fn update<R: JpegRead>(&mut self, reader: &mut R, marker: Marker) -> Result<Marker> {
        let mut marker = marker;

        loop {
            match marker {
                Marker::DQT => {
                    let payload = reader.read_segment()?;
                    for (slot, table) in parse_dqt(&payload)? {
                        self.quantization_tables[slot] = Some(table);
                    }
                }
                Marker::DHT => {
                    let payload = reader.read_segment()?;
                    for (class, slot, table) in parse_dht(&payload)? {
                        match class {
                            HuffmanTableClass::DC => self.dc_tables[slot] = Some(table),
                            HuffmanTableClass::AC => self.ac_tables[slot] = Some(table),
                        }
                    }
                }
                Marker::DRI => return Err(Error::Unimplemented("restart intervals")),
                Marker::DAC => {
                    return Err(Error::Unsupported(UnsupportedFeature::ArithmeticEntropyCoding))
                }
                Marker::APP(_) | Marker::COM => {
                    reader.read_segment()?;
                }
                _ => return Ok(marker),
            }

            marker = reader.next_marker()?;
        }
    }

    /// Whether `marker` is one of the eight restart markers.
    pub(crate) fn restart(marker: Marker) -> bool {
        matches!(marker, Marker::RST(_))
    }

    pub(crate) fn quantization_table(&self, index: u8) -> Option<&QuantizationTable> {
        self.quantization_tables[usize::from(index)].as_ref()
    }

    pub(crate) fn dc_table(&self, index: u8) -> Option<&HuffmanTable> {
        self.dc_tables[usize::from(index)].as_ref()
    }

    pub(crate) fn ac_table(&self, index: u8) -> Option<&HuffmanTable> {
        self.ac_tables[usize::from(index)].as_ref()
    }

    pub(crate) fn restart_interval(&self) -> u16 {
        self.restart_interval
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::error::Error;
    use crate::marker::Marker;
    use crate::parser::QuantizationTable;

    fn dqt_segment(slot: u8, fill: u8) -> Vec<u8> {
        let mut segment = vec![0x00, 0x43, slot];
        segment.extend(std::iter::repeat(fill).take(64));
        segment
    }

    #[test]
    fn installs_and_replaces_quantization_slots() {
        let mut stream = dqt_segment(0, 1);
        stream.extend(&[0xFF, 0xDB]);
        stream.extend(dqt_segment(0, 2));
        stream.extend(&[0xFF, 0xDA]);

        let mut reader: &[u8] = &stream;
        let mut context = Context::new();
        let next = context.update(&mut reader, Marker::DQT).unwrap();

        assert_eq!(next, Marker::SOS);
        assert_eq!(
            context.quantization_table(0),
            Some(&QuantizationTable::Precision8([2; 64]))
        );
        assert_eq!(context.quantization_table(1), None);
    }

    #[test]
    fn discards_application_and_comment_payloads() {
        let mut stream = vec![0x00, 0x06, 0xDE, 0xAD, 0xBE, 0xEF];
        stream.extend(&[0xFF, 0xFE, 0x00, 0x04, 0x68, 0x69]);
        stream.extend(&[0xFF, 0xC0]);

        let mut reader: &[u8] = &stream;
        let mut context = Context::new();
        let next = context.update(&mut reader, Marker::APP(5)).unwrap();
        assert_eq!(next, Marker::SOF(0));
    }

    #[test]
    fn leaves_non_ancillary_markers_in_place() {
        let mut reader: &[u8] = &[];
        let mut context = Context::new();
        let next = context.update(&mut reader, Marker::SOS).unwrap();
        assert_eq!(next, Marker::SOS);
    }

    #[test]
    fn rejects_restart_interval_definitions() {
        let mut reader: &[u8] = &[0x00, 0x04, 0x00, 0x10];
        let mut context = Context::new();
        assert!(matches!(
            context.update(&mut reader, Marker::DRI),
            Err(Error::Unimplemented(_))
        ));
    }

    #[test]
    fn rejects_arithmetic_conditioning() {
        let mut reader: &[u8] = &[0x00, 0x04, 0x00, 0x00];
        let mut context = Context::new();
        assert!(matches!(
            context.update(&mut reader, Marker::DAC),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn classifies_restart_markers() {
        assert!(Context::restart(Marker::RST(0)));
        assert!(Context::restart(Marker::RST(7)));
        assert!(!Context::restart(Marker::EOI));
        assert!(!Context::restart(Marker::SOS));
    }
}
