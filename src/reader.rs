use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::marker::Marker;

/// Extension trait giving any [`std::io::Read`] the segment-level reads the
/// decoder needs.
///
/// All multi-byte integers in a JPEG stream are big-endian. Reads that run
/// off the end of the stream fail with [`Error::Stream`].
pub trait JpegRead: Read {
    /// Reads a single byte.
    fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_u8()?)
    }

    /// Reads a big-endian 16-bit integer.
    fn read_length(&mut self) -> Result<u16> {
        Ok(self.read_u16::<BigEndian>()?)
    }

    /// Reads a marker segment payload: a 16-bit big-endian length `L`
    /// followed by `L - 2` payload bytes, returned as an owned buffer.
    fn read_segment(&mut self) -> Result<Vec<u8>> {
        let length = self.read_length()? as usize;
        if length < 2 {
            return Err(Error::Syntax(format!(
                "segment length {} is shorter than its own length field",
                length
            )));
        }

        let mut payload = vec![0; length - 2];
        self.read_exact(&mut payload).map_err(Error::from)?;
        Ok(payload)
    }

    /// Scans the next marker: requires a `0xFF` prefix byte, then returns the
    /// first subsequent byte that is not `0xFF`.
    ///
    /// Section B.1.1.2: any marker may be preceded by any number of fill
    /// bytes (`0xFF`), which collapse into the marker.
    fn next_marker(&mut self) -> Result<Marker> {
        if self.read_byte()? != 0xFF {
            return Err(Error::Structural);
        }

        let mut byte = self.read_byte()?;
        while byte == 0xFF {
            byte = self.read_byte()?;
        }

        match byte {
            0x00 => Err(Error::Syntax(
                "FF 00 found where a marker was expected".to_owned(),
            )),
            _ => Marker::from_u8(byte)
                .ok_or_else(|| Error::Syntax(format!("unrecognized marker FF {:02X}", byte))),
        }
    }
}

impl<R: Read> JpegRead for R {}

#[cfg(test)]
mod tests {
    use super::JpegRead;
    use crate::error::Error;
    use crate::marker::Marker;

    #[test]
    fn marker_scan_collapses_fill_bytes() {
        let mut data: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0xD8];
        assert_eq!(data.next_marker().unwrap(), Marker::SOI);
    }

    #[test]
    fn marker_scan_requires_prefix() {
        let mut data: &[u8] = &[0x12, 0xD8];
        assert!(matches!(data.next_marker(), Err(Error::Structural)));
    }

    #[test]
    fn stuffed_zero_is_not_a_marker() {
        let mut data: &[u8] = &[0xFF, 0x00];
        assert!(matches!(data.next_marker(), Err(Error::Syntax(_))));
    }

    #[test]
    fn segment_reads_length_prefixed_payload() {
        let mut data: &[u8] = &[0x00, 0x05, 0xAA, 0xBB, 0xCC, 0xDD];
        assert_eq!(data.read_segment().unwrap(), vec![0xAA, 0xBB, 0xCC]);
        // The byte after the payload is left in the stream.
        assert_eq!(data.read_byte().unwrap(), 0xDD);
    }

    #[test]
    fn short_segment_is_a_stream_error() {
        let mut data: &[u8] = &[0x00, 0x09, 0xAA];
        assert!(matches!(data.read_segment(), Err(Error::Stream)));
    }

    #[test]
    fn eof_is_a_stream_error() {
        let mut data: &[u8] = &[];
        assert!(matches!(data.read_byte(), Err(Error::Stream)));
    }
}
