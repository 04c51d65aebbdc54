/// The marker kinds this decoder recognizes (Table B.1).
///
/// On the wire a marker is one or more `0xFF` fill bytes followed by the
/// marker byte; runs of `0xFF` collapse to a single marker introducer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Start of image.
    SOI,
    /// End of image.
    EOI,
    /// Start of frame. The payload selects the coding process; `n` is in
    /// `0..=15` excluding 4 (DHT) and 12 (DAC).
    SOF(u8),
    /// Define Huffman table(s).
    DHT,
    /// Define arithmetic coding conditioning(s).
    DAC,
    /// Define quantization table(s).
    DQT,
    /// Define number of lines.
    DNL,
    /// Define restart interval.
    DRI,
    /// Start of scan.
    SOS,
    /// Restart with modulo 8 count `n`.
    RST(u8),
    /// Reserved for application segments, `n` in `0..=15`.
    APP(u8),
    /// Comment.
    COM,
}

impl Marker {
    /// Maps a marker byte to a `Marker`, or `None` for bytes outside the
    /// recognized set (including `0x00` byte stuffing and `0xFF` fill).
    pub fn from_u8(byte: u8) -> Option<Marker> {
        match byte {
            0xC4 => Some(Marker::DHT),
            0xCC => Some(Marker::DAC),
            0xC0..=0xCF => Some(Marker::SOF(byte - 0xC0)),
            0xD0..=0xD7 => Some(Marker::RST(byte - 0xD0)),
            0xD8 => Some(Marker::SOI),
            0xD9 => Some(Marker::EOI),
            0xDA => Some(Marker::SOS),
            0xDB => Some(Marker::DQT),
            0xDC => Some(Marker::DNL),
            0xDD => Some(Marker::DRI),
            0xE0..=0xEF => Some(Marker::APP(byte - 0xE0)),
            0xFE => Some(Marker::COM),
            _ => None,
        }
    }

    /// Whether a length-prefixed segment follows the marker.
    pub fn has_length(self) -> bool {
        !matches!(self, Marker::SOI | Marker::EOI | Marker::RST(_))
    }
}
