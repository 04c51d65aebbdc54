use crate::error::{Error, Result};
use crate::marker::Marker;
use crate::reader::JpegRead;

/// Reads one entropy-coded segment off the stream, undoing byte stuffing.
///
/// Any `0xFF 0x00` pair collapses to a data byte of `0xFF`. A `0xFF`
/// followed by anything else ends the segment: fill bytes are skipped and
/// the marker byte is returned alongside the de-stuffed payload, so the
/// caller can dispatch on it as the next marker. Since the marker has
/// already been pulled off the underlying stream, it must not be re-read.
pub fn read_entropy_segment<R: JpegRead>(reader: &mut R) -> Result<(Vec<u8>, Marker)> {
    let mut payload = Vec::new();

    loop {
        let byte = reader.read_byte()?;
        if byte != 0xFF {
            payload.push(byte);
            continue;
        }

        let mut next = reader.read_byte()?;
        if next == 0x00 {
            payload.push(0xFF);
            continue;
        }

        // Section B.1.1.2: fill bytes collapse into the marker.
        while next == 0xFF {
            next = reader.read_byte()?;
        }

        return match next {
            0x00 => Err(Error::Syntax(
                "FF 00 found where a marker was expected".to_owned(),
            )),
            _ => {
                let marker = Marker::from_u8(next).ok_or_else(|| {
                    Error::Syntax(format!("unrecognized marker FF {:02X}", next))
                })?;
                Ok((payload, marker))
            }
        };
    }
}

/// A de-stuffed entropy-coded payload viewed as a big-endian bit sequence.
///
/// Bytes are packed two at a time into 16-bit atoms and the buffer ends in
/// two `0xFFFF` barrier atoms, so a full 16-bit window can always be read
/// without a bounds check. A window of `0xFFFF` cannot occur in de-stuffed
/// data (the all-ones codeword is reserved and the byte after a data `0xFF`
/// was a stuffed zero), so it doubles as the exhaustion sentinel.
pub struct Bitstream {
    atoms: Vec<u16>,
    position: usize,
    bit: u8,
}

impl Bitstream {
    /// Packs a de-stuffed byte buffer. An odd trailing byte is padded on the
    /// right with `0xFF`.
    pub fn new(data: &[u8]) -> Bitstream {
        let mut atoms = Vec::with_capacity(data.len() / 2 + 3);

        let mut pairs = data.chunks_exact(2);
        for pair in &mut pairs {
            atoms.push(u16::from_be_bytes([pair[0], pair[1]]));
        }
        if let [byte] = pairs.remainder() {
            atoms.push(u16::from_be_bytes([*byte, 0xFF]));
        }

        atoms.push(0xFFFF);
        atoms.push(0xFFFF);

        Bitstream {
            atoms,
            position: 0,
            bit: 0,
        }
    }

    /// The raw 16-bit window at the cursor, MSB-first. Once the data runs
    /// out this reads into the all-ones barrier padding, so in-block reads
    /// never need a bounds check.
    pub fn window(&self) -> u16 {
        if self.position + 1 >= self.atoms.len() {
            return 0xFFFF;
        }

        if self.bit == 0 {
            self.atoms[self.position]
        } else {
            self.atoms[self.position] << self.bit
                | self.atoms[self.position + 1] >> (16 - self.bit)
        }
    }

    /// The window at the cursor, or `None` once the remaining bits are
    /// exhausted: an all-ones window cannot occur at a codeword boundary in
    /// well-formed entropy-coded data.
    pub fn front(&self) -> Option<u16> {
        match self.window() {
            0xFFFF => None,
            window => Some(window),
        }
    }

    /// Advances the cursor by `count` bits, `count` in `0..=16`.
    pub fn pop(&mut self, count: u8) {
        debug_assert!(count <= 16);

        self.bit += count;
        if self.bit >= 16 {
            self.bit -= 16;
            self.position += 1;
        }
    }

    /// The top `count` bits of the window, right-aligned, for `count` in
    /// `1..=16`. Does not advance the cursor.
    pub fn peek(&self, count: u8) -> Option<u16> {
        self.front().map(|window| window >> (16 - count))
    }
}
