use std::io::Read;

use crate::context::Context;
use crate::entropy::{read_entropy_segment, Bitstream};
use crate::error::{Error, Result, UnsupportedFeature};
use crate::marker::Marker;
use crate::parser::{
    parse_dnl, parse_jfif, parse_sof, parse_sos, CodingProcess, FrameInfo, JfifInfo, ScanInfo,
};
use crate::reader::JpegRead;
use crate::spectral::Spectra;

/// The frame geometry a decode establishes.
///
/// The height is final only once [`Decoder::decode`] returns: a frame may
/// declare zero lines at SOF time and supply the real count in a DNL
/// segment after its first scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    /// Samples per line.
    pub width: u16,
    /// Number of lines.
    pub height: u16,
    /// Sample precision in bits.
    pub precision: u8,
    /// The coding process selected by the frame header.
    pub coding_process: CodingProcess,
}

/// JPEG decoder, from a byte stream down to spectral coefficients.
///
/// Drives the marker state machine `SOI → JFIF → tables → SOF → (tables →
/// SOS → entropy-coded data)* → EOI` and accumulates the dequantizable
/// coefficients of every scan into a [`Spectra`] store. Inverse DCT,
/// upsampling and color conversion are the caller's concern.
pub struct Decoder<R> {
    reader: R,
    context: Context,
    jfif: Option<JfifInfo>,
    frame: Option<FrameInfo>,
}

impl<R: Read> Decoder<R> {
    /// Creates a new decoder reading the JPEG stream from `reader`.
    pub fn new(reader: R) -> Decoder<R> {
        Decoder {
            reader,
            context: Context::new(),
            jfif: None,
            frame: None,
        }
    }

    /// The frame geometry, available once the frame header has been read.
    pub fn info(&self) -> Option<ImageInfo> {
        self.frame.as_ref().map(|frame| ImageInfo {
            width: frame.image_size.width,
            height: frame.image_size.height,
            precision: frame.precision,
            coding_process: frame.coding_process,
        })
    }

    /// The JFIF metadata, available once the APP0 segment has been read.
    pub fn jfif_info(&self) -> Option<JfifInfo> {
        self.jfif
    }

    /// Reads the stream up to and including the frame header, without
    /// decoding any entropy-coded data. Afterwards [`Decoder::info`] reports
    /// the frame geometry as declared at SOF time.
    pub fn read_info(&mut self) -> Result<()> {
        self.read_headers()
    }

    /// Decodes the stream through its EOI marker, returning the spectral
    /// coefficients of every scan.
    pub fn decode(&mut self) -> Result<Spectra> {
        self.read_headers()?;

        let mut frame = match self.frame.clone() {
            Some(frame) => frame,
            None => return Err(Error::MissingFrameHeader),
        };

        let mut marker = self.reader.next_marker()?;
        let mut spectra = None;
        let mut first_scan = true;

        while marker != Marker::EOI {
            marker = self.context.update(&mut self.reader, marker)?;

            match marker {
                Marker::SOS => {}
                // Section 4.10: multiple frames only occur in hierarchical mode.
                Marker::SOF(_) => {
                    return Err(Error::Unsupported(UnsupportedFeature::Hierarchical))
                }
                // Section B.2.1: a DNL segment shall immediately follow the
                // first scan, where the driver below consumes it.
                Marker::DNL => {
                    return Err(Error::InvalidDnlSegment("not directly after the first scan"))
                }
                Marker::RST(_) => {
                    return Err(Error::Syntax(
                        "restart marker outside an entropy-coded segment".to_owned(),
                    ))
                }
                _ => return Err(Error::MissingScanHeader),
            }

            let payload = self.reader.read_segment()?;
            let scan = parse_sos(&payload, &frame)?;
            self.check_scan(&scan, &frame)?;

            let store = spectra.get_or_insert_with(|| Spectra::new(&frame));

            let (payload, terminator) = read_entropy_segment(&mut self.reader)?;
            let mut bitstream = Bitstream::new(&payload);
            let mut base =
                store.decode_segment(&mut bitstream, &frame, &scan, &self.context, 0)?;
            marker = terminator;

            if self.context.restart_interval() > 0 {
                while Context::restart(marker) {
                    let (payload, terminator) = read_entropy_segment(&mut self.reader)?;
                    let mut bitstream = Bitstream::new(&payload);
                    base = store
                        .decode_segment(&mut bitstream, &frame, &scan, &self.context, base)?;
                    marker = terminator;
                }
            }

            if first_scan {
                if marker == Marker::DNL {
                    let payload = self.reader.read_segment()?;
                    let height = parse_dnl(&payload)?;

                    frame.update_height(height);
                    if let Some(stored) = self.frame.as_mut() {
                        stored.update_height(height);
                    }

                    marker = self.reader.next_marker()?;
                }
                first_scan = false;
            }
        }

        spectra.ok_or(Error::MissingScanHeader)
    }

    fn read_headers(&mut self) -> Result<()> {
        if self.frame.is_some() {
            return Ok(());
        }

        match self.reader.next_marker() {
            Ok(Marker::SOI) => {}
            Ok(_) | Err(Error::Structural) => return Err(Error::Filetype),
            Err(err) => return Err(err),
        }

        // The JFIF APP0 marker is mandatory right after the SOI marker.
        match self.reader.next_marker()? {
            Marker::APP(0) => {}
            _ => return Err(Error::MissingJfifHeader),
        }
        let payload = self.reader.read_segment()?;
        self.jfif = Some(parse_jfif(&payload)?);

        let marker = self.reader.next_marker()?;
        let marker = self.context.update(&mut self.reader, marker)?;

        let frame = match marker {
            Marker::SOF(sof) => {
                let payload = self.reader.read_segment()?;
                parse_sof(sof, &payload)?
            }
            _ => return Err(Error::MissingFrameHeader),
        };

        self.frame = Some(frame);
        Ok(())
    }

    /// A scan must cover the frame's components in frame order: the store's
    /// block layout is fixed by the frame, and per-component scans of a
    /// spectrally-interleaved image would need a different grouping.
    fn check_scan(&self, scan: &ScanInfo, frame: &FrameInfo) -> Result<()> {
        if scan.components.len() != frame.components.len()
            || scan
                .components
                .iter()
                .zip(&frame.components)
                .any(|(selector, component)| selector.identifier != component.identifier)
        {
            return Err(Error::Unsupported(UnsupportedFeature::ScanLayout));
        }

        for component in &frame.components {
            if self
                .context
                .quantization_table(component.quantization_table_index)
                .is_none()
            {
                return Err(Error::Syntax(
                    "scan references an unset quantization table".to_owned(),
                ));
            }
        }

        Ok(())
    }
}
