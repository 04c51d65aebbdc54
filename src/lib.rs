//! This crate contains the segment-level core of a JPEG decoder.
//!
//! [`Decoder`] walks a JPEG byte stream from its SOI to its EOI marker,
//! builds decoder-ready quantization and Huffman tables from their
//! serialized forms, and reads the entropy-coded segments of every scan
//! into a [`Spectra`] store of spectral coefficients. What comes after the
//! coefficients (dequantization, the inverse DCT, upsampling and color
//! conversion) is deliberately left to the caller, as are arithmetic-coded
//! and hierarchical/lossless streams, which are detected and rejected.
//!
//! # Examples
//!
//! Read the frame geometry of an in-memory stream without touching its
//! entropy-coded data:
//!
//! ```
//! use jpeg_spectra::Decoder;
//!
//! # fn main() -> Result<(), jpeg_spectra::Error> {
//! let mut bytes = vec![0xFF, 0xD8]; // SOI
//! bytes.extend([0xFF, 0xE0, 0x00, 0x10]); // APP0, JFIF 1.1
//! bytes.extend(*b"JFIF\0");
//! bytes.extend([0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
//! bytes.extend([0xFF, 0xDB, 0x00, 0x43, 0x00]); // DQT into slot 0
//! bytes.extend([0x01; 64]);
//! bytes.extend([0xFF, 0xC0, 0x00, 0x0B, 0x08]); // SOF0, one 8x8 component
//! bytes.extend([0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00]);
//!
//! let mut decoder = Decoder::new(bytes.as_slice());
//! decoder.read_info()?;
//!
//! let info = decoder.info().unwrap();
//! assert_eq!((info.width, info.height), (8, 8));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub use crate::decoder::{Decoder, ImageInfo};
pub use crate::entropy::{read_entropy_segment, Bitstream};
pub use crate::error::{Error, Result, UnsupportedFeature};
pub use crate::huffman::{Entry, HuffmanTable, HuffmanTableClass};
pub use crate::marker::Marker;
pub use crate::parser::{
    CodingProcess, Component, DensityUnit, Dimensions, FrameInfo, JfifInfo, QuantizationTable,
    ScanComponent, ScanInfo,
};
pub use crate::reader::JpegRead;
pub use crate::spectral::{amplitude, Spectra};

mod context;
mod decoder;
mod entropy;
mod error;
mod huffman;
mod marker;
mod parser;
mod reader;
mod spectral;
