use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::io::ErrorKind;
use std::result;

/// The result type used throughout this crate.
pub type Result<T> = result::Result<T, Error>;

/// An enumeration over JPEG features this crate detects but does not decode.
///
/// Inputs using these features are well-formed JPEG streams; they are simply
/// outside the coding processes this decoder handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsupportedFeature {
    /// Hierarchical (differential) JPEG.
    Hierarchical,
    /// Lossless JPEG.
    Lossless,
    /// JPEG using arithmetic entropy coding instead of Huffman coding.
    ArithmeticEntropyCoding,
    /// Sample precision in bits. 8 bit is supported for baseline frames,
    /// 8 and 12 bit for extended sequential and progressive frames.
    SamplePrecision(u8),
    /// A JFIF density unit outside the defined set {0, 1, 2}.
    DensityUnit(u8),
    /// A scan whose component layout differs from the frame's, e.g. the
    /// per-component AC scans of a spectrally-interleaved progressive image.
    ScanLayout,
}

/// Errors that can occur while decoding a JPEG stream.
#[derive(Debug)]
pub enum Error {
    /// The stream does not start with an SOI marker and is not a JPEG file.
    Filetype,
    /// Unexpected end of the input stream in the middle of a read.
    Stream,
    /// A marker was required at the current position but the prefix byte was
    /// not `0xFF`.
    Structural,
    /// The segment following SOI is not a JFIF APP0 segment.
    MissingJfifHeader,
    /// The JFIF APP0 segment is present but malformed.
    InvalidJfifHeader(&'static str),
    /// No frame header was found where one was required.
    MissingFrameHeader,
    /// The frame header is present but malformed.
    InvalidFrameHeader(&'static str),
    /// No scan header was found where one was required.
    MissingScanHeader,
    /// The scan header is present but malformed.
    InvalidScanHeader(&'static str),
    /// A DQT segment could not be parsed into a quantization table.
    InvalidQuantizationTable(&'static str),
    /// A DHT segment could not be built into a Huffman table.
    InvalidHuffmanTable(&'static str),
    /// A DNL segment was malformed or misplaced.
    InvalidDnlSegment(&'static str),
    /// Any other payload integrity failure. The string contains detailed
    /// information about the error.
    Syntax(String),
    /// The stream uses a JPEG feature this crate does not decode.
    Unsupported(UnsupportedFeature),
    /// The stream uses a feature that is recognized but not implemented yet.
    Unimplemented(&'static str),
    /// An I/O error occurred while reading the stream.
    Io(IoError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Filetype => write!(f, "first marker is not SOI"),
            Error::Stream => write!(f, "unexpected end of stream"),
            Error::Structural => write!(f, "marker expected but prefix byte is not 0xFF"),
            Error::MissingJfifHeader => write!(f, "missing JFIF header"),
            Error::InvalidJfifHeader(desc) => write!(f, "invalid JFIF header: {}", desc),
            Error::MissingFrameHeader => write!(f, "missing frame header"),
            Error::InvalidFrameHeader(desc) => write!(f, "invalid frame header: {}", desc),
            Error::MissingScanHeader => write!(f, "missing scan header"),
            Error::InvalidScanHeader(desc) => write!(f, "invalid scan header: {}", desc),
            Error::InvalidQuantizationTable(desc) => {
                write!(f, "invalid quantization table: {}", desc)
            }
            Error::InvalidHuffmanTable(desc) => write!(f, "invalid huffman table: {}", desc),
            Error::InvalidDnlSegment(desc) => write!(f, "invalid DNL segment: {}", desc),
            Error::Syntax(ref desc) => write!(f, "invalid JPEG format: {}", desc),
            Error::Unsupported(feature) => write!(f, "unsupported JPEG feature: {:?}", feature),
            Error::Unimplemented(desc) => write!(f, "unimplemented JPEG feature: {}", desc),
            Error::Io(ref err) => err.fmt(f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        // Running off the end of the stream mid-read is a decode-level
        // condition, not an I/O failure of the underlying source.
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::Stream
        } else {
            Error::Io(err)
        }
    }
}
