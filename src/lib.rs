//! # utf8-wire - Internal Encoding to UTF-8 Conversion
//!
//! Converts strings held in an application's internal character encoding,
//! made of fixed-width code units, to and from UTF-8 byte sequences.
//!
//! ## Features
//!
//! - **Any WHATWG encoding** for 8-bit code units, through `encoding_rs`
//! - **UTF-16 and UTF-32** for wide code units
//! - **Per-thread conversion handles**, created on first use and released at thread exit
//! - **Caller-owned output** that the converter grows on demand
//!
//! ## Quick Start
//!
//! ```rust
//! use utf8_wire::Converter;
//!
//! let converter = Converter::<u8>::new("ISO-8859-15").unwrap();
//!
//! // Internal bytes to UTF-8
//! let utf8 = converter.encode_to_vec(&[0x50, 0x72, 0x69, 0x78, 0x20, 0xA4]).unwrap();
//! assert_eq!(std::str::from_utf8(&utf8).unwrap(), "Prix €");
//!
//! // And back
//! let latin9 = converter.decode_to_vec(&utf8).unwrap();
//! assert_eq!(latin9, [0x50, 0x72, 0x69, 0x78, 0x20, 0xA4]);
//! ```
//!
//! ## Wide Code Units
//!
//! ```rust
//! use utf8_wire::Converter;
//!
//! let converter = Converter::<u16>::new("UTF-16").unwrap();
//! let units: Vec<u16> = "Hello 🌍".encode_utf16().collect();
//! let utf8 = converter.encode_to_vec(&units).unwrap();
//! assert_eq!(utf8, "Hello 🌍".as_bytes());
//! ```

#![deny(missing_docs)]

pub mod buffer;
mod cache;
mod codecs;
pub mod context;
mod converter;
mod legacy;
pub mod locale;
mod utf8;
mod wide;

pub use buffer::{GrowableBuffer, GrowableTarget, Spare};
pub use cache::CacheStats;
pub use codecs::BuiltinCodecs;
pub use context::{ContextFactory, DecodeContext, EncodeContext, HandlePair, Status, Step};
pub use converter::Converter;
pub use legacy::canonical_name;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No conversion path between the internal encoding and UTF-8
    #[error("unsupported internal encoding `{name}`: {reason}")]
    UnsupportedEncoding {
        /// Encoding name as requested
        name: String,
        /// Why it cannot be used
        reason: String,
    },
    /// Input holds a sequence that cannot be converted
    #[error("invalid sequence: {0}")]
    InvalidSequence(String),
    /// The calling thread's handles could not be set up
    #[error("cannot allocate conversion handles: {0}")]
    ResourceAllocation(String),
}

impl Error {
    pub(crate) fn unsupported(name: &str, reason: impl Into<String>) -> Self {
        Error::UnsupportedEncoding {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// Fixed-width code unit of an internal encoding
pub trait CodeUnit: sealed::Sealed + Copy + Default + Send + Sync + std::fmt::Debug + 'static {
    /// Size of one code unit in bytes
    const WIDTH: usize;
}

impl CodeUnit for u8 {
    const WIDTH: usize = 1;
}

impl CodeUnit for u16 {
    const WIDTH: usize = 2;
}

impl CodeUnit for u32 {
    const WIDTH: usize = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unsupported("klingon", "unknown encoding label");
        assert_eq!(
            err.to_string(),
            "unsupported internal encoding `klingon`: unknown encoding label"
        );
        assert_eq!(
            Error::InvalidSequence("bad byte".into()).to_string(),
            "invalid sequence: bad byte"
        );
    }

    #[test]
    fn test_code_unit_widths() {
        assert_eq!(u8::WIDTH, 1);
        assert_eq!(u16::WIDTH, 2);
        assert_eq!(u32::WIDTH, 4);
    }

    #[test]
    fn test_windows_1252_special_chars() {
        let converter = Converter::<u8>::new("windows-1252").unwrap();

        // Euro (0x80) and trademark (0x99)
        let output = converter.encode_to_vec(&[0x80, 0x99]).unwrap();
        assert_eq!(std::str::from_utf8(&output).unwrap(), "€™");
    }

    #[test]
    fn test_shift_jis_round_trip() {
        let converter = Converter::<u8>::new("Shift_JIS").unwrap();

        let sjis = converter.decode_to_vec("こんにちは世界".as_bytes()).unwrap();
        assert_eq!(&sjis[..2], &[0x82, 0xB1]);

        let utf8 = converter.encode_to_vec(&sjis).unwrap();
        assert_eq!(std::str::from_utf8(&utf8).unwrap(), "こんにちは世界");
    }

    #[test]
    fn test_utf32_round_trip() {
        let converter = Converter::<u32>::new("UCS-4").unwrap();
        let units: Vec<u32> = "Grüße 🌍".chars().map(u32::from).collect();

        let utf8 = converter.encode_to_vec(&units).unwrap();
        assert_eq!(utf8, "Grüße 🌍".as_bytes());
        assert_eq!(converter.decode_to_vec(&utf8).unwrap(), units);
    }
}
