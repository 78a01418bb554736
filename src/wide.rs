//! Wide internal encodings: UTF-16 and UTF-32 in host byte order
//!
//! These hold no shift-state, so `reset` has nothing to discard.

use crate::context::{DecodeContext, EncodeContext, Step};
use crate::{Error, Result, utf8};

/// Normalize a label for comparison: uppercase, without `-` and `_`
fn normalize(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether `label` names UTF-16 in host byte order
pub(crate) fn is_utf16(label: &str) -> bool {
    let native = if cfg!(target_endian = "little") {
        "UTF16LE"
    } else {
        "UTF16BE"
    };
    let label = normalize(label);
    label == "UTF16" || label == native
}

/// Whether `label` names UTF-32 in host byte order
pub(crate) fn is_utf32(label: &str) -> bool {
    let native = if cfg!(target_endian = "little") {
        ["UTF32LE", "UCS4LE"]
    } else {
        ["UTF32BE", "UCS4BE"]
    };
    let label = normalize(label);
    matches!(label.as_str(), "UTF32" | "UCS4") || native.contains(&label.as_str())
}

pub(crate) fn require_utf16(label: &str) -> Result<()> {
    if is_utf16(label) {
        Ok(())
    } else {
        Err(Error::unsupported(
            label,
            "16-bit code units only support host-order UTF-16",
        ))
    }
}

pub(crate) fn require_utf32(label: &str) -> Result<()> {
    if is_utf32(label) {
        Ok(())
    } else {
        Err(Error::unsupported(
            label,
            "32-bit code units only support host-order UTF-32",
        ))
    }
}

/// UTF-16 to UTF-8
pub(crate) struct Utf16Encoder;

impl EncodeContext<u16> for Utf16Encoder {
    fn reset(&mut self) {}

    fn convert(&mut self, src: &[u16], dst: &mut [u8]) -> Step {
        let mut read = 0;
        let mut written = 0;

        for decoded in char::decode_utf16(src.iter().copied()) {
            match decoded {
                Ok(ch) => {
                    let needed = ch.len_utf8();
                    if dst.len() - written < needed {
                        return Step::output_full(read, written);
                    }
                    ch.encode_utf8(&mut dst[written..]);
                    written += needed;
                    read += ch.len_utf16();
                }
                Err(err) => {
                    let surrogate = err.unpaired_surrogate();
                    let reason = if read + 1 == src.len() && surrogate < 0xDC00 {
                        format!(
                            "incomplete UTF-16 surrogate pair 0x{surrogate:04X} at end of input"
                        )
                    } else {
                        format!("unpaired UTF-16 surrogate 0x{surrogate:04X} at unit {read}")
                    };
                    return Step::invalid(read, written, reason);
                }
            }
        }

        Step::complete(read, written)
    }
}

/// UTF-8 to UTF-16
pub(crate) struct Utf16Decoder;

impl DecodeContext<u16> for Utf16Decoder {
    fn reset(&mut self) {}

    fn convert(&mut self, src: &[u8], dst: &mut [u16]) -> Step {
        let text = match utf8::validate(src) {
            Ok(text) => text,
            Err(reason) => return Step::invalid(0, 0, reason),
        };

        let mut read = 0;
        let mut written = 0;
        for ch in text.chars() {
            let needed = ch.len_utf16();
            if dst.len() - written < needed {
                return Step::output_full(read, written);
            }
            ch.encode_utf16(&mut dst[written..]);
            written += needed;
            read += ch.len_utf8();
        }

        Step::complete(read, written)
    }
}

/// UTF-32 to UTF-8
pub(crate) struct Utf32Encoder;

impl EncodeContext<u32> for Utf32Encoder {
    fn reset(&mut self) {}

    fn convert(&mut self, src: &[u32], dst: &mut [u8]) -> Step {
        let mut written = 0;

        for (read, &unit) in src.iter().enumerate() {
            let Some(ch) = char::from_u32(unit) else {
                return Step::invalid(
                    read,
                    written,
                    format!("0x{unit:X} at unit {read} is not a Unicode scalar value"),
                );
            };
            let needed = ch.len_utf8();
            if dst.len() - written < needed {
                return Step::output_full(read, written);
            }
            ch.encode_utf8(&mut dst[written..]);
            written += needed;
        }

        Step::complete(src.len(), written)
    }
}

/// UTF-8 to UTF-32
pub(crate) struct Utf32Decoder;

impl DecodeContext<u32> for Utf32Decoder {
    fn reset(&mut self) {}

    fn convert(&mut self, src: &[u8], dst: &mut [u32]) -> Step {
        let text = match utf8::validate(src) {
            Ok(text) => text,
            Err(reason) => return Step::invalid(0, 0, reason),
        };

        let mut read = 0;
        let mut written = 0;
        for ch in text.chars() {
            if written == dst.len() {
                return Step::output_full(read, written);
            }
            dst[written] = u32::from(ch);
            written += 1;
            read += ch.len_utf8();
        }

        Step::complete(read, written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Status;

    #[test]
    fn test_labels() {
        assert!(is_utf16("utf-16"));
        assert!(is_utf16("UTF_16"));
        assert!(!is_utf16("UCS-2"));
        assert!(is_utf32("ucs-4"));
        assert!(is_utf32("UTF-32"));
        assert!(require_utf32("UTF-16").is_err());
    }

    #[test]
    fn test_utf16_surrogate_pair_round_trip() {
        let units: Vec<u16> = "a🌍".encode_utf16().collect();
        let mut utf8 = [0u8; 8];
        let step = Utf16Encoder.convert(&units, &mut utf8);
        assert_eq!(step, Step::complete(3, 5));
        assert_eq!(&utf8[..5], "a🌍".as_bytes());

        let mut back = [0u16; 4];
        let step = Utf16Decoder.convert(&utf8[..5], &mut back);
        assert_eq!(step, Step::complete(5, 3));
        assert_eq!(&back[..3], units.as_slice());
    }

    #[test]
    fn test_utf16_never_splits_a_character() {
        let units: Vec<u16> = "🌍".encode_utf16().collect();
        let mut utf8 = [0u8; 3];
        let step = Utf16Encoder.convert(&units, &mut utf8);
        assert_eq!(step, Step::output_full(0, 0));
    }

    #[test]
    fn test_utf16_lone_surrogates() {
        let step = Utf16Encoder.convert(&[0x61, 0xDC00, 0x62], &mut [0u8; 8]);
        assert!(matches!(step.status, Status::Invalid(ref r) if r.contains("unpaired")));

        let step = Utf16Encoder.convert(&[0x61, 0xD83C], &mut [0u8; 8]);
        assert!(matches!(step.status, Status::Invalid(ref r) if r.contains("end of input")));
    }

    #[test]
    fn test_utf32_rejects_non_scalar() {
        let step = Utf32Encoder.convert(&[0x41, 0xD800], &mut [0u8; 8]);
        assert_eq!(step.read, 1);
        assert_eq!(step.written, 1);
        assert!(matches!(step.status, Status::Invalid(_)));
    }

    #[test]
    fn test_utf32_decoder_fills_exactly() {
        let mut out = [0u32; 2];
        let step = Utf32Decoder.convert("xyz".as_bytes(), &mut out);
        assert_eq!(step, Step::output_full(2, 2));
        assert_eq!(out, ['x' as u32, 'y' as u32]);
    }
}
