//! Byte-oriented internal encodings backed by `encoding_rs`
//!
//! Any WHATWG label names an 8-bit internal encoding. The decode direction
//! (UTF-8 to internal) needs an `encoding_rs` encoder, which does not exist
//! for every label, so that side is checked first.
//!
//! The WHATWG ISO-2022-JP encoder folds halfwidth katakana (U+FF61 to
//! U+FF9F) into their fullwidth forms. Those characters would not come back
//! unchanged, so they are reported as unmappable instead.

use encoding_rs::{
    Decoder, DecoderResult, Encoder, EncoderResult, Encoding, ISO_2022_JP, REPLACEMENT,
};

use crate::context::{DecodeContext, EncodeContext, Step};
use crate::{Error, Result, utf8};

/// Look up a byte-oriented internal encoding by label
pub(crate) fn lookup(label: &str) -> Result<&'static Encoding> {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) if encoding == REPLACEMENT => Err(Error::unsupported(
            label,
            "label maps to the replacement encoding",
        )),
        Some(encoding) => Ok(encoding),
        None => Err(Error::unsupported(label, "unknown encoding label")),
    }
}

/// Canonical name of a byte-oriented encoding label, if it has one
pub fn canonical_name(label: &str) -> Option<&'static str> {
    lookup(label).ok().map(Encoding::name)
}

/// Internal bytes to UTF-8
pub(crate) struct LegacyEncoder {
    encoding: &'static Encoding,
    decoder: Decoder,
}

impl LegacyEncoder {
    pub(crate) fn open(label: &str) -> Result<Self> {
        let encoding = lookup(label)?;
        Ok(Self {
            encoding,
            decoder: encoding.new_decoder_without_bom_handling(),
        })
    }
}

impl EncodeContext<u8> for LegacyEncoder {
    fn reset(&mut self) {
        self.decoder = self.encoding.new_decoder_without_bom_handling();
    }

    fn convert(&mut self, src: &[u8], dst: &mut [u8]) -> Step {
        let (result, read, written) = self
            .decoder
            .decode_to_utf8_without_replacement(src, dst, true);
        match result {
            DecoderResult::InputEmpty => Step::complete(read, written),
            DecoderResult::OutputFull => Step::output_full(read, written),
            DecoderResult::Malformed(bad, _) => Step::invalid(
                read,
                written,
                format!(
                    "malformed {} sequence of {} byte(s) before offset {}",
                    self.encoding.name(),
                    bad,
                    read
                ),
            ),
        }
    }
}

fn unmappable(ch: char, encoding: &'static Encoding) -> String {
    format!("U+{:04X} cannot be represented in {}", ch as u32, encoding.name())
}

/// First character `encoding` would accept but not preserve
fn first_folded(encoding: &'static Encoding, text: &str) -> Option<(usize, char)> {
    if encoding != ISO_2022_JP {
        return None;
    }
    text.char_indices()
        .find(|&(_, ch)| ('\u{FF61}'..='\u{FF9F}').contains(&ch))
}

/// UTF-8 to internal bytes
pub(crate) struct LegacyDecoder {
    encoding: &'static Encoding,
    encoder: Encoder,
}

impl LegacyDecoder {
    pub(crate) fn open(label: &str) -> Result<Self> {
        let encoding = lookup(label)?;
        if encoding.output_encoding() != encoding {
            return Err(Error::unsupported(
                label,
                format!("cannot convert from UTF-8 to {}", encoding.name()),
            ));
        }
        Ok(Self {
            encoding,
            encoder: encoding.new_encoder(),
        })
    }
}

impl DecodeContext<u8> for LegacyDecoder {
    fn reset(&mut self) {
        self.encoder = self.encoding.new_encoder();
    }

    fn convert(&mut self, src: &[u8], dst: &mut [u8]) -> Step {
        let text = match utf8::validate(src) {
            Ok(text) => text,
            Err(reason) => return Step::invalid(0, 0, reason),
        };

        let folded = first_folded(self.encoding, text);
        let text = folded.map_or(text, |(at, _)| &text[..at]);

        let (result, read, written) = self
            .encoder
            .encode_from_utf8_without_replacement(text, dst, true);
        match (result, folded) {
            (EncoderResult::InputEmpty, None) => Step::complete(read, written),
            (EncoderResult::InputEmpty, Some((_, ch))) => {
                Step::invalid(read, written, unmappable(ch, self.encoding))
            }
            (EncoderResult::OutputFull, _) => Step::output_full(read, written),
            (EncoderResult::Unmappable(ch), _) => {
                Step::invalid(read, written, unmappable(ch, self.encoding))
            }
        }
    }
}
