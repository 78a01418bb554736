//! Default [`ContextFactory`] for every supported code-unit width

use crate::context::{ContextFactory, DecodeContext, EncodeContext};
use crate::legacy::{LegacyDecoder, LegacyEncoder};
use crate::wide::{
    Utf16Decoder, Utf16Encoder, Utf32Decoder, Utf32Encoder, require_utf16, require_utf32,
};
use crate::Result;

/// Built-in codecs: `encoding_rs` for 8-bit units, UTF-16 and UTF-32 for wide units
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCodecs;

impl ContextFactory<u8> for BuiltinCodecs {
    fn open_decoder(&self, internal: &str) -> Result<Box<dyn DecodeContext<u8>>> {
        Ok(Box::new(LegacyDecoder::open(internal)?))
    }

    fn open_encoder(&self, internal: &str) -> Result<Box<dyn EncodeContext<u8>>> {
        Ok(Box::new(LegacyEncoder::open(internal)?))
    }
}

impl ContextFactory<u16> for BuiltinCodecs {
    fn open_decoder(&self, internal: &str) -> Result<Box<dyn DecodeContext<u16>>> {
        require_utf16(internal)?;
        Ok(Box::new(Utf16Decoder))
    }

    fn open_encoder(&self, internal: &str) -> Result<Box<dyn EncodeContext<u16>>> {
        require_utf16(internal)?;
        Ok(Box::new(Utf16Encoder))
    }
}

impl ContextFactory<u32> for BuiltinCodecs {
    fn open_decoder(&self, internal: &str) -> Result<Box<dyn DecodeContext<u32>>> {
        require_utf32(internal)?;
        Ok(Box::new(Utf32Decoder))
    }

    fn open_encoder(&self, internal: &str) -> Result<Box<dyn EncodeContext<u32>>> {
        require_utf32(internal)?;
        Ok(Box::new(Utf32Encoder))
    }
}
