//! The converter: encode to and decode from UTF-8 through growable storage
//!
//! Both directions run the same loop: reset the thread's context, convert,
//! and on [`Status::OutputFull`] ask for more room and go again. Running out
//! of room is never reported to the caller; only [`Status::Invalid`] is.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::buffer::{GrowableBuffer, GrowableTarget};
use crate::cache::{CacheStats, HandleCache};
use crate::codecs::BuiltinCodecs;
use crate::context::{ContextFactory, Status, create_handle_pair};
use crate::{CodeUnit, Error, Result, locale};

/// Smallest growth request, in bytes when encoding and code units when decoding
const MIN_GROWTH: usize = 4;

/// Converts between internal code units `C` and UTF-8
///
/// A converter is shared freely between threads (wrap it in an [`Arc`]); every
/// thread that uses it gets its own handle pair on first use, released when
/// that thread exits or the converter is dropped.
pub struct Converter<C: CodeUnit> {
    internal: String,
    cache: HandleCache<C>,
}

impl<C: CodeUnit> Converter<C>
where
    BuiltinCodecs: ContextFactory<C>,
{
    /// Create a converter for `internal` using the built-in codecs
    pub fn new(internal: &str) -> Result<Self> {
        Self::with_factory(internal, Arc::new(BuiltinCodecs))
    }
}

impl Converter<u8> {
    /// Create a byte converter for the host locale's character set
    pub fn from_locale() -> Result<Self> {
        Self::new(&locale::current_codeset())
    }
}

impl<C: CodeUnit> Converter<C> {
    /// Create a converter whose contexts come from `factory`.
    ///
    /// Both directions are opened once here so that an unsupported encoding
    /// fails now rather than on the first conversion. That pair is discarded.
    pub fn with_factory(internal: &str, factory: Arc<dyn ContextFactory<C>>) -> Result<Self> {
        let probe = create_handle_pair(factory.as_ref(), internal)?;
        drop(probe);

        debug!(internal, width = C::WIDTH, "created converter");
        Ok(Self {
            internal: internal.to_owned(),
            cache: HandleCache::new(internal, factory),
        })
    }

    /// Name of the internal encoding
    pub fn internal_encoding(&self) -> &str {
        &self.internal
    }

    /// Encode `input` as UTF-8 into `buffer`.
    ///
    /// Returns the offset just past the last byte written. Bytes in `buffer`
    /// beyond that offset are unspecified.
    pub fn encode<B>(&self, input: &[C], buffer: &mut B) -> Result<usize>
    where
        B: GrowableBuffer + ?Sized,
    {
        self.cache.with_handles(|handles| {
            let encoder = handles.encoder();
            encoder.reset();

            let mut consumed = 0;
            let mut end = None;
            let mut floor = MIN_GROWTH;
            loop {
                let remaining = (input.len() - consumed) * C::WIDTH;
                let how_many = remaining.max(floor);
                let spare = buffer.request_capacity(how_many, end);
                let start = spare.start();
                let step = encoder.convert(&input[consumed..], spare.into_bytes());

                consumed += step.read;
                end = Some(start + step.written);
                match step.status {
                    Status::Complete => return Ok(start + step.written),
                    Status::OutputFull => {
                        floor = if step.read == 0 && step.written == 0 {
                            how_many.saturating_mul(2)
                        } else {
                            MIN_GROWTH
                        };
                        trace!(
                            consumed,
                            remaining_units = input.len() - consumed,
                            "growing UTF-8 buffer"
                        );
                    }
                    Status::Invalid(reason) => return Err(Error::InvalidSequence(reason)),
                }
            }
        })?
    }

    /// Decode UTF-8 `input`, appending the code units to `target`.
    ///
    /// On error `target` holds whatever was decoded before the failure and
    /// should be discarded.
    pub fn decode<T>(&self, input: &[u8], target: &mut T) -> Result<()>
    where
        T: GrowableTarget<C> + ?Sized,
    {
        self.cache.with_handles(|handles| {
            let decoder = handles.decoder();
            decoder.reset();

            let mut consumed = 0;
            let mut used = target.len();
            loop {
                let increment = (input.len() - consumed).max(MIN_GROWTH);
                target.grow_by(increment);
                let step = decoder.convert(&input[consumed..], &mut target.units_mut()[used..]);

                consumed += step.read;
                used += step.written;
                match step.status {
                    Status::Complete => {
                        target.truncate(used);
                        return Ok(());
                    }
                    Status::OutputFull => {
                        trace!(
                            consumed,
                            remaining_bytes = input.len() - consumed,
                            "growing decode target"
                        );
                    }
                    Status::Invalid(reason) => {
                        target.truncate(used);
                        return Err(Error::InvalidSequence(reason));
                    }
                }
            }
        })?
    }

    /// Encode `input` into a new UTF-8 byte vector
    pub fn encode_to_vec(&self, input: &[C]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let end = self.encode(input, &mut buffer)?;
        buffer.truncate(end);
        Ok(buffer)
    }

    /// Decode UTF-8 `input` into a new vector of code units
    pub fn decode_to_vec(&self, input: &[u8]) -> Result<Vec<C>> {
        let mut target = Vec::new();
        self.decode(input, &mut target)?;
        Ok(target)
    }

    /// Release the calling thread's handle pair before the thread exits.
    ///
    /// Returns `false` if the thread held none. The next conversion on this
    /// thread creates a fresh pair.
    pub fn release_thread_handles(&self) -> bool {
        self.cache.release_current()
    }

    /// Current handle bookkeeping
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<C: CodeUnit> std::fmt::Debug for Converter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("internal", &self.internal)
            .field("width", &C::WIDTH)
            .finish_non_exhaustive()
    }
}
