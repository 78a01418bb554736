//! Conversion contexts and the factory that opens them in pairs
//!
//! A context converts in one direction only and may carry state between
//! calls (for example the shift-state of ISO-2022-JP). Contexts are `Send`
//! but never shared: each thread drives its own [`HandlePair`].

use tracing::{debug, warn};

use crate::{CodeUnit, Result};

/// How a single conversion step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// All input was consumed
    Complete,
    /// The output region filled up before the input was consumed
    OutputFull,
    /// The input holds a sequence that cannot be converted
    Invalid(String),
}

/// Progress report for one call into a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Source units consumed
    pub read: usize,
    /// Destination units produced
    pub written: usize,
    /// Why the step stopped
    pub status: Status,
}

impl Step {
    /// Step that consumed its whole input
    pub fn complete(read: usize, written: usize) -> Self {
        Self {
            read,
            written,
            status: Status::Complete,
        }
    }

    /// Step that ran out of output room
    pub fn output_full(read: usize, written: usize) -> Self {
        Self {
            read,
            written,
            status: Status::OutputFull,
        }
    }

    /// Step that hit an unconvertible sequence
    pub fn invalid(read: usize, written: usize, reason: impl Into<String>) -> Self {
        Self {
            read,
            written,
            status: Status::Invalid(reason.into()),
        }
    }
}

/// Internal code units to UTF-8
pub trait EncodeContext<C: CodeUnit>: Send {
    /// Discard any state left over from a previous conversion
    fn reset(&mut self);

    /// Convert as much of `src` as fits into `dst`
    fn convert(&mut self, src: &[C], dst: &mut [u8]) -> Step;
}

/// UTF-8 to internal code units
pub trait DecodeContext<C: CodeUnit>: Send {
    /// Discard any state left over from a previous conversion
    fn reset(&mut self);

    /// Convert as much of `src` as fits into `dst`
    fn convert(&mut self, src: &[u8], dst: &mut [C]) -> Step;
}

/// Opens conversion contexts for a named internal encoding
///
/// Implementations report a missing conversion path as
/// [`Error::UnsupportedEncoding`](crate::Error::UnsupportedEncoding).
pub trait ContextFactory<C: CodeUnit>: Send + Sync {
    /// Open a UTF-8 to `internal` context
    fn open_decoder(&self, internal: &str) -> Result<Box<dyn DecodeContext<C>>>;

    /// Open an `internal` to UTF-8 context
    fn open_encoder(&self, internal: &str) -> Result<Box<dyn EncodeContext<C>>>;
}

/// Both directions of conversion for one thread
pub struct HandlePair<C: CodeUnit> {
    decoder: Box<dyn DecodeContext<C>>,
    encoder: Box<dyn EncodeContext<C>>,
}

impl<C: CodeUnit> HandlePair<C> {
    /// The UTF-8 to internal context
    pub fn decoder(&mut self) -> &mut dyn DecodeContext<C> {
        self.decoder.as_mut()
    }

    /// The internal to UTF-8 context
    pub fn encoder(&mut self) -> &mut dyn EncodeContext<C> {
        self.encoder.as_mut()
    }
}

impl<C: CodeUnit> std::fmt::Debug for HandlePair<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlePair").finish_non_exhaustive()
    }
}

/// Open a decode and an encode context for `internal`.
///
/// The decode context is opened first. If the encode context then fails, the
/// decode context is released before the error is returned.
pub fn create_handle_pair<C: CodeUnit>(
    factory: &dyn ContextFactory<C>,
    internal: &str,
) -> Result<HandlePair<C>> {
    let decoder = factory.open_decoder(internal)?;
    let encoder = match factory.open_encoder(internal) {
        Ok(encoder) => encoder,
        Err(err) => {
            drop(decoder);
            warn!(internal, error = %err, "released decode context after encode context failed");
            return Err(err);
        }
    };

    debug!(internal, width = C::WIDTH, "opened conversion handle pair");
    Ok(HandlePair { decoder, encoder })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::Error;

    struct Passthrough;

    impl EncodeContext<u8> for Passthrough {
        fn reset(&mut self) {}

        fn convert(&mut self, src: &[u8], dst: &mut [u8]) -> Step {
            let n = src.len().min(dst.len());
            dst[..n].copy_from_slice(&src[..n]);
            if n == src.len() {
                Step::complete(n, n)
            } else {
                Step::output_full(n, n)
            }
        }
    }

    impl DecodeContext<u8> for Passthrough {
        fn reset(&mut self) {}

        fn convert(&mut self, src: &[u8], dst: &mut [u8]) -> Step {
            EncodeContext::convert(self, src, dst)
        }
    }

    struct Counted {
        live: Arc<AtomicUsize>,
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl DecodeContext<u8> for Counted {
        fn reset(&mut self) {}

        fn convert(&mut self, _src: &[u8], _dst: &mut [u8]) -> Step {
            Step::complete(0, 0)
        }
    }

    /// Opens decoders fine but never an encoder
    struct HalfBroken {
        live: Arc<AtomicUsize>,
    }

    impl ContextFactory<u8> for HalfBroken {
        fn open_decoder(&self, _internal: &str) -> Result<Box<dyn DecodeContext<u8>>> {
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Counted {
                live: Arc::clone(&self.live),
            }))
        }

        fn open_encoder(&self, internal: &str) -> Result<Box<dyn EncodeContext<u8>>> {
            Err(Error::unsupported(internal, "no encoder"))
        }
    }

    struct Working;

    impl ContextFactory<u8> for Working {
        fn open_decoder(&self, _internal: &str) -> Result<Box<dyn DecodeContext<u8>>> {
            Ok(Box::new(Passthrough))
        }

        fn open_encoder(&self, _internal: &str) -> Result<Box<dyn EncodeContext<u8>>> {
            Ok(Box::new(Passthrough))
        }
    }

    #[test]
    fn test_partial_failure_releases_decoder() {
        let live = Arc::new(AtomicUsize::new(0));
        let factory = HalfBroken {
            live: Arc::clone(&live),
        };

        let err = create_handle_pair(&factory, "half").unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding { .. }));
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pair_exposes_both_directions() {
        let mut pair = create_handle_pair(&Working, "bytes").unwrap();

        let mut out = [0u8; 3];
        let step = pair.encoder().convert(b"abc", &mut out);
        assert_eq!(step, Step::complete(3, 3));

        let mut out = [0u8; 2];
        let step = pair.decoder().convert(b"abc", &mut out);
        assert_eq!(step.status, Status::OutputFull);
        assert_eq!(&out, b"ab");
    }
}
