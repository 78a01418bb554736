//! Caller-owned output storage for the conversion loops
//!
//! The converter never allocates output itself. When encoding it asks a
//! [`GrowableBuffer`] for more room; when decoding it grows and trims a
//! [`GrowableTarget`]. All positions are plain offsets into the caller's
//! storage, so a reallocation inside a growth call never invalidates what the
//! converter has recorded.

use crate::CodeUnit;

/// Writable region handed out by [`GrowableBuffer::request_capacity`]
#[derive(Debug)]
pub struct Spare<'a> {
    start: usize,
    bytes: &'a mut [u8],
}

impl<'a> Spare<'a> {
    /// Wrap `bytes`, which begin at offset `start` of the owning buffer
    pub fn new(start: usize, bytes: &'a mut [u8]) -> Self {
        Self { start, bytes }
    }

    /// Offset of the first writable byte within the owning buffer
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of writable bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_bytes(self) -> &'a mut [u8] {
        self.bytes
    }
}

/// Byte sink that grows on request while encoding to UTF-8
pub trait GrowableBuffer {
    /// Return a region of at least `min_bytes` writable bytes.
    ///
    /// `previous_end` is `None` on the first request of a conversion, in which
    /// case the region starts at the buffer's current write position. Later
    /// requests pass the offset just past the last byte written so far and the
    /// region must start exactly there, with everything before it preserved.
    fn request_capacity(&mut self, min_bytes: usize, previous_end: Option<usize>) -> Spare<'_>;
}

impl GrowableBuffer for Vec<u8> {
    fn request_capacity(&mut self, min_bytes: usize, previous_end: Option<usize>) -> Spare<'_> {
        let start = previous_end.unwrap_or(self.len());
        let wanted = start + min_bytes;
        if self.len() < wanted {
            self.resize(wanted, 0);
        }
        Spare::new(start, &mut self[start..])
    }
}

/// Resizable code-unit sequence that receives decoded output
pub trait GrowableTarget<C: CodeUnit> {
    /// Number of code units currently held
    fn len(&self) -> usize;

    /// Whether no code units are held
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `additional` zeroed code units, keeping existing content
    fn grow_by(&mut self, additional: usize);

    /// Shrink to exactly `len` code units
    fn truncate(&mut self, len: usize);

    /// All code units, writable
    fn units_mut(&mut self) -> &mut [C];
}

impl<C: CodeUnit> GrowableTarget<C> for Vec<C> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn grow_by(&mut self, additional: usize) {
        self.resize(Vec::len(self) + additional, C::default());
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }

    fn units_mut(&mut self) -> &mut [C] {
        self.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_buffer_first_request_anchors_at_len() {
        let mut buffer = b"ab".to_vec();
        let spare = buffer.request_capacity(4, None);
        assert_eq!(spare.start(), 2);
        assert!(spare.len() >= 4);
        assert_eq!(&buffer[..2], b"ab");
    }

    #[test]
    fn test_vec_buffer_continues_after_previous_end() {
        let mut buffer = Vec::new();
        let spare = buffer.request_capacity(4, None);
        spare.into_bytes()[..3].copy_from_slice(b"xyz");

        let spare = buffer.request_capacity(8, Some(3));
        assert_eq!(spare.start(), 3);
        assert!(spare.len() >= 8);
        assert_eq!(&buffer[..3], b"xyz");
    }

    #[test]
    fn test_vec_target_grow_and_truncate() {
        let mut target: Vec<u16> = vec![1, 2];
        GrowableTarget::grow_by(&mut target, 3);
        assert_eq!(target, [1, 2, 0, 0, 0]);
        GrowableTarget::truncate(&mut target, 3);
        assert_eq!(GrowableTarget::len(&target), 3);
    }
}
