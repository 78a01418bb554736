//! Round-trip and growth properties over generated input

use proptest::prelude::*;
use utf8_wire::{Converter, GrowableBuffer, Spare};

/// Grants exactly the requested room, so every expansion forces another request
#[derive(Default)]
struct ExactBuffer {
    bytes: Vec<u8>,
}

impl GrowableBuffer for ExactBuffer {
    fn request_capacity(&mut self, min_bytes: usize, previous_end: Option<usize>) -> Spare<'_> {
        let start = previous_end.unwrap_or(self.bytes.len());
        self.bytes.truncate(start);
        self.bytes.resize(start + min_bytes, 0);
        Spare::new(start, &mut self.bytes[start..])
    }
}

proptest! {
    #[test]
    fn prop_windows_1252_bytes_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let converter = Converter::<u8>::new("windows-1252").unwrap();
        let utf8 = converter.encode_to_vec(&bytes).unwrap();
        prop_assert!(std::str::from_utf8(&utf8).is_ok());
        prop_assert_eq!(converter.decode_to_vec(&utf8).unwrap(), bytes);
    }

    #[test]
    fn prop_utf16_round_trip(text in any::<String>()) {
        let converter = Converter::<u16>::new("UTF-16").unwrap();
        let units: Vec<u16> = text.encode_utf16().collect();
        let utf8 = converter.encode_to_vec(&units).unwrap();
        prop_assert_eq!(&utf8, text.as_bytes());
        prop_assert_eq!(converter.decode_to_vec(&utf8).unwrap(), units);
    }

    #[test]
    fn prop_utf32_round_trip(text in any::<String>()) {
        let converter = Converter::<u32>::new("UTF-32").unwrap();
        let units: Vec<u32> = text.chars().map(u32::from).collect();
        let utf8 = converter.encode_to_vec(&units).unwrap();
        prop_assert_eq!(converter.decode_to_vec(&utf8).unwrap(), units);
    }

    #[test]
    fn prop_exact_growth_matches_vec(text in "[a-zé€🌍]{0,200}") {
        let converter = Converter::<u16>::new("UTF-16").unwrap();
        let units: Vec<u16> = text.encode_utf16().collect();

        let mut exact = ExactBuffer::default();
        let end = converter.encode(&units, &mut exact).unwrap();

        let expected = converter.encode_to_vec(&units).unwrap();
        prop_assert_eq!(&exact.bytes[..end], expected.as_slice());
        prop_assert_eq!(&exact.bytes[..end], text.as_bytes());
    }
}
