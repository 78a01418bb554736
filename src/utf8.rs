//! UTF-8 input validation shared by every decode context

/// Borrow `src` as text, or describe why it is not valid UTF-8
pub(crate) fn validate(src: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(src).map_err(|err| match err.error_len() {
        Some(len) => format!(
            "invalid UTF-8 sequence of {} byte(s) at offset {}",
            len,
            err.valid_up_to()
        ),
        None => format!(
            "incomplete UTF-8 sequence at end of input (offset {})",
            err.valid_up_to()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert_eq!(validate("héllo".as_bytes()), Ok("héllo"));
        assert!(validate(&[0xFF, 0xFE]).unwrap_err().contains("offset 0"));
        assert!(validate(&[b'a', 0xE3, 0x81]).unwrap_err().contains("end of input"));
    }
}
