//! Locates and base64-decodes the `"Program data: "` payload within a log
//! line, handing the decoded bytes to whichever protocol decoder the
//! caller selects.

use base64::Engine;

use crate::core::error::DecodeError;

const PREAMBLE: &str = "Program data: ";

/// Returns the base64-decoded bytes following the preamble, or an error if
/// the preamble is absent or the remainder is not valid base64.
pub fn decode_log_line(line: &str) -> Result<Vec<u8>, DecodeError> {
    let idx = line.find(PREAMBLE).ok_or(DecodeError::NoPreamble)?;
    let encoded = &line[idx + PREAMBLE.len()..];
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim_end())
        .map_err(|_| DecodeError::InvalidBase64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_payload_after_preamble() {
        let payload = b"hello world";
        let encoded = base64::engine::general_purpose::STANDARD.encode(payload);
        let line = format!("Program data: {encoded}");
        assert_eq!(decode_log_line(&line).unwrap(), payload);
    }

    #[test]
    fn fails_without_preamble() {
        let line = "Program log: nothing here";
        assert_eq!(decode_log_line(line), Err(DecodeError::NoPreamble));
    }

    #[test]
    fn fails_on_garbage_base64() {
        let line = "Program data: not-valid-base64!!!";
        assert_eq!(decode_log_line(line), Err(DecodeError::InvalidBase64));
    }
}
