//! Inbound frame validation rules.

use super::codec::CodecError;

/// Rejects frames larger than `max_frame_bytes`.
pub fn validate_frame(raw: &str, max_frame_bytes: usize) -> Result<(), CodecError> {
    if raw.len() > max_frame_bytes {
        return Err(CodecError::FrameTooLarge {
            size: raw.len(),
            max: max_frame_bytes,
        });
    }
    Ok(())
}

/// Flattens embedded newlines to spaces and trims the frame.
pub fn normalize(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  {\"a\":\n1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert!(validate_frame("abcd", 4).is_ok());
        assert!(validate_frame("abcde", 4).is_err());
    }
}
