use sha2::{Digest, Sha256};

/// Cryptographic hash over raw file bytes. Computed over the full byte
/// content — not the (possibly truncated) embedding input — so any change
/// anywhere in the file invalidates a cached vector, even a change past the
/// embedding truncation boundary.
pub fn compute_content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}

/// Truncate `bytes` (decoded lossily as UTF-8) to at most `max_chars`
/// characters for use as embedding input.
pub fn truncate_for_embedding(bytes: &[u8], max_chars: usize) -> String {
    String::from_utf8_lossy(bytes).chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_sensitive_to_any_byte() {
        let a = compute_content_hash(b"hello world");
        let b = compute_content_hash(b"hello world");
        let c = compute_content_hash(b"hello worle");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_changes_past_truncation_boundary() {
        let mut long = "x".repeat(8000);
        let before = compute_content_hash(long.as_bytes());
        long.push('y');
        let after = compute_content_hash(long.as_bytes());
        assert_ne!(before, after);
        assert_eq!(
            truncate_for_embedding(long.as_bytes(), 8000),
            "x".repeat(8000)
        );
    }

    #[test]
    fn truncate_caps_at_max_chars() {
        let text = "a".repeat(9000);
        let truncated = truncate_for_embedding(text.as_bytes(), 8000);
        assert_eq!(truncated.chars().count(), 8000);
    }
}
