/// Hex blake3 digest of raw content.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// First 8 bytes of the blake3 digest as an integer; used for feature hashing.
pub fn hash64(bytes: &[u8]) -> u64 {
    let h = blake3::hash(bytes);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&h.as_bytes()[..8]);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_eq!(content_hash(b"abc").len(), 64);
        assert_eq!(hash64(b"token"), hash64(b"token"));
        assert_ne!(hash64(b"token"), hash64(b"other"));
    }
}
