#![deny(unsafe_code)]

use sha2::Digest;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Digest over several sources, each terminated by a NUL byte so that
/// moving text between sources changes the result.
pub fn sources_digest(parts: &[&str]) -> String {
    let mut hasher = sha2::Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_depends_on_source_boundaries() {
        assert_ne!(sources_digest(&["ab", "c"]), sources_digest(&["a", "bc"]));
        assert_eq!(sources_digest(&["ab", "c"]), sources_digest(&["ab", "c"]));
        assert_eq!(sha256_hex(b"").len(), 64);
    }
}
