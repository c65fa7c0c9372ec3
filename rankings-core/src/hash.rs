use crate::constants::{HASH_LEN, SALT_GLOBAL};
use sha2::{Digest, Sha256};

/// Hashes `raw_id` salted with [`SALT_GLOBAL`], returning the first
/// [`HASH_LEN`] lowercase hex characters of the SHA-256 digest.
///
/// This is part of the on-disk contract: the salt and truncation length
/// must never change, or previously emitted `id` fields stop matching.
pub fn hash_with_salt(raw_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_id.as_bytes());
    hasher.update(SALT_GLOBAL.as_bytes());
    let digest = hasher.finalize();
    let encoded = hex::encode(digest);
    encoded[..HASH_LEN].to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_len_and_charset() {
        let h = hash_with_salt("12345678");
        assert_eq!(h.len(), HASH_LEN);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_with_salt("abc"), hash_with_salt("abc"));
    }

    #[test]
    fn test_hash_differs_by_input() {
        assert_ne!(hash_with_salt("abc"), hash_with_salt("abd"));
    }
}
