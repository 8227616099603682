//! File identity hashing
//!
//! Offers, accepts and aborts identify a file by its name plus a short hash,
//! so both peers can match messages to the same transfer without a shared
//! sequence number.

use sha2::{Digest, Sha256};

/// Largest value a file hash can take (31 bits, always non-negative on the wire)
pub const MAX_FILE_HASH: u32 = 0x7FFF_FFFF;

/// Compute the identity hash of a file from its name and size
///
/// Stable across runs and platforms: the same name and size always give the
/// same hash.
pub fn file_hash(name: &str, size: u64) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(size.to_be_bytes());
    let digest = hasher.finalize();

    let bytes = [digest[0], digest[1], digest[2], digest[3]];
    u32::from_be_bytes(bytes) & MAX_FILE_HASH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_hash_is_stable() {
        assert_eq!(file_hash("photo.jpg", 1024), file_hash("photo.jpg", 1024));
    }

    #[test]
    fn test_file_hash_depends_on_name_and_size() {
        let base = file_hash("photo.jpg", 1024);
        assert_ne!(base, file_hash("photo.png", 1024));
        assert_ne!(base, file_hash("photo.jpg", 1025));
    }

    #[test]
    fn test_file_hash_fits_31_bits() {
        for size in 0..64 {
            assert!(file_hash("file.bin", size) <= MAX_FILE_HASH);
        }
    }
}
