//! Password Digests
//!
//! The ledger stores `lowercase-hex(SHA-256(password))` and matches the
//! digest inside its credential lookup, so the digest must stay
//! deterministic and unsalted to keep existing rows valid.

use crate::crypto;

/// Digest a password for storage or lookup.
pub fn digest(password: &str) -> String {
    crypto::to_hex(&crypto::sha256(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_vector() {
        assert_eq!(
            digest("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
        assert_eq!(
            digest("p"),
            "148de9c5a7a44d19e56cd9ae1a554bf67847afb0c58f6e12fa29ac7ddfca9940"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(digest("qwerty1"), digest("qwerty1"));
    }

    #[test]
    fn test_digest_differs_per_password() {
        assert_ne!(digest("qwerty1"), digest("qwerty2"));
    }
}
