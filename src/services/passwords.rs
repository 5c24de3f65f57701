// SPDX-License-Identifier: MIT

//! Password hashing with PBKDF2-HMAC-SHA256.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;
use subtle::ConstantTimeEq;

const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// A freshly derived password hash plus its salt, both base64.
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Hash a password with a random salt.
pub fn hash_password(password: &str) -> anyhow::Result<HashedPassword> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| anyhow::anyhow!("Failed to generate salt"))?;

    let mut credential = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(ITERATIONS).unwrap(),
        &salt,
        password.as_bytes(),
        &mut credential,
    );

    Ok(HashedPassword {
        hash: STANDARD.encode(credential),
        salt: STANDARD.encode(salt),
    })
}

/// Verify a password against a stored hash and salt (both base64).
///
/// Constant-time comparison; any decoding failure verifies as false.
pub fn verify_password(password: &str, hash_b64: &str, salt_b64: &str) -> bool {
    let (Ok(expected), Ok(salt)) = (STANDARD.decode(hash_b64), STANDARD.decode(salt_b64)) else {
        return false;
    };
    if expected.len() != CREDENTIAL_LEN {
        return false;
    }

    let mut credential = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(ITERATIONS).unwrap(),
        &salt,
        password.as_bytes(),
        &mut credential,
    );

    credential.ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hashed = hash_password("mainsheet-hiking-strap").unwrap();
        assert!(verify_password(
            "mainsheet-hiking-strap",
            &hashed.hash,
            &hashed.salt
        ));
        assert!(!verify_password("wrong", &hashed.hash, &hashed.salt));
    }

    #[test]
    fn test_garbage_stored_values_fail_closed() {
        assert!(!verify_password("pw", "not-base64!!", "also-not"));
        assert!(!verify_password("pw", "c2hvcnQ=", "c2FsdA=="));
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let a = hash_password("pw").unwrap();
        let b = hash_password("pw").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }
}
