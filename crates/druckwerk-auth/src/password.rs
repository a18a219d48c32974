// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password hashing with PBKDF2-HMAC-SHA256.
//
// The stored format is a single string:
//
//   pbkdf2-sha256$<iterations>$<salt hex>$<derived key hex>
//
// Verification re-derives with the recorded parameters, so the iteration
// count can be raised for new registrations without invalidating old hashes.

use std::num::NonZeroU32;

use ring::rand::{SecureRandom, SystemRandom};
use ring::pbkdf2;

use druckwerk_core::error::{DruckwerkError, Result};

/// Iteration count for newly created hashes.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Derived key length in bytes (SHA-256 output size).
const CREDENTIAL_LEN: usize = 32;

/// Hash a password into the storable format.
pub fn hash_password(password: &str) -> Result<String> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| DruckwerkError::Auth("salt generation failed".into()))?;

    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).expect("nonzero constant");
    let mut derived = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut derived,
    );

    Ok(format!(
        "pbkdf2-sha256${}${}${}",
        PBKDF2_ITERATIONS,
        hex::encode(salt),
        hex::encode(derived)
    ))
}

/// Check a password against a stored hash.
///
/// Returns `false` for a wrong password or a malformed stored hash; the
/// comparison itself is constant-time (`ring::pbkdf2::verify`).
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (scheme, iterations, salt_hex, key_hex) = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some(s), Some(i), Some(salt), Some(key)) => (s, i, salt, key),
        _ => return false,
    };

    if scheme != "pbkdf2-sha256" || parts.next().is_some() {
        return false;
    }

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Some(iterations) = NonZeroU32::new(iterations) else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(key_hex) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(verify_password("hunter2", &hash));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same").expect("hash");
        let b = hash_password("same").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_is_rejected() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "pbkdf2-sha256$abc$00$00"));
        assert!(!verify_password("x", "md5$1000$00$00"));
    }
}
