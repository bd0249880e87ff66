/// Password Hashing and Verification
///
/// bcrypt with a random salt: hashing the same plaintext twice yields
/// different digests, and each remains independently verifiable.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::ApiError;

/// Hash a plaintext password with bcrypt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored hash.
///
/// A malformed hash verifies as `false` rather than surfacing an error;
/// credentials against a corrupt record are simply not accepted.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("the_impostor_is_sus").expect("Failed to hash password");

        assert_ne!(hash, "the_impostor_is_sus");
        assert!(hash.starts_with("$2"));
        assert!(verify_password("the_impostor_is_sus", &hash));
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hash = hash_password("correct-password").expect("Failed to hash password");
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_same_plaintext_hashes_differently() {
        let first = hash_password("pw").expect("Failed to hash password");
        let second = hash_password("pw").expect("Failed to hash password");

        // Random salt: digests differ but both verify.
        assert_ne!(first, second);
        assert!(verify_password("pw", &first));
        assert!(verify_password("pw", &second));
    }

    #[test]
    fn test_malformed_hash_verifies_as_false() {
        assert!(!verify_password("pw", "not-a-bcrypt-hash"));
        assert!(!verify_password("pw", ""));
    }
}
