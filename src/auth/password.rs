//! Credential hashing. The store never holds plaintext; verification is
//! constant-time via bcrypt.

use crate::error::{AppError, AppResult};

pub fn hash(plaintext: &str) -> AppResult<String> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original() {
        let hashed = hash("s3cret").unwrap();
        assert!(verify("s3cret", &hashed));
    }

    #[test]
    fn wrong_password_fails() {
        let hashed = hash("s3cret").unwrap();
        assert!(!verify("guess", &hashed));
    }

    #[test]
    fn garbage_hash_fails_closed() {
        assert!(!verify("s3cret", "not-a-bcrypt-hash"));
    }

    #[test]
    fn same_password_different_salts() {
        let h1 = hash("s3cret").unwrap();
        let h2 = hash("s3cret").unwrap();
        assert_ne!(h1, h2);
        assert!(verify("s3cret", &h1));
        assert!(verify("s3cret", &h2));
    }
}
