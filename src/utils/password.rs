use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::OAuthError;

/// Hash an owner credential using Argon2id
///
/// # Returns
/// * `Ok(String)` - The hashed credential as a PHC string
/// * `Err(OAuthError)` - If hashing fails
pub fn hash_password(password: &str) -> Result<String, OAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| OAuthError::ServerError(format!("credential hashing failed: {}", e)))
}

/// Verify an owner credential against a stored hash
///
/// # Returns
/// * `Ok(true)` - If the credential matches
/// * `Ok(false)` - If the credential does not match
/// * `Err(OAuthError)` - If the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, OAuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| OAuthError::ServerError(format!("invalid credential hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_produces_valid_hash() {
        let password = "secure_password123";
        let hash = hash_password(password).unwrap();

        assert!(!hash.is_empty());
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_hash_password_not_equal_to_plain_text() {
        let password = "my_secret_password";
        let hash = hash_password(password).unwrap();

        assert_ne!(password, hash);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = "correct_password";
        let hash = hash_password(password).unwrap();

        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hash_password_different_salts() {
        let password = "same_password";
        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        assert_ne!(hash1, hash2);

        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = verify_password("test", "not_a_valid_hash");
        assert!(result.is_err());
    }
}
