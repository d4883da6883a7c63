//! Credential checks for password accounts.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Trim and lowercase; both halves around `@` must be present.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidInput("a valid email is required".into())),
    }
}

pub fn check_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// PHC-formatted argon2 hash with a fresh salt.
pub fn hash(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify(password: &str, stored: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn emails_without_both_halves_are_rejected() {
        for bad in ["", "alice", "@example.com", "alice@"] {
            assert!(matches!(
                normalize_email(bad),
                Err(AuthError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn short_passwords_fail_the_strength_check() {
        assert!(check_strength("1234567").is_err());
        assert!(check_strength("12345678").is_ok());
    }

    #[test]
    fn verify_accepts_only_the_original_password() {
        let stored = hash("correct-horse").unwrap();
        assert!(verify("correct-horse", &stored).is_ok());
        assert!(matches!(
            verify("battery-staple", &stored),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
