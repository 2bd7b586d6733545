// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password hashing and account form validation.
//!
//! Passwords are stored as PHC strings (`$argon2id$v=19$...`) so the salt and
//! cost parameters travel with the hash.

use std::sync::LazyLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use regex::Regex;
use ring::rand::{SecureRandom, SystemRandom};
use rosary_core::RosaryError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Longest accepted username.
pub const USERNAME_MAX_LEN: usize = 150;

static USERNAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@.+_-]+$").unwrap());

/// Shortest accepted password.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Argon2id cost: 19 MiB, 2 passes, 1 lane.
const MEMORY_COST_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;
const SALT_LEN: usize = 16;

fn hasher() -> Result<Argon2<'static>, RosaryError> {
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| RosaryError::Internal(format!("invalid Argon2id parameters: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash `password` with a freshly generated salt into a PHC string.
pub fn hash_password(password: &SecretString) -> Result<String, RosaryError> {
    let salt = generate_salt()?;
    hasher()?
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RosaryError::Internal(format!("Argon2id hashing failed: {e}")))
}

/// Check `password` against a stored PHC string.
///
/// Malformed stored material (including the unusable `!` marker) never
/// verifies. The cost parameters are read from the stored string.
pub fn verify_password(password: &SecretString, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed)
        .is_ok()
}

fn generate_salt() -> Result<SaltString, RosaryError> {
    let mut bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| RosaryError::Internal("failed to generate random salt".to_string()))?;
    SaltString::encode_b64(&bytes)
        .map_err(|e| RosaryError::Internal(format!("failed to encode salt: {e}")))
}

/// Registration form body.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default = "empty_secret")]
    pub password1: SecretString,
    #[serde(default = "empty_secret")]
    pub password2: SecretString,
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default = "empty_secret")]
    pub password: SecretString,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

impl RegisterForm {
    /// Every problem with the form, in field order. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push("username: this field is required".to_string());
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.push(format!("username: at most {USERNAME_MAX_LEN} characters"));
        } else if !USERNAME_CHARS.is_match(username) {
            errors.push("username: letters, digits and @/./+/-/_ only".to_string());
        }

        let password = self.password1.expose_secret();
        if password.chars().count() < PASSWORD_MIN_LEN {
            errors.push(format!("password1: at least {PASSWORD_MIN_LEN} characters"));
        }
        if password != self.password2.expose_secret() {
            errors.push("password2: the two password fields didn't match".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn form(username: &str, p1: &str, p2: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            password1: secret(p1),
            password2: secret(p2),
        }
    }

    #[test]
    fn hash_then_verify() {
        let stored = hash_password(&secret("correct horse")).unwrap();
        assert!(stored.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"), "{stored}");
        assert!(verify_password(&secret("correct horse"), &stored));
        assert!(!verify_password(&secret("battery staple"), &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password(&secret("same password")).unwrap();
        let b = hash_password(&secret("same password")).unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&secret("same password"), &a));
        assert!(verify_password(&secret("same password"), &b));
    }

    #[test]
    fn unusable_hash_never_verifies() {
        assert!(!verify_password(&secret("testpass123"), "!"));
        assert!(!verify_password(&secret("testpass123"), ""));
        assert!(!verify_password(&secret("testpass123"), "$argon2id$garbage"));
    }

    #[test]
    fn stored_parameters_win_over_defaults() {
        // A hash made with cheaper settings still verifies.
        let params = Params::new(8 * 1024, 1, 1, None).unwrap();
        let cheap = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::encode_b64(b"0123456789abcdef").unwrap();
        let stored = cheap
            .hash_password(b"s3cretpass", &salt)
            .unwrap()
            .to_string();
        assert!(verify_password(&secret("s3cretpass"), &stored));
    }

    #[test]
    fn valid_registration_has_no_errors() {
        assert!(form("alice@example.com", "s3cretpass", "s3cretpass").validate().is_empty());
    }

    #[test]
    fn registration_errors_are_collected() {
        let errors = form("", "short", "other").validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].starts_with("username"));
        assert!(errors[1].starts_with("password1"));
        assert!(errors[2].starts_with("password2"));
    }

    #[test]
    fn username_charset_and_length() {
        assert!(!form("bad name", "s3cretpass", "s3cretpass").validate().is_empty());
        assert!(!form("semi;colon", "s3cretpass", "s3cretpass").validate().is_empty());
        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        assert!(!form(&long, "s3cretpass", "s3cretpass").validate().is_empty());
        let max = "a".repeat(USERNAME_MAX_LEN);
        assert!(form(&max, "s3cretpass", "s3cretpass").validate().is_empty());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let debug = format!("{:?}", form("alice", "hunter2hunter2", "hunter2hunter2"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
