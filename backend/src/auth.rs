//! Password hashing and bearer session tokens.
//!
//! Passwords are stored as salted argon2 hashes. A session token is a random
//! value handed to the client once; only its SHA-256 digest is stored.

use actix_web::{http::header, HttpRequest};
use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("hashing password failed: {e}"))?;

    Ok(hash.to_string())
}

/// Constant-time check of `password` against a stored hash. A malformed hash
/// never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn token_hash(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("abc1234").unwrap();

        assert!(!hash.contains("abc1234"));
        assert!(verify_password("abc1234", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(
            hash_password("abc1234").unwrap(),
            hash_password("abc1234").unwrap()
        );
    }

    #[test]
    fn plaintext_stored_value_never_matches() {
        assert!(!verify_password("abc1234", "abc1234"));
    }

    #[test]
    fn tokens() {
        let token = new_token();
        assert_eq!(token.len(), 32);
        assert_ne!(token, new_token());
        assert_eq!(token_hash(&token), token_hash(&token));
        assert_eq!(token_hash(&token).len(), 64);
    }

    #[test]
    fn bearer_header() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}
