use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Login check. Outside production, a stored value that is not an argon2
/// hash is treated as a plaintext dev credential so hand-inserted test
/// accounts keep working.
pub fn verify_login(password: &str, stored: &str, production: bool) -> bool {
    if !production && !stored.starts_with("$argon2") {
        return password == stored;
    }
    verify_password(password, stored)
}
