// ABOUTME: Salted adaptive password hashing for CRM user accounts
// ABOUTME: Argon2id with a fresh random salt per call, stored as a PHC string

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use crate::error::{AdminError, AdminResult};
use tokio_postgres::GenericClient;

/// Hash a plaintext password with Argon2id.
///
/// A new salt is drawn from the OS RNG on every call, so hashing the same
/// password twice yields two different strings that both verify. The PHC
/// encoding (`$argon2id$v=19$m=...`) is under 100 bytes and fits the
/// `users.password_hash VARCHAR(255)` column.
pub fn hash_password(password: &str) -> AdminResult<String> {
    if password.is_empty() {
        return Err(AdminError::malformed("Password cannot be empty"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AdminError::malformed(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> AdminResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AdminError::malformed(format!("Invalid password hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AdminError::malformed(format!(
            "Password verification failed: {e}"
        ))),
    }
}

/// The account whose password was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Store `password_hash` for the user with `email` and bump `updated_at`.
///
/// Returns [`AdminError::NotFound`] when no user has that email. Run it inside a
/// transaction so the caller decides when the change becomes visible.
pub async fn store_password_hash<C: GenericClient>(
    client: &C,
    email: &str,
    password_hash: &str,
) -> AdminResult<UserAccount> {
    let row = client
        .query_opt(
            "UPDATE public.users
             SET password_hash = $1, updated_at = NOW()
             WHERE email = $2
             RETURNING id::text, email, first_name, last_name",
            &[&password_hash, &email],
        )
        .await?;

    let row = row.ok_or_else(|| AdminError::not_found(format!("User not found: {}", email)))?;
    Ok(UserAccount {
        id: row.get(0),
        email: row.get(1),
        first_name: row.get(2),
        last_name: row.get(3),
    })
}
