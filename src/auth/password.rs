//! bcrypt credential hashing.

use super::AuthError;

/// Stand-in hash verified against when the email is unknown, so a miss costs
/// the same as a wrong password.
const DUMMY_HASH: &str = "$2b$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Upstream(e.to_string()))
}

/// Verify `password` against a stored hash, or burn a dummy verification
/// when there is no account.
pub fn verify_password(password: &str, stored: Option<&str>) -> Result<bool, AuthError> {
    match stored {
        Some(hash) => {
            bcrypt::verify(password, hash).map_err(|e| AuthError::Upstream(e.to_string()))
        }
        None => {
            let _ = bcrypt::verify(password, DUMMY_HASH);
            Ok(false)
        }
    }
}
