use anyhow::{anyhow, Result};

use crate::credentials;

/// Print an argon2id PHC string for use as `password_hash` in the
/// credential file.
pub fn hash_password(password: &str) -> Result<()> {
    let hash = credentials::hash_password(password)
        .map_err(|e| anyhow!("failed to hash password: {}", e))?;
    println!("{hash}");
    Ok(())
}
