use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;
use utoipa::ToSchema;

/// Per-table access flags for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TablePermission {
    /// Whether the table is listed and readable
    #[serde(default)]
    pub view: bool,
    /// Whether the table contents may be replaced
    #[serde(default)]
    pub edit: bool,
}

/// One entry of the credential file.
///
/// Either `password_hash` (an argon2id PHC string, preferred) or `password`
/// (legacy plaintext) must be present for the user to be able to log in.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    pub permissions: BTreeMap<String, TablePermission>,
}

pub type UserMap = BTreeMap<String, UserRecord>;

/// Error types for credential file handling
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Credential file could not be read
    #[error("failed to read credential file: {0}")]
    Io(#[from] std::io::Error),

    /// Credential file is not valid YAML or has the wrong shape
    #[error("failed to parse credential file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load users and permissions from a YAML file.
///
/// YAML structure:
/// ```yaml
/// username:
///   password_hash: "$argon2id$..."   # or `password: <plaintext>` for legacy files
///   permissions:
///     table_name:
///       view: true
///       edit: false
/// ```
///
/// The file is re-read on every call so edits take effect without a restart.
/// An empty file yields an empty user map.
pub fn load_users(path: &Path) -> Result<UserMap, CredentialError> {
    let contents = std::fs::read_to_string(path)?;
    let users: Option<UserMap> = serde_yaml::from_str(&contents)?;
    Ok(users.unwrap_or_default())
}

impl UserRecord {
    /// Verify a submitted password against this record.
    ///
    /// A stored hash takes precedence over a stored plaintext password. The
    /// plaintext fallback compares in constant time.
    pub fn verify_password(&self, supplied: &str) -> bool {
        if let Some(hash) = &self.password_hash {
            return match PasswordHash::new(hash) {
                Ok(parsed) => Argon2::default()
                    .verify_password(supplied.as_bytes(), &parsed)
                    .is_ok(),
                Err(e) => {
                    warn!("stored password hash is not a valid PHC string: {}", e);
                    false
                }
            };
        }
        if let Some(password) = &self.password {
            return password.as_bytes().ct_eq(supplied.as_bytes()).into();
        }
        false
    }

    pub fn permission_for(&self, table: &str) -> TablePermission {
        self.permissions.get(table).copied().unwrap_or_default()
    }
}

/// Hash a password into an argon2id PHC string suitable for `password_hash`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(yaml: &str) -> UserRecord {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn plaintext_password_matches_exactly() {
        let user = record("password: pw1\npermissions: {}\n");
        assert!(user.verify_password("pw1"));
        assert!(!user.verify_password("PW1"));
        assert!(!user.verify_password("pw1 "));
        assert!(!user.verify_password(""));
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("s3cret").unwrap();
        let user = record(&format!("password_hash: \"{}\"\n", hash));
        assert!(user.verify_password("s3cret"));
        assert!(!user.verify_password("wrong"));
    }

    #[test]
    fn record_without_any_password_never_verifies() {
        let user = record("permissions: {}\n");
        assert!(!user.verify_password(""));
        assert!(!user.verify_password("anything"));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let user = record("password_hash: not-a-phc-string\n");
        assert!(!user.verify_password("not-a-phc-string"));
    }

    #[test]
    fn load_users_parses_permissions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "alice:\n  password: pw1\n  permissions:\n    revenue:\n      view: true\n      edit: false\n"
        )
        .unwrap();

        let users = load_users(file.path()).unwrap();
        let alice = users.get("alice").unwrap();
        assert!(alice.permission_for("revenue").view);
        assert!(!alice.permission_for("revenue").edit);
        // Tables absent from the mapping default to no access
        assert!(!alice.permission_for("payroll").view);
    }

    #[test]
    fn load_users_missing_file_is_an_error() {
        assert!(load_users(Path::new("/nonexistent/users.yaml")).is_err());
    }

    #[test]
    fn load_users_empty_file_yields_empty_map() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let users = load_users(file.path()).unwrap();
        assert!(users.is_empty());
    }
}
