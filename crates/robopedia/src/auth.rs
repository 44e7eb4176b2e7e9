//! Password digests for administrative users.
//!
//! Stored format: `sha256$<salt>$<hex digest of salt + password>`.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const SCHEME: &str = "sha256";

pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{SCHEME}${salt}${}", digest(&salt, password))
}

pub fn verify_password(stored: &str, candidate: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(SCHEME), Some(salt), Some(expected)) => digest(salt, candidate) == expected,
        _ => false,
    }
}

pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with(&format!("{SCHEME}$"))
}

fn digest(salt: &str, password: &str) -> String {
    let hash = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    format!("{hash:x}")
}
