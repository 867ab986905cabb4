//! Driver credential store.
//!
//! The credentials file is a flat JSON object of driver id to secret. It is
//! loaded verbatim and never rewritten; when it is missing a default set of
//! drivers is seeded. Secrets are held in memory as salted Argon2id hashes,
//! so a plaintext file and a file of PHC hash strings both work.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use busline_core::{DriverId, TrackerError};
use tracing::info;

use super::json_file::{read_if_exists, write_pretty};

/// Accounts written when no credentials file exists yet.
const DEFAULT_DRIVERS: [(&str, &str); 3] = [
    ("driver1", "pass123"),
    ("driver2", "pass456"),
    ("admin", "admin123"),
];

#[derive(Debug)]
pub struct CredentialStore {
    hashes: HashMap<DriverId, String>,
}

impl CredentialStore {
    /// Load the credentials file at `path`, seeding it when absent.
    pub async fn initialize(path: impl Into<PathBuf>) -> Result<Self, TrackerError> {
        let path = path.into();

        let secrets: BTreeMap<String, String> = match read_if_exists(&path).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                TrackerError::storage(&path, format!("malformed credentials file: {e}"))
            })?,
            None => {
                let seed: BTreeMap<String, String> = DEFAULT_DRIVERS
                    .iter()
                    .map(|(id, secret)| (id.to_string(), secret.to_string()))
                    .collect();
                write_pretty(&path, &seed).await?;
                info!("Seeded {} default drivers into {}", seed.len(), path.display());
                seed
            }
        };

        let hash_path = path.clone();
        let hashes = tokio::task::spawn_blocking(move || hash_all(&hash_path, secrets))
            .await
            .map_err(|e| TrackerError::storage(&path, e))??;

        info!("Loaded {} driver credentials from {}", hashes.len(), path.display());
        Ok(Self { hashes })
    }

    /// True iff `identity` exists and `secret` matches its stored secret exactly.
    ///
    /// CPU-heavy; async callers should run it on the blocking pool.
    pub fn verify(&self, identity: &str, secret: &str) -> bool {
        let Some(stored) = self.hashes.get(identity) else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.hashes.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

fn hash_all(
    path: &Path,
    secrets: BTreeMap<String, String>,
) -> Result<HashMap<DriverId, String>, TrackerError> {
    let argon2 = Argon2::default();
    secrets
        .into_iter()
        .map(|(id, secret)| -> Result<(DriverId, String), TrackerError> {
            let hash = if is_phc_hash(&secret) {
                secret
            } else {
                let salt = SaltString::generate(&mut OsRng);
                argon2
                    .hash_password(secret.as_bytes(), &salt)
                    .map_err(|e| TrackerError::storage(path, format!("hashing secret for {id}: {e}")))?
                    .to_string()
            };
            Ok((DriverId::from(id), hash))
        })
        .collect()
}

fn is_phc_hash(secret: &str) -> bool {
    secret.starts_with("$argon2") && PasswordHash::new(secret).is_ok()
}
