// SPDX-License-Identifier: MIT

//! The appliance's own Ed25519 signing key, generated on first run and
//! persisted at `<state_dir>/keys/signing.key` with owner-only permissions.
//! Central publishes the corresponding public key (its fingerprint goes out
//! on every checkin) and verifies evidence bundles signed with this key;
//! this module only owns the private half and the signing operation.

use ed25519_dalek::{Signer, SigningKey as DalekSigningKey};
use rand::rngs::OsRng;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SigningKeyError {
    #[error("failed to read signing key at {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write signing key at {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("signing key file at {} is not valid hex: {source}", path.display())]
    InvalidEncoding { path: PathBuf, source: hex::FromHexError },
    #[error("signing key file at {} does not hold a 32-byte key", path.display())]
    WrongLength { path: PathBuf },
}

/// Wraps the appliance's Ed25519 key pair. The private key never leaves this
/// process except through [`SigningKey::sign`]'s output (a signature, never
/// the key bytes themselves).
pub struct SigningKey {
    inner: DalekSigningKey,
}

impl SigningKey {
    /// Loads the key at `path` if present, otherwise generates a new one and
    /// persists it (owner-only permissions) before returning it.
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<Self, SigningKeyError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(hex_key) => Self::from_hex(hex_key.trim(), path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::generate_and_persist(path),
            Err(source) => Err(SigningKeyError::Read { path: path.to_path_buf(), source }),
        }
    }

    fn from_hex(hex_key: &str, path: &Path) -> Result<Self, SigningKeyError> {
        let bytes = hex::decode(hex_key).map_err(|source| SigningKeyError::InvalidEncoding { path: path.to_path_buf(), source })?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| SigningKeyError::WrongLength { path: path.to_path_buf() })?;
        Ok(Self { inner: DalekSigningKey::from_bytes(&array) })
    }

    fn generate_and_persist(path: &Path) -> Result<Self, SigningKeyError> {
        let inner = DalekSigningKey::generate(&mut OsRng);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SigningKeyError::Write { path: parent.to_path_buf(), source })?;
        }
        let hex_key = hex::encode(inner.to_bytes());
        write_owner_only(path, hex_key.as_bytes()).map_err(|source| SigningKeyError::Write { path: path.to_path_buf(), source })?;
        tracing::info!(path = %path.display(), "generated new appliance signing key");
        Ok(Self { inner })
    }

    /// Hex-encoded Ed25519 public key, published on checkin as a fingerprint
    /// input and used by central to verify evidence bundle signatures.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.inner.verifying_key().to_bytes())
    }

    /// Signs `digest`, returning the hex-encoded detached signature.
    pub fn sign(&self, digest: &[u8]) -> String {
        hex::encode(self.inner.sign(digest).to_bytes())
    }
}

#[cfg(unix)]
fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = OpenOptions::new().create(true).write(true).truncate(true).mode(0o600).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}

#[cfg(test)]
#[path = "signing_key_tests.rs"]
mod tests;
