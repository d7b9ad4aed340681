//! Read-only access to a node repo's keystore directory.

use crate::error::{MigrationError, Result};
use base64::{engine::general_purpose, Engine as _};
use data_encoding::BASE32_NOPAD;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Keystore entry holding the node's API JWT signing key
pub const JWT_SECRET_NAME: &str = "auth-jwt-private";

/// On-disk key record, `PrivateKey` is standard base64
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyInfo {
    #[serde(rename = "Type", default)]
    key_type: String,
    private_key: String,
}

/// A named key read from the keystore
#[derive(Clone, PartialEq, Eq)]
pub struct StoredKey {
    pub key_type: String,
    pub private_key: Vec<u8>,
}

impl std::fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredKey")
            .field("key_type", &self.key_type)
            .field("private_key", &format!("<{} bytes>", self.private_key.len()))
            .finish()
    }
}

/// Keystore files are named by the unpadded RFC 4648 base32 of the key name.
pub fn key_file_name(name: &str) -> String {
    BASE32_NOPAD.encode(name.as_bytes())
}

/// Keystore rooted at `<repo>/keystore`
#[derive(Debug, Clone)]
pub struct FsKeyStore {
    root: PathBuf,
}

impl FsKeyStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and decode the key stored under `name`
    pub fn get(&self, name: &str) -> Result<StoredKey> {
        let path = self.root.join(key_file_name(name));
        let raw = fs::read(&path)
            .map_err(|e| MigrationError::secret_lookup(name, format!("{}: {}", path.display(), e)))?;
        let info: KeyInfo = serde_json::from_slice(&raw)
            .map_err(|e| MigrationError::secret_lookup(name, format!("malformed key file: {}", e)))?;
        let private_key = general_purpose::STANDARD
            .decode(info.private_key.trim())
            .map_err(|e| MigrationError::secret_lookup(name, format!("bad key encoding: {}", e)))?;
        Ok(StoredKey {
            key_type: info.key_type,
            private_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_names_match_node_keystore() {
        assert_eq!(key_file_name(JWT_SECRET_NAME), "MF2XI2BNNJ3XILLQOJUXMYLUMU");
        assert_eq!(key_file_name("f"), "MY");
        assert_eq!(key_file_name("fo"), "MZXQ");
        assert_eq!(key_file_name("foobar"), "MZXW6YTBOI");
        assert_eq!(key_file_name(""), "");
    }

    #[test]
    fn reads_jwt_key() {
        let dir = tempdir().unwrap();
        let key = [7u8, 8, 9, 10, 11];
        let record = format!(
            r#"{{"Type":"jwt-hmac-secret","PrivateKey":"{}"}}"#,
            general_purpose::STANDARD.encode(key)
        );
        fs::write(dir.path().join(key_file_name(JWT_SECRET_NAME)), record).unwrap();

        let ks = FsKeyStore::new(dir.path());
        let stored = ks.get(JWT_SECRET_NAME).unwrap();
        assert_eq!(stored.key_type, "jwt-hmac-secret");
        assert_eq!(stored.private_key, key);
    }

    #[test]
    fn missing_key_names_the_key() {
        let dir = tempdir().unwrap();
        let err = FsKeyStore::new(dir.path()).get(JWT_SECRET_NAME).unwrap_err();
        assert!(matches!(err, MigrationError::SecretLookup { ref name, .. } if name == JWT_SECRET_NAME));
    }

    #[test]
    fn malformed_record_is_a_lookup_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(key_file_name("k")), "not json").unwrap();
        let err = FsKeyStore::new(dir.path()).get("k").unwrap_err();
        assert!(matches!(err, MigrationError::SecretLookup { .. }));
    }
}
