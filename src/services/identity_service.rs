use crate::models::SftpIdentity;
use crate::utils::error::{Result, SftpError};
use russh::keys::{decode_secret_key, HashAlg, PrivateKey, PublicKey};
use std::io::ErrorKind;
use std::path::Path;

/// Loads private keys from an [`SftpIdentity`]
pub struct IdentityService;

impl IdentityService {
    /// Load and, if needed, decrypt the private key of an identity
    pub async fn load_private_key(identity: &SftpIdentity) -> Result<PrivateKey> {
        let key_text = match identity {
            SftpIdentity::KeyFile { private_key_path, .. } => {
                tracing::debug!("Loading private key from {}", private_key_path.display());

                if Self::has_loose_permissions(private_key_path) {
                    tracing::warn!(
                        "Private key {} is accessible by group or others, should be 600",
                        private_key_path.display()
                    );
                }

                match tokio::fs::read_to_string(private_key_path).await {
                    Ok(text) => text,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        return Err(SftpError::KeyFileNotFound(
                            private_key_path.display().to_string(),
                        ))
                    }
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        return Err(SftpError::InvalidKey(format!(
                            "key file {} is not text",
                            private_key_path.display()
                        )))
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            SftpIdentity::RawKey { private_key, .. } => {
                tracing::debug!("Loading in-memory private key ({} bytes)", private_key.len());
                String::from_utf8(private_key.clone()).map_err(|_| {
                    SftpError::InvalidKey("raw key is not valid UTF-8 text".to_string())
                })?
            }
        };

        let key = Self::decode(&key_text, identity.passphrase())?;

        if let SftpIdentity::RawKey {
            public_key: Some(public_key),
            ..
        } = identity
        {
            Self::check_public_key(&key, public_key)?;
        }

        Ok(key)
    }

    /// Ensure a supplied OpenSSH public key belongs to the private key
    pub fn check_public_key(key: &PrivateKey, public_key: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(public_key)
            .map_err(|_| SftpError::InvalidKey("public key is not valid UTF-8 text".to_string()))?;
        let expected = PublicKey::from_openssh(text.trim())
            .map_err(|e| SftpError::InvalidKey(format!("unreadable public key: {}", e)))?;

        if expected.key_data() != key.public_key().key_data() {
            return Err(SftpError::InvalidKey(format!(
                "public key {} does not match the private key {}",
                Self::fingerprint(&expected),
                Self::fingerprint(key.public_key())
            )));
        }

        Ok(())
    }

    /// Decode OpenSSH or PEM key text
    pub fn decode(key_text: &str, passphrase: Option<&str>) -> Result<PrivateKey> {
        let key_text = key_text.trim();

        decode_secret_key(key_text, passphrase).map_err(|e| {
            if Self::is_encrypted(key_text) {
                match passphrase {
                    Some(_) => SftpError::KeyDecryptionFailed(format!("wrong passphrase ({})", e)),
                    None => SftpError::KeyDecryptionFailed(
                        "key is encrypted and no passphrase was given".to_string(),
                    ),
                }
            } else {
                SftpError::InvalidKey(e.to_string())
            }
        })
    }

    /// Whether the key text is passphrase protected
    pub fn is_encrypted(key_text: &str) -> bool {
        match PrivateKey::from_openssh(key_text) {
            Ok(key) => key.is_encrypted(),
            // Legacy PEM: "Proc-Type: 4,ENCRYPTED" or "BEGIN ENCRYPTED PRIVATE KEY"
            Err(_) => key_text.contains("ENCRYPTED"),
        }
    }

    /// SHA256 fingerprint of a public key
    pub fn fingerprint(key: &PublicKey) -> String {
        key.fingerprint(HashAlg::Sha256).to_string()
    }

    /// Whether group or others can access the key file
    #[cfg(unix)]
    pub fn has_loose_permissions(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        match std::fs::metadata(path) {
            Ok(metadata) => metadata.permissions().mode() & 0o077 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    pub fn has_loose_permissions(_path: &Path) -> bool {
        false
    }
}
