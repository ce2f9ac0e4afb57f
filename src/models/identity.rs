use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Private key material used for public key authentication
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SftpIdentity {
    /// Private key stored on disk
    KeyFile {
        private_key_path: PathBuf,
        #[serde(default)]
        passphrase: Option<String>,
    },
    /// Private key held in memory (OpenSSH or PEM text as bytes)
    RawKey {
        private_key: Vec<u8>,
        #[serde(default)]
        passphrase: Option<String>,
        #[serde(default)]
        public_key: Option<Vec<u8>>,
    },
}

impl SftpIdentity {
    pub fn key_file(path: impl Into<PathBuf>, passphrase: Option<&str>) -> Self {
        Self::KeyFile {
            private_key_path: path.into(),
            passphrase: passphrase.map(str::to_string),
        }
    }

    pub fn raw_key(private_key: impl Into<Vec<u8>>, passphrase: Option<&str>) -> Self {
        Self::RawKey {
            private_key: private_key.into(),
            passphrase: passphrase.map(str::to_string),
            public_key: None,
        }
    }

    /// Attach the matching public key to a raw identity. No-op for key files.
    pub fn with_public_key(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        if let Self::RawKey { public_key, .. } = &mut self {
            *public_key = Some(bytes.into());
        }
        self
    }

    pub fn passphrase(&self) -> Option<&str> {
        match self {
            Self::KeyFile { passphrase, .. } | Self::RawKey { passphrase, .. } => {
                passphrase.as_deref()
            }
        }
    }

    pub fn is_key_file(&self) -> bool {
        matches!(self, Self::KeyFile { .. })
    }

    /// One-line description that is safe to log
    pub fn describe(&self) -> String {
        match self {
            Self::KeyFile { private_key_path, .. } => {
                format!("key file {}", private_key_path.display())
            }
            Self::RawKey { private_key, .. } => {
                format!("in-memory key ({} bytes)", private_key.len())
            }
        }
    }
}

impl fmt::Debug for SftpIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |p: &Option<String>| p.as_ref().map(|_| "***");
        match self {
            Self::KeyFile {
                private_key_path,
                passphrase,
            } => f
                .debug_struct("KeyFile")
                .field("private_key_path", private_key_path)
                .field("passphrase", &redacted(passphrase))
                .finish(),
            Self::RawKey {
                private_key,
                passphrase,
                public_key,
            } => f
                .debug_struct("RawKey")
                .field("private_key", &format_args!("<{} bytes>", private_key.len()))
                .field("passphrase", &redacted(passphrase))
                .field("public_key", &public_key.as_ref().map(Vec::len))
                .finish(),
        }
    }
}
