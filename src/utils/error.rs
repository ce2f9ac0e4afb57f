use thiserror::Error;

#[derive(Debug, Error)]
pub enum SftpError {
    #[error("SSH connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection to {host}:{port} timed out after {seconds}s")]
    ConnectTimeout { host: String, port: u16, seconds: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Host key verification failed: {0}")]
    HostKeyVerificationFailed(String),

    #[error("Known hosts file not found: {0}")]
    KnownHostsNotFound(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(u16),

    #[error("Invalid host address: {0}")]
    InvalidHost(String),

    #[error("Private key file not found: {0}")]
    KeyFileNotFound(String),

    #[error("Private key file permission incorrect")]
    KeyFilePermission,

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Failed to decrypt private key: {0}")]
    KeyDecryptionFailed(String),

    #[error("SFTP channel error: {0}")]
    ChannelError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SftpError>;

impl SftpError {
    /// Returns a short message suitable for showing to a user
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidPort(port) => format!("Invalid port number: {}", port),
            Self::InvalidHost(host) => format!("Invalid host address: {}", host),
            Self::KeyFileNotFound(path) => format!("Private key file not found: {}", path),
            Self::KeyFilePermission => {
                "Private key file permission incorrect, should be 600".to_string()
            }
            Self::KeyDecryptionFailed(_) => {
                "Could not decrypt the private key, check the passphrase".to_string()
            }
            Self::AuthenticationFailed(reason) => format!("Authentication failed: {}", reason),
            Self::HostKeyVerificationFailed(reason) => {
                format!("The server host key could not be verified: {}", reason)
            }
            Self::KnownHostsNotFound(path) => format!(
                "Strict host key checking needs a known_hosts file, none found at {}",
                path
            ),
            Self::ConnectTimeout { host, port, seconds } => {
                format!("{}:{} did not answer within {}s", host, port, seconds)
            }
            Self::ConnectionFailed(reason) => format!("SSH connection failed: {}", reason),
            Self::ProfileNotFound(name) => format!("No saved profile named '{}'", name),
            _ => self.to_string(),
        }
    }

    /// Whether the failure came from the server's host key being rejected
    pub fn is_host_key_rejection(&self) -> bool {
        matches!(
            self,
            Self::HostKeyVerificationFailed(_) | Self::KnownHostsNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_decryption_hides_detail() {
        let err = SftpError::KeyDecryptionFailed("checkint mismatch".to_string());
        assert!(!err.user_message().contains("checkint"));
        assert!(err.to_string().contains("checkint"));
    }

    #[test]
    fn test_host_key_rejection() {
        assert!(SftpError::HostKeyVerificationFailed("changed".into()).is_host_key_rejection());
        assert!(SftpError::KnownHostsNotFound("/tmp/x".into()).is_host_key_rejection());
        assert!(!SftpError::AuthenticationFailed("nope".into()).is_host_key_rejection());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SftpError = io.into();
        assert!(matches!(err, SftpError::IoError(_)));
    }
}
