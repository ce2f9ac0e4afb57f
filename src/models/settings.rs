use super::{FtpCredentials, SftpIdentity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection settings for an SFTP server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SftpSettings {
    /// Server host name or IP address
    pub host: String,

    /// SSH port (default: 22)
    #[serde(default = "default_sftp_port")]
    pub port: u16,

    /// Login credentials (default: anonymous)
    #[serde(default)]
    pub credentials: FtpCredentials,

    /// Reject servers whose host key is not in known_hosts
    #[serde(default = "default_strict_host_key_checking")]
    pub strict_host_key_checking: bool,

    /// known_hosts file used for strict checking.
    /// Falls back to ~/.ssh/known_hosts when unset.
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    /// Private key used for public key authentication
    #[serde(default)]
    pub sftp_identity: Option<SftpIdentity>,

    /// TCP connect plus SSH handshake timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Drop the session after this many idle seconds
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_seconds: Option<u64>,
}

fn default_sftp_port() -> u16 {
    22
}

fn default_strict_host_key_checking() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_inactivity_timeout() -> Option<u64> {
    Some(300) // 5 minutes
}

/// ~/.ssh/known_hosts, if a home directory can be found
pub fn default_known_hosts_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts"))
}

impl SftpSettings {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_sftp_port(),
            credentials: FtpCredentials::default(),
            strict_host_key_checking: default_strict_host_key_checking(),
            known_hosts: None,
            sftp_identity: None,
            connect_timeout_seconds: default_connect_timeout(),
            inactivity_timeout_seconds: default_inactivity_timeout(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, credentials: FtpCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_strict_host_key_checking(mut self, strict: bool) -> Self {
        self.strict_host_key_checking = strict;
        self
    }

    pub fn with_known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }

    pub fn with_sftp_identity(mut self, identity: SftpIdentity) -> Self {
        self.sftp_identity = Some(identity);
        self
    }

    pub fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_seconds = seconds;
        self
    }

    pub fn with_inactivity_timeout(mut self, seconds: Option<u64>) -> Self {
        self.inactivity_timeout_seconds = seconds;
        self
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// known_hosts path that strict checking will read
    pub fn resolved_known_hosts(&self) -> Option<PathBuf> {
        self.known_hosts.clone().or_else(default_known_hosts_path)
    }

    pub fn known_hosts_path(&self) -> Option<&Path> {
        self.known_hosts.as_deref()
    }

    /// Get a display string for the connection
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}", self.username(), self.host, self.port)
    }
}
