use crate::models::{SftpIdentity, SftpSettings};
use crate::utils::error::{Result, SftpError};
use std::net::IpAddr;
use std::path::Path;

/// Service for validating connection settings before connecting
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Validate port number range
    pub fn validate_port(&self, port: u16) -> Result<()> {
        if port == 0 {
            return Err(SftpError::InvalidPort(port));
        }
        Ok(())
    }

    /// Validate host address (IP or hostname)
    pub fn validate_host(&self, host: &str) -> Result<()> {
        if host.is_empty() {
            return Err(SftpError::InvalidHost("empty host".to_string()));
        }

        if host.parse::<IpAddr>().is_ok() {
            return Ok(());
        }

        // Basic hostname check
        let is_valid_hostname = host.chars().all(|c| {
            c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'
        }) && !host.starts_with('-') && !host.ends_with('-');

        if is_valid_hostname {
            Ok(())
        } else {
            Err(SftpError::InvalidHost(host.to_string()))
        }
    }

    /// Validate that a private key file exists and is a regular file
    pub fn validate_key_file(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(SftpError::KeyFileNotFound(path.display().to_string()));
        }
        Ok(())
    }

    /// Reject key files readable by group or others (600 or 400 expected)
    pub fn validate_key_permissions(&self, path: &Path) -> Result<()> {
        self.validate_key_file(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(path)?.permissions().mode() & 0o777;

            if mode != 0o600 && mode != 0o400 {
                tracing::warn!(
                    "SSH key file {:?} has permissions {:o}, should be 600 or 400",
                    path,
                    mode
                );
                return Err(SftpError::KeyFilePermission);
            }
        }

        Ok(())
    }

    /// Validate complete connection settings
    pub fn validate_settings(&self, settings: &SftpSettings) -> Result<()> {
        self.validate_host(&settings.host)?;
        self.validate_port(settings.port)?;

        if settings.connect_timeout_seconds == 0 {
            return Err(SftpError::ConfigError(
                "Connect timeout must be at least one second".to_string(),
            ));
        }

        if let Some(SftpIdentity::KeyFile { private_key_path, .. }) = &settings.sftp_identity {
            self.validate_key_file(private_key_path)?;
        }

        if settings.strict_host_key_checking {
            match settings.resolved_known_hosts() {
                Some(path) if path.is_file() => {}
                Some(path) => {
                    return Err(SftpError::KnownHostsNotFound(path.display().to_string()))
                }
                None => {
                    return Err(SftpError::KnownHostsNotFound(
                        "could not determine home directory".to_string(),
                    ))
                }
            }
        }

        Ok(())
    }
}

impl Default for ValidationService {
    fn default() -> Self {
        Self::new()
    }
}
