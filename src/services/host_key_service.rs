use crate::models::{HostKeyStatus, SftpSettings};
use crate::services::identity_service::IdentityService;
use crate::utils::error::{Result, SftpError};
use russh::keys::known_hosts::{known_host_keys_path, learn_known_hosts_path};
use russh::keys::PublicKey;
use std::path::{Path, PathBuf};

/// How the server host key is checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept any host key (insecure, strict checking disabled)
    AcceptAny,
    /// Require a matching entry in the known_hosts file
    Strict { known_hosts: PathBuf },
}

impl HostKeyPolicy {
    pub fn from_settings(settings: &SftpSettings) -> Result<Self> {
        if !settings.strict_host_key_checking {
            return Ok(Self::AcceptAny);
        }

        let known_hosts = settings.resolved_known_hosts().ok_or_else(|| {
            SftpError::KnownHostsNotFound("could not determine home directory".to_string())
        })?;

        Ok(Self::Strict { known_hosts })
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict { .. })
    }

    /// Read the known_hosts entries for one server
    pub fn verifier(&self, host: &str, port: u16) -> Result<HostKeyVerifier> {
        let known = match self {
            Self::AcceptAny => None,
            Self::Strict { known_hosts } => {
                if !known_hosts.exists() {
                    tracing::error!(
                        "Known hosts file not found at {}, rejecting connection",
                        known_hosts.display()
                    );
                    return Err(SftpError::KnownHostsNotFound(
                        known_hosts.display().to_string(),
                    ));
                }

                let entries = known_host_keys_path(host, port, known_hosts).map_err(|e| {
                    SftpError::HostKeyVerificationFailed(format!(
                        "failed to read {}: {}",
                        known_hosts.display(),
                        e
                    ))
                })?;
                tracing::debug!(
                    "{} known_hosts entries for {}:{} in {}",
                    entries.len(),
                    host,
                    port,
                    known_hosts.display()
                );

                Some(KnownEntries {
                    path: known_hosts.clone(),
                    entries,
                })
            }
        };

        Ok(HostKeyVerifier {
            host: host.to_string(),
            port,
            known,
        })
    }

    /// Same as [`HostKeyPolicy::verifier`], reading the file off the async runtime
    pub async fn load_verifier(&self, host: &str, port: u16) -> Result<HostKeyVerifier> {
        if !self.is_strict() {
            return self.verifier(host, port);
        }

        let policy = self.clone();
        let host = host.to_string();
        tokio::task::spawn_blocking(move || policy.verifier(&host, port))
            .await
            .map_err(|e| SftpError::Other(e.into()))?
    }

    /// Check a server key against the policy
    pub fn verify(&self, host: &str, port: u16, server_key: &PublicKey) -> Result<HostKeyStatus> {
        self.verifier(host, port)?.verify(server_key)
    }
}

#[derive(Debug, Clone)]
struct KnownEntries {
    path: PathBuf,
    /// (line number, key) pairs matching the server
    entries: Vec<(usize, PublicKey)>,
}

/// Host key policy bound to one server, with its known_hosts entries already read
#[derive(Debug, Clone)]
pub struct HostKeyVerifier {
    host: String,
    port: u16,
    known: Option<KnownEntries>,
}

impl HostKeyVerifier {
    pub fn accept_any(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            known: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Check a server key without touching the filesystem
    pub fn verify(&self, server_key: &PublicKey) -> Result<HostKeyStatus> {
        let (host, port) = (self.host.as_str(), self.port);
        let fingerprint = IdentityService::fingerprint(server_key);

        let Some(known) = &self.known else {
            tracing::warn!(
                "Strict host key checking disabled, accepting {} key {} without verification",
                host,
                fingerprint
            );
            return Ok(HostKeyStatus::NotChecked);
        };

        if known
            .entries
            .iter()
            .any(|(_, key)| key.key_data() == server_key.key_data())
        {
            tracing::info!("Host key for {}:{} verified ({})", host, port, fingerprint);
            return Ok(HostKeyStatus::Verified);
        }

        match known.entries.first() {
            Some((line, _)) => {
                tracing::error!("Host key for {}:{} has changed!", host, port);
                tracing::error!("Offending entry: {}:{}", known.path.display(), line);
                tracing::error!("Received: {}", fingerprint);
                Err(SftpError::HostKeyVerificationFailed(format!(
                    "host key for {}:{} does not match {} line {}",
                    host,
                    port,
                    known.path.display(),
                    line
                )))
            }
            None => {
                tracing::error!(
                    "No entry for {}:{} in {} (fingerprint {})",
                    host,
                    port,
                    known.path.display(),
                    fingerprint
                );
                Err(SftpError::HostKeyVerificationFailed(format!(
                    "{}:{} is not a known host",
                    host, port
                )))
            }
        }
    }
}

/// Append a host key to a known_hosts file
pub fn learn(host: &str, port: u16, key: &PublicKey, known_hosts: &Path) -> Result<()> {
    if let Some(dir) = known_hosts.parent() {
        std::fs::create_dir_all(dir)?;
    }

    learn_known_hosts_path(host, port, key, known_hosts).map_err(|e| {
        SftpError::ConfigError(format!(
            "failed to update {}: {}",
            known_hosts.display(),
            e
        ))
    })?;

    tracing::info!("Added {}:{} to {}", host, port, known_hosts.display());
    Ok(())
}

/// known_hosts line for a host key, using OpenSSH's `[host]:port` form for non-22 ports
pub fn known_hosts_line(host: &str, port: u16, key: &PublicKey) -> Result<String> {
    let encoded = key
        .to_openssh()
        .map_err(|e| SftpError::InvalidKey(e.to_string()))?;
    // to_openssh appends the key comment, which known_hosts does not need
    let encoded = encoded.split(' ').take(2).collect::<Vec<_>>().join(" ");

    if port == 22 {
        Ok(format!("{} {}", host, encoded))
    } else {
        Ok(format!("[{}]:{} {}", host, port, encoded))
    }
}
