use super::AuthMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of checking the server host key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyStatus {
    /// Key matched an entry in known_hosts
    Verified,
    /// Strict checking was disabled, key accepted as-is
    NotChecked,
}

/// Summary of an established, authenticated connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth_method: AuthMethod,
    /// SHA256 fingerprint of the server host key
    pub host_key_fingerprint: String,
    pub host_key_status: HostKeyStatus,
    pub connected_at: DateTime<Utc>,
}

impl ConnectionReport {
    pub fn summary(&self) -> String {
        let status = match self.host_key_status {
            HostKeyStatus::Verified => "verified",
            HostKeyStatus::NotChecked => "not checked",
        };
        format!(
            "{}@{}:{} authenticated with {} (host key {}, {})",
            self.username, self.host, self.port, self.auth_method, self.host_key_fingerprint, status
        )
    }
}
