use super::SftpSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SSH authentication method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// The `none` method, accepted only by servers allowing anonymous access
    None,
    /// Public key authentication with the configured identity
    PublicKey,
    /// Password authentication with the configured credentials
    Password,
}

impl AuthMethod {
    /// Ordered list of methods to try for the given settings.
    ///
    /// The identity goes first so a configured key wins over a password;
    /// the password is kept as a fallback when the key is unusable or
    /// rejected. With neither available only `none` is attempted.
    pub fn plan(settings: &SftpSettings) -> Vec<AuthMethod> {
        let mut methods = Vec::with_capacity(2);

        if settings.sftp_identity.is_some() {
            methods.push(Self::PublicKey);
        }
        if !settings.credentials.password().is_empty() {
            methods.push(Self::Password);
        }
        if methods.is_empty() {
            methods.push(Self::None);
        }

        methods
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PublicKey => "publickey",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
