use serde::{Deserialize, Serialize};
use std::fmt;

/// Username sent when no credentials are configured
pub const ANONYMOUS_USERNAME: &str = "anonymous";

/// Login credentials for the remote server
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FtpCredentials {
    /// Anonymous login: username `anonymous`, empty password
    Anonymous,
    /// Explicit username and password
    NonAnonymous { username: String, password: String },
}

impl Default for FtpCredentials {
    fn default() -> Self {
        Self::Anonymous
    }
}

impl FtpCredentials {
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    pub fn non_anonymous(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::NonAnonymous {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::Anonymous => ANONYMOUS_USERNAME,
            Self::NonAnonymous { username, .. } => username,
        }
    }

    pub fn password(&self) -> &str {
        match self {
            Self::Anonymous => "",
            Self::NonAnonymous { password, .. } => password,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Debug for FtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::NonAnonymous { username, .. } => f
                .debug_struct("NonAnonymous")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}
