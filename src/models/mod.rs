pub mod auth;
pub mod credentials;
pub mod identity;
pub mod profile;
pub mod report;
pub mod settings;

// Re-export main types
pub use auth::AuthMethod;
pub use credentials::FtpCredentials;
pub use identity::SftpIdentity;
pub use profile::SftpProfile;
pub use report::{ConnectionReport, HostKeyStatus};
pub use settings::SftpSettings;
