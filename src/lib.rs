pub mod models;
pub mod services;
pub mod utils;

pub use models::{AuthMethod, FtpCredentials, SftpIdentity, SftpSettings};
pub use services::sftp_service::{SftpService, SftpSession};
pub use utils::error::{Result, SftpError};
