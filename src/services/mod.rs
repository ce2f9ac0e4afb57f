// Services module
pub mod config_service;
pub mod host_key_service;
pub mod identity_service;
pub mod sftp_service;
pub mod validation_service;
