//! Integration tests for SftpService against an in-process SSH server
//!
//! Each settings combination mirrors a way the connector is configured in
//! practice: password only, key file, raw key bytes, password with an
//! unusable key, and strict host key checking.

mod common;

use common::{
    client_private_key_file, fixture_public_key, write_known_hosts, TestServer,
    CLIENT_PRIVATE_KEY_PASSPHRASE, HOST,
};
use sftp_connector::models::{AuthMethod, FtpCredentials, HostKeyStatus, SftpIdentity, SftpSettings};
use sftp_connector::services::host_key_service;
use sftp_connector::services::sftp_service::SftpService;
use sftp_connector::utils::error::SftpError;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

// =============================================================================
// Settings combinations that must authenticate
// =============================================================================

#[tokio::test]
async fn test_password_settings() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous(
            // the test server accepts any matching username and password
            "user-pass-match",
            "user-pass-match",
        ))
        .with_strict_host_key_checking(false);

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    let report = session.report();
    assert_eq!(report.auth_method, AuthMethod::Password);
    assert_eq!(report.username, "user-pass-match");
    assert_eq!(report.host_key_status, HostKeyStatus::NotChecked);
    assert!(report.host_key_fingerprint.starts_with("SHA256:"));

    assert_ok!(SftpService::disconnect(&session).await);
}

#[tokio::test]
async fn test_key_file_settings() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_strict_host_key_checking(false)
        .with_sftp_identity(SftpIdentity::key_file(
            client_private_key_file(),
            Some(CLIENT_PRIVATE_KEY_PASSPHRASE),
        ));

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    assert_eq!(session.report().auth_method, AuthMethod::PublicKey);
    assert_eq!(session.report().username, "anonymous");
}

#[tokio::test]
async fn test_raw_key_settings() {
    let server = TestServer::start().await;

    let key_bytes = std::fs::read(client_private_key_file()).expect("Failed to read key");
    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_strict_host_key_checking(false)
        .with_sftp_identity(SftpIdentity::raw_key(
            key_bytes,
            Some(CLIENT_PRIVATE_KEY_PASSPHRASE),
        ));

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    assert_eq!(session.report().auth_method, AuthMethod::PublicKey);
}

#[tokio::test]
async fn test_password_with_bad_key_file_passphrase() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous(
            "user-pass-match",
            "user-pass-match",
        ))
        .with_strict_host_key_checking(false)
        .with_sftp_identity(SftpIdentity::key_file(
            client_private_key_file(),
            Some("not-the-correct-key-passphrase"),
        ));

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    // The key cannot be decrypted, the password carries the login
    assert_eq!(session.report().auth_method, AuthMethod::Password);
}

#[tokio::test]
async fn test_strict_host_key_checking_settings() {
    let server = TestServer::start().await;
    let temp = TempDir::new().expect("Failed to create temp directory");
    let known_hosts = write_known_hosts(temp.path(), server.port, &server.host_key);

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous(
            "different user and password",
            "will fail password auth",
        ))
        .with_strict_host_key_checking(true)
        .with_known_hosts(&known_hosts)
        .with_sftp_identity(SftpIdentity::key_file(
            client_private_key_file(),
            Some(CLIENT_PRIVATE_KEY_PASSPHRASE),
        ));

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    assert_eq!(session.report().auth_method, AuthMethod::PublicKey);
    assert_eq!(session.report().host_key_status, HostKeyStatus::Verified);
}

// =============================================================================
// Settings combinations that must be rejected
// =============================================================================

#[tokio::test]
async fn test_mismatched_password_fails() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous("user", "wrong"))
        .with_strict_host_key_checking(false);

    let result = SftpService::connect(&settings).await;
    assert!(matches!(result, Err(SftpError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_bad_passphrase_without_password_fails() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_strict_host_key_checking(false)
        .with_sftp_identity(SftpIdentity::key_file(
            client_private_key_file(),
            Some("not-the-correct-key-passphrase"),
        ));

    let result = SftpService::connect(&settings).await;
    assert!(matches!(result, Err(SftpError::KeyDecryptionFailed(_))));
}

#[tokio::test]
async fn test_bad_passphrase_and_bad_password_fails() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous("user", "wrong"))
        .with_strict_host_key_checking(false)
        .with_sftp_identity(SftpIdentity::key_file(
            client_private_key_file(),
            Some("not-the-correct-key-passphrase"),
        ));

    match SftpService::connect(&settings).await {
        Err(SftpError::AuthenticationFailed(reason)) => {
            assert!(reason.contains("password"));
            assert!(reason.contains("identity unusable"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("connection should have been rejected"),
    }
}

#[tokio::test]
async fn test_anonymous_without_identity_fails() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_strict_host_key_checking(false);

    let result = SftpService::connect(&settings).await;
    assert!(matches!(result, Err(SftpError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_raw_key_with_foreign_public_key_fails() {
    let server = TestServer::start().await;

    let key_bytes = std::fs::read(client_private_key_file()).expect("Failed to read key");
    let foreign = std::fs::read(common::fixture("impostor_host_key.pub"))
        .expect("Failed to read public key");
    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_strict_host_key_checking(false)
        .with_sftp_identity(
            SftpIdentity::raw_key(key_bytes, Some(CLIENT_PRIVATE_KEY_PASSPHRASE))
                .with_public_key(foreign),
        );

    let result = SftpService::connect(&settings).await;
    assert!(matches!(result, Err(SftpError::InvalidKey(_))));
}

#[tokio::test]
async fn test_raw_key_with_own_public_key() {
    let server = TestServer::start().await;

    let key_bytes = std::fs::read(client_private_key_file()).expect("Failed to read key");
    let public = std::fs::read(common::fixture("client_key.pub")).expect("Failed to read key");
    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_strict_host_key_checking(false)
        .with_sftp_identity(
            SftpIdentity::raw_key(key_bytes, Some(CLIENT_PRIVATE_KEY_PASSPHRASE))
                .with_public_key(public),
        );

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    assert_eq!(session.report().auth_method, AuthMethod::PublicKey);
}

#[tokio::test]
async fn test_silent_server_times_out() {
    // Accepts TCP connections but never sends an SSH banner
    let listener = TcpListener::bind((HOST, 0))
        .await
        .expect("Failed to bind listener");
    let port = listener.local_addr().expect("No local address").port();
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let settings = SftpSettings::new(HOST)
        .with_port(port)
        .with_credentials(FtpCredentials::non_anonymous("user-pass-match", "user-pass-match"))
        .with_strict_host_key_checking(false)
        .with_connect_timeout(1);

    match SftpService::connect(&settings).await {
        Err(SftpError::ConnectTimeout { host, port: p, seconds }) => {
            assert_eq!(host, HOST);
            assert_eq!(p, port);
            assert_eq!(seconds, 1);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("connection should have timed out"),
    }

    silent.abort();
}

#[tokio::test]
async fn test_unknown_key_rejected() {
    let server = TestServer::start().await;
    let temp = TempDir::new().expect("Failed to create temp directory");

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous(
            "different user and password",
            "will fail password auth",
        ))
        .with_strict_host_key_checking(true)
        .with_known_hosts(write_known_hosts(
            temp.path(),
            server.port,
            &fixture_public_key("impostor_host_key.pub"),
        ))
        .with_sftp_identity(SftpIdentity::key_file(
            client_private_key_file(),
            Some(CLIENT_PRIVATE_KEY_PASSPHRASE),
        ));

    let result = SftpService::connect(&settings).await;
    assert!(matches!(result, Err(SftpError::HostKeyVerificationFailed(_))));
}

#[tokio::test]
async fn test_host_missing_from_known_hosts_rejected() {
    let server = TestServer::start().await;
    let temp = TempDir::new().expect("Failed to create temp directory");
    let known_hosts = temp.path().join("known_hosts");
    std::fs::write(&known_hosts, "# no entries\n").expect("Failed to write known_hosts");

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous("user-pass-match", "user-pass-match"))
        .with_known_hosts(&known_hosts);

    let result = SftpService::connect(&settings).await;
    let err = assert_err!(result.map(|_| ()));
    assert!(err.is_host_key_rejection());
}

#[tokio::test]
async fn test_missing_known_hosts_file_rejected() {
    let server = TestServer::start().await;
    let temp = TempDir::new().expect("Failed to create temp directory");

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous("user-pass-match", "user-pass-match"))
        .with_known_hosts(temp.path().join("known_hosts"));

    let result = SftpService::connect(&settings).await;
    assert!(matches!(result, Err(SftpError::KnownHostsNotFound(_))));
}

// =============================================================================
// Session use and host key discovery
// =============================================================================

#[tokio::test]
async fn test_open_sftp_channel() {
    let server = TestServer::start().await;

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous("user-pass-match", "user-pass-match"))
        .with_strict_host_key_checking(false);

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    assert_ok!(SftpService::open_sftp_channel(&session).await);
    assert!(!session.is_closed());
}

#[tokio::test]
async fn test_scan_then_learn_then_strict_connect() {
    let server = TestServer::start().await;
    let temp = TempDir::new().expect("Failed to create temp directory");
    let known_hosts = temp.path().join("ssh").join("known_hosts");

    let key = SftpService::scan_host_key(HOST, server.port, 5)
        .await
        .expect("Failed to scan host key");
    assert_eq!(key.key_data(), server.host_key.key_data());

    host_key_service::learn(HOST, server.port, &key, &known_hosts).expect("Failed to learn key");

    let settings = SftpSettings::new(HOST)
        .with_port(server.port)
        .with_credentials(FtpCredentials::non_anonymous("user-pass-match", "user-pass-match"))
        .with_known_hosts(&known_hosts);

    let session = SftpService::connect(&settings).await.expect("Failed to connect");
    assert_eq!(session.report().host_key_status, HostKeyStatus::Verified);
}
