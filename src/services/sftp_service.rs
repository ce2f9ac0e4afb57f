use crate::models::{AuthMethod, ConnectionReport, HostKeyStatus, SftpSettings};
use crate::services::host_key_service::{HostKeyPolicy, HostKeyVerifier};
use crate::services::identity_service::IdentityService;
use crate::services::validation_service::ValidationService;
use crate::utils::error::{Result, SftpError};
use russh::client::{self, AuthResult, Handle, Msg};
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg, PublicKey};
use russh::{Channel, Disconnect};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Subsystem name requested on the session channel
pub const SFTP_SUBSYSTEM: &str = "sftp";

/// Host key seen during the handshake
#[derive(Default)]
pub struct HostKeyState {
    pub key: Option<PublicKey>,
    pub status: Option<HostKeyStatus>,
    /// Why the key was rejected, taken once the handshake fails
    pub rejection: Option<SftpError>,
}

/// Authenticated SSH session ready to carry SFTP
pub struct SftpSession {
    handle: Handle<SftpClientHandler>,
    report: ConnectionReport,
}

impl SftpSession {
    pub fn report(&self) -> &ConnectionReport {
        &self.report
    }

    pub fn handle(&self) -> &Handle<SftpClientHandler> {
        &self.handle
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

/// Establishes SFTP sessions from [`SftpSettings`]
pub struct SftpService;

impl SftpService {
    /// Connect, verify the host key and authenticate
    pub async fn connect(settings: &SftpSettings) -> Result<SftpSession> {
        ValidationService::new().validate_settings(settings)?;

        tracing::info!(
            "Connecting to {} (strict host key checking: {})",
            settings.display_name(),
            settings.strict_host_key_checking
        );

        let verifier = HostKeyPolicy::from_settings(settings)?
            .load_verifier(&settings.host, settings.port)
            .await?;
        let handler = SftpClientHandler::new(verifier);
        let host_key = handler.host_key.clone();

        let mut handle = Self::handshake(settings, handler).await?;
        let auth_method = Self::authenticate(&mut handle, settings).await?;

        let state = host_key.read().await;
        let host_key_fingerprint = state
            .key
            .as_ref()
            .map(IdentityService::fingerprint)
            .unwrap_or_default();
        let host_key_status = state.status.unwrap_or(HostKeyStatus::NotChecked);
        drop(state);

        tracing::info!(
            "Authenticated to {} with {}",
            settings.display_name(),
            auth_method
        );

        Ok(SftpSession {
            handle,
            report: ConnectionReport {
                host: settings.host.clone(),
                port: settings.port,
                username: settings.username().to_string(),
                auth_method,
                host_key_fingerprint,
                host_key_status,
                connected_at: chrono::Utc::now(),
            },
        })
    }

    /// TCP connect plus SSH key exchange, bounded by the connect timeout
    async fn handshake(
        settings: &SftpSettings,
        handler: SftpClientHandler,
    ) -> Result<Handle<SftpClientHandler>> {
        let config = client::Config {
            inactivity_timeout: settings.inactivity_timeout_seconds.map(Duration::from_secs),
            ..<client::Config as Default>::default()
        };

        let host_key = handler.host_key.clone();
        let connect = client::connect(
            Arc::new(config),
            (settings.host.as_str(), settings.port),
            handler,
        );

        let result = tokio::time::timeout(
            Duration::from_secs(settings.connect_timeout_seconds),
            connect,
        )
        .await
        .map_err(|_| SftpError::ConnectTimeout {
            host: settings.host.clone(),
            port: settings.port,
            seconds: settings.connect_timeout_seconds,
        })?;

        match result {
            Ok(handle) => Ok(handle),
            Err(e) => {
                if let Some(rejection) = host_key.write().await.rejection.take() {
                    return Err(rejection);
                }
                Err(match e {
                    russh::Error::UnknownKey | russh::Error::KeyChanged { .. } => {
                        SftpError::HostKeyVerificationFailed(e.to_string())
                    }
                    e => SftpError::ConnectionFailed(e.to_string()),
                })
            }
        }
    }

    /// Try each planned method in order; the first accepted one wins
    async fn authenticate(
        handle: &mut Handle<SftpClientHandler>,
        settings: &SftpSettings,
    ) -> Result<AuthMethod> {
        let username = settings.username();
        let mut rejected = Vec::new();
        let mut identity_error = None;

        for method in AuthMethod::plan(settings) {
            tracing::debug!("Trying {} authentication as {}", method, username);

            let accepted = match method {
                AuthMethod::PublicKey => {
                    let Some(identity) = settings.sftp_identity.as_ref() else {
                        continue;
                    };
                    match IdentityService::load_private_key(identity).await {
                        Ok(key) => Self::authenticate_key(handle, username, key).await?,
                        Err(e) => {
                            tracing::warn!("Skipping {}: {}", identity.describe(), e);
                            identity_error = Some(e);
                            continue;
                        }
                    }
                }
                AuthMethod::Password => {
                    let result = handle
                        .authenticate_password(username, settings.credentials.password())
                        .await
                        .map_err(|e| SftpError::AuthenticationFailed(e.to_string()))?;
                    matches!(result, AuthResult::Success)
                }
                AuthMethod::None => {
                    let result = handle
                        .authenticate_none(username)
                        .await
                        .map_err(|e| SftpError::AuthenticationFailed(e.to_string()))?;
                    matches!(result, AuthResult::Success)
                }
            };

            if accepted {
                return Ok(method);
            }

            tracing::debug!("Server rejected {} authentication", method);
            rejected.push(method.as_str());
        }

        match identity_error {
            Some(e) if rejected.is_empty() => Err(e),
            Some(e) => Err(SftpError::AuthenticationFailed(format!(
                "server rejected {} for user {} (identity unusable: {})",
                rejected.join(", "),
                username,
                e
            ))),
            None => Err(SftpError::AuthenticationFailed(format!(
                "server rejected {} for user {}",
                rejected.join(", "),
                username
            ))),
        }
    }

    async fn authenticate_key(
        handle: &mut Handle<SftpClientHandler>,
        username: &str,
        key: PrivateKey,
    ) -> Result<bool> {
        // Only consulted for RSA keys
        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| SftpError::AuthenticationFailed(e.to_string()))?
            .flatten();

        let key_with_alg = PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg);
        let result = handle
            .authenticate_publickey(username, key_with_alg)
            .await
            .map_err(|e| SftpError::AuthenticationFailed(e.to_string()))?;

        Ok(matches!(result, AuthResult::Success))
    }

    /// Open a session channel and start the SFTP subsystem on it
    pub async fn open_sftp_channel(session: &SftpSession) -> Result<Channel<Msg>> {
        let channel = session
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SftpError::ChannelError(e.to_string()))?;

        channel
            .request_subsystem(true, SFTP_SUBSYSTEM)
            .await
            .map_err(|e| SftpError::ChannelError(e.to_string()))?;

        tracing::debug!("Requested {} subsystem on channel {:?}", SFTP_SUBSYSTEM, channel.id());
        Ok(channel)
    }

    /// Fetch the server host key without authenticating
    pub async fn scan_host_key(host: &str, port: u16, timeout_seconds: u64) -> Result<PublicKey> {
        let settings = SftpSettings::new(host)
            .with_port(port)
            .with_strict_host_key_checking(false)
            .with_connect_timeout(timeout_seconds);

        let handler = SftpClientHandler::new(HostKeyVerifier::accept_any(host, port));
        let host_key = handler.host_key.clone();

        let handle = Self::handshake(&settings, handler).await?;
        if let Err(e) = handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            tracing::debug!("Disconnect after host key scan failed: {}", e);
        }

        let key = host_key.write().await.key.take();
        key.ok_or_else(|| SftpError::ConnectionFailed("server sent no host key".to_string()))
    }

    /// Disconnect from the server
    pub async fn disconnect(session: &SftpSession) -> Result<()> {
        session
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| SftpError::ConnectionFailed(format!("Disconnect failed: {}", e)))?;

        tracing::info!("Disconnected from {}:{}", session.report.host, session.report.port);
        Ok(())
    }
}

/// russh client handler that applies the host key policy
#[derive(Clone)]
pub struct SftpClientHandler {
    verifier: HostKeyVerifier,
    /// Shared with the caller so the outcome survives the handshake
    pub host_key: Arc<RwLock<HostKeyState>>,
}

impl SftpClientHandler {
    pub fn new(verifier: HostKeyVerifier) -> Self {
        Self {
            verifier,
            host_key: Arc::new(RwLock::new(HostKeyState::default())),
        }
    }
}

impl client::Handler for SftpClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let outcome = self.verifier.verify(server_public_key);

        let mut state = self.host_key.write().await;
        state.key = Some(server_public_key.clone());

        match outcome {
            Ok(status) => {
                state.status = Some(status);
                Ok(true)
            }
            Err(e) => {
                state.rejection = Some(e);
                Ok(false)
            }
        }
    }
}
