//! In-process SSH server used by the integration tests.
//!
//! Password authentication succeeds whenever the password equals the
//! username. Public key authentication succeeds for the fixture client key,
//! whatever the username. The `sftp` subsystem request is acknowledged but
//! no SFTP traffic is served.

#![allow(dead_code)]

use russh::keys::{load_secret_key, PublicKey};
use russh::server::{self, Auth, Msg, Server as _, Session};
use russh::{Channel, ChannelId};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const HOST: &str = "127.0.0.1";
pub const CLIENT_PRIVATE_KEY_PASSPHRASE: &str = "secret-passphrase";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_public_key(name: &str) -> PublicKey {
    let text = std::fs::read_to_string(fixture(name)).expect("Failed to read public key fixture");
    PublicKey::from_openssh(text.trim()).expect("Failed to parse public key fixture")
}

pub fn client_private_key_file() -> PathBuf {
    fixture("client_key")
}

/// Write a known_hosts file trusting `key` for the test server address
pub fn write_known_hosts(dir: &Path, port: u16, key: &PublicKey) -> PathBuf {
    let path = dir.join("known_hosts");
    let encoded = key.to_openssh().expect("Failed to encode host key");
    let encoded: Vec<&str> = encoded.split(' ').take(2).collect();
    std::fs::write(&path, format!("[{}]:{} {}\n", HOST, port, encoded.join(" ")))
        .expect("Failed to write known_hosts");
    path
}

/// Running test server, stopped on drop
pub struct TestServer {
    pub port: u16,
    pub host_key: PublicKey,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let host_key = load_secret_key(fixture("server_host_key"), None)
            .expect("Failed to load server host key");
        let host_public_key = host_key.public_key().clone();

        let config = Arc::new(server::Config {
            keys: vec![host_key],
            auth_rejection_time: Duration::from_millis(10),
            auth_rejection_time_initial: Some(Duration::from_millis(0)),
            ..Default::default()
        });

        let listener = TcpListener::bind((HOST, 0))
            .await
            .expect("Failed to bind test server");
        let port = listener.local_addr().expect("No local address").port();

        let mut runner = TestServerRunner {
            client_key: fixture_public_key("client_key.pub"),
        };
        let task = tokio::spawn(async move {
            let _ = runner.run_on_socket(config, &listener).await;
        });

        Self {
            port,
            host_key: host_public_key,
            task,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Clone)]
struct TestServerRunner {
    client_key: PublicKey,
}

impl server::Server for TestServerRunner {
    type Handler = TestHandler;

    fn new_client(&mut self, _peer_addr: Option<SocketAddr>) -> Self::Handler {
        TestHandler {
            client_key: self.client_key.clone(),
        }
    }
}

struct TestHandler {
    client_key: PublicKey,
}

fn reject() -> Auth {
    Auth::Reject {
        proceed_with_methods: None,
        partial_success: false,
    }
}

impl server::Handler for TestHandler {
    type Error = russh::Error;

    async fn auth_none(&mut self, _user: &str) -> Result<Auth, Self::Error> {
        Ok(reject())
    }

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        if user == password {
            Ok(Auth::Accept)
        } else {
            Ok(reject())
        }
    }

    async fn auth_publickey(
        &mut self,
        _user: &str,
        public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        if public_key.key_data() == self.client_key.key_data() {
            Ok(Auth::Accept)
        } else {
            Ok(reject())
        }
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        if name == "sftp" {
            let _ = session.channel_success(channel);
        } else {
            let _ = session.channel_failure(channel);
        }
        Ok(())
    }
}
