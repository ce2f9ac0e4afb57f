use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// SFTP connector - check SFTP connection settings, credentials and host keys
#[derive(Parser, Debug)]
#[command(name = "sftp-connector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect and authenticate, then report the outcome
    Check {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the connection report as JSON
        #[arg(long)]
        json: bool,

        /// Also open a channel and request the sftp subsystem
        #[arg(long)]
        subsystem: bool,
    },

    /// Print the server host key as a known_hosts line
    Scan {
        /// Server host
        host: String,

        /// Server port
        #[arg(short, long, default_value = "22")]
        port: u16,

        /// Append the key to this known_hosts file
        #[arg(long)]
        learn: Option<PathBuf>,
    },

    /// Manage saved connection profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// List saved profiles
    List,

    /// Show one profile
    Show {
        /// Profile name
        name: String,
    },

    /// Save connection options as a profile
    Save {
        /// Profile name
        name: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

/// Connection options shared by `check` and `profile save`
#[derive(Args, Debug, Default)]
pub struct TargetArgs {
    /// Use a saved profile; other options override its values
    #[arg(long)]
    pub profile: Option<String>,

    /// Server host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Username (anonymous when omitted)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password
    #[arg(long)]
    pub password: Option<String>,

    /// Private key file
    #[arg(short, long)]
    pub identity: Option<PathBuf>,

    /// Passphrase for the private key
    #[arg(long)]
    pub passphrase: Option<String>,

    /// Accept any host key
    #[arg(long)]
    pub no_strict: bool,

    /// known_hosts file for strict checking
    #[arg(long)]
    pub known_hosts: Option<PathBuf>,

    /// Connect timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}
