pub mod commands;

pub use commands::Cli;

use commands::{Commands, ProfileAction, TargetArgs};
use sftp_connector::models::{FtpCredentials, SftpIdentity, SftpProfile, SftpSettings};
use sftp_connector::services::config_service::{AppSettings, ConfigService};
use sftp_connector::services::host_key_service;
use sftp_connector::services::sftp_service::SftpService;
use sftp_connector::utils::error::{Result, SftpError};

/// Execute a parsed command line
pub async fn run(cli: Cli, config: &ConfigService, app_settings: &AppSettings) -> Result<()> {
    match cli.command {
        Commands::Check {
            target,
            json,
            subsystem,
        } => {
            let settings = resolve_settings(&target, config, app_settings)?;
            let session = SftpService::connect(&settings).await?;

            if subsystem {
                let channel = SftpService::open_sftp_channel(&session).await?;
                tracing::info!("sftp subsystem requested on channel {:?}", channel.id());
            }

            if json {
                let output = serde_json::to_string_pretty(session.report())
                    .map_err(|e| SftpError::Other(e.into()))?;
                println!("{}", output);
            } else {
                println!("{}", session.report().summary());
            }

            SftpService::disconnect(&session).await?;
        }
        Commands::Scan { host, port, learn } => {
            let key = SftpService::scan_host_key(&host, port, app_settings.connect_timeout_seconds)
                .await?;
            println!("{}", host_key_service::known_hosts_line(&host, port, &key)?);

            if let Some(path) = learn {
                host_key_service::learn(&host, port, &key, &path)?;
            }
        }
        Commands::Profile { action } => run_profile(action, config, app_settings)?,
    }

    Ok(())
}

fn run_profile(action: ProfileAction, config: &ConfigService, app_settings: &AppSettings) -> Result<()> {
    match action {
        ProfileAction::List => {
            let profiles = config.load_profiles()?;
            if profiles.is_empty() {
                println!("No saved profiles");
            }
            for profile in profiles {
                println!("{} - {}", profile.name, profile.settings.display_name());
            }
        }
        ProfileAction::Show { name } => {
            let profile = config.get_profile(&name)?;
            let settings = &profile.settings;
            println!("Name:        {}", profile.name);
            println!("Target:      {}", settings.display_name());
            println!("Strict:      {}", settings.strict_host_key_checking);
            if let Some(path) = settings.known_hosts_path() {
                println!("Known hosts: {}", path.display());
            }
            if let Some(identity) = &settings.sftp_identity {
                println!("Identity:    {}", identity.describe());
            }
            println!("Updated:     {}", profile.updated_at);
        }
        ProfileAction::Save { name, target } => {
            let settings = resolve_settings(&target, config, app_settings)?;
            let profile = match config.get_profile(&name) {
                Ok(mut existing) => {
                    existing.settings = settings;
                    existing.touch();
                    existing
                }
                Err(SftpError::ProfileNotFound(_)) => SftpProfile::new(&name, settings),
                Err(e) => return Err(e),
            };
            config.save_profile(&profile)?;
            println!("Saved profile {}", name);
        }
        ProfileAction::Delete { name } => {
            if config.delete_profile(&name)? {
                println!("Deleted profile {}", name);
            } else {
                return Err(SftpError::ProfileNotFound(name));
            }
        }
    }

    Ok(())
}

/// Build settings from a profile and/or command line options
pub fn resolve_settings(
    target: &TargetArgs,
    config: &ConfigService,
    app_settings: &AppSettings,
) -> Result<SftpSettings> {
    let mut settings = match (&target.profile, &target.host) {
        (Some(name), _) => config.get_profile(name)?.settings,
        (None, Some(host)) => {
            let mut settings = SftpSettings::new(host.as_str())
                .with_connect_timeout(app_settings.connect_timeout_seconds);
            settings.known_hosts = app_settings.default_known_hosts.clone();
            settings
        }
        (None, None) => {
            return Err(SftpError::ConfigError(
                "either --host or --profile is required".to_string(),
            ))
        }
    };

    if let (Some(_), Some(host)) = (&target.profile, &target.host) {
        settings.host = host.clone();
    }
    if let Some(port) = target.port {
        settings.port = port;
    }

    match (&target.user, &target.password) {
        (Some(user), password) => {
            settings.credentials =
                FtpCredentials::non_anonymous(user.as_str(), password.as_deref().unwrap_or(""));
        }
        (None, Some(password)) => {
            let username = settings.credentials.username().to_string();
            settings.credentials = FtpCredentials::non_anonymous(username, password.as_str());
        }
        (None, None) => {}
    }

    if let Some(path) = &target.identity {
        settings.sftp_identity = Some(SftpIdentity::key_file(path, target.passphrase.as_deref()));
    } else if let (Some(passphrase), Some(SftpIdentity::KeyFile { passphrase: current, .. })) =
        (&target.passphrase, settings.sftp_identity.as_mut())
    {
        *current = Some(passphrase.clone());
    }

    if target.no_strict {
        settings.strict_host_key_checking = false;
    }
    if let Some(path) = &target.known_hosts {
        settings.known_hosts = Some(path.clone());
    }
    if let Some(timeout) = target.timeout {
        settings.connect_timeout_seconds = timeout;
    }

    Ok(settings)
}
