use crate::models::SftpProfile;
use crate::utils::error::{Result, SftpError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Service for managing configuration persistence
pub struct ConfigService {
    config_dir: PathBuf,
}

impl ConfigService {
    /// Create a new config service with default directory
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
            tracing::info!("Created config directory: {:?}", config_dir);

            // Profiles may hold passwords
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(&config_dir)?.permissions();
                perms.set_mode(0o700);
                fs::set_permissions(&config_dir, perms)?;
            }
        }

        Ok(Self { config_dir })
    }

    /// Create a config service with custom directory
    pub fn with_dir(config_dir: PathBuf) -> Result<Self> {
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        Ok(Self { config_dir })
    }

    /// Get default config directory
    fn get_config_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "sftp-connector", "sftp-connector")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| SftpError::ConfigError("Failed to get config directory".to_string()))
    }

    fn profiles_file(&self) -> PathBuf {
        self.config_dir.join("profiles.toml")
    }

    fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.toml")
    }

    /// Load all profiles
    pub fn load_profiles(&self) -> Result<Vec<SftpProfile>> {
        let path = self.profiles_file();

        if !path.exists() {
            tracing::debug!("No profiles file found, returning empty list");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let profiles: ProfilesConfig = toml::from_str(&content).map_err(|e| {
            SftpError::ConfigError(format!("Failed to parse profiles: {}", e))
        })?;

        tracing::debug!("Loaded {} profiles", profiles.profiles.len());
        Ok(profiles.profiles)
    }

    /// Save all profiles
    pub fn save_profiles(&self, profiles: &[SftpProfile]) -> Result<()> {
        let config = ProfilesConfig {
            profiles: profiles.to_vec(),
        };
        let content = toml::to_string_pretty(&config)?;

        let path = self.profiles_file();
        fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!("Saved {} profiles to {:?}", profiles.len(), path);
        Ok(())
    }

    /// Save a single profile (update by id or create)
    pub fn save_profile(&self, profile: &SftpProfile) -> Result<()> {
        let mut profiles = self.load_profiles()?;

        if let Some(pos) = profiles.iter().position(|p| p.id == profile.id) {
            profiles[pos] = profile.clone();
            tracing::info!("Updated profile: {}", profile.name);
        } else {
            if profiles.iter().any(|p| p.name == profile.name) {
                return Err(SftpError::ConfigError(format!(
                    "A profile named '{}' already exists",
                    profile.name
                )));
            }
            profiles.push(profile.clone());
            tracing::info!("Added new profile: {}", profile.name);
        }

        self.save_profiles(&profiles)
    }

    /// Get a profile by name
    pub fn get_profile(&self, name: &str) -> Result<SftpProfile> {
        self.load_profiles()?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SftpError::ProfileNotFound(name.to_string()))
    }

    /// Delete a profile by name, returns whether it existed
    pub fn delete_profile(&self, name: &str) -> Result<bool> {
        let mut profiles = self.load_profiles()?;
        let original_len = profiles.len();

        profiles.retain(|p| p.name != name);

        if profiles.len() < original_len {
            self.save_profiles(&profiles)?;
            tracing::info!("Deleted profile: {}", name);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Load application settings
    pub fn load_app_settings(&self) -> Result<AppSettings> {
        let path = self.settings_file();

        if !path.exists() {
            tracing::debug!("No settings file found, using defaults");
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&path)?;
        let settings: AppSettings = toml::from_str(&content)
            .map_err(|e| SftpError::ConfigError(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save application settings
    pub fn save_app_settings(&self, settings: &AppSettings) -> Result<()> {
        let content = toml::to_string_pretty(settings)?;

        let path = self.settings_file();
        fs::write(&path, content)?;

        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

// Helper struct for TOML serialization
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ProfilesConfig {
    #[serde(default)]
    profiles: Vec<SftpProfile>,
}

/// Application settings
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AppSettings {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Connect timeout applied to ad-hoc connections
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// known_hosts file used when a connection does not name one
    #[serde(default)]
    pub default_known_hosts: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            connect_timeout_seconds: default_connect_timeout(),
            default_known_hosts: None,
        }
    }
}
