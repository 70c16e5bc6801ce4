use anyhow::{ensure, Context};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::registration::{RegistrationStoreConfig, DEFAULT_MAX_PENDING, DEFAULT_TTL};
use crate::webauthn::{AttestationPreference, WebAuthnSettings};

/// Name of the settings file looked up in the working and config directories
pub const SETTINGS_FILE: &str = "Settings.toml";

/// Environment variable naming an extra directory that may hold `Settings.toml`
pub const CONFIG_DIR_ENV: &str = "REGISTRY_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegistrySettings {
    pub webauthn: WebAuthnSettings,
    pub registration: RegistrationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationSettings {
    /// How long a started registration can be finished, in seconds
    pub ttl_seconds: u64,
    /// Upper bound on registrations in progress at once
    pub max_pending: usize,
    /// How often abandoned registrations are swept, in seconds
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL.as_secs(),
            max_pending: DEFAULT_MAX_PENDING,
            sweep_interval_seconds: 60,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RegistrationSettings {
    #[must_use]
    pub fn store_config(&self) -> RegistrationStoreConfig {
        RegistrationStoreConfig {
            ttl: Duration::from_secs(self.ttl_seconds),
            max_pending: self.max_pending,
        }
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl RegistrySettings {
    /// Load settings from configuration files and environment variables
    ///
    /// Settings are applied with the following priority (highest to lowest):
    /// 1. Environment variables
    /// 2. `Settings.toml` in `REGISTRY_CONFIG_DIR` (if set and present)
    /// 3. `Settings.toml` in the current directory (if present)
    /// 4. Default settings
    ///
    /// A `.env` file in the current directory is read first, and the logger is
    /// initialized once settings are known.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file cannot be read or parsed
    /// - `ATTESTATION_PREFERENCE` is not a recognized preference
    /// - The resulting settings fail validation
    pub fn load() -> anyhow::Result<Self> {
        Self::load_env_file();

        let (mut settings, sources) = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings)?;
        settings.validate()?;

        settings.init_logging();
        for source in sources {
            info!("Loaded settings from {}", source.display());
        }

        Ok(settings)
    }

    /// Load settings from a single TOML file, without environment overrides
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        basic_toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Initialize `env_logger` with the configured level as the default filter
    ///
    /// `RUST_LOG` still takes precedence. Calling this more than once is harmless.
    pub fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.logging.level.as_str());
        if env_logger::Builder::from_env(env).try_init().is_err() {
            warn!("Logger already initialized, keeping existing configuration");
        }
    }

    /// Check that the settings describe a usable registry
    ///
    /// # Errors
    /// Returns an error naming the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.registration.ttl_seconds > 0,
            "registration.ttl_seconds must be greater than zero"
        );
        ensure!(
            self.registration.max_pending > 0,
            "registration.max_pending must be greater than zero"
        );
        ensure!(
            !self.webauthn.rp_id.trim().is_empty(),
            "webauthn.rp_id must not be empty"
        );
        ensure!(
            !self.webauthn.rp_origin.trim().is_empty(),
            "webauthn.rp_origin must not be empty"
        );
        Ok(())
    }

    /// Defaults, then `./Settings.toml`, then the config directory's copy
    fn load_base_settings() -> anyhow::Result<(Self, Vec<PathBuf>)> {
        let mut settings = Self::default();
        let mut sources = Vec::new();

        let local_path = PathBuf::from(SETTINGS_FILE);
        if local_path.exists() {
            settings = Self::load_from_path(&local_path)?;
            sources.push(local_path);
        }

        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            let config_path = Path::new(&config_dir).join(SETTINGS_FILE);
            if config_path.exists() {
                settings = Self::load_from_path(&config_path)?;
                sources.push(config_path);
            }
        }

        Ok((settings, sources))
    }

    /// Apply environment variable overrides to settings
    ///
    /// # Errors
    /// Returns an error if `ATTESTATION_PREFERENCE` is set to an unknown token
    pub fn apply_env_overrides(settings: &mut Self) -> anyhow::Result<()> {
        Self::apply_webauthn_env_overrides(&mut settings.webauthn)?;
        Self::apply_registration_env_overrides(&mut settings.registration);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Ok(())
    }

    /// Apply environment overrides for relying party settings
    ///
    /// # Errors
    /// Returns an error if `ATTESTATION_PREFERENCE` is set to an unknown token
    pub fn apply_webauthn_env_overrides(webauthn: &mut WebAuthnSettings) -> anyhow::Result<()> {
        if let Ok(rp_id) = std::env::var("RP_ID") {
            webauthn.rp_id = rp_id;
        }
        if let Ok(rp_name) = std::env::var("RP_NAME") {
            webauthn.rp_name = rp_name;
        }
        if let Ok(rp_origin) = std::env::var("RP_ORIGIN") {
            webauthn.rp_origin = rp_origin;
        }
        if let Ok(user_verification) = std::env::var("USER_VERIFICATION") {
            webauthn.user_verification = user_verification;
        }
        Self::apply_numeric_env_override("WEBAUTHN_TIMEOUT_SECONDS", &mut webauthn.timeout_seconds);

        // A typo must not silently weaken the attestation the relying party asked for
        if let Ok(token) = std::env::var("ATTESTATION_PREFERENCE") {
            webauthn.attestation = AttestationPreference::from_str(&token)
                .context("Invalid ATTESTATION_PREFERENCE")?;
        }
        Ok(())
    }

    /// Apply environment overrides for registration store settings
    pub fn apply_registration_env_overrides(registration: &mut RegistrationSettings) {
        Self::apply_numeric_env_override("REGISTRATION_TTL_SECONDS", &mut registration.ttl_seconds);
        Self::apply_numeric_env_override("REGISTRATION_MAX_PENDING", &mut registration.max_pending);
        Self::apply_numeric_env_override(
            "REGISTRATION_SWEEP_INTERVAL_SECONDS",
            &mut registration.sweep_interval_seconds,
        );
    }

    /// Apply environment overrides for logging settings
    fn apply_logging_env_overrides(logging: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging.level = log_level;
        }
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override<T: FromStr>(env_var: &str, target: &mut T) {
        if let Ok(value_str) = std::env::var(env_var) {
            match value_str.trim().parse::<T>() {
                Ok(value) => *target = value,
                Err(_) => warn!("Ignoring {env_var}={value_str}: not a valid number"),
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        for var in [
            "RP_ID",
            "RP_NAME",
            "RP_ORIGIN",
            "USER_VERIFICATION",
            "WEBAUTHN_TIMEOUT_SECONDS",
            "ATTESTATION_PREFERENCE",
            "REGISTRATION_TTL_SECONDS",
            "REGISTRATION_MAX_PENDING",
            "REGISTRATION_SWEEP_INTERVAL_SECONDS",
            CONFIG_DIR_ENV,
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = RegistrySettings::default();
        assert_eq!(settings.registration.ttl_seconds, 300);
        assert_eq!(settings.registration.max_pending, 10_000);
        assert_eq!(settings.registration.sweep_interval(), Duration::from_secs(60));
        assert_eq!(settings.webauthn.attestation, AttestationPreference::None);
        assert_eq!(settings.logging.level, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_store_config_conversion() {
        let registration = RegistrationSettings {
            ttl_seconds: 120,
            max_pending: 5,
            sweep_interval_seconds: 10,
        };
        let config = registration.store_config();
        assert_eq!(config.ttl, Duration::from_secs(120));
        assert_eq!(config.max_pending, 5);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut settings = RegistrySettings::default();
        settings.registration.ttl_seconds = 0;
        assert!(settings.validate().is_err());

        let mut settings = RegistrySettings::default();
        settings.registration.max_pending = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[webauthn]
rp_id = "example.com"
rp_origin = "https://example.com"
attestation = "direct"

[registration]
ttl_seconds = 90
"#
        )
        .unwrap();

        let settings = RegistrySettings::load_from_path(file.path()).unwrap();
        assert_eq!(settings.webauthn.rp_id, "example.com");
        assert_eq!(settings.webauthn.attestation, AttestationPreference::Direct);
        assert_eq!(settings.registration.ttl_seconds, 90);
        // Unset values keep their defaults
        assert_eq!(settings.registration.max_pending, 10_000);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_load_from_path_rejects_unknown_attestation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[webauthn]\nattestation = \"enterprise\"").unwrap();
        assert!(RegistrySettings::load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = RegistrySettings::load_from_path("/definitely/not/here/Settings.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read settings"));
    }

    #[test]
    #[serial]
    fn test_registration_env_overrides() {
        clean_env_vars();

        std::env::set_var("REGISTRATION_TTL_SECONDS", "45");
        std::env::set_var("REGISTRATION_MAX_PENDING", "12");
        std::env::set_var("REGISTRATION_SWEEP_INTERVAL_SECONDS", "not-a-number");

        let mut registration = RegistrationSettings::default();
        RegistrySettings::apply_registration_env_overrides(&mut registration);

        assert_eq!(registration.ttl_seconds, 45);
        assert_eq!(registration.max_pending, 12);
        assert_eq!(registration.sweep_interval_seconds, 60); // Unparseable, unchanged

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_webauthn_env_overrides() {
        clean_env_vars();

        std::env::set_var("RP_ID", "login.example.com");
        std::env::set_var("RP_ORIGIN", "https://login.example.com");
        std::env::set_var("ATTESTATION_PREFERENCE", "indirect");

        let mut webauthn = WebAuthnSettings::default();
        RegistrySettings::apply_webauthn_env_overrides(&mut webauthn).unwrap();

        assert_eq!(webauthn.rp_id, "login.example.com");
        assert_eq!(webauthn.rp_origin, "https://login.example.com");
        assert_eq!(webauthn.attestation, AttestationPreference::Indirect);
        assert_eq!(webauthn.rp_name, "Passkey Registry"); // Should remain unchanged

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_unknown_attestation_env_is_an_error() {
        clean_env_vars();

        std::env::set_var("ATTESTATION_PREFERENCE", "Direct");
        let mut webauthn = WebAuthnSettings::default();
        let result = RegistrySettings::apply_webauthn_env_overrides(&mut webauthn);

        assert!(result.is_err());
        assert_eq!(webauthn.attestation, AttestationPreference::None);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_dir_settings_are_loaded() {
        clean_env_vars();

        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[registration]\nmax_pending = 7\n",
        )
        .unwrap();
        std::env::set_var(CONFIG_DIR_ENV, dir.path());

        let (settings, sources) = RegistrySettings::load_base_settings().unwrap();
        assert_eq!(settings.registration.max_pending, 7);
        assert!(sources.contains(&dir.path().join(SETTINGS_FILE)));

        clean_env_vars();
    }
}
