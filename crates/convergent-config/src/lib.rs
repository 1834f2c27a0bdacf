//! Profile configuration for convergent.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to the runtime types `convergent_core` consumes
//! ([`GatewayConfig`] and [`MutationOptions`]). Core never reads files; the
//! binary layers its flag overrides on top of what this crate produces.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use convergent_core::{GatewayConfig, MutationOptions, PollSettings, TlsVerification};

/// Environment variable that points at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "CONVERGENT_CONFIG";

/// Keyring service under which profile tokens are stored.
pub const KEYRING_SERVICE: &str = "convergent";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

/// Settings every profile inherits unless it overrides them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between status polls. Never effective below the service floor.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_wait")]
    pub wait_for_convergence: bool,

    /// Stop waiting after this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<u64>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            wait_for_convergence: default_wait(),
            deadline: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    convergent_core::MINIMUM_POLL_INTERVAL.as_secs()
}
fn default_wait() -> bool {
    true
}

/// A named service profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Service base URL (e.g., "https://config.example.com/v1").
    pub endpoint: String,

    /// Bearer token (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_convergence: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<u64>,
}

impl Profile {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `CONVERGENT_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "convergent", "convergent").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("convergent");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// Environment overrides use a double underscore between path segments,
/// e.g. `CONVERGENT_DEFAULTS__POLL_INTERVAL=120`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CONVERGENT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the bearer token from the credential chain (no CLI flag step).
///
/// `Ok(None)` means the profile declares no credential at all, which is
/// valid for services that do not authenticate. A profile that names a
/// `token_env` which resolves nowhere is an error.
pub fn resolve_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<SecretString>, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(Some(SecretString::from(val)));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(Some(SecretString::from(secret)));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(Some(SecretString::from(token.clone())));
    }

    if profile.token_env.is_some() {
        return Err(ConfigError::NoCredentials {
            profile: profile_name.into(),
        });
    }
    Ok(None)
}

/// Store a profile's token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
        .map_err(|e| ConfigError::invalid("keyring", format!("failed to access keyring: {e}")))?;
    entry
        .set_password(token)
        .map_err(|e| ConfigError::invalid("keyring", format!("failed to store token: {e}")))
}

// ── Translation to core types ───────────────────────────────────────

/// Build a `GatewayConfig` from a profile, falling back to `defaults`.
pub fn profile_to_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewayConfig, ConfigError> {
    let mut gateway = gateway_settings(profile, defaults)?;
    gateway.token = resolve_token(profile, profile_name)?;
    Ok(gateway)
}

/// Connection settings without touching the credential chain.
pub fn gateway_settings(profile: &Profile, defaults: &Defaults) -> Result<GatewayConfig, ConfigError> {
    let endpoint: url::Url = profile
        .endpoint
        .parse()
        .map_err(|_| ConfigError::invalid("endpoint", format!("invalid URL: {}", profile.endpoint)))?;

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::invalid("timeout", "must be at least 1 second"));
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut gateway = GatewayConfig::new(endpoint);
    gateway.tls = tls;
    gateway.timeout = Duration::from_secs(timeout);
    Ok(gateway)
}

/// Build the mutation options a profile asks for.
///
/// The poll floor always stays at the service cadence; only the interval is
/// configurable.
pub fn profile_to_mutation_options(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<MutationOptions, ConfigError> {
    let poll_interval = profile.poll_interval.unwrap_or(defaults.poll_interval);

    let deadline = match profile.deadline.or(defaults.deadline) {
        Some(0) => return Err(ConfigError::invalid("deadline", "must be at least 1 second")),
        other => other.map(Duration::from_secs),
    };

    Ok(MutationOptions {
        wait_for_convergence: profile
            .wait_for_convergence
            .unwrap_or(defaults.wait_for_convergence),
        poll: PollSettings::with_interval(Duration::from_secs(poll_interval)),
        cancellation: None,
        deadline,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.poll_interval, 60);
        assert!(cfg.defaults.wait_for_convergence);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_overrides_defaults() {
        let file = write_config(
            r#"
default_profile = "lab"

[defaults]
timeout = 10
poll_interval = 90

[profiles.lab]
endpoint = "https://config.lab.example.com/v1"
token = "lab-token"
timeout = 5
deadline = 1800
"#,
        );
        let cfg = load_config_from(file.path()).unwrap();
        let lab = cfg.profile("lab").unwrap();

        let gateway = profile_to_gateway_config(lab, "lab", &cfg.defaults).unwrap();
        assert_eq!(gateway.endpoint.host_str(), Some("config.lab.example.com"));
        assert_eq!(gateway.timeout, Duration::from_secs(5));
        assert_eq!(gateway.tls, TlsVerification::SystemDefaults);
        assert_eq!(gateway.token.unwrap().expose_secret(), "lab-token");

        let opts = profile_to_mutation_options(lab, &cfg.defaults).unwrap();
        assert_eq!(opts.poll.interval, Duration::from_secs(90));
        assert_eq!(opts.deadline, Some(Duration::from_secs(1800)));
        assert!(opts.wait_for_convergence);
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let mut profile = Profile::new("https://localhost:8443");
        profile.ca_cert = Some("/etc/ssl/lab.pem".into());
        profile.insecure = Some(true);
        let gateway = gateway_settings(&profile, &Defaults::default()).unwrap();
        assert_eq!(gateway.tls, TlsVerification::DangerAcceptInvalid);

        profile.insecure = None;
        let gateway = gateway_settings(&profile, &Defaults::default()).unwrap();
        assert_eq!(gateway.tls, TlsVerification::CustomCa("/etc/ssl/lab.pem".into()));
    }

    #[test]
    fn validation_names_the_field() {
        let profile = Profile::new("not a url");
        let err = gateway_settings(&profile, &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "endpoint"));

        let mut profile = Profile::new("https://localhost");
        profile.deadline = Some(0);
        let err = profile_to_mutation_options(&profile, &Defaults::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid deadline: must be at least 1 second");
    }

    #[test]
    fn unresolvable_token_env_is_an_error() {
        let mut profile = Profile::new("https://localhost");
        profile.token_env = Some("CONVERGENT_TEST_TOKEN_THAT_IS_NEVER_SET".into());
        let err = resolve_token(&profile, "ghost-profile-for-tests").unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn unknown_profile_is_reported() {
        let err = Config::default().profile("prod").unwrap_err();
        assert_eq!(err.to_string(), "profile 'prod' not found in config");
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("https://config.example.com/v1");
        profile.poll_interval = Some(120);
        cfg.profiles.insert("default".into(), profile);
        save_config_to(&path, &cfg).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.default]"));
        assert!(!written.contains("token"));

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("default").unwrap().poll_interval, Some(120));
    }
}
