//! CLI configuration: thin wrapper around `convergent_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--endpoint, --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use convergent_core::{GatewayConfig, MutationOptions, TlsVerification};

use crate::cli::{GlobalOpts, PollArgs};
use crate::error::CliError;

pub use convergent_config::{Config, Profile, config_path, load_config, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Everything a remote command needs: where to connect and how to wait.
pub struct Resolved {
    pub gateway: GatewayConfig,
    pub options: MutationOptions,
}

/// Build gateway settings and mutation options from the config file,
/// the active profile, and CLI overrides.
pub fn resolve(global: &GlobalOpts, poll: &PollArgs) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly named profile must exist.
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        // No profile: build from CLI flags / env vars alone.
        None => {
            let endpoint = global.endpoint.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(endpoint)
        }
    };

    if let Some(ref endpoint) = global.endpoint {
        profile.endpoint.clone_from(endpoint);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut gateway = if let Some(ref token) = global.token {
        let mut gateway = convergent_config::gateway_settings(&profile, &cfg.defaults)?;
        gateway.token = Some(SecretString::from(token.clone()));
        gateway
    } else {
        convergent_config::profile_to_gateway_config(&profile, &profile_name, &cfg.defaults)?
    };
    if global.insecure {
        gateway.tls = TlsVerification::DangerAcceptInvalid;
    }

    let mut options = convergent_config::profile_to_mutation_options(&profile, &cfg.defaults)?;
    apply_poll_args(&mut options, poll)?;

    Ok(Resolved { gateway, options })
}

/// Fold --poll-interval / --deadline into the profile's options.
pub fn apply_poll_args(options: &mut MutationOptions, poll: &PollArgs) -> Result<(), CliError> {
    if let Some(interval) = poll.poll_interval {
        options.poll.interval = interval;
    }
    if let Some(deadline) = poll.deadline {
        if deadline == Duration::ZERO {
            return Err(CliError::validation("deadline", "must be greater than zero"));
        }
        options.deadline = Some(deadline);
    }
    Ok(())
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
