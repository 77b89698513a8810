//! CLI configuration: thin wrapper around `kumly_config` shared types.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` flag overrides
//! (--url, --username, --password, --token, etc.).

use std::time::Duration;

use secrecy::SecretString;

use kumly_config::AuthMode;
use kumly_core::{AuthCredentials, SessionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use kumly_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
pub fn build_session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg, global);
    }
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound { name: profile_name });
    }

    // No profile: build from flags / env alone
    let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    resolve_profile(&Profile::new(url), &profile_name, &cfg, global)
}

/// Translate a `Profile` + global flags into a `SessionConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<SessionConfig, CliError> {
    // 1. URL (flag > env > profile)
    let url = kumly_config::parse_url(global.url.as_deref().unwrap_or(&profile.url))?;

    // 2. Auth credentials
    let auth = resolve_auth(profile, profile_name, global)?;

    let mut config = SessionConfig::new(url, auth);

    // 3. TLS verification
    config.tls = if global.insecure || profile.insecure.unwrap_or(cfg.defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Timeouts
    config.connect_timeout = Duration::from_secs(global.timeout);
    config.update_timeout = match profile.update_timeout.unwrap_or(cfg.defaults.update_timeout) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    if let Some(history) = profile.heartbeat_history {
        config.heartbeat_history = history;
    }
    Ok(config)
}

/// Flags first (--token, then --password), then the profile's `auth_mode`.
fn resolve_auth(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<AuthCredentials, CliError> {
    if let Some(ref token) = global.token {
        return Ok(AuthCredentials::Token(SecretString::from(token.clone())));
    }

    if let Some(ref password) = global.password {
        let username = global
            .username
            .clone()
            .or_else(|| profile.username.clone())
            .ok_or_else(|| CliError::NoCredentials {
                profile: profile_name.into(),
            })?;
        return Ok(AuthCredentials::Password {
            username,
            password: SecretString::from(password.clone()),
            totp: None,
        });
    }

    match profile.auth_mode {
        AuthMode::Password => {
            let mut profile = profile.clone();
            if global.username.is_some() {
                profile.username.clone_from(&global.username);
            }
            let (username, password) =
                kumly_config::resolve_password_credentials(&profile, profile_name).map_err(
                    |_| CliError::NoCredentials {
                        profile: profile_name.into(),
                    },
                )?;
            Ok(AuthCredentials::Password {
                username,
                password,
                totp: None,
            })
        }
        AuthMode::Token => Ok(AuthCredentials::Token(kumly_config::resolve_token(
            profile,
            profile_name,
        )?)),
        AuthMode::None => Ok(AuthCredentials::None),
    }
}

/// Attach a TOTP code to password credentials.
pub fn with_totp(mut config: SessionConfig, code: String) -> SessionConfig {
    if let AuthCredentials::Password { ref mut totp, .. } = config.auth {
        *totp = Some(code);
    }
    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["kumly"];
        argv.extend_from_slice(args);
        argv.push("info");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn profile() -> Profile {
        let mut p = Profile::new("https://kuma.lab:3001");
        p.username = Some("admin".into());
        p.password = Some("from-profile".into());
        p.update_timeout = Some(0);
        p
    }

    #[test]
    fn url_flag_overrides_profile() {
        let g = global(&["--url", "http://other:3001", "--token", "jwt"]);
        let config = resolve_profile(&profile(), "lab", &Config::default(), &g).unwrap();
        assert_eq!(config.url.as_str(), "http://other:3001/");
    }

    #[test]
    fn token_flag_selects_token_auth() {
        let g = global(&["--token", "jwt"]);
        let config = resolve_profile(&profile(), "lab", &Config::default(), &g).unwrap();
        assert!(matches!(config.auth, AuthCredentials::Token(_)));
    }

    #[test]
    fn password_flag_uses_profile_username() {
        let g = global(&["--password", "pw"]);
        let config = resolve_profile(&profile(), "lab", &Config::default(), &g).unwrap();
        match config.auth {
            AuthCredentials::Password { username, .. } => assert_eq!(username, "admin"),
            _ => panic!("expected password auth"),
        }
    }

    #[test]
    fn insecure_flag_and_zero_update_timeout() {
        let g = global(&["-k", "--token", "jwt", "--timeout", "5"]);
        let config = resolve_profile(&profile(), "lab", &Config::default(), &g).unwrap();
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.update_timeout, None);
    }

    #[test]
    fn totp_only_applies_to_password_auth() {
        let g = global(&["--password", "pw"]);
        let config = resolve_profile(&profile(), "lab", &Config::default(), &g).unwrap();
        match with_totp(config, "123456".into()).auth {
            AuthCredentials::Password { totp, .. } => assert_eq!(totp.as_deref(), Some("123456")),
            _ => panic!("expected password auth"),
        }
    }
}
