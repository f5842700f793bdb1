//! CLI configuration: a thin layer over `adminkit_config`.
//!
//! Re-exports the shared types and resolves the active profile into a
//! `ClientConfig`, letting `GlobalOpts` flags (--server, --token, ...)
//! override profile values.

use std::time::Duration;

use adminkit_api::TlsMode;
use adminkit_core::ClientConfig;
use secrecy::SecretString;
use url::Url;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use adminkit_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Output format from `--output`, else the config default, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    use clap::ValueEnum;

    global.output.clone().unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or_default()
    })
}

/// Comma-separated profile names, for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build the `ClientConfig` for this invocation.
///
/// Uses the active profile when it exists, with flag overrides applied.
/// Without a profile, `--server` alone is enough.
pub fn resolve_client_config(global: &GlobalOpts, config: &Config) -> Result<ClientConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let mut client = match config.profiles.get(&profile_name) {
        Some(profile) => {
            let token = resolve_token_with_flag(profile, &profile_name, global);
            let mut profile = profile.clone();
            if let Some(ref server) = global.server {
                profile.server.clone_from(server);
            }
            adminkit_config::build_client_config(&profile, token)?
        }
        None => {
            // An explicitly requested profile must exist.
            if global.profile.is_some() {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: available_profiles(config),
                });
            }
            let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let url = parse_server(server)?;
            let mut client = ClientConfig::new(url);
            client.token = global.token.clone().map(SecretString::from);
            client.timeout = Duration::from_secs(config.defaults.timeout);
            client
        }
    };

    if global.insecure {
        client.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }
    if let Some(ref dir) = global.download_dir {
        client.download_dir.clone_from(dir);
    }
    Ok(client)
}

/// `--token` wins over the profile's token chain.
fn resolve_token_with_flag(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Option<SecretString> {
    if let Some(ref token) = global.token {
        return Some(SecretString::from(token.clone()));
    }
    adminkit_config::resolve_token(profile, profile_name)
}

fn parse_server(server: &str) -> Result<Url, CliError> {
    let url: Url = server
        .parse()
        .map_err(|_| CliError::validation("server", format!("invalid URL: {server}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliError::validation(
            "server",
            format!("expected an http(s) URL, got '{server}'"),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use adminkit_config::Defaults;
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["adminkit"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["hello"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(name: &str, profile: Profile) -> Config {
        let mut profiles = BTreeMap::new();
        profiles.insert(name.to_owned(), profile);
        Config {
            default_profile: Some(name.to_owned()),
            defaults: Defaults::default(),
            profiles,
        }
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with(
            "local",
            Profile {
                server: "http://localhost:3000".into(),
                token: Some("from-profile".into()),
                timeout: Some(5),
                ..Profile::default()
            },
        );
        let g = global(&["--server", "http://10.0.0.2:8080", "--token", "t0k", "--timeout", "9"]);

        let client = resolve_client_config(&g, &cfg).unwrap();
        assert_eq!(client.url.as_str(), "http://10.0.0.2:8080/");
        assert_eq!(client.token.unwrap().expose_secret(), "t0k");
        assert_eq!(client.timeout, Duration::from_secs(9));
    }

    #[test]
    fn server_flag_works_without_profile() {
        let g = global(&["--server", "http://localhost:3000", "-k"]);
        let client = resolve_client_config(&g, &Config::default()).unwrap();
        assert_eq!(client.url.as_str(), "http://localhost:3000/");
        assert!(client.token.is_none());
        assert!(matches!(client.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn missing_server_is_reported() {
        let g = global(&[]);
        let err = resolve_client_config(&g, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_explicit_profile_is_reported() {
        let cfg = config_with("local", Profile::default());
        let g = global(&["--profile", "prod", "--server", "http://localhost:3000"]);
        let err = resolve_client_config(&g, &cfg).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, "local");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn output_falls_back_to_config_default() {
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();
        assert_eq!(output_format(&global(&[]), &cfg), OutputFormat::Yaml);
        assert_eq!(output_format(&global(&["-o", "json"]), &cfg), OutputFormat::Json);
    }
}
