//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Clone, Tabled, Serialize)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Default")]
    default: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking tokens.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "page_size = {}", cfg.defaults.page_size);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref dir) = p.download_dir {
            let _ = writeln!(out, "download_dir = \"{}\"", dir.display());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(ref login) = p.login_url {
            let _ = writeln!(out, "login_url = \"{login}\"");
        }
    }

    out
}

/// Copy of the config with plaintext tokens masked, for structured output.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
    cfg
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt {
        message: e.to_string(),
    }
}

fn save(cfg: &Config) -> Result<std::path::PathBuf, CliError> {
    Ok(config::save_config(cfg)?)
}

/// Apply one `config set` key to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "server" => profile.server = value,
        "token_env" | "token-env" => profile.token_env = Some(value),
        "download_dir" | "download-dir" => profile.download_dir = Some(value.into()),
        "timeout" => {
            profile.timeout = Some(
                value
                    .parse()
                    .map_err(|_| CliError::validation("timeout", "must be a number (seconds)"))?,
            );
        }
        "insecure" => {
            profile.insecure = Some(
                value
                    .parse()
                    .map_err(|_| CliError::validation("insecure", "must be 'true' or 'false'"))?,
            );
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "login_url" | "login-url" => profile.login_url = Some(value),
        other => {
            return Err(CliError::validation(
                other,
                format!(
                    "unknown config key '{other}'. Valid keys: server, token_env, \
                     download_dir, timeout, insecure, ca_cert, login_url"
                ),
            ));
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(
                &config::output_format(global, &cfg),
                &redacted(&cfg),
                format_config_redacted,
                |_| "config".into(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_value(profile, &key, value)?;

            save(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let rows: Vec<ProfileRow> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileRow {
                    name: name.clone(),
                    server: p.server.clone(),
                    default: if name == default { "*".into() } else { String::new() },
                })
                .collect();
            if rows.is_empty() {
                eprintln!("No profiles configured. Run: adminkit config init");
                return Ok(());
            }
            let out = output::render_list(
                &config::output_format(global, &cfg),
                &rows,
                ProfileRow::clone,
                |r| r.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let token = rpassword::prompt_password("Token: ").map_err(prompt_err)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(CliError::validation("token", "value cannot be empty"));
            }
            adminkit_config::store_token(&profile_name, token)?;
            eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

/// Interactive wizard: one profile, optionally with a stored token.
fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("adminkit configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Server URL")
        .default("http://localhost:3000".into())
        .interact_text()
        .map_err(prompt_err)?;

    let choices = &[
        "No token (open server)",
        "Store token in system keyring (recommended)",
        "Save token to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Authentication")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let token = match selection {
        0 => None,
        n => {
            let token = rpassword::prompt_password("Token: ").map_err(prompt_err)?;
            if token.trim().is_empty() {
                return Err(CliError::validation("token", "token cannot be empty"));
            }
            if n == 1 {
                adminkit_config::store_token(&profile_name, token.trim())?;
                eprintln!("   ✓ Token stored in system keyring");
                None
            } else {
                Some(token.trim().to_owned())
            }
        }
    };

    let profile = Profile {
        server,
        token,
        ..Profile::default()
    };
    // Validate before writing anything.
    adminkit_config::build_client_config(&profile, None)?;

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.profiles.len() == 1 || cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    let path = save(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Test it: adminkit hello --profile {profile_name}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use adminkit_config::Defaults;

    fn sample() -> Config {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "local".to_owned(),
            Profile {
                server: "http://localhost:3000".into(),
                token: Some("s3cret".into()),
                ..Profile::default()
            },
        );
        Config {
            default_profile: Some("local".into()),
            defaults: Defaults::default(),
            profiles,
        }
    }

    #[test]
    fn show_masks_tokens() {
        let text = format_config_redacted(&sample());
        assert!(text.contains("[profiles.local]"));
        assert!(text.contains("token = \"****\""));
        assert!(!text.contains("s3cret"));

        let masked = redacted(&sample());
        assert_eq!(masked.profiles["local"].token.as_deref(), Some("****"));
    }

    #[test]
    fn set_parses_typed_values() {
        let mut p = Profile::default();
        set_profile_value(&mut p, "timeout", "12".into()).unwrap();
        set_profile_value(&mut p, "insecure", "true".into()).unwrap();
        set_profile_value(&mut p, "login-url", "/signin".into()).unwrap();
        assert_eq!(p.timeout, Some(12));
        assert_eq!(p.insecure, Some(true));
        assert_eq!(p.login_url.as_deref(), Some("/signin"));
    }

    #[test]
    fn set_rejects_unknown_keys() {
        let mut p = Profile::default();
        let err = set_profile_value(&mut p, "site", "x".into()).unwrap_err();
        assert!(err.to_string().contains("site"));
    }
}
