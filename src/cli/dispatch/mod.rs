//! Command-line argument dispatch.
//!
//! Parses validated CLI matches into an [`Action`] carrying the resolved
//! client configuration.

use crate::authz::Role;
use crate::cli::actions::{account, inspect, Action};
use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::time::Duration;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the configuration is
/// invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (name, sub) = matches
        .subcommand()
        .context("missing subcommand")?;

    let config = config(sub)?;

    let action = match name {
        "login" => Action::Login(account::LoginArgs {
            config,
            email: required(sub, "email")?,
            password: SecretString::from(required(sub, "password")?),
        }),
        "register" => Action::Register(account::RegisterArgs {
            config,
            first_name: required(sub, "first-name")?,
            last_name: required(sub, "last-name")?,
            email: required(sub, "email")?,
            password: SecretString::from(required(sub, "password")?),
            role: sub
                .get_one::<String>("role")
                .map(|role| role.parse::<Role>())
                .transpose()?,
        }),
        "logout" => Action::Logout(account::LogoutArgs { config }),
        "whoami" => Action::WhoAmI(inspect::WhoAmIArgs { config }),
        "visit" => Action::Visit(inspect::VisitArgs {
            config,
            path: required(sub, "path")?,
        }),
        "can" => Action::Can(inspect::CanArgs {
            config,
            role: required(sub, "role")?.parse::<Role>()?,
        }),
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}

fn config(matches: &clap::ArgMatches) -> Result<AppConfig> {
    let api_url = matches
        .get_one::<String>("api-url")
        .ok_or_else(|| anyhow!("missing required argument: --api-url"))?;

    let mut config = AppConfig::new(api_url).context("invalid AULA_API_URL")?;

    if let Some(path) = matches.get_one::<String>("storage-path") {
        config = config.with_storage_path(path);
    }

    let timeout = matches
        .get_one::<u64>("timeout")
        .copied()
        .unwrap_or(crate::config::DEFAULT_TIMEOUT_SECONDS);
    config = config.with_timeout(Duration::from_secs(timeout));

    let login_path = matches
        .get_one::<String>("login-path")
        .map_or(crate::config::DEFAULT_LOGIN_PATH, String::as_str);
    let landing_path = matches
        .get_one::<String>("landing-path")
        .map_or(crate::config::DEFAULT_LANDING_PATH, String::as_str);

    Ok(config.with_routes(login_path, landing_path)?)
}

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}
