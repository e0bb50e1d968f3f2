//! Client configuration: where the authentication service lives, where the
//! bearer credential is persisted, and which routes the guard redirects to.
//! Values here are public; the credential itself never passes through config.

use crate::errors::AppError;
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Default request timeout applied to every auth service call.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
/// Where unauthenticated visitors are sent.
pub const DEFAULT_LOGIN_PATH: &str = "/login";
/// Where authenticated visitors without the required role are sent.
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";
/// File name of the persisted session under the config directory.
pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub storage_path: PathBuf,
    pub timeout: Duration,
    pub login_path: String,
    pub landing_path: String,
}

impl AppConfig {
    /// Builds a config around the auth service base URL with default routes,
    /// timeout and storage location.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the URL is not an absolute http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            storage_path: default_storage_path(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            landing_path: DEFAULT_LANDING_PATH.to_string(),
        })
    }

    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the guard redirect targets. Both must be absolute paths.
    ///
    /// # Errors
    /// Returns `AppError::Config` when a path does not start with `/`.
    pub fn with_routes(mut self, login_path: &str, landing_path: &str) -> Result<Self, AppError> {
        self.login_path = normalize_route(login_path)?;
        self.landing_path = normalize_route(landing_path)?;
        Ok(self)
    }
}

/// `<config dir>/aula/session.json`, falling back to the working directory
/// when the platform has no config directory.
#[must_use]
pub fn default_storage_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SESSION_FILE_NAME)
}

fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Config(
            "Auth service URL is not configured.".to_string(),
        ));
    }

    let url = Url::parse(trimmed)
        .map_err(|err| AppError::Config(format!("Invalid auth service URL: {err}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::Config(format!(
                "Unsupported auth service URL scheme: {scheme}"
            )))
        }
    }

    if url.host().is_none() {
        return Err(AppError::Config(
            "Auth service URL has no host.".to_string(),
        ));
    }

    Ok(url)
}

fn normalize_route(path: &str) -> Result<String, AppError> {
    let trimmed = path.trim();
    if !trimmed.starts_with('/') {
        return Err(AppError::Config(format!(
            "Route must be an absolute path: {trimmed}"
        )));
    }
    if trimmed.len() > 1 {
        Ok(trimmed.trim_end_matches('/').to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = AppConfig::new("https://api.aula.dev").unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://api.aula.dev/");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.landing_path, "/dashboard");
        assert!(config.storage_path.ends_with("aula/session.json"));
    }

    #[test]
    fn rejects_empty_and_non_http_urls() {
        assert!(matches!(AppConfig::new("  "), Err(AppError::Config(_))));
        assert!(matches!(
            AppConfig::new("ftp://files.aula.dev"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(AppConfig::new("not a url"), Err(AppError::Config(_))));
    }

    #[test]
    fn with_routes_normalizes_trailing_slash() {
        let config = AppConfig::new("http://localhost:4000")
            .unwrap()
            .with_routes("/auth/login/", "/home")
            .unwrap();
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.landing_path, "/home");
    }

    #[test]
    fn with_routes_rejects_relative_paths() {
        let result = AppConfig::new("http://localhost:4000")
            .unwrap()
            .with_routes("login", "/home");
        assert!(result.is_err());
    }
}
