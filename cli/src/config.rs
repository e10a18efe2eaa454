//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The client secret is loaded from the BGM_CLIENT_SECRET env var or
//! `client_secret_file`, never stored in the TOML directly to avoid
//! leaking secrets. Everything is read once at startup; the loaded
//! `Config` is the only configuration object in the process.

use bangumi_auth::{OAuthConfig, Secret};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub uri: UriConfig,
    pub user: UserConfig,
}

/// Registered application settings
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret>,
    /// Path to a file containing the client secret (alternative to the
    /// BGM_CLIENT_SECRET env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    pub redirect_uri: String,
}

/// Provider and API endpoints
#[derive(Debug, Deserialize)]
pub struct UriConfig {
    pub authorize: String,
    pub token: String,
    #[serde(default)]
    pub token_status: Option<String>,
    pub base: String,
}

/// Local user state
#[derive(Debug, Deserialize)]
pub struct UserConfig {
    pub credentials_file: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    ///
    /// Client secret resolution order:
    /// 1. BGM_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.app.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("client_id must not be empty".into()));
        }

        for (key, value) in [
            ("uri.authorize", &config.uri.authorize),
            ("uri.token", &config.uri.token),
            ("uri.base", &config.uri.base),
            ("app.redirect_uri", &config.app.redirect_uri),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "{key} must start with http:// or https://, got: {value}"
                )));
            }
        }

        // Resolve client secret: env var takes precedence over file
        if let Ok(secret) = std::env::var("BGM_CLIENT_SECRET") {
            config.app.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.app.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                ConfigError::Invalid(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.app.client_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or BGMCLI_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("BGMCLI_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("bgmcli.toml")
    }

    /// Build the OAuth context object the auth crate consumes.
    pub fn oauth(&self) -> Result<OAuthConfig, ConfigError> {
        let client_secret = self.app.client_secret.clone().ok_or_else(|| {
            ConfigError::Invalid(
                "no client secret: set BGM_CLIENT_SECRET or app.client_secret_file".into(),
            )
        })?;
        Ok(OAuthConfig {
            client_id: self.app.client_id.clone(),
            client_secret,
            redirect_uri: self.app.redirect_uri.clone(),
            authorize_uri: self.uri.authorize.clone(),
            token_uri: self.uri.token.clone(),
            token_status_uri: self.uri.token_status.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[app]
client_id = "bgm012345"
redirect_uri = "http://localhost/callback"

[uri]
authorize = "https://bgm.tv/oauth/authorize"
token = "https://bgm.tv/oauth/access_token"
base = "https://api.bgm.tv"

[user]
credentials_file = "/tmp/credentials.json"
"#
    }

    #[test]
    fn load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("BGM_CLIENT_SECRET") };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, valid_toml()).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.app.client_id, "bgm012345");
        assert_eq!(config.uri.base, "https://api.bgm.tv");
        assert_eq!(config.uri.token_status, None);
        assert_eq!(
            config.user.credentials_file,
            PathBuf::from("/tmp/credentials.json")
        );
        assert!(config.app.client_secret.is_none());
    }

    #[test]
    fn load_missing_file_errors() {
        let result = Config::load(Path::new("/nonexistent/path/bgmcli.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{{{ toml").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn secret_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, valid_toml()).unwrap();

        unsafe { set_env("BGM_CLIENT_SECRET", "sekrit-env") };
        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.app.client_secret.as_ref().unwrap().expose(),
            "sekrit-env"
        );
        unsafe { remove_env("BGM_CLIENT_SECRET") };
    }

    #[test]
    fn secret_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("BGM_CLIENT_SECRET") };

        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "sekrit-file\n").unwrap();

        let toml_content = format!(
            r#"
[app]
client_id = "bgm012345"
client_secret_file = "{}"
redirect_uri = "http://localhost/callback"

[uri]
authorize = "https://bgm.tv/oauth/authorize"
token = "https://bgm.tv/oauth/access_token"
base = "https://api.bgm.tv"

[user]
credentials_file = "/tmp/credentials.json"
"#,
            secret_path.display()
        );
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, &toml_content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.app.client_secret.as_ref().unwrap().expose(),
            "sekrit-file"
        );
    }

    #[test]
    fn env_secret_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "sekrit-file").unwrap();

        let toml_content = format!(
            r#"
[app]
client_id = "bgm012345"
client_secret_file = "{}"
redirect_uri = "http://localhost/callback"

[uri]
authorize = "https://bgm.tv/oauth/authorize"
token = "https://bgm.tv/oauth/access_token"
base = "https://api.bgm.tv"

[user]
credentials_file = "/tmp/credentials.json"
"#,
            secret_path.display()
        );
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, &toml_content).unwrap();

        unsafe { set_env("BGM_CLIENT_SECRET", "sekrit-env") };
        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.app.client_secret.as_ref().unwrap().expose(),
            "sekrit-env"
        );
        unsafe { remove_env("BGM_CLIENT_SECRET") };
    }

    #[test]
    fn empty_client_id_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("BGM_CLIENT_SECRET") };

        let toml_content = valid_toml().replace("bgm012345", "  ");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, &toml_content).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(
            err.to_string().contains("client_id"),
            "error should name the field, got: {err}"
        );
    }

    #[test]
    fn uri_without_scheme_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("BGM_CLIENT_SECRET") };

        let toml_content = valid_toml().replace("https://api.bgm.tv", "api.bgm.tv");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, &toml_content).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(
            err.to_string().contains("uri.base"),
            "error should name the key, got: {err}"
        );
    }

    #[test]
    fn resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("BGMCLI_CONFIG", "/env/should-lose.toml") };
        assert_eq!(
            Config::resolve_path(Some("/cli/wins.toml")),
            PathBuf::from("/cli/wins.toml")
        );
        unsafe { remove_env("BGMCLI_CONFIG") };
    }

    #[test]
    fn resolve_path_env_then_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("BGMCLI_CONFIG", "/env/path.toml") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("/env/path.toml"));
        unsafe { remove_env("BGMCLI_CONFIG") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("bgmcli.toml"));
    }

    #[test]
    fn oauth_requires_a_secret() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("BGM_CLIENT_SECRET") };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, valid_toml()).unwrap();

        let config = Config::load(&path).unwrap();
        let err = config.oauth().unwrap_err();
        assert!(
            err.to_string().contains("BGM_CLIENT_SECRET"),
            "error should say how to supply the secret, got: {err}"
        );
    }

    #[test]
    fn oauth_context_carries_all_endpoints() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bgmcli.toml");
        std::fs::write(&path, valid_toml()).unwrap();

        unsafe { set_env("BGM_CLIENT_SECRET", "sekrit") };
        let config = Config::load(&path).unwrap();
        let oauth = config.oauth().unwrap();
        unsafe { remove_env("BGM_CLIENT_SECRET") };

        assert_eq!(oauth.client_id, "bgm012345");
        assert_eq!(oauth.authorize_uri, "https://bgm.tv/oauth/authorize");
        assert_eq!(oauth.token_uri, "https://bgm.tv/oauth/access_token");
        assert_eq!(oauth.redirect_uri, "http://localhost/callback");
        assert_eq!(oauth.client_secret.expose(), "sekrit");
    }
}
