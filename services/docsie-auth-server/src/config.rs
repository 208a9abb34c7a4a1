//! Configuration types and loading
//!
//! Precedence: env vars > config file > defaults. The master key is read from
//! `DOCSIE_MASTER_KEY` or `master_key_file`, never from the TOML directly.
//! A `.env` file is loaded into the environment by `main` before this runs.

use common::Secret;
use docsie_auth::{ENV_DEPLOYMENT_KEY, ENV_EXPIRY_MINUTES, ENV_MASTER_KEY, ENV_REDIRECT_URL};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Config file name looked up in the working directory when none is given
const DEFAULT_CONFIG_FILE: &str = "docsie-auth-server.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub docsie: DocsieConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// HTML served on `GET /auth/login`
    #[serde(default = "default_login_page")]
    pub login_page: PathBuf,
}

/// Token and widget deployment settings
#[derive(Debug, Default, Deserialize)]
pub struct DocsieConfig {
    #[serde(skip)]
    pub master_key: Option<Secret<String>>,
    /// Path to a file containing the master key (alternative to DOCSIE_MASTER_KEY)
    #[serde(default)]
    pub master_key_file: Option<PathBuf>,
    /// Raw lifetime in minutes; validated when the issuer is built
    #[serde(default, deserialize_with = "deserialize_expiry")]
    pub expiry_minutes: Option<String>,
    #[serde(default)]
    pub deployment_key: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
            login_page: default_login_page(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5145))
}

fn default_max_connections() -> usize {
    1000
}

fn default_login_page() -> PathBuf {
    PathBuf::from("views/login.html")
}

/// Accept `expiry_minutes = 60` as well as `expiry_minutes = "60"`.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Int(n) => n.to_string(),
        Raw::Str(s) => s,
    }))
}

impl Config {
    /// Load configuration from an optional TOML file, then overlay environment variables.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        let mut config: Config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => Config::default(),
        };

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> common::Result<()> {
        let docsie = &mut self.docsie;

        // Master key: env var takes precedence over file
        if let Some(key) = Secret::from_env(ENV_MASTER_KEY) {
            docsie.master_key = Some(key);
        } else if let Some(ref key_file) = docsie.master_key_file {
            let key = std::fs::read_to_string(key_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read master_key_file {}: {e}",
                    key_file.display()
                ))
            })?;
            docsie.master_key = Secret::from_file_contents(key);
        }

        if let Some(raw) = env_non_empty(ENV_EXPIRY_MINUTES) {
            docsie.expiry_minutes = Some(raw);
        }
        if let Some(key) = env_non_empty(ENV_DEPLOYMENT_KEY) {
            docsie.deployment_key = Some(key);
        }
        if let Some(url) = env_non_empty(ENV_REDIRECT_URL) {
            docsie.redirect_url = Some(url);
        }

        if let Some(url) = docsie.redirect_url.as_deref().filter(|u| !u.is_empty())
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "redirect_url must start with http:// or https://, got: {url}"
            )));
        }

        Ok(())
    }

    /// Resolve the config file from CLI arg, CONFIG_PATH env var, or the
    /// default file name if it exists in the working directory.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 4] = [
        ENV_MASTER_KEY,
        ENV_EXPIRY_MINUTES,
        ENV_DEPLOYMENT_KEY,
        ENV_REDIRECT_URL,
    ];

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn clear_env() {
        for key in ENV_KEYS {
            unsafe { std::env::remove_var(key) };
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };

        let config = Config::load(None).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:5145".parse().unwrap());
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.server.login_page, PathBuf::from("views/login.html"));
        assert!(config.docsie.master_key.is_none());
        assert!(config.docsie.expiry_minutes.is_none());
        assert!(config.docsie.deployment_key.is_none());
    }

    #[test]
    fn load_file_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
listen_addr = "0.0.0.0:8080"
max_connections = 50

[docsie]
deployment_key = "deploy_file"
redirect_url = "https://auth.example.com/api/auth/login"
expiry_minutes = 15
"#,
        );

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.server.max_connections, 50);
        assert_eq!(config.docsie.deployment_key.as_deref(), Some("deploy_file"));
        assert_eq!(config.docsie.expiry_minutes.as_deref(), Some("15"));
    }

    #[test]
    fn env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[docsie]
deployment_key = "deploy_file"
expiry_minutes = "15"
"#,
        );

        unsafe {
            set_env(ENV_MASTER_KEY, "env-master-key");
            set_env(ENV_DEPLOYMENT_KEY, "deploy_env");
            set_env(ENV_EXPIRY_MINUTES, "90");
        }
        let config = Config::load(Some(&path)).unwrap();
        unsafe { clear_env() };

        assert_eq!(
            config.docsie.master_key.as_ref().unwrap().expose(),
            "env-master-key"
        );
        assert_eq!(config.docsie.deployment_key.as_deref(), Some("deploy_env"));
        assert_eq!(config.docsie.expiry_minutes.as_deref(), Some("90"));
    }

    #[test]
    fn master_key_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("master_key");
        std::fs::write(&key_path, "file-master-key\n").unwrap();
        let path = write_config(
            &dir,
            &format!("[docsie]\nmaster_key_file = \"{}\"\n", key_path.display()),
        );

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(
            config.docsie.master_key.as_ref().unwrap().expose(),
            "file-master-key"
        );
    }

    #[test]
    fn env_master_key_wins_over_missing_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[docsie]\nmaster_key_file = \"/nonexistent/master_key\"\n",
        );

        unsafe { set_env(ENV_MASTER_KEY, "env-wins") };
        let config = Config::load(Some(&path)).unwrap();
        unsafe { clear_env() };

        assert_eq!(config.docsie.master_key.as_ref().unwrap().expose(), "env-wins");
    }

    #[test]
    fn missing_master_key_file_is_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[docsie]\nmaster_key_file = \"/nonexistent/master_key\"\n",
        );

        let err = Config::load(Some(&path)).unwrap_err().to_string();
        assert!(err.contains("master_key_file"), "got: {err}");
    }

    #[test]
    fn env_master_key_keeps_whitespace() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        unsafe { set_env(ENV_MASTER_KEY, " spaced-key ") };
        let config = Config::load(None).unwrap();
        unsafe { clear_env() };

        assert_eq!(
            config.docsie.master_key.as_ref().unwrap().expose(),
            " spaced-key "
        );
    }

    #[test]
    fn blank_env_master_key_is_absent() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        unsafe { set_env(ENV_MASTER_KEY, "   ") };
        let config = Config::load(None).unwrap();
        unsafe { clear_env() };

        assert!(config.docsie.master_key.is_none());
    }

    #[test]
    fn redirect_url_without_scheme_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        unsafe { set_env(ENV_REDIRECT_URL, "auth.example.com/login") };
        let result = Config::load(None);
        unsafe { clear_env() };

        let err = result.unwrap_err().to_string();
        assert!(err.contains("redirect_url must start with http"), "got: {err}");
    }

    #[test]
    fn zero_max_connections_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[server]\nmax_connections = 0\n");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn invalid_toml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(common::Error::Toml(_))
        ));
    }

    #[test]
    fn missing_explicit_file_rejected() {
        let result = Config::load(Some(Path::new("/nonexistent/path/config.toml")));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        assert_eq!(
            Config::resolve_path(Some("/cli/wins.toml")),
            Some(PathBuf::from("/cli/wins.toml"))
        );
        assert_eq!(
            Config::resolve_path(None),
            Some(PathBuf::from("/env/path.toml"))
        );
        unsafe { std::env::remove_var("CONFIG_PATH") };
    }
}
