//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `TYCOON_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::info;

use crate::{
    save::DEFAULT_SAVE_FILE,
    transfer::{DEFAULT_RECV_BUFFER, DEFAULT_TRANSFER_PORT},
};

/// Directory under the user config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "tycoon";
/// Prefix for environment overrides, e.g. `TYCOON_TRANSFER_PORT`.
pub const ENV_PREFIX: &str = "TYCOON";

const DEFAULT_CONFIG_TOML: &str = r#"# Tycoon configuration. Every key is optional.

# Save file, relative to the working directory unless absolute.
save_path = "python_tycoon_save.json"

# Address the transfer listener binds to.
listen_host = "0.0.0.0"

# Port used both for listening and for sending to peers.
transfer_port = 5050

# Maximum bytes read from a single inbound transfer.
recv_buffer_size = 1024

# Seconds to wait for an inbound transfer payload.
read_timeout_secs = 10

# Seconds to wait when connecting to a peer.
connect_timeout_secs = 10

# Seconds slept by the `wait` command.
wait_secs = 5
"#;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Save file location.
    pub save_path: PathBuf,
    /// Host/interface the transfer listener binds to.
    pub listen_host: String,
    /// TCP port for peer transfers.
    pub transfer_port: u16,
    /// Upper bound on bytes read per inbound transfer.
    pub recv_buffer_size: usize,
    /// Per-connection read timeout for inbound transfers.
    pub read_timeout_secs: u64,
    /// Connect timeout for outbound transfers.
    pub connect_timeout_secs: u64,
    /// Sleep duration of the `wait` command.
    pub wait_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from(DEFAULT_SAVE_FILE),
            listen_host: "0.0.0.0".to_string(),
            transfer_port: DEFAULT_TRANSFER_PORT,
            recv_buffer_size: DEFAULT_RECV_BUFFER,
            read_timeout_secs: 10,
            connect_timeout_secs: 10,
            wait_secs: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) and environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("save_path", defaults.save_path.to_string_lossy().to_string())?
            .set_default("listen_host", defaults.listen_host)?
            .set_default("transfer_port", i64::from(defaults.transfer_port))?
            .set_default("recv_buffer_size", defaults.recv_buffer_size as i64)?
            .set_default("read_timeout_secs", defaults.read_timeout_secs as i64)?
            .set_default("connect_timeout_secs", defaults.connect_timeout_secs as i64)?
            .set_default("wait_secs", defaults.wait_secs as i64)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        let config: Self = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("recv_buffer_size", self.recv_buffer_size as u64),
            ("read_timeout_secs", self.read_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            anyhow::bail!("{key} must be greater than zero");
        }
        Ok(())
    }

    /// `host:port` the transfer listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.transfer_port)
    }

    /// Per-connection read timeout for inbound transfers.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Connect timeout for outbound transfers.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Sleep duration of the `wait` command.
    pub fn wait_duration(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write the commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}
