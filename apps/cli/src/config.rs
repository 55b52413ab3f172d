//! Mirror configuration: TOML file or command-line flags.
//!
//! When the configuration file exists, it is the single source of settings.
//! Without it, every connection parameter must be supplied as a flag; a
//! missing parameter is a fatal startup error either way.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

/// Command line for the `pkgmirror` binary.
#[derive(Debug, Parser)]
#[command(
    name = "pkgmirror",
    about = "Mirror device-management packages into blob storage",
    version
)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, default_value = "pkgmirror.toml")]
    pub config: PathBuf,

    /// Blob storage account URL.
    #[arg(long)]
    pub account_url: Option<String>,

    /// Blob storage account access key.
    #[arg(long)]
    pub account_key: Option<String>,

    /// Destination container name.
    #[arg(long)]
    pub container_name: Option<String>,

    /// Base URL of the source device-management service.
    #[arg(long)]
    pub source_url: Option<String>,

    /// Source service user name.
    #[arg(long)]
    pub username: Option<String>,

    /// Source service password.
    #[arg(long)]
    pub password: Option<String>,
}

/// Connection and layout settings for one run.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    pub account_url: String,
    pub account_key: String,
    pub container_name: String,
    pub source_url: String,
    pub username: String,
    pub password: String,

    /// Scratch directory for staged downloads.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: String,

    /// Logical folder for run-log objects.
    #[serde(default = "default_log_folder")]
    pub log_folder: String,
}

fn default_workspace_dir() -> String {
    "temp".into()
}

fn default_log_folder() -> String {
    "logs".into()
}

impl MirrorConfig {
    /// Resolves the effective configuration: the TOML file when it exists,
    /// otherwise the command-line flags.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        if cli.config.exists() {
            return Self::load(&cli.config);
        }

        let require = |value: &Option<String>, flag: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "missing required parameter `{flag}` (no configuration file at {})",
                        cli.config.display()
                    )
                })
        };

        Ok(Self {
            account_url: require(&cli.account_url, "--account-url")?,
            account_key: require(&cli.account_key, "--account-key")?,
            container_name: require(&cli.container_name, "--container-name")?,
            source_url: require(&cli.source_url, "--source-url")?,
            username: require(&cli.username, "--username")?,
            password: require(&cli.password, "--password")?,
            workspace_dir: default_workspace_dir(),
            log_folder: default_log_folder(),
        })
    }

    /// Loads and validates a TOML configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MirrorConfig = toml::from_str(&content)?;
        config.validate()?;

        // Restrict permissions on Unix (the file holds credentials).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let required = [
            (&self.account_url, "account_url"),
            (&self.account_key, "account_key"),
            (&self.container_name, "container_name"),
            (&self.source_url, "source_url"),
            (&self.username, "username"),
            (&self.password, "password"),
        ];
        for (value, key) in required {
            if value.is_empty() {
                anyhow::bail!("missing or empty required configuration value `{key}`");
            }
        }
        Ok(())
    }
}
