//! Host configuration.
//!
//! [`HostSettings`] is what a user writes (usually a small TOML file next to the
//! executable); [`HostConfig`] is the resolved, immutable record the rest of the
//! crate works from.
//!
//! ```toml
//! name = "tld.domain.sub.app.name"
//! allowed_origins = ["chrome-extension://XXX/"]
//! update_url = "https://sub.domain.tld/updates.xml"
//! version = "1.0.0"
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Byte order of the 4-byte frame header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
    /// Whatever the running machine uses. Chrome documents this one.
    Native,
}

impl ByteOrder {
    pub fn read_u32(self, buf: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(buf),
            ByteOrder::Big => u32::from_be_bytes(buf),
            ByteOrder::Native => u32::from_ne_bytes(buf),
        }
    }

    pub fn write_u32(self, n: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => n.to_le_bytes(),
            ByteOrder::Big => n.to_be_bytes(),
            ByteOrder::Native => n.to_ne_bytes(),
        }
    }
}

/// User-facing settings. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Overrides the executable path. Defaults to the running executable.
    pub path: Option<PathBuf>,
    #[serde(rename = "type")]
    pub app_type: Option<String>,
    pub allowed_origins: Vec<String>,
    pub byte_order: ByteOrder,
    pub update_url: Option<String>,
    pub version: Option<String>,
    /// TLS certificate verification for update downloads.
    pub verify_tls: Option<bool>,
}

impl HostSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

/// Resolved host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub app_name: String,
    pub app_desc: String,
    /// Absolute, symlink-free path of the executable.
    pub exec_path: PathBuf,
    pub app_type: String,
    pub allowed_exts: Vec<String>,
    /// True iff both `update_url` and `version` are non-empty.
    pub auto_update: bool,
    pub byte_order: ByteOrder,
    pub update_url: String,
    pub version: String,
    pub verify_tls: bool,
}

impl HostConfig {
    /// Resolve `settings` into a config, filling defaults.
    ///
    /// ```no_run
    /// use native_messaging_host::config::{HostConfig, HostSettings};
    ///
    /// let config = HostConfig::init(HostSettings {
    ///     name: Some("tld.domain.sub.app.name".into()),
    ///     update_url: Some("https://sub.domain.tld/updates.xml".into()),
    ///     version: Some("1.0.0".into()),
    ///     ..Default::default()
    /// })
    /// .unwrap();
    /// assert!(config.auto_update);
    /// ```
    pub fn init(settings: HostSettings) -> Result<Self, ConfigError> {
        let exec_path = match &settings.path {
            Some(path) => resolve_path(path),
            None => std::env::current_exe()
                .map(|exe| resolve_path(&exe))
                .map_err(ConfigError::Executable)?,
        };

        let app_name = settings
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                exec_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        let app_desc = settings
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| app_name.clone());
        let app_type = settings
            .app_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "stdio".to_string());

        let update_url = settings.update_url.unwrap_or_default();
        let version = settings.version.unwrap_or_default();
        let auto_update = !update_url.is_empty() && !version.is_empty();

        if auto_update {
            crate::update::parse_version(&version).map_err(|source| {
                ConfigError::InvalidVersion {
                    version: version.clone(),
                    source,
                }
            })?;
        }

        Ok(Self {
            app_name,
            app_desc,
            exec_path,
            app_type,
            allowed_exts: settings.allowed_origins,
            auto_update,
            byte_order: settings.byte_order,
            update_url,
            version,
            verify_tls: settings.verify_tls.unwrap_or(true),
        })
    }

    /// `<exec>.chk`: last update check, nanoseconds since the epoch.
    pub fn check_path(&self) -> PathBuf {
        sibling(&self.exec_path, ".chk")
    }

    /// `<exec>.bak`: previous executable during a replacement.
    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.exec_path, ".bak")
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

// Canonical when the file exists; otherwise made absolute against the cwd.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
