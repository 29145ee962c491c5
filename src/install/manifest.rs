use crate::config::HostConfig;
use crate::install::paths::{manifest_path, Browser, Scope};
use crate::ports::FileSystem;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// A native messaging host manifest, as the browser reads it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub app_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

impl Manifest {
    pub fn for_browser(config: &HostConfig, browser: Browser) -> Self {
        let allowed = Some(config.allowed_exts.clone());
        let (allowed_origins, allowed_extensions) = if browser.is_firefox_family() {
            (None, allowed)
        } else {
            (allowed, None)
        };
        Self {
            name: config.app_name.clone(),
            description: config.app_desc.clone(),
            path: config.exec_path.clone(),
            app_type: config.app_type.clone(),
            allowed_origins,
            allowed_extensions,
        }
    }
}

/// What a best-effort uninstall managed to remove, and what it didn't.
#[derive(Debug, Default)]
pub struct UninstallReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, io::Error)>,
}

impl UninstallReport {
    fn record(&mut self, path: PathBuf, result: io::Result<()>) {
        match result {
            Ok(()) => self.removed.push(path),
            Err(e) => {
                // Often just "never installed" or "locked by the running process".
                tracing::warn!(path = %path.display(), error = %e, "uninstall step failed");
                self.failures.push((path, e));
            }
        }
    }
}

/// Registers and unregisters the host with the browsers.
pub trait Installer {
    fn install(&self, config: &HostConfig) -> io::Result<()>;

    /// Never fails; every problem lands in the report. File removals go
    /// through `fs`.
    fn uninstall(&self, config: &HostConfig, fs: &dyn FileSystem) -> UninstallReport;
}

/// Writes one JSON manifest per browser into the platform's lookup location.
#[derive(Debug, Clone)]
pub struct ManifestInstaller {
    pub browsers: Vec<Browser>,
    pub scope: Scope,
}

impl Default for ManifestInstaller {
    fn default() -> Self {
        Self {
            browsers: vec![Browser::Chrome],
            scope: Scope::User,
        }
    }
}

impl ManifestInstaller {
    pub fn new(browsers: &[Browser], scope: Scope) -> Self {
        Self {
            browsers: browsers.to_vec(),
            scope,
        }
    }

    /// True if a manifest for `config` exists for any configured browser.
    pub fn is_installed(&self, config: &HostConfig) -> bool {
        self.browsers.iter().any(|&b| {
            manifest_path(b, self.scope, &config.app_name, &config.exec_path)
                .map(|p| p.exists())
                .unwrap_or(false)
        })
    }
}

impl Installer for ManifestInstaller {
    fn install(&self, config: &HostConfig) -> io::Result<()> {
        if !config.exec_path.is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "manifest path must be absolute",
            ));
        }
        for &browser in &self.browsers {
            let target = manifest_path(browser, self.scope, &config.app_name, &config.exec_path)?;
            write_manifest(&target, &Manifest::for_browser(config, browser))?;
            register(browser, self.scope, &config.app_name, &target)?;
            tracing::info!(browser = browser.key(), path = %target.display(), "installed");
        }
        Ok(())
    }

    fn uninstall(&self, config: &HostConfig, fs: &dyn FileSystem) -> UninstallReport {
        let mut report = UninstallReport::default();
        for &browser in &self.browsers {
            match manifest_path(browser, self.scope, &config.app_name, &config.exec_path) {
                Ok(target) => {
                    let removed = fs.remove_file(&target);
                    report.record(target, removed);
                }
                Err(e) => report.record(PathBuf::from(browser.key()), Err(e)),
            }
            unregister(browser, self.scope, &config.app_name, &mut report);
        }
        for path in [config.exec_path.clone(), config.check_path()] {
            let removed = fs.remove_file(&path);
            report.record(path, removed);
        }
        report
    }
}

fn write_manifest(target: &Path, manifest: &Manifest) -> io::Result<()> {
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(manifest).map_err(|e| {
        io::Error::new(io::ErrorKind::Other, format!("Serialization failed: {}", e))
    })?;
    fs::write(target, json)
}

#[cfg(all(windows, feature = "windows-registry"))]
fn register(browser: Browser, scope: Scope, name: &str, manifest: &Path) -> io::Result<()> {
    crate::install::winreg::write_manifest_reg(browser, scope, name, manifest)
}

#[cfg(not(all(windows, feature = "windows-registry")))]
fn register(_browser: Browser, _scope: Scope, _name: &str, _manifest: &Path) -> io::Result<()> {
    #[cfg(windows)]
    tracing::warn!("built without windows-registry; browsers will not find the manifest");
    Ok(())
}

#[cfg(all(windows, feature = "windows-registry"))]
fn unregister(browser: Browser, scope: Scope, name: &str, report: &mut UninstallReport) {
    let key = crate::install::paths::winreg_key_path(browser, name);
    let removed = crate::install::winreg::remove_manifest_reg(browser, scope, name);
    report.record(PathBuf::from(key), removed);
}

#[cfg(not(all(windows, feature = "windows-registry")))]
fn unregister(_browser: Browser, _scope: Scope, _name: &str, _report: &mut UninstallReport) {}
