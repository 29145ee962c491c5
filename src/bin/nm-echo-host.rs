//! Echo host: replies to every message with the message itself.
//!
//! ```text
//! nm-echo-host            serve stdin/stdout until the browser disconnects
//! nm-echo-host install    write the manifest for Chrome, Edge and Firefox
//! nm-echo-host uninstall  remove manifests, the binary and its sidecar files
//! ```
//!
//! Settings are read from `<exec>.toml` when it exists.

use native_messaging_host::{
    config::{HostConfig, HostSettings},
    host::Host,
    install::{Browser, Installer, ManifestInstaller, Scope},
    logging,
};
use serde_json::Value;
use std::process::ExitCode;

fn load_settings() -> Result<HostSettings, Box<dyn std::error::Error>> {
    let exe = std::env::current_exe()?;
    let mut path = exe.into_os_string();
    path.push(".toml");
    let path = std::path::PathBuf::from(path);
    if path.exists() {
        Ok(HostSettings::from_toml_file(&path)?)
    } else {
        Ok(HostSettings::default())
    }
}

fn main() -> ExitCode {
    logging::init();

    let config = match load_settings().and_then(|s| Ok(HostConfig::init(s)?)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid host configuration");
            return ExitCode::FAILURE;
        }
    };
    let installer = ManifestInstaller::new(&Browser::ALL, Scope::User);
    let host = Host::new(config);

    match std::env::args().nth(1).as_deref() {
        Some("install") => match installer.install(host.config()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                ExitCode::FAILURE
            }
        },
        Some("uninstall") => {
            host.uninstall(&installer);
            ExitCode::SUCCESS
        }
        Some(other) => {
            tracing::error!(command = other, "unknown command");
            ExitCode::FAILURE
        }
        None => {
            tracing::info!(app = %host.config().app_name, version = %host.config().version, "host starting");
            let mut stdin = std::io::stdin().lock();
            let mut stdout = std::io::stdout().lock();
            match host.run(&mut stdin, &mut stdout, |req: Value| Ok(Some(req))) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "host stopped");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
