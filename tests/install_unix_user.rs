#![cfg(all(feature = "install", any(target_os = "linux", target_os = "macos")))]

mod common;

use common::{fake_exec, sandbox_env, StubFs, StubHttp, Stubs};
use native_messaging_host::config::{ByteOrder, HostConfig, HostSettings};
use native_messaging_host::host::Host;
use native_messaging_host::install::paths::manifest_path;
use native_messaging_host::install::{Browser, Installer, ManifestInstaller, Scope};
use native_messaging_host::ports::OsFileSystem;
use serial_test::serial;
use std::{fs, path::Path};

const NAME: &str = "com.example.native_echo";
const DESC: &str = "Example host";
const ORIGIN: &str = "chrome-extension://aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa/";

fn config(exec: &Path) -> HostConfig {
    HostConfig::init(HostSettings {
        name: Some(NAME.into()),
        description: Some(DESC.into()),
        path: Some(exec.to_path_buf()),
        allowed_origins: vec![ORIGIN.into()],
        ..Default::default()
    })
    .unwrap()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
#[serial]
fn install_and_uninstall_user_scope() {
    let (td, _env) = sandbox_env();
    let exec = fake_exec(td.path(), "#!/bin/sh\nexit 0\n");
    let config = config(&exec);
    fs::write(config.check_path(), "0").unwrap();

    let installer = ManifestInstaller::new(&[Browser::Chrome, Browser::Firefox], Scope::User);
    assert!(!installer.is_installed(&config));
    installer.install(&config).expect("install");
    assert!(installer.is_installed(&config));

    let chrome_path = manifest_path(Browser::Chrome, Scope::User, NAME, &exec).unwrap();
    let firefox_path = manifest_path(Browser::Firefox, Scope::User, NAME, &exec).unwrap();
    assert!(chrome_path.starts_with(td.path()));

    let chrome = read_json(&chrome_path);
    assert_eq!(chrome["allowed_origins"], serde_json::json!([ORIGIN]));
    assert!(chrome.get("allowed_extensions").is_none());
    assert_eq!(chrome["name"], NAME);
    assert_eq!(chrome["description"], DESC);
    assert_eq!(chrome["type"], "stdio");
    assert_eq!(chrome["path"], config.exec_path.to_string_lossy().as_ref());

    let firefox = read_json(&firefox_path);
    assert_eq!(firefox["allowed_extensions"], serde_json::json!([ORIGIN]));
    assert!(firefox.get("allowed_origins").is_none());
    assert_eq!(firefox["type"], "stdio");

    let report = installer.uninstall(&config, &OsFileSystem);
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.removed.len(), 4);
    assert!(!chrome_path.exists());
    assert!(!firefox_path.exists());
    assert!(!config.exec_path.exists());
    assert!(!config.check_path().exists());
    assert!(!installer.is_installed(&config));
}

#[test]
#[serial]
fn uninstall_is_best_effort() {
    let (td, _env) = sandbox_env();
    let exec = fake_exec(td.path(), "bin");
    let config = config(&exec);

    // Nothing installed and no sidecar: only the executable can be removed.
    let report = ManifestInstaller::default().uninstall(&config, &OsFileSystem);
    assert_eq!(report.removed, vec![config.exec_path.clone()]);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|(_, e)| e.kind() == std::io::ErrorKind::NotFound));
}

#[test]
#[serial]
fn uninstall_removes_through_the_file_system_port() {
    let (td, _env) = sandbox_env();
    let exec = fake_exec(td.path(), "bin");
    let config = config(&exec);
    fs::write(config.check_path(), "0").unwrap();
    let installer = ManifestInstaller::new(&[Browser::Chrome, Browser::Firefox], Scope::User);
    installer.install(&config).unwrap();

    let fs_stub = StubFs::default();
    fs_stub.state.fail_remove.set(true);
    let report = installer.uninstall(&config, &fs_stub);

    assert!(report.removed.is_empty());
    assert_eq!(report.failures.len(), 4);
    assert!(report
        .failures
        .iter()
        .all(|(_, e)| e.kind() == std::io::ErrorKind::PermissionDenied));
    assert!(installer.is_installed(&config));
    assert!(config.exec_path.exists());
    assert!(config.check_path().exists());
}

#[test]
#[serial]
fn host_uninstall_uses_host_ports() {
    let (td, _env) = sandbox_env();
    let exec = fake_exec(td.path(), "bin");
    let config = config(&exec);
    let installer = ManifestInstaller::default();
    installer.install(&config).unwrap();

    let stubs = Stubs::new(StubHttp::default());
    stubs.fs.state.fail_remove.set(true);
    let host = Host::with_ports(config.clone(), stubs.ports());
    host.uninstall(&installer);

    assert_eq!(*stubs.process.exits.borrow(), vec![0]);
    assert!(installer.is_installed(&config));
    assert!(config.exec_path.exists());
}

#[test]
#[serial]
fn host_uninstall_exits_once() {
    let (td, _env) = sandbox_env();
    let exec = fake_exec(td.path(), "bin");
    let config = config(&exec);
    let installer = ManifestInstaller::default();
    installer.install(&config).unwrap();

    let stubs = Stubs::new(StubHttp::default());
    let host = Host::with_ports(config.clone(), stubs.ports());
    host.uninstall(&installer);

    assert_eq!(*stubs.process.exits.borrow(), vec![0]);
    assert!(!installer.is_installed(&config));
    assert_eq!(stubs.http.request_count(), 0);
}

#[test]
#[serial]
fn install_rejects_relative_exec_path() {
    let (_td, _env) = sandbox_env();
    let config = HostConfig {
        app_name: "com.example.bad".into(),
        app_desc: "desc".into(),
        exec_path: "relative/path/to/host".into(),
        app_type: "stdio".into(),
        allowed_exts: vec![ORIGIN.into()],
        auto_update: false,
        byte_order: ByteOrder::Little,
        update_url: String::new(),
        version: String::new(),
        verify_tls: true,
    };

    let err = ManifestInstaller::new(&Browser::ALL, Scope::User)
        .install(&config)
        .expect_err("relative exec_path must be rejected");
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
