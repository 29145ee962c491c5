use std::{
    io,
    path::{Path, PathBuf},
};

/// Browsers a manifest can be registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Browser {
    Chrome,
    Edge,
    Firefox,
}

impl Browser {
    pub const ALL: [Browser; 3] = [Browser::Chrome, Browser::Edge, Browser::Firefox];

    pub fn key(self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Edge => "edge",
            Browser::Firefox => "firefox",
        }
    }

    /// Firefox-family manifests allowlist `allowed_extensions`; Chromium-family
    /// ones use `allowed_origins`.
    pub fn is_firefox_family(self) -> bool {
        matches!(self, Browser::Firefox)
    }
}

/// Per-user or machine-wide install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    User,
    System,
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn unix_home_dir() -> io::Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME not set"))
}

/// Directory the browser scans for host manifests.
#[cfg(target_os = "linux")]
pub fn manifest_dir(browser: Browser, scope: Scope, _exec_path: &Path) -> io::Result<PathBuf> {
    Ok(match (browser, scope) {
        (Browser::Chrome, Scope::User) => unix_home_dir()?.join(".config/google-chrome/NativeMessagingHosts"),
        (Browser::Chrome, Scope::System) => PathBuf::from("/etc/opt/chrome/native-messaging-hosts"),
        (Browser::Edge, Scope::User) => unix_home_dir()?.join(".config/microsoft-edge/NativeMessagingHosts"),
        (Browser::Edge, Scope::System) => PathBuf::from("/etc/opt/edge/native-messaging-hosts"),
        (Browser::Firefox, Scope::User) => unix_home_dir()?.join(".mozilla/native-messaging-hosts"),
        (Browser::Firefox, Scope::System) => PathBuf::from("/usr/lib/mozilla/native-messaging-hosts"),
    })
}

#[cfg(target_os = "macos")]
pub fn manifest_dir(browser: Browser, scope: Scope, _exec_path: &Path) -> io::Result<PathBuf> {
    Ok(match (browser, scope) {
        (Browser::Chrome, Scope::User) => {
            unix_home_dir()?.join("Library/Application Support/Google/Chrome/NativeMessagingHosts")
        }
        (Browser::Chrome, Scope::System) => PathBuf::from("/Library/Google/Chrome/NativeMessagingHosts"),
        (Browser::Edge, Scope::User) => {
            unix_home_dir()?.join("Library/Application Support/Microsoft Edge/NativeMessagingHosts")
        }
        (Browser::Edge, Scope::System) => PathBuf::from("/Library/Microsoft/Edge/NativeMessagingHosts"),
        (Browser::Firefox, Scope::User) => {
            unix_home_dir()?.join("Library/Application Support/Mozilla/NativeMessagingHosts")
        }
        (Browser::Firefox, Scope::System) => PathBuf::from("/Library/Mozilla/NativeMessagingHosts"),
    })
}

/// On Windows the manifest lives next to the executable and a registry key
/// points the browser at it.
#[cfg(windows)]
pub fn manifest_dir(browser: Browser, _scope: Scope, exec_path: &Path) -> io::Result<PathBuf> {
    let dir = exec_path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "executable has no parent directory"))?;
    // Firefox and Chromium manifests differ, so they can't share a file.
    Ok(if browser.is_firefox_family() {
        dir.join("firefox")
    } else {
        dir.to_path_buf()
    })
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
pub fn manifest_dir(_browser: Browser, _scope: Scope, _exec_path: &Path) -> io::Result<PathBuf> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "no known native messaging manifest location on this platform",
    ))
}

pub fn manifest_path(browser: Browser, scope: Scope, name: &str, exec_path: &Path) -> io::Result<PathBuf> {
    Ok(manifest_dir(browser, scope, exec_path)?.join(format!("{name}.json")))
}

pub fn winreg_key_path(browser: Browser, name: &str) -> String {
    match browser {
        Browser::Chrome => format!(r"Software\Google\Chrome\NativeMessagingHosts\{name}"),
        Browser::Edge => format!(r"Software\Microsoft\Edge\NativeMessagingHosts\{name}"),
        Browser::Firefox => format!(r"Software\Mozilla\NativeMessagingHosts\{name}"),
    }
}
