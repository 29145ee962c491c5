use crate::install::paths::{winreg_key_path, Browser, Scope};
use std::{io, path::Path};
use winreg::{
    enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE},
    RegKey,
};

fn root(scope: Scope) -> RegKey {
    match scope {
        Scope::User => RegKey::predef(HKEY_CURRENT_USER),
        Scope::System => RegKey::predef(HKEY_LOCAL_MACHINE),
    }
}

/// Point the browser's registry key for host `name` at `manifest_path`.
pub fn write_manifest_reg(browser: Browser, scope: Scope, name: &str, manifest_path: &Path) -> io::Result<()> {
    let (key, _) = root(scope).create_subkey(winreg_key_path(browser, name))?;
    key.set_value("", &manifest_path.to_string_lossy().as_ref())?;
    Ok(())
}

pub fn remove_manifest_reg(browser: Browser, scope: Scope, name: &str) -> io::Result<()> {
    root(scope).delete_subkey(winreg_key_path(browser, name))
}
