//! Native messaging manifest install and uninstall.
//!
//! These are plain file (and, on Windows, registry) operations; failures are
//! logged where they happen.

pub mod manifest;
pub mod paths;

#[cfg(all(windows, feature = "windows-registry"))]
pub mod winreg;

pub use manifest::*;
pub use paths::*;
