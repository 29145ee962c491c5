//! Daily self-update.
//!
//! When the browser closes the channel the host asks [`check::UpdateChecker`]
//! whether the manifest at `update_url` lists a newer version for this app.
//! If it does, [`download::Downloader`] swaps the executable in place.

pub mod check;
pub mod download;
pub mod manifest;

pub use check::{CheckOutcome, UpdateChecker};
pub use download::Downloader;
pub use manifest::{host_platform, App, UpdateCheckResponse, UpdateRecord};

use semver::Version;

/// Parse a version string, accepting a leading `v` and missing minor/patch
/// components (`v1.2` reads as `1.2.0`).
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let strict = Version::parse(trimmed);
    if strict.is_ok() {
        return strict;
    }

    let core_end = trimmed
        .find(|c: char| c == '-' || c == '+')
        .unwrap_or(trimmed.len());
    let (core, rest) = trimmed.split_at(core_end);
    let parts = core.split('.').count();
    if core.is_empty() || parts >= 3 {
        return strict;
    }
    let padded = format!("{core}{}{rest}", ".0".repeat(3 - parts));
    Version::parse(&padded).or(strict)
}
