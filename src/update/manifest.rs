//! Update manifest (`updates.xml`) decoding.
//!
//! The format is Chrome's extension update manifest, borrowed from Omaha:
//!
//! ```xml
//! <?xml version='1.0' encoding='UTF-8'?>
//! <gupdate xmlns='http://www.google.com/update2/response' protocol='2.0'>
//!   <app appid='tld.domain.sub.app.name'>
//!     <updatecheck codebase='https://sub.domain.tld/app.download.linux' os='linux' version='1.0.0' />
//!     <updatecheck codebase='https://sub.domain.tld/app.download.exe' os='windows' version='1.0.0' />
//!   </app>
//! </gupdate>
//! ```
//!
//! `os` is an extension to Chrome's format. Records without it serve every
//! platform.

use crate::error::ManifestError;
use quick_xml::{events::Event, Reader};
use serde::Deserialize;

const ROOT_ELEMENT: &str = "gupdate";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateCheckResponse {
    #[serde(rename = "@protocol", default)]
    pub protocol: String,
    #[serde(rename = "app", default)]
    pub apps: Vec<App>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct App {
    #[serde(rename = "@appid", default)]
    pub app_id: String,
    #[serde(rename = "updatecheck", default)]
    pub updates: Vec<UpdateRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateRecord {
    #[serde(rename = "@os", default)]
    pub os: String,
    #[serde(rename = "@codebase", default)]
    pub url: String,
    #[serde(rename = "@version", default)]
    pub version: String,
}

/// Platform identifier as it appears in `os` attributes.
pub fn host_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

impl UpdateCheckResponse {
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let xml = std::str::from_utf8(bytes)?;
        let root = check_document(xml)?;
        if root != ROOT_ELEMENT {
            return Err(ManifestError::UnexpectedRoot { found: root });
        }
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// Download URL and version for `app_name` on the running platform.
    /// Returns empty strings when the app isn't listed.
    pub fn get_url_and_version(&self, app_name: &str) -> (String, String) {
        self.get_url_and_version_for(app_name, host_platform())
    }

    pub fn get_url_and_version_for(&self, app_name: &str, platform: &str) -> (String, String) {
        self.apps
            .iter()
            .find(|app| app.app_id == app_name)
            .map(|app| app.get_url_and_version(platform))
            .unwrap_or_default()
    }
}

impl App {
    /// The record tagged with `platform`, else the first record.
    pub fn get_url_and_version(&self, platform: &str) -> (String, String) {
        let matched = self
            .updates
            .iter()
            .find(|u| u.os == platform)
            .filter(|u| !u.url.is_empty() && !u.version.is_empty());

        matched
            .or_else(|| self.updates.first())
            .map(|u| (u.url.clone(), u.version.clone()))
            .unwrap_or_default()
    }
}

// Walks the whole document so syntax errors past the last decoded field still
// surface. Returns the local name of the root element.
fn check_document(xml: &str) -> Result<String, ManifestError> {
    let mut reader = Reader::from_str(xml);
    let mut root = None;
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root.is_none() {
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if root.is_none() {
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }
    let root = root.ok_or(ManifestError::Empty)?;
    if depth > 0 {
        return Err(ManifestError::Unterminated { root, open: depth });
    }
    Ok(root)
}
