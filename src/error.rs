use std::{io, path::PathBuf};

/// Boxed error returned by [`crate::ports::HttpClient`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the framing layer.
#[derive(Debug, thiserror::Error)]
pub enum NmError {
    /// The peer closed stdin. This is the normal way a browser ends a session.
    #[error("native messaging channel closed")]
    Disconnected,

    #[error("incoming message of {len} bytes exceeds the {max} byte limit")]
    IncomingTooLarge { len: usize, max: usize },

    #[error("outgoing message of {len} bytes exceeds the {max} byte limit")]
    OutgoingTooLarge { len: usize, max: usize },

    #[error("failed to decode message body: {0}")]
    DeserializeJson(#[source] serde_json::Error),

    #[error("failed to encode message: {0}")]
    SerializeJson(#[source] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised while building a [`crate::config::HostConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read host settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid host settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unable to resolve executable path: {0}")]
    Executable(#[source] io::Error),

    #[error("configured version {version:?} is not a semantic version: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
}

/// Errors raised while decoding an update manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("update manifest is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed update manifest: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed update manifest: {0}")]
    Decode(#[from] quick_xml::de::DeError),

    #[error("update manifest has no root element")]
    Empty,

    #[error("update manifest ends with {open} unclosed element(s) under <{root}>")]
    Unterminated { root: String, open: usize },

    #[error("expected <gupdate> root element, found <{found}>")]
    UnexpectedRoot { found: String },
}

/// Errors raised by the update path: manifest fetch and binary replacement.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("unable to find the update at {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to back up {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {path} for writing: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write update to {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The replacement failed and restoring the backup failed too.
    #[error("{cause}; restoring backup failed: {rollback}")]
    Rollback {
        #[source]
        cause: Box<UpdateError>,
        rollback: io::Error,
    },
}
