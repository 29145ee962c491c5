use super::{download::Downloader, manifest::UpdateCheckResponse, parse_version};
use crate::{
    config::HostConfig,
    error::UpdateError,
    ports::{Clock, FileSystem, HttpClient},
};
use chrono::{DateTime, Local, TimeZone};
use std::io::{self, Read};

/// What a call to [`UpdateChecker::auto_update_check`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No update URL or version configured.
    Disabled,
    AlreadyChecked,
    UpToDate,
    /// The manifest could not be fetched or had nothing usable for us.
    Unavailable,
    Updated { version: String },
    UpdateFailed { version: String },
}

/// Daily update check against the configured manifest.
pub struct UpdateChecker<'a> {
    config: &'a HostConfig,
    fs: &'a dyn FileSystem,
    http: &'a dyn HttpClient,
    clock: &'a dyn Clock,
}

impl<'a> UpdateChecker<'a> {
    pub fn new(
        config: &'a HostConfig,
        fs: &'a dyn FileSystem,
        http: &'a dyn HttpClient,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            fs,
            http,
            clock,
        }
    }

    /// Check for and install an update, at most once per local calendar day.
    ///
    /// Never fails: this runs while the host shuts down, so every outcome is
    /// logged and reported back only as a [`CheckOutcome`].
    pub fn auto_update_check(&self) -> CheckOutcome {
        if !self.config.auto_update {
            return CheckOutcome::Disabled;
        }

        let (url, version) = match self.need_update() {
            Ok(Some(found)) => found,
            Ok(None) => return CheckOutcome::UpToDate,
            Err(outcome) => return outcome,
        };

        let downloader = Downloader::new(self.config, self.fs, self.http);
        match downloader.download_latest(&url) {
            Ok(()) => {
                tracing::info!(%version, "update is downloaded");
                CheckOutcome::Updated { version }
            }
            Err(e) => {
                tracing::error!(%version, error = %e, "update download error");
                CheckOutcome::UpdateFailed { version }
            }
        }
    }

    // Ok(Some((url, version))) when the manifest advertises something newer.
    fn need_update(&self) -> Result<Option<(String, String)>, CheckOutcome> {
        if self.is_checked_today() {
            tracing::info!("update already checked today");
            return Err(CheckOutcome::AlreadyChecked);
        }

        // Stamp before hitting the network so a broken endpoint is only tried once a day.
        if let Err(e) = self.write_check_timestamp() {
            tracing::warn!(path = %self.config.check_path().display(), error = %e, "update timestamp error");
        }

        let local = match parse_version(&self.config.version) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(version = %self.config.version, error = %e, "invalid configured version");
                return Err(CheckOutcome::Unavailable);
            }
        };

        let (url, remote_raw) = match self.fetch_url_and_version() {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %self.config.update_url, error = %e, "update check error");
                return Err(CheckOutcome::Unavailable);
            }
        };

        if url.is_empty() || remote_raw.is_empty() {
            tracing::info!(app = %self.config.app_name, "no update listed for this app");
            return Err(CheckOutcome::Unavailable);
        }

        let remote = match parse_version(&remote_raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(version = %remote_raw, error = %e, "invalid remote version");
                return Err(CheckOutcome::Unavailable);
            }
        };

        if local < remote {
            tracing::info!(%local, %remote, "latest update is found");
            Ok(Some((url, remote_raw)))
        } else {
            tracing::info!(%local, %remote, "already up to date");
            Ok(None)
        }
    }

    /// Fetch the manifest and select the download for this app and platform.
    pub fn fetch_url_and_version(&self) -> Result<(String, String), UpdateError> {
        let url = &self.config.update_url;
        let transport = |source: io::Error| UpdateError::Transport {
            url: url.clone(),
            source: Box::new(source),
        };

        let response = self.http.get(url).map_err(|source| UpdateError::Transport {
            url: url.clone(),
            source,
        })?;
        if !response.is_ok() {
            return Err(UpdateError::Status {
                url: url.clone(),
                status: response.status,
            });
        }

        let mut bytes = Vec::new();
        let mut body = response.body;
        body.read_to_end(&mut bytes).map_err(transport)?;

        let manifest = UpdateCheckResponse::parse(&bytes)?;
        Ok(manifest.get_url_and_version(&self.config.app_name))
    }

    /// Time of the previous check. A missing or unreadable sidecar reads as the epoch.
    pub fn last_check(&self) -> DateTime<Local> {
        let nanos = self
            .fs
            .read_to_string(&self.config.check_path())
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);
        Local.timestamp_nanos(nanos)
    }

    pub fn is_checked_today(&self) -> bool {
        self.last_check().date_naive() == self.clock.now().date_naive()
    }

    fn write_check_timestamp(&self) -> io::Result<()> {
        let nanos = self
            .clock
            .now()
            .timestamp_nanos_opt()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "timestamp out of range"))?;
        self.fs
            .write(&self.config.check_path(), nanos.to_string().as_bytes())
    }
}
