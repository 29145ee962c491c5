use crate::{
    config::HostConfig,
    error::UpdateError,
    ports::{FileSystem, HttpClient},
};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Replaces the executable in place, keeping one backup generation.
pub struct Downloader<'a> {
    exec_path: &'a Path,
    backup_path: PathBuf,
    fs: &'a dyn FileSystem,
    http: &'a dyn HttpClient,
}

impl<'a> Downloader<'a> {
    pub fn new(config: &'a HostConfig, fs: &'a dyn FileSystem, http: &'a dyn HttpClient) -> Self {
        Self {
            exec_path: &config.exec_path,
            backup_path: config.backup_path(),
            fs,
            http,
        }
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Download `url` over the executable.
    ///
    /// Nothing on disk changes unless the server answers 200. Once the backup
    /// rename succeeds, any later failure renames the backup back; if that
    /// also fails the error is [`UpdateError::Rollback`] carrying both causes.
    pub fn download_latest(&self, url: &str) -> Result<(), UpdateError> {
        let response = self.http.get(url).map_err(|source| UpdateError::Transport {
            url: url.to_string(),
            source,
        })?;
        if !response.is_ok() {
            return Err(UpdateError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        let mut body = response.body;

        self.fs
            .rename(self.exec_path, &self.backup_path)
            .map_err(|source| UpdateError::Backup {
                path: self.exec_path.to_path_buf(),
                source,
            })?;

        let mut file = match self.fs.create_executable(self.exec_path) {
            Ok(file) => file,
            Err(source) => {
                return Err(self.rollback(UpdateError::Create {
                    path: self.exec_path.to_path_buf(),
                    source,
                }))
            }
        };

        let copied = io::copy(&mut body, &mut file).and_then(|n| file.flush().map(|_| n));
        // Close before any rename touches the path.
        drop(file);

        match copied {
            Ok(bytes) => {
                tracing::debug!(bytes, path = %self.exec_path.display(), "update written");
            }
            Err(source) => {
                return Err(self.rollback(UpdateError::Copy {
                    path: self.exec_path.to_path_buf(),
                    source,
                }))
            }
        }

        if let Err(e) = self.fs.remove_file(&self.backup_path) {
            tracing::warn!(path = %self.backup_path.display(), error = %e, "failed to remove backup");
        }
        Ok(())
    }

    fn rollback(&self, cause: UpdateError) -> UpdateError {
        match self.fs.rename(&self.backup_path, self.exec_path) {
            Ok(()) => cause,
            Err(rollback) => UpdateError::Rollback {
                cause: Box::new(cause),
                rollback,
            },
        }
    }
}
