//! OS and library capabilities the host depends on.
//!
//! Everything that touches the file system, the network, the wall clock, or
//! the process lifetime goes through one of these traits so tests can swap in
//! stubs. [`Ports::system`] wires up the real implementations.

use crate::{error::BoxError, http::HttpSettings, http::ReqwestClient};
use chrono::{DateTime, Local};
use std::{
    fs::{self, OpenOptions},
    io::{self, Read, Write},
    path::Path,
};

pub trait FileSystem {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create or truncate `path` for writing with mode 0755.
    fn create_executable(&self, path: &Path) -> io::Result<Box<dyn Write>>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Response of an HTTP GET. The body streams.
pub struct HttpResponse {
    pub status: u16,
    pub body: Box<dyn Read>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

pub trait HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, BoxError>;
}

pub trait Process {
    /// Terminate the process. Real implementations never return.
    fn exit(&self, code: i32);
}

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn create_executable(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o755);
        }
        let file = options.open(path)?;
        #[cfg(unix)]
        {
            // The open mode is filtered through the umask.
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o755))?;
        }
        Ok(Box::new(file))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsProcess;

impl Process for OsProcess {
    fn exit(&self, code: i32) {
        std::process::exit(code)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// The full set of capabilities a [`crate::host::Host`] runs with.
pub struct Ports {
    pub fs: Box<dyn FileSystem>,
    pub http: Box<dyn HttpClient>,
    pub process: Box<dyn Process>,
    pub clock: Box<dyn Clock>,
}

impl Ports {
    pub fn system(settings: &HttpSettings) -> Self {
        Self {
            fs: Box::new(OsFileSystem),
            http: Box::new(ReqwestClient::new(settings.clone())),
            process: Box::new(OsProcess),
            clock: Box::new(SystemClock),
        }
    }
}
