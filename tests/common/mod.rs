#![allow(dead_code)]

use chrono::{DateTime, Local, TimeZone};
use native_messaging_host::config::{HostConfig, HostSettings};
use native_messaging_host::error::BoxError;
use native_messaging_host::ports::{
    Clock, FileSystem, HttpClient, HttpResponse, OsFileSystem, Ports, Process,
};
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    env,
    io::{self, Cursor, Write},
    path::{Path, PathBuf},
    rc::Rc,
};
use tempfile::TempDir;

/// Env guard that restores previous env vars on drop.
pub struct EnvGuard {
    old: HashMap<String, Option<String>>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, String)]) -> Self {
        let mut old = HashMap::new();
        for (k, v) in vars {
            old.insert((*k).to_string(), env::var(k).ok());
            env::set_var(k, v);
        }
        Self { old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, prev) in self.old.drain() {
            match prev {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

/// Create a temp sandbox and point HOME into it so manifest installs land there.
pub fn sandbox_env() -> (TempDir, EnvGuard) {
    let td = TempDir::new().expect("tempdir");
    let home = td.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    let guard = EnvGuard::set(&[("HOME", home.to_string_lossy().to_string())]);
    (td, guard)
}

/// A fake executable with `contents` inside `dir`.
pub fn fake_exec(dir: &Path, contents: &str) -> PathBuf {
    let exec = dir.join("host_bin");
    std::fs::write(&exec, contents).unwrap();
    exec
}

pub fn config_for(exec: &Path, update_url: &str, version: &str) -> HostConfig {
    HostConfig::init(HostSettings {
        name: Some("tld.domain.sub.app.name".into()),
        path: Some(exec.to_path_buf()),
        update_url: Some(update_url.into()),
        version: Some(version.into()),
        ..Default::default()
    })
    .expect("config")
}

pub fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("unambiguous time")
}

pub fn manifest_xml(app: &str, url: &str, version: &str) -> String {
    format!(
        "<?xml version='1.0' encoding='UTF-8'?>\n\
         <gupdate xmlns='http://www.google.com/update2/response' protocol='2.0'>\n\
           <app appid='{app}'>\n\
             <updatecheck codebase='{url}' version='{version}' />\n\
           </app>\n\
         </gupdate>"
    )
}

// ---------------------------------------------------------------- file system

#[derive(Default)]
pub struct FsState {
    pub renames: Cell<usize>,
    pub opened: Cell<bool>,
    pub copied: Cell<bool>,
    /// Fail the nth rename attempt (1-based).
    pub fail_rename_on: Cell<Option<usize>>,
    pub fail_open: Cell<bool>,
    pub fail_write: Cell<bool>,
    pub fail_remove: Cell<bool>,
}

/// Real file system with failure injection and call recording.
#[derive(Clone, Default)]
pub struct StubFs {
    pub state: Rc<FsState>,
}

struct TrackingWriter {
    inner: Box<dyn Write>,
    state: Rc<FsState>,
}

impl Write for TrackingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.copied.set(true);
        if self.state.fail_write.get() {
            return Err(io::Error::new(io::ErrorKind::Other, "download error"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl FileSystem for StubFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let n = self.state.renames.get() + 1;
        self.state.renames.set(n);
        if self.state.fail_rename_on.get() == Some(n) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "rename error"));
        }
        OsFileSystem.rename(from, to)
    }

    fn create_executable(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        self.state.opened.set(true);
        if self.state.fail_open.get() {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "open file error"));
        }
        let inner = OsFileSystem.create_executable(path)?;
        Ok(Box::new(TrackingWriter {
            inner,
            state: self.state.clone(),
        }))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.state.fail_remove.get() {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "remove error"));
        }
        OsFileSystem.remove_file(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        OsFileSystem.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        OsFileSystem.write(path, contents)
    }
}

// ---------------------------------------------------------------------- http

pub enum Canned {
    Respond(u16, Vec<u8>),
    BrokenBody,
    Fail(&'static str),
}

/// Answers GETs from a queue and records every URL requested.
#[derive(Clone, Default)]
pub struct StubHttp {
    pub responses: Rc<RefCell<VecDeque<Canned>>>,
    pub requests: Rc<RefCell<Vec<String>>>,
}

impl StubHttp {
    pub fn with(responses: Vec<Canned>) -> Self {
        Self {
            responses: Rc::new(RefCell::new(responses.into())),
            requests: Rc::default(),
        }
    }

    pub fn push(&self, canned: Canned) {
        self.responses.borrow_mut().push_back(canned);
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

struct BrokenReader;

impl io::Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

impl HttpClient for StubHttp {
    fn get(&self, url: &str) -> Result<HttpResponse, BoxError> {
        self.requests.borrow_mut().push(url.to_string());
        match self.responses.borrow_mut().pop_front() {
            Some(Canned::Respond(status, body)) => Ok(HttpResponse {
                status,
                body: Box::new(Cursor::new(body)),
            }),
            Some(Canned::BrokenBody) => Ok(HttpResponse {
                status: 200,
                body: Box::new(BrokenReader),
            }),
            Some(Canned::Fail(msg)) => Err(msg.into()),
            None => Err("no canned response".into()),
        }
    }
}

// ------------------------------------------------------------ clock, process

#[derive(Clone)]
pub struct FixedClock {
    pub now: Rc<Cell<DateTime<Local>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Local>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

/// Records exit codes instead of exiting.
#[derive(Clone, Default)]
pub struct RecordingProcess {
    pub exits: Rc<RefCell<Vec<i32>>>,
}

impl Process for RecordingProcess {
    fn exit(&self, code: i32) {
        self.exits.borrow_mut().push(code);
    }
}

pub struct Stubs {
    pub fs: StubFs,
    pub http: StubHttp,
    pub process: RecordingProcess,
    pub clock: FixedClock,
}

impl Stubs {
    pub fn new(http: StubHttp) -> Self {
        Self {
            fs: StubFs::default(),
            http,
            process: RecordingProcess::default(),
            clock: FixedClock::at(local(2024, 3, 1, 9)),
        }
    }

    pub fn ports(&self) -> Ports {
        Ports {
            fs: Box::new(self.fs.clone()),
            http: Box::new(self.http.clone()),
            process: Box::new(self.process.clone()),
            clock: Box::new(self.clock.clone()),
        }
    }
}

// --------------------------------------------------------------- http server

/// Serve `count` requests on a local port with a fixed status and body.
pub fn serve(count: usize, status: u16, body: &'static str) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server.server_addr().to_ip().expect("ip listener");
    std::thread::spawn(move || {
        for request in server.incoming_requests().take(count) {
            let response = tiny_http::Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}/")
}
