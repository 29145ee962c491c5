//! # native_messaging_host
//!
//! A browser **native messaging host** that keeps itself up to date:
//!
//! - Exchange length-prefixed JSON frames with an extension over **stdin/stdout**
//! - Install and uninstall the host **manifest** for Chrome, Edge and Firefox
//! - When the browser closes the channel, check an **update manifest** once a day
//!   and atomically replace the executable with a newer release
//!
//! ---
//!
//! ## Wire protocol
//!
//! 1. The sender writes a **4-byte length prefix** (`u32`), little-endian by default
//!    (see [`config::ByteOrder`]).
//! 2. Then writes **that many bytes** of UTF-8 JSON. A length of 0 is a valid, empty frame.
//!
//! Reading yields a [`host::Frame`]: a message, an empty frame, or `Closed` when the
//! browser has shut stdin. Closing is the normal end of a session.
//!
//! ### Gotchas
//!
//! - **Never log to stdout:** stdout is reserved for frames. [`logging::init`] sends
//!   `tracing` output to stderr.
//! - **Message limits:** host → browser is capped at 1 MiB ([`host::MAX_TO_BROWSER`]),
//!   browser → host at 64 MiB ([`host::MAX_FROM_BROWSER`]).
//!
//! ---
//!
//! ## Quick start
//!
//! ```no_run
//! use native_messaging_host::config::{HostConfig, HostSettings};
//! use native_messaging_host::host::Host;
//! use serde_json::Value;
//!
//! native_messaging_host::logging::init();
//!
//! let config = HostConfig::init(HostSettings {
//!     name: Some("tld.domain.sub.app.name".into()),
//!     update_url: Some("https://sub.domain.tld/updates.xml".into()),
//!     version: Some(env!("CARGO_PKG_VERSION").into()),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let host = Host::new(config);
//! let mut stdin = std::io::stdin();
//! let mut stdout = std::io::stdout();
//!
//! // Echo every request. When stdin closes, the host checks for updates and exits.
//! host.run(&mut stdin, &mut stdout, |req: Value| Ok(Some(req))).unwrap();
//! ```
//!
//! ## Pure framing
//!
//! ```rust
//! use native_messaging_host::host::{decode_message, encode_message, MAX_FROM_BROWSER};
//! use serde_json::json;
//! use std::io::Cursor;
//!
//! let msg = json!({"hello": "world", "n": 42});
//! let frame = encode_message(&msg).unwrap();
//!
//! let mut cur = Cursor::new(frame);
//! let raw = decode_message(&mut cur, MAX_FROM_BROWSER).unwrap();
//! let back: serde_json::Value = serde_json::from_str(&raw).unwrap();
//! assert_eq!(back, msg);
//! ```
//!
//! ## Auto update
//!
//! Auto update is on when both `update_url` and `version` are set. The manifest
//! follows Chrome's update manifest format, with an optional `os` attribute:
//!
//! ```xml
//! <?xml version='1.0' encoding='UTF-8'?>
//! <gupdate xmlns='http://www.google.com/update2/response' protocol='2.0'>
//!   <app appid='tld.domain.sub.app.name'>
//!     <updatecheck codebase='https://sub.domain.tld/app.download.darwin' os='darwin' version='1.0.0' />
//!     <updatecheck codebase='https://sub.domain.tld/app.download.linux' os='linux' version='1.0.0' />
//!     <updatecheck codebase='https://sub.domain.tld/app.download.exe' os='windows' version='1.0.0' />
//!   </app>
//! </gupdate>
//! ```
//!
//! The time of the last check is kept in `<exec>.chk`; during a replacement the old
//! binary sits in `<exec>.bak` and is restored if anything fails.
//!
//! ## Installing the manifest
//!
//! ```no_run
//! use native_messaging_host::config::{HostConfig, HostSettings};
//! use native_messaging_host::install::{Browser, Installer, ManifestInstaller, Scope};
//!
//! let config = HostConfig::init(HostSettings {
//!     name: Some("com.example.host".into()),
//!     allowed_origins: vec!["chrome-extension://your_extension_id/".into()],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! ManifestInstaller::new(&[Browser::Chrome, Browser::Firefox], Scope::User)
//!     .install(&config)
//!     .unwrap();
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod http;
#[cfg(feature = "install")]
pub mod install;
pub mod logging;
pub mod ports;
pub mod update;

// -------- Host re-exports --------

#[doc(inline)]
pub use host::{decode_message, encode_message, Channel, Frame, Host};

#[cfg(feature = "tokio")]
#[doc(inline)]
pub use host::{event_loop, get_message, send_message};

#[doc(inline)]
pub use config::{ByteOrder, HostConfig, HostSettings};
#[doc(inline)]
pub use error::{ConfigError, ManifestError, NmError, UpdateError};

// -------- Install re-exports --------

#[cfg(feature = "install")]
#[doc(inline)]
pub use install::{Browser, Installer, ManifestInstaller, Scope};
