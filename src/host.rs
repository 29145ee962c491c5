use crate::{
    config::{ByteOrder, HostConfig},
    http::HttpSettings,
    ports::Ports,
    update::{CheckOutcome, UpdateChecker},
};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{self, Read, Write};

pub use crate::error::NmError;

pub const MAX_TO_BROWSER: usize = 1_048_576; // 1 MB (host -> browser)
pub const MAX_FROM_BROWSER: usize = 64 * 1_048_576; // 64 MB (browser -> host)

/// Result of reading one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<T> {
    Message(T),
    /// A zero-length frame. Valid, carries nothing.
    Empty,
    /// The peer closed the channel before a new header started.
    Closed,
}

impl<T> Frame<T> {
    pub fn into_message(self) -> Option<T> {
        match self {
            Frame::Message(msg) => Some(msg),
            Frame::Empty | Frame::Closed => None,
        }
    }
}

/// Length-prefixed JSON framing over any `Read`/`Write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    byte_order: ByteOrder,
    max_incoming: usize,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new(ByteOrder::default())
    }
}

impl Channel {
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            max_incoming: MAX_FROM_BROWSER,
        }
    }

    /// Lower the incoming size cap. It never goes above [`MAX_FROM_BROWSER`].
    pub fn with_max_incoming(mut self, max: usize) -> Self {
        self.max_incoming = max.min(MAX_FROM_BROWSER);
        self
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Read one frame and decode its body as JSON.
    pub fn receive<T: DeserializeOwned, R: Read>(&self, reader: &mut R) -> Result<Frame<T>, NmError> {
        match self.read_frame(reader)? {
            Frame::Message(body) => serde_json::from_slice(&body)
                .map(Frame::Message)
                .map_err(NmError::DeserializeJson),
            Frame::Empty => Ok(Frame::Empty),
            Frame::Closed => Ok(Frame::Closed),
        }
    }

    /// Read one frame without decoding it.
    pub fn read_frame<R: Read>(&self, reader: &mut R) -> Result<Frame<Vec<u8>>, NmError> {
        let len = match self.read_header(&mut *reader)? {
            Some(len) => len as usize,
            None => return Ok(Frame::Closed),
        };
        if len == 0 {
            return Ok(Frame::Empty);
        }
        if len > self.max_incoming {
            return Err(NmError::IncomingTooLarge {
                len,
                max: self.max_incoming,
            });
        }
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(Frame::Message(buf))
    }

    // None when the source is exhausted before the first header byte.
    fn read_header<R: Read>(&self, reader: &mut R) -> io::Result<Option<u32>> {
        let mut len_buf = [0u8; 4];
        let mut filled = 0;
        while filled < len_buf.len() {
            match reader.read(&mut len_buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "channel closed inside a frame header",
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Some(self.byte_order.read_u32(len_buf)))
    }

    /// Encode `msg` into a complete frame: header then JSON body.
    pub fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, NmError> {
        let json = self.encode_body(msg)?;
        let mut out = Vec::with_capacity(4 + json.len());
        out.extend_from_slice(&self.byte_order.write_u32(json.len() as u32));
        out.extend_from_slice(&json);
        Ok(out)
    }

    /// Write the header, then the body, then flush. No retries.
    pub fn send<T: Serialize, W: Write>(&self, writer: &mut W, msg: &T) -> Result<(), NmError> {
        let json = self.encode_body(msg)?;
        writer.write_all(&self.byte_order.write_u32(json.len() as u32))?;
        writer.write_all(&json)?;
        writer.flush()?;
        Ok(())
    }

    fn encode_body<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, NmError> {
        let json = serde_json::to_vec(msg).map_err(NmError::SerializeJson)?;
        if json.len() > MAX_TO_BROWSER {
            return Err(NmError::OutgoingTooLarge {
                len: json.len(),
                max: MAX_TO_BROWSER,
            });
        }
        Ok(json)
    }
}

/// Encode any serde-serializable value into a little-endian frame.
pub fn encode_message<T: Serialize>(msg: &T) -> Result<Vec<u8>, NmError> {
    Channel::default().encode(msg)
}

/// Decode a single little-endian frame into its UTF-8 body (useful in tests).
/// A closed reader is [`NmError::Disconnected`]; an empty frame is `""`.
pub fn decode_message<R: Read>(reader: &mut R, max_size: usize) -> Result<String, NmError> {
    match Channel::default()
        .with_max_incoming(max_size)
        .read_frame(reader)?
    {
        Frame::Message(body) => String::from_utf8(body)
            .map_err(|e| NmError::Io(io::Error::new(io::ErrorKind::InvalidData, e))),
        Frame::Empty => Ok(String::new()),
        Frame::Closed => Err(NmError::Disconnected),
    }
}

/// A native messaging host: configuration, framing, and the capabilities used
/// by the update and shutdown paths.
pub struct Host {
    config: HostConfig,
    channel: Channel,
    ports: Ports,
}

impl Host {
    /// Host wired to the real file system, network, clock and process.
    pub fn new(config: HostConfig) -> Self {
        let settings = HttpSettings {
            verify_tls: config.verify_tls,
            ..HttpSettings::default()
        };
        let ports = Ports::system(&settings);
        Self::with_ports(config, ports)
    }

    pub fn with_ports(config: HostConfig, ports: Ports) -> Self {
        let channel = Channel::new(config.byte_order);
        Self {
            config,
            channel,
            ports,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Read one message. `Ok(None)` for an empty frame.
    ///
    /// When the peer has closed the channel this runs [`Host::shutdown`]; if
    /// the process is still alive afterwards it returns
    /// [`NmError::Disconnected`].
    pub fn on_message<T: DeserializeOwned, R: Read>(&self, reader: &mut R) -> Result<Option<T>, NmError> {
        match self.channel.receive(reader)? {
            Frame::Message(msg) => Ok(Some(msg)),
            Frame::Empty => Ok(None),
            Frame::Closed => {
                self.shutdown();
                Err(NmError::Disconnected)
            }
        }
    }

    pub fn post_message<T: Serialize, W: Write>(&self, writer: &mut W, msg: &T) -> Result<(), NmError> {
        self.channel.send(writer, msg)
    }

    /// Serve frames in arrival order until the peer closes the channel.
    ///
    /// A body that isn't valid JSON for `Req` is logged and skipped; the
    /// stream stays aligned because the whole declared length was consumed.
    /// Handler errors and I/O errors end the loop.
    pub fn run<Req, Resp, R, W, F>(&self, reader: &mut R, writer: &mut W, mut handler: F) -> Result<(), NmError>
    where
        Req: DeserializeOwned,
        Resp: Serialize,
        R: Read,
        W: Write,
        F: FnMut(Req) -> Result<Option<Resp>, NmError>,
    {
        loop {
            match self.channel.receive::<Req, _>(reader) {
                Ok(Frame::Message(msg)) => {
                    if let Some(reply) = handler(msg)? {
                        self.channel.send(writer, &reply)?;
                    }
                }
                Ok(Frame::Empty) => tracing::debug!("empty frame"),
                Ok(Frame::Closed) => {
                    self.shutdown();
                    return Ok(());
                }
                Err(NmError::DeserializeJson(e)) => {
                    tracing::warn!(error = %e, "dropping malformed message");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run the update check, then terminate the process.
    pub fn shutdown(&self) {
        tracing::info!("native messaging channel closed");
        let outcome = self.auto_update_check();
        tracing::debug!(?outcome, "update check finished");
        self.ports.process.exit(0);
    }

    pub fn auto_update_check(&self) -> CheckOutcome {
        UpdateChecker::new(
            &self.config,
            self.ports.fs.as_ref(),
            self.ports.http.as_ref(),
            self.ports.clock.as_ref(),
        )
        .auto_update_check()
    }

    /// Best-effort uninstall, then terminate the process.
    #[cfg(feature = "install")]
    pub fn uninstall(&self, installer: &dyn crate::install::Installer) {
        let report = installer.uninstall(&self.config, self.ports.fs.as_ref());
        tracing::info!(
            removed = report.removed.len(),
            failed = report.failures.len(),
            app = %self.config.app_name,
            "uninstalled"
        );
        self.ports.process.exit(0);
    }
}

#[cfg(feature = "tokio")]
mod nonblocking {
    use super::{Channel, Frame, NmError};
    use serde::{de::DeserializeOwned, Serialize};
    use std::{
        future::Future,
        io::{self, Read, Write},
    };

    fn join_error(e: tokio::task::JoinError) -> NmError {
        NmError::Io(io::Error::new(io::ErrorKind::Other, e))
    }

    /// Read one frame on the blocking pool. The reader is handed back.
    pub async fn read_message<T, R>(channel: Channel, mut reader: R) -> Result<(Frame<T>, R), NmError>
    where
        T: DeserializeOwned + Send + 'static,
        R: Read + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let frame = channel.receive(&mut reader)?;
            Ok((frame, reader))
        })
        .await
        .map_err(join_error)?
    }

    /// Write one frame on the blocking pool. The writer is handed back.
    pub async fn write_message<T, W>(channel: Channel, mut writer: W, msg: &T) -> Result<W, NmError>
    where
        T: Serialize,
        W: Write + Send + 'static,
    {
        let frame = channel.encode(msg)?;
        tokio::task::spawn_blocking(move || {
            writer.write_all(&frame)?;
            writer.flush()?;
            Ok(writer)
        })
        .await
        .map_err(join_error)?
    }

    pub async fn get_message<T>(channel: Channel) -> Result<Frame<T>, NmError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (frame, _) = read_message(channel, io::stdin()).await?;
        Ok(frame)
    }

    pub async fn send_message<T: Serialize>(channel: Channel, msg: &T) -> Result<(), NmError> {
        write_message(channel, io::stdout(), msg).await?;
        Ok(())
    }

    /// Feed stdin messages to `handler` until the browser closes the channel,
    /// then return `Ok(())`. Call [`super::Host::shutdown`] afterwards to run
    /// the update check.
    pub async fn event_loop<T, F, Fut>(channel: Channel, mut handler: F) -> Result<(), NmError>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), NmError>>,
    {
        loop {
            match get_message(channel).await? {
                Frame::Message(msg) => handler(msg).await?,
                Frame::Empty => continue,
                Frame::Closed => return Ok(()),
            }
        }
    }
}

#[cfg(feature = "tokio")]
pub use nonblocking::{event_loop, get_message, read_message, send_message, write_message};
