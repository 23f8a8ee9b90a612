//! Write-only byte-stream link to the dive computer.
//!
//! The simulation loop never touches the transport directly. Frames go
//! through a bounded channel to a writer task, so a slow or vanished device
//! costs the loop one `try_send` per tick at most.

use crate::protocol::FrameBuffer;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const LINK_QUEUE_SIZE: usize = 16;
pub const FRAME_TERMINATOR: &[u8] = b"\n";

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("device queue full, frame dropped")]
    Backpressure,

    #[error("device link closed")]
    Closed,

    #[error("frame does not fit the link buffer ({0} bytes)")]
    FrameTooLarge(usize),

    #[error("invalid device target: {0}")]
    InvalidTarget(String),

    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Whether the link is unusable after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LinkError::Backpressure | LinkError::FrameTooLarge(_))
    }
}

/// Outbound frame sink. `send` must return without waiting on the device.
pub trait TelemetryLink: Send {
    fn send(&mut self, frame: &str) -> Result<(), LinkError>;
}

/// Link backed by a bounded channel drained by [`run_device_writer`].
#[derive(Debug, Clone)]
pub struct ChannelLink {
    tx: mpsc::Sender<FrameBuffer>,
}

impl ChannelLink {
    pub fn new(tx: mpsc::Sender<FrameBuffer>) -> Self {
        Self { tx }
    }

    /// Creates a link together with the receiving end for a writer task.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<FrameBuffer>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl TelemetryLink for ChannelLink {
    fn send(&mut self, frame: &str) -> Result<(), LinkError> {
        let buffer = FrameBuffer::from(frame).map_err(|_| LinkError::FrameTooLarge(frame.len()))?;

        self.tx.try_send(buffer).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => LinkError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => LinkError::Closed,
        })
    }
}

/// Drains `rx` into `writer`, one terminated line per frame.
///
/// Returns on the first write error or once every sender is gone. Dropping
/// `rx` on return is what signals [`LinkError::Closed`] to the simulation.
pub async fn run_device_writer<W>(mut writer: W, mut rx: mpsc::Receiver<FrameBuffer>) -> Result<u64, LinkError>
where
    W: AsyncWrite + Unpin,
{
    let mut frames_written = 0u64;

    while let Some(frame) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame).await {
            warn!("Device write failed after {} frames: {}", frames_written, e);
            return Err(e.into());
        }
        frames_written += 1;
        debug!("📤 {}", frame.as_str());
    }

    Ok(frames_written)
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &str) -> std::io::Result<()> {
    writer.write_all(frame.as_bytes()).await?;
    writer.write_all(FRAME_TERMINATOR).await?;
    writer.flush().await
}

/// Where the dive computer is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTarget {
    /// Serial-over-TCP bridge, or the bundled monitor.
    Tcp(String),
    /// Serial device node, e.g. `/dev/ttyACM0`, already configured for baud rate.
    Path(PathBuf),
}

impl FromStr for DeviceTarget {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(address) = s.strip_prefix("tcp://") {
            if address.is_empty() || !address.contains(':') {
                return Err(LinkError::InvalidTarget(s.to_string()));
            }
            return Ok(DeviceTarget::Tcp(address.to_string()));
        }
        if s.is_empty() {
            return Err(LinkError::InvalidTarget(s.to_string()));
        }
        Ok(DeviceTarget::Path(PathBuf::from(s)))
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceTarget::Tcp(address) => write!(f, "tcp://{}", address),
            DeviceTarget::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Opens `target` and spawns its writer task on the current runtime.
pub async fn connect(target: &DeviceTarget) -> Result<ChannelLink, LinkError> {
    let (link, rx) = ChannelLink::pair(LINK_QUEUE_SIZE);

    match target {
        DeviceTarget::Tcp(address) => {
            let stream = TcpStream::connect(address).await?;
            stream.set_nodelay(true)?;
            spawn_writer(stream, rx, target.clone());
        }
        DeviceTarget::Path(path) => {
            let file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
            spawn_writer(file, rx, target.clone());
        }
    }

    info!("🔗 Device link open on {}", target);
    Ok(link)
}

fn spawn_writer<W>(writer: W, rx: mpsc::Receiver<FrameBuffer>, target: DeviceTarget)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match run_device_writer(writer, rx).await {
            Ok(frames) => info!("🔌 Device link {} closed after {} frames", target, frames),
            Err(e) => warn!("🔌 Device link {} lost: {}", target, e),
        }
    });
}
