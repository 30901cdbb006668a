use std::{io, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};

use crate::status::{parse_status_text, RawStatus};

pub const DEFAULT_NIS_PORT: u16 = 3551;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum NisError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("daemon returned no status fields")]
    EmptyStatus,
}

/// Client for the apcupsd Network Information Server protocol.
///
/// The protocol is a plain TCP exchange of length-prefixed frames: the client
/// sends a big-endian `u16` length followed by a command (`status`), and the
/// daemon replies with one frame per status line, terminated by a zero-length
/// frame. The whole exchange is bounded by a single socket timeout.
#[derive(Debug, Clone)]
pub struct NisClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NisClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issue a `status` request and parse the reply into raw key/value fields.
    pub async fn status(&self) -> Result<RawStatus, NisError> {
        match timeout(self.timeout, self.exchange("status")).await {
            Ok(res) => res,
            Err(_) => Err(NisError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, command: &str) -> Result<RawStatus, NisError> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;

        stream.write_u16(command.len() as u16).await?;
        stream.write_all(command.as_bytes()).await?;
        stream.flush().await?;

        let mut text = String::new();
        loop {
            let len = stream.read_u16().await?;
            if len == 0 {
                // End-of-transmission frame.
                break;
            }
            let mut buf = vec![0u8; len as usize];
            stream.read_exact(&mut buf).await?;
            text.push_str(&String::from_utf8_lossy(&buf));
        }

        let fields = parse_status_text(&text);
        if fields.is_empty() {
            return Err(NisError::EmptyStatus);
        }
        Ok(fields)
    }
}
