//! PJLink class 1 client, used only to read descriptive metadata.
//!
//! PJLink is a line protocol: every message ends with a carriage return.
//! After connecting, the projector greets with `PJLINK 0` when
//! authentication is off, or with `PJLINK 1 <random>` when the first command
//! must carry the digest of the random and the password.

use std::time::Duration;

use bytes::{Buf, BufMut, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};

use crate::{auth, within, Error, PjlinkConfig};

const TERMINATOR: u8 = b'\r';
const MAX_LINE_LEN: usize = 256;

const GREETING: &str = "PJLINK ";
const AUTH_ERROR: &str = "PJLINK ERRA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PjlinkError {
    #[error("undefined command")]
    UndefinedCommand,
    #[error("out of parameter")]
    OutOfParameter,
    #[error("unavailable time")]
    UnavailableTime,
    #[error("projector failure")]
    ProjectorFailure,
}

impl PjlinkError {
    fn from_value(value: &str) -> Option<Self> {
        match value {
            "ERR1" => Some(PjlinkError::UndefinedCommand),
            "ERR2" => Some(PjlinkError::OutOfParameter),
            "ERR3" => Some(PjlinkError::UnavailableTime),
            "ERR4" => Some(PjlinkError::ProjectorFailure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

/// Splits the stream on carriage returns.
#[derive(Debug, Default)]
pub struct PjlinkCodec;

impl Decoder for PjlinkCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Error> {
        let end = match src.iter().position(|b| *b == TERMINATOR) {
            Some(end) => end,
            None if src.len() > MAX_LINE_LEN => {
                return Err(Error::PjlinkProtocol(
                    String::from_utf8_lossy(&src[..MAX_LINE_LEN]).into_owned(),
                ))
            }
            None => return Ok(None),
        };

        let line = src.split_to(end);
        src.advance(1);

        let line = String::from_utf8(line.to_vec())
            .map_err(|e| Error::PjlinkProtocol(String::from_utf8_lossy(e.as_bytes()).into_owned()))?;
        Ok(Some(line.trim_start_matches('\n').to_string()))
    }
}

impl Encoder<String> for PjlinkCodec {
    type Error = Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), Error> {
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(TERMINATOR);
        Ok(())
    }
}

pub struct PjlinkConnection {
    framed: Framed<TcpStream, PjlinkCodec>,
    digest: Option<String>,
    timeout: Duration,
}

impl PjlinkConnection {
    /// Connects and reads the greeting. With authentication enabled the
    /// digest is sent with the first query, which is where a wrong password
    /// surfaces as [`Error::AuthRejected`].
    pub async fn connect(config: &PjlinkConfig) -> Result<Self, Error> {
        let addr = (config.host.as_str(), config.port);
        let stream = within(config.timeout, async {
            TcpStream::connect(addr).await.map_err(Error::from)
        })
        .await?;

        let mut framed = Framed::new(stream, PjlinkCodec);
        let greeting = within(config.timeout, receive(&mut framed)).await?;
        let digest = parse_greeting(&greeting, &config.password)?;

        tracing::debug!(
            host = %config.host,
            port = config.port,
            authenticated = digest.is_some(),
            "connected to PJLink"
        );

        Ok(Self {
            framed,
            digest,
            timeout: config.timeout,
        })
    }

    pub async fn get_name(&mut self) -> Result<String, Error> {
        self.query("NAME").await
    }

    pub async fn get_manufacturer(&mut self) -> Result<String, Error> {
        self.query("INF1").await
    }

    pub async fn get_model(&mut self) -> Result<String, Error> {
        self.query("INF2").await
    }

    pub async fn get_other_info(&mut self) -> Result<String, Error> {
        self.query("INFO").await
    }

    pub async fn get_class(&mut self) -> Result<String, Error> {
        self.query("CLSS").await
    }

    pub async fn device_info(&mut self) -> Result<DeviceInfo, Error> {
        Ok(DeviceInfo {
            name: self.get_name().await?,
            manufacturer: self.get_manufacturer().await?,
            model: self.get_model().await?,
        })
    }

    pub async fn close(mut self) -> Result<(), Error> {
        within(self.timeout, async { self.framed.close().await }).await
    }

    async fn query(&mut self, body: &str) -> Result<String, Error> {
        let request = match self.digest.take() {
            Some(digest) => format!("{}%1{} ?", digest, body),
            None => format!("%1{} ?", body),
        };

        let framed = &mut self.framed;
        let response = within(self.timeout, async {
            framed.send(request).await?;
            receive(framed).await
        })
        .await?;
        tracing::debug!(command = body, %response, "PJLink response");

        parse_response(body, &response)
    }
}

async fn receive(framed: &mut Framed<TcpStream, PjlinkCodec>) -> Result<String, Error> {
    match framed.next().await {
        Some(line) => line,
        None => Err(Error::ConnectionClosed),
    }
}

fn parse_greeting(greeting: &str, password: &str) -> Result<Option<String>, Error> {
    if greeting == AUTH_ERROR {
        return Err(Error::AuthRejected);
    }

    let rest = greeting
        .strip_prefix(GREETING)
        .ok_or_else(|| Error::PjlinkProtocol(greeting.to_string()))?;

    match rest.split_once(' ') {
        None if rest == "0" => Ok(None),
        Some(("1", random)) if !random.is_empty() => {
            Ok(Some(auth::digest(random.as_bytes(), password)))
        }
        _ => Err(Error::PjlinkProtocol(greeting.to_string())),
    }
}

fn parse_response(body: &str, response: &str) -> Result<String, Error> {
    if response == AUTH_ERROR {
        return Err(Error::AuthRejected);
    }

    let value = response
        .strip_prefix("%1")
        .and_then(|r| r.strip_prefix(body))
        .and_then(|r| r.strip_prefix('='))
        .ok_or_else(|| Error::PjlinkProtocol(response.to_string()))?;

    match PjlinkError::from_value(value) {
        Some(e) => Err(Error::Pjlink(e)),
        None => Ok(value.to_string()),
    }
}
