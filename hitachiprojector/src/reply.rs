use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{Command, Error};

pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;
pub const ERROR: u8 = 0x1c;
pub const DATA: u8 = 0x1d;
pub const BUSY: u8 = 0x1f;

/// Status code carried by a `BUSY` reply when authentication failed.
pub const AUTH_ERROR_CODE: [u8; 2] = [0x04, 0x00];

/// What kind of reply the projector sent for a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum ReplyType {
    Ack,
    Nak,
    Error,
    Data,
    Busy,
    Auth,
}

impl ReplyType {
    pub fn expect(self, expected: ReplyType) -> Result<(), Error> {
        if self == expected {
            Ok(())
        } else {
            Err(Error::UnexpectedReplyType {
                expected,
                actual: self,
            })
        }
    }
}

impl std::fmt::Display for ReplyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReplyType::Ack => "ACK",
            ReplyType::Nak => "NAK",
            ReplyType::Error => "ERROR",
            ReplyType::Data => "DATA",
            ReplyType::Busy => "BUSY",
            ReplyType::Auth => "AUTH",
        };
        f.write_str(s)
    }
}

/// One decoded reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Nak,
    Error([u8; 2]),
    Data([u8; 2]),
    Busy([u8; 2]),
    Auth,
}

impl Reply {
    pub fn reply_type(&self) -> ReplyType {
        match self {
            Reply::Ack => ReplyType::Ack,
            Reply::Nak => ReplyType::Nak,
            Reply::Error(_) => ReplyType::Error,
            Reply::Data(_) => ReplyType::Data,
            Reply::Busy(_) => ReplyType::Busy,
            Reply::Auth => ReplyType::Auth,
        }
    }

    pub fn data(&self) -> Option<u16> {
        match self {
            Reply::Data(payload) => Some(u16::from_le_bytes(*payload)),
            _ => None,
        }
    }
}

/// Frames commands and replies on a projector connection.
///
/// When the connection was opened with an authentication challenge, `digest`
/// holds the hex digest that prefixes every outgoing command frame.
#[derive(Debug, Default)]
pub struct HitachiCodec {
    digest: Option<String>,
}

impl HitachiCodec {
    pub fn new(digest: Option<String>) -> Self {
        Self { digest }
    }

    pub fn is_authenticated(&self) -> bool {
        self.digest.is_some()
    }
}

impl Decoder for HitachiCodec {
    type Item = Reply;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Reply>, Error> {
        let header = match src.first() {
            Some(b) => *b,
            None => return Ok(None),
        };

        match header {
            ACK => {
                src.advance(1);
                Ok(Some(Reply::Ack))
            }
            NAK => {
                src.advance(1);
                Ok(Some(Reply::Nak))
            }
            ERROR | DATA | BUSY => {
                if src.len() < 3 {
                    src.reserve(3 - src.len());
                    return Ok(None);
                }

                let payload = [src[1], src[2]];
                src.advance(3);

                Ok(Some(match header {
                    ERROR => Reply::Error(payload),
                    DATA => Reply::Data(payload),
                    _ if payload == AUTH_ERROR_CODE => Reply::Auth,
                    _ => Reply::Busy(payload),
                }))
            }
            other => Err(Error::UnknownReply(other)),
        }
    }
}

impl Encoder<Command> for HitachiCodec {
    type Error = Error;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<(), Error> {
        let frame = command.frame();
        let prefix = self.digest.as_deref().unwrap_or_default();

        dst.reserve(prefix.len() + frame.len());
        dst.put_slice(prefix.as_bytes());
        dst.put_slice(frame);
        Ok(())
    }
}
