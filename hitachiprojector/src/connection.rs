use std::future::Future;
use std::io;

use futures::{SinkExt, StreamExt};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;

use crate::auth::{self, CHALLENGE_LEN};
use crate::reply::HitachiCodec;
use crate::{
    AutoEcoModeStatus, BlankStatus, Command, EcoModeStatus, Error, ErrorStatus, InputSource,
    PowerStatus, ProjectorConfig, Query, Reply, ReplyType,
};

type Session = Framed<TcpStream, HitachiCodec>;

/// Connection to one projector's command port.
///
/// Calls are serialized: each one holds the connection for its complete
/// request/reply exchange. Unless keep-alive is configured, every call opens
/// a fresh socket and closes it afterwards. A failed or cancelled call always
/// closes the socket, so the next call starts from a clean connection.
pub struct ProjectorConnection {
    config: ProjectorConfig,
    session: Mutex<Option<Session>>,
}

impl ProjectorConnection {
    pub fn new(config: ProjectorConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    pub async fn get_power_status(&self) -> Query<PowerStatus> {
        self.get(Command::PowerGet).await
    }

    pub async fn get_input_source(&self) -> Query<InputSource> {
        self.get(Command::InputSourceGet).await
    }

    pub async fn get_blank_status(&self) -> Query<BlankStatus> {
        self.get(Command::BlankGet).await
    }

    pub async fn get_eco_mode_status(&self) -> Query<EcoModeStatus> {
        self.get(Command::EcoModeGet).await
    }

    pub async fn get_auto_eco_mode_status(&self) -> Query<AutoEcoModeStatus> {
        self.get(Command::AutoEcoModeGet).await
    }

    pub async fn get_error_status(&self) -> Query<ErrorStatus> {
        self.get(Command::ErrorStatusGet).await
    }

    /// Lamp usage in hours.
    pub async fn get_lamp_time(&self) -> Query<u32> {
        self.get_hours(Command::LampTimeHighGet, Command::LampTimeLowGet)
            .await
    }

    /// Filter usage in hours.
    pub async fn get_filter_time(&self) -> Query<u32> {
        self.get_hours(Command::FilterTimeHighGet, Command::FilterTimeLowGet)
            .await
    }

    /// Sends any command and returns the raw payload of a `DATA` reply.
    pub async fn send_cmd(&self, command: Command) -> Query<[u8; 2]> {
        let reply = self.query(command).await?;
        let payload = match reply {
            Reply::Data(payload) => Some(payload),
            _ => None,
        };
        Ok((reply.reply_type(), payload))
    }

    pub async fn set_input_source(&self, source: InputSource) -> Result<ReplyType, Error> {
        let (reply_type, _) = self.send_cmd(source.set_command()).await?;
        Ok(reply_type)
    }

    /// Closes a connection kept open by keep-alive.
    pub async fn close(&self) {
        if self.session.lock().await.take().is_some() {
            tracing::debug!(host = %self.config.host, "closed projector connection");
        }
    }

    async fn get<T>(&self, command: Command) -> Query<T>
    where
        T: TryFrom<u16, Error = Error>,
    {
        let reply = self.query(command).await?;
        decode(reply)
    }

    async fn get_hours(&self, high: Command, low: Command) -> Query<u32> {
        let replies = self.exchange(&[high, low]).await?;

        let mut words = [0u16; 2];
        for (word, reply) in words.iter_mut().zip(replies.iter()) {
            match reply.data() {
                Some(value) => *word = value,
                None => return Ok((reply.reply_type(), None)),
            }
        }

        let hours = (u32::from(words[0]) << 16) | u32::from(words[1]);
        Ok((ReplyType::Data, Some(hours)))
    }

    async fn query(&self, command: Command) -> Result<Reply, Error> {
        let mut replies = self.exchange(&[command]).await?;
        replies.pop().ok_or(Error::ConnectionClosed)
    }

    /// Runs `commands` in order on one session, stopping after the first
    /// reply that is not `DATA`.
    async fn exchange(&self, commands: &[Command]) -> Result<Vec<Reply>, Error> {
        let mut slot = self.session.lock().await;

        // Owned for the duration of the exchange; dropping it on an error or
        // on cancellation closes the socket.
        let mut session = match slot.take() {
            Some(session) if is_open(&session) => session,
            Some(_) => {
                tracing::debug!(host = %self.config.host, "kept connection closed by projector");
                self.connect().await?
            }
            None => self.connect().await?,
        };

        let mut replies = Vec::with_capacity(commands.len());
        for command in commands {
            let reply = self
                .with_timeout(round_trip(&mut session, *command))
                .await
                .map_err(|e| {
                    tracing::warn!(host = %self.config.host, ?command, "dropping connection: {}", e);
                    e
                })?;

            replies.push(reply);
            if reply.reply_type() != ReplyType::Data {
                break;
            }
        }

        let rejected = replies.iter().any(|r| r.reply_type() == ReplyType::Auth);
        if self.config.keep_alive && !rejected {
            *slot = Some(session);
        }

        Ok(replies)
    }

    async fn connect(&self) -> Result<Session, Error> {
        let addr = (self.config.host.as_str(), self.config.port);
        let mut stream = self.with_timeout(async {
            TcpStream::connect(addr).await.map_err(Error::from)
        })
        .await?;
        stream.set_nodelay(true)?;

        let digest = self
            .read_challenge(&mut stream)
            .await?
            .map(|challenge| auth::digest(&challenge, &self.config.password));

        tracing::debug!(
            host = %self.config.host,
            port = self.config.port,
            authenticated = digest.is_some(),
            "connected to projector"
        );

        Ok(Framed::new(stream, HitachiCodec::new(digest)))
    }

    async fn read_challenge(
        &self,
        stream: &mut TcpStream,
    ) -> Result<Option<[u8; CHALLENGE_LEN]>, Error> {
        let mut challenge = [0u8; CHALLENGE_LEN];

        let n = match tokio::time::timeout(
            self.config.challenge_timeout,
            stream.read(&mut challenge),
        )
        .await
        {
            Err(_) => return Ok(None),
            Ok(n) => n?,
        };

        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        if n < CHALLENGE_LEN {
            match tokio::time::timeout(
                self.config.challenge_timeout,
                stream.read_exact(&mut challenge[n..]),
            )
            .await
            {
                Ok(Ok(_)) => {}
                Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(Error::MalformedChallenge(n))
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(Error::MalformedChallenge(n)),
            }
        }

        Ok(Some(challenge))
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        crate::within(self.config.timeout, fut).await
    }
}

async fn round_trip(session: &mut Session, command: Command) -> Result<Reply, Error> {
    tracing::debug!(?command, frame = ?command.frame(), "sending command");
    session.send(command).await?;

    let reply = match session.next().await {
        Some(reply) => reply?,
        None => return Err(Error::ConnectionClosed),
    };
    tracing::debug!(?command, ?reply, "received reply");

    Ok(reply)
}

/// A kept session can be reused while the projector has neither closed it
/// nor sent anything unrequested.
fn is_open(session: &Session) -> bool {
    if !session.read_buffer().is_empty() {
        return false;
    }

    let mut buf = [0u8; 1];
    matches!(
        session.get_ref().try_read(&mut buf),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock
    )
}

fn decode<T>(reply: Reply) -> Query<T>
where
    T: TryFrom<u16, Error = Error>,
{
    match reply.data() {
        Some(value) => Ok((ReplyType::Data, Some(T::try_from(value)?))),
        None => Ok((reply.reply_type(), None)),
    }
}
