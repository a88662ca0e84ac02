// TCP client for connecting a participant to the relay.
//
// Provides a non-blocking interface for the participant's main thread:
// - `connect()` performs TCP connect + `Hello` handshake on the calling
//   thread, then spawns a background reader thread.
// - The reader thread reads framed `ServerMessage`s in a loop and pushes them
//   into an `mpsc` channel.
// - The main thread holds a `BufWriter<TcpStream>` for sending.
// - `poll()` drains the inbox without blocking.
//
// The client has no engine dependency: actions go out as opaque payload
// bytes, and turns come back the same way. Decoding them into session
// actions is the caller's job (see `LevelSession::apply_turn_payloads`).

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cubebot_protocol::PROTOCOL_VERSION;
use cubebot_protocol::framing::{FrameError, read_json, write_json};
use cubebot_protocol::message::{ClientMessage, PlayerInfo, ServerMessage};
use cubebot_protocol::types::{ActionSequence, RelayPlayerId};
use thiserror::Error;
use tracing::{debug, warn};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("unexpected handshake response: {0}")]
    UnexpectedResponse(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Information returned by a successful `connect()` handshake.
#[derive(Clone, Debug)]
pub struct WelcomeInfo {
    pub player_id: RelayPlayerId,
    pub session_name: String,
    pub players: Vec<PlayerInfo>,
    pub ticks_per_turn: u32,
}

/// TCP client for relay communication.
pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: JoinHandle<()>,
    player_id: RelayPlayerId,
    next_sequence: u64,
}

impl NetClient {
    /// Connect to a relay, perform the `Hello` handshake, and spawn a reader
    /// thread.
    pub fn connect(
        addr: &str,
        player_name: &str,
        engine_version_hash: u64,
        config_hash: u64,
        password: Option<String>,
    ) -> Result<(Self, WelcomeInfo), ClientError> {
        let stream = TcpStream::connect(addr).map_err(ClientError::Connect)?;
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).ok();
        let reader_stream = stream.try_clone().map_err(ClientError::Connect)?;
        let mut writer = BufWriter::new(stream);

        let hello = ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            player_name: player_name.into(),
            engine_version_hash,
            config_hash,
            session_password: password,
        };
        write_json(&mut writer, &hello)?;

        let mut reader = BufReader::new(reader_stream);
        let welcome = match read_json::<_, ServerMessage>(&mut reader)? {
            ServerMessage::Welcome {
                player_id,
                session_name,
                players,
                ticks_per_turn,
            } => WelcomeInfo {
                player_id,
                session_name,
                players,
                ticks_per_turn,
            },
            ServerMessage::Rejected { reason } => return Err(ClientError::Rejected(reason)),
            other => return Err(ClientError::UnexpectedResponse(format!("{other:?}"))),
        };
        debug!(player = welcome.player_id.0, session = %welcome.session_name, "joined relay");

        // The long-lived reader loop blocks indefinitely.
        reader.get_ref().set_read_timeout(None).ok();

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(reader, tx);
        });

        Ok((
            Self {
                writer,
                inbox: rx,
                _reader_thread: reader_thread,
                player_id: welcome.player_id,
                next_sequence: 0,
            },
            welcome,
        ))
    }

    pub fn player_id(&self) -> RelayPlayerId {
        self.player_id
    }

    /// Send a session action (opaque payload bytes) to the relay.
    pub fn send_action(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        let sequence = ActionSequence(self.next_sequence);
        self.next_sequence += 1;
        let msg = ClientMessage::Action {
            sequence,
            payload: payload.to_vec(),
        };
        write_json(&mut self.writer, &msg)?;
        Ok(())
    }

    /// Ask the relay to load a level for everyone (host only).
    pub fn send_start_level(&mut self, level_json: &str) -> Result<(), ClientError> {
        let msg = ClientMessage::StartLevel {
            level_json: level_json.into(),
        };
        write_json(&mut self.writer, &msg)?;
        Ok(())
    }

    /// Report the session checksum at `tick`.
    pub fn send_checksum(&mut self, tick: u64, hash: u64) -> Result<(), ClientError> {
        write_json(&mut self.writer, &ClientMessage::Checksum { tick, hash })?;
        Ok(())
    }

    /// Send `Goodbye`. The relay closes the connection afterwards.
    pub fn disconnect(&mut self) {
        if let Err(err) = write_json(&mut self.writer, &ClientMessage::Goodbye) {
            warn!(%err, "failed to send Goodbye");
        }
    }

    /// Drain all queued relay messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        self.inbox.try_iter().collect()
    }
}

/// Reader thread: read framed messages in a loop, push to the inbox.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    loop {
        match read_json::<_, ServerMessage>(&mut reader) {
            Ok(msg) => {
                if tx.send(msg).is_err() {
                    break;
                }
            }
            Err(err) => {
                if !err.is_disconnect() {
                    warn!(%err, "relay connection lost");
                }
                break;
            }
        }
    }
}
