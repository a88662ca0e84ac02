// TCP server and main event loop for the relay.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the main thread.
// - **Reader threads** (one per participant): read framed `ClientMessage`s
//   in a loop and send `InternalEvent::MessageFrom` to the main thread. On
//   error/EOF/`Goodbye`, send `InternalEvent::Disconnected`.
// - **Main thread**: owns the `Session`, receives events from the channel,
//   and dispatches them. Uses `recv_timeout` until the next turn deadline;
//   when the deadline passes it flushes the current turn. One tick is one
//   millisecond, so a turn lasts `ticks_per_turn` ms.
//
// The main thread is the only writer to participant streams (via
// `Session::broadcast`/`send_to`). Reader threads only read.
//
// Shutdown: the main thread checks a `keep_running` flag (cleared by
// `RelayHandle::stop`) and breaks out of the event loop.

use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use cubebot_protocol::framing::{read_json, write_json};
use cubebot_protocol::message::{ClientMessage, ServerMessage, TurnAction};
use cubebot_protocol::types::RelayPlayerId;
use tracing::{debug, info, warn};

use crate::session::{JoinRequest, Session};

/// How long a new connection has to send `Hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    MessageFrom {
        player_id: RelayPlayerId,
        message: ClientMessage,
    },
    Disconnected {
        player_id: RelayPlayerId,
    },
}

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }

    /// Block until the relay exits on its own.
    pub fn join(self) {
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a relay server.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    pub session_name: String,
    pub password: Option<String>,
    pub ticks_per_turn: u32,
    pub max_players: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 7878,
            session_name: "cubebot-session".into(),
            password: None,
            ticks_per_turn: 50,
            max_players: 4,
        }
    }
}

/// Start the relay server on a background thread. Returns a handle for
/// stopping it and the actual bound address (port 0 lets the OS pick).
pub fn start_relay(config: RelayConfig) -> std::io::Result<(RelayHandle, SocketAddr)> {
    let listener = TcpListener::bind((config.bind.as_str(), config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    info!(
        %addr,
        session = %config.session_name,
        ticks_per_turn = config.ticks_per_turn,
        max_players = config.max_players,
        "relay listening"
    );

    let thread = thread::spawn(move || {
        run_relay(listener, config, keep_running_clone);
    });

    Ok((
        RelayHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main relay loop. Runs until `keep_running` is cleared.
fn run_relay(listener: TcpListener, config: RelayConfig, keep_running: Arc<AtomicBool>) {
    let mut session = Session::new(
        config.session_name,
        config.password,
        config.ticks_per_turn,
        config.max_players,
    );

    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Non-blocking so the accept thread can check keep_running periodically.
    if let Err(err) = listener.set_nonblocking(true) {
        warn!(%err, "could not make listener non-blocking");
    }

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(20));
                }
                Err(err) => {
                    warn!(%err, "accept failed, listener exiting");
                    break;
                }
            }
        }
    });

    let turn_duration = Duration::from_millis(u64::from(config.ticks_per_turn.max(1)));
    let mut next_flush = Instant::now() + turn_duration;

    while keep_running.load(Ordering::SeqCst) {
        let wait = next_flush.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok(event) => {
                handle_event(&mut session, event, &tx, &keep_running);
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut session, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        // Flush on the deadline even when events keep arriving.
        if Instant::now() >= next_flush {
            if session.player_count() > 0 {
                session.flush_turn();
            }
            next_flush += turn_duration;
        }
    }
    info!("relay stopped");
}

fn handle_event(
    session: &mut Session,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::NewConnection { stream } => {
            handle_new_connection(session, stream, tx, keep_running);
        }
        InternalEvent::MessageFrom { player_id, message } => {
            handle_message(session, player_id, message);
        }
        InternalEvent::Disconnected { player_id } => {
            session.remove_player(player_id);
        }
    }
}

/// Read the `Hello` handshake, add the participant to the session, and spawn
/// their reader thread. Rejected participants get `Rejected` and are dropped.
fn handle_new_connection(
    session: &mut Session,
    stream: TcpStream,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).ok();

    let mut reader = match stream.try_clone() {
        Ok(s) => BufReader::new(s),
        Err(err) => {
            warn!(%err, "could not clone participant stream");
            return;
        }
    };

    let request = match read_json::<_, ClientMessage>(&mut reader) {
        Ok(ClientMessage::Hello {
            protocol_version,
            player_name,
            engine_version_hash,
            config_hash,
            session_password,
        }) => JoinRequest {
            protocol_version,
            player_name,
            engine_version_hash,
            config_hash,
            session_password,
        },
        Ok(other) => {
            debug!(message = ?other, "expected Hello, dropping connection");
            return;
        }
        Err(err) => {
            debug!(%err, "handshake failed");
            return;
        }
    };

    let write_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            warn!(%err, "could not clone participant stream");
            return;
        }
    };

    let name = request.player_name.clone();
    match session.add_player(request, write_stream) {
        Ok(player_id) => {
            stream.set_read_timeout(None).ok();
            let tx_reader = tx.clone();
            let keep_running_reader = keep_running.clone();
            thread::spawn(move || {
                reader_loop(reader, player_id, tx_reader, keep_running_reader);
            });
        }
        Err(reason) => {
            info!(name = %name, %reason, "rejected participant");
            let rejected = ServerMessage::Rejected {
                reason: reason.to_string(),
            };
            let mut writer = std::io::BufWriter::new(stream);
            let _ = write_json(&mut writer, &rejected);
        }
    }
}

/// Reader loop for a single participant. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    player_id: RelayPlayerId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_json::<_, ClientMessage>(&mut reader) {
            Ok(ClientMessage::Goodbye) => break,
            Ok(message) => {
                let _ = tx.send(InternalEvent::MessageFrom { player_id, message });
            }
            Err(err) => {
                if !err.is_disconnect() {
                    warn!(player = player_id.0, %err, "dropping participant");
                }
                break;
            }
        }
    }
    let _ = tx.send(InternalEvent::Disconnected { player_id });
}

/// Handle a message after the handshake. `Hello` and `Goodbye` never reach
/// here (handshake and reader loop consume them).
fn handle_message(session: &mut Session, player_id: RelayPlayerId, message: ClientMessage) {
    match message {
        ClientMessage::Action { sequence, payload } => {
            session.enqueue_action(TurnAction {
                player_id,
                sequence,
                payload,
            });
        }
        ClientMessage::Checksum { tick, hash } => {
            session.record_checksum(player_id, tick, hash);
        }
        ClientMessage::StartLevel { level_json } => {
            session.start_level(player_id, level_json);
        }
        ClientMessage::Hello { .. } | ClientMessage::Goodbye => {
            debug!(player = player_id.0, "ignoring handshake message mid-session");
        }
    }
}
