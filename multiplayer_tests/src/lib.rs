// Test-only participant for multi-participant integration tests.
//
// Wraps the real `NetClient` (from `cubebot_relay::client`) in a
// `RelayChannel` (`cubebot_relay::channel`, the networked `ActionChannel`),
// and drives a real `LevelSession` (from `cubebot_engine::session`) from what
// it delivers:
// connect -> level start -> request -> relay turn -> session.deliver() ->
// compare state across participants.
//
// The only test-specific code is the synchronous polling wrappers (blocking
// loops around `NetClient::poll()`). Networking, action encoding and the
// session tick loop are the same code a real participant runs.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use cubebot_engine::cell::Cell;
use cubebot_engine::channel::{ActionChannel, Delivery};
use cubebot_engine::config::LevelConfig;
use cubebot_engine::event::SessionEvent;
use cubebot_engine::session::LevelSession;
use cubebot_engine::types::{CellIndex, ParticipantId};
use cubebot_protocol::message::ServerMessage;
use cubebot_relay::channel::RelayChannel;
use cubebot_relay::client::NetClient;

/// Default timeout for blocking poll operations.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep duration between poll attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// TestParticipant
// ---------------------------------------------------------------------------

/// A participant: a relay connection plus the local session it drives.
pub struct TestParticipant {
    channel: RelayChannel,
    pub session: Option<LevelSession>,
    pub participant_id: ParticipantId,
    pub ticks_per_turn: u32,
    /// Every notification the local session produced, in order.
    pub events: Vec<SessionEvent>,
    /// Every non-turn relay message received, in order.
    pub messages: Vec<ServerMessage>,
    backlog: VecDeque<Delivery>,
}

impl TestParticipant {
    /// Connect with the hashes of this engine build and `level`.
    pub fn connect(addr: SocketAddr, name: &str, level: &LevelConfig) -> Self {
        let (client, info) = NetClient::connect(
            &addr.to_string(),
            name,
            cubebot_engine::engine_version_hash(),
            level.config_hash(),
            None,
        )
        .expect("TestParticipant::connect failed");
        Self {
            channel: RelayChannel::new(client),
            session: None,
            participant_id: ParticipantId(info.player_id.0),
            ticks_per_turn: info.ticks_per_turn,
            events: Vec::new(),
            messages: Vec::new(),
            backlog: VecDeque::new(),
        }
    }

    /// Host only: load `level` for everyone.
    pub fn start_level(&mut self, level: &LevelConfig) {
        let json = level.to_json().expect("serialize level failed");
        self.channel
            .client_mut()
            .send_start_level(&json)
            .expect("send_start_level failed");
    }

    pub fn session(&self) -> &LevelSession {
        self.session.as_ref().expect("session not started")
    }

    pub fn tick(&self) -> u64 {
        self.session().tick()
    }

    // -- requests ----------------------------------------------------------

    pub fn request_run(&mut self) {
        let session = self.session.as_ref().expect("session not started");
        session
            .request_run(&mut self.channel)
            .expect("request_run failed");
    }

    pub fn request_reset(&mut self) {
        let session = self.session.as_ref().expect("session not started");
        session
            .request_reset(&mut self.channel)
            .expect("request_reset failed");
    }

    pub fn request_clear(&mut self) {
        let session = self.session.as_ref().expect("session not started");
        session
            .request_clear(&mut self.channel)
            .expect("request_clear failed");
    }

    pub fn request_edit(&mut self, index: usize, cell: Cell) {
        let session = self.session.as_ref().expect("session not started");
        session
            .request_edit(&mut self.channel, CellIndex(index), cell)
            .expect("request_edit failed");
    }

    /// Send the local checksum for the current tick.
    pub fn send_checksum(&mut self) {
        let (tick, hash) = {
            let session = self.session();
            (session.tick(), session.checksum())
        };
        self.send_checksum_value(tick, hash);
    }

    /// Send an arbitrary checksum (for provoking a desync).
    pub fn send_checksum_value(&mut self, tick: u64, hash: u64) {
        self.channel
            .client_mut()
            .send_checksum(tick, hash)
            .expect("send_checksum failed");
    }

    /// Send Goodbye and close the connection.
    pub fn disconnect(&mut self) {
        self.channel.client_mut().disconnect();
    }

    // -- polling -----------------------------------------------------------

    /// Move everything the relay has sent into the backlog, building the
    /// session on `LevelStart`.
    fn receive(&mut self) {
        let deliveries = self.channel.poll();
        for msg in self.channel.take_control() {
            if let ServerMessage::LevelStart { level_json } = &msg {
                let session =
                    LevelSession::from_json(level_json).expect("LevelStart config invalid");
                self.session = Some(session);
            }
            self.messages.push(msg);
        }
        self.backlog.extend(deliveries);
    }

    /// Apply one buffered turn. Returns false if none is buffered.
    fn apply_one(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(delivery) = self.backlog.pop_front() else {
            return false;
        };
        self.events.extend(session.deliver(delivery).events);
        true
    }

    /// Non-blocking: apply every turn received so far. Returns how many.
    pub fn pump(&mut self) -> usize {
        self.receive();
        let mut applied = 0;
        while self.apply_one() {
            applied += 1;
        }
        applied
    }

    /// Blocking poll until the level has started and the session exists.
    pub fn poll_until_level_start(&mut self) {
        let start = Instant::now();
        while self.session.is_none() {
            assert!(
                start.elapsed() < POLL_TIMEOUT,
                "timed out waiting for LevelStart"
            );
            self.receive();
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Blocking poll, applying turns one at a time, until `done` holds for
    /// the session.
    pub fn poll_until(&mut self, what: &str, done: impl Fn(&LevelSession) -> bool) {
        let start = Instant::now();
        loop {
            if self.session.as_ref().is_some_and(&done) {
                return;
            }
            assert!(start.elapsed() < POLL_TIMEOUT, "timed out waiting for {what}");
            self.receive();
            if !self.apply_one() {
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

    /// Blocking poll until the session has reached `tick`. Stops on the turn
    /// that reaches it, so participants targeting the same turn boundary end
    /// at the same tick.
    pub fn poll_until_tick(&mut self, tick: u64) {
        self.poll_until(&format!("tick {tick}"), |s| s.tick() >= tick);
    }

    /// Blocking poll until a relay message matching `pred` has been received,
    /// now or earlier (turns keep being applied meanwhile). Returns it.
    pub fn poll_until_message(
        &mut self,
        what: &str,
        pred: impl Fn(&ServerMessage) -> bool,
    ) -> ServerMessage {
        let start = Instant::now();
        let mut seen = 0;
        loop {
            if let Some(msg) = self.messages[seen..].iter().find(|m| pred(m)) {
                return msg.clone();
            }
            seen = self.messages.len();
            assert!(start.elapsed() < POLL_TIMEOUT, "timed out waiting for {what}");
            self.pump();
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Bring every participant to the same turn boundary at or after all of
/// their current ticks. Returns that tick.
pub fn converge(participants: &mut [&mut TestParticipant]) -> u64 {
    let latest = participants.iter().map(|p| p.tick()).max().unwrap_or(0);
    let ticks_per_turn = participants
        .first()
        .map_or(1, |p| u64::from(p.ticks_per_turn.max(1)));
    let target = latest.div_ceil(ticks_per_turn) * ticks_per_turn;
    for p in participants.iter_mut() {
        p.poll_until_tick(target);
    }
    target
}
