// Session state for the relay.
//
// `Session` is the central data structure that `server.rs` drives. It tracks
// connected participants, pending actions, turn numbering, the tick target,
// the buffered turn log, and checksum-based desync detection. All mutation
// happens through methods called from the server's single-threaded main
// loop, so there is no internal locking.
//
// Key responsibilities:
// - Participant management: add/remove, assign IDs, handshake checks
//   (password, capacity, protocol version, engine and config hashes).
// - Level start: the host's `StartLevel` is broadcast as `LevelStart` once.
//   Turns only flush after it.
// - Action queuing: buffer incoming actions until the next turn flush, then
//   sort by `(player_id, sequence)` for canonical order.
// - Turn flushing: package pending actions into a `Turn`, broadcast it to
//   everyone (the sender included), and append it to the turn log.
// - Late joiners: a participant accepted after the level started is sent
//   `LevelStart` and then the turn log, in order, so its session replays to
//   the same state as everyone else's. Runs of empty turns are logged as
//   their last turn only, which keeps the log proportional to the number of
//   busy turns.
// - Desync detection: collect per-participant checksums per tick and compare
//   once every connected participant has reported.
//
// Writing to participant streams: `Session` holds cloned `TcpStream` write
// halves wrapped in `BufWriter`. Write errors on a single participant are
// logged and otherwise ignored; that participant's reader thread notices the
// broken pipe and reports a disconnect.
//
// See also: `server.rs` for the event loop, `client.rs` for the participant
// side of the same protocol.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;

use cubebot_protocol::framing::write_json;
use cubebot_protocol::message::{PlayerInfo, ServerMessage, TurnAction};
use cubebot_protocol::types::{RelayPlayerId, TurnNumber};
use cubebot_protocol::PROTOCOL_VERSION;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a handshake was refused. The `Display` text is sent to the
/// participant in `Rejected { reason }`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("incorrect password")]
    IncorrectPassword,
    #[error("session is full")]
    SessionFull,
    #[error("protocol version mismatch (relay {expected}, participant {found})")]
    ProtocolMismatch { expected: u32, found: u32 },
    #[error("engine version mismatch")]
    EngineMismatch,
    #[error("config hash mismatch")]
    ConfigMismatch,
}

/// The handshake fields a participant presents in `Hello`.
#[derive(Clone, Debug)]
pub struct JoinRequest {
    pub protocol_version: u32,
    pub player_name: String,
    pub engine_version_hash: u64,
    pub config_hash: u64,
    pub session_password: Option<String>,
}

/// Relay session coordinating one shared level.
pub struct Session {
    pub name: String,
    password: Option<String>,
    host_id: RelayPlayerId,
    players: BTreeMap<RelayPlayerId, PlayerState>,
    next_player_id: u32,
    max_players: u32,

    // Turn state
    current_turn: TurnNumber,
    current_tick: u64,
    ticks_per_turn: u32,
    pending_actions: Vec<TurnAction>,

    // Replay buffer for late joiners.
    level_json: Option<String>,
    turn_log: Vec<ServerMessage>,

    // Desync detection
    checksums: BTreeMap<u64, BTreeMap<RelayPlayerId, u64>>,

    // Reference hashes, set by the first participant.
    engine_version_hash: Option<u64>,
    config_hash: Option<u64>,
}

struct PlayerState {
    name: String,
    writer: BufWriter<TcpStream>,
}

impl Session {
    pub fn new(
        name: String,
        password: Option<String>,
        ticks_per_turn: u32,
        max_players: u32,
    ) -> Self {
        Self {
            name,
            password,
            host_id: RelayPlayerId(0),
            players: BTreeMap::new(),
            next_player_id: 0,
            max_players,
            current_turn: TurnNumber(0),
            current_tick: 0,
            ticks_per_turn,
            pending_actions: Vec::new(),
            level_json: None,
            turn_log: Vec::new(),
            checksums: BTreeMap::new(),
            engine_version_hash: None,
            config_hash: None,
        }
    }

    /// Admit a participant: check the handshake, announce them to everyone
    /// else, send `Welcome`, and replay the level so far if it has started.
    ///
    /// The returned `RelayPlayerId` tags the reader thread for this
    /// connection.
    pub fn add_player(
        &mut self,
        request: JoinRequest,
        stream: TcpStream,
    ) -> Result<RelayPlayerId, JoinError> {
        self.check_join(&request)?;

        let id = RelayPlayerId(self.next_player_id);
        self.next_player_id += 1;
        if self.players.is_empty() {
            self.host_id = id;
        }

        let info = PlayerInfo {
            id,
            name: request.player_name.clone(),
        };
        self.broadcast(&ServerMessage::PlayerJoined { player: info.clone() });

        let mut players = self.player_list();
        players.push(info);
        self.players.insert(
            id,
            PlayerState {
                name: request.player_name,
                writer: BufWriter::new(stream),
            },
        );

        let welcome = ServerMessage::Welcome {
            player_id: id,
            session_name: self.name.clone(),
            players,
            ticks_per_turn: self.ticks_per_turn,
        };
        self.send_to(id, &welcome);

        if let Some(level_json) = self.level_json.clone() {
            self.send_to(id, &ServerMessage::LevelStart { level_json });
            let backlog = self.turn_log.clone();
            for turn in &backlog {
                self.send_to(id, turn);
            }
            info!(player = id.0, turns = backlog.len(), "replayed level to late joiner");
        }

        info!(player = id.0, host = (id == self.host_id), "participant joined");
        Ok(id)
    }

    fn check_join(&mut self, request: &JoinRequest) -> Result<(), JoinError> {
        if self.password.is_some() && request.session_password != self.password {
            return Err(JoinError::IncorrectPassword);
        }
        if self.players.len() >= self.max_players as usize {
            return Err(JoinError::SessionFull);
        }
        if request.protocol_version != PROTOCOL_VERSION {
            return Err(JoinError::ProtocolMismatch {
                expected: PROTOCOL_VERSION,
                found: request.protocol_version,
            });
        }
        match (self.engine_version_hash, self.config_hash) {
            (Some(engine), Some(config)) => {
                if engine != request.engine_version_hash {
                    return Err(JoinError::EngineMismatch);
                }
                if config != request.config_hash {
                    return Err(JoinError::ConfigMismatch);
                }
            }
            _ => {
                self.engine_version_hash = Some(request.engine_version_hash);
                self.config_hash = Some(request.config_hash);
            }
        }
        Ok(())
    }

    /// Remove a participant and broadcast their departure. If the host left,
    /// the lowest remaining id becomes host.
    pub fn remove_player(&mut self, player_id: RelayPlayerId) {
        let Some(ps) = self.players.remove(&player_id) else {
            return;
        };
        info!(player = player_id.0, name = %ps.name, "participant left");
        self.broadcast(&ServerMessage::PlayerLeft {
            player_id,
            name: ps.name,
        });

        for tick_checksums in self.checksums.values_mut() {
            tick_checksums.remove(&player_id);
        }

        if player_id != self.host_id {
            return;
        }
        let Some(next) = self.players.keys().next().copied() else {
            return;
        };
        self.host_id = next;
        info!(player = next.0, "host handed over");
    }

    /// Queue an action for the next turn.
    pub fn enqueue_action(&mut self, action: TurnAction) {
        self.pending_actions.push(action);
    }

    /// Flush pending actions into a turn and broadcast it. Advances the tick
    /// target by `ticks_per_turn`. No-op until the level has started.
    pub fn flush_turn(&mut self) {
        if !self.is_level_started() {
            return;
        }
        self.current_tick += u64::from(self.ticks_per_turn);
        self.current_turn = TurnNumber(self.current_turn.0 + 1);

        self.pending_actions
            .sort_by_key(|action| (action.player_id, action.sequence));
        let actions = std::mem::take(&mut self.pending_actions);
        if !actions.is_empty() {
            debug!(
                turn = self.current_turn.0,
                tick_target = self.current_tick,
                actions = actions.len(),
                "flushing turn"
            );
        }

        let turn = ServerMessage::Turn {
            turn_number: self.current_turn,
            tick_target: self.current_tick,
            actions,
        };
        self.broadcast(&turn);
        self.log_turn(turn);
    }

    /// Append `turn` to the replay log. A run of empty turns collapses into
    /// its latest entry: replaying only the last tick target of the run puts a
    /// late joiner at the same tick before the next busy turn.
    fn log_turn(&mut self, turn: ServerMessage) {
        if is_empty_turn(&turn) && self.turn_log.last().is_some_and(is_empty_turn) {
            self.turn_log.pop();
        }
        self.turn_log.push(turn);
    }

    /// Number of turns a late joiner would be sent after `LevelStart`.
    pub fn replay_len(&self) -> usize {
        self.turn_log.len()
    }

    /// Record a checksum. Once every connected participant has reported for
    /// `tick`, broadcasts `DesyncDetected` if they disagree.
    pub fn record_checksum(&mut self, player_id: RelayPlayerId, tick: u64, hash: u64) {
        let tick_entry = self.checksums.entry(tick).or_default();
        tick_entry.insert(player_id, hash);

        if tick_entry.len() < self.players.len() || self.players.len() < 2 {
            return;
        }
        let mut values = tick_entry.values();
        let all_match = match values.next() {
            Some(first) => values.all(|v| v == first),
            None => true,
        };
        if !all_match {
            warn!(tick, "desync detected");
            self.broadcast(&ServerMessage::DesyncDetected { tick });
        }
        self.checksums.retain(|t, _| *t > tick);
    }

    /// Handle `StartLevel`. Only the host can start, and only once.
    pub fn start_level(&mut self, player_id: RelayPlayerId, level_json: String) {
        if player_id != self.host_id || self.level_json.is_some() {
            debug!(player = player_id.0, "ignoring StartLevel");
            return;
        }
        info!(player = player_id.0, bytes = level_json.len(), "level started");
        self.level_json = Some(level_json.clone());
        self.broadcast(&ServerMessage::LevelStart { level_json });
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn host_id(&self) -> RelayPlayerId {
        self.host_id
    }

    pub fn ticks_per_turn(&self) -> u32 {
        self.ticks_per_turn
    }

    /// The tick target of the most recent turn.
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn current_turn(&self) -> TurnNumber {
        self.current_turn
    }

    pub fn is_level_started(&self) -> bool {
        self.level_json.is_some()
    }

    pub fn player_list(&self) -> Vec<PlayerInfo> {
        self.players
            .iter()
            .map(|(pid, ps)| PlayerInfo {
                id: *pid,
                name: ps.name.clone(),
            })
            .collect()
    }

    fn send_to(&mut self, player_id: RelayPlayerId, msg: &ServerMessage) {
        let Some(ps) = self.players.get_mut(&player_id) else {
            return;
        };
        if let Err(err) = write_json(&mut ps.writer, msg) {
            warn!(player = player_id.0, %err, "write to participant failed");
        }
    }

    fn broadcast(&mut self, msg: &ServerMessage) {
        let ids: Vec<RelayPlayerId> = self.players.keys().copied().collect();
        for id in ids {
            self.send_to(id, msg);
        }
    }
}

fn is_empty_turn(msg: &ServerMessage) -> bool {
    matches!(msg, ServerMessage::Turn { actions, .. } if actions.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::net::TcpListener;

    use cubebot_protocol::framing::read_json;
    use cubebot_protocol::types::ActionSequence;

    use super::*;

    /// Create a TCP pair: (client_stream, server_stream) on localhost.
    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn recv(stream: &mut BufReader<TcpStream>) -> ServerMessage {
        read_json(stream).unwrap()
    }

    fn hello(name: &str) -> JoinRequest {
        JoinRequest {
            protocol_version: PROTOCOL_VERSION,
            player_name: name.into(),
            engine_version_hash: 100,
            config_hash: 200,
            session_password: None,
        }
    }

    fn action(player: u32, sequence: u64, payload: &[u8]) -> TurnAction {
        TurnAction {
            player_id: RelayPlayerId(player),
            sequence: ActionSequence(sequence),
            payload: payload.to_vec(),
        }
    }

    /// A session with Alice (host) and Bob joined. Returns their readers with
    /// the join chatter already drained.
    fn two_player_session() -> (Session, BufReader<TcpStream>, BufReader<TcpStream>) {
        let (client1, server1) = tcp_pair();
        let (client2, server2) = tcp_pair();
        let mut session = Session::new("test".into(), None, 50, 4);
        session.add_player(hello("Alice"), server1).unwrap();
        session.add_player(hello("Bob"), server2).unwrap();

        let mut alice = BufReader::new(client1);
        let mut bob = BufReader::new(client2);
        assert!(matches!(recv(&mut alice), ServerMessage::Welcome { .. }));
        assert!(matches!(recv(&mut alice), ServerMessage::PlayerJoined { .. }));
        assert!(matches!(recv(&mut bob), ServerMessage::Welcome { .. }));
        (session, alice, bob)
    }

    #[test]
    fn add_player_sends_welcome() {
        let (client, server) = tcp_pair();
        let mut session = Session::new("test".into(), None, 50, 4);

        let id = session.add_player(hello("Alice"), server).unwrap();
        assert_eq!(id, RelayPlayerId(0));
        assert_eq!(session.host_id(), id);

        let mut reader = BufReader::new(client);
        match recv(&mut reader) {
            ServerMessage::Welcome {
                player_id,
                session_name,
                players,
                ticks_per_turn,
            } => {
                assert_eq!(player_id, RelayPlayerId(0));
                assert_eq!(session_name, "test");
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].name, "Alice");
                assert_eq!(ticks_per_turn, 50);
            }
            other => panic!("expected Welcome, got {other:?}"),
        }
    }

    #[test]
    fn password_is_checked() {
        let mut session = Session::new("test".into(), Some("secret".into()), 50, 4);

        let (_c1, s1) = tcp_pair();
        let mut wrong = hello("Mallory");
        wrong.session_password = Some("wrong".into());
        assert_eq!(
            session.add_player(wrong, s1),
            Err(JoinError::IncorrectPassword)
        );

        let (_c2, s2) = tcp_pair();
        let mut right = hello("Alice");
        right.session_password = Some("secret".into());
        assert!(session.add_player(right, s2).is_ok());
    }

    #[test]
    fn full_session_rejected() {
        let mut session = Session::new("test".into(), None, 50, 1);
        let (_c1, s1) = tcp_pair();
        let (_c2, s2) = tcp_pair();
        session.add_player(hello("Alice"), s1).unwrap();
        assert_eq!(
            session.add_player(hello("Bob"), s2),
            Err(JoinError::SessionFull)
        );
    }

    #[test]
    fn mismatched_versions_rejected() {
        let mut session = Session::new("test".into(), None, 50, 4);
        let (_c1, s1) = tcp_pair();
        session.add_player(hello("Alice"), s1).unwrap();

        let (_c2, s2) = tcp_pair();
        let mut old_protocol = hello("Bob");
        old_protocol.protocol_version = PROTOCOL_VERSION + 1;
        assert!(matches!(
            session.add_player(old_protocol, s2),
            Err(JoinError::ProtocolMismatch { .. })
        ));

        let (_c3, s3) = tcp_pair();
        let mut other_engine = hello("Carol");
        other_engine.engine_version_hash = 999;
        assert_eq!(
            session.add_player(other_engine, s3),
            Err(JoinError::EngineMismatch)
        );

        let (_c4, s4) = tcp_pair();
        let mut other_level = hello("Dave");
        other_level.config_hash = 999;
        assert_eq!(
            session.add_player(other_level, s4),
            Err(JoinError::ConfigMismatch)
        );
        assert_eq!(session.player_count(), 1);
    }

    #[test]
    fn second_join_announced_to_first() {
        let (client1, server1) = tcp_pair();
        let (client2, server2) = tcp_pair();
        let mut session = Session::new("test".into(), None, 50, 4);
        session.add_player(hello("Alice"), server1).unwrap();
        session.add_player(hello("Bob"), server2).unwrap();

        let mut alice = BufReader::new(client1);
        let _welcome = recv(&mut alice);
        match recv(&mut alice) {
            ServerMessage::PlayerJoined { player } => {
                assert_eq!(player.id, RelayPlayerId(1));
                assert_eq!(player.name, "Bob");
            }
            other => panic!("expected PlayerJoined, got {other:?}"),
        }

        let mut bob = BufReader::new(client2);
        match recv(&mut bob) {
            ServerMessage::Welcome { players, .. } => assert_eq!(players.len(), 2),
            other => panic!("expected Welcome, got {other:?}"),
        }
    }

    #[test]
    fn leaving_host_hands_over() {
        let (mut session, _alice, mut bob) = two_player_session();
        session.remove_player(RelayPlayerId(0));

        match recv(&mut bob) {
            ServerMessage::PlayerLeft { player_id, name } => {
                assert_eq!(player_id, RelayPlayerId(0));
                assert_eq!(name, "Alice");
            }
            other => panic!("expected PlayerLeft, got {other:?}"),
        }
        assert_eq!(session.player_count(), 1);
        assert_eq!(session.host_id(), RelayPlayerId(1));

        // Bob can now start the level.
        session.start_level(RelayPlayerId(1), "{}".into());
        assert!(session.is_level_started());
    }

    #[test]
    fn turns_wait_for_level_start() {
        let (mut session, mut alice, _bob) = two_player_session();
        session.enqueue_action(action(0, 0, &[1, 2, 3]));
        session.flush_turn();
        assert_eq!(session.current_tick(), 0);
        assert_eq!(session.current_turn(), TurnNumber(0));

        // Only a host start enables flushing; the queued action survives.
        session.start_level(RelayPlayerId(1), "{}".into());
        assert!(!session.is_level_started());
        session.start_level(RelayPlayerId(0), "{}".into());
        session.flush_turn();

        assert!(matches!(recv(&mut alice), ServerMessage::LevelStart { .. }));
        match recv(&mut alice) {
            ServerMessage::Turn {
                turn_number,
                tick_target,
                actions,
            } => {
                assert_eq!(turn_number, TurnNumber(1));
                assert_eq!(tick_target, 50);
                assert_eq!(actions.len(), 1);
                assert_eq!(actions[0].payload, vec![1, 2, 3]);
            }
            other => panic!("expected Turn, got {other:?}"),
        }
    }

    #[test]
    fn level_starts_only_once() {
        let (mut session, mut alice, _bob) = two_player_session();
        session.start_level(RelayPlayerId(0), "first".into());
        session.start_level(RelayPlayerId(0), "second".into());
        session.flush_turn();

        match recv(&mut alice) {
            ServerMessage::LevelStart { level_json } => assert_eq!(level_json, "first"),
            other => panic!("expected LevelStart, got {other:?}"),
        }
        assert!(matches!(recv(&mut alice), ServerMessage::Turn { .. }));
    }

    #[test]
    fn actions_sorted_canonically() {
        let (mut session, _alice, mut bob) = two_player_session();
        session.start_level(RelayPlayerId(0), "{}".into());

        session.enqueue_action(action(1, 0, &[30]));
        session.enqueue_action(action(0, 1, &[12]));
        session.enqueue_action(action(0, 0, &[11]));
        session.flush_turn();

        let _level = recv(&mut bob);
        match recv(&mut bob) {
            ServerMessage::Turn { actions, .. } => {
                let order: Vec<(u32, u64)> = actions
                    .iter()
                    .map(|a| (a.player_id.0, a.sequence.0))
                    .collect();
                assert_eq!(order, vec![(0, 0), (0, 1), (1, 0)]);
            }
            other => panic!("expected Turn, got {other:?}"),
        }
    }

    #[test]
    fn late_joiner_gets_level_and_every_turn() {
        let (mut session, _alice, _bob) = two_player_session();
        session.start_level(RelayPlayerId(0), "level".into());
        session.enqueue_action(action(0, 0, &[7]));
        session.flush_turn();
        session.flush_turn();
        session.enqueue_action(action(1, 0, &[8]));
        session.flush_turn();

        let (client3, server3) = tcp_pair();
        let id = session.add_player(hello("Carol"), server3).unwrap();
        assert_eq!(id, RelayPlayerId(2));

        let mut carol = BufReader::new(client3);
        assert!(matches!(recv(&mut carol), ServerMessage::Welcome { .. }));
        match recv(&mut carol) {
            ServerMessage::LevelStart { level_json } => assert_eq!(level_json, "level"),
            other => panic!("expected LevelStart, got {other:?}"),
        }
        let mut targets = Vec::new();
        for _ in 0..3 {
            match recv(&mut carol) {
                ServerMessage::Turn { tick_target, .. } => targets.push(tick_target),
                other => panic!("expected Turn, got {other:?}"),
            }
        }
        assert_eq!(targets, vec![50, 100, 150]);

        // Live turns continue where the replay stopped.
        session.flush_turn();
        match recv(&mut carol) {
            ServerMessage::Turn { turn_number, .. } => assert_eq!(turn_number, TurnNumber(4)),
            other => panic!("expected Turn, got {other:?}"),
        }
    }

    #[test]
    fn idle_turns_do_not_grow_the_replay_log() {
        // An hour of 50 ms turns with one action in the middle.
        let mut session = Session::new("test".into(), None, 50, 4);
        session.start_level(RelayPlayerId(0), "level".into());
        for _ in 0..72_000 {
            session.flush_turn();
        }
        session.enqueue_action(action(0, 0, &[1]));
        session.flush_turn();
        for _ in 0..100 {
            session.flush_turn();
        }
        assert_eq!(session.replay_len(), 3);

        let (client, server) = tcp_pair();
        session.add_player(hello("Carol"), server).unwrap();
        let mut carol = BufReader::new(client);
        assert!(matches!(recv(&mut carol), ServerMessage::Welcome { .. }));
        assert!(matches!(recv(&mut carol), ServerMessage::LevelStart { .. }));

        let mut replayed = Vec::new();
        for _ in 0..3 {
            match recv(&mut carol) {
                ServerMessage::Turn {
                    turn_number,
                    tick_target,
                    actions,
                } => replayed.push((turn_number.0, tick_target, actions.len())),
                other => panic!("expected Turn, got {other:?}"),
            }
        }
        // The action still lands at tick 3_600_000, as it did live.
        assert_eq!(
            replayed,
            vec![
                (72_000, 3_600_000, 0),
                (72_001, 3_600_050, 1),
                (72_101, 3_605_050, 0),
            ]
        );
    }

    #[test]
    fn matching_checksums_are_quiet() {
        let (mut session, mut alice, _bob) = two_player_session();
        session.record_checksum(RelayPlayerId(0), 1000, 0xABCD);
        session.record_checksum(RelayPlayerId(1), 1000, 0xABCD);

        // The next message Alice sees is the level start, not a desync.
        session.start_level(RelayPlayerId(0), "{}".into());
        assert!(matches!(recv(&mut alice), ServerMessage::LevelStart { .. }));
    }

    #[test]
    fn mismatching_checksums_broadcast_desync() {
        let (mut session, mut alice, mut bob) = two_player_session();
        session.record_checksum(RelayPlayerId(0), 1000, 0xABCD);
        session.record_checksum(RelayPlayerId(1), 1000, 0xDEAD);

        for reader in [&mut alice, &mut bob] {
            match recv(reader) {
                ServerMessage::DesyncDetected { tick } => assert_eq!(tick, 1000),
                other => panic!("expected DesyncDetected, got {other:?}"),
            }
        }
    }

    #[test]
    fn departed_participant_does_not_block_comparison() {
        let (client3, server3) = tcp_pair();
        let (mut session, mut alice, _bob) = two_player_session();
        session.add_player(hello("Carol"), server3).unwrap();
        let _carol = BufReader::new(client3);
        let _joined = recv(&mut alice);

        session.record_checksum(RelayPlayerId(0), 500, 1);
        session.record_checksum(RelayPlayerId(1), 500, 2);
        session.remove_player(RelayPlayerId(2));
        let _left = recv(&mut alice);

        // Two of two remaining have reported; the next report settles it.
        session.record_checksum(RelayPlayerId(1), 500, 2);
        match recv(&mut alice) {
            ServerMessage::DesyncDetected { tick } => assert_eq!(tick, 500),
            other => panic!("expected DesyncDetected, got {other:?}"),
        }
    }
}
