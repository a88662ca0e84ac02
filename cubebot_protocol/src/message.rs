// Protocol messages for participant-relay communication.
//
// Two enums define the full protocol vocabulary:
// - `ClientMessage`: sent by participants to the relay.
// - `ServerMessage`: sent by the relay to participants.
//
// Supporting structs (`TurnAction`, `PlayerInfo`) are shared by both
// directions. All types derive `Serialize`/`Deserialize` for JSON framing
// (see `framing.rs`).
//
// Session actions are opaque byte payloads (`Vec<u8>`); the relay never
// inspects them. This keeps the protocol crate independent of the engine
// crate. A participant serializes a `SessionAction` into bytes before sending
// and deserializes it when the turn comes back.

use serde::{Deserialize, Serialize};

use crate::types::{ActionSequence, RelayPlayerId, TurnNumber};

/// Messages sent by a participant to the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Join a session (handshake).
    Hello {
        protocol_version: u32,
        player_name: String,
        engine_version_hash: u64,
        config_hash: u64,
        session_password: Option<String>,
    },
    /// A session action (opaque payload).
    Action {
        sequence: ActionSequence,
        payload: Vec<u8>,
    },
    /// Periodic state checksum for desync detection.
    Checksum { tick: u64, hash: u64 },
    /// Host loads a level for everyone (lobby -> playing transition).
    StartLevel { level_json: String },
    /// Participant is leaving gracefully.
    Goodbye,
}

/// Messages sent by the relay to a participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Handshake accepted.
    Welcome {
        player_id: RelayPlayerId,
        session_name: String,
        players: Vec<PlayerInfo>,
        ticks_per_turn: u32,
    },
    /// Handshake rejected.
    Rejected { reason: String },
    /// A batch of actions for one turn. Apply `actions` in order, then
    /// advance the session to `tick_target`.
    Turn {
        turn_number: TurnNumber,
        tick_target: u64,
        actions: Vec<TurnAction>,
    },
    /// A participant connected.
    PlayerJoined { player: PlayerInfo },
    /// A participant disconnected.
    PlayerLeft {
        player_id: RelayPlayerId,
        name: String,
    },
    /// Participants reported different checksums for the same tick.
    DesyncDetected { tick: u64 },
    /// Level is loading: every participant builds a session from this config.
    LevelStart { level_json: String },
}

/// A single action within a turn, tagged with the originating participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnAction {
    pub player_id: RelayPlayerId,
    pub sequence: ActionSequence,
    pub payload: Vec<u8>,
}

/// Public identity of a connected participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: RelayPlayerId,
    pub name: String,
}
