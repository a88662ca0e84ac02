// Core ID types for the session protocol.
//
// Lightweight newtypes used by both `message.rs` and the relay's session
// bookkeeping (`cubebot_relay::session`). They are relay-scoped: the relay
// assigns compact integer IDs to participants and turns. The engine mirrors
// `RelayPlayerId` as its own `ParticipantId`.

use serde::{Deserialize, Serialize};

/// Relay-assigned participant ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelayPlayerId(pub u32);

/// Monotonically increasing turn number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnNumber(pub u64);

/// Per-participant monotonic action sequence number, preserving local ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionSequence(pub u64);
