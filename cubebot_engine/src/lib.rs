// cubebot_engine: pure Rust engine for the cube computer puzzle.
//
// Players place instruction blocks ("cubes") and loop wrappers into the
// cells of a program area. This crate compiles that arrangement into a flat,
// loop-resolved program, runs it one instruction at a time against a robot
// on a grid, checks the level objective after every instruction, and drives
// the whole thing from a deterministic tick loop that every participant in a
// shared session runs identically. It has no networking; the relay crate
// carries session actions between participants.
//
// Module overview:
// - `session.rs`:      LevelSession: level state, tick loop, command application.
// - `orchestrator.rs`: Run/Reset state machine, objective verdict handling.
// - `compiler.rs`:     Cells -> CompiledProgram, structural error detection.
// - `runner.rs`:       Stepwise interpreter with explicit suspend/resume state.
// - `actor.rs`:        Actor trait + GridRobot.
// - `objective.rs`:    Objective trait, ObjectiveResult, built-in objectives.
// - `cell.rs`:         Cell / Block / ActorCommand model + CellSequence editor.
// - `command.rs`:      SessionCommand / SessionAction, all session mutations.
// - `channel.rs`:      ActionChannel trait + LocalChannel for offline play.
// - `event.rs`:        Lifecycle notifications, observers, scoped subscriptions.
// - `terminal.rs`:     Cube computer terminal display (an observer).
// - `config.rs`:       EngineConfig + LevelConfig, all tunable parameters.
// - `types.rs`:        CellIndex, BlockId, LoopId, ParticipantId, grid geometry.
//
// **Critical constraint: determinism.** The session is a pure function:
// `(state, commands) -> (new_state, events)`. No `HashMap`, no system time,
// no randomness. Use `BTreeMap` for ordered collections.

pub mod actor;
pub mod cell;
pub mod channel;
pub mod command;
pub mod compiler;
pub mod config;
pub mod event;
pub mod objective;
pub mod orchestrator;
pub mod runner;
pub mod session;
pub mod terminal;
pub mod types;

use sha2::{Digest, Sha256};

/// Hash identifying this engine build. Participants running different
/// engines would diverge, so the relay rejects mismatched hashes.
pub fn engine_version_hash() -> u64 {
    digest64(concat!(env!("CARGO_PKG_NAME"), "@", env!("CARGO_PKG_VERSION")).as_bytes())
}

/// First 8 bytes of the SHA-256 of `bytes`.
pub(crate) fn digest64(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        assert_eq!(digest64(b"cube"), digest64(b"cube"));
        assert_ne!(digest64(b"cube"), digest64(b"cubes"));
        assert_ne!(engine_version_hash(), 0);
    }
}
