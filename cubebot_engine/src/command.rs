// Session actions: the only way outside code changes a level session.
//
// Everything a participant does to a shared level goes through
// `SessionCommand`. The session is a pure function
// `(state, commands) -> (new_state, events)`, and commands are its input.
//
// The full flow for a player action:
//   UI button -> `LevelSession::request_*()` builds a `SessionAction` ->
//   `ActionChannel::send()` broadcasts it -> every participant receives it
//   in the same order and at the same tick -> `LevelSession::step()` applies
//   it.
//
// Current actions:
// - `Run` carries a snapshot of the cells taken when Run was pressed, so a
//   run never re-reads the editor.
// - `Reset` aborts an active run and returns the robot to its start pose.
// - `Clear` resets and then empties every cell (the terminal's Clear button).
// - `EditCell` places or removes a block in one cell.
//
// See also: `session.rs` for `apply_command()`, `channel.rs` for delivery.
//
// **Critical constraint: determinism.** Commands are the sole external input
// to the session.

use crate::cell::Cell;
use crate::types::{CellIndex, ParticipantId};
use serde::{Deserialize, Serialize};

/// A participant's action targeting a specific session tick.
///
/// Offline, `tick` is the current session tick. Networked, it is the tick
/// the relay assigned to the turn the action arrived in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCommand {
    pub participant: ParticipantId,
    pub tick: u64,
    pub action: SessionAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionAction {
    /// Compile and run the given cells.
    Run { cells: Vec<Cell> },
    Reset,
    /// Reset, then empty every cell.
    Clear,
    /// Replace the contents of one cell.
    EditCell { index: CellIndex, cell: Cell },
}

impl SessionAction {
    /// Encode for a relay `Action` payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CommandKind;

    #[test]
    fn run_action_carries_cells_through_payload() {
        let action = SessionAction::Run {
            cells: vec![
                Cell::instruction(3, CommandKind::MoveForward),
                Cell::loop_start(1, 2),
                Cell::Empty,
                Cell::loop_end(1),
            ],
        };
        let payload = action.to_payload().unwrap();
        assert_eq!(SessionAction::from_payload(&payload).unwrap(), action);
    }

    #[test]
    fn garbage_payload_is_an_error() {
        assert!(SessionAction::from_payload(b"\x00\x01nope").is_err());
    }

    #[test]
    fn command_json_shape() {
        let cmd = SessionCommand {
            participant: ParticipantId(2),
            tick: 40,
            action: SessionAction::Reset,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"participant":2,"tick":40,"action":"Reset"}"#);
    }
}
