// cubebot_protocol: wire protocol for the session relay.
//
// This crate defines the message types, framing, and serialization used by
// the relay (`cubebot_relay`) and participants to communicate over TCP. It is
// shared between both sides and has no dependency on the engine crate.
//
// Module overview:
// - `types.rs`:    Core ID types: `RelayPlayerId`, `TurnNumber`, `ActionSequence`.
// - `message.rs`:  Participant-to-relay and relay-to-participant message enums,
//                  plus supporting structs (`TurnAction`, `PlayerInfo`).
// - `framing.rs`:  Length-delimited framing over any `Read`/`Write` stream:
//                  4-byte big-endian length prefix, then JSON payload.
//
// Design decisions:
// - **JSON serialization.** Matches the engine's serde_json usage.
// - **Actions as opaque `Vec<u8>`.** The relay never inspects action payloads.
// - **No async runtime.** Framing uses `std::io::Read`/`Write`, compatible
//   with blocking TCP streams and buffered wrappers.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{FrameError, MAX_MESSAGE_SIZE, read_json, read_message, write_json, write_message};
pub use message::{ClientMessage, PlayerInfo, ServerMessage, TurnAction};
pub use types::{ActionSequence, RelayPlayerId, TurnNumber};

/// Bumped whenever a message changes shape. The relay rejects participants
/// speaking a different version.
pub const PROTOCOL_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn through_the_wire<T>(msg: &T) -> T
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let mut wire = Vec::new();
        write_json(&mut wire, msg).unwrap();
        let mut cursor = Cursor::new(&wire);
        read_json(&mut cursor).unwrap()
    }

    #[test]
    fn hello_keeps_optional_password() {
        for password in [None, Some("secret".to_string())] {
            let hello = ClientMessage::Hello {
                protocol_version: PROTOCOL_VERSION,
                player_name: "Ada".into(),
                engine_version_hash: 0xDEAD_BEEF,
                config_hash: 0xCAFE_BABE,
                session_password: password,
            };
            assert_eq!(through_the_wire(&hello), hello);
        }
    }

    #[test]
    fn turn_preserves_action_order_and_payloads() {
        let turn = ServerMessage::Turn {
            turn_number: TurnNumber(10),
            tick_target: 500,
            actions: vec![
                TurnAction {
                    player_id: RelayPlayerId(0),
                    sequence: ActionSequence(1),
                    payload: br#"{"Run":{"cells":[]}}"#.to_vec(),
                },
                TurnAction {
                    player_id: RelayPlayerId(1),
                    sequence: ActionSequence(0),
                    payload: b"\"Reset\"".to_vec(),
                },
            ],
        };
        assert_eq!(through_the_wire(&turn), turn);
    }

    #[test]
    fn level_start_carries_config_verbatim() {
        let json = r#"{"name":"corridor","cell_count":8,"grid_size":5}"#;
        let msg = ServerMessage::LevelStart {
            level_json: json.into(),
        };
        match through_the_wire(&msg) {
            ServerMessage::LevelStart { level_json } => assert_eq!(level_json, json),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unit_variants_are_plain_strings() {
        let json = serde_json::to_string(&ClientMessage::Goodbye).unwrap();
        assert_eq!(json, r#""Goodbye""#);
    }
}
