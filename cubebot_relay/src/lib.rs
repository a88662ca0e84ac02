// cubebot_relay: ordered broadcast relay for shared cube computer sessions.
//
// The relay is a thin message broker: it accepts TCP connections from
// participants, collects their session actions, batches them into numbered
// turns at a fixed cadence, and broadcasts each turn to every participant
// (the sender included). It never runs the engine; every participant runs
// its own `LevelSession` and stays in step because all of them apply the
// same turns in the same order.
//
// Module overview:
// - `session.rs`:  Session state: participant roster, handshake checks,
//                  turn batching, replay log for late joiners,
//                  checksum-based desync detection.
// - `server.rs`:   TCP listener, reader threads (one per participant), and
//                  the main event loop funnelling events into `Session`.
// - `client.rs`:   `NetClient`, the participant side of the protocol.
// - `channel.rs`:  `RelayChannel`, the engine's `ActionChannel` over a
//                  `NetClient` (feature `engine`).
//
// Dependencies: `cubebot_protocol` (shared message types and framing). The
// engine crate is only pulled in by the `engine` feature; the relay binary
// never needs it.
//
// The relay runs as a standalone binary (`main.rs`) or embedded in-process
// via `start_relay` (the integration tests do this).

#[cfg(feature = "engine")]
pub mod channel;
pub mod client;
pub mod server;
pub mod session;

#[cfg(feature = "engine")]
pub use channel::RelayChannel;
pub use client::{ClientError, NetClient, WelcomeInfo};
pub use server::{RelayConfig, RelayHandle, start_relay};
