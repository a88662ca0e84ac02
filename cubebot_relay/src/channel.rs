// `ActionChannel` over a relay connection (feature `engine`).
//
// Bridges the engine's ordered-broadcast seam to `NetClient`: `send` encodes
// a `SessionAction` as a JSON payload and sends it as a relay `Action`;
// `poll` turns each relay `Turn` into a `Delivery` with the turn's tick
// target. Every other relay message (joins, leaves, level start, desyncs) is
// kept for the caller in arrival order.
//
// See also: `client.rs` for the connection, `cubebot_engine::channel` for
// the trait and the offline `LocalChannel`.

use cubebot_engine::channel::{ActionChannel, ChannelError, Delivery};
use cubebot_engine::command::SessionAction;
use cubebot_engine::types::ParticipantId;
use cubebot_protocol::message::ServerMessage;
use tracing::warn;

use crate::client::NetClient;

pub struct RelayChannel {
    client: NetClient,
    control: Vec<ServerMessage>,
}

impl RelayChannel {
    pub fn new(client: NetClient) -> Self {
        Self {
            client,
            control: Vec::new(),
        }
    }

    pub fn client(&self) -> &NetClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut NetClient {
        &mut self.client
    }

    /// Non-turn messages received so far, oldest first.
    pub fn take_control(&mut self) -> Vec<ServerMessage> {
        std::mem::take(&mut self.control)
    }
}

impl ActionChannel for RelayChannel {
    fn send(&mut self, action: &SessionAction) -> Result<(), ChannelError> {
        let payload = action.to_payload()?;
        self.client
            .send_action(&payload)
            .map_err(|err| ChannelError::Transport(err.to_string()))
    }

    fn poll(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        for msg in self.client.poll() {
            let ServerMessage::Turn {
                tick_target,
                actions,
                ..
            } = msg
            else {
                self.control.push(msg);
                continue;
            };
            let mut decoded = Vec::with_capacity(actions.len());
            for action in actions {
                match SessionAction::from_payload(&action.payload) {
                    Ok(a) => decoded.push((ParticipantId(action.player_id.0), a)),
                    Err(err) => warn!(player = action.player_id.0, %err, "skipping bad payload"),
                }
            }
            deliveries.push(Delivery {
                tick_target: Some(tick_target),
                actions: decoded,
            });
        }
        deliveries
    }
}
