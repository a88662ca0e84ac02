// Ordered broadcast of session actions.
//
// A participant never applies its own actions directly. It sends them into
// an `ActionChannel`, and applies whatever the channel delivers back. Every
// participant receives the same deliveries in the same order, so their
// sessions stay identical without exchanging state.
//
// Networked play wraps a relay client (the relay batches actions into
// numbered turns, each with a tick target). Offline play uses `LocalChannel`:
// a single participant whose actions are delivered back on the next poll,
// with no tick target, so the caller decides how far to advance. The session
// code is the same in both cases.
//
// See also: `session.rs` (`LevelSession::deliver`), `command.rs` for the
// action vocabulary.

use crate::command::SessionAction;
use crate::types::ParticipantId;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to encode action: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("channel closed")]
    Closed,
    #[error("transport error: {0}")]
    Transport(String),
}

/// A batch of actions to apply together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Tick the session should advance to after applying `actions`. `None`
    /// applies them at the current tick without advancing.
    pub tick_target: Option<u64>,
    /// Actions in canonical order, tagged with who sent them.
    pub actions: Vec<(ParticipantId, SessionAction)>,
}

pub trait ActionChannel {
    /// Broadcast `action` to every participant, the sender included.
    fn send(&mut self, action: &SessionAction) -> Result<(), ChannelError>;

    /// Everything delivered since the last poll, in order.
    fn poll(&mut self) -> Vec<Delivery>;
}

/// Single-participant channel with synchronous local delivery.
#[derive(Debug, Default)]
pub struct LocalChannel {
    participant: ParticipantId,
    queue: VecDeque<SessionAction>,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl ActionChannel for LocalChannel {
    fn send(&mut self, action: &SessionAction) -> Result<(), ChannelError> {
        self.queue.push_back(action.clone());
        Ok(())
    }

    fn poll(&mut self) -> Vec<Delivery> {
        if self.queue.is_empty() {
            return Vec::new();
        }
        let participant = self.participant;
        let actions = self
            .queue
            .drain(..)
            .map(|action| (participant, action))
            .collect();
        vec![Delivery {
            tick_target: None,
            actions,
        }]
    }
}
