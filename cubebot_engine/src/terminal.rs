// Cube computer terminal display.
//
// The terminal next to the program area shows how the last run went. It is
// an `Observer`: success and error notifications switch its status (an
// error also puts the message on the terminal's screen and highlights the
// offending cell), and either status reverts to neutral once
// `settle_delay_ticks` have passed. Reset reverts it straight away. A later
// success closes the error screen.
//
// The display is cosmetic. It is not part of the session checksum, and the
// session ticks it after the engine has processed the tick.

use crate::event::{Notification, Observer, SessionEvent};
use crate::types::CellIndex;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalStatus {
    #[default]
    Neutral,
    Success,
    Error,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalDisplay {
    status: TerminalStatus,
    screen_text: Option<String>,
    highlighted: Option<CellIndex>,
    revert_at: Option<u64>,
    settle_delay_ticks: u64,
}

impl TerminalDisplay {
    pub fn new(settle_delay_ticks: u64) -> Self {
        Self {
            settle_delay_ticks,
            ..Self::default()
        }
    }

    pub fn status(&self) -> TerminalStatus {
        self.status
    }

    /// Text on the error screen, if it is open.
    pub fn screen_text(&self) -> Option<&str> {
        self.screen_text.as_deref()
    }

    pub fn highlighted_cell(&self) -> Option<CellIndex> {
        self.highlighted
    }

    /// Revert to neutral once the settle delay has elapsed.
    pub fn tick(&mut self, now: u64) {
        if self.revert_at.is_some_and(|at| at <= now) {
            self.status = TerminalStatus::Neutral;
            self.revert_at = None;
        }
    }

    fn show(&mut self, status: TerminalStatus, now: u64) {
        self.status = status;
        self.revert_at = Some(now.saturating_add(self.settle_delay_ticks));
    }
}

impl Observer for TerminalDisplay {
    fn notify(&mut self, event: &SessionEvent) {
        match &event.kind {
            Notification::Success => {
                self.show(TerminalStatus::Success, event.tick);
                self.screen_text = None;
                self.highlighted = None;
            }
            Notification::Error { message, cell } => {
                self.show(TerminalStatus::Error, event.tick);
                self.screen_text = Some(message.clone());
                self.highlighted = *cell;
            }
            Notification::Reset => {
                self.status = TerminalStatus::Neutral;
                self.revert_at = None;
                self.highlighted = None;
            }
            Notification::RunStarted
            | Notification::RunFinished
            | Notification::LevelCompleted
            | Notification::CellsCleared => {}
        }
    }
}
