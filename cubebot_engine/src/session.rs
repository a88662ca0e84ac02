// Level session: the state of one loaded level and its tick loop.
//
// `LevelSession` is the single source of truth for a level instance. It is
// created when a level loads and dropped when it is torn down; there is no
// ambient global. It owns the cell editor, the robot, the run orchestrator,
// the objective set built from the level config, the observer registry, and
// the cube computer terminal (subscribed to its own registry for the
// session's lifetime).
//
// The session is a pure function `(state, commands) -> (new_state, events)`:
//
//   step(commands, target_tick):
//     loop {
//       apply every command whose tick <= now
//       if now == target_tick: break
//       now += 1
//       orchestrator.tick()   (runner -> actor -> objective)
//       terminal.tick()
//     }
//
// Each notification produced is stamped with the tick, dispatched to the
// observers, and returned in the `StepResult`. After every command and every
// tick the editor is locked if (and only if) a run is active.
//
// Participants never apply their own actions directly. `request_*()` sends
// an action into an `ActionChannel`; `deliver()` applies whatever comes back
// (offline: immediately; networked: `apply_turn_payloads()` with the turn's
// tick target). Because every participant sees the same commands at the same
// ticks, their sessions (and notification sequences) are identical, which
// `checksum()` lets them verify.
//
// See also: `orchestrator.rs` for the run state machine, `command.rs` for the
// action vocabulary, `channel.rs` for delivery, `terminal.rs` for the
// display.
//
// **Critical constraint: determinism.** Nothing here reads the clock or any
// other outside input. Ticks advance only through `step()`.

use crate::actor::{Actor, GridRobot};
use crate::cell::{Cell, CellSequence};
use crate::channel::{ActionChannel, ChannelError, Delivery};
use crate::command::{SessionAction, SessionCommand};
use crate::config::{ConfigError, LevelConfig};
use crate::event::{Notification, Observer, ObserverRegistry, SessionEvent, Subscription};
use crate::objective::{ObjectiveResult, ObjectiveSet};
use crate::orchestrator::{Orchestrator, RunState};
use crate::terminal::TerminalDisplay;
use crate::types::{CellIndex, ParticipantId, Pose};
use serde::Serialize;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};

/// Notifications produced by one `step()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepResult {
    pub events: Vec<SessionEvent>,
}

#[derive(Serialize)]
pub struct LevelSession {
    tick: u64,
    level: LevelConfig,
    cells: CellSequence,
    robot: GridRobot,
    orchestrator: Orchestrator,
    #[serde(skip)]
    objective: ObjectiveSet,
    #[serde(skip)]
    observers: ObserverRegistry,
    #[serde(skip)]
    terminal: Rc<RefCell<TerminalDisplay>>,
    #[serde(skip)]
    _terminal_subscription: Subscription,
}

impl LevelSession {
    pub fn new(level: LevelConfig) -> Self {
        let observers = ObserverRegistry::new();
        let terminal = Rc::new(RefCell::new(TerminalDisplay::new(
            level.engine.settle_delay_ticks,
        )));
        let terminal_subscription = observers.subscribe(terminal.clone());
        Self {
            tick: 0,
            cells: CellSequence::new(level.cell_count),
            robot: GridRobot::from_level(&level),
            orchestrator: Orchestrator::from_config(&level.engine),
            objective: ObjectiveSet::from_configs(&level.objectives),
            observers,
            terminal,
            _terminal_subscription: terminal_subscription,
            level,
        }
    }

    /// Load a level from its JSON config.
    pub fn from_json(level_json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(LevelConfig::from_json(level_json)?))
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn cells(&self) -> &CellSequence {
        &self.cells
    }

    pub fn robot(&self) -> &GridRobot {
        &self.robot
    }

    pub fn run_state(&self) -> RunState {
        self.orchestrator.state()
    }

    pub fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }

    pub fn result(&self) -> &ObjectiveResult {
        self.orchestrator.result()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn terminal(&self) -> Ref<'_, TerminalDisplay> {
        self.terminal.borrow()
    }

    /// Register an observer for as long as the returned guard lives.
    pub fn subscribe<O: Observer + 'static>(&self, observer: Rc<RefCell<O>>) -> Subscription {
        self.observers.subscribe(observer)
    }

    // -----------------------------------------------------------------------
    // Requests (broadcast through a channel, applied on delivery)
    // -----------------------------------------------------------------------

    /// Ask every participant to run the cells as they are right now.
    pub fn request_run(&self, channel: &mut dyn ActionChannel) -> Result<(), ChannelError> {
        channel.send(&SessionAction::Run {
            cells: self.cells.snapshot(),
        })
    }

    pub fn request_reset(&self, channel: &mut dyn ActionChannel) -> Result<(), ChannelError> {
        channel.send(&SessionAction::Reset)
    }

    pub fn request_clear(&self, channel: &mut dyn ActionChannel) -> Result<(), ChannelError> {
        channel.send(&SessionAction::Clear)
    }

    pub fn request_edit(
        &self,
        channel: &mut dyn ActionChannel,
        index: CellIndex,
        cell: Cell,
    ) -> Result<(), ChannelError> {
        channel.send(&SessionAction::EditCell { index, cell })
    }

    // -----------------------------------------------------------------------
    // Applying deliveries
    // -----------------------------------------------------------------------

    /// Apply a channel delivery at the current tick, then advance to its tick
    /// target (if it has one).
    pub fn deliver(&mut self, delivery: Delivery) -> StepResult {
        let tick = self.tick;
        let commands: Vec<SessionCommand> = delivery
            .actions
            .into_iter()
            .map(|(participant, action)| SessionCommand {
                participant,
                tick,
                action,
            })
            .collect();
        let target = delivery.tick_target.unwrap_or(tick).max(tick);
        self.step(&commands, target)
    }

    /// Apply a relay turn: decode each payload into an action at the current
    /// tick, then advance to `tick_target`. Malformed payloads are skipped.
    pub fn apply_turn_payloads(
        &mut self,
        tick_target: u64,
        payloads: &[(ParticipantId, &[u8])],
    ) -> StepResult {
        let mut actions = Vec::with_capacity(payloads.len());
        for (participant, payload) in payloads {
            match SessionAction::from_payload(payload) {
                Ok(action) => actions.push((*participant, action)),
                Err(err) => {
                    warn!(participant = participant.0, %err, "skipping malformed action payload");
                }
            }
        }
        self.deliver(Delivery {
            tick_target: Some(tick_target),
            actions,
        })
    }

    /// Advance `ticks` ticks with no new commands. Offline play only; in a
    /// networked session time advances through turns.
    pub fn advance(&mut self, ticks: u64) -> StepResult {
        let target = self.tick + ticks;
        self.step(&[], target)
    }

    /// Apply a batch of commands and advance the session to the target tick.
    ///
    /// Commands must be sorted by tick. Commands with tick > `target_tick`
    /// are ignored (caller error).
    pub fn step(&mut self, commands: &[SessionCommand], target_tick: u64) -> StepResult {
        let mut events = Vec::new();
        let mut cmd_idx = 0;

        loop {
            while let Some(cmd) = commands.get(cmd_idx).filter(|c| c.tick <= self.tick) {
                cmd_idx += 1;
                self.apply_command(cmd, &mut events);
            }
            if self.tick >= target_tick {
                break;
            }
            self.tick += 1;

            let mut out = Vec::new();
            self.orchestrator
                .tick(&mut self.robot, &self.objective, &mut out);
            self.emit(out, &mut events);
            self.terminal.borrow_mut().tick(self.tick);
        }

        StepResult { events }
    }

    fn apply_command(&mut self, cmd: &SessionCommand, events: &mut Vec<SessionEvent>) {
        debug!(
            tick = self.tick,
            participant = cmd.participant.0,
            action = ?cmd.action,
            "applying session command"
        );
        let mut out = Vec::new();
        match &cmd.action {
            SessionAction::Run { cells } => {
                self.orchestrator
                    .run(cells, &mut self.robot, &self.objective, &mut out);
            }
            SessionAction::Reset => {
                self.orchestrator.reset(&mut self.robot, &mut out);
            }
            SessionAction::Clear => {
                self.orchestrator.reset(&mut self.robot, &mut out);
                self.cells.set_locked(false);
                match self.cells.clear_all() {
                    Ok(()) => out.push(Notification::CellsCleared),
                    Err(err) => warn!(%err, "clear rejected"),
                }
            }
            SessionAction::EditCell { index, cell } => {
                if let Err(err) = self.cells.set(*index, cell.clone()) {
                    warn!(participant = cmd.participant.0, %err, "cell edit rejected");
                }
            }
        }
        self.emit(out, events);
    }

    /// Stamp, dispatch and record notifications, then sync the editor lock.
    fn emit(&mut self, kinds: Vec<Notification>, events: &mut Vec<SessionEvent>) {
        for kind in kinds {
            let event = SessionEvent {
                tick: self.tick,
                kind,
            };
            self.observers.dispatch(&event);
            events.push(event);
        }
        self.cells.set_locked(self.orchestrator.is_running());
    }

    // -----------------------------------------------------------------------
    // State comparison
    // -----------------------------------------------------------------------

    /// Serialize the observable session state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Stable hash of the observable state, for desync detection.
    pub fn checksum(&self) -> u64 {
        let json = serde_json::to_vec(self).unwrap_or_default();
        crate::digest64(&json)
    }

    /// Current robot pose, for display.
    pub fn robot_pose(&self) -> Pose {
        self.robot.pose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CommandKind;
    use crate::channel::LocalChannel;
    use crate::event::NotificationLog;
    use crate::objective::ObjectiveConfig;
    use crate::terminal::TerminalStatus;
    use crate::types::{Facing, GridPos, Pose};

    fn goal_level() -> LevelConfig {
        LevelConfig {
            objectives: vec![
                ObjectiveConfig::StayInGrid,
                ObjectiveConfig::ReachPose {
                    x: 0,
                    y: 1,
                    facing: Facing::South,
                },
            ],
            ..LevelConfig::default()
        }
    }

    fn sample_cells() -> Vec<Cell> {
        vec![
            Cell::instruction(1, CommandKind::MoveForward),
            Cell::loop_start(1, 2),
            Cell::instruction(2, CommandKind::TurnRight),
            Cell::loop_end(1),
        ]
    }

    fn pump(session: &mut LevelSession, channel: &mut LocalChannel) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for delivery in channel.poll() {
            events.extend(session.deliver(delivery).events);
        }
        events
    }

    fn place(session: &mut LevelSession, channel: &mut LocalChannel, cells: &[Cell]) {
        for (i, cell) in cells.iter().enumerate() {
            session
                .request_edit(channel, CellIndex(i), cell.clone())
                .unwrap();
        }
        pump(session, channel);
    }

    fn kinds(events: &[SessionEvent]) -> Vec<Notification> {
        events.iter().map(|e| e.kind.clone()).collect()
    }

    #[test]
    fn offline_run_reaches_goal() {
        let mut session = LevelSession::new(goal_level());
        let mut channel = LocalChannel::new();
        place(&mut session, &mut channel, &sample_cells());

        session.request_run(&mut channel).unwrap();
        let mut events = pump(&mut session, &mut channel);
        assert!(session.is_running());
        assert!(session.cells().is_locked());
        events.extend(session.advance(2_000).events);

        assert_eq!(
            kinds(&events),
            vec![
                Notification::RunStarted,
                Notification::Success,
                Notification::RunFinished,
                Notification::LevelCompleted,
            ]
        );
        assert_eq!(
            session.robot_pose(),
            Pose::new(GridPos::new(0, 1), Facing::South)
        );
        assert_eq!(session.orchestrator().history().len(), 3);
        assert!(!session.cells().is_locked());
        assert_eq!(session.terminal().status(), TerminalStatus::Success);

        session.advance(session.level().engine.settle_delay_ticks);
        assert_eq!(session.terminal().status(), TerminalStatus::Neutral);
    }

    #[test]
    fn run_uses_snapshot_taken_at_request() {
        let mut session = LevelSession::new(goal_level());
        let mut channel = LocalChannel::new();
        place(&mut session, &mut channel, &sample_cells());

        session.request_run(&mut channel).unwrap();
        // Queued after the run request: arrives while running and is refused.
        session
            .request_edit(&mut channel, CellIndex(0), Cell::Empty)
            .unwrap();
        pump(&mut session, &mut channel);

        assert_eq!(
            session.cells().get(CellIndex(0)),
            Some(&Cell::instruction(1, CommandKind::MoveForward))
        );
        session.advance(2_000);
        assert_eq!(session.result(), &ObjectiveResult::Success);
    }

    #[test]
    fn compile_error_highlights_cell_on_terminal() {
        let mut session = LevelSession::new(goal_level());
        let mut channel = LocalChannel::new();
        place(&mut session, &mut channel, &[Cell::Empty, Cell::loop_end(3)]);

        session.request_run(&mut channel).unwrap();
        let events = pump(&mut session, &mut channel);
        assert_eq!(
            kinds(&events),
            vec![Notification::Error {
                message: "unmatched loop end".into(),
                cell: Some(CellIndex(1)),
            }]
        );
        assert_eq!(session.run_state(), RunState::Idle);
        assert_eq!(session.terminal().highlighted_cell(), Some(CellIndex(1)));
        assert_eq!(session.terminal().screen_text(), Some("unmatched loop end"));
    }

    #[test]
    fn clear_mid_run_resets_and_empties() {
        let mut session = LevelSession::new(goal_level());
        let mut channel = LocalChannel::new();
        place(&mut session, &mut channel, &sample_cells());
        session.request_run(&mut channel).unwrap();
        pump(&mut session, &mut channel);
        session.advance(500);
        assert_ne!(session.robot_pose(), session.robot().baseline());

        session.request_clear(&mut channel).unwrap();
        let events = pump(&mut session, &mut channel);
        assert_eq!(
            kinds(&events),
            vec![Notification::Reset, Notification::CellsCleared]
        );
        assert!(session.cells().cells().iter().all(Cell::is_empty));
        assert_eq!(session.robot_pose(), session.robot().baseline());
        assert!(!session.is_running());
    }

    #[test]
    fn robot_leaving_grid_is_an_error_at_that_cell() {
        let mut session = LevelSession::new(goal_level());
        let mut channel = LocalChannel::new();
        place(
            &mut session,
            &mut channel,
            &[
                Cell::instruction(1, CommandKind::TurnLeft),
                Cell::instruction(2, CommandKind::MoveForward),
                Cell::instruction(3, CommandKind::MoveForward),
            ],
        );
        session.request_run(&mut channel).unwrap();
        let mut events = pump(&mut session, &mut channel);
        events.extend(session.advance(3_000).events);
        assert_eq!(
            kinds(&events),
            vec![
                Notification::RunStarted,
                Notification::Error {
                    message: "robot left the grid".into(),
                    cell: Some(CellIndex(1)),
                },
            ]
        );
        assert_eq!(session.orchestrator().history().len(), 2);
    }

    #[test]
    fn identical_commands_give_identical_sessions() {
        let commands = vec![
            SessionCommand {
                participant: ParticipantId(1),
                tick: 0,
                action: SessionAction::EditCell {
                    index: CellIndex(0),
                    cell: Cell::instruction(1, CommandKind::MoveForward),
                },
            },
            SessionCommand {
                participant: ParticipantId(2),
                tick: 10,
                action: SessionAction::Run {
                    cells: sample_cells(),
                },
            },
            SessionCommand {
                participant: ParticipantId(1),
                tick: 300,
                action: SessionAction::Reset,
            },
            SessionCommand {
                participant: ParticipantId(2),
                tick: 400,
                action: SessionAction::Run {
                    cells: sample_cells(),
                },
            },
        ];
        let mut a = LevelSession::new(goal_level());
        let mut b = LevelSession::new(goal_level());
        let ra = a.step(&commands, 3_000);
        let rb = b.step(&commands, 3_000);

        assert_eq!(ra, rb);
        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(ra.events.first().map(|e| e.tick), Some(10));
        assert!(ra.events.iter().any(|e| e.kind == Notification::Reset && e.tick == 300));
        assert_eq!(
            ra.events.last().map(|e| &e.kind),
            Some(&Notification::LevelCompleted)
        );
    }

    #[test]
    fn turn_payloads_skip_garbage() {
        let mut session = LevelSession::new(goal_level());
        let run = SessionAction::Run {
            cells: sample_cells(),
        }
        .to_payload()
        .unwrap();
        let result = session.apply_turn_payloads(
            50,
            &[
                (ParticipantId(1), b"not json".as_slice()),
                (ParticipantId(2), run.as_slice()),
            ],
        );
        assert_eq!(session.tick(), 50);
        assert_eq!(kinds(&result.events), vec![Notification::RunStarted]);
        assert!(session.is_running());
    }

    #[test]
    fn observers_receive_until_unsubscribed() {
        let mut session = LevelSession::new(goal_level());
        let log = Rc::new(RefCell::new(NotificationLog::default()));
        let subscription = session.subscribe(log.clone());

        let run = |tick| SessionCommand {
            participant: ParticipantId(0),
            tick,
            action: SessionAction::Run {
                cells: sample_cells(),
            },
        };
        session.step(&[run(0)], 2_000);
        assert_eq!(log.borrow().events.len(), 4);

        drop(subscription);
        let now = session.tick();
        session.step(&[run(now)], now + 2_000);
        assert_eq!(log.borrow().events.len(), 4);
    }

    #[test]
    fn checksum_changes_with_state() {
        let mut session = LevelSession::new(goal_level());
        let before = session.checksum();
        session.advance(1);
        assert_ne!(before, session.checksum());
    }
}
