// The actor seam and the grid robot.
//
// The runner never looks inside the thing it commands. It calls
// `Actor::issue` with an `ActorCommand` and then polls once per tick until
// the actor reports `CommandStatus::Complete`. The actor alone decides how
// long a command takes, so movement and animation stay authoritative over
// timing.
//
// `GridRobot` is the concrete actor used by levels: a robot on a square
// grid with a pose, a baseline pose restored by `reset()`, and per-command
// durations from `RobotConfig`. A command's effect is computed when it is
// issued and applied when it completes, so the pose only ever changes at a
// completion boundary. Moving off the grid leaves the robot where it is and
// marks the effect `blocked`; whether that is a failure is up to the
// objective.
//
// See also: `runner.rs` (the only caller of `issue`/`poll`), `config.rs` for
// `RobotConfig`.

use crate::cell::{ActorCommand, CommandKind};
use crate::config::{LevelConfig, RobotConfig};
use crate::types::Pose;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a completed command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEffect {
    /// Pose after the command.
    pub pose: Pose,
    /// The command could not be carried out (e.g. a move off the grid).
    pub blocked: bool,
}

/// Result of polling the actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStatus {
    /// Nothing was issued.
    Idle,
    InProgress,
    Complete(CommandEffect),
}

/// The command interface the runner drives.
pub trait Actor {
    /// Begin carrying out `command`. Any command still in flight is dropped.
    fn issue(&mut self, command: &ActorCommand);

    /// Advance one tick and report on the command in flight.
    fn poll(&mut self) -> CommandStatus;

    fn pose(&self) -> Pose;

    /// Abandon any command in flight and return to the pre-run baseline.
    fn reset(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PendingCommand {
    command: ActorCommand,
    remaining_ticks: u32,
    effect: CommandEffect,
}

/// A robot on a `grid_size` x `grid_size` grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRobot {
    pose: Pose,
    baseline: Pose,
    grid_size: i32,
    timing: RobotConfig,
    pending: Option<PendingCommand>,
    /// Payloads of completed interact commands, in order.
    interactions: Vec<Vec<u8>>,
}

impl GridRobot {
    pub fn new(start: Pose, grid_size: i32, timing: RobotConfig) -> Self {
        Self {
            pose: start,
            baseline: start,
            grid_size,
            timing,
            pending: None,
            interactions: Vec::new(),
        }
    }

    pub fn from_level(level: &LevelConfig) -> Self {
        Self::new(level.start, level.grid_size, level.engine.robot.clone())
    }

    pub fn baseline(&self) -> Pose {
        self.baseline
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn interactions(&self) -> &[Vec<u8>] {
        &self.interactions
    }

    fn duration(&self, kind: CommandKind) -> u32 {
        let ticks = match kind {
            CommandKind::MoveForward => self.timing.ticks_per_move,
            CommandKind::TurnLeft | CommandKind::TurnRight => self.timing.ticks_per_turn,
            CommandKind::Interact => self.timing.ticks_per_interact,
        };
        ticks.max(1)
    }

    fn in_grid(&self, pose: &Pose) -> bool {
        let range = 0..self.grid_size;
        range.contains(&pose.position.x) && range.contains(&pose.position.y)
    }

    fn effect_of(&self, kind: CommandKind) -> CommandEffect {
        let mut pose = self.pose;
        let mut blocked = false;
        match kind {
            CommandKind::MoveForward => {
                pose.position = pose.position.step(pose.facing);
                if !self.in_grid(&pose) {
                    pose = self.pose;
                    blocked = true;
                }
            }
            CommandKind::TurnLeft => pose.facing = pose.facing.left(),
            CommandKind::TurnRight => pose.facing = pose.facing.right(),
            CommandKind::Interact => {}
        }
        CommandEffect { pose, blocked }
    }
}

impl Actor for GridRobot {
    fn issue(&mut self, command: &ActorCommand) {
        let effect = self.effect_of(command.kind);
        self.pending = Some(PendingCommand {
            command: command.clone(),
            remaining_ticks: self.duration(command.kind),
            effect,
        });
    }

    fn poll(&mut self) -> CommandStatus {
        let Some(pending) = self.pending.as_mut() else {
            return CommandStatus::Idle;
        };
        pending.remaining_ticks = pending.remaining_ticks.saturating_sub(1);
        if pending.remaining_ticks > 0 {
            return CommandStatus::InProgress;
        }
        let Some(done) = self.pending.take() else {
            return CommandStatus::Idle;
        };
        self.pose = done.effect.pose;
        if done.command.kind == CommandKind::Interact {
            self.interactions.push(done.command.payload);
        }
        if done.effect.blocked {
            debug!(pose = %self.pose, "robot move blocked at grid edge");
        }
        CommandStatus::Complete(done.effect)
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn reset(&mut self) {
        self.pose = self.baseline;
        self.pending = None;
        self.interactions.clear();
    }
}
