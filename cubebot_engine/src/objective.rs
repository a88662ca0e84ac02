// Objective evaluation contract and the built-in level objectives.
//
// The orchestrator consults an `Objective` once before a run starts (with an
// empty history, as a pre-flight check) and again after every completed
// instruction. An objective sees the compiled program, the robot's start
// pose, and every instruction executed so far with its effect; it answers
// with an `ObjectiveResult`. Objectives are pure: the same history always
// yields the same verdict, which keeps participants in agreement.
//
// Levels configure their objectives in JSON (`ObjectiveConfig`) and the
// session combines them into an `ObjectiveSet`:
//
//   - any `Error` wins (the first one in configuration order);
//   - otherwise any `Continuing` keeps the run going;
//   - otherwise any `Success` is a success;
//   - otherwise `None` (no objective has an opinion).
//
// Closures `Fn(&History) -> ObjectiveResult` also implement `Objective`, which
// is handy for one-off predicates.

use crate::cell::CommandKind;
use crate::compiler::CompiledProgram;
use crate::runner::ExecutedInstruction;
use crate::types::{Facing, GridPos, Pose};
use serde::{Deserialize, Serialize};

/// Classification of the run so far.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveResult {
    /// No opinion yet.
    #[default]
    None,
    Continuing,
    Success,
    /// The run has failed; the message is shown to the players.
    Error(String),
}

impl ObjectiveResult {
    /// Success and Error end a run; the others do not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ObjectiveResult::Success | ObjectiveResult::Error(_))
    }
}

/// Everything an objective may look at.
#[derive(Clone, Copy, Debug)]
pub struct History<'a> {
    pub program: &'a CompiledProgram,
    pub start_pose: Pose,
    pub executed: &'a [ExecutedInstruction],
}

impl History<'_> {
    /// Pose after the last executed instruction, or the start pose.
    pub fn latest_pose(&self) -> Pose {
        self.executed
            .last()
            .map_or(self.start_pose, |i| i.effect.pose)
    }

    pub fn count_of(&self, kind: CommandKind) -> usize {
        self.executed
            .iter()
            .filter(|i| i.command.kind == kind)
            .count()
    }
}

pub trait Objective {
    fn evaluate(&self, history: &History<'_>) -> ObjectiveResult;
}

impl<F> Objective for F
where
    F: Fn(&History<'_>) -> ObjectiveResult,
{
    fn evaluate(&self, history: &History<'_>) -> ObjectiveResult {
        self(history)
    }
}

// ---------------------------------------------------------------------------
// Built-in objectives
// ---------------------------------------------------------------------------

/// Succeeds once the robot stands in the `goal` pose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReachPose {
    pub goal: Pose,
}

impl Objective for ReachPose {
    fn evaluate(&self, history: &History<'_>) -> ObjectiveResult {
        if !history.executed.is_empty() && history.latest_pose() == self.goal {
            ObjectiveResult::Success
        } else {
            ObjectiveResult::Continuing
        }
    }
}

/// Fails as soon as a move was blocked by the grid edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StayInGrid;

impl Objective for StayInGrid {
    fn evaluate(&self, history: &History<'_>) -> ObjectiveResult {
        if history.executed.iter().any(|i| i.effect.blocked) {
            ObjectiveResult::Error("robot left the grid".into())
        } else {
            ObjectiveResult::None
        }
    }
}

/// Fails (already at pre-flight) when the program uses too many blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaxBlocks {
    pub limit: usize,
}

impl Objective for MaxBlocks {
    fn evaluate(&self, history: &History<'_>) -> ObjectiveResult {
        let used = history.program.instruction_count();
        if used > self.limit {
            ObjectiveResult::Error(format!("too many blocks: {used} used, limit is {}", self.limit))
        } else {
            ObjectiveResult::None
        }
    }
}

/// Keeps the run going until at least one interact has been executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequireInteract;

impl Objective for RequireInteract {
    fn evaluate(&self, history: &History<'_>) -> ObjectiveResult {
        if history.count_of(CommandKind::Interact) > 0 {
            ObjectiveResult::Success
        } else {
            ObjectiveResult::Continuing
        }
    }
}

/// Level JSON form of the built-ins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveConfig {
    ReachPose { x: i32, y: i32, facing: Facing },
    StayInGrid,
    MaxBlocks { limit: usize },
    RequireInteract,
}

impl ObjectiveConfig {
    pub fn build(&self) -> Box<dyn Objective> {
        match *self {
            ObjectiveConfig::ReachPose { x, y, facing } => Box::new(ReachPose {
                goal: Pose::new(GridPos::new(x, y), facing),
            }),
            ObjectiveConfig::StayInGrid => Box::new(StayInGrid),
            ObjectiveConfig::MaxBlocks { limit } => Box::new(MaxBlocks { limit }),
            ObjectiveConfig::RequireInteract => Box::new(RequireInteract),
        }
    }
}

/// Ordered combination of objectives.
#[derive(Default)]
pub struct ObjectiveSet {
    objectives: Vec<Box<dyn Objective>>,
}

impl ObjectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[ObjectiveConfig]) -> Self {
        Self {
            objectives: configs.iter().map(ObjectiveConfig::build).collect(),
        }
    }

    pub fn push(&mut self, objective: Box<dyn Objective>) {
        self.objectives.push(objective);
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }
}

impl Objective for ObjectiveSet {
    fn evaluate(&self, history: &History<'_>) -> ObjectiveResult {
        let mut success = false;
        let mut continuing = false;
        for objective in &self.objectives {
            match objective.evaluate(history) {
                ObjectiveResult::Error(message) => return ObjectiveResult::Error(message),
                ObjectiveResult::Continuing => continuing = true,
                ObjectiveResult::Success => success = true,
                ObjectiveResult::None => {}
            }
        }
        if continuing {
            ObjectiveResult::Continuing
        } else if success {
            ObjectiveResult::Success
        } else {
            ObjectiveResult::None
        }
    }
}

impl std::fmt::Debug for ObjectiveSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectiveSet")
            .field("len", &self.objectives.len())
            .finish()
    }
}
