// Run orchestrator: the Idle/Running state machine for one level.
//
// The orchestrator owns the compiler, the runner, the current objective
// result and the history of executed instructions. The session feeds it
// Run/Reset actions and ticks; it answers with lifecycle notifications
// appended to a caller-supplied buffer (the session stamps them with the
// tick and forwards them to observers).
//
// Transitions:
//
//   Idle --run(cells)--> compile. Error -> `Error{message, cell}` and stay
//       Idle. Ok -> pre-flight objective check on the empty history. Error
//       -> `Error{message, None}` and stay Idle. Otherwise -> Running,
//       `RunStarted`, runner loaded. A pre-flight `Success` ends the run at
//       once.
//   Running --run--> ignored.
//   Running --instruction completed--> evaluate the objective.
//       Success -> `Success`, then finish. Error -> halt, `Error{message,
//       current cell}`, Idle (no `RunFinished`). Otherwise keep going.
//   Running --runner finished--> finish: `RunFinished`, then
//       `LevelCompleted` if the run succeeded.
//   Running --step cap--> as objective Error ("step limit exceeded").
//   Running --reset--> runner and actor reset, `Reset`, Idle.
//   Idle --reset--> runner and actor reset, no notification.
//
// An error leaves the robot where it stopped so players can see what went
// wrong; only Reset moves it back.
//
// Everything here is deterministic given the same cells, actor baseline and
// objective, which is what lets every participant run its own copy without
// exchanging intermediate state.

use crate::actor::Actor;
use crate::cell::Cell;
use crate::compiler::Compiler;
use crate::config::EngineConfig;
use crate::event::Notification;
use crate::objective::{History, Objective, ObjectiveResult};
use crate::runner::{ExecutedInstruction, Runner, RunnerTick};
use crate::types::{CellIndex, Pose};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Externally visible run state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    /// `cell` is the originating cell of the instruction being executed.
    Running { cell: Option<CellIndex> },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Orchestrator {
    compiler: Compiler,
    runner: Runner,
    running: bool,
    result: ObjectiveResult,
    /// The objective reported Success during the current/last run.
    succeeded: bool,
    start_pose: Option<Pose>,
    history: Vec<ExecutedInstruction>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Orchestrator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            compiler: Compiler::from_config(config),
            runner: Runner::from_config(config),
            running: false,
            result: ObjectiveResult::None,
            succeeded: false,
            start_pose: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        if self.running {
            RunState::Running {
                cell: self.runner.current_index(),
            }
        } else {
            RunState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn result(&self) -> &ObjectiveResult {
        &self.result
    }

    /// Instructions completed in the current (or last) run.
    pub fn history(&self) -> &[ExecutedInstruction] {
        &self.history
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Handle a Run action with the cell snapshot it carries.
    pub fn run(
        &mut self,
        cells: &[Cell],
        actor: &mut dyn Actor,
        objective: &dyn Objective,
        out: &mut Vec<Notification>,
    ) {
        if self.running {
            debug!("run ignored, already running");
            return;
        }

        let program = match self.compiler.compile(cells) {
            Ok(program) => program,
            Err(err) => {
                info!(error = %err, cell = %err.cell(), "compile failed");
                out.push(Notification::Error {
                    message: err.to_string(),
                    cell: Some(err.cell()),
                });
                return;
            }
        };

        self.result = ObjectiveResult::None;
        self.succeeded = false;
        self.history.clear();
        let start_pose = actor.pose();
        self.start_pose = Some(start_pose);

        let verdict = objective.evaluate(&History {
            program: &program,
            start_pose,
            executed: &[],
        });
        if let ObjectiveResult::Error(message) = &verdict {
            info!(%message, "pre-flight check failed");
            out.push(Notification::Error {
                message: message.clone(),
                cell: None,
            });
            self.result = verdict;
            return;
        }

        info!(
            steps = program.len(),
            expanded = program.expanded_len(),
            "run started"
        );
        self.running = true;
        out.push(Notification::RunStarted);
        self.runner.start(program);
        self.apply_verdict(verdict, out);
    }

    /// Advance the active run by one tick.
    pub fn tick(
        &mut self,
        actor: &mut dyn Actor,
        objective: &dyn Objective,
        out: &mut Vec<Notification>,
    ) {
        if !self.running {
            return;
        }
        match self.runner.tick(actor) {
            RunnerTick::Idle | RunnerTick::Waiting => {}
            RunnerTick::Completed(instruction) => {
                self.history.push(instruction);
                let Some(program) = self.runner.program() else {
                    return;
                };
                let verdict = objective.evaluate(&History {
                    program,
                    start_pose: self.start_pose.unwrap_or_else(|| actor.pose()),
                    executed: &self.history,
                });
                self.apply_verdict(verdict, out);
            }
            RunnerTick::Finished => self.finish(out),
            RunnerTick::StepLimitExceeded { cell } => {
                let message = String::from("step limit exceeded");
                self.result = ObjectiveResult::Error(message.clone());
                self.fail(message, Some(cell), out);
            }
        }
    }

    /// Handle a Reset action. Always resets the runner and actor; only an
    /// active run produces a notification.
    pub fn reset(&mut self, actor: &mut dyn Actor, out: &mut Vec<Notification>) {
        let was_running = self.running;
        self.runner.reset(actor);
        self.running = false;
        self.result = ObjectiveResult::None;
        self.succeeded = false;
        self.history.clear();
        if was_running {
            info!("run reset");
            out.push(Notification::Reset);
        }
    }

    fn apply_verdict(&mut self, verdict: ObjectiveResult, out: &mut Vec<Notification>) {
        if verdict == self.result {
            return;
        }
        debug!(?verdict, "objective verdict changed");
        match &verdict {
            ObjectiveResult::None | ObjectiveResult::Continuing => {
                self.result = verdict;
            }
            ObjectiveResult::Success => {
                self.result = verdict;
                self.succeeded = true;
                out.push(Notification::Success);
                self.finish(out);
            }
            ObjectiveResult::Error(message) => {
                let message = message.clone();
                self.result = verdict;
                let cell = self.runner.current_index();
                self.fail(message, cell, out);
            }
        }
    }

    fn finish(&mut self, out: &mut Vec<Notification>) {
        self.runner.halt();
        self.running = false;
        info!(
            executed = self.history.len(),
            succeeded = self.succeeded,
            "run finished"
        );
        out.push(Notification::RunFinished);
        if self.succeeded {
            out.push(Notification::LevelCompleted);
        }
    }

    fn fail(&mut self, message: String, cell: Option<CellIndex>, out: &mut Vec<Notification>) {
        self.runner.halt();
        self.running = false;
        info!(%message, ?cell, "run failed");
        out.push(Notification::Error { message, cell });
    }
}
