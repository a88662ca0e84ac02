// Stepwise program interpreter.
//
// A `Runner` executes one `CompiledProgram` against an `Actor`, driven by
// the session tick loop. There is no implicit continuation: all suspend and
// resume state (cursor, loop counters, the step currently awaiting the
// actor) is held explicitly in the struct, and each call to `tick()` makes
// as much progress as it can without getting ahead of the actor.
//
// One tick proceeds like this:
//
//   1. If an instruction is in flight, poll the actor. Still busy -> return
//      `Waiting`. Done -> advance the cursor and return `Completed` so the
//      caller can evaluate the objective before anything else happens.
//   2. Otherwise resolve control steps synchronously (loop jumps never touch
//      the actor) until an instruction is reached, then issue it and poll
//      once, so a one-tick command completes in the tick it was issued.
//   3. Running off the end of the program returns `Finished` exactly once.
//
// Loop control: each `RepeatFrom` step at position k owns a counter on a
// small stack. Reaching k with no counter for it pushes one holding
// `iterations - 1` remaining passes. While passes remain the counter is
// decremented and the cursor jumps back to the body start. Once exhausted
// the counter is popped and execution falls through. Because the compiler
// guarantees proper nesting, the counter for k is always the stack top when
// k is reached again.
//
// Every step passed (instruction or jump) counts toward the step cap; the
// runner halts with `StepLimitExceeded` rather than exceed it.
//
// See also: `compiler.rs` for the step format, `orchestrator.rs` which owns
// the runner and reacts to each `RunnerTick`.

use crate::actor::{Actor, CommandEffect, CommandStatus};
use crate::cell::ActorCommand;
use crate::compiler::{CompiledProgram, Step};
use crate::config::EngineConfig;
use crate::types::{BlockId, CellIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// One instruction the actor finished, as handed to the objective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedInstruction {
    pub cell: CellIndex,
    pub block: BlockId,
    pub command: ActorCommand,
    pub effect: CommandEffect,
}

/// Outcome of one `Runner::tick`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunnerTick {
    /// No program loaded.
    Idle,
    /// An instruction is in flight.
    Waiting,
    /// An instruction finished this tick.
    Completed(ExecutedInstruction),
    /// The cursor passed the last step. The runner is idle again.
    Finished,
    /// The step cap was reached at `cell`. The runner is idle again.
    StepLimitExceeded { cell: CellIndex },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct LoopCounter {
    /// Position of the owning `RepeatFrom` step.
    step: usize,
    remaining: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum Phase {
    Idle,
    Ready,
    Awaiting { step: usize },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Runner {
    program: Option<CompiledProgram>,
    cursor: usize,
    counters: SmallVec<[LoopCounter; 4]>,
    phase: Phase,
    current_cell: Option<CellIndex>,
    executed: u64,
    max_executed: u64,
}

impl Default for Runner {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Runner {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            program: None,
            cursor: 0,
            counters: SmallVec::new(),
            phase: Phase::Idle,
            current_cell: None,
            executed: 0,
            max_executed: config.max_executed_steps,
        }
    }

    /// Load `program` and position the cursor at step 0. Any previous
    /// program is discarded.
    pub fn start(&mut self, program: CompiledProgram) {
        debug!(steps = program.len(), "runner started");
        self.program = Some(program);
        self.cursor = 0;
        self.counters.clear();
        self.phase = Phase::Ready;
        self.current_cell = None;
        self.executed = 0;
    }

    pub fn is_running(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Originating cell of the most recently dispatched instruction. Never a
    /// loop end marker.
    pub fn current_index(&self) -> Option<CellIndex> {
        self.current_cell
    }

    pub fn program(&self) -> Option<&CompiledProgram> {
        self.program.as_ref()
    }

    /// Steps passed so far in this run.
    pub fn executed_steps(&self) -> u64 {
        self.executed
    }

    /// Stop dispatching and drop the program, leaving the actor alone. The
    /// current index survives so a halting error can still be reported.
    pub fn halt(&mut self) {
        self.program = None;
        self.counters.clear();
        self.phase = Phase::Idle;
    }

    /// Abort unconditionally and restore the actor's baseline. Safe when idle.
    pub fn reset(&mut self, actor: &mut dyn Actor) {
        self.halt();
        self.cursor = 0;
        self.current_cell = None;
        self.executed = 0;
        actor.reset();
    }

    pub fn tick(&mut self, actor: &mut dyn Actor) -> RunnerTick {
        match self.phase {
            Phase::Idle => RunnerTick::Idle,
            Phase::Awaiting { step } => self.poll_actor(actor, step),
            Phase::Ready => self.dispatch(actor),
        }
    }

    fn poll_actor(&mut self, actor: &mut dyn Actor, step: usize) -> RunnerTick {
        match actor.poll() {
            CommandStatus::InProgress => RunnerTick::Waiting,
            CommandStatus::Complete(effect) => {
                self.phase = Phase::Ready;
                self.cursor = step + 1;
                match self.program.as_ref().and_then(|p| p.step(step)) {
                    Some(Step::Instruction {
                        cell,
                        block,
                        command,
                    }) => RunnerTick::Completed(ExecutedInstruction {
                        cell: *cell,
                        block: *block,
                        command: command.clone(),
                        effect,
                    }),
                    _ => RunnerTick::Waiting,
                }
            }
            // The actor lost the command (someone reset it underneath us).
            // Re-issue on the next tick.
            CommandStatus::Idle => {
                self.phase = Phase::Ready;
                self.cursor = step;
                RunnerTick::Waiting
            }
        }
    }

    fn dispatch(&mut self, actor: &mut dyn Actor) -> RunnerTick {
        loop {
            let Some(step) = self.program.as_ref().and_then(|p| p.step(self.cursor)).cloned()
            else {
                debug!(executed = self.executed, "runner finished");
                self.halt();
                return RunnerTick::Finished;
            };

            if self.executed >= self.max_executed {
                let cell = match step {
                    Step::Instruction { cell, .. } => cell,
                    Step::RepeatFrom { loop_start, .. } => self.current_cell.unwrap_or(loop_start),
                };
                debug!(%cell, cap = self.max_executed, "step limit exceeded");
                self.current_cell = Some(cell);
                self.halt();
                return RunnerTick::StepLimitExceeded { cell };
            }
            self.executed += 1;

            match step {
                Step::RepeatFrom {
                    target, iterations, ..
                } => self.repeat(target, iterations),
                Step::Instruction { cell, command, .. } => {
                    trace!(%cell, kind = ?command.kind, "dispatching instruction");
                    self.current_cell = Some(cell);
                    let at = self.cursor;
                    self.phase = Phase::Awaiting { step: at };
                    actor.issue(&command);
                    return self.poll_actor(actor, at);
                }
            }
        }
    }

    fn repeat(&mut self, target: usize, iterations: u32) {
        let here = self.cursor;
        if self.counters.last().map(|c| c.step) != Some(here) {
            self.counters.push(LoopCounter {
                step: here,
                remaining: iterations.saturating_sub(1),
            });
        }
        match self.counters.last_mut() {
            Some(counter) if counter.remaining > 0 => {
                counter.remaining -= 1;
                self.cursor = target;
            }
            _ => {
                self.counters.pop();
                self.cursor = here + 1;
            }
        }
    }
}
