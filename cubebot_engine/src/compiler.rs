// Cube compiler: spatial cell arrangement -> flat, loop-resolved program.
//
// `Compiler::compile` scans the cell sequence once, left to right, keeping a
// stack of open loop frames:
//
//   - `Instruction`  -> emit `Step::Instruction`, tagged with its cell index.
//   - `LoopStart`    -> validate the count, push a frame recording the output
//                       position where the body begins. Nothing is emitted.
//   - `LoopEnd`      -> pop the innermost frame and emit `Step::RepeatFrom`,
//                       a control step that jumps back to the body start until
//                       the loop's iterations are used up.
//   - `Empty`        -> skipped.
//
// Loops are never unrolled. Instead each frame accumulates the *expanded*
// step count of its body, and the compiler rejects any loop whose expansion
// would push a run past `max_executed_steps`. A loop of n iterations expands
// to n x (body + 1): the `RepeatFrom` step itself is passed once per
// iteration, so empty loop bodies still cost something. The runner counts
// steps the same way and enforces the same cap at runtime.
//
// Structural errors are reported with the index of the offending cell in the
// original sequence. The first problem in scan order wins; there is no error
// recovery. Compilation is pure: the same cells always produce the same
// program.
//
// See also: `runner.rs` for how `RepeatFrom` is interpreted, `cell.rs` for
// the input model.

use crate::cell::{ActorCommand, Cell};
use crate::config::EngineConfig;
use crate::types::{BlockId, CellIndex, LoopId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

/// One executable step of a compiled program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Issue `command` to the actor and wait for it to finish.
    Instruction {
        cell: CellIndex,
        block: BlockId,
        command: ActorCommand,
    },
    /// Loop control: jump back to step `target` until the body has run
    /// `iterations` times, then fall through. `cell` is the loop's end marker,
    /// `loop_start` its start marker.
    RepeatFrom {
        cell: CellIndex,
        loop_start: CellIndex,
        target: usize,
        iterations: u32,
    },
}

/// The loop-resolved, linear program produced by the compiler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledProgram {
    steps: Vec<Step>,
    expanded_len: u64,
}

impl CompiledProgram {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Number of steps, control steps included.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of instruction steps (each placed block counts once).
    pub fn instruction_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Instruction { .. }))
            .count()
    }

    /// Total steps a complete run will pass through, loops expanded and
    /// control steps included.
    pub fn expanded_len(&self) -> u64 {
        self.expanded_len
    }
}

/// A structural problem in the cell arrangement.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unmatched loop end")]
    UnmatchedLoopEnd { cell: CellIndex },
    /// The end marker closes a loop other than the innermost open one.
    #[error("mismatched loop end")]
    MismatchedLoopEnd {
        cell: CellIndex,
        expected: LoopId,
        found: LoopId,
    },
    #[error("unclosed loop")]
    UnclosedLoop { cell: CellIndex },
    /// Reported with the same text as an oversized count.
    #[error("loop too large")]
    NonPositiveLoopCount { cell: CellIndex, iterations: i32 },
    #[error("loop too large")]
    LoopTooLarge { cell: CellIndex },
    #[error("program too large")]
    ProgramTooLarge { cell: CellIndex },
}

impl CompileError {
    /// The cell to highlight.
    pub fn cell(&self) -> CellIndex {
        match *self {
            CompileError::UnmatchedLoopEnd { cell }
            | CompileError::MismatchedLoopEnd { cell, .. }
            | CompileError::UnclosedLoop { cell }
            | CompileError::NonPositiveLoopCount { cell, .. }
            | CompileError::LoopTooLarge { cell }
            | CompileError::ProgramTooLarge { cell } => cell,
        }
    }
}

/// An open loop during the scan.
struct LoopFrame {
    id: LoopId,
    start_cell: CellIndex,
    start_step: usize,
    iterations: u32,
    /// Expanded step count of the body seen so far.
    body_expanded: u64,
}

/// Compiles cell sequences under a fixed set of limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compiler {
    max_expanded: u64,
    max_loop_iterations: u32,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Compiler {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_expanded: config.max_executed_steps,
            max_loop_iterations: config.max_loop_iterations,
        }
    }

    pub fn compile(&self, cells: &[Cell]) -> Result<CompiledProgram, CompileError> {
        let mut stack: SmallVec<[LoopFrame; 8]> = SmallVec::new();
        let mut steps = Vec::new();
        let mut total: u64 = 0;

        for (i, cell) in cells.iter().enumerate() {
            let index = CellIndex(i);
            match cell {
                Cell::Empty => {}
                Cell::Instruction(block) => {
                    steps.push(Step::Instruction {
                        cell: index,
                        block: block.id,
                        command: block.command.clone(),
                    });
                    match stack.last_mut() {
                        Some(frame) => frame.body_expanded += 1,
                        None => {
                            total += 1;
                            if total > self.max_expanded {
                                return Err(CompileError::ProgramTooLarge { cell: index });
                            }
                        }
                    }
                }
                Cell::LoopStart { id, iterations } => {
                    let count = match u32::try_from(*iterations) {
                        Ok(n) if n > 0 => n,
                        _ => {
                            return Err(CompileError::NonPositiveLoopCount {
                                cell: index,
                                iterations: *iterations,
                            });
                        }
                    };
                    if count > self.max_loop_iterations {
                        return Err(CompileError::LoopTooLarge { cell: index });
                    }
                    stack.push(LoopFrame {
                        id: *id,
                        start_cell: index,
                        start_step: steps.len(),
                        iterations: count,
                        body_expanded: 0,
                    });
                }
                Cell::LoopEnd { id } => {
                    let frame = stack
                        .pop()
                        .ok_or(CompileError::UnmatchedLoopEnd { cell: index })?;
                    if frame.id != *id {
                        return Err(CompileError::MismatchedLoopEnd {
                            cell: index,
                            expected: frame.id,
                            found: *id,
                        });
                    }
                    steps.push(Step::RepeatFrom {
                        cell: index,
                        loop_start: frame.start_cell,
                        target: frame.start_step,
                        iterations: frame.iterations,
                    });

                    let expanded = (frame.body_expanded + 1)
                        .saturating_mul(u64::from(frame.iterations));
                    let too_large = CompileError::LoopTooLarge {
                        cell: frame.start_cell,
                    };
                    if expanded > self.max_expanded {
                        return Err(too_large);
                    }
                    match stack.last_mut() {
                        Some(parent) => {
                            parent.body_expanded = parent.body_expanded.saturating_add(expanded);
                        }
                        None => {
                            total = total.saturating_add(expanded);
                            if total > self.max_expanded {
                                return Err(too_large);
                            }
                        }
                    }
                }
            }
        }

        if let Some(frame) = stack.first() {
            return Err(CompileError::UnclosedLoop {
                cell: frame.start_cell,
            });
        }

        debug!(steps = steps.len(), expanded = total, "compiled cell sequence");
        Ok(CompiledProgram {
            steps,
            expanded_len: total,
        })
    }
}

/// Compile with the default engine limits.
pub fn compile(cells: &[Cell]) -> Result<CompiledProgram, CompileError> {
    Compiler::default().compile(cells)
}
