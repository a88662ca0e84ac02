// Instruction model and the cell editor.
//
// A level's program area is a fixed row of slots ("cells"). Each slot is
// empty, holds one instruction block, or holds one marker of a loop wrapper
// (the wrapper's start marker sits before its body, the end marker after).
// This file defines those slot contents (`Cell`, `Block`, `ActorCommand`) and
// `CellSequence`, the editor that owns them.
//
// `CellSequence` also answers the highlight lookups the terminal UI needs:
// given a placed block or loop wrapper, which cell is it in? Lookups go
// through an index cache rebuilt on every edit, so they never scan.
//
// Edits are refused while a run is active (`EditError::Locked`). A run never
// reads the editor directly anyway: the Run action carries a `snapshot()`
// taken when the run was requested.
//
// See also: `compiler.rs` which consumes `&[Cell]`, `session.rs` which locks
// and unlocks the editor around runs.

use crate::types::{BlockId, CellIndex, LoopId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// The operation a block asks the actor to perform. The vocabulary is owned
/// by the actor; the compiler and runner never interpret it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    MoveForward,
    TurnLeft,
    TurnRight,
    Interact,
}

/// A command forwarded to the actor: the kind plus an opaque payload (for
/// example a sub-program reference on an interact block). The payload is
/// passed through uninterpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorCommand {
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
}

impl ActorCommand {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(kind: CommandKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }
}

/// A single placed instruction block ("cube").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub command: ActorCommand,
}

impl Block {
    pub fn new(id: BlockId, kind: CommandKind) -> Self {
        Self {
            id,
            command: ActorCommand::new(kind),
        }
    }
}

/// Contents of one slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Instruction(Block),
    /// Opens a loop wrapper whose body runs `iterations` times. The count is
    /// signed so that editor mistakes reach the compiler and get reported.
    LoopStart { id: LoopId, iterations: i32 },
    /// Closes the loop wrapper with the same id.
    LoopEnd { id: LoopId },
}

impl Cell {
    pub fn instruction(id: u64, kind: CommandKind) -> Self {
        Cell::Instruction(Block::new(BlockId(id), kind))
    }

    pub fn loop_start(id: u64, iterations: i32) -> Self {
        Cell::LoopStart {
            id: LoopId(id),
            iterations,
        }
    }

    pub fn loop_end(id: u64) -> Self {
        Cell::LoopEnd { id: LoopId(id) }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Reasons an edit was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("cells are locked while the program is running")]
    Locked,
    #[error("{index} is outside the program area ({len} cells)")]
    OutOfRange { index: CellIndex, len: usize },
}

/// The editable row of cells for one level.
#[derive(Clone, Debug, Serialize)]
pub struct CellSequence {
    cells: Vec<Cell>,
    locked: bool,
    #[serde(skip)]
    block_index: BTreeMap<BlockId, CellIndex>,
    #[serde(skip)]
    loop_index: BTreeMap<LoopId, CellIndex>,
}

impl CellSequence {
    /// An all-empty program area with `len` slots.
    pub fn new(len: usize) -> Self {
        Self::from_cells(vec![Cell::Empty; len])
    }

    /// Wrap existing slot contents (e.g. a level's pre-placed blocks).
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        let mut seq = Self {
            cells,
            locked: false,
            block_index: BTreeMap::new(),
            loop_index: BTreeMap::new(),
        };
        seq.rebuild_index();
        seq
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Ordered read of the current slot contents.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, index: CellIndex) -> Option<&Cell> {
        self.cells.get(index.0)
    }

    /// A coherent copy of the current contents, taken at Run-request time.
    pub fn snapshot(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Place `cell` into slot `index`, returning what was there before.
    pub fn set(&mut self, index: CellIndex, cell: Cell) -> Result<Cell, EditError> {
        self.check_editable(index)?;
        let previous = std::mem::replace(&mut self.cells[index.0], cell);
        self.rebuild_index();
        Ok(previous)
    }

    /// Empty slot `index`, returning what was there before.
    pub fn clear_cell(&mut self, index: CellIndex) -> Result<Cell, EditError> {
        self.set(index, Cell::Empty)
    }

    /// Empty every slot.
    pub fn clear_all(&mut self) -> Result<(), EditError> {
        if self.locked {
            return Err(EditError::Locked);
        }
        self.cells.fill(Cell::Empty);
        self.rebuild_index();
        Ok(())
    }

    /// The cell holding the given block, if it is placed.
    pub fn index_of_block(&self, id: BlockId) -> Option<CellIndex> {
        self.block_index.get(&id).copied()
    }

    /// The cell holding the start marker of the given loop wrapper.
    pub fn index_of_loop(&self, id: LoopId) -> Option<CellIndex> {
        self.loop_index.get(&id).copied()
    }

    fn check_editable(&self, index: CellIndex) -> Result<(), EditError> {
        if self.locked {
            return Err(EditError::Locked);
        }
        if index.0 >= self.cells.len() {
            return Err(EditError::OutOfRange {
                index,
                len: self.cells.len(),
            });
        }
        Ok(())
    }

    /// Duplicate ids resolve to their leftmost cell.
    fn rebuild_index(&mut self) {
        self.block_index.clear();
        self.loop_index.clear();
        for (i, cell) in self.cells.iter().enumerate() {
            match cell {
                Cell::Instruction(block) => {
                    self.block_index.entry(block.id).or_insert(CellIndex(i));
                }
                Cell::LoopStart { id, .. } => {
                    self.loop_index.entry(*id).or_insert(CellIndex(i));
                }
                Cell::Empty | Cell::LoopEnd { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CellSequence {
        CellSequence::from_cells(vec![
            Cell::instruction(10, CommandKind::MoveForward),
            Cell::loop_start(1, 2),
            Cell::instruction(11, CommandKind::TurnRight),
            Cell::loop_end(1),
            Cell::Empty,
        ])
    }

    #[test]
    fn lookup_finds_blocks_and_loops() {
        let seq = sample();
        assert_eq!(seq.index_of_block(BlockId(10)), Some(CellIndex(0)));
        assert_eq!(seq.index_of_block(BlockId(11)), Some(CellIndex(2)));
        assert_eq!(seq.index_of_loop(LoopId(1)), Some(CellIndex(1)));
        assert_eq!(seq.index_of_block(BlockId(99)), None);
    }

    #[test]
    fn lookup_follows_edits() {
        let mut seq = sample();
        let removed = seq.clear_cell(CellIndex(0)).unwrap();
        assert_eq!(removed, Cell::instruction(10, CommandKind::MoveForward));
        assert_eq!(seq.index_of_block(BlockId(10)), None);

        seq.set(CellIndex(4), Cell::instruction(10, CommandKind::MoveForward))
            .unwrap();
        assert_eq!(seq.index_of_block(BlockId(10)), Some(CellIndex(4)));
    }

    #[test]
    fn locked_sequence_rejects_edits() {
        let mut seq = sample();
        seq.set_locked(true);
        assert_eq!(seq.clear_cell(CellIndex(0)), Err(EditError::Locked));
        assert_eq!(seq.clear_all(), Err(EditError::Locked));
        assert_eq!(seq.index_of_block(BlockId(10)), Some(CellIndex(0)));

        seq.set_locked(false);
        assert!(seq.clear_all().is_ok());
        assert!(seq.cells().iter().all(Cell::is_empty));
        assert_eq!(seq.len(), 5);
    }

    #[test]
    fn out_of_range_edit_is_rejected() {
        let mut seq = CellSequence::new(3);
        let err = seq
            .set(CellIndex(3), Cell::instruction(1, CommandKind::Interact))
            .unwrap_err();
        assert_eq!(
            err,
            EditError::OutOfRange {
                index: CellIndex(3),
                len: 3
            }
        );
    }

    #[test]
    fn snapshot_is_independent_of_later_edits() {
        let mut seq = sample();
        let snapshot = seq.snapshot();
        seq.clear_all().unwrap();
        assert_eq!(snapshot[0], Cell::instruction(10, CommandKind::MoveForward));
    }

    #[test]
    fn payload_is_omitted_when_empty() {
        let json = serde_json::to_string(&ActorCommand::new(CommandKind::TurnLeft)).unwrap();
        assert_eq!(json, r#"{"kind":"TurnLeft"}"#);

        let with_payload = ActorCommand::with_payload(CommandKind::Interact, vec![7]);
        let json = serde_json::to_string(&with_payload).unwrap();
        let restored: ActorCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, with_payload);
    }
}
