// Core types shared across the engine.
//
// Defines slot indices (`CellIndex`), identities for placed blocks and loop
// wrappers (`BlockId`, `LoopId`), participant identity (`ParticipantId`), and
// the grid geometry the robot moves over (`GridPos`, `Facing`, `Pose`). All
// types derive `Serialize` and `Deserialize` so they can travel inside session
// actions and state snapshots.
//
// The grid uses a y-up convention: facing `North` and moving forward
// increases `y`, facing `East` increases `x`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Position of a slot in the cell sequence. Error reports and highlights
/// always refer to this index, never to a compiled step index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex(pub usize);

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell {}", self.0)
    }
}

/// Identity of a placed instruction block, assigned by the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

/// Identity of a loop wrapper. Its start and end markers share the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoopId(pub u64);

/// A participant in a shared level session. In networked play this mirrors
/// the relay-assigned player id; offline play uses `ParticipantId(0)`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticipantId(pub u32);

// ---------------------------------------------------------------------------
// Grid geometry
// ---------------------------------------------------------------------------

/// A cell on the level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `facing`.
    pub fn step(self, facing: Facing) -> Self {
        let (dx, dy) = facing.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass direction the robot is facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    /// Quarter turn counter-clockwise.
    pub fn left(self) -> Self {
        match self {
            Facing::North => Facing::West,
            Facing::West => Facing::South,
            Facing::South => Facing::East,
            Facing::East => Facing::North,
        }
    }

    /// Quarter turn clockwise.
    pub fn right(self) -> Self {
        match self {
            Facing::North => Facing::East,
            Facing::East => Facing::South,
            Facing::South => Facing::West,
            Facing::West => Facing::North,
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Facing::North => (0, 1),
            Facing::East => (1, 0),
            Facing::South => (0, -1),
            Facing::West => (-1, 0),
        }
    }
}

/// Where the robot stands and which way it faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    pub position: GridPos,
    pub facing: Facing,
}

impl Pose {
    pub const fn new(position: GridPos, facing: Facing) -> Self {
        Self { position, facing }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} facing {:?}", self.position, self.facing)
    }
}
