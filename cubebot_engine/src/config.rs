// Data-driven engine and level configuration.
//
// All tunable parameters live here, loaded from JSON. The engine never uses
// magic numbers: the compiler's step cap and loop bound, the robot's command
// durations, and the terminal's settle delay all come from `EngineConfig`.
// A level is described by `LevelConfig` (program area size, grid, robot start
// pose, objectives) and embeds the `EngineConfig` it was designed for.
//
// In multiplayer every participant must load an identical level; the relay
// handshake compares `LevelConfig::config_hash()` and rejects mismatches.
//
// Ticks are 1 ms of simulated time (the relay's turn cadence uses the same
// unit).
//
// See also: `objective.rs` for `ObjectiveConfig`, `session.rs` which builds a
// `LevelSession` from a `LevelConfig`.

use crate::objective::ObjectiveConfig;
use crate::types::{Facing, GridPos, Pose};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed level config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid level config: {0}")]
    Invalid(String),
}

/// How long the robot takes per command, in ticks. A command always takes at
/// least one tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub ticks_per_move: u32,
    pub ticks_per_turn: u32,
    pub ticks_per_interact: u32,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            ticks_per_move: 400,
            ticks_per_turn: 250,
            ticks_per_interact: 300,
        }
    }
}

/// Engine-wide limits and timings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on steps (instructions and loop jumps) passed through by one run.
    /// The compiler rejects programs whose loop expansion would exceed it;
    /// the runner enforces it too.
    pub max_executed_steps: u64,
    /// Largest iteration count a single loop wrapper may declare.
    pub max_loop_iterations: u32,
    /// How long the terminal shows a success/error status before reverting.
    pub settle_delay_ticks: u64,
    pub robot: RobotConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_executed_steps: 10_000,
            max_loop_iterations: 99,
            settle_delay_ticks: 5_000,
            robot: RobotConfig::default(),
        }
    }
}

/// Everything needed to load one level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Number of slots in the program area.
    pub cell_count: usize,
    /// The grid is `grid_size` x `grid_size`, with cells `0..grid_size`.
    pub grid_size: i32,
    pub start: Pose,
    #[serde(default)]
    pub objectives: Vec<ObjectiveConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: "sandbox".into(),
            cell_count: 12,
            grid_size: 10,
            start: Pose::new(GridPos::new(0, 0), Facing::North),
            objectives: Vec::new(),
            engine: EngineConfig::default(),
        }
    }
}

impl LevelConfig {
    /// Parse and validate a level from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LevelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_count == 0 {
            return Err(ConfigError::Invalid("cell_count must be at least 1".into()));
        }
        if self.grid_size <= 0 {
            return Err(ConfigError::Invalid("grid_size must be positive".into()));
        }
        if !self.in_grid(self.start.position) {
            return Err(ConfigError::Invalid(format!(
                "start position {} is outside the {}x{} grid",
                self.start.position, self.grid_size, self.grid_size
            )));
        }
        if self.engine.max_loop_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_loop_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn in_grid(&self, pos: GridPos) -> bool {
        (0..self.grid_size).contains(&pos.x) && (0..self.grid_size).contains(&pos.y)
    }

    /// Stable hash of the canonical JSON form, compared at session handshake.
    pub fn config_hash(&self) -> u64 {
        let json = serde_json::to_vec(self).unwrap_or_default();
        crate::digest64(&json)
    }
}
