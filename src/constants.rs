//! Default parameters for the rules engine and the search.
//!
//! Everything here can be overridden through [`SearchConfig`](crate::config::SearchConfig)
//! or the command line; these are only the starting values.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN). The hosted variant is usually played on 5x5.
pub const DEFAULT_BOARD_SIZE: usize = 5;

/// Smallest accepted board size.
pub const MIN_BOARD_SIZE: usize = 1;

/// Largest accepted board size. SGF notation only has letters up to `z`.
pub const MAX_BOARD_SIZE: usize = 25;

/// Number of plies spent placing the entangled quantum stones.
pub const QUANTUM_PLIES: usize = 2;

// =============================================================================
// Scoring
// =============================================================================

/// Default komi (compensation points for White).
pub const DEFAULT_KOMI: f32 = 6.5;

// =============================================================================
// Search Parameters
// =============================================================================

/// Default number of rollout passes over every child per move.
pub const DEFAULT_PASSES: usize = 3;

/// Default number of attempts for a remote operation that fails transiently.
pub const DEFAULT_REMOTE_RETRIES: usize = 3;

/// Rollouts between two progress log lines.
pub const REPORT_PERIOD: usize = 200;
