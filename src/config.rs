//! Search configuration.
//!
//! ```
//! use quantum_go::board::Color;
//! use quantum_go::config::SearchConfig;
//!
//! let config = SearchConfig::default()
//!     .with_board_size(9)
//!     .with_passes(5)
//!     .with_workers(4)
//!     .with_color(Color::White);
//! assert!(config.validate().is_ok());
//! ```

use crate::board::Color;
use crate::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_KOMI, DEFAULT_PASSES, DEFAULT_REMOTE_RETRIES, MAX_BOARD_SIZE,
    MIN_BOARD_SIZE,
};
use crate::selector::SearchError;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Board size (NxN).
    pub board_size: usize,

    /// Komi used when rollouts are scored.
    pub komi: f32,

    /// Rollout passes over every child per move.
    pub passes: usize,

    /// Worker threads for rollouts. `0` lets rayon pick one per core.
    pub workers: usize,

    /// The color the search plays for; rollouts won by it count as wins.
    pub color: Color,

    /// Seed for reproducible searches. `None` seeds from the OS.
    pub seed: Option<u64>,

    /// Attempts for a remote operation that fails transiently.
    pub remote_retries: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            komi: DEFAULT_KOMI,
            passes: DEFAULT_PASSES,
            workers: 0,
            color: Color::Black,
            seed: None,
            remote_retries: DEFAULT_REMOTE_RETRIES,
        }
    }
}

impl SearchConfig {
    pub fn with_board_size(mut self, size: usize) -> Self {
        self.board_size = size;
        self
    }

    pub fn with_komi(mut self, komi: f32) -> Self {
        self.komi = komi;
        self
    }

    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_remote_retries(mut self, retries: usize) -> Self {
        self.remote_retries = retries;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(SearchError::InvalidConfig(format!(
                "board size {} outside {MIN_BOARD_SIZE}..={MAX_BOARD_SIZE}",
                self.board_size
            )));
        }
        if self.passes == 0 {
            return Err(SearchError::InvalidConfig("passes must be at least 1".into()));
        }
        if self.color == Color::Empty {
            return Err(SearchError::InvalidConfig("search color must be Black or White".into()));
        }
        if !self.komi.is_finite() {
            return Err(SearchError::InvalidConfig(format!("komi {} is not finite", self.komi)));
        }
        if self.remote_retries == 0 {
            return Err(SearchError::InvalidConfig("remote retries must be at least 1".into()));
        }
        Ok(())
    }
}
