//! Quantum-Go: a flat Monte Carlo player for the Quantum Go variant.
//!
//! Quantum Go keeps two parallel boards ("subgames"). The first two plies
//! place a pair of entangled quantum stones which are black on one subgame
//! and white on the other; every later move lands on both subgames at once.
//!
//! ## Modules
//!
//! - [`constants`] - Default engine and search parameters
//! - [`action_space`] - Integer move ids, remaining-action sets, SGF translation
//! - [`board`] - A single subgame grid with group and liberty queries
//! - [`engine`] - The Quantum Go rules engine (phases, captures, scoring)
//! - [`rollout`] - Random game completion from a move history
//! - [`tree`] - Arena-backed, single-ply search tree
//! - [`config`] - Search configuration
//! - [`selector`] - Move selection and the play loop
//! - [`remote`] - Boundary to the game server automation layer
//!
//! ## Example
//!
//! ```
//! use quantum_go::config::SearchConfig;
//! use quantum_go::selector::MoveSelector;
//!
//! let config = SearchConfig::default()
//!     .with_board_size(5)
//!     .with_passes(1)
//!     .with_seed(7);
//! let mut selector = MoveSelector::new(config).unwrap();
//! let best = selector.choose_move().unwrap();
//! println!("Best move: {}", selector.action_space().describe(best));
//! ```

pub mod action_space;
pub mod board;
pub mod config;
pub mod constants;
pub mod engine;
pub mod remote;
pub mod rollout;
pub mod selector;
pub mod tree;
