//! Quantum-Go: a flat Monte Carlo player for Quantum Go.
//!
//! ## Usage
//!
//! - `quantum-go` - Show a demo of the quantum stone placement
//! - `quantum-go selfplay` - Play the engine against a random local opponent
//! - `quantum-go replay 6 18 12` - Replay a fixed move sequence
//! - `quantum-go actions` - Print the action id table

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use quantum_go::action_space::{Move, build_action_space};
use quantum_go::board::{Color, Coord};
use quantum_go::config::SearchConfig;
use quantum_go::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_KOMI, DEFAULT_PASSES, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
};
use quantum_go::engine::QuantumGo;
use quantum_go::remote::LocalOpponent;
use quantum_go::rollout::replay;
use quantum_go::selector::MoveSelector;

/// Quantum-Go: a flat Monte Carlo player for Quantum Go
#[derive(Parser)]
#[command(name = "quantum-go")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the engine against a uniformly random local opponent
    Selfplay {
        /// Board size (NxN)
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        size: usize,
        /// Rollout passes over every candidate per move
        #[arg(short = 'l', long, default_value_t = DEFAULT_PASSES)]
        passes: usize,
        /// Rollout worker threads (0 = one per core)
        #[arg(long, default_value_t = 0)]
        workers: usize,
        #[arg(long, default_value_t = DEFAULT_KOMI)]
        komi: f32,
        /// Seed for a reproducible game
        #[arg(long)]
        seed: Option<u64>,
        /// Color played by the engine
        #[arg(long, value_enum, default_value_t = Side::Black)]
        color: Side,
    },
    /// Replay a fully specified sequence of action ids and print the result
    Replay {
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        size: usize,
        #[arg(long, default_value_t = DEFAULT_KOMI)]
        komi: f32,
        ids: Vec<usize>,
    },
    /// Print the action id table for a board size
    Actions {
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        size: usize,
    },
    /// Show how the quantum stones are placed
    Demo,
}

#[derive(Copy, Clone, ValueEnum)]
enum Side {
    Black,
    White,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::Black => Color::Black,
            Side::White => Color::White,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Selfplay {
            size,
            passes,
            workers,
            komi,
            seed,
            color,
        }) => run_selfplay(size, passes, workers, komi, seed, color.into()),
        Some(Commands::Replay { size, komi, ids }) => run_replay(size, komi, &ids),
        Some(Commands::Actions { size }) => run_actions(size),
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn run_selfplay(
    size: usize,
    passes: usize,
    workers: usize,
    komi: f32,
    seed: Option<u64>,
    color: Color,
) -> Result<()> {
    let mut config = SearchConfig::default()
        .with_board_size(size)
        .with_passes(passes)
        .with_workers(workers)
        .with_komi(komi)
        .with_color(color);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let mut selector = MoveSelector::new(config).context("creating move selector")?;
    let opponent_seed = seed.map_or_else(|| fastrand::u64(..), |s| s.wrapping_add(1));
    let mut opponent = LocalOpponent::new(size, komi, color.opponent(), opponent_seed);

    info!("engine plays {color:?} on {size}x{size}, {passes} passes per move");
    let result = selector.play_game(&mut opponent).context("playing self-play game")?;

    println!("{}", opponent.game());
    println!("Moves: {:?}", selector.history());
    println!("Result: {result}");
    Ok(())
}

fn check_size(size: usize) -> Result<()> {
    if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
        bail!("unsupported board size {size} (expected {MIN_BOARD_SIZE}..={MAX_BOARD_SIZE})");
    }
    Ok(())
}

fn run_replay(size: usize, komi: f32, ids: &[usize]) -> Result<()> {
    check_size(size)?;
    let space = build_action_space(size);
    let game = replay(&space, ids, komi).context("replaying move sequence")?;
    println!("{game}");
    match game.result() {
        Some(result) => println!("Result: {result}"),
        None => println!("Game not finished ({:?} to move)", game.current_player()),
    }
    Ok(())
}

fn run_actions(size: usize) -> Result<()> {
    check_size(size)?;
    let space = build_action_space(size);
    for (id, mv) in space.entries() {
        match mv {
            Move::Place(c) => {
                let (row, col) = c.one_based();
                println!("{id}\t({row}, {col})");
            }
            other => println!("{id}\t{other}"),
        }
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("Quantum-Go: flat Monte Carlo player\n");

    println!("=== Quantum Stones ===");
    let mut game = QuantumGo::new(5, DEFAULT_KOMI);
    game.apply_move(Color::Black, Move::Place(Coord::from_one_based(3, 3)))?;
    game.apply_move(Color::White, Move::Place(Coord::from_one_based(3, 5)))?;
    println!("{game}\n");

    println!("=== Search Demo ===");
    let config = SearchConfig::default().with_board_size(5).with_passes(1);
    let mut selector = MoveSelector::new(config)?;
    let best = selector.choose_move()?;
    println!("Best opening move: {}", selector.action_space().describe(best));
    Ok(())
}
