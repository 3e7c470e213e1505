#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that explores a maze file and reports its exits.

use std::{
    fs, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use maze_explorer_core::{CellCoord, Direction};
use maze_explorer_rendering::{render_snapshot, write_grid, ConsoleObserver};
use maze_explorer_system_exploration::{Config, Exploration, DEFAULT_MAX_TASKS};
use maze_explorer_world::MazeGrid;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Command-line arguments accepted by the maze explorer.
#[derive(Debug, Parser)]
#[command(name = "maze-explorer")]
#[command(version)]
#[command(about = "Counts the paths leading out of a maze with concurrent explorers")]
struct Cli {
    /// Maze file: a `columns rows` header followed by one line per row.
    #[arg(default_value = "maze.txt")]
    maze: PathBuf,

    /// Maximum number of explorers created during the run.
    #[arg(long, default_value_t = DEFAULT_MAX_TASKS)]
    max_tasks: u32,

    /// Number of worker threads; defaults to the available parallelism.
    #[arg(long)]
    workers: Option<NonZeroUsize>,

    /// Pause applied before every explorer step, in milliseconds.
    #[arg(long, default_value_t = 0)]
    step_delay_ms: u64,

    /// Row of the cell the first explorer starts from.
    #[arg(long, default_value_t = 0)]
    entrance_row: u32,

    /// Column of the cell the first explorer starts from.
    #[arg(long, default_value_t = 0)]
    entrance_column: u32,

    /// Direction the first explorer travels in.
    #[arg(long, value_enum, default_value_t = DirectionArg::Right)]
    direction: DirectionArg,

    /// Print a maze snapshot with live explorers at this interval, in milliseconds.
    #[arg(long)]
    render_interval_ms: Option<u64>,

    /// Enable debug logging and report dropped branches.
    #[arg(short, long)]
    verbose: bool,
}

/// Direction names accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DirectionArg {
    Up,
    Right,
    Down,
    Left,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Right => Direction::Right,
            DirectionArg::Down => Direction::Down,
            DirectionArg::Left => Direction::Left,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        let entrance = CellCoord::new(self.entrance_column, self.entrance_row);
        let config = Config::new(entrance, self.direction.into())
            .with_max_tasks(self.max_tasks)
            .with_step_delay(Duration::from_millis(self.step_delay_ms));
        match self.workers {
            Some(workers) => config.with_workers(workers),
            None => config,
        }
    }

    fn render_interval(&self) -> Option<Duration> {
        self.render_interval_ms
            .filter(|interval| *interval > 0)
            .map(Duration::from_millis)
    }
}

/// Reads and parses the maze stored at `path`.
fn load_maze(path: &Path) -> Result<MazeGrid> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read maze file {}", path.display()))?;
    MazeGrid::parse(&source).with_context(|| format!("invalid maze file {}", path.display()))
}

/// Entry point for the maze explorer command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let grid = load_maze(&cli.maze)?;
    info!(
        maze = %cli.maze.display(),
        columns = grid.columns(),
        rows = grid.rows(),
        "maze loaded"
    );
    write_grid(&mut io::stdout().lock(), &grid)?;

    let exploration = Exploration::new(cli.config());
    let observer = ConsoleObserver::new(io::stdout(), cli.verbose);
    let summary = match cli.render_interval() {
        Some(interval) => exploration.run_monitored(&grid, &observer, interval, |view| {
            observer.write_block(&render_snapshot(&grid, view));
        })?,
        None => exploration.run(&grid, &observer)?,
    };

    observer.write_block(&summary.verdict().to_string());
    Ok(())
}
