#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concurrent maze exploration system.
//!
//! A run seeds one explorer at the maze entrance. Every explorer walks a
//! straight corridor and, before each step, offers branches perpendicular to
//! its motion. Accepted branches become new explorers scheduled on a bounded
//! pool of worker threads. The shared [`ExplorationRegistry`] grants each
//! `(cell, direction)` pair to exactly one explorer, which bounds the number of
//! explorers by `4 × rows × columns` and guarantees termination. The run ends
//! when the registry's wait group drains to zero.

mod dispatcher;
mod explorer;
mod observer;
mod registry;

use std::{num::NonZeroUsize, thread, time::Duration};

use maze_explorer_core::{CellCoord, Direction, ExplorationObserver, ExplorationView, RunSummary};
use maze_explorer_world::MazeGrid;
use thiserror::Error;
use tracing::{error, info};

use crate::dispatcher::{work, Dispatcher};

pub use crate::observer::{ChannelObserver, ExplorationEvent};
pub use crate::registry::ExplorationRegistry;

/// Default upper bound on the number of explorers created per run.
pub const DEFAULT_MAX_TASKS: u32 = 500;

/// Failures that prevent a run from starting.
#[derive(Debug, Error)]
pub enum ExplorationError {
    /// The operating system refused to start a worker thread.
    #[error("failed to start exploration worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Configuration parameters required to construct the exploration system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    entrance: CellCoord,
    initial_direction: Direction,
    starting_steps: u32,
    max_tasks: u32,
    workers: NonZeroUsize,
    step_delay: Duration,
}

impl Config {
    /// Creates a configuration that seeds the first explorer at `entrance`.
    #[must_use]
    pub fn new(entrance: CellCoord, initial_direction: Direction) -> Self {
        Self {
            entrance,
            initial_direction,
            starting_steps: 0,
            max_tasks: DEFAULT_MAX_TASKS,
            workers: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            step_delay: Duration::ZERO,
        }
    }

    /// Sets the corridor length the first explorer starts with.
    #[must_use]
    pub fn with_starting_steps(mut self, starting_steps: u32) -> Self {
        self.starting_steps = starting_steps;
        self
    }

    /// Sets the maximum number of explorers created during a run.
    #[must_use]
    pub fn with_max_tasks(mut self, max_tasks: u32) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Sets the number of worker threads in the pool.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the pacing delay applied before every explorer step.
    #[must_use]
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// Cell the first explorer starts from.
    #[must_use]
    pub const fn entrance(&self) -> CellCoord {
        self.entrance
    }

    /// Direction the first explorer travels in.
    #[must_use]
    pub const fn initial_direction(&self) -> Direction {
        self.initial_direction
    }

    /// Maximum number of explorers created during a run.
    #[must_use]
    pub const fn max_tasks(&self) -> u32 {
        self.max_tasks
    }

    /// Number of worker threads in the pool.
    #[must_use]
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(CellCoord::new(0, 0), Direction::Right)
    }
}

/// Entry point that runs concurrent explorations over a maze.
#[derive(Clone, Copy, Debug, Default)]
pub struct Exploration {
    config: Config,
}

impl Exploration {
    /// Creates a new exploration system using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the system was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Explores `grid` to completion and reports the goal arrivals found.
    pub fn run(
        &self,
        grid: &MazeGrid,
        observer: &dyn ExplorationObserver,
    ) -> Result<RunSummary, ExplorationError> {
        let registry = ExplorationRegistry::new(grid, self.config.max_tasks);
        self.run_with(grid, &registry, observer, None)
    }

    /// Explores `grid` to completion, handing a live snapshot to `on_snapshot`
    /// every `interval` while explorers are still walking.
    ///
    /// Snapshots are taken on the calling thread and may lag behind the
    /// explorers they depict.
    pub fn run_monitored<F>(
        &self,
        grid: &MazeGrid,
        observer: &dyn ExplorationObserver,
        interval: Duration,
        mut on_snapshot: F,
    ) -> Result<RunSummary, ExplorationError>
    where
        F: FnMut(&ExplorationView),
    {
        let registry = ExplorationRegistry::new(grid, self.config.max_tasks);
        let on_snapshot: &mut dyn FnMut(&ExplorationView) = &mut on_snapshot;
        self.run_with(grid, &registry, observer, Some((interval, on_snapshot)))
    }

    fn run_with(
        &self,
        grid: &MazeGrid,
        registry: &ExplorationRegistry,
        observer: &dyn ExplorationObserver,
        monitor: Option<(Duration, &mut dyn FnMut(&ExplorationView))>,
    ) -> Result<RunSummary, ExplorationError> {
        info!(
            columns = grid.columns(),
            rows = grid.rows(),
            workers = self.config.workers.get(),
            max_tasks = self.config.max_tasks,
            "starting exploration"
        );

        let (jobs, queue) = crossbeam_channel::unbounded();
        let dispatcher = Dispatcher::new(grid, registry, observer, jobs, self.config.step_delay);

        thread::scope(|scope| {
            let mut started = 0;
            for index in 0..self.config.workers.get() {
                let queue = queue.clone();
                let dispatcher = &dispatcher;
                let spawned = thread::Builder::new()
                    .name(format!("explorer-{index}"))
                    .spawn_scoped(scope, move || work(dispatcher, queue));
                match spawned {
                    Ok(_) => started += 1,
                    Err(spawn_error) => {
                        error!(%spawn_error, "failed to start exploration worker");
                        dispatcher.shutdown(started);
                        return Err(ExplorationError::WorkerSpawn(spawn_error));
                    }
                }
            }
            drop(queue);

            if dispatcher.seed(
                self.config.entrance,
                self.config.initial_direction,
                self.config.starting_steps,
            ) {
                match monitor {
                    Some((interval, on_snapshot)) => {
                        while !registry.wait_until_idle_for(interval) {
                            on_snapshot(&registry.snapshot());
                        }
                    }
                    None => registry.wait_until_idle(),
                }
            }

            dispatcher.shutdown(started);
            Ok(())
        })?;

        let summary = registry.summary();
        info!(
            goal_arrivals = summary.goal_arrivals,
            tasks_spawned = summary.tasks_spawned,
            branches_dropped = summary.branches_dropped,
            "exploration finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use maze_explorer_core::NoopObserver;

    use super::*;

    fn single_worker() -> Config {
        Config::default().with_workers(NonZeroUsize::MIN)
    }

    #[test]
    fn config_defaults_seed_top_left_moving_right() {
        let config = Config::default();
        assert_eq!(config.entrance(), CellCoord::new(0, 0));
        assert_eq!(config.initial_direction(), Direction::Right);
        assert_eq!(config.max_tasks(), DEFAULT_MAX_TASKS);
    }

    #[test]
    fn entrance_on_a_wall_finishes_without_explorers() {
        let grid = MazeGrid::parse("2 1\n* \n").expect("grid");
        let summary = Exploration::new(single_worker())
            .run(&grid, &NoopObserver)
            .expect("run");

        assert_eq!(summary.tasks_spawned, 0);
        assert_eq!(summary.goal_arrivals, 0);
    }

    #[test]
    fn entrance_on_a_goal_counts_one_arrival() {
        let grid = MazeGrid::parse("2 1\n/ \n").expect("grid");
        let summary = Exploration::new(single_worker())
            .run(&grid, &NoopObserver)
            .expect("run");

        assert_eq!(summary.tasks_spawned, 0);
        assert_eq!(summary.goal_arrivals, 1);
    }

    #[test]
    fn monitored_runs_report_the_same_totals() {
        let grid = MazeGrid::parse("5 3\n     \n * * \n    /\n").expect("grid");
        let exploration =
            Exploration::new(single_worker().with_step_delay(Duration::from_millis(1)));

        let plain = exploration.run(&grid, &NoopObserver).expect("run");
        let monitored = exploration
            .run_monitored(&grid, &NoopObserver, Duration::from_millis(1), |view| {
                assert!(view.iter().count() <= DEFAULT_MAX_TASKS as usize);
            })
            .expect("monitored run");

        assert_eq!(plain.goal_arrivals, monitored.goal_arrivals);
        assert!(monitored.goal_arrivals >= 1);
    }
}
