//! Branch admission policy and the worker pool that runs explorers.

use std::{thread, time::Duration};

use crossbeam_channel::{Receiver, Sender};
use maze_explorer_core::{BranchArrival, CellCoord, Direction, ExplorationObserver, TaskId};
use maze_explorer_world::MazeGrid;
use tracing::{debug, error, warn};

use crate::{explorer::Explorer, registry::ExplorationRegistry};

/// Work items consumed by pool workers.
#[derive(Debug)]
pub(crate) enum Job {
    Explore(Explorer),
    Shutdown,
}

/// Decides which branches become explorers and schedules them on the pool.
pub(crate) struct Dispatcher<'run> {
    grid: &'run MazeGrid,
    registry: &'run ExplorationRegistry,
    observer: &'run dyn ExplorationObserver,
    jobs: Sender<Job>,
    step_delay: Duration,
}

impl<'run> Dispatcher<'run> {
    pub(crate) fn new(
        grid: &'run MazeGrid,
        registry: &'run ExplorationRegistry,
        observer: &'run dyn ExplorationObserver,
        jobs: Sender<Job>,
        step_delay: Duration,
    ) -> Self {
        Self {
            grid,
            registry,
            observer,
            jobs,
            step_delay,
        }
    }

    pub(crate) fn grid(&self) -> &'run MazeGrid {
        self.grid
    }

    pub(crate) fn registry(&self) -> &'run ExplorationRegistry {
        self.registry
    }

    /// Sleeps for the configured pacing delay, if any.
    pub(crate) fn pace(&self) {
        if !self.step_delay.is_zero() {
            thread::sleep(self.step_delay);
        }
    }

    /// Offers a branch from an explorer that has walked `inherited_steps`.
    ///
    /// A spawned explorer starts with `inherited_steps + 1`.
    pub(crate) fn attempt_spawn(
        &self,
        cell: CellCoord,
        direction: Direction,
        inherited_steps: u32,
    ) {
        let _ = self.offer(cell, direction, inherited_steps.saturating_add(1));
    }

    /// Offers the first explorer of a run. Returns `true` when it was scheduled.
    pub(crate) fn seed(&self, cell: CellCoord, direction: Direction, starting_steps: u32) -> bool {
        self.offer(cell, direction, starting_steps)
    }

    fn offer(&self, cell: CellCoord, direction: Direction, starting_steps: u32) -> bool {
        if !self.grid.in_bounds(cell) {
            return false;
        }
        if self.registry.capacity_exhausted() {
            // Walls and walked pairs would never have become explorers.
            if !self.grid.is_wall(cell) && !self.registry.is_visited(cell, direction) {
                self.drop_branch(cell, direction);
            }
            return false;
        }
        if !self.registry.try_mark_visited(cell, direction) {
            return false;
        }
        // The mark stays consumed even when the cell turns out to be a wall.
        if self.grid.is_wall(cell) {
            return false;
        }
        if self.grid.is_goal(cell) {
            self.registry.record_goal_arrival();
            debug!(
                column = cell.column(),
                row = cell.row(),
                ?direction,
                steps = starting_steps,
                "branch reached goal"
            );
            self.observer.branch_reached_goal(&BranchArrival {
                cell,
                direction,
                steps: starting_steps,
            });
            return false;
        }

        let Some(id) = self.registry.allocate_task_id(cell, direction) else {
            self.drop_branch(cell, direction);
            return false;
        };
        self.registry.increment_active();
        debug!(
            task = id.get(),
            column = cell.column(),
            row = cell.row(),
            ?direction,
            steps = starting_steps,
            "spawning explorer"
        );

        let explorer = Explorer::new(id, cell, direction, starting_steps);
        if self.jobs.send(Job::Explore(explorer)).is_err() {
            error!(task = id.get(), "worker pool is gone; abandoning explorer");
            self.registry.retire(id);
            self.registry.decrement_active();
            return false;
        }
        true
    }

    fn drop_branch(&self, cell: CellCoord, direction: Direction) {
        if self.registry.record_dropped_branch() == 0 {
            warn!(
                column = cell.column(),
                row = cell.row(),
                ?direction,
                "task capacity exhausted; further branches are left unexplored"
            );
        } else {
            debug!(
                column = cell.column(),
                row = cell.row(),
                ?direction,
                "branch dropped"
            );
        }
        self.observer.branch_dropped(cell, direction);
    }

    /// Runs an explorer to completion and settles its terminal accounting.
    fn execute(&self, explorer: Explorer) {
        let _settle = Settle {
            registry: self.registry,
            task: explorer.id(),
        };
        let report = explorer.run(self);
        debug!(
            task = report.task.get(),
            kind = ?report.kind,
            column = report.position.column(),
            row = report.position.row(),
            steps = report.steps,
            "explorer finished"
        );
        self.observer.task_finished(&report);
    }

    /// Asks `workers` pool threads to exit once the queue drains to them.
    pub(crate) fn shutdown(&self, workers: usize) {
        for _ in 0..workers {
            if self.jobs.send(Job::Shutdown).is_err() {
                break;
            }
        }
    }
}

/// Retires a task and leaves the wait group when dropped, even while unwinding.
struct Settle<'run> {
    registry: &'run ExplorationRegistry,
    task: TaskId,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(task = self.task.get(), "explorer panicked; releasing the run");
            self.registry.abandon();
        }
        self.registry.retire(self.task);
        self.registry.decrement_active();
    }
}

/// Body of a pool worker thread.
pub(crate) fn work(dispatcher: &Dispatcher<'_>, jobs: Receiver<Job>) {
    for job in jobs.iter() {
        match job {
            Job::Explore(explorer) => dispatcher.execute(explorer),
            Job::Shutdown => break,
        }
    }
}
