//! Shared bookkeeping consulted by every explorer.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
        Condvar, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use maze_explorer_core::{
    CellCoord, Direction, ExplorationView, ExplorerSnapshot, RunSummary, TaskId,
};
use maze_explorer_world::MazeGrid;

/// Synchronised state shared by all explorers of a single run.
///
/// Visit marks live in one atomic bitmask per cell, so a check-then-set on a
/// `(cell, direction)` pair is a single `fetch_or`. The active-task counter
/// doubles as a wait group: spawning increments it, termination decrements
/// it, and [`ExplorationRegistry::wait_until_idle`] blocks until it drains.
#[derive(Debug)]
pub struct ExplorationRegistry {
    columns: u32,
    rows: u32,
    visited: Vec<AtomicU8>,
    max_tasks: u32,
    tasks: Mutex<Vec<TaskRecord>>,
    active: Mutex<usize>,
    idle: Condvar,
    abandoned: AtomicBool,
    goal_arrivals: AtomicU64,
    branches_dropped: AtomicU64,
}

#[derive(Clone, Copy, Debug)]
struct TaskRecord {
    cell: CellCoord,
    direction: Direction,
    alive: bool,
}

impl ExplorationRegistry {
    /// Creates an empty registry sized for the provided grid.
    #[must_use]
    pub fn new(grid: &MazeGrid, max_tasks: u32) -> Self {
        Self {
            columns: grid.columns(),
            rows: grid.rows(),
            visited: (0..grid.cell_count()).map(|_| AtomicU8::new(0)).collect(),
            max_tasks,
            tasks: Mutex::new(Vec::new()),
            active: Mutex::new(0),
            idle: Condvar::new(),
            abandoned: AtomicBool::new(false),
            goal_arrivals: AtomicU64::new(0),
            branches_dropped: AtomicU64::new(0),
        }
    }

    /// Marks `cell` as entered in `direction`.
    ///
    /// Returns `true` for exactly one caller per `(cell, direction)` pair over
    /// the lifetime of the registry; cells outside the grid are never marked.
    pub fn try_mark_visited(&self, cell: CellCoord, direction: Direction) -> bool {
        let Some(slot) = self.index(cell).and_then(|index| self.visited.get(index)) else {
            return false;
        };
        let bit = direction_bit(direction);
        let previous = slot.fetch_or(bit, Ordering::AcqRel);
        previous & bit == 0
    }

    /// Reports whether `cell` has been entered in `direction`.
    #[must_use]
    pub fn is_visited(&self, cell: CellCoord, direction: Direction) -> bool {
        self.index(cell)
            .and_then(|index| self.visited.get(index))
            .is_some_and(|slot| slot.load(Ordering::Acquire) & direction_bit(direction) != 0)
    }

    /// Number of `(cell, direction)` pairs marked so far.
    #[cfg(test)]
    fn visited_count(&self) -> usize {
        self.visited
            .iter()
            .map(|slot| slot.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Reports whether every task slot has been handed out.
    #[must_use]
    pub fn capacity_exhausted(&self) -> bool {
        self.tasks_spawned() >= self.max_tasks
    }

    /// Allocates the next task identifier and records the explorer's origin.
    ///
    /// Returns `None` once `max_tasks` identifiers have been issued.
    pub fn allocate_task_id(&self, cell: CellCoord, direction: Direction) -> Option<TaskId> {
        let mut tasks = lock(&self.tasks);
        let next = u32::try_from(tasks.len()).ok()?;
        if next >= self.max_tasks {
            return None;
        }
        tasks.push(TaskRecord {
            cell,
            direction,
            alive: true,
        });
        Some(TaskId::new(next))
    }

    /// Number of task identifiers issued so far.
    #[must_use]
    pub fn tasks_spawned(&self) -> u32 {
        u32::try_from(lock(&self.tasks).len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn update_position(&self, task: TaskId, cell: CellCoord) {
        if let Some(record) = lock(&self.tasks).get_mut(task.get() as usize) {
            record.cell = cell;
        }
    }

    pub(crate) fn retire(&self, task: TaskId) {
        if let Some(record) = lock(&self.tasks).get_mut(task.get() as usize) {
            record.alive = false;
        }
    }

    /// Registers a newly scheduled explorer with the wait group.
    pub fn increment_active(&self) {
        *lock(&self.active) += 1;
    }

    /// Removes a terminated explorer from the wait group.
    ///
    /// Must run after every other registry write of the explorer's final step.
    pub fn decrement_active(&self) {
        let mut active = lock(&self.active);
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.idle.notify_all();
        }
    }

    /// Releases every waiter after a worker died mid-explorer.
    ///
    /// Explorers still queued may never run, so the wait group can no longer
    /// be trusted to drain.
    pub(crate) fn abandon(&self) {
        let _active = lock(&self.active);
        self.abandoned.store(true, Ordering::Release);
        self.idle.notify_all();
    }

    fn still_busy(&self, active: usize) -> bool {
        active > 0 && !self.abandoned.load(Ordering::Acquire)
    }

    /// Number of explorers currently alive.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        *lock(&self.active)
    }

    /// Blocks until no explorer is alive or a worker has died.
    pub fn wait_until_idle(&self) {
        let active = lock(&self.active);
        let _idle = self
            .idle
            .wait_while(active, |active| self.still_busy(*active))
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Same as [`ExplorationRegistry::wait_until_idle`], giving up after `timeout`.
    ///
    /// Returns `true` unless the timeout elapsed first.
    pub fn wait_until_idle_for(&self, timeout: Duration) -> bool {
        let active = lock(&self.active);
        let (active, _) = self
            .idle
            .wait_timeout_while(active, timeout, |active| self.still_busy(*active))
            .unwrap_or_else(PoisonError::into_inner);
        !self.still_busy(*active)
    }

    /// Counts one goal arrival.
    pub fn record_goal_arrival(&self) {
        let _ = self.goal_arrivals.fetch_add(1, Ordering::AcqRel);
    }

    /// Goal arrivals recorded so far.
    #[must_use]
    pub fn goal_arrivals(&self) -> u64 {
        self.goal_arrivals.load(Ordering::Acquire)
    }

    /// Counts one abandoned branch, returning the previous count.
    pub(crate) fn record_dropped_branch(&self) -> u64 {
        self.branches_dropped.fetch_add(1, Ordering::AcqRel)
    }

    /// Best-effort view of every explorer allocated so far.
    #[must_use]
    pub fn snapshot(&self) -> ExplorationView {
        let explorers = lock(&self.tasks)
            .iter()
            .enumerate()
            .map(|(index, record)| ExplorerSnapshot {
                id: TaskId::new(index as u32),
                cell: record.cell,
                direction: record.direction,
                alive: record.alive,
            })
            .collect();
        ExplorationView::from_snapshots(explorers, self.goal_arrivals())
    }

    /// Totals accumulated by the run so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            goal_arrivals: self.goal_arrivals(),
            tasks_spawned: self.tasks_spawned(),
            branches_dropped: self.branches_dropped.load(Ordering::Acquire),
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

const fn direction_bit(direction: Direction) -> u8 {
    1 << direction.ordinal()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use maze_explorer_core::CellKind;

    use super::*;

    fn open_grid(columns: u32, rows: u32) -> MazeGrid {
        let cells = vec![CellKind::Open; (columns * rows) as usize];
        MazeGrid::new(columns, rows, cells).expect("valid grid")
    }

    #[test]
    fn marks_are_granted_once_per_direction() {
        let registry = ExplorationRegistry::new(&open_grid(3, 3), 8);
        let cell = CellCoord::new(1, 1);

        assert!(registry.try_mark_visited(cell, Direction::Up));
        assert!(!registry.try_mark_visited(cell, Direction::Up));
        assert!(registry.try_mark_visited(cell, Direction::Left));
        assert!(registry.is_visited(cell, Direction::Left));
        assert!(!registry.is_visited(cell, Direction::Down));
        assert_eq!(registry.visited_count(), 2);
    }

    #[test]
    fn marks_outside_the_grid_are_refused() {
        let registry = ExplorationRegistry::new(&open_grid(2, 2), 8);
        assert!(!registry.try_mark_visited(CellCoord::new(2, 0), Direction::Right));
        assert_eq!(registry.visited_count(), 0);
    }

    #[test]
    fn concurrent_marks_have_a_single_winner() {
        let registry = Arc::new(ExplorationRegistry::new(&open_grid(4, 4), 8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let mut wins = 0;
                    for row in 0..4 {
                        for column in 0..4 {
                            for direction in Direction::ALL {
                                if registry.try_mark_visited(CellCoord::new(column, row), direction)
                                {
                                    wins += 1;
                                }
                            }
                        }
                    }
                    wins
                })
            })
            .collect();

        let total: usize = handles
            .into_iter()
            .map(|handle| handle.join().expect("marking thread"))
            .sum();
        assert_eq!(total, 4 * 4 * 4);
    }

    #[test]
    fn task_ids_stop_at_capacity() {
        let registry = ExplorationRegistry::new(&open_grid(2, 2), 2);
        let cell = CellCoord::new(0, 0);

        assert_eq!(registry.allocate_task_id(cell, Direction::Right), Some(TaskId::new(0)));
        assert!(!registry.capacity_exhausted());
        assert_eq!(registry.allocate_task_id(cell, Direction::Down), Some(TaskId::new(1)));
        assert!(registry.capacity_exhausted());
        assert_eq!(registry.allocate_task_id(cell, Direction::Left), None);
        assert_eq!(registry.tasks_spawned(), 2);
    }

    #[test]
    fn wait_group_releases_when_last_task_ends() {
        let registry = Arc::new(ExplorationRegistry::new(&open_grid(1, 1), 4));
        registry.increment_active();
        registry.increment_active();
        assert!(!registry.wait_until_idle_for(Duration::from_millis(5)));

        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry.decrement_active();
                registry.decrement_active();
            })
        };

        registry.wait_until_idle();
        worker.join().expect("decrementing thread");
        assert_eq!(registry.active_tasks(), 0);
        assert!(registry.wait_until_idle_for(Duration::ZERO));
    }

    #[test]
    fn abandoning_releases_waiters_with_tasks_outstanding() {
        let registry = ExplorationRegistry::new(&open_grid(1, 1), 4);
        registry.increment_active();
        registry.increment_active();
        registry.abandon();

        registry.wait_until_idle();
        assert!(registry.wait_until_idle_for(Duration::ZERO));
        assert_eq!(registry.active_tasks(), 2);
    }

    #[test]
    fn snapshot_tracks_positions_and_retirement() {
        let registry = ExplorationRegistry::new(&open_grid(3, 1), 4);
        let first = registry
            .allocate_task_id(CellCoord::new(0, 0), Direction::Right)
            .expect("capacity");
        registry.update_position(first, CellCoord::new(2, 0));
        registry.retire(first);
        registry.record_goal_arrival();

        let view = registry.snapshot();
        let explorers = view.clone().into_vec();
        assert_eq!(explorers.len(), 1);
        assert_eq!(explorers[0].cell, CellCoord::new(2, 0));
        assert!(!explorers[0].alive);
        assert_eq!(view.active_count(), 0);
        assert_eq!(view.goal_arrivals(), 1);
    }
}
