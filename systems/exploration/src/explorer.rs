//! Straight-corridor walking loop executed by every explorer.

use maze_explorer_core::{CellCoord, Direction, TaskId, TaskReport, TerminalKind};

use crate::dispatcher::Dispatcher;

/// Lifecycle of an explorer. Every state other than `Moving` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExplorerState {
    Moving,
    Finished(TerminalKind),
}

/// A single exploration line travelling in a fixed direction.
#[derive(Debug)]
pub(crate) struct Explorer {
    id: TaskId,
    position: CellCoord,
    direction: Direction,
    steps: u32,
    target: Option<CellCoord>,
}

impl Explorer {
    pub(crate) fn new(id: TaskId, position: CellCoord, direction: Direction, steps: u32) -> Self {
        Self {
            id,
            position,
            direction,
            steps,
            target: None,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Walks the corridor until a terminal state is reached.
    pub(crate) fn run(mut self, dispatcher: &Dispatcher<'_>) -> TaskReport {
        loop {
            if let ExplorerState::Finished(kind) = self.step(dispatcher) {
                return self.report(kind);
            }
        }
    }

    fn step(&mut self, dispatcher: &Dispatcher<'_>) -> ExplorerState {
        dispatcher.pace();

        // Branches leave from the occupied cell before the explorer moves on.
        for branch in self.direction.perpendicular() {
            if let Some(cell) = self.position.neighbor(branch) {
                dispatcher.attempt_spawn(cell, branch, self.steps);
            }
        }

        let grid = dispatcher.grid();
        let registry = dispatcher.registry();
        self.target = self
            .position
            .neighbor(self.direction)
            .filter(|cell| grid.in_bounds(*cell));

        let Some(next) = self.target else {
            return ExplorerState::Finished(TerminalKind::Blocked);
        };
        if grid.is_wall(next) {
            return ExplorerState::Finished(TerminalKind::Blocked);
        }
        if !registry.try_mark_visited(next, self.direction) {
            return ExplorerState::Finished(TerminalKind::Looped);
        }
        if grid.is_goal(next) {
            registry.record_goal_arrival();
            return ExplorerState::Finished(TerminalKind::GoalReached);
        }

        self.position = next;
        self.steps = self.steps.saturating_add(1);
        registry.update_position(self.id, next);
        ExplorerState::Moving
    }

    fn report(&self, kind: TerminalKind) -> TaskReport {
        let steps = match kind {
            TerminalKind::GoalReached => self.steps.saturating_add(1),
            TerminalKind::Blocked | TerminalKind::Looped => self.steps,
        };
        TaskReport {
            task: self.id,
            kind,
            direction: self.direction,
            position: self.position,
            target: self.target,
            steps,
        }
    }
}
