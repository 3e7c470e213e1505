#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Text rendering contracts shared by maze explorer adapters.

use std::{
    fmt::Write as _,
    io::Write,
    sync::{Mutex, PoisonError},
};

use anyhow::{Context, Result as AnyResult};
use maze_explorer_core::{
    BranchArrival, CellCoord, CellKind, Direction, ExplorationObserver, ExplorationView,
    TaskReport, TerminalKind,
};
use maze_explorer_world::MazeGrid;
use tracing::warn;

/// Banner printed above every rendered maze.
pub const MAZE_BANNER: &str = "__________Maze__________";

/// Glyph used to draw an explorer travelling in `direction`.
#[must_use]
pub const fn direction_glyph(direction: Direction) -> char {
    match direction {
        Direction::Up => '^',
        Direction::Right => '>',
        Direction::Down => 'v',
        Direction::Left => '<',
    }
}

/// Renders the maze with column indices above and row indices on the left.
///
/// Indices wrap at ten so that every cell keeps a two-character slot.
#[must_use]
pub fn render_grid(grid: &MazeGrid) -> String {
    render_with_markers(grid, |_| None)
}

/// Renders the maze with every explorer of `view` drawn on top of its cell.
///
/// When several explorers share a cell, a live explorer wins over a retired one
/// and the highest identifier wins among equals.
#[must_use]
pub fn render_snapshot(grid: &MazeGrid, view: &ExplorationView) -> String {
    let mut markers: Vec<Option<(bool, char)>> = vec![None; grid.cell_count()];
    for explorer in view.iter() {
        let Some(slot) = grid.index(explorer.cell).and_then(|index| markers.get_mut(index)) else {
            continue;
        };
        let replace = slot.map_or(true, |(alive, _)| !alive || explorer.alive);
        if replace {
            *slot = Some((explorer.alive, direction_glyph(explorer.direction)));
        }
    }

    let mut frame = render_with_markers(grid, |cell| {
        grid.index(cell)
            .and_then(|index| markers.get(index).copied().flatten())
            .map(|(_, glyph)| glyph)
    });
    let _ = writeln!(
        frame,
        "{} explorers walking, {} goal arrivals so far",
        view.active_count(),
        view.goal_arrivals()
    );
    frame
}

fn render_with_markers<F>(grid: &MazeGrid, marker: F) -> String
where
    F: Fn(CellCoord) -> Option<char>,
{
    let mut frame = String::new();
    let _ = writeln!(frame, "{MAZE_BANNER}");
    frame.push_str("   ");
    for column in 0..grid.columns() {
        let _ = write!(frame, "{} ", column % 10);
    }
    frame.push('\n');

    for row in 0..grid.rows() {
        let _ = write!(frame, "{:>2} ", row % 100);
        for column in 0..grid.columns() {
            let cell = CellCoord::new(column, row);
            let glyph = marker(cell).unwrap_or_else(|| match grid.kind(cell) {
                Some(CellKind::Open) | None => ' ',
                Some(kind) => kind.glyph(),
            });
            frame.push(glyph);
            frame.push(' ');
        }
        frame.push('\n');
    }
    frame
}

/// Describes how an explorer terminated in a single line.
#[must_use]
pub fn describe_report(report: &TaskReport) -> String {
    let cell = report.target.unwrap_or(report.position);
    let (column, row) = (cell.column(), cell.row());
    match report.kind {
        TerminalKind::Blocked if report.target.is_none() => format!(
            "Explorer {} walked off the maze edge at ({column}, {row}) after {} cells.",
            report.task, report.steps
        ),
        TerminalKind::Blocked => format!(
            "Explorer {} hit a wall at ({column}, {row}) after {} cells.",
            report.task, report.steps
        ),
        TerminalKind::Looped => format!(
            "Explorer {} found ({column}, {row}) already explored heading {:?} after {} cells.",
            report.task, report.direction, report.steps
        ),
        TerminalKind::GoalReached => format!(
            "Explorer {} reached the exit at ({column}, {row}) after {} cells.",
            report.task, report.steps
        ),
    }
}

/// Describes a branch that landed on a goal without spawning an explorer.
#[must_use]
pub fn describe_branch_arrival(arrival: &BranchArrival) -> String {
    format!(
        "A branch heading {:?} reached the exit at ({}, {}) after {} cells.",
        arrival.direction,
        arrival.cell.column(),
        arrival.cell.row(),
        arrival.steps
    )
}

/// Writes the rendered maze to `out`.
pub fn write_grid<W>(out: &mut W, grid: &MazeGrid) -> AnyResult<()>
where
    W: Write,
{
    out.write_all(render_grid(grid).as_bytes())
        .context("failed to write maze")?;
    out.flush().context("failed to flush maze output")
}

/// Observer printing one line per exploration event to a shared writer.
///
/// Lines from concurrent explorers are serialised through a mutex so that they
/// never interleave. Dropped branches are only printed when `verbose` is set.
#[derive(Debug)]
pub struct ConsoleObserver<W> {
    out: Mutex<W>,
    verbose: bool,
}

impl<W> ConsoleObserver<W>
where
    W: Write + Send,
{
    /// Creates an observer writing to `out`.
    #[must_use]
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out: Mutex::new(out),
            verbose,
        }
    }

    /// Writes a free-form block, such as a snapshot, without interleaving.
    pub fn write_block(&self, block: &str) {
        self.emit(block.trim_end_matches('\n'));
    }

    /// Releases the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(%error, "failed to write exploration output");
        }
    }
}

impl<W> ExplorationObserver for ConsoleObserver<W>
where
    W: Write + Send,
{
    fn task_finished(&self, report: &TaskReport) {
        self.emit(&describe_report(report));
    }

    fn branch_reached_goal(&self, arrival: &BranchArrival) {
        self.emit(&describe_branch_arrival(arrival));
    }

    fn branch_dropped(&self, cell: CellCoord, direction: Direction) {
        if self.verbose {
            self.emit(&format!(
                "Task capacity exhausted; branch heading {direction:?} from ({}, {}) was left unexplored.",
                cell.column(),
                cell.row()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use maze_explorer_core::{ExplorerSnapshot, TaskId};

    use super::*;

    fn grid() -> MazeGrid {
        MazeGrid::parse("3 2\n  *\n/  \n").expect("grid")
    }

    #[test]
    fn grid_rendering_shows_indices_and_glyphs() {
        let rendered = render_grid(&grid());
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], MAZE_BANNER);
        assert_eq!(lines[1], "   0 1 2 ");
        assert_eq!(lines[2], " 0     * ");
        assert_eq!(lines[3], " 1 /     ");
    }

    #[test]
    fn live_explorers_are_drawn_over_retired_ones() {
        let view = ExplorationView::from_snapshots(
            vec![
                ExplorerSnapshot {
                    id: TaskId::new(0),
                    cell: CellCoord::new(1, 1),
                    direction: Direction::Right,
                    alive: true,
                },
                ExplorerSnapshot {
                    id: TaskId::new(1),
                    cell: CellCoord::new(1, 1),
                    direction: Direction::Up,
                    alive: false,
                },
                ExplorerSnapshot {
                    id: TaskId::new(2),
                    cell: CellCoord::new(0, 0),
                    direction: Direction::Down,
                    alive: false,
                },
            ],
            1,
        );

        let rendered = render_snapshot(&grid(), &view);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[2], " 0 v   * ");
        assert_eq!(lines[3], " 1 / >   ");
        assert_eq!(lines[4], "1 explorers walking, 1 goal arrivals so far");
    }

    #[test]
    fn reports_name_the_cell_that_ended_the_walk() {
        let report = TaskReport {
            task: TaskId::new(4),
            kind: TerminalKind::Blocked,
            direction: Direction::Right,
            position: CellCoord::new(0, 0),
            target: Some(CellCoord::new(1, 0)),
            steps: 3,
        };
        assert_eq!(
            describe_report(&report),
            "Explorer 4 hit a wall at (1, 0) after 3 cells."
        );

        let edge = TaskReport {
            target: None,
            ..report
        };
        assert!(describe_report(&edge).contains("maze edge at (0, 0)"));
    }

    #[test]
    fn console_observer_writes_whole_lines() {
        let observer = ConsoleObserver::new(Vec::new(), false);
        observer.branch_reached_goal(&BranchArrival {
            cell: CellCoord::new(2, 1),
            direction: Direction::Down,
            steps: 5,
        });
        observer.branch_dropped(CellCoord::new(0, 0), Direction::Up);

        let written = String::from_utf8(observer.into_inner()).expect("utf-8 output");
        assert_eq!(
            written,
            "A branch heading Down reached the exit at (2, 1) after 5 cells.\n"
        );
    }

    #[test]
    fn verbose_console_observer_reports_dropped_branches() {
        let observer = ConsoleObserver::new(Vec::new(), true);
        observer.branch_dropped(CellCoord::new(3, 2), Direction::Left);

        let written = String::from_utf8(observer.into_inner()).expect("utf-8 output");
        assert!(written.contains("heading Left from (3, 2)"));
    }
}
