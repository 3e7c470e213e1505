#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the maze explorer.
//!
//! This crate defines the vocabulary that connects the immutable maze grid,
//! the concurrent exploration system, and the presentation adapters. The
//! exploration system reports every terminal transition as a [`TaskReport`]
//! through an [`ExplorationObserver`], exposes live [`ExplorationView`]
//! snapshots for visualisation, and finishes each run with a [`RunSummary`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cardinal directions an explorer may travel in.
///
/// The declaration order doubles as the ordinal used to index per-direction
/// visit marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
}

impl Direction {
    /// Every direction in ordinal order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Small integer encoding of the direction in the range `0..4`.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    /// Row and column deltas applied by a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Right => (0, 1),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
        }
    }

    /// Reports whether the direction moves along a row.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }

    /// Directions perpendicular to this one, in the order branches are offered.
    ///
    /// Horizontal motion offers `Down` before `Up`; vertical motion offers
    /// `Right` before `Left`.
    #[must_use]
    pub const fn perpendicular(self) -> [Direction; 2] {
        if self.is_horizontal() {
            [Self::Down, Self::Up]
        } else {
            [Self::Right, Self::Left]
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Cell reached by a single step in `direction`.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant;
    /// the upper bounds are the grid's responsibility.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<CellCoord> {
        let (row_delta, column_delta) = direction.delta();
        let row = self.row.checked_add_signed(row_delta)?;
        let column = self.column.checked_add_signed(column_delta)?;
        Some(Self::new(column, row))
    }
}

/// Immutable classification of a maze cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Walkable floor.
    Open,
    /// Impassable wall.
    Wall,
    /// Exit cell that ends exploration along the corridor entering it.
    Goal,
}

impl CellKind {
    /// Glyph used for walls in the textual maze format.
    pub const WALL_GLYPH: char = '*';
    /// Glyph used for goals in the textual maze format.
    pub const GOAL_GLYPH: char = '/';

    /// Classifies a character from the textual maze format.
    ///
    /// Any character other than the wall and goal glyphs is open floor.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Self {
        match glyph {
            Self::WALL_GLYPH => Self::Wall,
            Self::GOAL_GLYPH => Self::Goal,
            _ => Self::Open,
        }
    }

    /// Canonical glyph for the cell kind.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Open => ' ',
            Self::Wall => Self::WALL_GLYPH,
            Self::Goal => Self::GOAL_GLYPH,
        }
    }
}

/// Unique identifier assigned to an explorer task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a new task identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three ways an explorer legitimately ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalKind {
    /// The next cell was a wall or lay outside the grid.
    Blocked,
    /// The next cell had already been entered in the same direction.
    Looped,
    /// The next cell was a goal.
    GoalReached,
}

/// Record emitted once per explorer when it reaches a terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Explorer that finished.
    pub task: TaskId,
    /// Terminal state the explorer reached.
    pub kind: TerminalKind,
    /// Fixed direction of travel of the explorer.
    pub direction: Direction,
    /// Last cell the explorer occupied.
    pub position: CellCoord,
    /// Cell the explorer attempted to enter, or `None` outside the grid.
    pub target: Option<CellCoord>,
    /// Corridor length accumulated by the explorer.
    ///
    /// Includes the final step into the goal for [`TerminalKind::GoalReached`].
    pub steps: u32,
}

/// Goal arrival detected by a branch offer rather than a running explorer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchArrival {
    /// Goal cell the branch would have entered.
    pub cell: CellCoord,
    /// Direction the branch would have travelled.
    pub direction: Direction,
    /// Corridor length a spawned explorer would have started with.
    pub steps: u32,
}

/// Receives exploration progress from concurrently running explorers.
///
/// Implementations are shared by every worker thread and must serialise
/// their own output. Callbacks never influence exploration semantics.
pub trait ExplorationObserver: Send + Sync {
    /// Called exactly once per explorer, before it stops counting as active.
    fn task_finished(&self, report: &TaskReport);

    /// Called when a branch offer targets a goal cell.
    fn branch_reached_goal(&self, _arrival: &BranchArrival) {}

    /// Called when a branch is abandoned because task capacity is exhausted.
    fn branch_dropped(&self, _cell: CellCoord, _direction: Direction) {}
}

/// Observer that discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ExplorationObserver for NoopObserver {
    fn task_finished(&self, _report: &TaskReport) {}
}

/// Immutable representation of a single explorer used for visualisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExplorerSnapshot {
    /// Identifier allocated to the explorer.
    pub id: TaskId,
    /// Cell currently (or finally) occupied by the explorer.
    pub cell: CellCoord,
    /// Fixed direction of travel.
    pub direction: Direction,
    /// Whether the explorer is still walking its corridor.
    pub alive: bool,
}

/// Read-only snapshot of every explorer allocated during a run.
///
/// Snapshots are best-effort: explorers keep moving while the view is held.
#[derive(Clone, Debug, Default)]
pub struct ExplorationView {
    explorers: Vec<ExplorerSnapshot>,
    goal_arrivals: u64,
}

impl ExplorationView {
    /// Creates a new view from the provided snapshots and arrival count.
    #[must_use]
    pub fn from_snapshots(mut explorers: Vec<ExplorerSnapshot>, goal_arrivals: u64) -> Self {
        explorers.sort_by_key(|snapshot| snapshot.id);
        Self {
            explorers,
            goal_arrivals,
        }
    }

    /// Iterator over the captured explorers in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ExplorerSnapshot> {
        self.explorers.iter()
    }

    /// Number of explorers still walking when the snapshot was taken.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.explorers.iter().filter(|snapshot| snapshot.alive).count()
    }

    /// Goal arrivals recorded when the snapshot was taken.
    #[must_use]
    pub const fn goal_arrivals(&self) -> u64 {
        self.goal_arrivals
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ExplorerSnapshot> {
        self.explorers
    }
}

/// Final accounting of a completed exploration run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of goal arrivals observed across all explorers and branch offers.
    pub goal_arrivals: u64,
    /// Number of explorers created during the run.
    pub tasks_spawned: u32,
    /// Number of branches abandoned because task capacity was exhausted.
    pub branches_dropped: u64,
}

impl RunSummary {
    /// Caller-facing interpretation of the goal arrival count.
    #[must_use]
    pub const fn verdict(&self) -> PathVerdict {
        match self.goal_arrivals {
            0 => PathVerdict::NoExit,
            1 => PathVerdict::SinglePath,
            count => PathVerdict::MultiplePaths(count),
        }
    }
}

/// Presentation of the goal arrival count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathVerdict {
    /// No explorer reached a goal.
    NoExit,
    /// Exactly one goal arrival was recorded.
    SinglePath,
    /// Several goal arrivals were recorded.
    MultiplePaths(u64),
}

impl fmt::Display for PathVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExit => write!(f, "No exit was found in the maze."),
            Self::SinglePath => write!(f, "There is exactly one path leading to the exit."),
            Self::MultiplePaths(count) => {
                write!(f, "There are {count} different paths leading to the exit.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, CellKind, Direction, PathVerdict, RunSummary, TaskId, TaskReport, TerminalKind,
    };

    #[test]
    fn neighbor_applies_direction_deltas() {
        let origin = CellCoord::new(3, 5);
        assert_eq!(origin.neighbor(Direction::Up), Some(CellCoord::new(3, 4)));
        assert_eq!(origin.neighbor(Direction::Right), Some(CellCoord::new(4, 5)));
        assert_eq!(origin.neighbor(Direction::Down), Some(CellCoord::new(3, 6)));
        assert_eq!(origin.neighbor(Direction::Left), Some(CellCoord::new(2, 5)));
    }

    #[test]
    fn neighbor_rejects_negative_coordinates() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.neighbor(Direction::Up), None);
        assert_eq!(corner.neighbor(Direction::Left), None);
    }

    #[test]
    fn perpendicular_follows_axis_of_motion() {
        assert_eq!(Direction::Right.perpendicular(), [Direction::Down, Direction::Up]);
        assert_eq!(Direction::Left.perpendicular(), [Direction::Down, Direction::Up]);
        assert_eq!(Direction::Up.perpendicular(), [Direction::Right, Direction::Left]);
        assert_eq!(Direction::Down.perpendicular(), [Direction::Right, Direction::Left]);
    }

    #[test]
    fn ordinals_are_distinct_and_dense() {
        let ordinals: Vec<usize> = Direction::ALL.iter().map(|d| d.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn glyphs_classify_cells() {
        assert_eq!(CellKind::from_glyph('*'), CellKind::Wall);
        assert_eq!(CellKind::from_glyph('/'), CellKind::Goal);
        assert_eq!(CellKind::from_glyph(' '), CellKind::Open);
        assert_eq!(CellKind::from_glyph('.'), CellKind::Open);
    }

    #[test]
    fn verdict_distinguishes_arrival_counts() {
        let summary = |goal_arrivals| RunSummary {
            goal_arrivals,
            ..RunSummary::default()
        };
        assert_eq!(summary(0).verdict(), PathVerdict::NoExit);
        assert_eq!(summary(1).verdict(), PathVerdict::SinglePath);
        assert_eq!(summary(4).verdict(), PathVerdict::MultiplePaths(4));
        assert_eq!(
            summary(3).verdict().to_string(),
            "There are 3 different paths leading to the exit."
        );
    }

    #[test]
    fn task_report_round_trips_through_bincode() {
        let report = TaskReport {
            task: TaskId::new(7),
            kind: TerminalKind::GoalReached,
            direction: Direction::Down,
            position: CellCoord::new(2, 3),
            target: Some(CellCoord::new(2, 4)),
            steps: 9,
        };
        let bytes = bincode::serialize(&report).expect("serialize");
        let restored: TaskReport = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, report);
    }
}
