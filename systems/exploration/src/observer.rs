//! Observer that forwards exploration progress over a channel.

use crossbeam_channel::{Receiver, Sender};
use maze_explorer_core::{BranchArrival, CellCoord, Direction, ExplorationObserver, TaskReport};

/// Exploration progress as delivered by [`ChannelObserver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorationEvent {
    /// An explorer reached a terminal state.
    TaskFinished(TaskReport),
    /// A branch offer targeted a goal cell.
    BranchReachedGoal(BranchArrival),
    /// A branch was abandoned because task capacity was exhausted.
    BranchDropped {
        /// Cell the branch would have started from.
        cell: CellCoord,
        /// Direction the branch would have travelled.
        direction: Direction,
    },
}

/// Observer that queues every notification on an unbounded channel.
///
/// Events from different workers interleave in arrival order. Notifications
/// sent after the receiver is dropped are discarded.
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    sender: Sender<ExplorationEvent>,
}

impl ChannelObserver {
    /// Creates an observer together with the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, Receiver<ExplorationEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: ExplorationEvent) {
        let _ = self.sender.send(event);
    }
}

impl ExplorationObserver for ChannelObserver {
    fn task_finished(&self, report: &TaskReport) {
        self.forward(ExplorationEvent::TaskFinished(*report));
    }

    fn branch_reached_goal(&self, arrival: &BranchArrival) {
        self.forward(ExplorationEvent::BranchReachedGoal(*arrival));
    }

    fn branch_dropped(&self, cell: CellCoord, direction: Direction) {
        self.forward(ExplorationEvent::BranchDropped { cell, direction });
    }
}
