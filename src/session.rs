use crate::{
    board::{
        Board,
        ClickMode,
        apply_click,
    },
    error::Result,
    slot::{
        ChipValue,
        SlotId,
    },
};
use tokio::sync::watch;
use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClickOutcome {
    Unchanged,
    Placed { slot: SlotId, chip: ChipValue },
    Erased { slot: SlotId },
}

impl ClickOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, ClickOutcome::Unchanged)
    }
}

/// Owner of the board for one game session.
///
/// Every effective click replaces the owned value and publishes it to
/// subscribers, so sibling components always observe a whole board.
#[derive(Debug)]
pub struct BoardSession {
    board: Board,
    updates: watch::Sender<Board>,
    revision: u64,
}

impl BoardSession {
    pub fn new(board: Board) -> Self {
        let (updates, _) = watch::channel(board.clone());
        Self {
            board,
            updates,
            revision: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Number of board replacements published so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&self) -> watch::Receiver<Board> {
        self.updates.subscribe()
    }

    pub fn click(
        &mut self,
        target: SlotId,
        pending: Option<ChipValue>,
        mode: ClickMode,
    ) -> Result<ClickOutcome> {
        let next = apply_click(&self.board, target, pending, mode)?;
        if next.ptr_eq(&self.board) {
            debug!(%target, "click without a selected chip ignored");
            return Ok(ClickOutcome::Unchanged);
        }
        self.publish(next);
        Ok(match (mode, pending) {
            (ClickMode::Erase, _) => ClickOutcome::Erased { slot: target },
            (ClickMode::Place, Some(chip)) => ClickOutcome::Placed { slot: target, chip },
            (ClickMode::Place, None) => ClickOutcome::Unchanged,
        })
    }

    /// Replaces the whole board, e.g. when a new session starts.
    pub fn replace(&mut self, board: Board) {
        self.publish(board);
    }

    fn publish(&mut self, board: Board) {
        self.board = board;
        self.revision = self.revision.saturating_add(1);
        self.updates.send_replace(self.board.clone());
    }
}

impl Default for BoardSession {
    fn default() -> Self {
        Self::new(Board::roulette())
    }
}
