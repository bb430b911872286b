use crate::slot::SlotId;

pub type Result<T, E = BoardError> = std::result::Result<T, E>;

/// Errors raised by the board engine when handed input it cannot address.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Slot {0} does not exist on this board")]
    UnknownSlot(SlotId),

    #[error("Slot index {index} is out of range for a board of {len} slots")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Slot {0} appears more than once on the board")]
    DuplicateSlot(SlotId),

    #[error("Chip value must be a positive denomination")]
    InvalidChip,
}
