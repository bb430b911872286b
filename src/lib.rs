pub mod binding;

pub mod board;

pub mod chips;

pub mod config;

pub mod error;

pub mod session;

pub mod slot;

pub mod wallets;

pub mod withdrawal;

pub mod test_helpers;

pub use binding::{
    Selection,
    SlotView,
    TableBinding,
};
pub use board::{
    Board,
    ClickMode,
    apply_click,
    apply_click_at,
    filter_board_slots,
};
pub use chips::{
    ChipStack,
    MAX_VISIBLE_CHIPS,
    append_chip,
    clear_chips,
};
pub use error::BoardError;
pub use session::{
    BoardSession,
    ClickOutcome,
};
pub use slot::{
    ChipValue,
    Slot,
    SlotColor,
    SlotId,
    SlotKind,
    is_board_slot,
};
