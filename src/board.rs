use crate::{
    chips::{
        append_chip,
        clear_chips,
    },
    error::{
        BoardError,
        Result,
    },
    slot::{
        ChipValue,
        Slot,
        SlotColor,
        SlotId,
        SlotKind,
        is_board_slot,
    },
};
use std::{
    collections::HashSet,
    sync::Arc,
};

pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

const OUTSIDE_LABELS: [&str; 12] = [
    "1st 12", "2nd 12", "3rd 12", "1-18", "EVEN", "RED", "BLACK", "ODD", "19-36",
    "2 to 1", "2 to 1", "2 to 1",
];

/// What a click does to the targeted slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ClickMode {
    #[default]
    Place,
    Erase,
}

impl ClickMode {
    pub fn from_erase_flag(erase: bool) -> Self {
        if erase { ClickMode::Erase } else { ClickMode::Place }
    }
}

/// Immutable, cheaply cloned sequence of slots for one game session.
#[derive(Clone, Debug)]
pub struct Board {
    slots: Arc<[Slot]>,
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
    }
}

impl Eq for Board {}

impl Board {
    pub fn new(slots: Vec<Slot>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(slots.len());
        for slot in &slots {
            if !seen.insert(slot.id) {
                return Err(BoardError::DuplicateSlot(slot.id));
            }
        }
        Ok(Self {
            slots: slots.into(),
        })
    }

    /// Single-zero layout: the zero at index 0, numbers 1-36, then the
    /// outside bets.
    pub fn roulette() -> Self {
        let mut slots = Vec::with_capacity(37 + OUTSIDE_LABELS.len());
        slots.push(Slot::new(SlotId(0), "0", SlotColor::Green, SlotKind::Board));
        for number in 1..=36u8 {
            slots.push(Slot::new(
                SlotId(number),
                number.to_string(),
                number_color(number),
                SlotKind::Board,
            ));
        }
        for (offset, label) in OUTSIDE_LABELS.iter().enumerate() {
            let color = match *label {
                "RED" => SlotColor::Purple,
                _ => SlotColor::Gray,
            };
            slots.push(Slot::new(
                SlotId(37 + offset as u8),
                *label,
                color,
                SlotKind::Outside,
            ));
        }
        Self {
            slots: slots.into(),
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn position(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    pub fn get(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn slot_id_at(&self, index: usize) -> Result<SlotId> {
        self.slots
            .get(index)
            .map(|slot| slot.id)
            .ok_or(BoardError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            })
    }

    pub fn board_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| is_board_slot(slot))
    }

    /// True when both values share the same storage, i.e. no click changed
    /// the board between them.
    pub fn ptr_eq(&self, other: &Board) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }

    fn replace_slot(&self, position: usize, slot: Slot) -> Self {
        let slots = self
            .slots
            .iter()
            .enumerate()
            .map(|(idx, existing)| {
                if idx == position {
                    slot.clone()
                } else {
                    existing.clone()
                }
            })
            .collect::<Vec<_>>();
        Self {
            slots: slots.into(),
        }
    }
}

pub fn number_color(number: u8) -> SlotColor {
    if number == 0 {
        SlotColor::Green
    } else if RED_NUMBERS.contains(&number) {
        SlotColor::Purple
    } else {
        SlotColor::Gray
    }
}

/// Computes the board that results from clicking `target`.
///
/// Without a pending chip the click does nothing and the returned board
/// shares storage with `board`. Otherwise exactly the targeted slot changes:
/// erase empties its stack, place appends the chip under the history policy.
pub fn apply_click(
    board: &Board,
    target: SlotId,
    pending: Option<ChipValue>,
    mode: ClickMode,
) -> Result<Board> {
    let position = board
        .position(target)
        .ok_or(BoardError::UnknownSlot(target))?;
    let Some(chip) = pending else {
        return Ok(board.clone());
    };
    let slot = &board.slots[position];
    let coins = match mode {
        ClickMode::Erase => clear_chips(),
        ClickMode::Place => append_chip(&slot.coins, chip),
    };
    Ok(board.replace_slot(position, slot.with_coins(coins)))
}

/// Positional form of [`apply_click`] addressing the raw slot sequence.
pub fn apply_click_at(
    board: &Board,
    index: usize,
    pending: Option<ChipValue>,
    mode: ClickMode,
) -> Result<Board> {
    let target = board.slot_id_at(index)?;
    apply_click(board, target, pending, mode)
}

/// Board slots in raw order. Applying it to its own output yields the same
/// sequence.
pub fn filter_board_slots<'a>(slots: impl IntoIterator<Item = &'a Slot>) -> Vec<&'a Slot> {
    slots.into_iter().filter(|slot| is_board_slot(slot)).collect()
}
