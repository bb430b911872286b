use crate::{
    board::{
        Board,
        ClickMode,
    },
    error::Result,
    session::{
        BoardSession,
        ClickOutcome,
    },
    slot::{
        ChipValue,
        Slot,
        SlotColor,
        SlotId,
        SlotKind,
    },
};
use std::collections::HashSet;
use tokio::sync::watch;
use tracing::info;

/// Inputs supplied by the chip selector and the mode toggle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    pub pending_chip: Option<ChipValue>,
    pub erase_mode: bool,
}

/// Read-only view of a slot for presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotView<'a> {
    pub id: SlotId,
    pub label: &'a str,
    pub color: SlotColor,
    pub is_first: bool,
    /// `None` until the slot has taken an effective click.
    pub chips: Option<&'a [ChipValue]>,
}

/// Binds user selection to the board session and exposes views of it.
#[derive(Debug, Default)]
pub struct TableBinding {
    session: BoardSession,
    selection: Selection,
    revealed: HashSet<SlotId>,
}

impl TableBinding {
    pub fn new(session: BoardSession) -> Self {
        Self {
            session,
            selection: Selection::default(),
            revealed: HashSet::new(),
        }
    }

    pub fn board(&self) -> &Board {
        self.session.board()
    }

    pub fn session(&self) -> &BoardSession {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<Board> {
        self.session.subscribe()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn select_chip(&mut self, chip: Option<ChipValue>) {
        self.selection.pending_chip = chip;
    }

    pub fn set_erase_mode(&mut self, erase: bool) {
        self.selection.erase_mode = erase;
    }

    pub fn toggle_erase_mode(&mut self) -> bool {
        self.selection.erase_mode = !self.selection.erase_mode;
        self.selection.erase_mode
    }

    pub fn click(&mut self, target: SlotId) -> Result<ClickOutcome> {
        let Selection {
            pending_chip,
            erase_mode,
        } = self.selection;
        let outcome = self.session.click(
            target,
            pending_chip,
            ClickMode::from_erase_flag(erase_mode),
        )?;
        if outcome.changed() {
            self.revealed.insert(target);
        }
        Ok(outcome)
    }

    pub fn is_revealed(&self, id: SlotId) -> bool {
        self.revealed.contains(&id)
    }

    pub fn board_view(&self) -> Vec<SlotView<'_>> {
        self.view_of(SlotKind::Board)
    }

    pub fn outside_view(&self) -> Vec<SlotView<'_>> {
        self.view_of(SlotKind::Outside)
    }

    /// Starts over with `board`; no slot shows its chips until clicked again.
    pub fn reset(&mut self, board: Board) {
        info!("starting a new betting session");
        self.session.replace(board);
        self.revealed.clear();
    }

    fn view_of(&self, kind: SlotKind) -> Vec<SlotView<'_>> {
        self.session
            .board()
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.kind == kind)
            .map(|(idx, slot)| self.slot_view(idx, slot))
            .collect()
    }

    fn slot_view<'a>(&'a self, idx: usize, slot: &'a Slot) -> SlotView<'a> {
        SlotView {
            id: slot.id,
            label: &slot.label,
            color: slot.color,
            is_first: idx == 0,
            chips: self
                .revealed
                .contains(&slot.id)
                .then(|| slot.coins.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn chip(value: u64) -> ChipValue {
        ChipValue::new(value).unwrap()
    }

    fn view_for(binding: &TableBinding, id: SlotId) -> SlotView<'_> {
        binding
            .board_view()
            .into_iter()
            .chain(binding.outside_view())
            .find(|view| view.id == id)
            .unwrap()
    }

    #[test]
    fn click__without_chip_keeps_panel_hidden() {
        // given
        let mut binding = TableBinding::default();
        let before = binding.board().clone();

        // when
        let outcome = binding.click(SlotId(3)).unwrap();

        // then
        assert_eq!(outcome, ClickOutcome::Unchanged);
        assert!(binding.board().ptr_eq(&before));
        assert_eq!(view_for(&binding, SlotId(3)).chips, None);
    }

    #[test]
    fn click__reveals_chips_after_first_placement() {
        // given
        let mut binding = TableBinding::default();
        binding.select_chip(Some(chip(5)));

        // when
        binding.click(SlotId(3)).unwrap();

        // then
        assert_eq!(view_for(&binding, SlotId(3)).chips, Some(&[chip(5)][..]));
        assert_eq!(view_for(&binding, SlotId(4)).chips, None);
    }

    #[test]
    fn click__erase_mode_clears_slot() {
        // given
        let mut binding = TableBinding::default();
        binding.select_chip(Some(chip(1)));
        binding.click(SlotId(3)).unwrap();
        binding.click(SlotId(3)).unwrap();

        // when
        assert!(binding.toggle_erase_mode());
        let outcome = binding.click(SlotId(3)).unwrap();

        // then
        assert_eq!(outcome, ClickOutcome::Erased { slot: SlotId(3) });
        assert_eq!(view_for(&binding, SlotId(3)).chips, Some(&[][..]));
    }

    #[test]
    fn board_view__only_lists_board_slots_with_stable_ids() {
        let binding = TableBinding::default();
        let view = binding.board_view();
        assert_eq!(view.len(), 37);
        assert!(view[0].is_first);
        assert!(view.iter().skip(1).all(|v| !v.is_first));
        assert!(view.iter().all(|v| v.id.0 <= 36));
        assert!(binding.outside_view().iter().all(|v| v.id.0 > 36));
    }

    #[test]
    fn click__outside_slot_addressed_by_id() {
        // given
        let mut binding = TableBinding::default();
        binding.select_chip(Some(chip(25)));

        // when
        binding.click(SlotId(42)).unwrap();

        // then
        let red = view_for(&binding, SlotId(42));
        assert_eq!(red.label, "RED");
        assert_eq!(red.chips, Some(&[chip(25)][..]));
        assert!(binding.board_view().iter().all(|v| v.chips.is_none()));
    }

    #[test]
    fn reset__hides_panels_and_empties_board() {
        // given
        let mut binding = TableBinding::default();
        binding.select_chip(Some(chip(5)));
        binding.click(SlotId(3)).unwrap();

        // when
        binding.reset(Board::roulette());

        // then
        assert!(!binding.is_revealed(SlotId(3)));
        assert!(binding.board().get(SlotId(3)).unwrap().coins.is_empty());
    }
}
