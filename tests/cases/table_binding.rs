use roulette_table::{
    Board,
    BoardSession,
    ClickOutcome,
    SlotId,
    TableBinding,
    test_helpers::{
        chip,
        coins_at,
    },
};

fn chips_shown(binding: &TableBinding, id: u8) -> Option<Vec<u64>> {
    binding
        .board_view()
        .into_iter()
        .chain(binding.outside_view())
        .find(|view| view.id == SlotId(id))
        .and_then(|view| view.chips)
        .map(|chips| chips.iter().map(|c| c.get()).collect())
}

#[test]
fn click__without_chip_keeps_board_and_hides_panel() {
    // given
    let mut binding = TableBinding::default();
    let before = binding.board().clone();

    // when
    let outcome = binding.click(SlotId(3)).unwrap();

    // then
    assert_eq!(outcome, ClickOutcome::Unchanged);
    assert!(binding.board().ptr_eq(&before));
    assert_eq!(chips_shown(&binding, 3), None);
    assert_eq!(binding.session().revision(), 0);
}

#[test]
fn click__publishes_each_board_to_subscribers() {
    // given
    let mut binding = TableBinding::new(BoardSession::new(Board::roulette()));
    let mut updates = binding.subscribe();
    binding.select_chip(Some(chip(25)));

    // when
    binding.click(SlotId(42)).unwrap();

    // then
    assert!(updates.has_changed().unwrap());
    let published = updates.borrow_and_update().clone();
    assert_eq!(coins_at(&published, 42), vec![25]);
    assert_eq!(chips_shown(&binding, 42), Some(vec![25]));
}

#[test]
fn click__erase_mode_reveals_empty_stack() {
    // given
    let mut binding = TableBinding::default();
    binding.select_chip(Some(chip(5)));
    binding.click(SlotId(7)).unwrap();
    binding.click(SlotId(7)).unwrap();

    // when
    binding.toggle_erase_mode();
    let outcome = binding.click(SlotId(7)).unwrap();

    // then
    assert_eq!(outcome, ClickOutcome::Erased { slot: SlotId(7) });
    assert_eq!(chips_shown(&binding, 7), Some(vec![]));
}

#[test]
fn board_view__lists_zero_first_and_outside_separately() {
    let binding = TableBinding::default();
    let board = binding.board_view();
    let outside = binding.outside_view();
    assert_eq!(board.len(), 37);
    assert!(board[0].is_first);
    assert_eq!(board[0].label, "0");
    assert!(board[1..].iter().all(|v| !v.is_first));
    assert_eq!(outside.len(), 12);
    assert!(outside.iter().all(|v| !v.is_first));
}

#[test]
fn reset__forgets_revealed_slots() {
    // given
    let mut binding = TableBinding::default();
    binding.select_chip(Some(chip(1)));
    binding.click(SlotId(12)).unwrap();

    // when
    binding.reset(Board::roulette());

    // then
    assert_eq!(chips_shown(&binding, 12), None);
    assert!(binding.board().get(SlotId(12)).unwrap().coins.is_empty());
    assert_eq!(binding.selection().pending_chip, Some(chip(1)));
}
