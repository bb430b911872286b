use proptest::prelude::*;
use roulette_table::{
    Board,
    BoardError,
    ClickMode,
    MAX_VISIBLE_CHIPS,
    SlotId,
    apply_click,
    apply_click_at,
    filter_board_slots,
    test_helpers::{
        board_with,
        chip,
        coins_at,
    },
};

#[test]
fn apply_click__stacks_chips_and_drops_oldest_past_five() {
    // given
    let board = Board::roulette();

    // when
    let board = apply_click(&board, SlotId(3), Some(chip(5)), ClickMode::Place).unwrap();
    let after_five = coins_at(&board, 3);
    let board = apply_click(&board, SlotId(3), Some(chip(25)), ClickMode::Place).unwrap();
    let after_twenty_five = coins_at(&board, 3);
    let board = (0..4).fold(board, |board, _| {
        apply_click(&board, SlotId(3), Some(chip(1)), ClickMode::Place).unwrap()
    });

    // then
    assert_eq!(after_five, vec![5]);
    assert_eq!(after_twenty_five, vec![5, 25]);
    assert_eq!(coins_at(&board, 3), vec![25, 1, 1, 1, 1]);
}

#[test]
fn apply_click__erase_clears_only_target() {
    // given
    let board = board_with(&[(3, 1), (3, 5), (3, 25), (17, 100)]);

    // when
    let erased = apply_click(&board, SlotId(3), Some(chip(5)), ClickMode::Erase).unwrap();

    // then
    assert!(coins_at(&erased, 3).is_empty());
    assert_eq!(coins_at(&erased, 17), vec![100]);
    assert_eq!(coins_at(&board, 3), vec![1, 5, 25]);
}

#[test]
fn apply_click__erase_without_chip_is_a_no_op() {
    let board = board_with(&[(3, 1), (3, 5), (3, 25)]);
    let next = apply_click(&board, SlotId(3), None, ClickMode::Erase).unwrap();
    assert!(next.ptr_eq(&board));
    assert_eq!(coins_at(&next, 3), vec![1, 5, 25]);
}

#[test]
fn apply_click__without_chip_returns_same_board() {
    let board = board_with(&[(8, 5)]);
    let next = apply_click(&board, SlotId(3), None, ClickMode::Place).unwrap();
    assert!(next.ptr_eq(&board));
    assert_eq!(next, board);
}

#[test]
fn apply_click__rejects_unknown_slot_even_without_chip() {
    let board = Board::roulette();
    assert_eq!(
        apply_click(&board, SlotId(200), None, ClickMode::Place),
        Err(BoardError::UnknownSlot(SlotId(200)))
    );
}

#[test]
fn apply_click_at__addresses_raw_positions() {
    // given
    let board = Board::roulette();
    let last = board.len() - 1;

    // when
    let placed = apply_click_at(&board, last, Some(chip(25)), ClickMode::Place).unwrap();
    let out_of_range = apply_click_at(&board, board.len(), Some(chip(1)), ClickMode::Place);

    // then
    let id = board.slot_id_at(last).unwrap();
    assert_eq!(coins_at(&placed, id.0), vec![25]);
    assert_eq!(
        out_of_range,
        Err(BoardError::IndexOutOfRange {
            index: board.len(),
            len: board.len(),
        })
    );
}

#[test]
fn filter_board_slots__is_stable_and_idempotent() {
    let board = Board::roulette();
    let once = filter_board_slots(board.slots());
    let twice = filter_board_slots(once.iter().copied());
    let ids: Vec<u8> = once.iter().map(|s| s.id.0).collect();
    assert_eq!(ids, (0..=36).collect::<Vec<u8>>());
    assert_eq!(once, twice);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn apply_click__keeps_last_five_in_order(values in proptest::collection::vec(1u64..1_000, 1..12)) {
        let board = values.iter().fold(Board::roulette(), |board, value| {
            apply_click(&board, SlotId(21), Some(chip(*value)), ClickMode::Place).unwrap()
        });
        let expected: Vec<u64> = values
            .iter()
            .copied()
            .skip(values.len().saturating_sub(MAX_VISIBLE_CHIPS))
            .collect();
        prop_assert_eq!(coins_at(&board, 21), expected);
    }

    #[test]
    fn apply_click__leaves_other_slots_untouched(
        target in 0u8..49,
        value in 1u64..500,
        erase in any::<bool>(),
    ) {
        let board = board_with(&[(0, 5), (10, 25), (40, 1)]);
        let next = apply_click(
            &board,
            SlotId(target),
            Some(chip(value)),
            ClickMode::from_erase_flag(erase),
        )
        .unwrap();
        for (before, after) in board.slots().iter().zip(next.slots()) {
            if before.id != SlotId(target) {
                prop_assert_eq!(before, after);
            }
        }
    }
}
