use learn_game::agent::ValueAgent;
use learn_game::board::{Board, Marks};
use proptest::prelude::*;

fn arb_board() -> impl Strategy<Value = Board> {
    prop::array::uniform9(-1i8..=1).prop_map(|cells| {
        Board::from_rows([
            [cells[0], cells[1], cells[2]],
            [cells[3], cells[4], cells[5]],
            [cells[6], cells[7], cells[8]],
        ])
    })
}

fn arb_mark() -> impl Strategy<Value = Marks> {
    prop_oneof![Just(Marks::NOUGHT), Just(Marks::CROSS)]
}

proptest! {
    #[test]
    fn normalization_is_sign_symmetric(board in arb_board(), mark in arb_mark()) {
        prop_assert_eq!(board.normalize(mark), board.flipped().normalize(mark.other()));
    }

    #[test]
    fn selected_action_is_always_vacant(
        board in arb_board(),
        mark in arb_mark(),
        epsilon in 0.0f32..=1.0,
        seed in any::<u64>(),
    ) {
        let mut agent = ValueAgent::new(0.9, 0.5, epsilon, "prop").with_seed(seed);
        match agent.select_action(&board, mark) {
            Ok((row, col)) => prop_assert!(board.is_vacant(row, col)),
            Err(_) => prop_assert!(board.is_full()),
        }
    }
}
