use tetris_engine::field::test_helpers::*;
use tetris_engine::piece::{Piece, Shape, TetrominoType, BLUE, GREEN, RED, YELLOW};
use tetris_engine::{CellState, Field, GameError};

fn o_at(x: i32, y: i32) -> Piece {
    Piece::at(TetrominoType::O.shape(), YELLOW, x, y)
}

mod construction {
    use super::*;

    #[test]
    fn new_field_is_empty() {
        let field = Field::new(20, 10).unwrap();

        assert_eq!(field.rows(), 20);
        assert_eq!(field.cols(), 10);
        assert_eq!(field.total_filled_cells(), 0);
    }

    #[test]
    fn zero_dimensions_are_refused() {
        assert!(matches!(
            Field::new(0, 10),
            Err(GameError::InvalidDimensions { rows: 0, cols: 10 })
        ));
        assert!(Field::new(20, 0).is_err());
    }

    #[test]
    fn ragged_grid_is_refused() {
        let grid = vec![vec![CellState::Empty; 10], vec![CellState::Empty; 9]];

        assert!(matches!(
            Field::from_grid(grid),
            Err(GameError::InvalidSnapshot(_))
        ));
        assert!(Field::from_grid(vec![]).is_err());
    }

    #[test]
    fn reset_empties_every_cell() {
        let mut field = empty_field();
        fill_row(&mut field, 5);

        field.reset();

        assert_eq!(field, empty_field());
    }
}

mod collision {
    use super::*;

    #[test]
    fn open_space_does_not_collide() {
        let field = empty_field();
        assert!(!field.collides(&TetrominoType::O.shape(), 4, 18));
    }

    #[test]
    fn walls_and_floor_collide() {
        let field = empty_field();
        let o = TetrominoType::O.shape();

        assert!(field.collides(&o, -1, 5));
        assert!(field.collides(&o, 9, 5));
        assert!(field.collides(&o, 4, 19));
    }

    #[test]
    fn cells_above_the_field_only_check_walls() {
        let mut field = empty_field();
        fill_row(&mut field, 5);
        let vertical_i = TetrominoType::I.shape().rotated();

        assert!(!field.collides(&vertical_i, 0, -3));
        assert!(!field.collides(&TetrominoType::O.shape(), 4, -2));
        assert!(field.collides(&vertical_i, -1, -3));
        assert!(field.collides(&vertical_i, 10, -3));
    }

    #[test]
    fn extreme_anchors_collide_without_overflow() {
        let field = empty_field();
        let offset = Shape::new(vec![vec![false, true]]).unwrap();
        let tall = TetrominoType::I.shape().rotated();

        assert!(field.collides(&offset, i32::MAX, 0));
        assert!(field.collides(&offset, i32::MIN, 0));
        assert!(field.collides(&tall, 0, i32::MAX));
        assert!(!field.collides(&tall, 0, i32::MIN));
        assert!(field.collides(&tall, i32::MAX, i32::MIN));
    }

    #[test]
    fn occupied_cells_collide() {
        let mut field = empty_field();
        field.set(10, 5, CellState::Filled(RED));

        assert!(field.collides(&TetrominoType::O.shape(), 4, 9));
        assert!(!field.collides(&TetrominoType::O.shape(), 6, 9));
    }

    #[test]
    fn collides_is_pure() {
        let mut field = empty_field();
        fill_row_with_gap(&mut field, 19, 3);
        let before = field.clone();
        let t = TetrominoType::T.shape();

        let first = field.collides(&t, 2, 18);
        for _ in 0..10 {
            assert_eq!(field.collides(&t, 2, 18), first);
        }
        assert_eq!(field, before);
    }
}

mod merging {
    use super::*;

    #[test]
    fn merge_writes_color_into_occupied_cells_only() {
        let mut field = empty_field();
        field.set(0, 0, CellState::Filled(GREEN));
        let piece = Piece::at(TetrominoType::T.shape(), BLUE, 3, 10);

        field.merge(&piece);

        for block in piece.blocks() {
            assert_eq!(
                field.get(block.y as usize, block.x as usize),
                Some(CellState::Filled(BLUE))
            );
        }
        // T's empty corner stays empty
        assert_eq!(field.get(10, 3), Some(CellState::Empty));
        assert_eq!(field.get(0, 0), Some(CellState::Filled(GREEN)));
        assert_eq!(field.total_filled_cells(), 5);
    }

    #[test]
    fn merge_drops_cells_above_the_field() {
        let mut field = empty_field();

        field.merge(&o_at(4, -1));

        assert_eq!(field.total_filled_cells(), 2);
        assert_eq!(field.get(0, 4), Some(CellState::Filled(YELLOW)));
        assert_eq!(field.get(0, 5), Some(CellState::Filled(YELLOW)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "merge")]
    fn merge_over_locked_cells_panics_in_debug() {
        let mut field = empty_field();
        field.set(5, 4, CellState::Filled(RED));

        field.merge(&o_at(4, 4));
    }
}

mod line_clearing {
    use super::*;

    #[test]
    fn no_full_rows_leaves_field_unchanged() {
        let mut field = empty_field();
        fill_row_with_gap(&mut field, 19, 5);
        field.set(3, 3, CellState::Filled(RED));
        let before = field.clone();

        assert_eq!(field.clear_lines(), 0);
        assert_eq!(field, before);
    }

    #[test]
    fn single_full_row_is_removed_and_rows_above_fall() {
        let mut field = empty_field();
        fill_row(&mut field, 19);
        field.set(18, 0, CellState::Filled(RED));
        field.set(18, 1, CellState::Filled(RED));
        field.set(0, 9, CellState::Filled(BLUE));

        let cleared = field.clear_lines();

        assert_eq!(cleared, 1);
        assert_eq!(field.rows(), 20);
        assert_eq!(field.get(19, 0), Some(CellState::Filled(RED)));
        assert_eq!(field.get(19, 1), Some(CellState::Filled(RED)));
        assert_eq!(field.filled_count_in_row(19), 2);
        assert_eq!(field.get(1, 9), Some(CellState::Filled(BLUE)));
        assert_eq!(field.filled_count_in_row(0), 0);
    }

    #[test]
    fn non_contiguous_rows_clear_and_keep_order() {
        let mut field = empty_field();
        fill_row(&mut field, 19);
        fill_row(&mut field, 17);
        field.set(18, 0, CellState::Filled(RED));
        field.set(16, 1, CellState::Filled(BLUE));

        let cleared = field.clear_lines();

        assert_eq!(cleared, 2);
        assert_eq!(field.get(19, 0), Some(CellState::Filled(RED)));
        assert_eq!(field.get(18, 1), Some(CellState::Filled(BLUE)));
        assert_eq!(field.total_filled_cells(), 2);
    }

    #[test]
    fn four_rows_clear_at_once() {
        let mut field = empty_field();
        for row in 16..20 {
            fill_row(&mut field, row);
        }

        assert_eq!(field.clear_lines(), 4);
        assert_eq!(field.total_filled_cells(), 0);
    }

    #[test]
    fn cleared_returns_a_new_field() {
        let mut field = empty_field();
        fill_row(&mut field, 19);
        let before = field.clone();

        let (next, cleared) = field.cleared();

        assert_eq!(cleared, 1);
        assert_eq!(field, before);
        assert_eq!(next.total_filled_cells(), 0);
        assert!(!next.is_row_complete(19));
        assert!(field.is_row_complete(19));
    }
}

mod cell_encoding {
    use super::*;

    #[test]
    fn empty_is_zero_and_filled_is_rgb() {
        assert_eq!(serde_json::to_string(&CellState::Empty).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&CellState::Filled(RED)).unwrap(),
            "[255,0,0]"
        );
        assert_eq!(
            serde_json::from_str::<CellState>("[0,0,255]").unwrap(),
            CellState::Filled(BLUE)
        );
    }

    #[test]
    fn nonzero_scalar_cells_are_rejected() {
        assert!(serde_json::from_str::<CellState>("7").is_err());
        assert!(serde_json::from_str::<CellState>("\"red\"").is_err());
    }
}
