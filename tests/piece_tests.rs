use rand::rngs::StdRng;
use rand::SeedableRng;

use tetris_engine::piece::{
    Piece, PieceProvider, RandomPieceProvider, SequencePieceProvider, Shape, TetrominoType,
    PALETTE, YELLOW,
};

fn shape(bits: &[&[u8]]) -> Shape {
    Shape::new(
        bits.iter()
            .map(|row| row.iter().map(|&b| b == 1).collect())
            .collect(),
    )
    .expect("valid shape")
}

mod shapes {
    use super::*;

    #[test]
    fn four_rotations_return_every_shape_to_itself() {
        for kind in TetrominoType::ALL {
            let start = kind.shape();
            let turned = start.rotated().rotated().rotated().rotated();
            assert_eq!(turned, start, "{kind:?}");
        }
    }

    #[test]
    fn o_is_rotation_invariant() {
        let o = TetrominoType::O.shape();
        assert_eq!(o.rotated(), o);
    }

    #[test]
    fn i_s_z_have_period_two() {
        for kind in [TetrominoType::I, TetrominoType::S, TetrominoType::Z] {
            let start = kind.shape();
            assert_ne!(start.rotated(), start, "{kind:?}");
            assert_eq!(start.rotated().rotated(), start, "{kind:?}");
        }
    }

    #[test]
    fn rotation_is_transpose_then_reverse() {
        let t = TetrominoType::T.shape();
        assert_eq!(t.rotated(), shape(&[&[1, 0], &[1, 1], &[1, 0]]));

        let l = TetrominoType::L.shape();
        assert_eq!(l.rotated(), shape(&[&[1, 0], &[1, 0], &[1, 1]]));

        let i = TetrominoType::I.shape().rotated();
        assert_eq!(i.width(), 1);
        assert_eq!(i.height(), 4);
    }

    #[test]
    fn every_canonical_shape_has_four_cells() {
        for kind in TetrominoType::ALL {
            assert_eq!(kind.shape().cells().count(), 4, "{kind:?}");
            assert_eq!(kind.shape().rotated().cells().count(), 4, "{kind:?}");
        }
    }

    #[test]
    fn degenerate_matrices_are_not_shapes() {
        assert!(Shape::new(vec![]).is_none());
        assert!(Shape::new(vec![vec![]]).is_none());
        assert!(Shape::new(vec![vec![false, false]]).is_none());
        assert!(Shape::new(vec![vec![true], vec![true, true]]).is_none());
    }

    #[test]
    fn shapes_serialize_as_bit_matrices() {
        let json = serde_json::to_string(&TetrominoType::T.shape()).unwrap();
        assert_eq!(json, "[[0,1,0],[1,1,1]]");

        let parsed: Shape = serde_json::from_str("[[1,1],[1,1]]").unwrap();
        assert_eq!(parsed, TetrominoType::O.shape());
    }

    #[test]
    fn malformed_shape_json_is_rejected() {
        assert!(serde_json::from_str::<Shape>("[[0,0],[0,0]]").is_err());
        assert!(serde_json::from_str::<Shape>("[[1,2]]").is_err());
        assert!(serde_json::from_str::<Shape>("[[1],[1,1]]").is_err());
        assert!(serde_json::from_str::<Shape>("[]").is_err());
    }
}

mod pieces {
    use super::*;

    #[test]
    fn spawn_is_horizontally_centered_at_the_top() {
        let o = Piece::new(TetrominoType::O, YELLOW, 10);
        assert_eq!((o.position.x, o.position.y), (4, 0));

        let i = Piece::new(TetrominoType::I, YELLOW, 10);
        assert_eq!((i.position.x, i.position.y), (3, 0));

        let t = Piece::new(TetrominoType::T, YELLOW, 10);
        assert_eq!(t.position.x, 4);

        let wide = Piece::new(TetrominoType::T, YELLOW, 15);
        assert_eq!(wide.position.x, 6);
    }

    #[test]
    fn random_spawn_uses_canonical_shapes_and_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        let canonical: Vec<Shape> = TetrominoType::ALL.iter().map(|k| k.shape()).collect();

        for _ in 0..200 {
            let piece = Piece::spawn(&mut rng, 10);
            assert!(canonical.contains(&piece.shape));
            assert!(PALETTE.contains(&piece.color));
            assert_eq!(piece.position.y, 0);
        }
    }

    #[test]
    fn rotated_and_moved_leave_the_original_alone() {
        let piece = Piece::new(TetrominoType::J, YELLOW, 10);

        let rotated = piece.rotated();
        let moved = piece.moved(-1, 2);

        assert_eq!(piece.shape, TetrominoType::J.shape());
        assert_eq!(rotated.position, piece.position);
        assert_eq!(rotated.shape, TetrominoType::J.shape().rotated());
        assert_eq!(moved.position.x, piece.position.x - 1);
        assert_eq!(moved.position.y, 2);
        assert_eq!(moved.shape, piece.shape);
    }

    #[test]
    fn blocks_are_offset_by_position() {
        let piece = Piece::new(TetrominoType::O, YELLOW, 10).moved(0, 3);
        let blocks: Vec<(i32, i32)> = piece.blocks().map(|b| (b.x, b.y)).collect();

        assert_eq!(blocks, vec![(4, 3), (5, 3), (4, 4), (5, 4)]);
    }
}

mod providers {
    use super::*;

    #[test]
    fn sequence_provider_cycles() {
        let mut provider = SequencePieceProvider::new(vec![TetrominoType::I, TetrominoType::O]);

        assert_eq!(provider.next_piece(10).shape, TetrominoType::I.shape());
        assert_eq!(provider.next_piece(10).shape, TetrominoType::O.shape());
        assert_eq!(provider.next_piece(10).shape, TetrominoType::I.shape());
    }

    #[test]
    fn seeded_provider_is_reproducible() {
        let mut a = RandomPieceProvider::seeded(42);
        let mut b = RandomPieceProvider::seeded(42);

        for _ in 0..50 {
            assert_eq!(a.next_piece(10), b.next_piece(10));
        }
    }
}
