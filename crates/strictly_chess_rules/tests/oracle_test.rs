//! Tests for the shakmaty-backed rules oracle.

use strictly_chess_rules::{
    Color, DrawReason, MoveFlag, MoveRequest, PieceKind, RulesError, RulesOracle, START_POSITION,
    ShakmatyOracle, Square,
};

fn play(oracle: &mut ShakmatyOracle, moves: &[&str]) {
    for m in moves {
        oracle
            .apply_move(&m.parse::<MoveRequest>().unwrap())
            .unwrap_or_else(|e| panic!("{m} should be legal: {e}"));
    }
}

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

#[test]
fn test_starts_at_standard_position() {
    let oracle = ShakmatyOracle::new();
    assert_eq!(oracle.position(), START_POSITION);
    assert_eq!(oracle.start_position(), START_POSITION);
    assert_eq!(oracle.side_to_move(), Color::White);
    assert!(!oracle.status().is_terminal());
}

#[test]
fn test_pawn_push_record() {
    let mut oracle = ShakmatyOracle::new();
    let record = oracle.apply_move(&"e2e4".parse().unwrap()).unwrap();

    assert_eq!(record.san, "e4");
    assert_eq!(record.lan, "e2-e4");
    assert_eq!(record.color, Color::White);
    assert_eq!(record.piece, PieceKind::Pawn);
    assert!(record.has_flag(MoveFlag::DoublePush));
    assert!(!record.is_capture());
    assert_eq!(record.before, START_POSITION);
    assert_eq!(
        record.after,
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );
    assert_eq!(oracle.position(), record.after);
    assert_eq!(oracle.side_to_move(), Color::Black);
}

#[test]
fn test_illegal_move_leaves_position_unchanged() {
    let mut oracle = ShakmatyOracle::new();
    let err = oracle.apply_move(&"e2e5".parse().unwrap()).unwrap_err();
    assert!(matches!(err, RulesError::IllegalMove { .. }));
    assert_eq!(oracle.position(), START_POSITION);

    let err = oracle.apply_move(&"e7e5".parse().unwrap()).unwrap_err();
    assert!(matches!(err, RulesError::IllegalMove { .. }));
    assert_eq!(oracle.position(), START_POSITION);
}

#[test]
fn test_fools_mate_is_checkmate() {
    let mut oracle = ShakmatyOracle::new();
    play(&mut oracle, &["f2f3", "e7e5", "g2g4"]);
    let record = oracle.apply_move(&"d8h4".parse().unwrap()).unwrap();

    assert_eq!(record.san, "Qh4#");
    let status = oracle.status();
    assert!(status.checkmate);
    assert!(status.in_check);
    assert!(!status.draw);
    assert!(oracle.legal_moves().is_empty());
}

#[test]
fn test_castling_uses_king_destination() {
    let mut oracle = ShakmatyOracle::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    assert!(oracle.legal_destinations(sq("e1")).contains(&sq("g1")));

    let record = oracle.apply_move(&"e1g1".parse().unwrap()).unwrap();
    assert_eq!(record.san, "O-O");
    assert_eq!(record.lan, "O-O");
    assert!(record.has_flag(MoveFlag::Castle));
    assert_eq!(record.to, sq("g1"));
    assert!(record.after.starts_with("r3k2r/8/8/8/8/8/8/R4RK1 b kq"));
}

#[test]
fn test_en_passant_capture() {
    let mut oracle = ShakmatyOracle::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
    let record = oracle.apply_move(&"e5d6".parse().unwrap()).unwrap();

    assert_eq!(record.san, "exd6");
    assert_eq!(record.captured, Some(PieceKind::Pawn));
    assert!(record.has_flag(MoveFlag::EnPassant));
    assert!(record.has_flag(MoveFlag::Capture));
}

#[test]
fn test_promotion_requires_piece_choice() {
    let mut oracle = ShakmatyOracle::from_fen("8/4P3/8/8/8/8/8/k3K3 w - - 0 1").unwrap();
    let before = oracle.position();

    let err = oracle.apply_move(&"e7e8".parse().unwrap()).unwrap_err();
    assert_eq!(err, RulesError::PromotionRequired(sq("e7"), sq("e8")));
    assert_eq!(oracle.position(), before);

    let record = oracle.apply_move(&"e7e8q".parse().unwrap()).unwrap();
    assert_eq!(record.promotion, Some(PieceKind::Queen));
    assert!(record.has_flag(MoveFlag::Promotion));
    assert_eq!(record.san, "e8=Q");
    assert_eq!(record.lan, "e7-e8=Q");
}

#[test]
fn test_threefold_repetition_by_knight_shuffle() {
    let mut oracle = ShakmatyOracle::new();
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
    play(&mut oracle, &shuffle);
    assert!(!oracle.status().threefold_repetition);
    play(&mut oracle, &shuffle);

    let status = oracle.status();
    assert!(status.threefold_repetition);
    assert!(status.draw);
    assert_eq!(status.draw_reason(), Some(DrawReason::ThreefoldRepetition));
}

#[test]
fn test_bare_kings_are_insufficient_material() {
    let oracle = ShakmatyOracle::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let status = oracle.status();
    assert!(status.insufficient_material);
    assert!(status.draw);
    assert_eq!(status.draw_reason(), Some(DrawReason::InsufficientMaterial));
}

#[test]
fn test_stalemate_is_not_a_plain_draw() {
    let oracle = ShakmatyOracle::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let status = oracle.status();
    assert!(status.stalemate);
    assert!(!status.checkmate);
    assert!(!status.in_check);
    assert!(status.is_terminal());
}

#[test]
fn test_fifty_move_rule() {
    let oracle = ShakmatyOracle::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
    let status = oracle.status();
    assert!(status.fifty_move_rule);
    assert_eq!(status.draw_reason(), Some(DrawReason::FiftyMoveRule));
}

#[test]
fn test_legal_destinations_for_side_to_move_only() {
    let oracle = ShakmatyOracle::new();
    assert_eq!(oracle.legal_destinations(sq("e2")), vec![sq("e3"), sq("e4")]);
    assert_eq!(oracle.legal_destinations(sq("g1")), vec![sq("f3"), sq("h3")]);
    assert!(oracle.legal_destinations(sq("e7")).is_empty());
    assert!(oracle.legal_destinations(sq("e4")).is_empty());
    assert_eq!(oracle.legal_moves().len(), 20);
}

#[test]
fn test_load_position_and_reset() {
    let fen = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";
    let mut oracle = ShakmatyOracle::new();
    oracle.load_position(fen).unwrap();
    assert_eq!(oracle.position(), fen);

    play(&mut oracle, &["e2e4"]);
    assert_ne!(oracle.position(), fen);
    assert_eq!(oracle.reset(), fen);
    assert_eq!(oracle.position(), fen);
}

#[test]
fn test_invalid_position_is_rejected() {
    let mut oracle = ShakmatyOracle::new();
    let err = oracle.load_position("not a position").unwrap_err();
    assert!(matches!(err, RulesError::InvalidPosition { .. }));
    assert_eq!(oracle.position(), START_POSITION);

    assert!(ShakmatyOracle::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
}

#[test]
fn test_record_serializes_with_square_names() {
    let mut oracle = ShakmatyOracle::new();
    let record = oracle.apply_move(&"g1f3".parse().unwrap()).unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["from"], "g1");
    assert_eq!(json["to"], "f3");
    assert_eq!(json["piece"], "knight");
    assert_eq!(json["san"], "Nf3");
}

#[test]
fn test_short_algebraic_moves_apply() {
    let mut oracle = ShakmatyOracle::new();
    for san in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6", "O-O"] {
        oracle
            .apply_san(san)
            .unwrap_or_else(|e| panic!("{san} should be legal: {e}"));
    }
    let record = oracle.apply_san("Be7").unwrap();
    assert_eq!(record.color, Color::Black);
    assert_eq!(oracle.side_to_move(), Color::White);
}

#[test]
fn test_short_algebraic_castle_with_zeros_and_check_suffix() {
    let mut oracle = ShakmatyOracle::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let record = oracle.apply_san("0-0").unwrap();
    assert_eq!(record.to, sq("g1"));
    assert!(record.has_flag(MoveFlag::Castle));

    let mut oracle = ShakmatyOracle::new();
    play(&mut oracle, &["f2f3", "e7e5", "g2g4"]);
    let mate = oracle.apply_san("Qh4#").unwrap();
    assert_eq!(mate.san, "Qh4#");
}

#[test]
fn test_short_algebraic_promotion() {
    let mut oracle = ShakmatyOracle::from_fen("8/4P3/8/8/8/8/8/k3K3 w - - 0 1").unwrap();
    let record = oracle.apply_san("e8=N").unwrap();
    assert_eq!(record.promotion, Some(PieceKind::Knight));
}

#[test]
fn test_bad_short_algebraic_leaves_position() {
    let mut oracle = ShakmatyOracle::new();
    assert!(matches!(
        oracle.apply_san("Ke2").unwrap_err(),
        RulesError::UnplayableSan(_)
    ));
    assert!(matches!(
        oracle.apply_san("zz9").unwrap_err(),
        RulesError::InvalidNotation(_)
    ));
    assert_eq!(oracle.position(), START_POSITION);
}
