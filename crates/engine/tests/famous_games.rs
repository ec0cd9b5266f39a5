//! Full-game replays of well-known games.
//!
//! These drive the SAN decoder, check/mate detection, castling on both
//! wings and source disambiguation through real game records, and pin the
//! final positions by FEN.

use caissa_engine::{Game, LoadPgnOptions, PgnOptions};

const IMMORTAL_GAME: &str = "\
[Event \"London\"]
[Site \"London ENG\"]
[Date \"1851.06.21\"]
[White \"Anderssen, Adolf\"]
[Black \"Kieseritzky, Lionel\"]
[Result \"1-0\"]

1. e4 e5 2. f4 exf4 3. Bc4 Qh4+ 4. Kf1 b5 5. Bxb5 Nf6 6. Nf3 Qh6 7. d3 Nh5
8. Nh4 Qg5 9. Nf5 c6 10. g4 Nf6 11. Rg1 cxb5 12. h4 Qg6 13. h5 Qg5 14. Qf3
Ng8 15. Bxf4 Qf6 16. Nc3 Bc5 17. Nd5 Qxb2 18. Bd6 Bxg1 19. e5 Qxa1+ 20. Ke2
Na6 21. Nxg7+ Kd8 22. Qf6+ Nxf6 23. Be7# 1-0
";

const IMMORTAL_FINAL: &str = "r1bk3r/p2pBpNp/n4n2/1p1NP2P/6P1/3P4/P1P1K3/q5b1 b - - 1 23";

const OPERA_GAME: &str = "\
[Event \"Paris Opera\"]
[Site \"Paris FRA\"]
[Date \"1858.??.??\"]
[White \"Morphy, Paul\"]
[Black \"Duke Karl / Count Isouard\"]
[Result \"1-0\"]

1. e4 e5 2. Nf3 d6 3. d4 Bg4 4. dxe5 Bxf3 5. Qxf3 dxe5 6. Bc4 Nf6 7. Qb3 Qe7
8. Nc3 c6 9. Bg5 b5 10. Nxb5 cxb5 11. Bxb5+ Nbd7 12. O-O-O Rd8 13. Rxd7 Rxd7
14. Rd1 Qe6 15. Bxd7+ Nxd7 16. Qb8+ Nxb8 17. Rd8# 1-0
";

const OPERA_FINAL: &str = "1n1Rkb1r/p4ppp/4q3/4p1B1/4P3/8/PPP2PPP/2K5 b k - 1 17";

#[test]
fn test_immortal_game() {
    let mut game = Game::new();
    game.load_pgn(IMMORTAL_GAME, &LoadPgnOptions::default())
        .unwrap();
    assert_eq!(game.fen_forced(), IMMORTAL_FINAL);
    assert_eq!(game.history_san().len(), 45);
    assert!(game.is_checkmate());
    assert_eq!(game.header("Result"), Some("1-0"));
    assert_eq!(game.header("White"), Some("Anderssen, Adolf"));
}

#[test]
fn test_immortal_game_strict() {
    // The record is plain SAN throughout, so strict mode accepts it too.
    let mut game = Game::new();
    game.load_pgn(
        IMMORTAL_GAME,
        &LoadPgnOptions {
            strict: true,
            newline_char: None,
        },
    )
    .unwrap();
    assert_eq!(game.fen_forced(), IMMORTAL_FINAL);
}

#[test]
fn test_opera_game() {
    let mut game = Game::new();
    game.load_pgn(OPERA_GAME, &LoadPgnOptions::default())
        .unwrap();
    assert_eq!(game.fen_forced(), OPERA_FINAL);
    assert!(game.is_checkmate());
    // queenside castling and the Nbd7 disambiguation both survived
    assert!(game.history_san().contains(&"O-O-O".to_string()));
    assert!(game.history_san().contains(&"Nbd7".to_string()));
}

#[test]
fn test_famous_games_reemit_and_reload() {
    for source in [IMMORTAL_GAME, OPERA_GAME] {
        let mut game = Game::new();
        game.load_pgn(source, &LoadPgnOptions::default()).unwrap();

        let wrapped = game.pgn(&PgnOptions {
            newline: "\n".to_string(),
            max_width: 72,
        });
        for line in wrapped.lines().filter(|l| !l.starts_with('[')) {
            assert!(line.len() <= 72, "overlong line: {line:?}");
        }

        let mut reloaded = Game::new();
        reloaded
            .load_pgn(&wrapped, &LoadPgnOptions::default())
            .unwrap();
        assert_eq!(reloaded.fen(), game.fen());
        assert_eq!(reloaded.history_san(), game.history_san());
    }
}

#[test]
fn test_annotated_game_with_variations() {
    // The main line must replay while variations are carried in the tree
    // and skipped; comments and NAGs land on their positions.
    let source = "\
[Event \"Annotated\"]
[White \"Ann\"]
[Black \"Ben\"]
[Result \"1/2-1/2\"]

{A quiet start.} 1. d4 $1 d5 (1... Nf6 2. c4 {the main alternative} e6)
2. c4 e6 ; the Queen's Gambit Declined
3. Nc3 Nf6 1/2-1/2
";
    let mut game = Game::new();
    game.load_pgn(source, &LoadPgnOptions::default()).unwrap();

    assert_eq!(
        game.history_san(),
        vec!["d4", "d5", "c4", "e6", "Nc3", "Nf6"]
    );
    assert_eq!(game.header("Result"), Some("1/2-1/2"));

    let pgn = game.pgn(&PgnOptions::default());
    assert!(pgn.contains("{A quiet start.} 1. d4!"), "pgn: {pgn}");
    assert!(
        pgn.contains("e6 {the Queen's Gambit Declined}"),
        "pgn: {pgn}"
    );
    assert!(pgn.ends_with("1/2-1/2"), "pgn: {pgn}");
}

#[test]
fn test_fischer_byrne_finish() {
    // The Game of the Century ends in a long forced sequence of checks;
    // good exercise for '+' and '#' suffix rendering.
    let source = "\
[Event \"Third Rosenwald Trophy\"]
[White \"Byrne, Donald\"]
[Black \"Fischer, Robert James\"]
[Result \"0-1\"]

1. Nf3 Nf6 2. c4 g6 3. Nc3 Bg7 4. d4 O-O 5. Bf4 d5 6. Qb3 dxc4 7. Qxc4 c6
8. e4 Nbd7 9. Rd1 Nb6 10. Qc5 Bg4 11. Bg5 Na4 12. Qa3 Nxc3 13. bxc3 Nxe4
14. Bxe7 Qb6 15. Bc4 Nxc3 16. Bc5 Rfe8+ 17. Kf1 Be6 18. Bxb6 Bxc4+ 19. Kg1
Ne2+ 20. Kf1 Nxd4+ 21. Kg1 Ne2+ 22. Kf1 Nc3+ 23. Kg1 axb6 24. Qb4 Ra4
25. Qxb6 Nxd1 26. h3 Rxa2 27. Kh2 Nxf2 28. Re1 Rxe1 29. Qd8+ Bf8 30. Nxe1
Bd5 31. Nf3 Ne4 32. Qb8 b5 33. h4 h5 34. Ne5 Kg7 35. Kg1 Bc5+ 36. Kf1 Ng3+
37. Ke1 Bb4+ 38. Kd1 Bb3+ 39. Kc1 Ne2+ 40. Kb1 Nc3+ 41. Kc1 Rc2# 0-1
";
    let mut game = Game::new();
    game.load_pgn(source, &LoadPgnOptions::default()).unwrap();
    assert!(game.is_checkmate());
    assert_eq!(game.turn(), caissa_engine::Color::White);
    let sans = game.history_san();
    assert_eq!(sans.last().map(String::as_str), Some("Rc2#"));
    assert_eq!(sans.iter().filter(|s| s.ends_with('+')).count(), 13);
}
