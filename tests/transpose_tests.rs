//! Transposition tests over a spread of chord symbols and the sample song.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tabsheet::{parse_file, render_sheet, suggest_capo, transpose, transpose_song, ChordSymbol, SheetConfig, TheoryTables};

const SYMBOLS: &[&str] = &[
    "C", "C#", "Db", "D", "Eb", "E", "F", "F#", "Gb", "G", "Ab", "A", "Bb", "B", "Am", "C#m7", "Ebmaj7", "Gsus4",
    "Bdim", "F#m7b5", "Cadd9", "D/F#", "Bb/D", "Em7/B", "A7", "G6", "Faug",
];

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn symbols() -> Vec<ChordSymbol> {
    SYMBOLS.iter().map(|s| ChordSymbol::parse(s).unwrap()).collect()
}

#[test]
fn octave_shift_is_identity() {
    let tables = TheoryTables::standard();
    for symbol in symbols() {
        for n in [-24, -12, 0, 12, 36] {
            let moved = transpose(&symbol, n, &tables);
            assert_eq!(moved.to_string(), symbol.to_string(), "shift {n}");
        }
    }
    println!("✓ {} chords unchanged by whole octaves", SYMBOLS.len());
}

#[test]
fn shifts_compose() {
    let tables = TheoryTables::standard();
    for symbol in symbols() {
        for m in -11..=11 {
            for n in [-7, -2, 1, 5] {
                let stepwise = transpose(&transpose(&symbol, m, &tables), n, &tables);
                let direct = transpose(&symbol, m + n, &tables);
                assert_eq!(stepwise, direct, "{symbol} by {m} then {n}");
                assert_eq!(stepwise.suffix(), symbol.suffix());
            }
        }
    }
}

#[test]
fn shift_moves_root_and_bass_together() {
    let tables = TheoryTables::standard();
    for symbol in symbols() {
        for n in 1..12 {
            let moved = transpose(&symbol, n, &tables);
            let expected_root = (i32::from(symbol.pitch_class()) + n).rem_euclid(12) as u8;
            assert_eq!(moved.pitch_class(), expected_root, "{symbol} + {n}");
            assert_eq!(
                moved.bass_pitch_class(),
                symbol
                    .bass_pitch_class()
                    .map(|pc| (i32::from(pc) + n).rem_euclid(12) as u8)
            );
        }
    }
}

#[test]
fn formatted_symbols_parse_back() {
    let tables = TheoryTables::standard();
    for symbol in symbols() {
        for n in 0..12 {
            let moved = transpose(&symbol, n, &tables);
            let reparsed = ChordSymbol::parse(&moved.to_string()).unwrap();
            assert_eq!(reparsed.pitch_class(), moved.pitch_class());
            assert_eq!(reparsed.suffix(), moved.suffix());
            assert_eq!(reparsed.bass_pitch_class(), moved.bass_pitch_class());
        }
    }
}

#[test]
fn capo_for_f_bb_c() {
    let tables = TheoryTables::standard();
    let chords: Vec<ChordSymbol> = ["F", "Bb", "C", "F"].iter().map(|s| ChordSymbol::parse(s).unwrap()).collect();
    let suggestion = suggest_capo(&chords, &tables).unwrap();
    assert!(suggestion.capo > 0);
    assert_eq!(suggestion.easy_count, 3, "duplicates count once");
    assert!(suggestion.substitutions.values().all(|shape| tables.is_easy_shape(shape)));
    println!(
        "✓ capo {} with shapes {:?}",
        suggestion.capo,
        suggestion.substitutions.values().map(ToString::to_string).collect::<Vec<_>>()
    );
}

#[test]
fn transposed_song_renders() {
    let tables = TheoryTables::standard();
    let tab = parse_file(fixtures_dir().join("ripple.json")).unwrap();
    let moved = transpose_song(&tab, 2, &tables).unwrap();

    assert_eq!(moved.meta.key.as_deref(), Some("A"));
    let used: Vec<String> = moved.used_chords().unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(used, vec!["A", "D", "E", "Bm"]);
    assert_eq!(
        moved.sections[0].bar_progression.as_deref(),
        Some("| A | D | A | E |")
    );

    // no open Bm shape, so the Am voicing moves up two frets under a barre
    let bm = &moved.chords["Bm"];
    assert_eq!(bm.frets, vec![-1, 2, 4, 4, 3, 2]);
    assert_eq!(bm.barre, Some(2));

    // lyric text is untouched
    assert_eq!(moved.sections[1].lines[0].lyric(), tab.sections[1].lines[0].lyric());

    let sheet = render_sheet(&moved, &SheetConfig::default()).unwrap();
    assert_eq!(sheet.pages.len(), 1);
    println!("✓ Ripple in A renders on {} page", sheet.pages.len());
}
