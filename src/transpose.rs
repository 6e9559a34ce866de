//! Transposition engine: semitone shifts with table-driven respelling,
//! capo suggestions, and whole-song transposition.

use std::collections::BTreeMap;

use crate::chord::{ChordFamily, ChordSymbol, NoteName};
use crate::chordpro::{progression_chords, AnnotatedLine};
use crate::config::TheoryTables;
use crate::model::{ChordDefinition, TabCore};
use crate::SheetError;

/// Shift a chord by `semitones`, respelled for the key it lands in.
///
/// Minor-quality chords are respelled by their relative major. A shift that
/// is a multiple of 12 returns the chord with its spelling untouched.
pub fn transpose(symbol: &ChordSymbol, semitones: i32, tables: &TheoryTables) -> ChordSymbol {
    if semitones.rem_euclid(12) == 0 {
        return symbol.clone();
    }
    let shift = |pc: u8| (i32::from(pc) + semitones).rem_euclid(12) as u8;
    let root = shift(symbol.pitch_class());
    let key = match symbol.family() {
        ChordFamily::Minor => (root + 3) % 12,
        _ => root,
    };
    let prefer = tables.preference_for_key(key);
    let bass = symbol
        .bass_pitch_class()
        .map(|pc| NoteName::spell(shift(pc), prefer));
    symbol.respelled(NoteName::spell(root, prefer), bass)
}

/// Transpose every chord of an annotated line; the lyric and offsets are kept.
pub fn transpose_line(line: &AnnotatedLine, semitones: i32, tables: &TheoryTables) -> AnnotatedLine {
    line.map_chords(|chord| transpose(chord, semitones, tables))
}

/// Rewrite every `[chord]` marker of ChordPro text. Nothing outside the
/// brackets changes.
pub fn transpose_chordpro(text: &str, semitones: i32, tables: &TheoryTables) -> Result<String, SheetError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find(']').ok_or_else(|| SheetError::InvalidAnnotation {
            line: text.to_string(),
            reason: "unclosed chord marker".to_string(),
        })?;
        let chord = ChordSymbol::parse(&after[..close])?;
        out.push('[');
        out.push_str(&transpose(&chord, semitones, tables).to_string());
        out.push(']');
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Transpose the chords of a bar progression such as `|: G | D/F# :|`.
pub fn transpose_progression(text: &str, semitones: i32, tables: &TheoryTables) -> Result<String, SheetError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (range, chord) in progression_chords(text)? {
        out.push_str(&text[last..range.start]);
        out.push_str(&transpose(&chord, semitones, tables).to_string());
        last = range.end;
    }
    out.push_str(&text[last..]);
    Ok(out)
}

// ═══════════════════════════════════════════════════════════════════════
// Capo suggestion
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapoSuggestion {
    pub capo: u8,
    /// Chords that fall on easy open shapes with this capo
    pub easy_count: usize,
    /// Original chord -> shape to play with the capo on
    pub substitutions: BTreeMap<ChordSymbol, ChordSymbol>,
}

/// Find the capo fret (0 to `tables.max_capo`) that puts the most chords
/// on easy open shapes. Ties go to the lowest fret.
pub fn suggest_capo(chords: &[ChordSymbol], tables: &TheoryTables) -> Result<CapoSuggestion, SheetError> {
    let mut unique: Vec<&ChordSymbol> = Vec::new();
    for chord in chords {
        if !unique.contains(&chord) {
            unique.push(chord);
        }
    }
    if unique.is_empty() {
        return Err(SheetError::NoSimplificationFound);
    }

    let mut best: Option<CapoSuggestion> = None;
    for capo in 0..=tables.max_capo {
        let substitutions: BTreeMap<ChordSymbol, ChordSymbol> = unique
            .iter()
            .map(|&c| (c.clone(), transpose(c, -i32::from(capo), tables)))
            .collect();
        let easy_count = substitutions.values().filter(|s| tables.is_easy_shape(s)).count();
        log::debug!("capo {capo}: {easy_count} of {} chords on open shapes", unique.len());
        if best.as_ref().is_none_or(|b| easy_count > b.easy_count) {
            best = Some(CapoSuggestion {
                capo,
                easy_count,
                substitutions,
            });
        }
    }
    best.ok_or(SheetError::NoSimplificationFound)
}

// ═══════════════════════════════════════════════════════════════════════
// Whole-song transposition
// ═══════════════════════════════════════════════════════════════════════

// Name, frets (low E first), fingers, barre.
const STANDARD_VOICINGS: &[(&str, [i8; 6], [u8; 6], Option<u8>)] = &[
    ("G", [3, 2, 0, 0, 0, 3], [2, 1, 0, 0, 0, 3], None),
    ("C", [-1, 3, 2, 0, 1, 0], [0, 3, 2, 0, 1, 0], None),
    ("D", [-1, -1, 0, 2, 3, 2], [0, 0, 0, 1, 3, 2], None),
    ("A", [-1, 0, 2, 2, 2, 0], [0, 0, 1, 2, 3, 0], None),
    ("E", [0, 2, 2, 1, 0, 0], [0, 2, 3, 1, 0, 0], None),
    ("F", [1, 3, 3, 2, 1, 1], [1, 3, 4, 2, 1, 1], Some(1)),
    ("Am", [-1, 0, 2, 2, 1, 0], [0, 0, 2, 3, 1, 0], None),
    ("Em", [0, 2, 2, 0, 0, 0], [0, 2, 3, 0, 0, 0], None),
    ("Dm", [-1, -1, 0, 2, 3, 1], [0, 0, 0, 2, 3, 1], None),
    ("B7", [-1, 2, 1, 2, 0, 2], [0, 2, 1, 3, 0, 4], None),
    ("Cadd9", [-1, 3, 2, 0, 3, 0], [0, 2, 1, 0, 3, 0], None),
    ("Dsus4", [-1, -1, 0, 2, 3, 3], [0, 0, 0, 1, 2, 3], None),
    ("G/B", [-1, 2, 0, 0, 0, 3], [0, 1, 0, 0, 0, 2], None),
];

/// A common open voicing for `chord`, if there is one.
pub fn standard_voicing(chord: &ChordSymbol) -> Option<ChordDefinition> {
    STANDARD_VOICINGS.iter().find_map(|(name, frets, fingers, barre)| {
        let symbol = ChordSymbol::parse(name).ok()?;
        (symbol == *chord).then(|| ChordDefinition {
            symbol: chord.clone(),
            frets: frets.to_vec(),
            fingers: fingers.to_vec(),
            barre: *barre,
            base_fret: 1,
        })
    })
}

/// A copy of `tab` moved by `semitones`: content, bar progressions, key and
/// chord voicings. Voicings come from the standard set when the new chord has
/// one, otherwise the old shape is moved up the neck.
pub fn transpose_song(tab: &TabCore, semitones: i32, tables: &TheoryTables) -> Result<TabCore, SheetError> {
    let mut out = tab.clone();
    if semitones.rem_euclid(12) == 0 {
        return Ok(out);
    }

    for section in &mut out.sections {
        section.lines = section
            .lines
            .iter()
            .map(|line| transpose_line(line, semitones, tables))
            .collect();
        if let Some(bars) = &section.bar_progression {
            section.bar_progression = Some(transpose_progression(bars, semitones, tables)?);
        }
    }

    if let Some(key) = &tab.meta.key {
        match ChordSymbol::parse(key) {
            Ok(symbol) => out.meta.key = Some(transpose(&symbol, semitones, tables).to_string()),
            Err(err) => log::warn!("keeping key '{key}' as written: {err}"),
        }
    }

    out.chords = tab
        .chords
        .values()
        .map(|definition| {
            let symbol = transpose(&definition.symbol, semitones, tables);
            let moved = match standard_voicing(&symbol) {
                Some(voicing) => voicing,
                None => definition.shifted(semitones, symbol.clone())?,
            };
            Ok((symbol.to_string(), moved))
        })
        .collect::<Result<_, SheetError>>()?;

    log::debug!(
        "transposed '{}' by {semitones} semitones ({} chord voicings)",
        tab.meta.title,
        out.chords.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use pretty_assertions::assert_eq;

    fn chord(s: &str) -> ChordSymbol {
        ChordSymbol::parse(s).unwrap()
    }

    fn up(s: &str, n: i32) -> String {
        transpose(&chord(s), n, &TheoryTables::standard()).to_string()
    }

    #[test]
    fn respells_for_target_key() {
        assert_eq!(up("G", 2), "A");
        assert_eq!(up("C", 1), "Db");
        assert_eq!(up("E", 2), "F#");
        assert_eq!(up("F", 5), "Bb");
        assert_eq!(up("G", -1), "F#");
        assert_eq!(up("D/F#", 2), "E/G#");
        assert_eq!(up("F/C", 5), "Bb/F");
    }

    #[test]
    fn minor_chords_follow_relative_major() {
        assert_eq!(up("Am", 4), "C#m");
        assert_eq!(up("Am", 1), "Bbm");
        assert_eq!(up("Em7", 2), "F#m7");
    }

    #[test]
    fn full_octave_keeps_spelling() {
        assert_eq!(up("Bb", 12), "Bb");
        assert_eq!(up("A#", 0), "A#");
    }

    #[test]
    fn chordpro_text_only_touches_markers() {
        let tables = TheoryTables::standard();
        let text = "[G]Hello [C]World, [D7]again\nno chords";
        assert_eq!(
            transpose_chordpro(text, 2, &tables).unwrap(),
            "[A]Hello [D]World, [E7]again\nno chords"
        );
        assert!(transpose_chordpro("[G Hello", 2, &tables).is_err());
    }

    #[test]
    fn line_offsets_are_kept() {
        let tables = TheoryTables::standard();
        let line = AnnotatedLine::parse("[C]Hi [E]there").unwrap();
        let moved = transpose_line(&line, 1, &tables);
        assert_eq!(moved.lyric(), "Hi there");
        assert_eq!(moved.tokens()[1].offset, 3);
        assert_eq!(moved.tokens()[1].chord.to_string(), "F");
    }

    #[test]
    fn progression_keeps_separators() {
        let tables = TheoryTables::standard();
        assert_eq!(
            transpose_progression("|: G  | D/F# | % :| x2", 2, &tables).unwrap(),
            "|: A  | E/G# | % :| x2"
        );
    }

    #[test]
    fn capo_for_flat_keys() {
        let tables = TheoryTables::standard();
        let suggestion = suggest_capo(&[chord("F"), chord("Bb"), chord("C")], &tables).unwrap();
        assert_eq!(suggestion.capo, 3);
        assert_eq!(suggestion.easy_count, 3);
        assert_eq!(suggestion.substitutions[&chord("F")].to_string(), "D");
        assert_eq!(suggestion.substitutions[&chord("Bb")].to_string(), "G");
        assert_eq!(suggestion.substitutions[&chord("C")].to_string(), "A");
    }

    #[test]
    fn capo_zero_when_already_easy() {
        let tables = TheoryTables::standard();
        let suggestion = suggest_capo(&[chord("G"), chord("C"), chord("D")], &tables).unwrap();
        assert_eq!(suggestion.capo, 0);
        assert_eq!(suggestion.substitutions[&chord("G")], chord("G"));
    }

    #[test]
    fn capo_on_empty_set_fails() {
        assert_eq!(
            suggest_capo(&[], &TheoryTables::standard()),
            Err(SheetError::NoSimplificationFound)
        );
    }

    #[test]
    fn song_transposition_rebuilds_voicings() {
        let tables = TheoryTables::standard();
        let mut tab = TabCore::new(Metadata {
            title: "Test".into(),
            artist: "Band".into(),
            key: Some("G".into()),
            ..Metadata::default()
        });
        tab.chords.insert("G".into(), standard_voicing(&chord("G")).unwrap());
        tab.chords.insert("Em".into(), standard_voicing(&chord("Em")).unwrap());
        tab.sections.push(crate::model::SongSection::new(
            crate::model::SectionType::Verse,
            vec![AnnotatedLine::parse("[G]one [Em]two").unwrap()],
        ));

        let moved = transpose_song(&tab, 2, &tables).unwrap();
        assert_eq!(moved.meta.key.as_deref(), Some("A"));
        assert_eq!(moved.sections[0].lines[0].to_chordpro(), "[A]one [F#m]two");
        assert_eq!(moved.chords["A"].frets, vec![-1, 0, 2, 2, 2, 0]);
        let fsm = &moved.chords["F#m"];
        assert_eq!(fsm.frets, vec![2, 4, 4, 2, 2, 2]);
        assert_eq!(fsm.barre, Some(2));
        moved.validate().unwrap();
    }

    #[test]
    fn song_with_unplayable_voicing_fails_cleanly() {
        let tables = TheoryTables::standard();
        let mut tab = TabCore::new(Metadata::default());
        tab.chords.insert(
            "G".into(),
            ChordDefinition::new(chord("G"), vec![120, 2, 0, 0, 0, 3], vec![]),
        );
        tab.sections.push(crate::model::SongSection::new(
            crate::model::SectionType::Verse,
            vec![AnnotatedLine::parse("[G]one").unwrap()],
        ));

        // G + 11 is F#, which has no standard voicing, so the shape is moved
        let err = transpose_song(&tab, 11, &tables).unwrap_err();
        assert!(matches!(err, SheetError::InvalidFretData { ref chord, .. } if chord == "G"), "{err}");
    }
}
