//! Chord-over-lyric alignment in fixed-width character cells.

use crate::chordpro::AnnotatedLine;

/// Two printable rows for one annotated line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedLine {
    pub chord_row: String,
    pub lyric_row: String,
    /// Printed width in character cells.
    pub width: usize,
    /// Start column and display text of each chord.
    pub placements: Vec<(usize, String)>,
}

impl AlignedLine {
    pub fn has_chords(&self) -> bool {
        !self.placements.is_empty()
    }
}

/// Lay out the chords of `line` over its lyric.
///
/// Each chord starts at `max(chord_cursor, lyric_cursor)`; when a previous
/// chord ran past the syllable it sat on, the lyric row is padded with spaces
/// until it catches up. Chords are kept at least one column apart and both
/// rows end at the same width. A line without chords gives an empty chord row
/// and the lyric as is.
pub fn align_line(line: &AnnotatedLine) -> AlignedLine {
    if line.tokens().is_empty() {
        let lyric_row = line.lyric().to_string();
        return AlignedLine {
            width: lyric_row.chars().count(),
            chord_row: String::new(),
            lyric_row,
            placements: Vec::new(),
        };
    }

    let chars: Vec<char> = line.lyric().chars().collect();
    let mut chord_row = String::new();
    let mut lyric_row = String::new();
    let mut chord_cursor = 0;
    let mut lyric_cursor = 0;
    let mut consumed = 0;
    let mut placements = Vec::with_capacity(line.tokens().len());

    for token in line.tokens() {
        // flush lyric text up to the anchor
        for &c in &chars[consumed..token.offset] {
            lyric_row.push(c);
        }
        lyric_cursor += token.offset - consumed;
        consumed = token.offset;

        let start = chord_cursor.max(lyric_cursor);
        pad_to(&mut lyric_row, &mut lyric_cursor, start);
        let mut chord_len = chord_row.chars().count();
        pad_to(&mut chord_row, &mut chord_len, start);

        let text = token.chord.to_string();
        let width = token.chord.width();
        chord_row.push_str(&text);
        chord_cursor = start + width + 1;
        placements.push((start, text));
    }

    for &c in &chars[consumed..] {
        lyric_row.push(c);
        lyric_cursor += 1;
    }

    let mut chord_len = chord_row.chars().count();
    let width = chord_len.max(lyric_cursor);
    pad_to(&mut chord_row, &mut chord_len, width);
    pad_to(&mut lyric_row, &mut lyric_cursor, width);

    AlignedLine {
        chord_row,
        lyric_row,
        width,
        placements,
    }
}

fn pad_to(row: &mut String, cursor: &mut usize, target: usize) {
    while *cursor < target {
        row.push(' ');
        *cursor += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn align(text: &str) -> AlignedLine {
        align_line(&AnnotatedLine::parse(text).unwrap())
    }

    #[test]
    fn chords_sit_over_their_syllables() {
        let aligned = align("[G]Hello [C]World");
        assert_eq!(aligned.chord_row, "G     C    ");
        assert_eq!(aligned.lyric_row, "Hello World");
        assert_eq!(aligned.width, 11);
    }

    #[test]
    fn wide_chord_pads_the_syllable() {
        let aligned = align("[Cmaj7]I [G]love");
        assert_eq!(aligned.chord_row, "Cmaj7 G   ");
        assert_eq!(aligned.lyric_row, "I     love");
        assert_eq!(aligned.placements, vec![(0, "Cmaj7".to_string()), (6, "G".to_string())]);
    }

    #[test]
    fn adjacent_chords_keep_a_gap() {
        let aligned = align("[G]a[D/F#]b[Em]c");
        assert_eq!(aligned.chord_row, "G D/F# Em");
        assert_eq!(aligned.lyric_row, "a b    c ");
    }

    #[test]
    fn chord_at_end_of_line() {
        let aligned = align("Goodbye[Am]");
        assert_eq!(aligned.chord_row, "       Am");
        assert_eq!(aligned.lyric_row, "Goodbye  ");
    }

    #[test]
    fn no_tokens_leaves_lyric_alone() {
        let aligned = align("just words  ");
        assert_eq!(aligned.chord_row, "");
        assert_eq!(aligned.lyric_row, "just words  ");
        assert!(!aligned.has_chords());
    }

    #[test]
    fn rows_match_and_chords_never_overlap() {
        for text in [
            "[G]Hello [C]World",
            "[Cmaj7]a[Dsus4]b[G/B]c",
            "Ça [D]va [Bbm7b5]bien[E]",
            "[A][B]x",
        ]
        .iter()
        .filter_map(|t| AnnotatedLine::parse(t).ok())
        {
            let aligned = align_line(&text);
            assert_eq!(aligned.chord_row.chars().count(), aligned.lyric_row.chars().count());
            for pair in aligned.placements.windows(2) {
                let (start, chord) = &pair[0];
                assert!(start + chord.chars().count() < pair[1].0, "{text}");
            }
        }
    }
}
