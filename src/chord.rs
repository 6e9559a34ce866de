//! Chord symbol model: parsing, pitch classes and display.
//!
//! A chord symbol is a root note, a quality suffix drawn from a fixed
//! grammar (`m7`, `sus4`, `maj7`, `7#9`, `add9`, ...) and an optional slash
//! bass note. Equality and ordering go through pitch classes, so `A#m` and
//! `Bbm` are the same chord even though they print differently.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{anychar, char, one_of};
use nom::combinator::{map, map_opt, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};

use crate::SheetError;

// ═══════════════════════════════════════════════════════════════════════
// Note names
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    const fn semitone(self) -> u8 {
        match self {
            Self::C => 0,
            Self::D => 2,
            Self::E => 4,
            Self::F => 5,
            Self::G => 7,
            Self::A => 9,
            Self::B => 11,
        }
    }

    const fn as_char(self) -> char {
        match self {
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::A => 'A',
            Self::B => 'B',
        }
    }

    const fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            'G' => Some(Self::G),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    Sharp,
    Flat,
}

impl Accidental {
    const fn offset(self) -> i8 {
        match self {
            Self::Sharp => 1,
            Self::Flat => -1,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Sharp => "#",
            Self::Flat => "b",
        }
    }
}

/// A spelled note: letter plus optional accidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    pub letter: Letter,
    pub accidental: Option<Accidental>,
}

// Spellings for the 12 pitch classes, one table per accidental preference.
const SHARP_SPELLINGS: [(Letter, Option<Accidental>); 12] = [
    (Letter::C, None),
    (Letter::C, Some(Accidental::Sharp)),
    (Letter::D, None),
    (Letter::D, Some(Accidental::Sharp)),
    (Letter::E, None),
    (Letter::F, None),
    (Letter::F, Some(Accidental::Sharp)),
    (Letter::G, None),
    (Letter::G, Some(Accidental::Sharp)),
    (Letter::A, None),
    (Letter::A, Some(Accidental::Sharp)),
    (Letter::B, None),
];

const FLAT_SPELLINGS: [(Letter, Option<Accidental>); 12] = [
    (Letter::C, None),
    (Letter::D, Some(Accidental::Flat)),
    (Letter::D, None),
    (Letter::E, Some(Accidental::Flat)),
    (Letter::E, None),
    (Letter::F, None),
    (Letter::G, Some(Accidental::Flat)),
    (Letter::G, None),
    (Letter::A, Some(Accidental::Flat)),
    (Letter::A, None),
    (Letter::B, Some(Accidental::Flat)),
    (Letter::B, None),
];

impl NoteName {
    /// Pitch class in `[0, 11]`, C = 0.
    pub fn pitch_class(self) -> u8 {
        let offset = self.accidental.map_or(0, Accidental::offset);
        (i16::from(self.letter.semitone()) + i16::from(offset)).rem_euclid(12) as u8
    }

    /// Spell a pitch class using sharps or flats for the black keys.
    pub fn spell(pitch_class: u8, prefer: Accidental) -> Self {
        let table = match prefer {
            Accidental::Sharp => &SHARP_SPELLINGS,
            Accidental::Flat => &FLAT_SPELLINGS,
        };
        let (letter, accidental) = table[usize::from(pitch_class % 12)];
        Self { letter, accidental }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter.as_char())?;
        if let Some(acc) = self.accidental {
            f.write_str(acc.as_str())?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Chord symbols
// ═══════════════════════════════════════════════════════════════════════

/// Broad quality of a chord, used to match open shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordFamily {
    Major,
    Minor,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChordSymbol {
    root: NoteName,
    suffix: String,
    bass: Option<NoteName>,
}

impl ChordSymbol {
    pub fn parse(text: &str) -> Result<Self, SheetError> {
        parse(text)
    }

    pub const fn root(&self) -> NoteName {
        self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub const fn bass(&self) -> Option<NoteName> {
        self.bass
    }

    pub fn pitch_class(&self) -> u8 {
        self.root.pitch_class()
    }

    pub fn bass_pitch_class(&self) -> Option<u8> {
        self.bass.map(NoteName::pitch_class)
    }

    pub fn family(&self) -> ChordFamily {
        let s = self.suffix.as_str();
        if ["dim", "aug", "°", "ø", "+"].iter().any(|p| s.starts_with(p)) || s.contains("b5") {
            ChordFamily::Other
        } else if s.starts_with("min")
            || s.starts_with('-')
            || (s.starts_with('m') && !s.starts_with("maj"))
        {
            ChordFamily::Minor
        } else {
            ChordFamily::Major
        }
    }

    /// Same quality with new root and bass spellings.
    pub(crate) fn respelled(&self, root: NoteName, bass: Option<NoteName>) -> Self {
        Self {
            root,
            suffix: self.suffix.clone(),
            bass,
        }
    }

    /// Display width in character cells.
    pub fn width(&self) -> usize {
        self.to_string().chars().count()
    }
}

impl PartialEq for ChordSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChordSymbol {}

impl PartialOrd for ChordSymbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChordSymbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pitch_class()
            .cmp(&other.pitch_class())
            .then_with(|| self.suffix.cmp(&other.suffix))
            .then_with(|| self.bass_pitch_class().cmp(&other.bass_pitch_class()))
    }
}

impl Hash for ChordSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pitch_class().hash(state);
        self.suffix.hash(state);
        self.bass_pitch_class().hash(state);
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.suffix)?;
        if let Some(bass) = self.bass {
            write!(f, "/{bass}")?;
        }
        Ok(())
    }
}

impl FromStr for ChordSymbol {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl TryFrom<String> for ChordSymbol {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse(&value)
    }
}

impl From<ChordSymbol> for String {
    fn from(symbol: ChordSymbol) -> Self {
        symbol.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════════════════════════════════

fn letter(i: &str) -> IResult<&str, Letter> {
    map_opt(anychar, Letter::from_char).parse(i)
}

fn accidental(i: &str) -> IResult<&str, Accidental> {
    alt((
        value(Accidental::Sharp, one_of("#♯")),
        value(Accidental::Flat, one_of("b♭")),
    ))
    .parse(i)
}

fn note_name(i: &str) -> IResult<&str, NoteName> {
    map((letter, opt(accidental)), |(letter, accidental)| NoteName {
        letter,
        accidental,
    })
    .parse(i)
}

fn quality(i: &str) -> IResult<&str, &str> {
    alt((
        tag("mMaj"),
        tag("mmaj"),
        tag("maj"),
        tag("Maj"),
        tag("min"),
        tag("dim"),
        tag("aug"),
        tag("m"),
        tag("M"),
        tag("°"),
        tag("ø"),
        tag("+"),
        tag("-"),
    ))
    .parse(i)
}

fn extension(i: &str) -> IResult<&str, &str> {
    alt((
        tag("13"),
        tag("11"),
        tag("9"),
        tag("7"),
        tag("6"),
        tag("5"),
        tag("4"),
        tag("2"),
    ))
    .parse(i)
}

fn alteration(i: &str) -> IResult<&str, &str> {
    alt((
        tag("sus2"),
        tag("sus4"),
        tag("sus"),
        tag("add9"),
        tag("add11"),
        tag("add13"),
        tag("add2"),
        tag("add4"),
        tag("add6"),
        tag("maj7"),
        tag("maj9"),
        tag("no3"),
        tag("b5"),
        tag("#5"),
        tag("b9"),
        tag("#9"),
        tag("#11"),
        tag("b13"),
    ))
    .parse(i)
}

fn suffix(i: &str) -> IResult<&str, &str> {
    recognize((
        opt(quality),
        opt(extension),
        many0(alt((delimited(char('('), alteration, char(')')), alteration))),
    ))
    .parse(i)
}

/// Parse a chord symbol such as `G`, `F#m7`, `Bbsus4` or `D/F#`.
pub fn parse(text: &str) -> Result<ChordSymbol, SheetError> {
    let trimmed = text.trim();
    let invalid = |reason: String| SheetError::InvalidChordSyntax {
        chord: text.to_string(),
        reason,
    };

    let (after_root, root) =
        note_name(trimmed).map_err(|_| invalid("root must be one of A-G".to_string()))?;
    let (rest, suffix) =
        suffix(after_root).map_err(|_| invalid(format!("unrecognized suffix '{after_root}'")))?;
    let (rest, bass) = opt(preceded(char('/'), note_name))
        .parse(rest)
        .map_err(|_| invalid("invalid bass note".to_string()))?;

    if !rest.is_empty() {
        let reason = if rest.starts_with('/') {
            "bass note must be one of A-G".to_string()
        } else {
            let unparsed = after_root.split('/').next().unwrap_or(after_root);
            format!("unrecognized suffix '{unparsed}'")
        };
        return Err(invalid(reason));
    }

    Ok(ChordSymbol {
        root,
        suffix: suffix.to_string(),
        bass,
    })
}

/// Pitch class of the chord root, C = 0.
pub fn pitch_class(symbol: &ChordSymbol) -> u8 {
    symbol.pitch_class()
}

/// Printable form, preserving the original accidental spelling.
pub fn format(symbol: &ChordSymbol) -> String {
    symbol.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_extended_chords() {
        for (text, pc, suffix) in [
            ("G", 7, ""),
            ("Am", 9, "m"),
            ("F#m7", 6, "m7"),
            ("Bbsus4", 10, "sus4"),
            ("Cmaj7", 0, "maj7"),
            ("E7#9", 4, "7#9"),
            ("Cadd9", 0, "add9"),
            ("Bm7b5", 11, "m7b5"),
            ("Dm(maj7)", 2, "m(maj7)"),
            ("Cb", 11, ""),
        ] {
            let chord = parse(text).unwrap_or_else(|e| panic!("{text}: {e}"));
            assert_eq!(chord.pitch_class(), pc, "{text}");
            assert_eq!(chord.suffix(), suffix, "{text}");
            assert_eq!(chord.to_string(), text);
        }
    }

    #[test]
    fn parses_slash_bass() {
        let chord = parse("D/F#").unwrap();
        assert_eq!(chord.pitch_class(), 2);
        assert_eq!(chord.bass_pitch_class(), Some(6));
        assert_eq!(format(&chord), "D/F#");
        assert_eq!(chord.width(), 4);
    }

    #[test]
    fn rejects_bad_root() {
        let err = parse("H7").unwrap_err();
        assert!(matches!(err, SheetError::InvalidChordSyntax { ref chord, .. } if chord == "H7"));
        assert!(parse("").is_err());
    }

    #[test]
    fn rejects_unknown_suffix() {
        match parse("Cxyz") {
            Err(SheetError::InvalidChordSyntax { reason, .. }) => {
                assert!(reason.contains("xyz"), "{reason}");
            }
            other => panic!("expected InvalidChordSyntax, got {other:?}"),
        }
        assert!(parse("C/H").is_err());
    }

    #[test]
    fn equality_uses_pitch_class() {
        assert_eq!(parse("A#m").unwrap(), parse("Bbm").unwrap());
        assert_ne!(parse("A#m").unwrap(), parse("A#").unwrap());
        assert!(parse("C").unwrap() < parse("C#").unwrap());
    }

    #[test]
    fn format_round_trips_pitch_class() {
        for text in ["C#", "Db", "Gb7", "F#/A#", "Ebmaj7"] {
            let chord = parse(text).unwrap();
            let again = parse(&format(&chord)).unwrap();
            assert_eq!(pitch_class(&again), pitch_class(&chord));
            assert_eq!(again.suffix(), chord.suffix());
        }
    }

    #[test]
    fn families() {
        assert_eq!(parse("Em7").unwrap().family(), ChordFamily::Minor);
        assert_eq!(parse("Cmaj7").unwrap().family(), ChordFamily::Major);
        assert_eq!(parse("Dsus4").unwrap().family(), ChordFamily::Major);
        assert_eq!(parse("Bdim").unwrap().family(), ChordFamily::Other);
    }

    #[test]
    fn serde_uses_display_string() {
        let chord: ChordSymbol = serde_json::from_str("\"G/B\"").unwrap();
        assert_eq!(serde_json::to_string(&chord).unwrap(), "\"G/B\"");
        assert!(serde_json::from_str::<ChordSymbol>("\"X\"").is_err());
    }
}
