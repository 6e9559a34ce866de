//! Data model for a song sheet.
//!
//! A `TabCore` is built whole by the caller (usually deserialized from JSON)
//! and treated as immutable input by the renderer.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chord::ChordSymbol;
use crate::chordpro::{progression_chords, AnnotatedLine};
use crate::SheetError;

/// Strings on a standard guitar.
pub const STRING_COUNT: usize = 6;

/// Highest fret accepted in chord definitions and tablature.
pub const MAX_FRET: i8 = 24;

/// A complete song sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabCore {
    /// Title, artist, key and other header information
    #[serde(flatten)]
    pub meta: Metadata,
    /// Play order as section identifiers (e.g. "intro", "verse1", "chorus")
    #[serde(default)]
    pub structure: Vec<String>,
    /// Chord voicings keyed by chord name
    #[serde(default)]
    pub chords: BTreeMap<String, ChordDefinition>,
    /// Song sections in print order
    #[serde(default)]
    pub sections: Vec<SongSection>,
    /// Strumming/picking patterns
    #[serde(default)]
    pub patterns: Vec<PickingPattern>,
    /// Free-form playing notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Where the tab came from
    #[serde(default)]
    pub source_url: Option<String>,
    /// Practice audio, shown as a QR code slot in the footer
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Header information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub artist: String,
    /// Songwriters, when different from the artist
    #[serde(default)]
    pub writers: Vec<String>,
    /// Musical key, e.g. "G", "Am", "F#m"
    #[serde(default)]
    pub key: Option<String>,
    /// Capo fret
    #[serde(default)]
    pub capo: Option<u8>,
    /// Tempo in BPM
    #[serde(default)]
    pub tempo: Option<u32>,
    /// e.g. "3/4"; "4/4" is not printed
    #[serde(default)]
    pub time_signature: Option<String>,
    /// e.g. "Drop D"; "Standard" is not printed
    #[serde(default)]
    pub tuning: Option<String>,
    /// "Beginner", "Intermediate", "Advanced" or free text
    #[serde(default)]
    pub difficulty: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Chord definitions
// ═══════════════════════════════════════════════════════════════════════

/// A chord voicing: one fret value per string, low E first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordDefinition {
    #[serde(rename = "name")]
    pub symbol: ChordSymbol,
    /// -1 = muted, 0 = open, otherwise the fret number
    pub frets: Vec<i8>,
    /// Finger per string, 0 = none; empty means no finger numbers at all
    #[serde(default)]
    pub fingers: Vec<u8>,
    /// Fret held by a barre, if any
    #[serde(default)]
    pub barre: Option<u8>,
    /// First fret shown in the diagram
    #[serde(default = "default_base_fret")]
    pub base_fret: u8,
}

const fn default_base_fret() -> u8 {
    1
}

impl ChordDefinition {
    pub fn new(symbol: ChordSymbol, frets: Vec<i8>, fingers: Vec<u8>) -> Self {
        Self {
            symbol,
            frets,
            fingers,
            barre: None,
            base_fret: 1,
        }
    }

    #[must_use]
    pub const fn with_barre(mut self, fret: u8) -> Self {
        self.barre = Some(fret);
        self
    }

    #[must_use]
    pub const fn with_base_fret(mut self, fret: u8) -> Self {
        self.base_fret = fret;
        self
    }

    pub fn finger(&self, string: usize) -> u8 {
        self.fingers.get(string).copied().unwrap_or(0)
    }

    /// Structural checks: string count, value ranges, barre placement.
    /// The display window is checked by the diagram generator.
    pub fn validate(&self) -> Result<(), SheetError> {
        let invalid = |reason: String| SheetError::InvalidFretData {
            chord: self.symbol.to_string(),
            reason,
        };
        if self.frets.len() != STRING_COUNT {
            return Err(invalid(format!(
                "expected {STRING_COUNT} fret values, got {}",
                self.frets.len()
            )));
        }
        if !self.fingers.is_empty() && self.fingers.len() != self.frets.len() {
            return Err(invalid(format!(
                "{} finger values for {} strings",
                self.fingers.len(),
                self.frets.len()
            )));
        }
        if let Some(bad) = self.frets.iter().find(|&&f| !(-1..=MAX_FRET).contains(&f)) {
            return Err(invalid(format!("fret {bad} out of range -1..={MAX_FRET}")));
        }
        if let Some(bad) = self.fingers.iter().find(|&&f| f > 4) {
            return Err(invalid(format!("finger {bad} out of range 0..=4")));
        }
        if self.base_fret == 0 {
            return Err(invalid("base fret must be at least 1".to_string()));
        }
        if let Some(barre) = self.barre {
            if !self.frets.iter().any(|&f| f > 0 && f as u8 == barre) {
                return Err(invalid(format!("barre fret {barre} is not played on any string")));
            }
        }
        Ok(())
    }

    /// The same shape moved `semitones` up the neck (taken mod 12). Open
    /// strings become fretted, held by a barre when two or more of them
    /// move. Finger numbers no longer apply and are dropped. Fails with
    /// `InvalidFretData` when a fret would land past `MAX_FRET`.
    pub fn shifted(&self, semitones: i32, symbol: ChordSymbol) -> Result<Self, SheetError> {
        let shift = semitones.rem_euclid(12) as i8;
        if shift == 0 {
            return Ok(Self {
                symbol,
                ..self.clone()
            });
        }
        let too_high = |fret: i32| SheetError::InvalidFretData {
            chord: self.symbol.to_string(),
            reason: format!("moving up {shift} frets puts fret {fret} past {MAX_FRET}"),
        };
        let frets = self
            .frets
            .iter()
            .map(|&f| match f {
                f if f < 0 => Ok(f),
                f => f
                    .checked_add(shift)
                    .filter(|&moved| moved <= MAX_FRET)
                    .ok_or_else(|| too_high(i32::from(f) + i32::from(shift))),
            })
            .collect::<Result<Vec<i8>, SheetError>>()?;
        let opened = self.frets.iter().filter(|&&f| f == 0).count();
        let barre = match self.barre {
            Some(b) => Some(
                b.checked_add(shift as u8)
                    .filter(|&moved| i16::from(moved) <= i16::from(MAX_FRET))
                    .ok_or_else(|| too_high(i32::from(b) + i32::from(shift)))?,
            ),
            None if opened >= 2 => Some(shift as u8),
            None => None,
        };
        let highest = frets.iter().copied().max().unwrap_or(0);
        let lowest = frets.iter().copied().filter(|&f| f > 0).min().unwrap_or(1);
        let base_fret = if highest <= 5 { 1 } else { lowest as u8 };
        Ok(Self {
            symbol,
            frets,
            fingers: Vec::new(),
            barre,
            base_fret,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SectionType {
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Solo,
    Interlude,
    Outro,
}

impl SectionType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Intro => "Intro",
            Self::Verse => "Verse",
            Self::PreChorus => "Pre-Chorus",
            Self::Chorus => "Chorus",
            Self::Bridge => "Bridge",
            Self::Solo => "Solo",
            Self::Interlude => "Interlude",
            Self::Outro => "Outro",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SectionType {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "intro" => Ok(Self::Intro),
            "verse" => Ok(Self::Verse),
            "prechorus" => Ok(Self::PreChorus),
            "chorus" => Ok(Self::Chorus),
            "bridge" => Ok(Self::Bridge),
            "solo" => Ok(Self::Solo),
            "interlude" => Ok(Self::Interlude),
            "outro" => Ok(Self::Outro),
            _ => Err(SheetError::UnknownSectionType {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SectionType {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SectionType> for String {
    fn from(kind: SectionType) -> Self {
        kind.name().to_string()
    }
}

/// A block of the song: lyrics with chords, optional bars and tablature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongSection {
    #[serde(rename = "type")]
    pub kind: SectionType,
    /// Custom label such as "Verse 1"; falls back to the type name
    #[serde(default)]
    pub label: Option<String>,
    /// ChordPro content, one annotated line per text line
    #[serde(default, rename = "content", with = "content_lines")]
    pub lines: Vec<AnnotatedLine>,
    /// Tablature for riffs, intros and solos
    #[serde(default)]
    pub tab: Vec<TabStaff>,
    /// Bar notation such as `|G|G|C|C|`
    #[serde(default)]
    pub bar_progression: Option<String>,
    /// How many times the section is played
    #[serde(default)]
    pub repeat: Option<u32>,
    /// Name of a `PickingPattern`
    #[serde(default)]
    pub pattern_ref: Option<String>,
}

impl SongSection {
    pub fn new(kind: SectionType, lines: Vec<AnnotatedLine>) -> Self {
        Self {
            kind,
            label: None,
            lines,
            tab: Vec::new(),
            bar_progression: None,
            repeat: None,
            pattern_ref: None,
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.kind.name())
    }
}

mod content_lines {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::chordpro::{parse_content, AnnotatedLine};

    pub fn serialize<S: Serializer>(lines: &[AnnotatedLine], s: S) -> Result<S::Ok, S::Error> {
        let text = lines
            .iter()
            .map(AnnotatedLine::to_chordpro)
            .collect::<Vec<_>>()
            .join("\n");
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<AnnotatedLine>, D::Error> {
        let text = String::deserialize(d)?;
        parse_content(&text).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Tablature and patterns
// ═══════════════════════════════════════════════════════════════════════

/// One mark on a tab string; `fret: None` is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabMark {
    pub column: usize,
    #[serde(default)]
    pub fret: Option<u8>,
}

/// Six strings of tablature, high e first (print order).
///
/// Deserializes from either mark lists or ASCII lines like `"--0--2--"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TabStaffRepr", into = "TabStaffRepr")]
pub struct TabStaff {
    strings: Vec<Vec<TabMark>>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TabStaffRepr {
    Marks(Vec<Vec<TabMark>>),
    Ascii(Vec<String>),
}

impl TabStaff {
    pub fn new(strings: Vec<Vec<TabMark>>) -> Result<Self, SheetError> {
        if strings.len() != STRING_COUNT {
            return Err(SheetError::InvalidInput(format!(
                "tablature needs {STRING_COUNT} strings, got {}",
                strings.len()
            )));
        }
        for (i, marks) in strings.iter().enumerate() {
            if marks.windows(2).any(|w| w[1].column <= w[0].column) {
                return Err(SheetError::InvalidInput(format!(
                    "tab string {i}: mark columns must increase"
                )));
            }
            if let Some(m) = marks.iter().find(|m| m.fret.is_some_and(|f| i16::from(f) > i16::from(MAX_FRET))) {
                return Err(SheetError::InvalidInput(format!(
                    "tab string {i}: fret {:?} out of range",
                    m.fret
                )));
            }
        }
        Ok(Self { strings })
    }

    /// Read ASCII tab lines. Digit runs become frets at the column of their
    /// first digit; `-`, `|` and technique letters are not kept.
    pub fn from_ascii<S: AsRef<str>>(lines: &[S]) -> Result<Self, SheetError> {
        let strings = lines
            .iter()
            .map(|line| {
                let mut marks = Vec::new();
                let mut digits: Option<(usize, u32)> = None;
                for (col, c) in line.as_ref().chars().chain(std::iter::once('-')).enumerate() {
                    match (c.to_digit(10), digits) {
                        (Some(d), Some((start, value))) => {
                            let value = value.checked_mul(10).and_then(|v| v.checked_add(d)).ok_or_else(|| {
                                SheetError::InvalidInput(format!("tab fret at column {start} is too large"))
                            })?;
                            digits = Some((start, value));
                        }
                        (Some(d), None) => digits = Some((col, d)),
                        (None, Some((start, value))) => {
                            let fret = u8::try_from(value).map_err(|_| {
                                SheetError::InvalidInput(format!("tab fret {value} out of range"))
                            })?;
                            marks.push(TabMark {
                                column: start,
                                fret: Some(fret),
                            });
                            digits = None;
                        }
                        (None, None) => {}
                    }
                }
                Ok(marks)
            })
            .collect::<Result<Vec<_>, SheetError>>()?;
        Self::new(strings)
    }

    pub fn strings(&self) -> &[Vec<TabMark>] {
        &self.strings
    }

    pub fn is_empty(&self) -> bool {
        self.strings.iter().all(Vec::is_empty)
    }
}

impl Default for TabStaff {
    fn default() -> Self {
        Self {
            strings: vec![Vec::new(); STRING_COUNT],
        }
    }
}

impl TryFrom<TabStaffRepr> for TabStaff {
    type Error = SheetError;

    fn try_from(repr: TabStaffRepr) -> Result<Self, Self::Error> {
        match repr {
            TabStaffRepr::Marks(strings) => Self::new(strings),
            TabStaffRepr::Ascii(lines) => Self::from_ascii(&lines),
        }
    }
}

impl From<TabStaff> for TabStaffRepr {
    fn from(staff: TabStaff) -> Self {
        Self::Marks(staff.strings)
    }
}

/// A named strumming or fingerpicking pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickingPattern {
    pub name: String,
    /// Strum notation such as "D DU UDU"
    #[serde(default)]
    pub notation: Option<String>,
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u8,
    #[serde(default)]
    pub tab: TabStaff,
}

const fn default_beats_per_bar() -> u8 {
    4
}

// ═══════════════════════════════════════════════════════════════════════
// TabCore
// ═══════════════════════════════════════════════════════════════════════

/// Where a chord is used in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordUse {
    pub chord: ChordSymbol,
    pub section: String,
    pub line: usize,
}

impl TabCore {
    pub fn new(meta: Metadata) -> Self {
        Self {
            meta,
            structure: Vec::new(),
            chords: BTreeMap::new(),
            sections: Vec::new(),
            patterns: Vec::new(),
            notes: None,
            source_url: None,
            audio_url: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SheetError::Io(format!("failed to read '{}': {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, SheetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every chord occurrence in section content and bar progressions.
    /// Bar progression uses are reported on line 0 of "<label> (bars)".
    pub fn chord_uses(&self) -> Result<Vec<ChordUse>, SheetError> {
        let mut uses = Vec::new();
        for section in &self.sections {
            let label = section.display_label();
            if let Some(bars) = &section.bar_progression {
                for (_, chord) in progression_chords(bars)? {
                    uses.push(ChordUse {
                        chord,
                        section: format!("{label} (bars)"),
                        line: 0,
                    });
                }
            }
            for (i, line) in section.lines.iter().enumerate() {
                for token in line.tokens() {
                    uses.push(ChordUse {
                        chord: token.chord.clone(),
                        section: label.to_string(),
                        line: i,
                    });
                }
            }
        }
        Ok(uses)
    }

    /// Unique chords in order of first appearance.
    pub fn used_chords(&self) -> Result<Vec<ChordSymbol>, SheetError> {
        let mut unique: Vec<ChordSymbol> = Vec::new();
        for chord_use in self.chord_uses()? {
            if !unique.contains(&chord_use.chord) {
                unique.push(chord_use.chord);
            }
        }
        Ok(unique)
    }

    /// Definition for a chord, matched by pitch class rather than spelling.
    pub fn definition_for(&self, chord: &ChordSymbol) -> Option<&ChordDefinition> {
        self.chords.values().find(|d| d.symbol == *chord)
    }

    pub fn pattern(&self, name: &str) -> Option<&PickingPattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Input contract checks; fails fast on the first problem.
    pub fn validate(&self) -> Result<(), SheetError> {
        for (name, definition) in &self.chords {
            let key = ChordSymbol::parse(name)?;
            if key != definition.symbol {
                return Err(SheetError::InvalidInput(format!(
                    "chord map key '{name}' holds a definition for '{}'",
                    definition.symbol
                )));
            }
        }
        for section in &self.sections {
            if section.repeat == Some(0) {
                return Err(SheetError::InvalidInput(format!(
                    "section '{}' has a repeat count of 0",
                    section.display_label()
                )));
            }
            if let Some(pattern) = &section.pattern_ref {
                if self.pattern(pattern).is_none() {
                    return Err(SheetError::UnknownPattern {
                        pattern: pattern.clone(),
                        section: section.display_label().to_string(),
                    });
                }
            }
        }
        for chord_use in self.chord_uses()? {
            if self.definition_for(&chord_use.chord).is_none() {
                return Err(SheetError::MissingChordDefinition {
                    chord: chord_use.chord.to_string(),
                    section: chord_use.section,
                    line: chord_use.line,
                });
            }
        }
        Ok(())
    }

    /// Export as ChordPro text.
    pub fn to_chordpro_text(&self) -> String {
        let mut out = vec![
            format!("{{title: {}}}", self.meta.title),
            format!("{{artist: {}}}", self.meta.artist),
        ];
        if let Some(key) = &self.meta.key {
            out.push(format!("{{key: {key}}}"));
        }
        if let Some(capo) = self.meta.capo.filter(|&c| c > 0) {
            out.push(format!("{{capo: {capo}}}"));
        }
        if let Some(tempo) = self.meta.tempo {
            out.push(format!("{{tempo: {tempo}}}"));
        }
        out.push(String::new());
        for section in &self.sections {
            out.push(format!("{{comment: {}}}", section.display_label()));
            if let Some(bars) = &section.bar_progression {
                out.push(bars.clone());
            }
            out.extend(section.lines.iter().map(AnnotatedLine::to_chordpro));
            out.push(String::new());
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG: &str = r#"{
        "title": "Ripple",
        "artist": "Grateful Dead",
        "key": "G",
        "structure": ["intro", "verse1", "chorus"],
        "chords": {
            "G": { "name": "G", "frets": [3, 2, 0, 0, 0, 3], "fingers": [2, 1, 0, 0, 0, 3] },
            "C": { "name": "C", "frets": [-1, 3, 2, 0, 1, 0], "fingers": [0, 3, 2, 0, 1, 0] },
            "D": { "name": "D", "frets": [-1, -1, 0, 2, 3, 2] }
        },
        "sections": [
            { "type": "intro", "bar_progression": "| G | C | G | D |" },
            { "type": "verse", "label": "Verse 1", "content": "If my [C]words did glow\n[G]with the gold of sunshine" },
            { "type": "Chorus", "content": "[D]Ripple in still [G]water", "repeat": 2, "pattern_ref": "Strum" }
        ],
        "patterns": [ { "name": "Strum", "notation": "D DU UDU" } ]
    }"#;

    #[test]
    fn loads_song_json() {
        let tab = TabCore::from_json(SONG).unwrap();
        assert_eq!(tab.meta.title, "Ripple");
        assert_eq!(tab.sections.len(), 3);
        assert_eq!(tab.sections[1].lines.len(), 2);
        assert_eq!(tab.sections[1].display_label(), "Verse 1");
        assert_eq!(tab.sections[2].display_label(), "Chorus");
        assert_eq!(tab.chords["G"].base_fret, 1);
        assert_eq!(tab.patterns[0].beats_per_bar, 4);
        assert!(tab.patterns[0].tab.is_empty());
        tab.validate().unwrap();
    }

    #[test]
    fn used_chords_in_first_appearance_order() {
        let tab = TabCore::from_json(SONG).unwrap();
        let names: Vec<String> = tab.used_chords().unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["G", "C", "D"]);
    }

    #[test]
    fn unknown_section_type_is_rejected() {
        let json = SONG.replace("\"type\": \"intro\"", "\"type\": \"coda\"");
        let err = TabCore::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("unknown section type"), "{err}");
    }

    #[test]
    fn missing_pattern_is_rejected() {
        let json = SONG.replace("\"name\": \"Strum\"", "\"name\": \"Picking\"");
        let tab = TabCore::from_json(&json).unwrap();
        assert_eq!(
            tab.validate(),
            Err(SheetError::UnknownPattern {
                pattern: "Strum".into(),
                section: "Chorus".into()
            })
        );
    }

    #[test]
    fn missing_chord_reports_location() {
        let json = SONG.replace("[G]with", "[Em]with");
        let tab = TabCore::from_json(&json).unwrap();
        assert_eq!(
            tab.validate(),
            Err(SheetError::MissingChordDefinition {
                chord: "Em".into(),
                section: "Verse 1".into(),
                line: 1
            })
        );
    }

    #[test]
    fn definition_lookup_ignores_spelling() {
        let mut tab = TabCore::new(Metadata::default());
        let bb = ChordSymbol::parse("Bb").unwrap();
        tab.chords.insert(
            "Bb".into(),
            ChordDefinition::new(bb, vec![-1, 1, 3, 3, 3, 1], vec![]).with_barre(1),
        );
        assert!(tab.definition_for(&ChordSymbol::parse("A#").unwrap()).is_some());
    }

    #[test]
    fn definition_validation() {
        let g = ChordSymbol::parse("G").unwrap();
        assert!(ChordDefinition::new(g.clone(), vec![3, 2, 0, 0, 3], vec![]).validate().is_err());
        assert!(ChordDefinition::new(g.clone(), vec![3, 2, 0, 0, 0, 3], vec![1, 2])
            .validate()
            .is_err());
        assert!(ChordDefinition::new(g.clone(), vec![3, 2, 0, 0, 0, 3], vec![])
            .with_barre(5)
            .validate()
            .is_err());
        assert!(ChordDefinition::new(g, vec![3, 2, 0, 0, 0, 3], vec![2, 1, 0, 0, 0, 3])
            .validate()
            .is_ok());
    }

    #[test]
    fn shifting_open_shape_adds_barre() {
        let e = ChordSymbol::parse("E").unwrap();
        let f = ChordSymbol::parse("F").unwrap();
        let shape = ChordDefinition::new(e, vec![0, 2, 2, 1, 0, 0], vec![0, 2, 3, 1, 0, 0]);
        let moved = shape.shifted(1, f).unwrap();
        assert_eq!(moved.frets, vec![1, 3, 3, 2, 1, 1]);
        assert_eq!(moved.barre, Some(1));
        assert_eq!(moved.base_fret, 1);
        assert!(moved.fingers.is_empty());
        moved.validate().unwrap();

        let high = shape.shifted(7, ChordSymbol::parse("B").unwrap()).unwrap();
        assert_eq!(high.frets, vec![7, 9, 9, 8, 7, 7]);
        assert_eq!(high.base_fret, 7);
    }

    #[test]
    fn shifting_past_the_last_fret_fails() {
        let g = ChordSymbol::parse("G").unwrap();
        let high = ChordDefinition::new(g.clone(), vec![120, 2, 0, 0, 0, 3], vec![]);
        let err = high.shifted(11, ChordSymbol::parse("F#").unwrap()).unwrap_err();
        assert!(matches!(err, SheetError::InvalidFretData { ref chord, .. } if chord == "G"), "{err}");

        let barred = ChordDefinition::new(g, vec![22, 24, 24, 23, 22, 22], vec![]).with_barre(22);
        assert!(barred.shifted(3, ChordSymbol::parse("Bb").unwrap()).is_err());
    }

    #[test]
    fn unused_voicings_are_not_checked_by_the_song() {
        let mut tab = TabCore::from_json(SONG).unwrap();
        let am = ChordSymbol::parse("Am").unwrap();
        tab.chords.insert(
            "Am".into(),
            ChordDefinition::new(am, vec![-1, 0, 2, 2, 1, 0], vec![]).with_barre(5),
        );
        // the voicing itself is broken, but only its diagram can fail
        assert!(tab.chords["Am"].validate().is_err());
        tab.validate().unwrap();
    }

    #[test]
    fn long_digit_run_in_tab_is_an_error() {
        let err = TabStaff::from_ascii(&["--99999999999--", "-", "-", "-", "-", "-"]).unwrap_err();
        assert!(matches!(err, SheetError::InvalidInput(_)), "{err:?}");
        let err = TabStaff::from_ascii(&["--300--", "-", "-", "-", "-", "-"]).unwrap_err();
        assert!(matches!(err, SheetError::InvalidInput(_)), "{err:?}");
    }

    #[test]
    fn tab_staff_from_ascii() {
        let staff = TabStaff::from_ascii(&["--0---", "---1--", "----10", "------", "------", "3-----"]).unwrap();
        assert_eq!(staff.strings()[0], vec![TabMark { column: 2, fret: Some(0) }]);
        assert_eq!(staff.strings()[2], vec![TabMark { column: 4, fret: Some(10) }]);
        assert!(TabStaff::from_ascii(&["--0--"]).is_err());
    }

    #[test]
    fn chordpro_export() {
        let tab = TabCore::from_json(SONG).unwrap();
        let text = tab.to_chordpro_text();
        assert!(text.starts_with("{title: Ripple}"));
        assert!(text.contains("{comment: Verse 1}\nIf my [C]words did glow"));
        assert!(text.contains("| G | C | G | D |"));
    }
}
