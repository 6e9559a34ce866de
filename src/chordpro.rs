//! ChordPro-style inline markers and bar progressions.
//!
//! `[G]Hello [C]World` becomes the immutable lyric `Hello World` plus the
//! chord anchors `(0, G)` and `(6, C)`. The lyric text is never rewritten;
//! transposition only swaps the chords attached to it.

use std::fmt;
use std::ops::Range;

use nom::branch::alt;
use nom::bytes::complete::{is_not, take_till};
use nom::character::complete::char;
use nom::combinator::map;
use nom::multi::many0;
use nom::sequence::delimited;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};

use crate::chord::ChordSymbol;
use crate::SheetError;

/// A chord anchored at a character offset of the lyric text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedToken {
    pub offset: usize,
    pub chord: ChordSymbol,
}

impl AnnotatedToken {
    pub const fn new(offset: usize, chord: ChordSymbol) -> Self {
        Self { offset, chord }
    }
}

/// One line of content: lyric text plus chord anchors with strictly
/// increasing offsets, each at most the lyric length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnnotatedLine {
    lyric: String,
    tokens: Vec<AnnotatedToken>,
}

impl AnnotatedLine {
    pub fn new(lyric: impl Into<String>, tokens: Vec<AnnotatedToken>) -> Result<Self, SheetError> {
        let lyric = lyric.into();
        let len = lyric.chars().count();
        let mut previous: Option<usize> = None;
        for token in &tokens {
            if token.offset > len {
                return Err(SheetError::InvalidAnnotation {
                    line: lyric.clone(),
                    reason: format!(
                        "chord {} at offset {} is past the end of the line ({len})",
                        token.chord, token.offset
                    ),
                });
            }
            if previous.is_some_and(|p| token.offset <= p) {
                return Err(SheetError::InvalidAnnotation {
                    line: lyric.clone(),
                    reason: format!(
                        "chord {} at offset {} does not follow the previous chord",
                        token.chord, token.offset
                    ),
                });
            }
            previous = Some(token.offset);
        }
        Ok(Self { lyric, tokens })
    }

    /// A line without chords.
    pub fn plain(lyric: impl Into<String>) -> Self {
        Self {
            lyric: lyric.into(),
            tokens: Vec::new(),
        }
    }

    /// Parse one line of ChordPro text.
    pub fn parse(text: &str) -> Result<Self, SheetError> {
        let (rest, pieces) = many0(piece).parse(text).map_err(|_| SheetError::InvalidAnnotation {
            line: text.to_string(),
            reason: "unreadable chord markers".to_string(),
        })?;
        if !rest.is_empty() {
            let column = text.chars().count() - rest.chars().count();
            return Err(SheetError::InvalidAnnotation {
                line: text.to_string(),
                reason: format!("unclosed chord marker at column {column}"),
            });
        }

        let mut lyric = String::new();
        let mut offset = 0;
        let mut tokens = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Text(t) => {
                    lyric.push_str(t);
                    offset += t.chars().count();
                }
                Piece::Chord(c) => {
                    if c.trim().is_empty() {
                        return Err(SheetError::InvalidAnnotation {
                            line: text.to_string(),
                            reason: "empty chord marker".to_string(),
                        });
                    }
                    tokens.push(AnnotatedToken::new(offset, ChordSymbol::parse(c)?));
                }
            }
        }
        Self::new(lyric, tokens)
    }

    pub fn lyric(&self) -> &str {
        &self.lyric
    }

    pub fn tokens(&self) -> &[AnnotatedToken] {
        &self.tokens
    }

    /// Lyric length in characters.
    pub fn len(&self) -> usize {
        self.lyric.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.lyric.is_empty() && self.tokens.is_empty()
    }

    /// Whitespace-only lyric and no chords: rendered as a spacer.
    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty() && self.lyric.trim().is_empty()
    }

    /// Same lyric with every chord replaced through `f`; offsets are kept.
    pub fn map_chords<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&ChordSymbol) -> ChordSymbol,
    {
        let tokens = self
            .tokens
            .iter()
            .map(|t| AnnotatedToken::new(t.offset, f(&t.chord)))
            .collect();
        Self {
            lyric: self.lyric.clone(),
            tokens,
        }
    }

    /// Back to ChordPro text.
    pub fn to_chordpro(&self) -> String {
        let mut out = String::with_capacity(self.lyric.len() + self.tokens.len() * 4);
        let mut tokens = self.tokens.iter().peekable();
        for (i, c) in self.lyric.chars().enumerate() {
            while let Some(token) = tokens.next_if(|t| t.offset == i) {
                out.push('[');
                out.push_str(&token.chord.to_string());
                out.push(']');
            }
            out.push(c);
        }
        for token in tokens {
            out.push('[');
            out.push_str(&token.chord.to_string());
            out.push(']');
        }
        out
    }
}

impl fmt::Display for AnnotatedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_chordpro())
    }
}

impl TryFrom<String> for AnnotatedLine {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AnnotatedLine> for String {
    fn from(line: AnnotatedLine) -> Self {
        line.to_chordpro()
    }
}

enum Piece<'a> {
    Chord(&'a str),
    Text(&'a str),
}

fn piece(i: &str) -> IResult<&str, Piece<'_>> {
    alt((
        map(
            delimited(char('['), take_till(|c: char| c == ']' || c == '['), char(']')),
            Piece::Chord,
        ),
        map(is_not("["), Piece::Text),
    ))
    .parse(i)
}

/// Split multi-line ChordPro content into annotated lines.
pub fn parse_content(content: &str) -> Result<Vec<AnnotatedLine>, SheetError> {
    content.lines().map(AnnotatedLine::parse).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Bar progressions
// ═══════════════════════════════════════════════════════════════════════

fn is_bar_separator(c: char) -> bool {
    c == '|' || c == ':' || c.is_whitespace()
}

/// Chords in a bar progression such as `|: G | D/F# | Em :|`, with the byte
/// range each occupies. Tokens not starting with A-G (`%`, `x2`, `N.C.`)
/// are not chords; tokens that do must parse.
pub fn progression_chords(text: &str) -> Result<Vec<(Range<usize>, ChordSymbol)>, SheetError> {
    let mut chords = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices().chain(std::iter::once((text.len(), '|'))) {
        match (start, is_bar_separator(c)) {
            (None, false) => start = Some(i),
            (Some(s), true) => {
                let token = &text[s..i];
                if token.starts_with(|c: char| ('A'..='G').contains(&c)) {
                    chords.push((s..i, ChordSymbol::parse(token)?));
                }
                start = None;
            }
            _ => {}
        }
    }
    Ok(chords)
}
