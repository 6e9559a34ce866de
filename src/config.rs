//! Engine configuration.
//!
//! Both tables are built once by the caller and passed by reference into
//! the engine; nothing here is global or mutated during a render.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chord::{Accidental, ChordFamily, ChordSymbol};
use crate::renderer::primitives::Color;
use crate::SheetError;

// ═══════════════════════════════════════════════════════════════════════
// Music theory tables
// ═══════════════════════════════════════════════════════════════════════

/// Respelling preferences and the easy open-shape set.
#[derive(Debug, Clone)]
pub struct TheoryTables {
    /// Accidental preference indexed by the pitch class of the key.
    key_preference: [Accidental; 12],
    /// Open shapes as (root pitch class, family).
    easy_shapes: Vec<(u8, ChordFamily)>,
    /// Highest capo fret considered by capo suggestions.
    pub max_capo: u8,
}

impl TheoryTables {
    pub fn standard() -> Self {
        use Accidental::{Flat, Sharp};
        Self {
            // C Db D Eb E F F# G Ab A Bb B
            key_preference: [
                Sharp, Flat, Sharp, Flat, Sharp, Flat, Sharp, Sharp, Flat, Sharp, Flat, Sharp,
            ],
            easy_shapes: vec![
                (7, ChordFamily::Major),  // G
                (0, ChordFamily::Major),  // C
                (2, ChordFamily::Major),  // D
                (9, ChordFamily::Major),  // A
                (4, ChordFamily::Major),  // E
                (4, ChordFamily::Minor),  // Em
                (9, ChordFamily::Minor),  // Am
                (2, ChordFamily::Minor),  // Dm
            ],
            max_capo: 7,
        }
    }

    pub fn preference_for_key(&self, key_pitch_class: u8) -> Accidental {
        self.key_preference[usize::from(key_pitch_class % 12)]
    }

    /// True for G, C, D, A, E, Em, Am, Dm and their variants (7ths, sus,
    /// add, slash bass).
    pub fn is_easy_shape(&self, chord: &ChordSymbol) -> bool {
        let pc = chord.pitch_class();
        let family = chord.family();
        self.easy_shapes.iter().any(|&(p, f)| p == pc && f == family)
    }
}

impl Default for TheoryTables {
    fn default() -> Self {
        Self::standard()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sheet layout configuration
// ═══════════════════════════════════════════════════════════════════════

/// How the chord strip copes with more diagrams than fit in one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripPolicy {
    /// Full-size diagrams, a new row after `max_diagrams_per_row`.
    Wrap,
    /// Smaller diagrams (`shrink_scale`), as many per row as the width allows.
    Shrink,
}

/// What to draw when a chord's diagram cannot be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramFallback {
    Abort,
    Placeholder,
}

/// One step of the overflow escalation, tried in order with a projected
/// height check after each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutAdjustment {
    /// Subtract `points` from every text size.
    ReduceTextSize { points: f64 },
    /// Multiply inter-line spacing by `factor`.
    CompressSpacing { factor: f64 },
    /// Stop adjusting and spread sections over as many pages as needed.
    BreakPages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub title: f64,
    pub artist: f64,
    pub meta: f64,
    pub section: f64,
    pub chord: f64,
    pub lyric: f64,
    pub tab: f64,
    pub small: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 22.0,
            artist: 12.0,
            meta: 9.0,
            section: 11.0,
            chord: 10.0,
            lyric: 10.0,
            tab: 8.0,
            small: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub title: Color,
    pub artist: Color,
    pub meta: Color,
    pub chord: Color,
    pub section: Color,
    pub lyric: Color,
    pub tab: Color,
    pub bar: Color,
    pub structure: Color,
    pub diagram: Color,
    pub muted: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            title: Color(30, 30, 30),
            artist: Color(80, 80, 80),
            meta: Color(100, 100, 100),
            chord: Color(0, 90, 160),
            section: Color(60, 60, 60),
            lyric: Color(20, 20, 20),
            tab: Color(50, 50, 50),
            bar: Color(40, 40, 40),
            structure: Color(120, 120, 120),
            diagram: Color(0x33, 0x33, 0x33),
            muted: Color(0x66, 0x66, 0x66),
        }
    }
}

/// Page geometry and layout policy. Lengths are millimetres, font sizes points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub fonts: FontSizes,
    pub colors: Palette,
    /// Line height as a multiple of the font size.
    pub line_spacing: f64,
    pub strip_policy: StripPolicy,
    pub max_diagrams_per_row: usize,
    pub diagram_scale: f64,
    pub shrink_scale: f64,
    pub adjustments: Vec<LayoutAdjustment>,
    /// Allow a section taller than a page to continue on the next one.
    pub allow_section_split: bool,
    /// Start section content on a fresh page.
    pub break_before_content: bool,
    pub diagram_fallback: DiagramFallback,
    pub qr_size: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 12.0,
            fonts: FontSizes::default(),
            colors: Palette::default(),
            line_spacing: 1.2,
            strip_policy: StripPolicy::Wrap,
            max_diagrams_per_row: 8,
            diagram_scale: 1.0,
            shrink_scale: 0.7,
            adjustments: vec![
                LayoutAdjustment::ReduceTextSize { points: 1.0 },
                LayoutAdjustment::CompressSpacing { factor: 0.85 },
                LayoutAdjustment::BreakPages,
            ],
            allow_section_split: true,
            break_before_content: false,
            diagram_fallback: DiagramFallback::Abort,
            qr_size: 18.0,
        }
    }
}

impl SheetConfig {
    /// Read a (possibly partial) JSON config; missing fields keep their defaults.
    pub fn read_config<P: AsRef<Path>>(path: P) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader).map_err(|err| {
            SheetError::InvalidInput(format!("could not read config {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SheetError> {
        if self.content_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(SheetError::InvalidInput(format!(
                "margins of {}mm leave no room on a {}x{}mm page",
                self.margin, self.page_width, self.page_height
            )));
        }
        if self.max_diagrams_per_row == 0 {
            return Err(SheetError::InvalidInput(
                "max_diagrams_per_row must be at least 1".to_string(),
            ));
        }
        if self.diagram_scale <= 0.0 || self.shrink_scale <= 0.0 || self.line_spacing <= 0.0 {
            return Err(SheetError::InvalidInput(
                "scales and line spacing must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f64 {
        self.page_height - 2.0 * self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(s: &str) -> ChordSymbol {
        ChordSymbol::parse(s).unwrap()
    }

    #[test]
    fn easy_shapes_include_variants() {
        let tables = TheoryTables::standard();
        for easy in ["G", "C", "D", "A", "E", "Em", "Am", "Dm", "G7", "Cadd9", "Dsus4", "Am7", "G/B"] {
            assert!(tables.is_easy_shape(&chord(easy)), "{easy}");
        }
        for hard in ["F", "Bb", "Bm", "Gm", "F#m", "Cdim"] {
            assert!(!tables.is_easy_shape(&chord(hard)), "{hard}");
        }
    }

    #[test]
    fn key_preferences() {
        let tables = TheoryTables::standard();
        assert_eq!(tables.preference_for_key(6), Accidental::Sharp); // F#
        assert_eq!(tables.preference_for_key(10), Accidental::Flat); // Bb
        assert_eq!(tables.preference_for_key(1), Accidental::Flat); // Db
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SheetConfig =
            serde_json::from_str(r#"{ "strip_policy": "shrink", "fonts": { "lyric": 11 } }"#).unwrap();
        assert_eq!(config.strip_policy, StripPolicy::Shrink);
        assert_eq!(config.fonts.lyric, 11.0);
        assert_eq!(config.fonts.chord, 10.0);
        assert_eq!(config.margin, 12.0);
        assert_eq!(config.adjustments.len(), 3);
    }

    #[test]
    fn adjustments_deserialize_tagged() {
        let config: SheetConfig =
            serde_json::from_str(r#"{ "adjustments": [ { "kind": "break_pages" } ] }"#).unwrap();
        assert_eq!(config.adjustments, vec![LayoutAdjustment::BreakPages]);
    }

    #[test]
    fn rejects_oversized_margins() {
        let config = SheetConfig {
            margin: 150.0,
            ..SheetConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
