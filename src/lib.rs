//! tabsheet: chord sheet layout and rendering for guitar songs.
//!
//! A song (`TabCore`) with ChordPro-style lyrics, chord voicings, tablature
//! and strum patterns is laid out onto fixed-size pages: aligned
//! chord-over-lyric text, fretboard diagrams and monospace tab. Pages come
//! out as trees of positioned primitives, serializable to JSON or SVG.
//!
//! # Example
//! ```no_run
//! use tabsheet::{parse_file, render_sheet, SheetConfig};
//!
//! let tab = parse_file("songs/ripple.json").unwrap();
//! let sheet = render_sheet(&tab, &SheetConfig::default()).unwrap();
//! println!("Title: {}", tab.meta.title);
//! println!("Pages: {}", sheet.pages.len());
//! ```

pub mod chord;
pub mod chordpro;
pub mod config;
pub mod error;
pub mod model;
pub mod renderer;
pub mod transpose;

use std::path::Path;

pub use chord::{Accidental, ChordFamily, ChordSymbol, Letter, NoteName};
pub use chordpro::{AnnotatedLine, AnnotatedToken};
pub use config::{DiagramFallback, LayoutAdjustment, SheetConfig, StripPolicy, TheoryTables};
pub use error::SheetError;
pub use model::*;
pub use renderer::{generate_diagram, pages_to_svg, render_sheet, Page, RenderedSheet, WideLine};
pub use transpose::{suggest_capo, transpose, transpose_song, CapoSuggestion};

/// Read a song from a JSON file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<TabCore, SheetError> {
    TabCore::read_file(path)
}

/// Convert a song to a JSON string.
pub fn tab_to_json(tab: &TabCore) -> Result<String, SheetError> {
    tab.to_json()
}

/// Read a song file and render it straight to SVG, one document per page.
pub fn render_file_to_svg<P: AsRef<Path>>(path: P, config: &SheetConfig) -> Result<Vec<String>, SheetError> {
    let tab = parse_file(path)?;
    renderer::render_sheet_to_svg(&tab, config)
}
