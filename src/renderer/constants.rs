//! Shared constants for the sheet renderer (lengths in millimetres).

// ── Units ───────────────────────────────────────────────────────────
pub(super) const PT_TO_MM: f64 = 25.4 / 72.0;
pub(super) const MONO_CHAR_WIDTH: f64 = 0.6; // advance of a monospace cell, in em
pub(super) const SANS_CHAR_WIDTH: f64 = 0.52; // average advance of proportional text, in em
pub(super) const MIN_FONT_SIZE: f64 = 5.0;

// ── Header ──────────────────────────────────────────────────────────
pub(super) const HEADER_HEIGHT: f64 = 22.0;
pub(super) const HEADER_RULE_WIDTH: f64 = 0.4;

// ── Zone spacing ────────────────────────────────────────────────────
pub(super) const ZONE_GAP: f64 = 4.0; // vertical gap between zones
pub(super) const SECTION_GAP: f64 = 4.0; // vertical gap between sections
pub(super) const HEADER_GAP: f64 = 1.5; // below a section header
pub(super) const BLANK_LINE_FACTOR: f64 = 0.5; // spacer height, in lyric lines

// ── Chord diagrams (at scale 1.0) ───────────────────────────────────
pub(super) const DIAGRAM_FRETS: u8 = 5;
pub(super) const STRING_SPACING: f64 = 2.4;
pub(super) const FRET_SPACING: f64 = 3.0;
pub(super) const DIAGRAM_SIDE_PAD: f64 = 2.6;
pub(super) const DIAGRAM_TOP: f64 = 7.0; // name + open/muted markers above the nut
pub(super) const DIAGRAM_BOTTOM: f64 = 1.5;
pub(super) const DIAGRAM_GAP: f64 = 2.0; // horizontal gap between diagrams in the strip
pub(super) const DIAGRAM_ROW_GAP: f64 = 2.0;
pub(super) const DIAGRAM_NAME_SIZE: f64 = 8.0; // pt
pub(super) const DIAGRAM_LABEL_SIZE: f64 = 5.0; // pt, finger numbers and "Nfr"
pub(super) const DOT_RADIUS: f64 = 0.95;
pub(super) const MARKER_RADIUS: f64 = 0.65;
pub(super) const NUT_HEIGHT: f64 = 0.8;
pub(super) const GRID_LINE_WIDTH: f64 = 0.2;

// ── Footer ──────────────────────────────────────────────────────────
pub(super) const PAGE_NUMBER_GAP: f64 = 3.0;
