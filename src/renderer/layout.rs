//! Page layout engine.
//!
//! The sheet is planned zone by zone (header, chord strip, structure
//! roadmap, patterns, sections, footer) into measured blocks whose element
//! coordinates are relative to the block top. Fitting then runs the
//! configured adjustment list in order, re-planning after each step, until
//! the projected height fits one page. Whatever still does not fit is spread
//! over as many pages as needed, breaking at section boundaries and only
//! inside a section when that section alone is taller than a page.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::align::align_line;
use super::constants::*;
use super::diagram::{diagram_size, draw_diagram, placeholder_diagram};
use super::primitives::*;
use super::tab::tab_rows;
use crate::config::{DiagramFallback, LayoutAdjustment, SheetConfig, StripPolicy};
use crate::model::{Metadata, SongSection, TabCore, TabStaff};
use crate::SheetError;

// ═══════════════════════════════════════════════════════════════════════
// Output
// ═══════════════════════════════════════════════════════════════════════

/// Which lines of a section ended up on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPlacement {
    /// Index into `TabCore::sections`
    pub section: usize,
    pub label: String,
    /// Content line indices placed on this page
    pub lines: Range<usize>,
    /// True when the section started on an earlier page
    pub continued: bool,
}

/// One fixed-size page of positioned primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub width: f64,
    pub height: f64,
    pub elements: Vec<Primitive>,
    pub sections: Vec<SectionPlacement>,
}

/// A content line wider than the content area. It is still drawn, running
/// past the right margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideLine {
    pub section: String,
    pub line: usize,
    /// Printed width in character cells
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSheet {
    pub pages: Vec<Page>,
    /// Adjustments that were needed, in the order they were applied
    pub adjustments_applied: Vec<LayoutAdjustment>,
    /// Lines that overflow the right margin at the final text size
    pub wide_lines: Vec<WideLine>,
}

impl RenderedSheet {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Text metrics
// ═══════════════════════════════════════════════════════════════════════

/// The state the adjustment list acts on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TextMetrics {
    size_delta: f64,
    spacing: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            size_delta: 0.0,
            spacing: 1.0,
        }
    }
}

struct Style<'a> {
    config: &'a SheetConfig,
    metrics: TextMetrics,
}

impl Style<'_> {
    fn size(&self, base: f64) -> f64 {
        (base - self.metrics.size_delta).max(MIN_FONT_SIZE)
    }

    fn line_height(&self, base: f64) -> f64 {
        self.size(base) * PT_TO_MM * self.config.line_spacing * self.metrics.spacing
    }

    /// Baseline of a line of `base` points whose box starts at `top`.
    fn baseline(&self, top: f64, base: f64) -> f64 {
        top + self.line_height(base) * 0.78
    }

    /// Width of one monospace cell of lyric text.
    fn cell_width(&self) -> f64 {
        self.size(self.config.fonts.lyric) * PT_TO_MM * MONO_CHAR_WIDTH
    }

    /// Characters of proportional text that fit in `width` millimetres.
    fn chars_in(&self, width: f64, base: f64) -> usize {
        ((width / (self.size(base) * PT_TO_MM * SANS_CHAR_WIDTH)).floor() as usize).max(1)
    }

    fn text(&self, x: f64, y: f64, content: impl Into<String>, base: f64, color: Color) -> TextRun {
        TextRun {
            x,
            y,
            text: content.into(),
            family: FontFamily::Sans,
            size: self.size(base),
            weight: FontWeight::Normal,
            italic: false,
            color,
            anchor: Anchor::Start,
        }
    }

    fn left(&self) -> f64 {
        self.config.margin
    }

    fn right(&self) -> f64 {
        self.config.page_width - self.config.margin
    }

    fn center(&self) -> f64 {
        self.config.page_width / 2.0
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Plan
// ═══════════════════════════════════════════════════════════════════════

/// Page zones, entered strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Header,
    ChordStrip,
    StructureRoadmap,
    PatternBlock,
    SectionContent,
    Footer,
}

/// Measured content; element `y` values are relative to the block top.
#[derive(Debug, Default)]
struct Block {
    height: f64,
    elements: Vec<Primitive>,
}

struct Row {
    block: Block,
    /// Content line index, for lyric and blank rows
    line: Option<usize>,
}

struct SectionPlan {
    index: usize,
    label: String,
    header: Block,
    continued_header: Block,
    rows: Vec<Row>,
    gap: f64,
    wide_lines: Vec<WideLine>,
}

impl SectionPlan {
    fn height(&self) -> f64 {
        self.header.height + self.rows.iter().map(|r| r.block.height).sum::<f64>()
    }
}

struct Plan {
    front: Vec<(Zone, Block)>,
    sections: Vec<SectionPlan>,
    footer: Option<Block>,
}

impl Plan {
    /// Height if everything went on a single page.
    fn total_height(&self) -> f64 {
        let front: f64 = self.front.iter().map(|(_, b)| b.height + ZONE_GAP).sum();
        let sections: f64 = self.sections.iter().map(|s| s.height() + s.gap).sum();
        front + sections + self.footer.as_ref().map_or(0.0, |f| f.height)
    }
}

fn plan_sheet(tab: &TabCore, style: &Style) -> Result<Plan, SheetError> {
    let mut front = vec![(Zone::Header, header_block(&tab.meta, style))];
    if let Some(strip) = chord_strip_block(tab, style)? {
        front.push((Zone::ChordStrip, strip));
    }
    if !tab.structure.is_empty() {
        front.push((Zone::StructureRoadmap, roadmap_block(&tab.structure, style)));
    }
    if !tab.patterns.is_empty() {
        front.push((Zone::PatternBlock, pattern_block(tab, style)));
    }
    let sections = tab
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| plan_section(index, section, style))
        .collect();
    Ok(Plan {
        front,
        sections,
        footer: footer_block(tab, style),
    })
}

// ── Header ──────────────────────────────────────────────────────────

fn difficulty_label(difficulty: &str) -> String {
    match difficulty {
        "Beginner" => "* Easy".to_string(),
        "Intermediate" => "** Intermediate".to_string(),
        "Advanced" => "*** Advanced".to_string(),
        other => other.to_string(),
    }
}

/// `Key: G  |  Capo: Fret 2  |  Tempo: 96 BPM ...`, omitting absent and
/// default parts.
pub fn meta_line(meta: &Metadata) -> String {
    let mut parts = Vec::new();
    if let Some(key) = &meta.key {
        parts.push(format!("Key: {key}"));
    }
    if let Some(capo) = meta.capo.filter(|&c| c > 0) {
        parts.push(format!("Capo: Fret {capo}"));
    }
    if let Some(tempo) = meta.tempo {
        parts.push(format!("Tempo: {tempo} BPM"));
    }
    if let Some(time) = meta.time_signature.as_deref().filter(|&t| t != "4/4") {
        parts.push(format!("Time: {time}"));
    }
    if let Some(tuning) = meta.tuning.as_deref().filter(|&t| t != "Standard") {
        parts.push(format!("Tuning: {tuning}"));
    }
    if let Some(difficulty) = &meta.difficulty {
        parts.push(difficulty_label(difficulty));
    }
    parts.join("  |  ")
}

fn header_block(meta: &Metadata, style: &Style) -> Block {
    let fonts = &style.config.fonts;
    let colors = &style.config.colors;
    let cx = style.center();
    let mut elements = Vec::new();

    let title_y = style.size(fonts.title) * PT_TO_MM;
    elements.push(Primitive::Text(TextRun {
        weight: FontWeight::Bold,
        anchor: Anchor::Middle,
        ..style.text(cx, title_y, meta.title.clone(), fonts.title, colors.title)
    }));

    let attribution = if meta.writers.is_empty() {
        meta.artist.clone()
    } else {
        format!("Words & Music by {}", meta.writers.join(" & "))
    };
    let artist_y = title_y + style.size(fonts.artist) * PT_TO_MM + 2.0;
    elements.push(Primitive::Text(TextRun {
        italic: true,
        anchor: Anchor::Middle,
        ..style.text(cx, artist_y, attribution, fonts.artist, colors.artist)
    }));

    let meta_text = meta_line(meta);
    if !meta_text.is_empty() {
        let meta_y = artist_y + style.size(fonts.meta) * PT_TO_MM + 2.0;
        elements.push(Primitive::Text(TextRun {
            anchor: Anchor::Middle,
            ..style.text(cx, meta_y, meta_text, fonts.meta, colors.meta)
        }));
    }

    elements.push(Primitive::Line(Line {
        x1: style.left(),
        y1: HEADER_HEIGHT - 1.0,
        x2: style.right(),
        y2: HEADER_HEIGHT - 1.0,
        width: HEADER_RULE_WIDTH,
        color: colors.structure,
    }));

    Block {
        height: HEADER_HEIGHT,
        elements,
    }
}

// ── Chord strip ─────────────────────────────────────────────────────

fn chord_strip_block(tab: &TabCore, style: &Style) -> Result<Option<Block>, SheetError> {
    let config = style.config;
    let chords = tab.used_chords()?;
    if chords.is_empty() {
        return Ok(None);
    }

    let count = chords.len();
    let (base_width, base_height) = diagram_size();
    let fit = |scale: f64| {
        (((config.content_width() + DIAGRAM_GAP) / (base_width * scale + DIAGRAM_GAP)).floor() as usize).max(1)
    };
    let (scale, per_row) = match config.strip_policy {
        StripPolicy::Wrap => (
            config.diagram_scale,
            config.max_diagrams_per_row.min(fit(config.diagram_scale)),
        ),
        StripPolicy::Shrink => {
            let scale = if count > config.max_diagrams_per_row {
                config.shrink_scale
            } else {
                config.diagram_scale
            };
            (scale, fit(scale))
        }
    };
    let rows = count.div_ceil(per_row);
    let (width, height) = (base_width * scale, base_height * scale);
    log::debug!("chord strip: {count} diagrams in {rows} row(s) of up to {per_row} at scale {scale}");

    let mut elements = Vec::with_capacity(count);
    for (i, chord) in chords.iter().enumerate() {
        let (row, col) = (i / per_row, i % per_row);
        let in_row = per_row.min(count - row * per_row);
        let row_width = in_row as f64 * width + (in_row - 1) as f64 * DIAGRAM_GAP;
        let x = style.left() + (config.content_width() - row_width) / 2.0 + col as f64 * (width + DIAGRAM_GAP);
        let y = row as f64 * (height + DIAGRAM_ROW_GAP);

        let drawn = match tab.definition_for(chord) {
            Some(definition) => draw_diagram(definition, scale, &config.colors),
            None => Err(SheetError::MissingChordDefinition {
                chord: chord.to_string(),
                section: "chord strip".to_string(),
                line: 0,
            }),
        };
        let group = match (drawn, config.diagram_fallback) {
            (Ok(group), _) => group,
            (Err(err), DiagramFallback::Placeholder) => {
                log::warn!("drawing a placeholder for {chord}: {err}");
                placeholder_diagram(chord, scale, &config.colors)
            }
            (Err(err), DiagramFallback::Abort) => return Err(err),
        };
        elements.push(Primitive::Diagram(group).translated(x, y));
    }

    Ok(Some(Block {
        height: rows as f64 * height + (rows - 1) as f64 * DIAGRAM_ROW_GAP,
        elements,
    }))
}

// ── Structure roadmap ───────────────────────────────────────────────

/// Short roadmap name for a structure entry: `verse2` -> `V2`,
/// `bridge` -> `Br`. Unknown entries are kept as written.
pub fn abbreviate_section(id: &str) -> String {
    let lower = id.to_lowercase();
    let base: String = lower
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let number = &lower[lower.trim_end_matches(|c: char| c.is_ascii_digit()).len()..];
    let short = match base.as_str() {
        "intro" => "Intro",
        "verse" => "V",
        "chorus" => "C",
        "bridge" => "Br",
        "prechorus" => "Pre",
        "interlude" => "Int",
        "solo" => "Solo",
        "outro" => "Outro",
        _ => return id.to_string(),
    };
    format!("{short}{number}")
}

/// Greedy word wrap to `max_chars` characters per line.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if !current.is_empty() && needed > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn roadmap_block(structure: &[String], style: &Style) -> Block {
    let fonts = &style.config.fonts;
    let roadmap = structure
        .iter()
        .map(|s| abbreviate_section(s))
        .collect::<Vec<_>>()
        .join(" -> ");
    let lines = wrap_text(
        &format!("Structure: {roadmap}"),
        style.chars_in(style.config.content_width(), fonts.meta),
    );
    let line_height = style.line_height(fonts.meta);
    let elements = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            Primitive::Text(TextRun {
                anchor: Anchor::Middle,
                ..style.text(
                    style.center(),
                    style.baseline(i as f64 * line_height, fonts.meta),
                    text,
                    fonts.meta,
                    style.config.colors.structure,
                )
            })
        })
        .collect::<Vec<_>>();
    Block {
        height: elements.len() as f64 * line_height,
        elements,
    }
}

// ── Patterns ────────────────────────────────────────────────────────

fn staff_elements(staff: &TabStaff, top: f64, style: &Style) -> (Vec<Primitive>, f64) {
    let fonts = &style.config.fonts;
    let line_height = style.line_height(fonts.tab);
    let elements: Vec<Primitive> = tab_rows(staff)
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            Primitive::Text(TextRun {
                family: FontFamily::Mono,
                ..style.text(
                    style.left(),
                    style.baseline(top + i as f64 * line_height, fonts.tab),
                    row,
                    fonts.tab,
                    style.config.colors.tab,
                )
            })
        })
        .collect();
    let height = elements.len() as f64 * line_height + 1.0;
    (elements, height)
}

fn pattern_block(tab: &TabCore, style: &Style) -> Block {
    let fonts = &style.config.fonts;
    let colors = &style.config.colors;
    let mut block = Block::default();
    for pattern in &tab.patterns {
        let top = block.height;
        let heading = format!("{}:", pattern.name);
        let heading_width = (heading.chars().count() + 2) as f64 * style.size(fonts.small) * PT_TO_MM * SANS_CHAR_WIDTH;
        block.elements.push(Primitive::Text(TextRun {
            weight: FontWeight::Bold,
            ..style.text(style.left(), style.baseline(top, fonts.small), heading, fonts.small, colors.meta)
        }));

        let mut detail = pattern.notation.clone().unwrap_or_default();
        if pattern.beats_per_bar != 4 {
            detail = format!("{detail}  ({} beats per bar)", pattern.beats_per_bar);
        }
        if !detail.trim().is_empty() {
            block.elements.push(Primitive::Text(TextRun {
                family: FontFamily::Mono,
                ..style.text(
                    style.left() + heading_width,
                    style.baseline(top, fonts.small),
                    detail.trim().to_string(),
                    fonts.small,
                    colors.meta,
                )
            }));
        }
        block.height += style.line_height(fonts.small);

        if !pattern.tab.is_empty() {
            let (elements, height) = staff_elements(&pattern.tab, block.height, style);
            block.elements.extend(elements);
            block.height += height;
        }
    }
    block
}

// ── Sections ────────────────────────────────────────────────────────

fn section_header(label: &str, pattern: Option<&str>, style: &Style) -> Block {
    let fonts = &style.config.fonts;
    let colors = &style.config.colors;
    let mut elements = vec![Primitive::Text(TextRun {
        weight: FontWeight::Bold,
        ..style.text(style.left(), style.baseline(0.0, fonts.section), label, fonts.section, colors.section)
    })];
    if let Some(pattern) = pattern {
        elements.push(Primitive::Text(TextRun {
            italic: true,
            anchor: Anchor::End,
            ..style.text(
                style.right(),
                style.baseline(0.0, fonts.section),
                format!("Pattern: {pattern}"),
                fonts.small,
                colors.meta,
            )
        }));
    }
    Block {
        height: style.line_height(fonts.section) + HEADER_GAP,
        elements,
    }
}

fn plan_section(index: usize, section: &SongSection, style: &Style) -> SectionPlan {
    let config = style.config;
    let fonts = &config.fonts;
    let colors = &config.colors;

    let mut label = section.display_label().to_string();
    if let Some(repeat) = section.repeat.filter(|&r| r > 1) {
        label.push_str(&format!(" (x{repeat})"));
    }
    let pattern = section.pattern_ref.as_deref();
    let mut rows = Vec::new();
    let mut wide_lines = Vec::new();

    if let Some(bars) = &section.bar_progression {
        let text = TextRun {
            family: FontFamily::Mono,
            weight: FontWeight::Bold,
            ..style.text(style.left(), style.baseline(0.0, fonts.chord), bars.clone(), fonts.chord, colors.bar)
        };
        rows.push(Row {
            block: Block {
                height: style.line_height(fonts.chord) + 1.0,
                elements: vec![Primitive::Text(text)],
            },
            line: None,
        });
    }

    for staff in &section.tab {
        let (elements, height) = staff_elements(staff, 0.0, style);
        rows.push(Row {
            block: Block { height, elements },
            line: None,
        });
    }

    let cell = style.cell_width();
    for (i, line) in section.lines.iter().enumerate() {
        if line.is_blank() {
            rows.push(Row {
                block: Block {
                    height: style.line_height(fonts.lyric) * BLANK_LINE_FACTOR,
                    elements: Vec::new(),
                },
                line: Some(i),
            });
            continue;
        }

        let aligned = align_line(line);
        if aligned.width as f64 * cell > config.content_width() {
            log::warn!(
                "line {i} of '{}' is {} columns wide and runs past the right margin",
                section.display_label(),
                aligned.width
            );
            wide_lines.push(WideLine {
                section: section.display_label().to_string(),
                line: i,
                columns: aligned.width,
            });
        }

        let mut elements = Vec::with_capacity(aligned.placements.len() + 1);
        let mut top = 0.0;
        if aligned.has_chords() {
            for (column, chord) in &aligned.placements {
                elements.push(Primitive::Text(TextRun {
                    family: FontFamily::Mono,
                    weight: FontWeight::Bold,
                    ..style.text(
                        style.left() + *column as f64 * cell,
                        style.baseline(0.0, fonts.chord),
                        chord.clone(),
                        fonts.chord,
                        colors.chord,
                    )
                }));
            }
            top = style.line_height(fonts.chord);
        }
        let lyric = aligned.lyric_row.trim_end();
        if !lyric.is_empty() {
            elements.push(Primitive::Text(TextRun {
                family: FontFamily::Mono,
                ..style.text(
                    style.left(),
                    style.baseline(top, fonts.lyric),
                    lyric,
                    fonts.lyric,
                    colors.lyric,
                )
            }));
        }
        rows.push(Row {
            block: Block {
                height: top + style.line_height(fonts.lyric),
                elements,
            },
            line: Some(i),
        });
    }

    SectionPlan {
        index,
        header: section_header(&label, pattern, style),
        continued_header: section_header(&format!("{label} (cont.)"), pattern, style),
        label,
        rows,
        gap: SECTION_GAP * style.metrics.spacing,
        wide_lines,
    }
}

// ── Footer ──────────────────────────────────────────────────────────

fn footer_block(tab: &TabCore, style: &Style) -> Option<Block> {
    let config = style.config;
    let fonts = &config.fonts;
    let url = tab.audio_url.as_ref().or(tab.source_url.as_ref());
    if tab.notes.is_none() && url.is_none() {
        return None;
    }

    let mut elements = Vec::new();
    let mut qr_height: f64 = 0.0;
    let mut text_width = config.content_width();
    if let Some(url) = url {
        elements.push(Primitive::Image(ImageSlot {
            x: style.right() - config.qr_size,
            y: 0.0,
            width: config.qr_size,
            height: config.qr_size,
            key: url.clone(),
        }));
        qr_height = config.qr_size;
        text_width -= config.qr_size + 3.0;
    }

    let mut notes_height: f64 = 0.0;
    if let Some(notes) = &tab.notes {
        let line_height = style.line_height(fonts.small);
        for paragraph in format!("Notes: {notes}").lines() {
            for text in wrap_text(paragraph, style.chars_in(text_width, fonts.small)) {
                elements.push(Primitive::Text(TextRun {
                    italic: true,
                    ..style.text(
                        style.left(),
                        style.baseline(notes_height, fonts.small),
                        text,
                        fonts.small,
                        config.colors.meta,
                    )
                }));
                notes_height += line_height;
            }
        }
    }

    Some(Block {
        height: qr_height.max(notes_height),
        elements,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Pagination
// ═══════════════════════════════════════════════════════════════════════

const EPSILON: f64 = 1e-6;

struct Paginator<'a> {
    config: &'a SheetConfig,
    pages: Vec<Page>,
    y: f64,
    /// Nothing placed on the current page yet
    fresh: bool,
}

impl<'a> Paginator<'a> {
    fn new(config: &'a SheetConfig) -> Self {
        let mut paginator = Self {
            config,
            pages: Vec::new(),
            y: 0.0,
            fresh: true,
        };
        paginator.new_page();
        paginator
    }

    fn new_page(&mut self) {
        self.pages.push(Page {
            number: self.pages.len() + 1,
            width: self.config.page_width,
            height: self.config.page_height,
            elements: Vec::new(),
            sections: Vec::new(),
        });
        self.y = self.config.margin;
        self.fresh = true;
        log::debug!("opened page {}", self.pages.len());
    }

    fn remaining(&self) -> f64 {
        self.config.page_height - self.config.margin - self.y
    }

    fn fits(&self, height: f64) -> bool {
        height <= self.remaining() + EPSILON
    }

    /// Start a new page unless the current one is still empty.
    fn break_page(&mut self) {
        if !self.fresh {
            self.new_page();
        }
    }

    fn current(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn place(&mut self, block: &Block) {
        let dy = self.y;
        let moved: Vec<Primitive> = block.elements.iter().cloned().map(|p| p.translated(0.0, dy)).collect();
        self.current().elements.extend(moved);
        self.y += block.height;
        self.fresh = false;
    }

    fn gap(&mut self, height: f64) {
        self.y += height;
    }

    fn place_front(&mut self, zone: Zone, block: &Block) {
        if !self.fits(block.height) {
            self.break_page();
        }
        log::debug!("{zone:?} at {:.1}mm on page {}", self.y, self.pages.len());
        self.place(block);
        self.gap(ZONE_GAP);
    }

    fn place_section(&mut self, section: &SectionPlan) -> Result<(), SheetError> {
        let height = section.height();
        let usable = self.config.usable_height();

        if height > usable + EPSILON {
            if !self.config.allow_section_split {
                return Err(SheetError::OverflowUnresolved {
                    section: section.label.clone(),
                });
            }
            let first_row = section.rows.first().map_or(0.0, |r| r.block.height);
            if !self.fits(section.header.height + first_row) {
                self.break_page();
            }
            log::debug!("section '{}' ({height:.1}mm) spans pages", section.label);
            self.place_rows(section, true);
        } else {
            if !self.fits(height) {
                log::debug!("page break before section '{}'", section.label);
                self.break_page();
            }
            self.place_rows(section, false);
        }
        self.gap(section.gap);
        Ok(())
    }

    fn place_rows(&mut self, section: &SectionPlan, may_split: bool) {
        self.place(&section.header);
        let mut placement = SectionPlacement {
            section: section.index,
            label: section.label.clone(),
            lines: 0..0,
            continued: false,
        };
        let mut rows_on_page = 0;

        for row in &section.rows {
            if may_split && rows_on_page > 0 && !self.fits(row.block.height) {
                self.current().sections.push(placement.clone());
                self.new_page();
                self.place(&section.continued_header);
                placement.lines = placement.lines.end..placement.lines.end;
                placement.continued = true;
                rows_on_page = 0;
            }
            if !self.fits(row.block.height) {
                log::warn!("a row of '{}' is taller than the space left on the page", section.label);
            }
            self.place(&row.block);
            rows_on_page += 1;
            if let Some(line) = row.line {
                if placement.lines.is_empty() {
                    placement.lines = line..line + 1;
                } else {
                    placement.lines.end = line + 1;
                }
            }
        }
        self.current().sections.push(placement);
    }

    fn place_footer(&mut self, footer: &Block) {
        if !self.fits(footer.height) {
            self.break_page();
        }
        self.place(footer);
    }

    fn finish(mut self, style: &Style) -> Vec<Page> {
        let total = self.pages.len();
        let fonts = &self.config.fonts;
        let y = self.config.page_height - self.config.margin + PAGE_NUMBER_GAP + style.size(fonts.small) * PT_TO_MM;
        for page in &mut self.pages {
            page.elements.push(Primitive::Text(TextRun {
                anchor: Anchor::Middle,
                ..style.text(
                    style.center(),
                    y,
                    format!("{} / {total}", page.number),
                    fonts.small,
                    self.config.colors.muted,
                )
            }));
        }
        self.pages
    }
}

fn paginate(plan: &Plan, style: &Style) -> Result<Vec<Page>, SheetError> {
    let mut paginator = Paginator::new(style.config);
    for (zone, block) in &plan.front {
        paginator.place_front(*zone, block);
    }
    if style.config.break_before_content && !plan.sections.is_empty() {
        paginator.break_page();
    }
    log::debug!("{:?} from page {}", Zone::SectionContent, paginator.pages.len());
    for section in &plan.sections {
        paginator.place_section(section)?;
    }
    if let Some(footer) = &plan.footer {
        log::debug!("{:?} on page {}", Zone::Footer, paginator.pages.len());
        paginator.place_footer(footer);
    }
    Ok(paginator.finish(style))
}

// ═══════════════════════════════════════════════════════════════════════
// Fitting
// ═══════════════════════════════════════════════════════════════════════

/// Lay out a validated song. Adjustments run in order, each followed by a
/// fresh projection; pagination takes over once they are used up or a
/// `BreakPages` step is reached.
pub(super) fn layout_sheet(tab: &TabCore, config: &SheetConfig) -> Result<RenderedSheet, SheetError> {
    let usable = config.usable_height();
    let mut metrics = TextMetrics::default();
    let mut applied = Vec::new();
    let mut plan = plan_sheet(tab, &Style { config, metrics })?;

    for adjustment in &config.adjustments {
        let projected = plan.total_height();
        if projected <= usable + EPSILON {
            break;
        }
        log::debug!("projected {projected:.1}mm exceeds {usable:.1}mm, applying {adjustment:?}");
        applied.push(*adjustment);
        match *adjustment {
            LayoutAdjustment::ReduceTextSize { points } => metrics.size_delta += points,
            LayoutAdjustment::CompressSpacing { factor } => metrics.spacing *= factor,
            LayoutAdjustment::BreakPages => break,
        }
        plan = plan_sheet(tab, &Style { config, metrics })?;
    }

    let style = Style { config, metrics };
    let pages = paginate(&plan, &style)?;
    log::debug!("'{}' laid out on {} page(s)", tab.meta.title, pages.len());
    let wide_lines = plan.sections.iter().flat_map(|s| s.wide_lines.iter().cloned()).collect();
    Ok(RenderedSheet {
        pages,
        adjustments_applied: applied,
        wide_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordSymbol;
    use crate::chordpro::AnnotatedLine;
    use crate::model::{ChordDefinition, SectionType};
    use pretty_assertions::assert_eq;

    fn song(sections: Vec<SongSection>) -> TabCore {
        let mut tab = TabCore::new(Metadata {
            title: "Layout".into(),
            artist: "Tester".into(),
            ..Metadata::default()
        });
        tab.chords.insert(
            "G".into(),
            ChordDefinition::new(ChordSymbol::parse("G").unwrap(), vec![3, 2, 0, 0, 0, 3], vec![]),
        );
        tab.sections = sections;
        tab
    }

    fn verse(lines: usize) -> SongSection {
        let lines = (0..lines)
            .map(|i| AnnotatedLine::parse(&format!("[G]line {i}")).unwrap())
            .collect();
        SongSection::new(SectionType::Verse, lines)
    }

    #[test]
    fn meta_line_skips_defaults() {
        let meta = Metadata {
            key: Some("G".into()),
            capo: Some(2),
            tempo: Some(96),
            time_signature: Some("3/4".into()),
            tuning: Some("Drop D".into()),
            difficulty: Some("Intermediate".into()),
            ..Metadata::default()
        };
        assert_eq!(
            meta_line(&meta),
            "Key: G  |  Capo: Fret 2  |  Tempo: 96 BPM  |  Time: 3/4  |  Tuning: Drop D  |  ** Intermediate"
        );
        let plain = Metadata {
            capo: Some(0),
            time_signature: Some("4/4".into()),
            tuning: Some("Standard".into()),
            ..Metadata::default()
        };
        assert_eq!(meta_line(&plain), "");
    }

    #[test]
    fn roadmap_abbreviations() {
        let names: Vec<String> = ["intro", "Verse1", "chorus", "pre-chorus", "bridge", "verse12", "coda"]
            .iter()
            .map(|s| abbreviate_section(s))
            .collect();
        assert_eq!(names, vec!["Intro", "V1", "C", "Pre", "Br", "V12", "coda"]);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap_text("one two three four", 9), vec!["one two", "three", "four"]);
        assert_eq!(wrap_text("", 9), Vec::<String>::new());
    }

    #[test]
    fn short_song_fits_one_page() {
        let sheet = layout_sheet(&song(vec![verse(4)]), &SheetConfig::default()).unwrap();
        assert_eq!(sheet.page_count(), 1);
        assert!(sheet.adjustments_applied.is_empty());
        assert_eq!(sheet.pages[0].sections[0].lines, 0..4);
    }

    #[test]
    fn adjustments_run_in_order_before_breaking() {
        let config = SheetConfig::default();
        let sheet = layout_sheet(&song(vec![verse(30), verse(30), verse(30)]), &config).unwrap();
        assert!(sheet.page_count() > 1);
        assert_eq!(sheet.adjustments_applied, config.adjustments);
    }

    #[test]
    fn oversized_section_splits_between_lines() {
        let sheet = layout_sheet(&song(vec![verse(120)]), &SheetConfig::default()).unwrap();
        assert!(sheet.page_count() > 1);
        let placements: Vec<&SectionPlacement> = sheet.pages.iter().flat_map(|p| &p.sections).collect();
        assert!(!placements[0].continued);
        assert!(placements[1..].iter().all(|p| p.continued));
        let total: usize = placements.iter().map(|p| p.lines.len()).sum();
        assert_eq!(total, 120);
        for pair in placements.windows(2) {
            assert_eq!(pair[0].lines.end, pair[1].lines.start);
        }
    }

    #[test]
    fn oversized_section_without_split_fails() {
        let config = SheetConfig {
            allow_section_split: false,
            ..SheetConfig::default()
        };
        assert_eq!(
            layout_sheet(&song(vec![verse(120)]), &config).unwrap_err(),
            SheetError::OverflowUnresolved {
                section: "Verse".into()
            }
        );
    }

    #[test]
    fn content_can_start_on_its_own_page() {
        let config = SheetConfig {
            break_before_content: true,
            ..SheetConfig::default()
        };
        let sheet = layout_sheet(&song(vec![verse(2)]), &config).unwrap();
        assert_eq!(sheet.page_count(), 2);
        assert!(sheet.pages[0].sections.is_empty());
        assert_eq!(sheet.pages[1].sections.len(), 1);
    }

    #[test]
    fn every_page_is_numbered() {
        let sheet = layout_sheet(&song(vec![verse(120)]), &SheetConfig::default()).unwrap();
        let total = sheet.page_count();
        for page in &sheet.pages {
            let label = format!("{} / {total}", page.number);
            assert!(page.elements.iter().filter_map(Primitive::as_text).any(|t| t.text == label));
        }
    }

    #[test]
    fn wide_lines_are_reported() {
        let long = format!("[G]{}", "la ".repeat(40));
        let mut section = verse(2);
        section.lines.push(AnnotatedLine::parse(&long).unwrap());
        let sheet = layout_sheet(&song(vec![section]), &SheetConfig::default()).unwrap();
        assert_eq!(
            sheet.wide_lines,
            vec![WideLine {
                section: "Verse".into(),
                line: 2,
                columns: 120,
            }]
        );

        let fits = layout_sheet(&song(vec![verse(2)]), &SheetConfig::default()).unwrap();
        assert!(fits.wide_lines.is_empty());
    }

    #[test]
    fn footer_reserves_qr_slot() {
        let mut tab = song(vec![verse(2)]);
        tab.notes = Some("Let ring on the last chord.".into());
        tab.source_url = Some("https://example.com/tab".into());
        let sheet = layout_sheet(&tab, &SheetConfig::default()).unwrap();
        let image = sheet.pages[0]
            .elements
            .iter()
            .find_map(|p| match p {
                Primitive::Image(i) => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!(image.key, "https://example.com/tab");
        assert_eq!(image.width, 18.0);
    }
}
