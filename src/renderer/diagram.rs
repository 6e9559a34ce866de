//! Chord diagram generator.
//!
//! Maps a `ChordDefinition` onto a fixed grid of 5 fret rows by 6 strings.
//! Every coordinate is `origin + index * cell`; there are no layout
//! decisions here beyond that mapping.

use super::constants::*;
use super::primitives::{Anchor, Circle, Color, FontFamily, FontWeight, Group, Line, Primitive, RoundedRect, TextRun};
use crate::chord::ChordSymbol;
use crate::config::Palette;
use crate::model::{ChordDefinition, STRING_COUNT};
use crate::SheetError;

// ── Grid geometry (unscaled) ────────────────────────────────────────

fn grid_width() -> f64 {
    (STRING_COUNT - 1) as f64 * STRING_SPACING
}

fn grid_height() -> f64 {
    f64::from(DIAGRAM_FRETS) * FRET_SPACING
}

/// Unscaled diagram footprint in millimetres.
pub(super) fn diagram_size() -> (f64, f64) {
    (
        grid_width() + 2.0 * DIAGRAM_SIDE_PAD,
        DIAGRAM_TOP + grid_height() + DIAGRAM_BOTTOM,
    )
}

fn string_x(string: usize) -> f64 {
    DIAGRAM_SIDE_PAD + string as f64 * STRING_SPACING
}

fn fret_y(row: u8) -> f64 {
    DIAGRAM_TOP + f64::from(row) * FRET_SPACING
}

/// Centre of a fret cell, `row` counted from 1.
fn cell_center_y(row: u8) -> f64 {
    fret_y(row) - FRET_SPACING / 2.0
}

fn text(x: f64, y: f64, content: String, size: f64, weight: FontWeight, color: Color, anchor: Anchor) -> Primitive {
    Primitive::Text(TextRun {
        x,
        y,
        text: content,
        family: FontFamily::Sans,
        size,
        weight,
        italic: false,
        color,
        anchor,
    })
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Color) -> Primitive {
    Primitive::Line(Line {
        x1,
        y1,
        x2,
        y2,
        width,
        color,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Diagram for `definition` in the default palette.
///
/// Fails with `InvalidFretData` when the definition is malformed or a
/// fretted string falls outside the window `base_fret..=base_fret + 4`.
pub fn generate_diagram(definition: &ChordDefinition, scale: f64) -> Result<Group, SheetError> {
    draw_diagram(definition, scale, &Palette::default())
}

pub(super) fn draw_diagram(definition: &ChordDefinition, scale: f64, palette: &Palette) -> Result<Group, SheetError> {
    definition.validate()?;
    let base = definition.base_fret;
    let last = u16::from(base) + u16::from(DIAGRAM_FRETS) - 1;
    for (string, &fret) in definition.frets.iter().enumerate() {
        if fret > 0 && !(u16::from(base)..=last).contains(&(fret as u16)) {
            return Err(SheetError::InvalidFretData {
                chord: definition.symbol.to_string(),
                reason: format!("fret {fret} on string {} is outside the window {base}-{last}", string + 1),
            });
        }
    }

    let ink = palette.diagram;
    let (width, height) = diagram_size();
    let mut elements = Vec::new();

    elements.push(text(
        width / 2.0,
        DIAGRAM_NAME_SIZE * PT_TO_MM,
        definition.symbol.to_string(),
        DIAGRAM_NAME_SIZE,
        FontWeight::Bold,
        ink,
        Anchor::Middle,
    ));

    // ── Grid ──
    if base == 1 {
        elements.push(Primitive::RoundedRect(RoundedRect {
            x: string_x(0) - GRID_LINE_WIDTH,
            y: DIAGRAM_TOP - NUT_HEIGHT,
            width: grid_width() + 2.0 * GRID_LINE_WIDTH,
            height: NUT_HEIGHT,
            radius: 0.0,
            fill: Some(ink),
            stroke: None,
        }));
    } else {
        elements.push(text(
            string_x(0) - 0.6,
            cell_center_y(1) + DIAGRAM_LABEL_SIZE * PT_TO_MM * 0.35,
            format!("{base}fr"),
            DIAGRAM_LABEL_SIZE,
            FontWeight::Normal,
            ink,
            Anchor::End,
        ));
    }
    for row in 0..=DIAGRAM_FRETS {
        let y = fret_y(row);
        elements.push(line(string_x(0), y, string_x(STRING_COUNT - 1), y, GRID_LINE_WIDTH, ink));
    }
    for string in 0..STRING_COUNT {
        let x = string_x(string);
        elements.push(line(x, fret_y(0), x, fret_y(DIAGRAM_FRETS), GRID_LINE_WIDTH, ink));
    }

    // ── Open and muted markers ──
    let marker_y = DIAGRAM_TOP - NUT_HEIGHT - MARKER_RADIUS - 0.6;
    for (string, &fret) in definition.frets.iter().enumerate() {
        let x = string_x(string);
        match fret {
            0 => elements.push(Primitive::Circle(Circle {
                cx: x,
                cy: marker_y,
                r: MARKER_RADIUS,
                fill: None,
                stroke: Some((ink, GRID_LINE_WIDTH * 1.5)),
            })),
            -1 => {
                let r = MARKER_RADIUS;
                let muted = palette.muted;
                elements.push(line(x - r, marker_y - r, x + r, marker_y + r, GRID_LINE_WIDTH * 1.5, muted));
                elements.push(line(x - r, marker_y + r, x + r, marker_y - r, GRID_LINE_WIDTH * 1.5, muted));
            }
            _ => {}
        }
    }

    // ── Barre ──
    if let Some(barre) = definition.barre {
        let held: Vec<usize> = (0..STRING_COUNT)
            .filter(|&s| definition.frets[s] > 0 && definition.frets[s] as u8 == barre)
            .collect();
        if let (Some(&first), Some(&last_string), true) = (held.first(), held.last(), held.len() >= 2) {
            let row = barre - base + 1;
            elements.push(Primitive::RoundedRect(RoundedRect {
                x: string_x(first) - DOT_RADIUS,
                y: cell_center_y(row) - DOT_RADIUS * 0.8,
                width: string_x(last_string) - string_x(first) + 2.0 * DOT_RADIUS,
                height: DOT_RADIUS * 1.6,
                radius: DOT_RADIUS * 0.8,
                fill: Some(ink),
                stroke: None,
            }));
        }
    }

    // ── Finger dots ──
    for (string, &fret) in definition.frets.iter().enumerate() {
        if fret <= 0 {
            continue;
        }
        let row = fret as u8 - base + 1;
        let (cx, cy) = (string_x(string), cell_center_y(row));
        elements.push(Primitive::Circle(Circle {
            cx,
            cy,
            r: DOT_RADIUS,
            fill: Some(ink),
            stroke: None,
        }));
        let finger = definition.finger(string);
        if finger > 0 {
            elements.push(text(
                cx,
                cy + DIAGRAM_LABEL_SIZE * PT_TO_MM * 0.35,
                finger.to_string(),
                DIAGRAM_LABEL_SIZE,
                FontWeight::Bold,
                Color::WHITE,
                Anchor::Middle,
            ));
        }
    }

    Ok(Group {
        x: 0.0,
        y: 0.0,
        label: definition.symbol.to_string(),
        scale,
        width: width * scale,
        height: height * scale,
        elements,
    })
}

/// Framed stand-in for a chord whose diagram could not be drawn.
pub fn placeholder_diagram(symbol: &ChordSymbol, scale: f64, palette: &Palette) -> Group {
    let (width, height) = diagram_size();
    let elements = vec![
        text(
            width / 2.0,
            DIAGRAM_NAME_SIZE * PT_TO_MM,
            symbol.to_string(),
            DIAGRAM_NAME_SIZE,
            FontWeight::Bold,
            palette.diagram,
            Anchor::Middle,
        ),
        Primitive::RoundedRect(RoundedRect {
            x: string_x(0),
            y: fret_y(0),
            width: grid_width(),
            height: grid_height(),
            radius: 1.0,
            fill: None,
            stroke: Some((palette.muted, GRID_LINE_WIDTH)),
        }),
        text(
            width / 2.0,
            fret_y(0) + grid_height() / 2.0 + 2.0,
            "?".to_string(),
            DIAGRAM_NAME_SIZE * 2.0,
            FontWeight::Bold,
            palette.muted,
            Anchor::Middle,
        ),
    ];
    Group {
        x: 0.0,
        y: 0.0,
        label: symbol.to_string(),
        scale,
        width: width * scale,
        height: height * scale,
        elements,
    }
}
