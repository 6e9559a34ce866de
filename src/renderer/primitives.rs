//! Page description tree: positioned draw primitives in millimetres,
//! origin top-left. This is what the engine hands to a rendering backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SheetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const WHITE: Self = Self(255, 255, 255);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Color {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let invalid = || SheetError::InvalidInput(format!("invalid color '{value}', expected #rrggbb"));
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    Sans,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// A single run of text; `y` is the baseline, `size` is in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub family: FontFamily,
    pub size: f64,
    pub weight: FontWeight,
    pub italic: bool,
    pub color: Color,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub color: Color,
}

/// Circle; `fill: None` draws an outline with `stroke`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, f64)>,
}

/// Opaque image slot resolved by the backend from `key` (e.g. a QR code
/// for an audio URL).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub key: String,
}

/// A sub-tree drawn in its own coordinate space, translated to `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    pub elements: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Text(TextRun),
    Line(Line),
    Circle(Circle),
    RoundedRect(RoundedRect),
    Image(ImageSlot),
    Diagram(Group),
}

impl Primitive {
    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_diagram(&self) -> Option<&Group> {
        match self {
            Self::Diagram(g) => Some(g),
            _ => None,
        }
    }

    /// The same primitive moved by `(dx, dy)`. Group contents keep their
    /// local coordinates; only the group origin moves.
    #[must_use]
    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        match &mut self {
            Self::Text(t) => {
                t.x += dx;
                t.y += dy;
            }
            Self::Line(l) => {
                l.x1 += dx;
                l.y1 += dy;
                l.x2 += dx;
                l.y2 += dy;
            }
            Self::Circle(c) => {
                c.cx += dx;
                c.cy += dy;
            }
            Self::RoundedRect(r) => {
                r.x += dx;
                r.y += dy;
            }
            Self::Image(i) => {
                i.x += dx;
                i.y += dy;
            }
            Self::Diagram(g) => {
                g.x += dx;
                g.y += dy;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_round_trip() {
        let c = Color::try_from("#005aa0".to_string()).unwrap();
        assert_eq!(c, Color(0, 90, 160));
        assert_eq!(c.to_string(), "#005aa0");
        assert!(Color::try_from("005aa0".to_string()).is_err());
        assert!(Color::try_from("#05a".to_string()).is_err());
    }

    #[test]
    fn primitives_serialize_with_type_tag() {
        let p = Primitive::Image(ImageSlot {
            x: 1.0,
            y: 2.0,
            width: 18.0,
            height: 18.0,
            key: "https://example.com/a.mp3".into(),
        });
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"type\":\"image\""), "{json}");
    }

    #[test]
    fn translate_moves_both_line_ends() {
        let moved = Primitive::Line(Line {
            x1: 0.0,
            y1: 1.0,
            x2: 5.0,
            y2: 1.0,
            width: 0.2,
            color: Color::BLACK,
        })
        .translated(10.0, 20.0);
        assert_eq!(
            moved,
            Primitive::Line(Line {
                x1: 10.0,
                y1: 21.0,
                x2: 15.0,
                y2: 21.0,
                width: 0.2,
                color: Color::BLACK,
            })
        );
    }
}
