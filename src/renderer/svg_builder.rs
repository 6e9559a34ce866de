//! SVG builder: accumulates SVG elements and produces the final string.
//!
//! Pages are written in millimetre user units so the document prints at
//! its physical size; font sizes are converted from points.

use super::constants::PT_TO_MM;
use super::layout::Page;
use super::primitives::*;

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(super) struct SvgBuilder {
    pub(super) elements: Vec<String>,
    width: f64,
    height: f64,
}

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn paint(fill: Option<Color>, stroke: Option<(Color, f64)>) -> String {
    let fill = fill.map_or_else(|| "none".to_string(), |c| c.to_string());
    match stroke {
        Some((color, width)) => format!(r#"fill="{fill}" stroke="{color}" stroke-width="{width:.2}""#),
        None => format!(r#"fill="{fill}""#),
    }
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
        }
    }

    pub(super) fn build(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 {w} {h}" width="{w}mm" height="{h}mm" style="font-family: 'Helvetica', 'Arial', sans-serif;">"#,
            w = self.width,
            h = self.height
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    pub(super) fn background(&mut self, color: Color) {
        self.elements.push(format!(
            r#"<rect x="0" y="0" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            self.width, self.height, color
        ));
    }

    pub(super) fn line(&mut self, l: &Line) {
        self.elements.push(format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}" stroke-linecap="round"/>"#,
            l.x1, l.y1, l.x2, l.y2, l.color, l.width
        ));
    }

    pub(super) fn circle(&mut self, c: &Circle) {
        self.elements.push(format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" {}/>"#,
            c.cx,
            c.cy,
            c.r,
            paint(c.fill, c.stroke)
        ));
    }

    pub(super) fn rounded_rect(&mut self, r: &RoundedRect) {
        self.elements.push(format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" {}/>"#,
            r.x,
            r.y,
            r.width,
            r.height,
            r.radius,
            paint(r.fill, r.stroke)
        ));
    }

    pub(super) fn text(&mut self, t: &TextRun) {
        let family = match t.family {
            FontFamily::Sans => "",
            FontFamily::Mono => r#" font-family="'Courier New', Courier, monospace" xml:space="preserve""#,
        };
        let weight = match t.weight {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        };
        let anchor = match t.anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let style = if t.italic { r#" font-style="italic""# } else { "" };
        self.elements.push(format!(
            r#"<text x="{:.2}" y="{:.2}"{} font-size="{:.2}" font-weight="{}"{} fill="{}" text-anchor="{}">{}</text>"#,
            t.x,
            t.y,
            family,
            t.size * PT_TO_MM,
            weight,
            style,
            t.color,
            anchor,
            escape(&t.text)
        ));
    }

    /// Image slots are written as `<image>` elements whose href is the slot
    /// key; a backend swaps in the real image (e.g. a QR code).
    pub(super) fn image(&mut self, i: &ImageSlot) {
        self.elements.push(format!(
            r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" xlink:href="{}"/>"#,
            i.x,
            i.y,
            i.width,
            i.height,
            escape(&i.key)
        ));
    }

    pub(super) fn group(&mut self, g: &Group) {
        self.elements.push(format!(
            r#"<g transform="translate({:.2},{:.2}) scale({})" data-chord="{}">"#,
            g.x,
            g.y,
            g.scale,
            escape(&g.label)
        ));
        for element in &g.elements {
            self.primitive(element);
        }
        self.elements.push("</g>".to_string());
    }

    pub(super) fn primitive(&mut self, p: &Primitive) {
        match p {
            Primitive::Text(t) => self.text(t),
            Primitive::Line(l) => self.line(l),
            Primitive::Circle(c) => self.circle(c),
            Primitive::RoundedRect(r) => self.rounded_rect(r),
            Primitive::Image(i) => self.image(i),
            Primitive::Diagram(g) => self.group(g),
        }
    }
}

/// A standalone SVG document for one page.
pub fn page_to_svg(page: &Page) -> String {
    let mut svg = SvgBuilder::new(page.width, page.height);
    svg.background(Color::WHITE);
    for element in &page.elements {
        svg.primitive(element);
    }
    svg.build()
}

/// One SVG document per page.
pub fn pages_to_svg(pages: &[Page]) -> Vec<String> {
    pages.iter().map(page_to_svg).collect()
}
