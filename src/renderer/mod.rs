//! Sheet renderer: turns a `TabCore` into fixed-size pages of positioned
//! draw primitives.
//!
//! The page tree is the primary output; `svg_builder` serializes it for
//! previews and the JSON form comes for free through serde.

mod constants;
mod svg_builder;
mod tab;

pub mod align;
pub mod diagram;
pub mod layout;
pub mod primitives;

use crate::config::SheetConfig;
use crate::model::TabCore;
use crate::SheetError;

pub use align::{align_line, AlignedLine};
pub use diagram::{generate_diagram, placeholder_diagram};
pub use layout::{abbreviate_section, meta_line, Page, RenderedSheet, SectionPlacement, WideLine};
pub use primitives::Primitive;
pub use svg_builder::{page_to_svg, pages_to_svg};
pub use tab::tab_rows;

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Render a song to pages.
///
/// The song is checked against the input contract first (known section
/// types, defined patterns, a definition for every chord in use) and the
/// first problem is returned as is. On success every page is complete;
/// nothing partial is ever returned.
pub fn render_sheet(tab: &TabCore, config: &SheetConfig) -> Result<RenderedSheet, SheetError> {
    config.validate()?;
    tab.validate()?;
    layout::layout_sheet(tab, config)
}

/// Render a song straight to one SVG document per page.
pub fn render_sheet_to_svg(tab: &TabCore, config: &SheetConfig) -> Result<Vec<String>, SheetError> {
    let sheet = render_sheet(tab, config)?;
    Ok(pages_to_svg(&sheet.pages))
}
