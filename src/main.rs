use std::fs::{create_dir_all, write};
use std::io;
use std::path::PathBuf;

use clap::Parser;
use tabsheet::{
    render_sheet, suggest_capo, transpose_song, SheetConfig, SheetError, StripPolicy, TabCore, TheoryTables,
};

use crate::AppError::ConfigError;

fn main() {
    let result = main_result();
    std::process::exit(match result {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{err}");
            1
        }
    });
}

pub fn main_result() -> Result<(), AppError> {
    // setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("tabsheet=info")).init();

    let args = CliArgs::parse();
    let song_path = PathBuf::from(&args.song);
    if !song_path.exists() {
        return Err(ConfigError(format!("Song file not found {song_path:?}")));
    }

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Using config {path}");
            SheetConfig::read_config(path)?
        }
        None => SheetConfig::default(),
    };
    if args.shrink_diagrams {
        config.strip_policy = StripPolicy::Shrink;
    }

    let tables = TheoryTables::standard();
    let mut tab = TabCore::read_file(&song_path)?;
    log::info!("Loaded '{}' by {}", tab.meta.title, tab.meta.artist);

    if args.transpose != 0 {
        tab = transpose_song(&tab, args.transpose, &tables)?;
        log::info!(
            "Transposed by {} semitones, now in {}",
            args.transpose,
            tab.meta.key.as_deref().unwrap_or("an unknown key")
        );
    }

    if args.suggest_capo {
        let suggestion = suggest_capo(&tab.used_chords()?, &tables)?;
        if suggestion.capo == 0 {
            log::info!("No capo needed, {} chords already use open shapes", suggestion.easy_count);
        } else {
            let shapes = suggestion
                .substitutions
                .iter()
                .map(|(from, to)| format!("{from}->{to}"))
                .collect::<Vec<_>>()
                .join(", ");
            log::info!("Capo {} puts {} chords on open shapes: {shapes}", suggestion.capo, suggestion.easy_count);
        }
    }

    let sheet = render_sheet(&tab, &config)?;
    if !sheet.adjustments_applied.is_empty() {
        log::info!("Applied layout adjustments {:?}", sheet.adjustments_applied);
    }
    for wide in &sheet.wide_lines {
        log::warn!("Line {} of '{}' runs past the margin ({} columns)", wide.line, wide.section, wide.columns);
    }

    let out_dir = args.out_dir.map_or_else(|| PathBuf::from("."), PathBuf::from);
    create_dir_all(&out_dir)?;
    let stem = song_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sheet")
        .to_string();

    for page in &sheet.pages {
        let (extension, content) = if args.json {
            ("json", serde_json::to_string_pretty(page).map_err(SheetError::from)?)
        } else {
            ("svg", tabsheet::renderer::page_to_svg(page))
        };
        let path = out_dir.join(format!("{stem}-{}.{extension}", page.number));
        write(&path, content)?;
        log::info!("Wrote {path:?}");
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the song JSON file.
    song: String,
    /// Directory for the rendered pages.
    #[arg(long)]
    out_dir: Option<String>,
    /// Transpose by this many semitones before rendering.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    transpose: i32,
    /// Log the capo position that puts the most chords on open shapes.
    #[arg(long, default_value_t = false)]
    suggest_capo: bool,
    /// Optional path to a JSON layout config.
    #[arg(long)]
    config: Option<String>,
    /// Shrink chord diagrams instead of wrapping them onto extra rows.
    #[arg(long, default_value_t = false)]
    shrink_diagrams: bool,
    /// Write page descriptions as JSON instead of SVG.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("{0}")]
    SheetError(SheetError),
    #[error("io error: {0}")]
    IoError(String),
}

impl From<SheetError> for AppError {
    fn from(error: SheetError) -> Self {
        match error {
            SheetError::Io(s) => Self::IoError(s),
            other => Self::SheetError(other),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}
