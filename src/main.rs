//! GeoMatch: falling geo-block matching puzzle in the terminal.

mod app;
mod block;
mod controller;
mod grid;
mod input;
mod snapshot;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        log::warn!("could not load theme, using One Dark: {err}");
        let mut theme = theme::Theme::default();
        theme.apply_palette(args.palette);
        theme
    });
    log::info!("starting geomatch (seed {:?})", args.seed);
    let mut app = App::new(&args, theme)?;
    app.run()?;
    Ok(())
}

/// Logs go to a file only; the terminal belongs to the game.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling geo-block matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "geomatch",
    version,
    about = "Falling geo-block matching puzzle in the terminal. Group 4 alike shapes to clear them.",
    long_about = "GeoMatch is a terminal puzzle game.\n\n\
        Small clusters of coloured shapes fall into a 12-wide well. When a cluster lands, \
        every group of 4 or more identical shapes touching (diagonals included) is cleared, \
        everything above falls, and chains score combo bonuses. Clearing a diamond also \
        clears its whole row. Reach 2000 points within 180 seconds to win.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move     Down or j  Drop one row\n  \
        Up, k or Space     Rotate   P          Pause / resume\n  \
        Enter or R         Start / restart      M  Main menu    Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Seed for the shape generator; same seed, same sequence.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the clear flash animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["geomatch"]).unwrap();
        assert_eq!(args.palette, Palette::Normal);
        assert_eq!(args.frame_rate, 60.0);
        assert!(args.seed.is_none());
        assert!(!args.no_menu);
    }

    #[test]
    fn test_args_palette_alias_and_seed() {
        let args =
            Args::try_parse_from(["geomatch", "--palette", "colourblind", "--seed", "9"]).unwrap();
        assert_eq!(args.palette, Palette::Colorblind);
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn test_app_rejects_zero_frame_rate() {
        let args = Args::try_parse_from(["geomatch", "--frame-rate", "0"]).unwrap();
        assert!(App::new(&args, theme::Theme::default()).is_err());
    }
}
