//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::block::BlockColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block colours (indexed by [`BlockColor::index`]) plus UI colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Red, blue, pink, yellow, purple, white.
    pub blocks: [Color; 6],
    /// Playfield background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    pub main_fg: Color,
    /// Titles and highlights.
    pub title: Color,
    /// Hints and secondary text.
    pub inactive_fg: Color,
    /// Flash colour for cleared cells.
    pub flash: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const ONEDARK_BLOCKS: [Color; 6] = [
    Color::Rgb(0xE0, 0x6C, 0x75), // cpu_end
    Color::Rgb(0x61, 0xAF, 0xEF), // cpu_box
    Color::Rgb(0xF5, 0x9F, 0xC8),
    Color::Rgb(0xE5, 0xC0, 0x7B), // cpu_mid
    Color::Rgb(0xC6, 0x78, 0xDD), // net_box
    Color::Rgb(0xDC, 0xDF, 0xE4), // hi_fg
];

const HIGH_CONTRAST_BLOCKS: [Color; 6] = [
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x66, 0xCC),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xAA, 0x00, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

// Paul Tol's bright scheme, white kept for the trigger.
const COLORBLIND_BLOCKS: [Color; 6] = [
    Color::Rgb(0xEE, 0x66, 0x77),
    Color::Rgb(0x44, 0x77, 0xAA),
    Color::Rgb(0xCC, 0xBB, 0x44),
    Color::Rgb(0x22, 0x88, 0x33),
    Color::Rgb(0xAA, 0x33, 0x77),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            blocks: ONEDARK_BLOCKS,
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
            flash: Color::Rgb(0xFF, 0xFF, 0xFF),
        }
    }

    /// One Dark when `path` is None; otherwise the file's colours over One Dark.
    /// `palette` then overrides the block colours.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            None => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.blocks = HIGH_CONTRAST_BLOCKS;
                self.bg = Color::Black;
                self.main_fg = Color::White;
            }
            Palette::Colorblind => self.blocks = COLORBLIND_BLOCKS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str], fallback: Color| {
            keys.iter()
                .find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()))
                .unwrap_or(fallback)
        };
        let d = Self::onedark_default();
        Self {
            blocks: [
                get(&["cpu_end", "temp_end"], d.blocks[0]),
                get(&["cpu_box"], d.blocks[1]),
                get(&["proc_misc"], d.blocks[2]),
                get(&["cpu_mid", "title"], d.blocks[3]),
                get(&["net_box"], d.blocks[4]),
                get(&["hi_fg"], d.blocks[5]),
            ],
            bg: get(&["main_bg", "meter_bg"], d.bg),
            div_line: get(&["div_line"], d.div_line),
            main_fg: get(&["main_fg"], d.main_fg),
            title: get(&["title"], d.title),
            inactive_fg: get(&["inactive_fg"], d.inactive_fg),
            flash: get(&["selected_fg"], d.flash),
        }
    }

    #[inline]
    pub fn block_color(&self, color: BlockColor) -> Color {
        self.blocks[color.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}
