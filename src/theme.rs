//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::game::block::BlockColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Block colours in `BlockColor::index()` order: red, blue, green, yellow, purple.
    pub blocks: [Color; 5],
    /// Shade mixed into a block while it is clearing.
    pub clear_shade: Color,
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, time).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary sidebar text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// Hex literals below are fixed and known-good.
fn hex(s: &str) -> Color {
    parse_hex(s).unwrap_or(Color::Reset)
}

impl Theme {
    /// Hardcoded One Dark defaults: exact hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            blocks: [
                hex("#E06C75"), // cpu_end / red
                hex("#61AFEF"), // cpu_box / blue
                hex("#98C379"), // mem_box / green
                hex("#E5C07B"), // title / yellow
                hex("#C678DD"), // net_box / magenta
            ],
            clear_shade: hex("#969696"),
            bg: hex("#31353F"),          // meter_bg
            div_line: hex("#3F444F"),    // div_line
            main_fg: hex("#ABB2BF"),     // main_fg
            title: hex("#E5C07B"),       // title
            inactive_fg: hex("#5C6370"), // inactive_fg
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override block colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.blocks = [
                    hex("#FF0000"),
                    hex("#0088FF"),
                    hex("#00FF00"),
                    hex("#FFFF00"),
                    hex("#FF00FF"),
                ];
            }
            crate::Palette::Colorblind => {
                // Avoid red/green pairs; Tol's bright scheme.
                self.blocks = [
                    hex("#CC3311"),
                    hex("#0077BB"),
                    hex("#009988"),
                    hex("#EE7733"),
                    hex("#EE3377"),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let d = Self::onedark_default();
        Self {
            blocks: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.blocks[0]),
                get("cpu_box").unwrap_or(d.blocks[1]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.blocks[2]),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(d.blocks[3]),
                get("net_box").unwrap_or(d.blocks[4]),
            ],
            clear_shade: get("inactive_fg").unwrap_or(d.clear_shade),
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    #[inline]
    pub fn block_color(&self, color: BlockColor) -> Color {
        self.blocks[color.index()]
    }

    /// Colour for a clearing block: its own colour washed toward the clear shade.
    pub fn clearing_color(&self, color: BlockColor) -> Color {
        blend(self.block_color(color), self.clear_shade, 0.7)
    }
}

/// Linear mix of two RGB colours; non-RGB inputs return `b`.
pub fn blend(a: Color, b: Color, t: f32) -> Color {
    match (a, b) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |x: u8, y: u8| (f32::from(x) * (1.0 - t) + f32::from(y) * t).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => b,
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let channel = |part: &str| {
        u8::from_str_radix(part, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
