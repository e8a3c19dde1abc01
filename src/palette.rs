// Copyright (c) 2026 rezky_nightky

use std::fmt;
use std::str::FromStr;

use crossterm::style::Color;

use crate::runtime::ColorMode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const MATRIX_GREEN: Rgb = Rgb::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Source-over compositing of `src` at `alpha` onto `self`.
    pub fn blend(self, src: Rgb, alpha: f32) -> Rgb {
        let a = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Rgb {
            r: lerp_u8(self.r, src.r, a),
            g: lerp_u8(self.g, src.g, a),
            b: lerp_u8(self.b, src.b, a),
        }
    }

    pub fn max_channel(self) -> u8 {
        self.r.max(self.g).max(self.b)
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb { r, g, b })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s).ok_or_else(|| format!("invalid color: {} (expected #RRGGBB)", s))
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// Named color schemes of the settings record. `Custom` defers to the
/// record's `customColor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Green,
    Blue,
    Red,
    Yellow,
    Cyan,
    Purple,
    Orange,
    Pink,
    Custom,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 9] = [
        ColorScheme::Green,
        ColorScheme::Blue,
        ColorScheme::Red,
        ColorScheme::Yellow,
        ColorScheme::Cyan,
        ColorScheme::Purple,
        ColorScheme::Orange,
        ColorScheme::Pink,
        ColorScheme::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Green => "green",
            ColorScheme::Blue => "blue",
            ColorScheme::Red => "red",
            ColorScheme::Yellow => "yellow",
            ColorScheme::Cyan => "cyan",
            ColorScheme::Purple => "purple",
            ColorScheme::Orange => "orange",
            ColorScheme::Pink => "pink",
            ColorScheme::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<ColorScheme> {
        let s = s.trim().to_ascii_lowercase();
        ColorScheme::ALL.into_iter().find(|c| c.name() == s)
    }

    /// Base color, or `None` for `Custom`.
    pub fn rgb(self) -> Option<Rgb> {
        match self {
            ColorScheme::Green => Some(Rgb::new(0x00, 0xFF, 0x00)),
            ColorScheme::Blue => Some(Rgb::new(0x00, 0xCC, 0xFF)),
            ColorScheme::Red => Some(Rgb::new(0xFF, 0x00, 0x00)),
            ColorScheme::Yellow => Some(Rgb::new(0xFF, 0xFF, 0x00)),
            ColorScheme::Cyan => Some(Rgb::new(0x00, 0xFF, 0xFF)),
            ColorScheme::Purple => Some(Rgb::new(0xCC, 0x00, 0xFF)),
            ColorScheme::Orange => Some(Rgb::new(0xFF, 0x99, 0x00)),
            ColorScheme::Pink => Some(Rgb::new(0xFF, 0x69, 0xB4)),
            ColorScheme::Custom => None,
        }
    }

    /// Next named scheme, skipping `Custom`.
    pub fn next(self) -> ColorScheme {
        let named = &ColorScheme::ALL[..ColorScheme::ALL.len() - 1];
        let i = named.iter().position(|&c| c == self).unwrap_or(0);
        named[(i + 1) % named.len()]
    }
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(c: Rgb) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let Rgb { r, g, b } = c;

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(
        r,
        g,
        b,
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, v) = if avg < 8 {
        (16, 0)
    } else if avg > 238 {
        (231, 255)
    } else {
        let idx = 232 + ((avg - 8) / 10);
        (idx, 8 + 10 * (idx - 232))
    };
    let gray_dist = dist2(r, g, b, v, v, v);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(c: Rgb) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (col, (cr, cg, cb)) in TABLE {
        let d = dist2(c.r, c.g, c.b, cr, cg, cb);
        if d < best_d {
            best_d = d;
            best = col;
        }
    }
    best
}

/// Maps a composited cell color onto what the terminal can show.
/// Mono terminals keep their default foreground.
pub fn terminal_color(c: Rgb, mode: ColorMode) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb {
            r: c.r,
            g: c.g,
            b: c.b,
        }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(c))),
        ColorMode::Color16 => Some(rgb_to_color16(c)),
    }
}

pub fn terminal_background(mode: ColorMode) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::Color16 => Some(Color::Black),
        ColorMode::Color256 => Some(Color::AnsiValue(16)),
        ColorMode::TrueColor => Some(Color::Rgb { r: 0, g: 0, b: 0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing_accepts_optional_hash() {
        assert_eq!(Rgb::from_hex("#FF69B4"), Some(Rgb::new(0xFF, 0x69, 0xB4)));
        assert_eq!(Rgb::from_hex("00ccff"), Some(Rgb::new(0x00, 0xCC, 0xFF)));
        assert_eq!(Rgb::from_hex("#0f0"), None);
        assert_eq!(Rgb::from_hex("#GG0000"), None);
    }

    #[test]
    fn display_round_trips_through_hex() {
        let c = Rgb::new(0xCC, 0x00, 0xFF);
        assert_eq!(c.to_string(), "#CC00FF");
    }

    #[test]
    fn blend_interpolates_towards_source() {
        let base = Rgb::new(0, 200, 0);
        assert_eq!(base.blend(Rgb::BLACK, 0.0), base);
        assert_eq!(base.blend(Rgb::BLACK, 1.0), Rgb::BLACK);
        assert_eq!(base.blend(Rgb::BLACK, 0.5), Rgb::new(0, 100, 0));
        assert_eq!(base.blend(Rgb::WHITE, f32::NAN), base);
    }

    #[test]
    fn scheme_parse_and_cycle() {
        assert_eq!(ColorScheme::parse(" Pink "), Some(ColorScheme::Pink));
        assert_eq!(ColorScheme::parse("mauve"), None);
        assert_eq!(ColorScheme::Pink.next(), ColorScheme::Green);
        assert_eq!(ColorScheme::Custom.next(), ColorScheme::Blue);
        assert_eq!(ColorScheme::Custom.rgb(), None);
    }

    #[test]
    fn pure_green_quantizes_sensibly() {
        assert_eq!(
            terminal_color(Rgb::MATRIX_GREEN, ColorMode::Color256),
            Some(Color::AnsiValue(46))
        );
        assert_eq!(
            terminal_color(Rgb::MATRIX_GREEN, ColorMode::Color16),
            Some(Color::Green)
        );
        assert_eq!(terminal_color(Rgb::MATRIX_GREEN, ColorMode::Mono), None);
    }
}
