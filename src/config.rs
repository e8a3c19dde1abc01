// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;

use crate::charset::CharacterSet;
use crate::palette::ColorScheme;
use crate::settings::{CharacterSize, ColorValue, Density, Settings, SpeedTier};

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  glyphfall --color green --speed normal --density normal --character-size medium --opacity 1 --charset mixed --fps 60 --cell-px 16";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn heading(text: &str) -> String {
    if color_enabled_stdout() {
        format!("\x1b[1;36m{}\x1b[0m", text)
    } else {
        text.to_string()
    }
}

fn note(text: &str) -> String {
    if color_enabled_stdout() {
        format!("\x1b[2m{}\x1b[0m", text)
    } else {
        text.to_string()
    }
}

pub fn default_params_usage_for_help() -> String {
    let mut out = String::new();
    for (i, line) in DEFAULT_PARAMS_USAGE.lines().enumerate() {
        if i == 0 {
            out.push_str(&heading(line));
        } else {
            out.push('\n');
            out.push_str(line);
        }
    }
    out
}

fn parse_fps(s: &str) -> Result<f64, String> {
    let v: f64 = s.trim().parse().map_err(|_| format!("invalid fps: {}", s))?;
    if !v.is_finite() || !(1.0..=240.0).contains(&v) {
        return Err("fps must be between 1 and 240".to_string());
    }
    Ok(v)
}

fn parse_opacity(s: &str) -> Result<f32, String> {
    let v: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid opacity: {}", s))?;
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err("opacity must be between 0 and 1".to_string());
    }
    Ok(v)
}

fn parse_cell_px(s: &str) -> Result<f32, String> {
    let v: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid cell size: {}", s))?;
    if !v.is_finite() || !(4.0..=64.0).contains(&v) {
        return Err("cell size must be between 4 and 64 pixels".to_string());
    }
    Ok(v)
}

fn parse_colormode(s: &str) -> Result<u16, String> {
    match s.trim() {
        "0" => Ok(0),
        "16" => Ok(16),
        "8" | "256" => Ok(256),
        "24" | "32" => Ok(24),
        other => Err(format!("invalid colormode: {} (allowed: 0, 16, 8/256, 24/32)", other)),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "glyphfall", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        long = "settings",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Read the settings record from a JSON file"
    )]
    pub settings: Option<PathBuf>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on any keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Random seed; the same seed replays the same rain"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Write diagnostics to a file (filter with GLYPHFALL_LOG)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "color",
        help_heading = "APPEARANCE",
        help = "Color scheme (see --list-colors) or #RRGGBB"
    )]
    pub color: Option<ColorValue>,

    #[arg(
        long = "custom-color",
        value_name = "#RRGGBB",
        help_heading = "APPEARANCE",
        help = "Color used by the 'custom' scheme"
    )]
    pub custom_color: Option<crate::palette::Rgb>,

    #[arg(
        short = 'o',
        long = "opacity",
        value_parser = parse_opacity,
        help_heading = "APPEARANCE",
        help = "Layer opacity (min 0 max 1)"
    )]
    pub opacity: Option<f32>,

    #[arg(
        long = "character-size",
        help_heading = "APPEARANCE",
        help = "Glyph size: small, medium, large, extralarge"
    )]
    pub character_size: Option<CharacterSize>,

    #[arg(
        long = "colormode",
        value_parser = parse_colormode,
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit (TERM=...256color), else 16-color"
    )]
    pub colormode: Option<u16>,

    #[arg(
        short = 'S',
        long = "speed",
        help_heading = "PERFORMANCE",
        help = "Fall speed: slow, normal, fast, veryfast"
    )]
    pub speed: Option<SpeedTier>,

    #[arg(
        short = 'd',
        long = "density",
        help_heading = "PERFORMANCE",
        help = "Share of columns with a drop: sparse, normal, dense"
    )]
    pub density: Option<Density>,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        value_parser = parse_fps,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "cell-px",
        default_value_t = 16.0,
        value_parser = parse_cell_px,
        help_heading = "PERFORMANCE",
        help = "Pixels one terminal cell stands for (min 4 max 64)"
    )]
    pub cell_px: f32,

    #[arg(
        long = "perf-stats",
        help_heading = "PERFORMANCE",
        help = "Print performance statistics summary on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "charset",
        help_heading = "CHARSET",
        help = "Character set (see --list-charsets)"
    )]
    pub charset: Option<CharacterSet>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available character sets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "list-colors",
        help_heading = "HELP",
        help = "List available color schemes and exit"
    )]
    pub list_colors: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

impl Args {
    /// Applies every flag that was given on top of `base`.
    pub fn overlay(&self, mut base: Settings) -> Settings {
        if let Some(c) = self.color {
            base.color = c;
        }
        if let Some(c) = self.custom_color {
            base.custom_color = c;
        }
        if let Some(s) = self.speed {
            base.speed = s;
        }
        if let Some(d) = self.density {
            base.density = d;
        }
        if let Some(sz) = self.character_size {
            base.character_size = sz;
            base.font_size = None;
        }
        if let Some(o) = self.opacity {
            base.opacity = o;
        }
        if let Some(cs) = self.charset {
            base.character_set = cs;
        }
        base
    }
}

pub fn print_list_charsets() {
    println!("{}", heading("AVAILABLE CHARACTER SETS:"));
    println!("{}", note("NOTE: Use only the VALUE (left side) with --charset."));
    println!();
    println!("VALUE        DESCRIPTION");
    for cs in CharacterSet::ALL {
        let desc = match cs {
            CharacterSet::Latin => "Latin letters A-Z a-z",
            CharacterSet::Greek => "Greek letters (no final sigma)",
            CharacterSet::Numbers => "Digits 0-9",
            CharacterSet::Symbols => "ASCII punctuation and symbols",
            CharacterSet::Mixed => "Greek + Latin + digits (default)",
        };
        println!("{:<12} {} ({} glyphs)", cs.name(), desc, cs.glyphs().len());
    }
}

pub fn print_list_colors() {
    println!("{}", heading("AVAILABLE COLOR SCHEMES:"));
    println!(
        "{}",
        note("NOTE: Use the VALUE (left side) or any #RRGGBB with --color.")
    );
    println!();
    println!("VALUE        COLOR");
    for scheme in ColorScheme::ALL {
        match scheme.rgb() {
            Some(rgb) => println!("{:<12} {}", scheme.name(), rgb),
            None => println!("{:<12} value of --custom-color", scheme.name()),
        }
    }
}

pub fn print_live_keys() {
    println!("{}", heading("LIVE KEYS:"));
    println!("  q, Esc       quit");
    println!("  p            pause / resume");
    println!("  Space        restart the rain");
    println!("  Up / Down    faster / slower");
    println!("  + / -        denser / sparser");
    println!("  ] / [        larger / smaller glyphs");
    println!("  c            next color scheme");
    println!("  g            next character set");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_flags_reject_unknown_values() {
        assert!(Args::try_parse_from(["glyphfall", "--speed", "warp"]).is_err());
        assert!(Args::try_parse_from(["glyphfall", "--charset", "runic"]).is_err());
        assert!(Args::try_parse_from(["glyphfall", "--fps", "0"]).is_err());
        assert!(Args::try_parse_from(["glyphfall", "--opacity", "1.5"]).is_err());
        assert!(Args::try_parse_from(["glyphfall", "--colormode", "12"]).is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let args = Args::try_parse_from([
            "glyphfall",
            "--color",
            "#123456",
            "--speed",
            "fast",
            "--charset",
            "numbers",
            "--character-size",
            "large",
        ])
        .unwrap();
        let base = Settings {
            density: Density::Dense,
            font_size: Some(30.0),
            ..Settings::default()
        };
        let s = args.overlay(base);
        assert_eq!(
            s.color,
            ColorValue::Hex(crate::palette::Rgb::new(0x12, 0x34, 0x56))
        );
        assert_eq!(s.speed, SpeedTier::Fast);
        assert_eq!(s.density, Density::Dense);
        assert_eq!(s.character_set, CharacterSet::Numbers);
        assert_eq!(s.cell_px(), 20.0);
    }

    #[test]
    fn colormode_aliases() {
        let a = Args::try_parse_from(["glyphfall", "--colormode", "8"]).unwrap();
        assert_eq!(a.colormode, Some(256));
        let a = Args::try_parse_from(["glyphfall", "--colormode", "32"]).unwrap();
        assert_eq!(a.colormode, Some(24));
    }

    #[test]
    fn defaults_without_flags() {
        let a = Args::try_parse_from(["glyphfall"]).unwrap();
        assert_eq!(a.fps, 60.0);
        assert_eq!(a.cell_px, 16.0);
        assert_eq!(a.overlay(Settings::default()), Settings::default());
    }
}
