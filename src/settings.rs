// Copyright (c) 2026 rezky_nightky

//! The configuration record hosts hand to the field.
//!
//! Reading is lenient: unknown or malformed values fall back to the
//! documented default for that key instead of rejecting the record.
//! Command-line parsing goes through the strict `FromStr` impls.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::charset::CharacterSet;
use crate::palette::{ColorScheme, Rgb};

pub const MIN_CELL_PX: f32 = 4.0;
pub const MAX_CELL_PX: f32 = 256.0;
pub const DEFAULT_OPACITY: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTier {
    Slow,
    #[default]
    Normal,
    Fast,
    VeryFast,
}

impl SpeedTier {
    pub const ALL: [SpeedTier; 4] = [
        SpeedTier::Slow,
        SpeedTier::Normal,
        SpeedTier::Fast,
        SpeedTier::VeryFast,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpeedTier::Slow => "slow",
            SpeedTier::Normal => "normal",
            SpeedTier::Fast => "fast",
            SpeedTier::VeryFast => "veryfast",
        }
    }

    /// Speed range in pixels per 60 Hz tick.
    pub fn px_per_tick(self) -> (f32, f32) {
        match self {
            SpeedTier::Slow => (0.3, 0.5),
            SpeedTier::Normal => (0.5, 0.8),
            SpeedTier::Fast => (0.8, 1.2),
            SpeedTier::VeryFast => (1.0, 1.5),
        }
    }

    pub fn faster(self) -> SpeedTier {
        step(&Self::ALL, self, 1)
    }

    pub fn slower(self) -> SpeedTier {
        step(&Self::ALL, self, -1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Sparse,
    #[default]
    Normal,
    Dense,
}

impl Density {
    pub const ALL: [Density; 3] = [Density::Sparse, Density::Normal, Density::Dense];

    pub fn name(self) -> &'static str {
        match self {
            Density::Sparse => "sparse",
            Density::Normal => "normal",
            Density::Dense => "dense",
        }
    }

    /// Fraction of columns carrying a drop.
    pub fn fraction(self) -> f32 {
        match self {
            Density::Sparse => 0.3,
            Density::Normal => 0.5,
            Density::Dense => 0.7,
        }
    }

    pub fn denser(self) -> Density {
        step(&Self::ALL, self, 1)
    }

    pub fn sparser(self) -> Density {
        step(&Self::ALL, self, -1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl CharacterSize {
    pub const ALL: [CharacterSize; 4] = [
        CharacterSize::Small,
        CharacterSize::Medium,
        CharacterSize::Large,
        CharacterSize::ExtraLarge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CharacterSize::Small => "small",
            CharacterSize::Medium => "medium",
            CharacterSize::Large => "large",
            CharacterSize::ExtraLarge => "extralarge",
        }
    }

    pub fn px(self) -> f32 {
        match self {
            CharacterSize::Small => 12.0,
            CharacterSize::Medium => 16.0,
            CharacterSize::Large => 20.0,
            CharacterSize::ExtraLarge => 24.0,
        }
    }

    pub fn larger(self) -> CharacterSize {
        step(&Self::ALL, self, 1)
    }

    pub fn smaller(self) -> CharacterSize {
        step(&Self::ALL, self, -1)
    }
}

fn step<T: Copy + PartialEq>(all: &[T], cur: T, dir: isize) -> T {
    let i = all.iter().position(|&v| v == cur).unwrap_or(0) as isize;
    let j = (i + dir).clamp(0, all.len() as isize - 1);
    all[j as usize]
}

/// `color` key: a named scheme (including `custom`) or a literal hex color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorValue {
    Scheme(ColorScheme),
    Hex(Rgb),
}

impl Default for ColorValue {
    fn default() -> Self {
        ColorValue::Scheme(ColorScheme::Green)
    }
}

impl ColorValue {
    pub fn parse(s: &str) -> Option<ColorValue> {
        if let Some(scheme) = ColorScheme::parse(s) {
            return Some(ColorValue::Scheme(scheme));
        }
        Rgb::from_hex(s).map(ColorValue::Hex)
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorValue::Scheme(s) => f.write_str(s.name()),
            ColorValue::Hex(c) => write!(f, "{}", c),
        }
    }
}

impl Serialize for ColorValue {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl Serialize for CharacterSet {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.name())
    }
}

macro_rules! strict_from_str {
    ($ty:ty, $what:literal, $allowed:literal, $parse:expr) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let parse: fn(&str) -> Option<$ty> = $parse;
                parse(s).ok_or_else(|| format!("invalid {}: {} (allowed: {})", $what, s, $allowed))
            }
        }
    };
}

strict_from_str!(SpeedTier, "speed", "slow, normal, fast, veryfast", |s| {
    let s = s.trim().to_ascii_lowercase();
    SpeedTier::ALL.into_iter().find(|v| v.name() == s)
});
strict_from_str!(Density, "density", "sparse, normal, dense", |s| {
    let s = s.trim().to_ascii_lowercase();
    Density::ALL.into_iter().find(|v| v.name() == s)
});
strict_from_str!(
    CharacterSize,
    "character size",
    "small, medium, large, extralarge",
    |s| {
        let s = s.trim().to_ascii_lowercase();
        CharacterSize::ALL.into_iter().find(|v| v.name() == s)
    }
);
strict_from_str!(
    CharacterSet,
    "character set",
    "latin, greek, numbers, symbols, mixed",
    CharacterSet::parse
);
strict_from_str!(
    ColorValue,
    "color",
    "a scheme from --list-colors or #RRGGBB",
    ColorValue::parse
);

/// Looks a string value up, falling back to the default with a warning.
fn lenient_named<'de, D, T>(d: D, key: &'static str) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default + fmt::Debug,
{
    let v = Value::deserialize(d)?;
    let parsed = match &v {
        Value::String(s) => s.parse::<T>().ok(),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(|| {
        let fallback = T::default();
        warn!(key = key, value = %v, ?fallback, "unrecognised setting, using default");
        fallback
    }))
}

fn de_color<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<ColorValue, D::Error> {
    lenient_named(d, "color")
}

fn de_speed<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<SpeedTier, D::Error> {
    lenient_named(d, "speed")
}

fn de_density<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Density, D::Error> {
    lenient_named(d, "density")
}

fn de_size<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<CharacterSize, D::Error> {
    lenient_named(d, "characterSize")
}

fn de_charset<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<CharacterSet, D::Error> {
    lenient_named(d, "characterSet")
}

fn de_custom_color<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Rgb, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_str().and_then(Rgb::from_hex).unwrap_or_else(|| {
        warn!(key = "customColor", value = %v, "unrecognised setting, using default");
        Rgb::MATRIX_GREEN
    }))
}

fn de_opacity<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v.as_f64() {
        Some(o) if o.is_finite() => o as f32,
        _ => {
            warn!(key = "opacity", value = %v, "unrecognised setting, using default");
            DEFAULT_OPACITY
        }
    })
}

fn de_font_size<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f32>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_f64().map(|px| px as f32))
}

/// The configuration record. Keys are camelCase; the storage names used
/// by the browser extension (`matrixSpeed`, ...) are accepted as aliases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(
        alias = "colorScheme",
        alias = "matrixColorScheme",
        deserialize_with = "de_color"
    )]
    pub color: ColorValue,
    #[serde(alias = "matrixCustomColor", deserialize_with = "de_custom_color")]
    pub custom_color: Rgb,
    #[serde(alias = "matrixSpeed", deserialize_with = "de_speed")]
    pub speed: SpeedTier,
    #[serde(alias = "matrixDensity", deserialize_with = "de_density")]
    pub density: Density,
    #[serde(alias = "matrixCharacterSize", deserialize_with = "de_size")]
    pub character_size: CharacterSize,
    #[serde(alias = "matrixOpacity", deserialize_with = "de_opacity")]
    pub opacity: f32,
    #[serde(alias = "matrixCharacterSet", deserialize_with = "de_charset")]
    pub character_set: CharacterSet,
    /// Explicit glyph cell size in pixels; overrides `characterSize`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_font_size"
    )]
    pub font_size: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: ColorValue::default(),
            custom_color: Rgb::MATRIX_GREEN,
            speed: SpeedTier::default(),
            density: Density::default(),
            character_size: CharacterSize::default(),
            opacity: DEFAULT_OPACITY,
            character_set: CharacterSet::default(),
            font_size: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings: {}", path.display()))?;
        Settings::from_json(&text).with_context(|| format!("parse settings: {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Settings> {
        let s: Settings = serde_json::from_str(text)?;
        Ok(s)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Glyph cell edge in pixels, clamped to a drawable size.
    pub fn cell_px(&self) -> f32 {
        let px = match self.font_size {
            Some(px) if px.is_finite() => px,
            _ => self.character_size.px(),
        };
        px.clamp(MIN_CELL_PX, MAX_CELL_PX)
    }

    pub fn base_color(&self) -> Rgb {
        match self.color {
            ColorValue::Scheme(ColorScheme::Custom) => self.custom_color,
            ColorValue::Scheme(s) => s.rgb().unwrap_or(Rgb::MATRIX_GREEN),
            ColorValue::Hex(c) => c,
        }
    }

    pub fn layer_opacity(&self) -> f32 {
        if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 1.0)
        } else {
            DEFAULT_OPACITY
        }
    }

    /// Everything the field needs, computed in one go so a swap is whole.
    pub fn derive(&self) -> Derived {
        Derived {
            cell_px: self.cell_px(),
            speed_px: self.speed.px_per_tick(),
            density: self.density.fraction(),
            color: self.base_color(),
            opacity: self.layer_opacity(),
            character_set: self.character_set,
            glyphs: self.character_set.glyphs(),
        }
    }
}

/// Constants derived from a [`Settings`] record.
#[derive(Clone, Debug, PartialEq)]
pub struct Derived {
    pub cell_px: f32,
    /// Pixels per 60 Hz tick.
    pub speed_px: (f32, f32),
    pub density: f32,
    pub color: Rgb,
    pub opacity: f32,
    pub character_set: CharacterSet,
    pub glyphs: Vec<char>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_is_all_defaults() {
        let s = Settings::from_json("{}").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.base_color(), Rgb::MATRIX_GREEN);
        assert_eq!(s.cell_px(), 16.0);
    }

    #[test]
    fn full_record_parses() {
        let s = Settings::from_json(
            r##"{
                "color": "custom",
                "customColor": "#112233",
                "speed": "veryfast",
                "density": "dense",
                "characterSize": "extralarge",
                "opacity": 0.3,
                "characterSet": "greek"
            }"##,
        )
        .unwrap();
        assert_eq!(s.color, ColorValue::Scheme(ColorScheme::Custom));
        assert_eq!(s.base_color(), Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(s.speed, SpeedTier::VeryFast);
        assert_eq!(s.density, Density::Dense);
        assert_eq!(s.character_size, CharacterSize::ExtraLarge);
        assert!((s.opacity - 0.3).abs() < 1e-6);
        assert_eq!(s.character_set, CharacterSet::Greek);
    }

    #[test]
    fn unknown_values_fall_back_to_defaults() {
        let s = Settings::from_json(
            r#"{"color": "chartreuse", "speed": "ludicrous", "density": 3,
                "characterSize": null, "opacity": "high", "characterSet": "runic",
                "customColor": "nope"}"#,
        )
        .unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn extension_storage_keys_are_accepted() {
        let s = Settings::from_json(
            r#"{"matrixColorScheme": "pink", "matrixSpeed": "slow",
                "matrixDensity": "sparse", "matrixCharacterSize": "small",
                "matrixOpacity": 0.5}"#,
        )
        .unwrap();
        assert_eq!(s.color, ColorValue::Scheme(ColorScheme::Pink));
        assert_eq!(s.speed, SpeedTier::Slow);
        assert_eq!(s.density, Density::Sparse);
        assert_eq!(s.character_size, CharacterSize::Small);
        assert_eq!(s.layer_opacity(), 0.5);
    }

    #[test]
    fn hex_color_value_is_used_directly() {
        let s = Settings::from_json(r##"{"color": "#FF9900"}"##).unwrap();
        assert_eq!(s.base_color(), Rgb::new(0xFF, 0x99, 0x00));
    }

    #[test]
    fn out_of_range_numbers_are_clamped() {
        let s = Settings::from_json(r#"{"opacity": 7.5, "fontSize": -3}"#).unwrap();
        assert_eq!(s.layer_opacity(), 1.0);
        assert_eq!(s.cell_px(), MIN_CELL_PX);

        let s = Settings {
            font_size: Some(f32::NAN),
            opacity: f32::INFINITY,
            ..Settings::default()
        };
        assert_eq!(s.cell_px(), 16.0);
        assert_eq!(s.layer_opacity(), DEFAULT_OPACITY);
    }

    #[test]
    fn serializes_with_wire_names() {
        let s = Settings {
            speed: SpeedTier::VeryFast,
            character_size: CharacterSize::ExtraLarge,
            ..Settings::default()
        };
        let json = s.to_json().unwrap();
        assert!(json.contains(r#""speed": "veryfast""#));
        assert!(json.contains(r#""characterSize": "extralarge""#));
        assert!(json.contains(r##""customColor": "#00FF00""##));
        assert!(json.contains(r#""characterSet": "mixed""#));
        assert!(!json.contains("fontSize"));
        assert_eq!(Settings::from_json(&json).unwrap(), s);
    }

    #[test]
    fn derived_speed_ignores_cell_size() {
        let d = Settings::default().derive();
        assert_eq!(d.cell_px, 16.0);
        assert_eq!(d.speed_px, (0.5, 0.8));
        assert_eq!(d.density, 0.5);
        assert_eq!(d.glyphs.len(), 110);

        let big = Settings {
            character_size: CharacterSize::ExtraLarge,
            ..Settings::default()
        }
        .derive();
        assert_eq!(big.cell_px, 24.0);
        assert_eq!(big.speed_px, (0.5, 0.8));
    }

    #[test]
    fn strict_parsing_rejects_unknown_names() {
        assert_eq!("Fast".parse::<SpeedTier>(), Ok(SpeedTier::Fast));
        assert!("warp".parse::<SpeedTier>().is_err());
        assert!("medium".parse::<Density>().is_err());
        assert_eq!(
            "#00ccff".parse::<ColorValue>(),
            Ok(ColorValue::Hex(Rgb::new(0, 0xCC, 0xFF)))
        );
    }

    #[test]
    fn tier_steps_saturate() {
        assert_eq!(SpeedTier::VeryFast.faster(), SpeedTier::VeryFast);
        assert_eq!(SpeedTier::Slow.slower(), SpeedTier::Slow);
        assert_eq!(Density::Normal.denser(), Density::Dense);
        assert_eq!(CharacterSize::Small.larger(), CharacterSize::Medium);
    }
}
