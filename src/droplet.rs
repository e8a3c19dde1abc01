// Copyright (c) 2026 rezky_nightky

use crate::palette::Rgb;
use crate::surface::RenderSurface;

/// Duration of one update at the 60 Hz baseline speeds are expressed in.
pub const BASELINE_FRAME_MS: f32 = 1000.0 / 60.0;

/// Fraction of the canvas height where drops start fading out.
pub const FADE_START: f32 = 0.9;

/// Trail glyphs never fall below this share of the head's alpha.
pub const TRAIL_FLOOR: f32 = 0.1;

/// Per-frame drawing parameters shared by every drop.
pub struct DrawCtx {
    pub cell_px: f32,
    pub canvas_h: f32,
    pub color: Rgb,
    pub highlight: Rgb,
    pub opacity: f32,
}

/// One falling glyph trail. Index 0 of `glyphs` is the head, drawn at
/// `head_y`; glyph `i` sits `i` cells above it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Droplet {
    pub column: u32,
    pub head_y: f32,
    /// Pixels per baseline frame.
    pub speed: f32,
    pub glyphs: Vec<char>,
    pub opacity: f32,
    pub head_highlight: bool,
    pub mutation_interval_ms: f32,
    pub next_mutation_ms: f64,
    /// Resets this slot has gone through.
    pub generation: u32,
}

impl Droplet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(&self) -> usize {
        self.glyphs.len()
    }

    pub fn x(&self, cell_px: f32) -> f32 {
        self.column as f32 * cell_px
    }

    pub fn glyph_y(&self, i: usize, cell_px: f32) -> f32 {
        self.head_y - i as f32 * cell_px
    }

    /// Moves the head down by `steps` baseline frames.
    pub fn advance(&mut self, steps: f32) {
        if steps > 0.0 {
            self.head_y += self.speed * steps;
        }
    }

    /// True once the whole trail has left the bottom edge.
    pub fn is_spent(&self, canvas_h: f32, cell_px: f32) -> bool {
        self.head_y - self.length() as f32 * cell_px > canvas_h
    }

    pub fn update_fade(&mut self, canvas_h: f32) {
        self.opacity = fade_opacity(self.head_y, canvas_h);
    }

    pub fn is_visible(&self, canvas_h: f32, cell_px: f32) -> bool {
        let top = self.head_y - self.length() as f32 * cell_px;
        self.head_y >= -cell_px && top < canvas_h
    }

    pub fn draw(&self, ctx: &DrawCtx, surface: &mut dyn RenderSurface) {
        let len = self.length();
        if len == 0 || self.opacity <= 0.0 {
            return;
        }
        let x = self.x(ctx.cell_px);
        for (i, &ch) in self.glyphs.iter().enumerate() {
            let y = self.glyph_y(i, ctx.cell_px);
            if y < -ctx.cell_px || y >= ctx.canvas_h {
                continue;
            }
            let alpha = trail_alpha(i, len) * self.opacity * ctx.opacity;
            if alpha <= 0.0 {
                continue;
            }
            let color = if i == 0 && self.head_highlight {
                ctx.highlight
            } else {
                ctx.color
            };
            surface.fill_glyph(ch, x, y, color, alpha);
        }
    }
}

/// Alpha of glyph `i` in a trail of `len`: full at the head, then a
/// linear fade down to [`TRAIL_FLOOR`].
pub fn trail_alpha(i: usize, len: usize) -> f32 {
    if i == 0 || len == 0 {
        return 1.0;
    }
    let progress = i as f32 / len as f32;
    (1.0 - progress * 0.9).max(TRAIL_FLOOR)
}

/// 1.0 above the fade zone, then linear down to 0.0 at the bottom edge.
pub fn fade_opacity(head_y: f32, canvas_h: f32) -> f32 {
    if canvas_h <= 0.0 {
        return 0.0;
    }
    let fade_zone = canvas_h * FADE_START;
    if head_y <= fade_zone {
        return 1.0;
    }
    let span = canvas_h - fade_zone;
    (1.0 - (head_y - fade_zone) / span).clamp(0.0, 1.0)
}
