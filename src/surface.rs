// Copyright (c) 2026 rezky_nightky

use crate::palette::Rgb;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// A 2D pixel sink the field draws into. Hosts own the real surface
/// (canvas, view, terminal) and report its size in pixels.
pub trait RenderSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// A surface with no area cannot be drawn on this frame.
    fn is_available(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    fn set_font(&mut self, px: f32);

    /// Composites `color` at `alpha` over the rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32);

    /// Draws one glyph with its top-left corner at (`x`, `y`).
    fn fill_glyph(&mut self, ch: char, x: f32, y: f32, color: Rgb, alpha: f32);
}

#[cfg(test)]
pub mod testing {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum DrawOp {
        Font(f32),
        Rect {
            rect: Rect,
            color: Rgb,
            alpha: f32,
        },
        Glyph {
            ch: char,
            x: f32,
            y: f32,
            color: Rgb,
            alpha: f32,
        },
    }

    /// Records every call so tests can inspect a rendered frame.
    #[derive(Clone, Debug, Default)]
    pub struct Recorder {
        pub width: u32,
        pub height: u32,
        pub ops: Vec<DrawOp>,
    }

    impl Recorder {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ops: Vec::new(),
            }
        }

        pub fn take(&mut self) -> Vec<DrawOp> {
            std::mem::take(&mut self.ops)
        }

        pub fn glyphs(&self) -> impl Iterator<Item = (char, f32, f32, Rgb, f32)> + '_ {
            self.ops.iter().filter_map(|op| match *op {
                DrawOp::Glyph {
                    ch,
                    x,
                    y,
                    color,
                    alpha,
                } => Some((ch, x, y, color, alpha)),
                _ => None,
            })
        }
    }

    impl RenderSurface for Recorder {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn set_font(&mut self, px: f32) {
            self.ops.push(DrawOp::Font(px));
        }

        fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
            self.ops.push(DrawOp::Rect { rect, color, alpha });
        }

        fn fill_glyph(&mut self, ch: char, x: f32, y: f32, color: Rgb, alpha: f32) {
            self.ops.push(DrawOp::Glyph {
                ch,
                x,
                y,
                color,
                alpha,
            });
        }
    }
}
