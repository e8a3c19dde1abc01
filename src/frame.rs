// Copyright (c) 2026 rezky_nightky

//! A cell grid that behaves like a small pixel canvas.
//!
//! Each terminal cell stands for a `px_per_cell` square of pixels. Overlay
//! rectangles darken the cells they cover and glyphs replace the cell they
//! land on, so the field's trail compositing survives the trip to text.

use crate::cell::Cell;
use crate::palette::Rgb;
use crate::surface::{Rect, RenderSurface};

/// Cells darker than this are shown as blank.
pub const VISIBLE_FLOOR: u8 = 24;

/// Glyphs drawn above this alpha are shown bold.
const BOLD_ALPHA: f32 = 0.9;

#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    px_per_cell: f32,
    font_px: f32,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, px_per_cell: f32) -> Self {
        let len = width as usize * height as usize;
        let px = if px_per_cell.is_finite() && px_per_cell >= 1.0 {
            px_per_cell
        } else {
            1.0
        };
        Self {
            width,
            height,
            px_per_cell: px,
            font_px: px,
            cells: vec![Cell::BLANK; len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn px_per_cell(&self) -> f32 {
        self.px_per_cell
    }

    /// Last font size the field asked for.
    pub fn font_px(&self) -> f32 {
        self.font_px
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
        self.dirty_all = true;
        self.dirty.clear();
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[cfg(test)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(Cell::BLANK)
    }

    #[cfg(test)]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.set_index(i, cell);
        }
    }

    fn set_index(&mut self, i: usize, cell: Cell) {
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    /// Cell coordinate covering pixel `v`, if it lies on the grid.
    fn to_cell(&self, v: f32, limit: u16) -> Option<u16> {
        if !v.is_finite() || v < 0.0 {
            return None;
        }
        let c = (v / self.px_per_cell).floor();
        if c >= limit as f32 {
            None
        } else {
            Some(c as u16)
        }
    }

    /// Half-open range of cells whose centers fall inside `[lo, hi)`.
    fn span(&self, lo: f32, hi: f32, limit: u16) -> (u16, u16) {
        let px = self.px_per_cell;
        let first = ((lo / px) - 0.5).ceil().max(0.0);
        let end = ((hi / px) - 0.5).ceil().clamp(0.0, limit as f32);
        if !first.is_finite() || !end.is_finite() || first >= end {
            return (0, 0);
        }
        (first as u16, end as u16)
    }
}

impl RenderSurface for Frame {
    fn width(&self) -> u32 {
        (self.width as f32 * self.px_per_cell) as u32
    }

    fn height(&self) -> u32 {
        (self.height as f32 * self.px_per_cell) as u32
    }

    fn set_font(&mut self, px: f32) {
        self.font_px = px;
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        let (x0, x1) = self.span(rect.x, rect.x + rect.w, self.width);
        let (y0, y1) = self.span(rect.y, rect.y + rect.h, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let i = y as usize * self.width as usize + x as usize;
                let cur = self.cells[i];
                if cur.is_blank() && cur.rgb == Rgb::BLACK && color == Rgb::BLACK {
                    continue;
                }
                let rgb = cur.rgb.blend(color, alpha);
                let next = if rgb.max_channel() < VISIBLE_FLOOR {
                    Cell::BLANK
                } else {
                    Cell { rgb, ..cur }
                };
                self.set_index(i, next);
            }
        }
    }

    fn fill_glyph(&mut self, ch: char, x: f32, y: f32, color: Rgb, alpha: f32) {
        let (Some(cx), Some(cy)) = (self.to_cell(x, self.width), self.to_cell(y, self.height))
        else {
            return;
        };
        let i = cy as usize * self.width as usize + cx as usize;
        let cur = self.cells[i];
        let rgb = cur.rgb.blend(color, alpha);
        if rgb.max_channel() < VISIBLE_FLOOR {
            return;
        }
        self.set_index(
            i,
            Cell {
                ch,
                rgb,
                bold: alpha > BOLD_ALPHA,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ch: char) -> Cell {
        Cell {
            ch,
            rgb: Rgb::MATRIX_GREEN,
            bold: true,
        }
    }

    #[test]
    fn clear_blanks_every_cell() {
        let mut f = Frame::new(2, 2, 16.0);
        f.set(0, 0, lit('x'));
        assert_eq!(f.get(0, 0).unwrap().ch, 'x');
        f.clear();
        assert_eq!(f.get(0, 0).unwrap().ch, ' ');
        assert!(f.is_dirty_all());
    }

    #[test]
    fn reports_pixel_size() {
        let f = Frame::new(50, 20, 16.0);
        assert_eq!((f.width(), f.height()), (800, 320));
        assert!(Frame::new(0, 20, 16.0).width() == 0);
        assert!(!Frame::new(0, 20, 16.0).is_available());
    }

    #[test]
    fn glyph_lands_on_covering_cell() {
        let mut f = Frame::new(10, 10, 16.0);
        f.clear_dirty();
        f.fill_glyph('Z', 33.0, 47.9, Rgb::MATRIX_GREEN, 1.0);
        let c = f.get(2, 2).unwrap();
        assert_eq!(c.ch, 'Z');
        assert_eq!(c.rgb, Rgb::MATRIX_GREEN);
        assert!(c.bold);
        assert_eq!(f.dirty_indices(), &[22]);
    }

    #[test]
    fn offgrid_glyphs_are_ignored() {
        let mut f = Frame::new(4, 4, 16.0);
        f.clear_dirty();
        f.fill_glyph('a', -8.0, 0.0, Rgb::WHITE, 1.0);
        f.fill_glyph('a', 0.0, -0.5, Rgb::WHITE, 1.0);
        f.fill_glyph('a', 64.0, 0.0, Rgb::WHITE, 1.0);
        f.fill_glyph('a', 0.0, f32::NAN, Rgb::WHITE, 1.0);
        assert!(f.dirty_indices().is_empty());
    }

    #[test]
    fn faint_glyph_over_black_stays_hidden() {
        let mut f = Frame::new(4, 4, 16.0);
        f.fill_glyph('a', 0.0, 0.0, Rgb::MATRIX_GREEN, 0.05);
        assert!(f.get(0, 0).unwrap().is_blank());
        f.fill_glyph('a', 0.0, 0.0, Rgb::MATRIX_GREEN, 0.5);
        let c = f.get(0, 0).unwrap();
        assert_eq!(c.ch, 'a');
        assert!(!c.bold);
        assert_eq!(c.rgb, Rgb::new(0, 128, 0));
    }

    #[test]
    fn overlay_fades_cells_to_blank() {
        let mut f = Frame::new(3, 1, 16.0);
        f.set(1, 0, lit('q'));
        let full = Rect::new(0.0, 0.0, 48.0, 16.0);
        let mut frames = 0;
        while !f.get(1, 0).unwrap().is_blank() {
            f.fill_rect(full, Rgb::BLACK, 0.05);
            frames += 1;
            assert!(frames < 200);
        }
        assert!(frames > 30);
        assert_eq!(f.get(1, 0).copied(), Some(Cell::BLANK));
    }

    #[test]
    fn overlay_only_touches_covered_cells() {
        let mut f = Frame::new(4, 1, 16.0);
        for x in 0..4 {
            f.set(x, 0, lit('k'));
        }
        f.clear_dirty();
        f.fill_rect(Rect::new(16.0, 0.0, 32.0, 16.0), Rgb::BLACK, 0.5);
        assert_eq!(f.get(0, 0).unwrap().rgb, Rgb::MATRIX_GREEN);
        assert_eq!(f.get(1, 0).unwrap().rgb, Rgb::new(0, 128, 0));
        assert_eq!(f.get(2, 0).unwrap().rgb, Rgb::new(0, 128, 0));
        assert_eq!(f.get(3, 0).unwrap().rgb, Rgb::MATRIX_GREEN);
        assert_eq!(f.dirty_indices(), &[1, 2]);
    }
}
