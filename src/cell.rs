// Copyright (c) 2026 rezky_nightky

use crate::palette::Rgb;

/// One terminal cell of the composited picture. `rgb` is the cell's
/// current color before it is mapped to the terminal's color depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub rgb: Rgb,
    pub bold: bool,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        rgb: Rgb::BLACK,
        bold: false,
    };

    pub fn is_blank(&self) -> bool {
        self.ch == ' '
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::BLANK
    }
}
