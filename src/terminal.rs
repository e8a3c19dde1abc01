// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;
use crate::palette::{terminal_background, terminal_color};
use crate::runtime::ColorMode;

/// Pen state while queueing one frame.
#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bold: bool,
    pos: Option<(u16, u16)>,
}

pub struct Terminal {
    stdout: Stdout,
    mode: ColorMode,
    bg: Option<Color>,
    last: Option<(u16, u16, Vec<Cell>)>,
    run_buf: String,
    rows: Vec<Vec<usize>>,
}

impl Terminal {
    pub fn new(mode: ColorMode) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            mode,
            bg: terminal_background(mode),
            last: None,
            run_buf: String::with_capacity(64),
            rows: Vec::new(),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    fn fg_of(&self, cell: Cell) -> Option<Color> {
        if cell.is_blank() {
            None
        } else {
            terminal_color(cell.rgb, self.mode)
        }
    }

    fn pen_to(&mut self, pen: &mut Pen, fg: Option<Color>, bold: bool) -> Result<()> {
        if fg != pen.fg {
            self.stdout
                .queue(SetForegroundColor(fg.unwrap_or(Color::Reset)))?;
            pen.fg = fg;
        }
        if bold != pen.bold {
            self.stdout.queue(SetAttribute(if bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            pen.bold = bold;
        }
        Ok(())
    }

    fn finish(&mut self, frame: &mut Frame) -> Result<()> {
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    /// Writes the frame, repainting everything after a resize or when many
    /// cells changed and only the changed runs otherwise.
    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let (w, h) = (frame.width, frame.height);
        let total = w as usize * h as usize;
        let same_size = matches!(&self.last, Some((lw, lh, _)) if *lw == w && *lh == h);
        let dirty_is_large = total > 0 && frame.dirty_indices().len() >= total / 3;
        let mut pen = Pen::default();

        if !same_size || frame.is_dirty_all() || dirty_is_large {
            if !same_size {
                self.stdout
                    .queue(terminal::Clear(terminal::ClearType::All))?;
            }
            if let Some(bg) = self.bg {
                self.stdout.queue(SetBackgroundColor(bg))?;
            }
            let mut last = vec![Cell::BLANK; total];
            for y in 0..h {
                self.stdout.queue(cursor::MoveTo(0, y))?;
                for x in 0..w {
                    let idx = y as usize * w as usize + x as usize;
                    let cell = frame.cell_at_index(idx);
                    let fg = self.fg_of(cell);
                    self.pen_to(&mut pen, fg, cell.bold)?;
                    self.stdout.queue(Print(cell.ch))?;
                    last[idx] = cell;
                }
            }
            self.last = Some((w, h, last));
            return self.finish(frame);
        }

        let Some((_, _, mut last)) = self.last.take() else {
            return self.finish(frame);
        };
        if let Some(bg) = self.bg {
            self.stdout.queue(SetBackgroundColor(bg))?;
        }

        if self.rows.len() != h as usize {
            self.rows = vec![Vec::new(); h as usize];
        }
        let width = w as usize;
        for &idx in frame.dirty_indices() {
            if let Some(row) = self.rows.get_mut(idx / width) {
                row.push(idx);
            }
        }

        let mut rows = std::mem::take(&mut self.rows);
        for (y, row) in rows.iter_mut().enumerate() {
            if row.is_empty() {
                continue;
            }
            row.sort_unstable();
            let y = y as u16;
            let mut i = 0usize;
            while i < row.len() {
                let idx0 = row[i];
                let cell0 = frame.cell_at_index(idx0);
                if last[idx0] == cell0 {
                    i += 1;
                    continue;
                }
                last[idx0] = cell0;
                let fg0 = self.fg_of(cell0);

                self.run_buf.clear();
                self.run_buf.push(cell0.ch);
                let mut run_len: u16 = 1;
                let mut j = i + 1;
                while j < row.len() && row[j] == idx0 + run_len as usize {
                    let cell = frame.cell_at_index(row[j]);
                    if last[row[j]] == cell || self.fg_of(cell) != fg0 || cell.bold != cell0.bold
                    {
                        break;
                    }
                    self.run_buf.push(cell.ch);
                    last[row[j]] = cell;
                    run_len = run_len.saturating_add(1);
                    j += 1;
                }

                let x0 = (idx0 % width) as u16;
                if pen.pos != Some((x0, y)) {
                    self.stdout.queue(cursor::MoveTo(x0, y))?;
                }
                self.pen_to(&mut pen, fg0, cell0.bold)?;
                self.stdout.queue(Print(self.run_buf.as_str()))?;
                let next_x = x0.saturating_add(run_len);
                pen.pos = (next_x < w).then_some((next_x, y));

                i = j;
            }
            row.clear();
        }
        self.rows = rows;
        self.last = Some((w, h, last));
        self.finish(frame)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.stdout.execute(SetAttribute(Attribute::Reset));
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::EnableLineWrap);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

/// Leaves the alternate screen and raw mode; safe to call from a panic
/// hook or signal path.
pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
