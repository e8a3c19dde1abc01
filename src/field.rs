// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    Rng, SeedableRng,
};
use tracing::{debug, info, trace};

use crate::droplet::{DrawCtx, Droplet, BASELINE_FRAME_MS, TRAIL_FLOOR};
use crate::palette::Rgb;
use crate::settings::{Derived, Settings};
use crate::surface::{Rect, RenderSurface};

/// Alpha of the black overlay composited over the previous frame.
pub const TRAIL_ALPHA: f32 = 0.05;

/// Chance per tick that a drop's head is drawn in the highlight color.
pub const HEAD_HIGHLIGHT_PCT: f32 = 0.3;

/// Per-glyph mutation chance at the head; scaled down along the trail.
pub const MUTATION_RATE: f32 = 0.2;

pub const DEFAULT_MAX_SIM_DELTA: Duration = Duration::from_millis(250);

const MIN_LEN: usize = 5;
const MAX_LEN: usize = 35;
const MUTATION_MS_LOW: f32 = 50.0;
const MUTATION_MS_HIGH: f32 = 200.0;
const RESET_SPAN_CELLS: f32 = 12.5;
const POOL_CAP: usize = 64;
const COLUMN_TRIES: usize = 8;

/// All random draws of the field. Owning them in one place keeps a run
/// reproducible from its seed.
struct Spawner {
    rng: StdRng,
    rand_chance: Uniform<f32>,
    rand_len: Uniform<usize>,
    rand_mutation_ms: Uniform<f32>,
    rand_speed: Uniform<f32>,
    rand_glyph: Uniform<usize>,
    glyphs: Vec<char>,
}

impl Spawner {
    fn new(seed: u64, derived: &Derived) -> Self {
        let mut s = Self {
            rng: StdRng::seed_from_u64(seed),
            rand_chance: Uniform::new(0.0, 1.0).expect("valid range"),
            rand_len: Uniform::new_inclusive(MIN_LEN, MAX_LEN).expect("valid range"),
            rand_mutation_ms: Uniform::new_inclusive(MUTATION_MS_LOW, MUTATION_MS_HIGH)
                .expect("valid range"),
            rand_speed: Uniform::new_inclusive(1.0, 1.0).expect("valid range"),
            rand_glyph: Uniform::new_inclusive(0, 0).expect("valid range"),
            glyphs: vec!['0'],
        };
        s.configure(derived);
        s
    }

    fn configure(&mut self, derived: &Derived) {
        let (lo, hi) = derived.speed_px;
        self.rand_speed = Uniform::new_inclusive(lo, hi.max(lo)).expect("valid range");
        self.glyphs = if derived.glyphs.is_empty() {
            vec!['0', '1']
        } else {
            derived.glyphs.clone()
        };
        self.rand_glyph =
            Uniform::new_inclusive(0, self.glyphs.len() - 1).expect("valid range");
    }

    fn chance(&mut self) -> f32 {
        self.rand_chance.sample(&mut self.rng)
    }

    fn speed(&mut self) -> f32 {
        self.rand_speed.sample(&mut self.rng)
    }

    fn glyph(&mut self) -> char {
        self.glyphs[self.rand_glyph.sample(&mut self.rng)]
    }

    /// Random column, preferring ones nobody occupies.
    fn column(&mut self, columns: u32, occupancy: &[u16]) -> u32 {
        if columns == 0 {
            return 0;
        }
        let mut col = 0;
        for _ in 0..COLUMN_TRIES {
            col = self.rng.random_range(0..columns);
            if occupancy.get(col as usize).copied().unwrap_or(0) == 0 {
                break;
            }
        }
        col
    }

    fn fill(&mut self, d: &mut Droplet, column: u32, head_y: f32, now_ms: f64) {
        let len = self.rand_len.sample(&mut self.rng);
        d.column = column;
        d.head_y = head_y;
        d.speed = self.speed();
        d.glyphs.clear();
        for _ in 0..len {
            let g = self.glyph();
            d.glyphs.push(g);
        }
        d.opacity = 1.0;
        d.head_highlight = false;
        d.mutation_interval_ms = self.rand_mutation_ms.sample(&mut self.rng);
        d.next_mutation_ms = now_ms + d.mutation_interval_ms as f64;
    }

    fn mutate(&mut self, d: &mut Droplet, now_ms: f64) {
        let len = d.glyphs.len();
        for i in 0..len {
            let weight = (1.0 - i as f32 / len as f32).max(TRAIL_FLOOR);
            if self.chance() < MUTATION_RATE * weight {
                d.glyphs[i] = self.glyph();
            }
        }
        d.next_mutation_ms = now_ms + d.mutation_interval_ms as f64;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldStats {
    pub columns: u32,
    pub active: usize,
    pub target: usize,
    pub pooled: usize,
    pub visible: usize,
    pub ticks: u64,
    pub resets: u64,
}

/// The drop simulation: owns every drop, advances them once per tick and
/// renders them with a fading trail.
pub struct DropField {
    width: u32,
    height: u32,
    columns: u32,

    settings: Settings,
    derived: Derived,
    pending: Option<Settings>,

    drops: Vec<Droplet>,
    pool: Vec<Droplet>,
    occupancy: Vec<u16>,

    spawner: Spawner,

    clock_ms: f64,
    max_sim_delta: Duration,
    running: bool,

    ticks: u64,
    resets: u64,
}

impl DropField {
    pub fn new(settings: Settings, seed: u64) -> Self {
        let derived = settings.derive();
        let spawner = Spawner::new(seed, &derived);
        Self {
            width: 0,
            height: 0,
            columns: 0,
            settings,
            derived,
            pending: None,
            drops: Vec::new(),
            pool: Vec::new(),
            occupancy: Vec::new(),
            spawner,
            clock_ms: 0.0,
            max_sim_delta: DEFAULT_MAX_SIM_DELTA,
            running: true,
            ticks: 0,
            resets: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn drops(&self) -> &[Droplet] {
        &self.drops
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn target_drops(&self) -> usize {
        (self.columns as f32 * self.derived.density).floor() as usize
    }

    pub fn set_max_sim_delta(&mut self, d: Duration) {
        self.max_sim_delta = d;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        info!(drops = self.drops.len(), "field stopped");
        true
    }

    /// Returns false when already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        info!(drops = self.drops.len(), "field started");
        true
    }

    /// Queues a settings record. It replaces the active one as a whole at
    /// the start of the next tick, so no frame mixes old and new values.
    pub fn apply_settings(&mut self, settings: Settings) {
        debug!(?settings, "settings queued");
        self.pending = Some(settings);
    }

    pub fn has_pending_settings(&self) -> bool {
        self.pending.is_some()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        debug!(width, height, "field resized");
        self.width = width;
        self.height = height;
        self.relayout();
    }

    /// Throws every drop away and starts a fresh, staggered field.
    pub fn restart(&mut self) {
        let old = std::mem::take(&mut self.drops);
        for d in old {
            self.recycle(d);
        }
        self.occupancy.iter_mut().for_each(|o| *o = 0);
        self.relayout();
    }

    pub fn stats(&self) -> FieldStats {
        let h = self.height as f32;
        let cell = self.derived.cell_px;
        FieldStats {
            columns: self.columns,
            active: self.drops.len(),
            target: self.target_drops(),
            pooled: self.pool.len(),
            visible: self.drops.iter().filter(|d| d.is_visible(h, cell)).count(),
            ticks: self.ticks,
            resets: self.resets,
        }
    }

    /// The frame callback: one tick then one render. Does nothing while
    /// stopped.
    pub fn frame(&mut self, dt: Duration, surface: &mut dyn RenderSurface) {
        if !self.running {
            return;
        }
        self.tick(dt);
        self.render(surface);
    }

    pub fn tick(&mut self, dt: Duration) {
        if let Some(next) = self.pending.take() {
            self.swap_settings(next);
        }
        self.ticks += 1;

        if self.width == 0 || self.height == 0 {
            return;
        }

        let dt = if self.max_sim_delta > Duration::ZERO {
            dt.min(self.max_sim_delta)
        } else {
            dt
        };
        let dt_ms = dt.as_secs_f64() * 1000.0;
        self.clock_ms += dt_ms;
        let now = self.clock_ms;
        let steps = dt_ms as f32 / BASELINE_FRAME_MS;

        let h = self.height as f32;
        let cell = self.derived.cell_px;
        let columns = self.columns;

        for d in self.drops.iter_mut() {
            d.advance(steps);

            if d.is_spent(h, cell) {
                if let Some(o) = self.occupancy.get_mut(d.column as usize) {
                    *o = o.saturating_sub(1);
                }
                let col = self.spawner.column(columns, &self.occupancy);
                let head_y = -(self.spawner.chance() * RESET_SPAN_CELLS * cell);
                self.spawner.fill(d, col, head_y, now);
                if let Some(o) = self.occupancy.get_mut(col as usize) {
                    *o = o.saturating_add(1);
                }
                d.generation = d.generation.wrapping_add(1);
                self.resets += 1;
                trace!(column = col, len = d.length(), "drop reset");
            } else if now >= d.next_mutation_ms {
                self.spawner.mutate(d, now);
            }

            d.update_fade(h);
            d.head_highlight = self.spawner.chance() < HEAD_HIGHLIGHT_PCT;
        }
    }

    /// Draws the current state. Draws nothing while the surface or the
    /// field has no area.
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        if !surface.is_available() || self.width == 0 || self.height == 0 {
            return;
        }

        let full = Rect::new(0.0, 0.0, surface.width() as f32, surface.height() as f32);
        surface.fill_rect(full, Rgb::BLACK, TRAIL_ALPHA);
        surface.set_font(self.derived.cell_px);

        let ctx = DrawCtx {
            cell_px: self.derived.cell_px,
            canvas_h: self.height as f32,
            color: self.derived.color,
            highlight: Rgb::WHITE,
            opacity: self.derived.opacity,
        };
        for d in &self.drops {
            d.draw(&ctx, surface);
        }
    }

    fn swap_settings(&mut self, next: Settings) {
        let derived = next.derive();
        let charset_changed = derived.character_set != self.derived.character_set;
        let speed_changed = derived.speed_px != self.derived.speed_px;
        let geometry_changed =
            derived.cell_px != self.derived.cell_px || derived.density != self.derived.density;

        self.spawner.configure(&derived);
        self.settings = next;
        self.derived = derived;

        if charset_changed || speed_changed {
            for d in self.drops.iter_mut() {
                if charset_changed {
                    for g in d.glyphs.iter_mut() {
                        *g = self.spawner.glyph();
                    }
                }
                if speed_changed {
                    d.speed = self.spawner.speed();
                }
            }
        }
        if geometry_changed {
            self.relayout();
        }

        info!(
            color = %self.derived.color,
            cell_px = self.derived.cell_px,
            density = self.derived.density,
            charset = self.derived.character_set.name(),
            "settings applied"
        );
    }

    /// Recomputes the column count and brings the drop collection to its
    /// target size, keeping every drop whose column is still valid.
    fn relayout(&mut self) {
        self.columns = if self.width == 0 || self.height == 0 {
            0
        } else {
            (self.width as f32 / self.derived.cell_px).floor() as u32
        };
        let target = self.target_drops();

        let old = std::mem::take(&mut self.drops);
        self.drops.reserve(target);
        for d in old {
            if d.column < self.columns && self.drops.len() < target {
                self.drops.push(d);
            } else {
                self.recycle(d);
            }
        }

        self.occupancy.clear();
        self.occupancy.resize(self.columns as usize, 0);
        for d in &self.drops {
            self.occupancy[d.column as usize] += 1;
        }

        let cell = self.derived.cell_px;
        while self.drops.len() < target {
            let mut d = self.pool.pop().unwrap_or_else(Droplet::new);
            let col = self.spawner.column(self.columns, &self.occupancy);
            let head_y = -(self.spawner.chance() * cell);
            self.spawner.fill(&mut d, col, head_y, self.clock_ms);
            d.generation = 0;
            self.occupancy[col as usize] += 1;
            self.drops.push(d);
        }

        debug!(
            columns = self.columns,
            drops = self.drops.len(),
            pooled = self.pool.len(),
            "drop pool laid out"
        );
    }

    fn recycle(&mut self, d: Droplet) {
        if self.pool.len() < POOL_CAP {
            self.pool.push(d);
        }
    }
}
