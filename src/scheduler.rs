// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

pub const DEFAULT_FPS: f64 = 60.0;
pub const MIN_FPS: f64 = 1.0;
pub const MAX_FPS: f64 = 240.0;

/// Fixed-interval frame clock. The host asks how long to wait, then calls
/// [`FrameScheduler::begin_frame`] to get the delta to feed the field.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    period: Duration,
    next_frame: Instant,
    last_frame: Option<Instant>,
    running: bool,
    frames: u64,
}

impl FrameScheduler {
    pub fn new(fps: f64, now: Instant) -> Self {
        let fps = if fps.is_finite() {
            fps.clamp(MIN_FPS, MAX_FPS)
        } else {
            DEFAULT_FPS
        };
        Self {
            period: Duration::from_secs_f64(1.0 / fps),
            next_frame: now,
            last_frame: None,
            running: true,
            frames: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns false when already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.next_frame = now;
        // Time spent stopped is not simulated.
        self.last_frame = None;
        true
    }

    /// Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// How long until the next frame is due. `None` while stopped.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        if !self.running {
            return None;
        }
        Some(self.next_frame.saturating_duration_since(now))
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.running && now >= self.next_frame
    }

    /// Marks a frame as started and returns the time since the previous
    /// one (one period for the first frame after a start).
    pub fn begin_frame(&mut self, now: Instant) -> Duration {
        let dt = match self.last_frame {
            Some(prev) => now.saturating_duration_since(prev),
            None => self.period,
        };
        self.last_frame = Some(now);
        self.frames = self.frames.saturating_add(1);

        self.next_frame += self.period;
        if self.next_frame <= now {
            self.next_frame = now + self.period;
        }
        dt
    }
}
