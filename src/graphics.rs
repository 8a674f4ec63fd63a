//! Animation drivers.
//!
//! Purely observational: the engine resets and advances animations so a
//! renderer can ask for the current frame, but no game logic ever reads
//! them. Sprite decoding and compositing live outside this crate; the
//! library loader only supplies a frame count per state.

use serde::{Deserialize, Serialize};

use crate::core::Command;

/// Animation parameters from a state's `config.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// Playback rate.
    #[serde(default = "default_fps")]
    pub frames_per_sec: f64,

    /// Whether the animation wraps around or holds its last frame.
    #[serde(default = "default_loop")]
    pub is_loop: bool,
}

fn default_fps() -> f64 {
    6.0
}

fn default_loop() -> bool {
    true
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            frames_per_sec: default_fps(),
            is_loop: default_loop(),
        }
    }
}

/// Frame-index animation for one automaton state.
#[derive(Clone, Debug)]
pub struct Animation {
    frame_count: usize,
    frames_per_sec: f64,
    is_loop: bool,
    start_ms: u64,
    current: usize,
}

impl Animation {
    /// `frame_count` must be at least 1; the library loader rejects
    /// states with no frames before constructing one.
    #[must_use]
    pub fn new(frame_count: usize, cfg: &GraphicsConfig) -> Self {
        Self {
            frame_count: frame_count.max(1),
            frames_per_sec: cfg.frames_per_sec,
            is_loop: cfg.is_loop,
            start_ms: 0,
            current: 0,
        }
    }

    /// Restart from the first frame at the command's timestamp.
    pub fn reset(&mut self, cmd: &Command) {
        self.start_ms = cmd.timestamp_ms;
        self.current = 0;
    }

    /// Advance to the frame for `now_ms`.
    pub fn update(&mut self, now_ms: u64) {
        let elapsed_s = now_ms.saturating_sub(self.start_ms) as f64 / 1000.0;
        let frame = (elapsed_s * self.frames_per_sec) as usize;
        self.current = if self.is_loop {
            frame % self.frame_count
        } else {
            frame.min(self.frame_count - 1)
        };
    }

    /// Index of the frame to draw.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Number of frames in the sheet.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}
