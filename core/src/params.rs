//! Chorus parameters and their conversion from control-surface positions.
//!
//! Control surfaces report positions on an integer `0..=100` scale. Values
//! outside that range are clamped (and logged) rather than rejected.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub const CONTROL_MIN: i32 = 0;
pub const CONTROL_MAX: i32 = 100;

pub const DEFAULT_DELAY_MS: u32 = 25;
pub const DEFAULT_DEPTH: f32 = 0.5;
pub const DEFAULT_LFO_RATE_HZ: f32 = 0.5;
pub const DEFAULT_FEEDBACK: f32 = 0.3;
pub const DEFAULT_MIX: f32 = 0.5;

/// Feedback at the top of the control range. Kept below 1.0 so the delay
/// line always decays.
pub const MAX_FEEDBACK: f32 = 0.99;

/// A snapshot of every chorus parameter in engine units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub delay_ms: u32,
    pub delay_s: f32,
    /// 0 to 1
    pub depth: f32,
    pub lfo_rate_hz: f32,
    /// 0 to `MAX_FEEDBACK`
    pub feedback: f32,
    /// Weight of the dry input in the output. 0 to 1
    pub mix: f32,
    pub enabled: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            delay_s: delay_ms_to_s(DEFAULT_DELAY_MS),
            depth: DEFAULT_DEPTH,
            lfo_rate_hz: DEFAULT_LFO_RATE_HZ,
            feedback: DEFAULT_FEEDBACK,
            mix: DEFAULT_MIX,
            enabled: false,
        }
    }
}

/// Parameters shared between the control context and the audio thread.
///
/// Each field is an independent atomic so a write from the control context
/// is never observed half-done. The audio thread takes one snapshot per
/// block.
pub struct SharedParams {
    delay_ms: AtomicU32,
    depth: AtomicF32,
    lfo_rate_hz: AtomicF32,
    feedback: AtomicF32,
    mix: AtomicF32,
    enabled: AtomicBool,
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl SharedParams {
    pub fn new(params: Params) -> Self {
        Self {
            delay_ms: AtomicU32::new(params.delay_ms),
            depth: AtomicF32::new(params.depth),
            lfo_rate_hz: AtomicF32::new(params.lfo_rate_hz),
            feedback: AtomicF32::new(params.feedback),
            mix: AtomicF32::new(params.mix),
            enabled: AtomicBool::new(params.enabled),
        }
    }

    pub fn snapshot(&self) -> Params {
        let delay_ms = self.delay_ms.load(Ordering::Relaxed);
        Params {
            delay_ms,
            delay_s: delay_ms_to_s(delay_ms),
            depth: self.depth.load(Ordering::Relaxed),
            lfo_rate_hz: self.lfo_rate_hz.load(Ordering::Relaxed),
            feedback: self.feedback.load(Ordering::Relaxed),
            mix: self.mix.load(Ordering::Relaxed),
            enabled: self.enabled.load(Ordering::Relaxed),
        }
    }

    pub fn set_delay_ms(&self, delay_ms: u32) {
        self.delay_ms.store(delay_ms, Ordering::Relaxed);
    }

    pub fn set_depth(&self, depth: f32) {
        self.depth.store(depth, Ordering::Relaxed);
    }

    pub fn set_lfo_rate_hz(&self, lfo_rate_hz: f32) {
        self.lfo_rate_hz.store(lfo_rate_hz, Ordering::Relaxed);
    }

    pub fn set_feedback(&self, feedback: f32) {
        self.feedback.store(feedback, Ordering::Relaxed);
    }

    pub fn set_mix(&self, mix: f32) {
        self.mix.store(mix, Ordering::Relaxed);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flips the enabled flag and returns the new state.
    pub fn toggle_enabled(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

pub fn delay_ms_to_s(delay_ms: u32) -> f32 {
    delay_ms as f32 / 1000.0
}

/// Brings a raw control position into `CONTROL_MIN..=CONTROL_MAX`.
pub fn clamp_control(name: &str, value: i32) -> i32 {
    if !(CONTROL_MIN..=CONTROL_MAX).contains(&value) {
        log::warn!(
            "{name} control value {value} is outside {CONTROL_MIN}..={CONTROL_MAX}, clamping"
        );
    }
    value.clamp(CONTROL_MIN, CONTROL_MAX)
}

fn control_01(name: &str, value: i32) -> f32 {
    clamp_control(name, value) as f32 / 100.0
}

/// The delay slider is calibrated in whole milliseconds.
pub fn delay_ms_from_control(value: i32) -> u32 {
    clamp_control("delay", value) as u32
}

pub fn depth_from_control(value: i32) -> f32 {
    control_01("depth", value)
}

pub fn lfo_rate_hz_from_control(value: i32) -> f32 {
    control_01("lfo rate", value)
}

pub fn feedback_from_control(value: i32) -> f32 {
    control_01("feedback", value).min(MAX_FEEDBACK)
}

pub fn mix_from_control(value: i32) -> f32 {
    control_01("mix", value)
}
