use std::f64::consts::TAU;

/// Sine LFO advanced once per block.
///
/// The phase is measured in cycles and is never wrapped. It is kept in `f64`
/// so that a long-running session doesn't lose resolution as it grows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Lfo {
    phase: f64,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value in `-1.0..=1.0`.
    pub fn value(&self) -> f32 {
        (TAU * self.phase).sin() as f32
    }

    pub fn advance(
        &mut self,
        rate_hz: f32,
        num_frames: usize,
        sample_rate_hz: u32,
    ) {
        self.phase +=
            rate_hz as f64 * num_frames as f64 / sample_rate_hz as f64;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let lfo = Lfo::new();
        assert_eq!(lfo.phase(), 0.0);
        assert_eq!(lfo.value(), 0.0);
    }

    #[test]
    fn advance_by_block() {
        let mut lfo = Lfo::new();
        lfo.advance(0.5, 8192, 44100);
        assert!((lfo.phase() - (0.5 * 8192.0 / 44100.0)).abs() < 1e-12);
    }

    #[test]
    fn quarter_cycle_peaks() {
        let mut lfo = Lfo::new();
        lfo.advance(1.0, 11025, 44100);
        assert!((lfo.value() - 1.0).abs() < 1e-6);
        lfo.advance(1.0, 22050, 44100);
        assert!((lfo.value() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn phase_is_not_wrapped() {
        let mut lfo = Lfo::new();
        for _ in 0..10 {
            lfo.advance(1.0, 44100, 44100);
        }
        assert!((lfo.phase() - 10.0).abs() < 1e-9);
        assert!(lfo.value().abs() < 1e-6);
    }

    #[test]
    fn zero_rate_stands_still() {
        let mut lfo = Lfo::new();
        lfo.advance(0.0, 8192, 44100);
        assert_eq!(lfo.phase(), 0.0);
    }
}
