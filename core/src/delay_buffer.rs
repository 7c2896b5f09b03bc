use anyhow::Context;

/// Stored samples smaller than this in magnitude are flushed to zero so a
/// decaying feedback tail ends in silence instead of lingering as subnormals.
const FLUSH_TO_ZERO: f32 = f32::MIN_POSITIVE;

/// Sample store for the chorus delay line.
///
/// The buffer holds one block plus the configured delay tail. Only the head
/// region (the first block) is read and written while processing; the tail
/// exists so the length tracks the delay time. A new delay time means a new
/// buffer, built off the audio thread and handed over whole.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayBuffer(Vec<f32>);

impl DelayBuffer {
    /// Number of samples needed for a delay of `delay_ms` milliseconds
    /// followed by a block of `block_size` frames.
    pub fn len_for(delay_ms: u32, sample_rate_hz: u32, block_size: usize) -> usize {
        let tail = (delay_ms as u64 * sample_rate_hz as u64) / 1000;
        tail as usize + block_size
    }

    /// Allocates a zero-filled buffer. Allocation failure is reported rather
    /// than aborting the process.
    pub fn try_zeroed(len: usize) -> anyhow::Result<Self> {
        let mut samples = Vec::new();
        samples.try_reserve_exact(len).with_context(|| {
            format!("failed to allocate a delay buffer of {len} samples")
        })?;
        samples.resize(len, 0.0);
        Ok(Self(samples))
    }

    /// Replaces the contents with `len` zeros. The old samples are only
    /// released once the new storage exists, so on error the buffer is
    /// unchanged.
    ///
    /// This allocates; don't call it on the audio thread.
    pub fn resize(&mut self, len: usize) -> anyhow::Result<()> {
        *self = Self::try_zeroed(len)?;
        Ok(())
    }

    /// Feeds `input` into the head of the buffer, adding `feedback` times the
    /// previous contents of each slot. Input beyond the buffer length is
    /// ignored.
    pub fn write_block(&mut self, input: &[f32], feedback: f32) {
        for (stored, &sample) in self.0.iter_mut().zip(input) {
            let value = sample + (feedback * *stored);
            *stored = if value.abs() < FLUSH_TO_ZERO { 0.0 } else { value };
        }
    }

    /// The first `num_samples` samples (or the whole buffer if shorter).
    pub fn head(&self, num_samples: usize) -> &[f32] {
        &self.0[..num_samples.min(self.0.len())]
    }

    /// Limits a read offset to the last index of the buffer.
    pub fn clamp_offset(&self, offset: i64) -> i64 {
        let last = self.0.len().saturating_sub(1) as i64;
        if offset >= last {
            last
        } else {
            offset
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.0.iter().all(|&sample| sample == 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn len_includes_delay_tail_and_block() {
        assert_eq!(DelayBuffer::len_for(25, 44100, 8192), 1102 + 8192);
        assert_eq!(DelayBuffer::len_for(50, 44100, 8192), 2205 + 8192);
        assert_eq!(DelayBuffer::len_for(10, 44100, 8192), 441 + 8192);
        assert_eq!(DelayBuffer::len_for(0, 44100, 8192), 8192);
    }

    #[test]
    fn new_buffer_is_silent() {
        let buffer = DelayBuffer::try_zeroed(100).unwrap();
        assert_eq!(buffer.len(), 100);
        assert!(buffer.is_silent());
    }

    #[test]
    fn impossible_allocation_is_an_error() {
        assert!(DelayBuffer::try_zeroed(usize::MAX).is_err());
    }

    #[test]
    fn failed_resize_keeps_contents() {
        let mut buffer = DelayBuffer::try_zeroed(4).unwrap();
        buffer.write_block(&[1.0, 2.0], 0.0);
        assert!(buffer.resize(usize::MAX).is_err());
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn resize_zero_fills() {
        let mut buffer = DelayBuffer::try_zeroed(4).unwrap();
        buffer.write_block(&[1.0; 4], 0.5);
        buffer.resize(6).unwrap();
        assert_eq!(buffer.len(), 6);
        assert!(buffer.is_silent());
    }

    #[test]
    fn write_uses_previous_contents_for_feedback() {
        let mut buffer = DelayBuffer::try_zeroed(6).unwrap();
        buffer.write_block(&[1.0, 1.0, 1.0], 0.5);
        assert_eq!(buffer.head(3), &[1.0, 1.0, 1.0]);
        buffer.write_block(&[1.0, 0.0, -1.0], 0.5);
        assert_eq!(buffer.head(3), &[1.5, 0.5, -0.5]);
        // the tail is never touched
        assert_eq!(&buffer.as_slice()[3..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn feedback_tail_decays_to_exact_zero() {
        let mut buffer = DelayBuffer::try_zeroed(2).unwrap();
        buffer.write_block(&[1.0, -1.0], 0.0);
        for _ in 0..10_000 {
            buffer.write_block(&[0.0, 0.0], 0.99);
            assert!(buffer.as_slice().iter().all(|s| !s.is_subnormal()));
        }
        assert!(buffer.is_silent());
    }

    #[test]
    fn write_longer_than_buffer_is_truncated() {
        let mut buffer = DelayBuffer::try_zeroed(2).unwrap();
        buffer.write_block(&[1.0, 2.0, 3.0], 0.0);
        assert_eq!(buffer.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn offsets_past_the_end_are_clamped() {
        let buffer = DelayBuffer::try_zeroed(10).unwrap();
        assert_eq!(buffer.clamp_offset(3), 3);
        assert_eq!(buffer.clamp_offset(9), 9);
        assert_eq!(buffer.clamp_offset(10), 9);
        assert_eq!(buffer.clamp_offset(1000), 9);
        assert_eq!(buffer.clamp_offset(-5), -5);
    }
}
