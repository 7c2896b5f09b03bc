use crate::{
    config::EngineConfig,
    controller::ChorusController,
    delay_buffer::DelayBuffer,
    lfo::Lfo,
    params::{Params, SharedParams},
    stereo::Stereo,
};
use rtrb::{Consumer, Producer, PushError, RingBuffer};
use std::sync::Arc;

/// Number of delay buffers that may be in flight between the controller and
/// the audio thread, in each direction.
pub const HANDOFF_QUEUE_CAPACITY: usize = 8;

/// The audio-thread half of the chorus. Owns all DSP state.
///
/// Each block of `block_size` frames:
///  - passes the input through untouched if the chorus is disabled,
///  - otherwise feeds the input into the head of the delay buffer (with
///    feedback from its previous contents), mixes the result with the dry
///    input and writes it to both output channels, then advances the LFO.
///
/// The LFO-derived read offset is computed and clamped each block but is not
/// applied to the read position; the delayed signal is always read from the
/// head of the buffer. See `modulation_offset`.
///
/// Nothing in the processing path allocates or blocks.
pub struct ChorusEngine {
    params: Arc<SharedParams>,
    delay_buffer: DelayBuffer,
    lfo: Lfo,
    incoming_buffers: Consumer<DelayBuffer>,
    retired_buffers: Producer<DelayBuffer>,
    sample_rate_hz: u32,
    block_size: usize,
    modulation_offset: i64,
    // per-block scratch, sized once to `block_size`
    mono: Vec<f32>,
    wet: Vec<f32>,
}

impl ChorusEngine {
    /// Creates the engine along with the controller used to change its
    /// parameters from another thread.
    pub fn new(
        config: EngineConfig,
    ) -> anyhow::Result<(Self, ChorusController)> {
        config.validate()?;
        let params = Arc::new(SharedParams::default());
        let initial = params.snapshot();
        let delay_buffer = DelayBuffer::try_zeroed(DelayBuffer::len_for(
            initial.delay_ms,
            config.sample_rate_hz,
            config.block_size,
        ))?;
        let (publish, incoming_buffers) =
            RingBuffer::new(HANDOFF_QUEUE_CAPACITY);
        let (retired_buffers, reclaim) = RingBuffer::new(HANDOFF_QUEUE_CAPACITY);
        log::info!(
            "chorus engine: {} Hz, {} frame blocks ({:.1} ms)",
            config.sample_rate_hz,
            config.block_size,
            config.block_duration_s() * 1000.0,
        );
        let engine = Self {
            params: Arc::clone(&params),
            delay_buffer,
            lfo: Lfo::new(),
            incoming_buffers,
            retired_buffers,
            sample_rate_hz: config.sample_rate_hz,
            block_size: config.block_size,
            modulation_offset: 0,
            mono: vec![0.0; config.block_size],
            wet: vec![0.0; config.block_size],
        };
        let controller =
            ChorusController::new(config, params, publish, reclaim);
        Ok((engine, controller))
    }

    /// Switches to the most recently published delay buffer, if any. Every
    /// buffer that is replaced or skipped goes back to the controller to be
    /// freed.
    fn adopt_published_buffer(&mut self) {
        while let Ok(buffer) = self.incoming_buffers.pop() {
            let retired = std::mem::replace(&mut self.delay_buffer, buffer);
            if let Err(PushError::Full(retired)) =
                self.retired_buffers.push(retired)
            {
                log::warn!(
                    "retired delay buffer queue is full, freeing {} samples on the audio thread",
                    retired.len()
                );
            }
        }
    }

    /// Processes a mono input into stereo output. Input longer than the
    /// block size is handled as consecutive blocks. Output frames past the
    /// end of the input are silenced.
    pub fn process(
        &mut self,
        input: &[f32],
        output: Stereo<&mut [f32], &mut [f32]>,
    ) {
        let Stereo { left, right } = output;
        let num_frames = input.len().min(left.len()).min(right.len());
        self.adopt_published_buffer();
        let params = self.params.snapshot();
        if params.enabled {
            for start in (0..num_frames).step_by(self.block_size) {
                let end = (start + self.block_size).min(num_frames);
                let len = end - start;
                self.mono[..len].copy_from_slice(&input[start..end]);
                self.process_block(&params, len);
                left[start..end].copy_from_slice(&self.wet[..len]);
                right[start..end].copy_from_slice(&self.wet[..len]);
            }
        } else {
            left[..num_frames].copy_from_slice(&input[..num_frames]);
            right[..num_frames].copy_from_slice(&input[..num_frames]);
        }
        left[num_frames..].fill(0.0);
        right[num_frames..].fill(0.0);
    }

    /// Processes interleaved audio as delivered by an audio driver.
    ///
    /// When disabled, output channel `c` is a copy of input channel
    /// `c % input_channels`. When enabled, the first input channel is the
    /// source and the wet signal is written to every output channel.
    pub fn process_interleaved(
        &mut self,
        input: &[f32],
        input_channels: usize,
        output: &mut [f32],
        output_channels: usize,
    ) {
        if input_channels == 0 || output_channels == 0 {
            output.fill(0.0);
            return;
        }
        let num_frames =
            (input.len() / input_channels).min(output.len() / output_channels);
        self.adopt_published_buffer();
        let params = self.params.snapshot();
        let input_frames = input.chunks_exact(input_channels).take(num_frames);
        let output_frames =
            output.chunks_exact_mut(output_channels).take(num_frames);
        if params.enabled {
            let mut input_frames = input_frames;
            let mut output_frames = output_frames;
            let mut remaining = num_frames;
            while remaining > 0 {
                let len = remaining.min(self.block_size);
                for (mono, frame) in
                    self.mono[..len].iter_mut().zip(input_frames.by_ref())
                {
                    *mono = frame[0];
                }
                self.process_block(&params, len);
                for (&wet, frame) in
                    self.wet[..len].iter().zip(output_frames.by_ref())
                {
                    frame.fill(wet);
                }
                remaining -= len;
            }
        } else {
            for (in_frame, out_frame) in input_frames.zip(output_frames) {
                for (channel, sample) in out_frame.iter_mut().enumerate() {
                    *sample = in_frame[channel % input_channels];
                }
            }
        }
        output[num_frames * output_channels..].fill(0.0);
    }

    /// Runs one block over `self.mono[..num_frames]`, leaving the result in
    /// `self.wet[..num_frames]`.
    fn process_block(&mut self, params: &Params, num_frames: usize) {
        let Self {
            delay_buffer,
            lfo,
            mono,
            wet,
            modulation_offset,
            block_size,
            sample_rate_hz,
            ..
        } = self;
        let input = &mono[..num_frames];
        let offset = (params.depth * *block_size as f32 * lfo.value()) as i64;
        *modulation_offset = delay_buffer.clamp_offset(offset);
        delay_buffer.write_block(input, params.feedback);
        for ((wet, &dry), &delayed) in wet[..num_frames]
            .iter_mut()
            .zip(input)
            .zip(delay_buffer.head(num_frames))
        {
            *wet = (params.mix * dry) + ((1.0 - params.mix) * delayed);
        }
        lfo.advance(params.lfo_rate_hz, num_frames, *sample_rate_hz);
    }

    /// The read offset derived from the LFO for the most recent block,
    /// clamped to the delay buffer. It is not used to index the delay
    /// buffer.
    pub fn modulation_offset(&self) -> i64 {
        self.modulation_offset
    }

    pub fn delay_buffer(&self) -> &DelayBuffer {
        &self.delay_buffer
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    pub fn params(&self) -> Params {
        self.params.snapshot()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stereo::StereoPair;

    fn small_engine() -> (ChorusEngine, ChorusController) {
        ChorusEngine::new(EngineConfig {
            sample_rate_hz: 1000,
            block_size: 4,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn initial_buffer_matches_default_delay() {
        let (engine, _controller) =
            ChorusEngine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.delay_buffer().len(), 1102 + 8192);
        assert!(engine.delay_buffer().is_silent());
    }

    #[test]
    fn long_input_is_split_into_blocks() {
        let (mut engine, mut controller) = small_engine();
        controller.set_enabled(true);
        controller.set_feedback(50);
        controller.set_mix(0);
        let input = [1.0; 10];
        let mut output = StereoPair::silence(10);
        engine.process(&input, output.as_mut_slices());
        // blocks of 4, 4 and 2 frames; each block reads back the head of the
        // delay buffer, so later blocks see the feedback of earlier ones
        assert_eq!(
            output.left,
            vec![1.0, 1.0, 1.0, 1.0, 1.5, 1.5, 1.5, 1.5, 1.75, 1.75]
        );
        assert_eq!(output.left, output.right);
        let expected_phase = 0.5 * 10.0 / 1000.0;
        assert!((engine.lfo().phase() - expected_phase).abs() < 1e-12);
    }

    #[test]
    fn short_output_gets_only_available_frames() {
        let (mut engine, _controller) = small_engine();
        let input = [0.25; 3];
        let mut left = [9.0; 5];
        let mut right = [9.0; 5];
        engine.process(&input, Stereo::new(&mut left[..], &mut right[..]));
        assert_eq!(left, [0.25, 0.25, 0.25, 0.0, 0.0]);
        assert_eq!(right, left);
    }

    #[test]
    fn interleaved_pass_through_maps_channels() {
        let (mut engine, _controller) = small_engine();
        let input = [1.0, 2.0, 3.0, 4.0];
        let mut output = [0.0; 4];
        engine.process_interleaved(&input, 2, &mut output, 2);
        assert_eq!(output, input);

        let mono_input = [1.0, 2.0];
        let mut stereo_output = [0.0; 4];
        engine.process_interleaved(&mono_input, 1, &mut stereo_output, 2);
        assert_eq!(stereo_output, [1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn interleaved_wet_uses_first_channel() {
        let (mut engine, mut controller) = small_engine();
        controller.set_enabled(true);
        controller.set_mix(50);
        controller.set_feedback(0);
        // right channel is ignored when the chorus is on
        let input = [1.0, -7.0, 0.5, -7.0, 0.0, -7.0];
        let mut output = [0.0; 6];
        engine.process_interleaved(&input, 2, &mut output, 2);
        assert_eq!(output, [1.0, 1.0, 0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn zero_channels_produce_silence() {
        let (mut engine, _controller) = small_engine();
        let mut output = [1.0; 4];
        engine.process_interleaved(&[1.0; 4], 0, &mut output, 2);
        assert_eq!(output, [0.0; 4]);
    }

    #[test]
    fn published_buffer_is_adopted_at_block_boundary() {
        let (mut engine, mut controller) = small_engine();
        controller.set_delay_ms(10).unwrap();
        // not picked up until the next call
        assert_eq!(engine.delay_buffer().len(), 25 + 4);
        let mut output = StereoPair::silence(4);
        engine.process(&[0.0; 4], output.as_mut_slices());
        assert_eq!(engine.delay_buffer().len(), 10 + 4);
    }
}
