use crate::{
    config::{EngineConfig, Locale},
    delay_buffer::DelayBuffer,
    engine::HANDOFF_QUEUE_CAPACITY,
    params::{self, Params, SharedParams},
};
use anyhow::Context;
use rtrb::{Consumer, Producer};
use std::sync::Arc;

/// Display strings for every parameter, in control-surface order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub delay: String,
    pub depth: String,
    pub lfo_rate: String,
    pub feedback: String,
    pub mix: String,
    pub enabled: String,
}

impl Labels {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            &self.delay,
            &self.depth,
            &self.lfo_rate,
            &self.feedback,
            &self.mix,
            &self.enabled,
        ]
        .into_iter()
        .map(String::as_str)
    }
}

/// The control-context half of the engine. Every parameter change goes
/// through here.
///
/// Scalar parameters are written straight into the shared atomics. A delay
/// change needs a new delay buffer: it is allocated here, published to the
/// audio thread through a lock-free queue, and picked up at the next block
/// boundary. Buffers the audio thread no longer needs come back through a
/// second queue and are freed here.
pub struct ChorusController {
    params: Arc<SharedParams>,
    publish: Producer<DelayBuffer>,
    reclaim: Consumer<DelayBuffer>,
    config: EngineConfig,
}

impl ChorusController {
    pub(crate) fn new(
        config: EngineConfig,
        params: Arc<SharedParams>,
        publish: Producer<DelayBuffer>,
        reclaim: Consumer<DelayBuffer>,
    ) -> Self {
        Self {
            params,
            publish,
            reclaim,
            config,
        }
    }

    /// Frees any buffers the audio thread has finished with.
    fn reclaim_retired_buffers(&mut self) -> usize {
        let mut count = 0;
        while let Ok(buffer) = self.reclaim.pop() {
            drop(buffer);
            count += 1;
        }
        count
    }

    /// Sets the delay time from a control position in milliseconds and
    /// replaces the delay buffer with a zeroed one of matching length.
    ///
    /// On failure the previous buffer and delay time stay in effect.
    pub fn set_delay_ms(&mut self, control: i32) -> anyhow::Result<String> {
        let reclaimed = self.reclaim_retired_buffers();
        if reclaimed > 0 {
            log::debug!("released {reclaimed} retired delay buffer(s)");
        }
        let delay_ms = params::delay_ms_from_control(control);
        if self.publish.is_full() {
            anyhow::bail!(
                "cannot change delay to {delay_ms} ms: {HANDOFF_QUEUE_CAPACITY} delay buffers are still waiting for the audio thread"
            );
        }
        let len = DelayBuffer::len_for(
            delay_ms,
            self.config.sample_rate_hz,
            self.config.block_size,
        );
        let buffer = DelayBuffer::try_zeroed(len)
            .with_context(|| format!("cannot change delay to {delay_ms} ms"))?;
        if self.publish.push(buffer).is_err() {
            anyhow::bail!(
                "cannot change delay to {delay_ms} ms: delay buffer queue is full"
            );
        }
        self.params.set_delay_ms(delay_ms);
        log::debug!("delay set to {delay_ms} ms ({len} samples)");
        Ok(self.locale().delay_label(params::delay_ms_to_s(delay_ms)))
    }

    pub fn set_depth(&mut self, control: i32) -> String {
        let depth = params::depth_from_control(control);
        self.params.set_depth(depth);
        self.locale().depth_label(depth)
    }

    pub fn set_lfo_rate(&mut self, control: i32) -> String {
        let lfo_rate_hz = params::lfo_rate_hz_from_control(control);
        self.params.set_lfo_rate_hz(lfo_rate_hz);
        self.locale().lfo_rate_label(lfo_rate_hz)
    }

    pub fn set_feedback(&mut self, control: i32) -> String {
        let feedback = params::feedback_from_control(control);
        self.params.set_feedback(feedback);
        self.locale().feedback_label(feedback)
    }

    pub fn set_mix(&mut self, control: i32) -> String {
        let mix = params::mix_from_control(control);
        self.params.set_mix(mix);
        self.locale().mix_label(mix)
    }

    pub fn toggle_enabled(&mut self) -> String {
        let enabled = self.params.toggle_enabled();
        log::debug!("chorus {}", if enabled { "enabled" } else { "disabled" });
        self.locale().enabled_label(enabled)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> String {
        self.params.set_enabled(enabled);
        self.locale().enabled_label(enabled)
    }

    pub fn params(&self) -> Params {
        self.params.snapshot()
    }

    pub fn labels(&self) -> Labels {
        let params = self.params();
        let locale = self.locale();
        Labels {
            delay: locale.delay_label(params.delay_s),
            depth: locale.depth_label(params.depth),
            lfo_rate: locale.lfo_rate_label(params.lfo_rate_hz),
            feedback: locale.feedback_label(params.feedback),
            mix: locale.mix_label(params.mix),
            enabled: locale.enabled_label(params.enabled),
        }
    }

    pub fn locale(&self) -> Locale {
        self.config.locale
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
