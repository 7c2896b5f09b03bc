use anyhow::{anyhow, Context};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BufferSize, Device, InputCallbackInfo, OutputCallbackInfo, SampleRate,
    StreamConfig, SupportedBufferSize,
};
use std::sync::Arc;

mod pump;
mod status;

use pump::BlockPump;
use status::SharedStatus;
pub use status::StatusFlags;

/// Which devices to open. `None` selects the host's default device.
#[derive(Debug, Clone, Default)]
pub struct DeviceSelection {
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub sample_rate_hz: u32,
    /// Used for both the input and output streams.
    pub channels: u16,
    /// Frames passed to the callback on every call.
    pub block_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceList {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

fn device_name(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "(no name)".to_string())
}

fn find_device(
    mut devices: impl Iterator<Item = Device>,
    name: &str,
) -> Option<Device> {
    devices.find(|device| device.name().is_ok_and(|n| n == name))
}

/// Requests a fixed buffer of `block_size` frames, limited to what the
/// device supports.
fn choose_buffer_size(
    supported: &SupportedBufferSize,
    block_size: usize,
) -> BufferSize {
    let ideal_buffer_size = u32::try_from(block_size).unwrap_or(u32::MAX);
    // Round down to a multiple of 4. alsa complains if the buffer size is
    // not evenly divisible by 4.
    let ideal_buffer_size = (ideal_buffer_size & !3).max(4);
    match supported {
        SupportedBufferSize::Range { min, max } => {
            BufferSize::Fixed(ideal_buffer_size.clamp(*min, (*max).max(*min)))
        }
        SupportedBufferSize::Unknown => BufferSize::Default,
    }
}

fn stream_config(
    supported: &SupportedBufferSize,
    settings: StreamSettings,
) -> StreamConfig {
    StreamConfig {
        channels: settings.channels,
        sample_rate: SampleRate(settings.sample_rate_hz),
        buffer_size: choose_buffer_size(supported, settings.block_size),
    }
}

/// An input stream and an output stream that run together. Dropping this
/// closes both.
pub struct DuplexStream {
    input: cpal::Stream,
    output: cpal::Stream,
}

impl DuplexStream {
    pub fn start(&self) -> anyhow::Result<()> {
        self.input.play().context("failed to start input stream")?;
        self.output.play().context("failed to start output stream")?;
        Ok(())
    }

    pub fn stop(&self) -> anyhow::Result<()> {
        self.input.pause().context("failed to stop input stream")?;
        self.output.pause().context("failed to stop output stream")?;
        Ok(())
    }
}

pub struct Player {
    input_device: Device,
    output_device: Device,
}

impl Player {
    pub fn new(selection: &DeviceSelection) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        log::info!("cpal host: {}", host.id().name());
        let input_device = match &selection.input {
            Some(name) => find_device(host.input_devices()?, name)
                .ok_or_else(|| anyhow!("no input device named {name:?}"))?,
            None => host
                .default_input_device()
                .ok_or(anyhow!("no input device"))?,
        };
        let output_device = match &selection.output {
            Some(name) => find_device(host.output_devices()?, name)
                .ok_or_else(|| anyhow!("no output device named {name:?}"))?,
            None => host
                .default_output_device()
                .ok_or(anyhow!("no output device"))?,
        };
        log::info!("cpal input device: {}", device_name(&input_device));
        log::info!("cpal output device: {}", device_name(&output_device));
        Ok(Self {
            input_device,
            output_device,
        })
    }

    /// Names of every input and output device on the default host.
    pub fn list_devices() -> anyhow::Result<DeviceList> {
        let host = cpal::default_host();
        Ok(DeviceList {
            inputs: host.input_devices()?.map(|d| device_name(&d)).collect(),
            outputs: host.output_devices()?.map(|d| device_name(&d)).collect(),
        })
    }

    /// Opens a duplex stream. The callback runs on the output stream's
    /// thread and receives interleaved input, interleaved output to fill,
    /// the number of frames, and any status flags raised since the last
    /// call. Each call covers exactly `settings.block_size` frames, even
    /// when the device uses a different buffer size.
    pub fn open_stream<F>(
        &self,
        settings: StreamSettings,
        mut callback: F,
    ) -> anyhow::Result<DuplexStream>
    where
        F: FnMut(&[f32], &mut [f32], usize, StatusFlags) + Send + 'static,
    {
        if settings.channels == 0 {
            anyhow::bail!("stream needs at least one channel");
        }
        if settings.block_size == 0 {
            anyhow::bail!("block size must be greater than zero");
        }
        let channels = settings.channels as usize;
        let status = Arc::new(SharedStatus::default());
        let (mut producer, consumer) =
            pump::input_ring(settings.block_size, channels);
        let input_config = stream_config(
            self.input_device.default_input_config()?.buffer_size(),
            settings,
        );
        let output_config = stream_config(
            self.output_device.default_output_config()?.buffer_size(),
            settings,
        );
        log::info!("sample rate: {}", settings.sample_rate_hz);
        log::info!("num channels: {}", channels);
        log::info!("input buffer size: {:?}", input_config.buffer_size);
        log::info!("output buffer size: {:?}", output_config.buffer_size);
        let input = self
            .input_device
            .build_input_stream(
                &input_config,
                {
                    let status = Arc::clone(&status);
                    move |data: &[f32], _: &InputCallbackInfo| {
                        pump::push_input(&mut producer, data, channels, &status)
                    }
                },
                {
                    let status = Arc::clone(&status);
                    move |err| {
                        log::error!("input stream error: {}", err);
                        status.set_stream_error();
                    }
                },
                None,
            )
            .context("failed to build input stream")?;
        let mut pump = BlockPump::new(
            consumer,
            settings.block_size,
            channels,
            channels,
            Arc::clone(&status),
        );
        let output = self
            .output_device
            .build_output_stream(
                &output_config,
                move |data: &mut [f32], _: &OutputCallbackInfo| {
                    pump.run(data, &mut callback)
                },
                move |err| {
                    log::error!("output stream error: {}", err);
                    status.set_stream_error();
                },
                None,
            )
            .context("failed to build output stream")?;
        Ok(DuplexStream { input, output })
    }
}
