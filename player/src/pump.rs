use crate::status::{SharedStatus, StatusFlags};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::Arc;

/// Capacity of the input ring in blocks.
const INPUT_RING_BLOCKS: usize = 4;

/// Ring buffer carrying interleaved input samples from the input callback to
/// the output callback. It starts with one block of silence queued so the
/// first output block has something to read while the input stream spins up.
pub(crate) fn input_ring(
    block_size: usize,
    channels: usize,
) -> (Producer<f32>, Consumer<f32>) {
    let block_len = block_size * channels;
    let (mut producer, consumer) =
        RingBuffer::new(block_len * INPUT_RING_BLOCKS);
    if let Ok(chunk) = producer.write_chunk_uninit(block_len) {
        chunk.fill_from_iter(std::iter::repeat(0.0));
    }
    (producer, consumer)
}

/// Called from the input callback. Queues as many whole frames of `data` as
/// fit and raises the overflow flag if any had to be dropped.
pub(crate) fn push_input(
    producer: &mut Producer<f32>,
    data: &[f32],
    channels: usize,
    status: &SharedStatus,
) {
    let len = data.len().min(producer.slots());
    let len = len - (len % channels.max(1));
    if len < data.len() {
        status.set_input_overflow();
    }
    if len == 0 {
        return;
    }
    if let Ok(chunk) = producer.write_chunk_uninit(len) {
        chunk.fill_from_iter(data[..len].iter().copied());
    }
}

/// Runs in the output callback. The user callback always sees exactly
/// `block_size` frames, whatever size of buffer the device asks for. Each
/// processed block is queued and copied out across as many device buffers
/// as it takes, which adds up to one block of output latency.
pub(crate) struct BlockPump {
    input: Consumer<f32>,
    scratch: Vec<f32>,
    // processed output waiting to be handed to the device
    output_block: Vec<f32>,
    output_pos: usize,
    block_size: usize,
    input_channels: usize,
    output_channels: usize,
    status: Arc<SharedStatus>,
}

impl BlockPump {
    pub fn new(
        input: Consumer<f32>,
        block_size: usize,
        input_channels: usize,
        output_channels: usize,
        status: Arc<SharedStatus>,
    ) -> Self {
        let output_block = vec![0.0; block_size * output_channels];
        Self {
            input,
            scratch: vec![0.0; block_size * input_channels],
            output_pos: output_block.len(),
            output_block,
            block_size,
            input_channels,
            output_channels,
            status,
        }
    }

    /// Reads up to `len` samples into the start of the scratch buffer and
    /// returns how many were read.
    fn read_input(&mut self, len: usize) -> usize {
        let available = self.input.slots().min(len);
        let available = available - (available % self.input_channels);
        if available == 0 {
            return 0;
        }
        match self.input.read_chunk(available) {
            Ok(chunk) => {
                let (first, second) = chunk.as_slices();
                self.scratch[..first.len()].copy_from_slice(first);
                self.scratch[first.len()..available].copy_from_slice(second);
                chunk.commit_all();
                available
            }
            Err(_) => 0,
        }
    }

    /// Processes one full block of input into `output_block`.
    fn next_block<F>(&mut self, callback: &mut F)
    where
        F: FnMut(&[f32], &mut [f32], usize, StatusFlags),
    {
        let needed = self.scratch.len();
        let read = self.read_input(needed);
        self.scratch[read..].fill(0.0);
        let mut flags = self.status.take();
        flags.input_underflow = read < needed;
        self.output_block.fill(0.0);
        callback(
            &self.scratch[..],
            &mut self.output_block[..],
            self.block_size,
            flags,
        );
        self.output_pos = 0;
    }

    pub fn run<F>(&mut self, output: &mut [f32], callback: &mut F)
    where
        F: FnMut(&[f32], &mut [f32], usize, StatusFlags),
    {
        if self.input_channels == 0
            || self.output_channels == 0
            || self.block_size == 0
        {
            output.fill(0.0);
            return;
        }
        let mut written = 0;
        while written < output.len() {
            if self.output_pos == self.output_block.len() {
                self.next_block(callback);
            }
            let len = (output.len() - written)
                .min(self.output_block.len() - self.output_pos);
            output[written..written + len].copy_from_slice(
                &self.output_block[self.output_pos..self.output_pos + len],
            );
            written += len;
            self.output_pos += len;
        }
    }
}
