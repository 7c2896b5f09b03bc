pub mod config;
pub use config::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE_HZ, EngineConfig, Locale};
pub mod controller;
pub use controller::{ChorusController, Labels};
pub mod delay_buffer;
pub use delay_buffer::DelayBuffer;
pub mod engine;
pub use engine::{ChorusEngine, HANDOFF_QUEUE_CAPACITY};
pub mod lfo;
pub use lfo::Lfo;
pub mod params;
pub use params::{MAX_FEEDBACK, Params, SharedParams};
pub mod stereo;
pub use stereo::{Stereo, StereoPair};
