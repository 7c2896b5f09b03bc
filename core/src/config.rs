use std::{fmt, str::FromStr};

pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44100;
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Fixed properties of the audio stream the engine runs against. These don't
/// change for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// default: 44100
    pub sample_rate_hz: u32,
    /// Number of frames in each block handed to the engine.
    /// default: 8192
    pub block_size: usize,
    /// default: English
    pub locale: Locale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            block_size: DEFAULT_BLOCK_SIZE,
            locale: Locale::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_rate_hz == 0 {
            anyhow::bail!("sample rate must be positive");
        }
        if self.block_size == 0 {
            anyhow::bail!("block size must be positive");
        }
        Ok(())
    }

    /// Duration of one block in seconds.
    pub fn block_duration_s(&self) -> f64 {
        self.block_size as f64 / self.sample_rate_hz as f64
    }
}

/// Language of the labels returned to the control surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    Italian,
}

impl Locale {
    pub fn delay_label(&self, delay_s: f32) -> String {
        let delay_ms = delay_s * 1000.0;
        match self {
            Self::English => format!("Chorus Delay: {delay_ms:.2} ms"),
            Self::Italian => format!("Ritardo Chorus: {delay_ms:.2} ms"),
        }
    }

    pub fn depth_label(&self, depth: f32) -> String {
        match self {
            Self::English => format!("Depth: {depth:.2}"),
            Self::Italian => format!("Intensità: {depth:.2}"),
        }
    }

    pub fn lfo_rate_label(&self, lfo_rate_hz: f32) -> String {
        match self {
            Self::English => format!("LFO Rate: {lfo_rate_hz:.2}"),
            Self::Italian => format!("Tasso LFO: {lfo_rate_hz:.2}"),
        }
    }

    pub fn feedback_label(&self, feedback: f32) -> String {
        format!("Feedback: {feedback:.2}")
    }

    pub fn mix_label(&self, mix: f32) -> String {
        match self {
            Self::English => format!("Mix: {mix:.2}"),
            Self::Italian => format!("Mischiamento: {mix:.2}"),
        }
    }

    pub fn enabled_label(&self, enabled: bool) -> String {
        let state = match (self, enabled) {
            (Self::English, true) => "On",
            (Self::English, false) => "Off",
            (Self::Italian, true) => "Attivo",
            (Self::Italian, false) => "Disattivo",
        };
        format!("Chorus: {state}")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "en"),
            Self::Italian => write!(f, "it"),
        }
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "it" | "italian" | "italiano" => Ok(Self::Italian),
            other => anyhow::bail!("unknown locale: {other}"),
        }
    }
}
