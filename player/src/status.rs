use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

/// Conditions the driver observed since the previous block was delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    /// Fewer input samples were available than the block needed. The
    /// missing samples were replaced with silence.
    pub input_underflow: bool,
    /// The input callback produced samples faster than they were consumed
    /// and some were dropped.
    pub input_overflow: bool,
    /// The host reported an error on either stream.
    pub stream_error: bool,
}

impl StatusFlags {
    pub fn is_empty(&self) -> bool {
        !(self.input_underflow || self.input_overflow || self.stream_error)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "ok");
        }
        let names = [
            (self.input_underflow, "input underflow"),
            (self.input_overflow, "input overflow"),
            (self.stream_error, "stream error"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(set, _)| *set) {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}")?;
            first = false;
        }
        Ok(())
    }
}

/// Flags raised from the input and error callbacks, collected by the output
/// callback once per block.
#[derive(Debug, Default)]
pub(crate) struct SharedStatus {
    input_overflow: AtomicBool,
    stream_error: AtomicBool,
}

impl SharedStatus {
    pub fn set_input_overflow(&self) {
        self.input_overflow.store(true, Ordering::Relaxed);
    }

    pub fn set_stream_error(&self) {
        self.stream_error.store(true, Ordering::Relaxed);
    }

    /// Returns the raised flags and clears them.
    pub fn take(&self) -> StatusFlags {
        StatusFlags {
            input_underflow: false,
            input_overflow: self.input_overflow.swap(false, Ordering::Relaxed),
            stream_error: self.stream_error.swap(false, Ordering::Relaxed),
        }
    }
}
