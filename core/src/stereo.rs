/// A value for each of the left and right channels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stereo<L, R> {
    pub left: L,
    pub right: R,
}

pub type StereoPair<T> = Stereo<T, T>;

impl<L, R> Stereo<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<T> StereoPair<T> {
    pub fn new_fn<F>(mut f: F) -> Self
    where
        F: FnMut() -> T,
    {
        Self {
            left: f(),
            right: f(),
        }
    }
}

impl StereoPair<Vec<f32>> {
    /// Zero-filled stereo buffers of `num_frames` each.
    pub fn silence(num_frames: usize) -> Self {
        Self::new_fn(|| vec![0.0; num_frames])
    }

    /// Mutable slice views suitable for passing to the engine.
    pub fn as_mut_slices(&mut self) -> StereoPair<&mut [f32]> {
        Stereo::new(self.left.as_mut_slice(), self.right.as_mut_slice())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_fn_calls_once_per_channel() {
        let mut count = 0;
        let pair = StereoPair::new_fn(|| {
            count += 1;
            count
        });
        assert_eq!(pair, Stereo::new(1, 2));
    }

    #[test]
    fn silence_is_zeroed() {
        let mut pair = StereoPair::silence(4);
        let slices = pair.as_mut_slices();
        assert_eq!(slices.left, &[0.0; 4]);
        assert_eq!(slices.right, &[0.0; 4]);
    }
}
