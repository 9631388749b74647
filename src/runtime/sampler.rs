//! Frame sampler - the analysis window read side of the tap

use rtrb::Consumer;

/// Keeps the most recent `window_size` samples the source player produced.
///
/// The audio thread pushes into the tap as it renders; every call to
/// [`capture_window`] drains whatever arrived since the last frame and slides
/// it into the window. Older windows are never queued: the result is always
/// "now".
///
/// [`capture_window`]: FrameSampler::capture_window
pub struct FrameSampler {
    tap: Consumer<f32>,
    window: Vec<f32>,
}

impl FrameSampler {
    pub fn new(tap: Consumer<f32>, window_size: usize) -> Self {
        Self {
            tap,
            window: vec![0.0; window_size],
        }
    }

    /// Drain the tap and return the latest window.
    ///
    /// Zeros until audio has flowed.
    pub fn capture_window(&mut self) -> &[f32] {
        let available = self.tap.slots();
        if available == 0 {
            return &self.window;
        }
        let Ok(chunk) = self.tap.read_chunk(available) else {
            return &self.window;
        };

        let size = self.window.len();
        let fresh = available.min(size);
        let skip = available - fresh;

        // Slide the survivors to the front, newest samples fill the back
        self.window.copy_within(fresh.., 0);
        let (first, second) = chunk.as_slices();
        for (slot, &sample) in self.window[size - fresh..]
            .iter_mut()
            .zip(first.iter().chain(second.iter()).skip(skip))
        {
            *slot = sample;
        }
        chunk.commit_all();

        &self.window
    }

    /// The window as of the last capture, without draining.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    pub fn window_size(&self) -> usize {
        self.window.len()
    }
}
