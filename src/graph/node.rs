/// Context passed to graph nodes during rendering
///
/// - sample_rate: output sample rate in Hz (e.g., 44100.0)
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
}

impl RenderCtx {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

/// Core trait for audio processing graph nodes
///
/// Nodes render blocks of mono audio on the audio thread. Implementations
/// must not allocate or block inside `render_block`.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);
}
