use crate::graph::node::{GraphNode, RenderCtx};

/// Scale a signal by a constant level.
///
/// The voice is an oscillator behind one of these: the level is reasserted
/// on every accepted pitch estimate and drops to zero when the voice stops.
pub struct Gain<N> {
    pub signal: N,
    level: f32,
}

impl<N> Gain<N> {
    pub fn new(signal: N, level: f32) -> Self {
        Self {
            signal,
            level: level.max(0.0),
        }
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = level.max(0.0);
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

impl<N: GraphNode> GraphNode for Gain<N> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.signal.render_block(out, ctx);

        for o in out.iter_mut() {
            *o *= self.level;
        }
    }
}
