use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Tracking Oscillator
===================

The pitch follower never plays notes. It hands the oscillator a new frequency
every time it trusts an estimate, up to once per display frame, and the
oscillator keeps running in between.

So the node owns its frequency. The render context only carries the sample
rate:

  control thread:  estimate → set_frequency(hz)   (~60 times per second)
  audio thread:    render_block(...)              (every device callback)

Because the phase is untouched by a retune, consecutive estimates of 219.6,
220.3 and 220.1 Hz produce one continuous tone rather than three clicks.

Example usage:
  let mut osc = OscNode::new(OscillatorWaveform::Sine);
  osc.set_frequency(220.0);
  osc.render_block(&mut block, &ctx);
*/

pub struct OscNode {
    osc: OscillatorBlock,
    /// Frequency (Hz) used for rendering
    frequency: f32,
    running: bool,
}

impl OscNode {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency: 440.0,
            running: false,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Sawtooth)
    }

    /// Begin producing output from phase zero.
    pub fn start(&mut self) {
        self.osc.reset();
        self.running = true;
    }

    /// Silence the node. A stopped node renders zeros until started again.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Retune without resetting phase. Clamped to the audible range.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.clamp(20.0, 20_000.0);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.osc.waveform()
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if !self.running {
            out.fill(0.0);
            return;
        }
        self.osc.render(out, self.frequency, ctx);
    }
}
