//! Playback graph - the audio-thread half of one session
//!
//! ```text
//!   source player ──► analysis tap ──► output
//!                          │
//!                          └─► FrameSampler (control thread)
//!
//!   voice (osc → gain) ─────────────► output
//! ```
//!
//! The graph talks to the control thread only through lock-free rings and
//! atomics, so rendering never blocks or allocates.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::warn;

use crate::{
    config::{PipelineConfig, VOICE_QUEUE_SIZE},
    graph::{Gain, GraphNode, OscNode, RenderCtx},
    io::AudioSource,
    runtime::sampler::FrameSampler,
    synth::{
        message::{CommandReceiver, VoiceCommand},
        voice::VoiceSink,
    },
    MAX_BLOCK_SIZE,
};

/// Audio-thread state for one session. Moved into the output callback.
pub struct PlaybackGraph {
    /// Mono mixdown at the output sample rate
    source: Arc<[f32]>,
    position: usize,
    ctx: RenderCtx,
    voice: Option<Gain<OscNode>>,
    commands: Consumer<VoiceCommand>,
    tap: Producer<f32>,
    clock: Arc<AtomicU64>,
    playing: Arc<AtomicBool>,
    /// Samples the tap could not take
    tap_dropped: Arc<AtomicU64>,
    voice_buffer: Vec<f32>,
}

/// Control-thread endpoints of a [`PlaybackGraph`].
pub struct GraphEndpoints {
    pub voice: VoiceLink,
    pub sampler: FrameSampler,
    pub status: SourceStatus,
}

impl PlaybackGraph {
    /// Build a graph that plays `source` at `output_rate`.
    ///
    /// The source must already be at `output_rate`; see
    /// [`AudioSource::resampled`].
    pub fn new(
        source: &AudioSource,
        output_rate: u32,
        config: &PipelineConfig,
    ) -> (Self, GraphEndpoints) {
        let (command_tx, command_rx) = RingBuffer::<VoiceCommand>::new(VOICE_QUEUE_SIZE);
        let (tap_tx, tap_rx) = RingBuffer::<f32>::new(config.tap_capacity());
        let clock = Arc::new(AtomicU64::new(0));
        let playing = Arc::new(AtomicBool::new(true));
        let tap_dropped = Arc::new(AtomicU64::new(0));

        let graph = Self {
            source: source.mixdown().into(),
            position: 0,
            ctx: RenderCtx::new(output_rate as f32),
            voice: None,
            commands: command_rx,
            tap: tap_tx,
            clock: clock.clone(),
            playing: playing.clone(),
            tap_dropped: tap_dropped.clone(),
            voice_buffer: vec![0.0; MAX_BLOCK_SIZE],
        };

        let endpoints = GraphEndpoints {
            voice: VoiceLink {
                commands: command_tx,
                clock: clock.clone(),
                dropped: 0,
            },
            sampler: FrameSampler::new(tap_rx, config.window_size),
            status: SourceStatus {
                clock,
                playing,
                tap_dropped,
            },
        };

        (graph, endpoints)
    }

    /// Render mono output of any length.
    pub fn render(&mut self, out: &mut [f32]) {
        for block in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_block(block);
        }
    }

    fn render_block(&mut self, out: &mut [f32]) {
        let start = self.clock.load(Ordering::Acquire);
        let len = out.len();

        // Source player feeds the output and the analysis tap
        let remaining = self.source.len().saturating_sub(self.position);
        let n = remaining.min(len);
        out[..n].copy_from_slice(&self.source[self.position..self.position + n]);
        out[n..].fill(0.0);
        let accepted = n.min(self.tap.slots());
        for &sample in &out[..accepted] {
            let _ = self.tap.push(sample);
        }
        if accepted < n {
            // sampler fell behind, drop the remainder
            self.tap_dropped
                .fetch_add((n - accepted) as u64, Ordering::Relaxed);
        }
        self.position += n;
        if self.position >= self.source.len() {
            self.playing.store(false, Ordering::Release);
        }

        // Voice, split wherever a command comes due
        let mut cursor = 0;
        while cursor < len {
            let now = start + cursor as u64;
            while self.commands.next_due().is_some_and(|due| due <= now) {
                if let Some(command) = CommandReceiver::pop(&mut self.commands) {
                    self.apply(command);
                }
            }

            let end = match self.commands.next_due() {
                Some(due) => ((due - start) as usize).min(len),
                None => len,
            };

            if let Some(voice) = self.voice.as_mut() {
                let segment = &mut self.voice_buffer[cursor..end];
                voice.render_block(segment, &self.ctx);
                for (o, v) in out[cursor..end].iter_mut().zip(segment.iter()) {
                    *o += *v;
                }
            }
            cursor = end;
        }

        self.clock.store(start + len as u64, Ordering::Release);
    }

    fn apply(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Start { waveform, .. } => {
                let mut osc = OscNode::new(waveform);
                osc.start();
                // Silent until the first SetGain lands
                self.voice = Some(Gain::new(osc, 0.0));
            }
            VoiceCommand::SetFrequency { hz, .. } => {
                if let Some(voice) = self.voice.as_mut() {
                    voice.signal.set_frequency(hz);
                }
            }
            VoiceCommand::SetGain { level, .. } => {
                if let Some(voice) = self.voice.as_mut() {
                    voice.set_level(level);
                }
            }
            VoiceCommand::Stop { .. } => {
                if let Some(mut voice) = self.voice.take() {
                    voice.signal.stop();
                }
            }
        }
    }

    pub fn has_voice(&self) -> bool {
        self.voice.is_some()
    }
}

/// Production [`VoiceSink`]: stamps commands with the output clock and
/// pushes them to the audio thread.
pub struct VoiceLink {
    commands: Producer<VoiceCommand>,
    clock: Arc<AtomicU64>,
    dropped: usize,
}

impl VoiceLink {
    /// Commands lost to a full queue.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl VoiceSink for VoiceLink {
    fn now(&self) -> u64 {
        self.clock.load(Ordering::Acquire)
    }

    fn send(&mut self, command: VoiceCommand) {
        if self.commands.push(command).is_err() {
            self.dropped += 1;
            warn!(?command, dropped = self.dropped, "voice command queue full");
        }
    }
}

/// What the control thread can observe about the playing source.
#[derive(Clone)]
pub struct SourceStatus {
    clock: Arc<AtomicU64>,
    playing: Arc<AtomicBool>,
    tap_dropped: Arc<AtomicU64>,
}

impl SourceStatus {
    /// False once the source player has run out of samples.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Output clock in frames.
    pub fn clock(&self) -> u64 {
        self.clock.load(Ordering::Acquire)
    }

    /// Total samples lost because the analysis tap was full.
    pub fn tap_overflow(&self) -> u64 {
        self.tap_dropped.load(Ordering::Relaxed)
    }
}
