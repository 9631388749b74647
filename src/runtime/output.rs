//! Audio outputs a [`PlaybackGraph`] can be opened on.
//!
//! [`CpalOutput`] drives the default sound device. [`HeadlessOutput`] renders
//! on demand so sessions can run without hardware, in tests and benches.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, warn};

use crate::{error::PlaybackGraphError, runtime::graph::PlaybackGraph, MAX_BLOCK_SIZE};

/// Something that can run a playback graph.
pub trait AudioOutput {
    /// Rate the graph must be rendered at.
    fn sample_rate(&self) -> u32;

    /// Start rendering `graph`. The returned handle owns the stream.
    fn open(&mut self, graph: PlaybackGraph) -> Result<Box<dyn StreamHandle>, PlaybackGraphError>;
}

/// A running output stream. Dropping it releases the stream.
pub trait StreamHandle {
    /// Stop rendering immediately. Safe to call more than once.
    fn halt(&mut self);
}

// ---------------------------------------------------------------------------
// CPAL
// ---------------------------------------------------------------------------

/// Default output device of the default host.
pub struct CpalOutput {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
}

impl CpalOutput {
    pub fn new() -> Result<Self, PlaybackGraphError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackGraphError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| PlaybackGraphError::DeviceConfig(e.to_string()))?;

        debug!(
            sample_rate = supported.sample_rate().0,
            channels = supported.channels(),
            format = ?supported.sample_format(),
            "default output config"
        );

        Ok(Self {
            device,
            sample_format: supported.sample_format(),
            config: supported.config(),
        })
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn open(
        &mut self,
        mut graph: PlaybackGraph,
    ) -> Result<Box<dyn StreamHandle>, PlaybackGraphError> {
        if self.sample_format != cpal::SampleFormat::F32 {
            return Err(PlaybackGraphError::UnsupportedFormat(format!(
                "{:?}",
                self.sample_format
            )));
        }

        let channels = self.config.channels as usize;
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;

                    while frames_written < total_frames {
                        let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let block = &mut render_buf[..frames_to_render];
                        graph.render(block);

                        // Copy to output (mono to all channels)
                        let out_off = frames_written * channels;
                        for (i, &s) in block.iter().enumerate() {
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = s;
                            }
                        }

                        frames_written += frames_to_render;
                    }
                },
                |err| error!(%err, "audio output stream error"),
                None,
            )
            .map_err(|e| PlaybackGraphError::BuildStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| PlaybackGraphError::Play(e.to_string()))?;

        Ok(Box::new(CpalStream { stream }))
    }
}

struct CpalStream {
    stream: cpal::Stream,
}

impl StreamHandle for CpalStream {
    fn halt(&mut self) {
        if let Err(err) = self.stream.pause() {
            // Some backends cannot pause; dropping the stream still stops it
            warn!(%err, "failed to pause output stream");
        }
    }
}

// ---------------------------------------------------------------------------
// Headless
// ---------------------------------------------------------------------------

/// An output with no device behind it.
///
/// Clones share state, so a test can keep one clone and hand the other to a
/// transport, then pull audio through the live graph with [`render`].
///
/// [`render`]: HeadlessOutput::render
#[derive(Clone)]
pub struct HeadlessOutput {
    sample_rate: u32,
    fail_with: Option<PlaybackGraphError>,
    shared: Arc<Mutex<HeadlessState>>,
}

#[derive(Default)]
struct HeadlessState {
    graph: Option<PlaybackGraph>,
    generation: u64,
    opened: usize,
    live: usize,
    peak_live: usize,
}

impl HeadlessOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            fail_with: None,
            shared: Arc::default(),
        }
    }

    /// An output whose every `open` fails with `err`.
    pub fn failing(sample_rate: u32, err: PlaybackGraphError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::new(sample_rate)
        }
    }

    /// Render `frames` mono samples from the live graph, silence if none.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        if let Some(graph) = self.lock().graph.as_mut() {
            graph.render(&mut out);
        }
        out
    }

    /// Whether a graph is currently attached.
    pub fn is_open(&self) -> bool {
        self.lock().graph.is_some()
    }

    pub fn streams_opened(&self) -> usize {
        self.lock().opened
    }

    pub fn live_streams(&self) -> usize {
        self.lock().live
    }

    /// Most streams ever alive at the same time.
    pub fn peak_live_streams(&self) -> usize {
        self.lock().peak_live
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioOutput for HeadlessOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn open(&mut self, graph: PlaybackGraph) -> Result<Box<dyn StreamHandle>, PlaybackGraphError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let mut state = self.lock();
        state.generation += 1;
        state.opened += 1;
        state.live += 1;
        state.peak_live = state.peak_live.max(state.live);
        state.graph = Some(graph);

        Ok(Box::new(HeadlessStream {
            generation: state.generation,
            shared: self.shared.clone(),
            halted: false,
        }))
    }
}

struct HeadlessStream {
    generation: u64,
    shared: Arc<Mutex<HeadlessState>>,
    halted: bool,
}

impl StreamHandle for HeadlessStream {
    fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;

        let mut state = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        state.live = state.live.saturating_sub(1);
        if state.generation == self.generation {
            state.graph = None;
        }
    }
}

impl Drop for HeadlessStream {
    fn drop(&mut self) {
        self.halt();
    }
}
