//! Transport controller - the session state machine
//!
//! ```text
//!            upload              decode ok + output open
//!   Idle ──────────────► Loading ─────────────────────────► Playing
//!    ▲                      │                                  │
//!    └──── decode error ────┘                 user_stop /      │
//!    └──── output error ────┘                 source ended     ▼
//!                                                           Stopped
//!
//!   upload from any state tears the current session down first
//! ```
//!
//! One session owns everything a single upload needs: the decoded source,
//! the output stream, the frame sampler, the estimator and the voice.
//! Dropping the session releases all of it, so every exit path (stop, end of
//! source, re-upload, dropping the controller) goes through the same
//! teardown.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::{
    config::PipelineConfig,
    dsp::pitch::{McLeodDetector, PitchEstimate},
    error::{ConfigError, PlaybackGraphError, TransportError},
    io::{decode_with_hint, AudioSource},
    runtime::{
        graph::{PlaybackGraph, SourceStatus, VoiceLink},
        output::{AudioOutput, StreamHandle},
        preview::{PreviewStore, PreviewUrl},
        sampler::FrameSampler,
    },
    synth::{
        instrument::Instrument,
        voice::{VoiceController, VoiceSnapshot},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Playing,
    Stopped,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Playing => "playing",
            SessionState::Stopped => "stopped",
        }
    }
}

/// Result of one [`TransportController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame ran and the source is still playing
    Continued,
    /// A frame ran and the source has finished; the session is now stopped
    Ended,
    /// No frame ran
    Halted,
}

/// One file handed to the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    /// Lowercase file extension, used as a container hint.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

/// Facts about the loaded file, kept after the session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub duration: Duration,
    /// Rate the source is played and analysed at
    pub output_rate: u32,
}

/// Run the next frame iff armed. Cleared synchronously on stop.
#[derive(Debug, Default)]
struct FrameSchedule {
    armed: bool,
}

impl FrameSchedule {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn cancel(&mut self) {
        self.armed = false;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}

struct Session {
    // Declared first so it is released before the rest
    stream: Box<dyn StreamHandle>,
    voices: VoiceController<VoiceLink>,
    sampler: FrameSampler,
    detector: McLeodDetector,
    status: SourceStatus,
    sample_rate: f32,
    tap_overflow: u64,
    _source: AudioSource,
}

impl Session {
    fn open<O: AudioOutput>(
        output: &mut O,
        source: AudioSource,
        config: &PipelineConfig,
        instrument: Instrument,
    ) -> Result<Self, PlaybackGraphError> {
        let output_rate = output.sample_rate();
        let playable = source.resampled(output_rate);
        let (graph, ends) = PlaybackGraph::new(&playable, output_rate, config);
        let stream = output.open(graph)?;
        debug!(output_rate, "session opened");

        Ok(Self {
            stream,
            voices: VoiceController::new(ends.voice, instrument),
            sampler: ends.sampler,
            detector: McLeodDetector::new(config.window_size),
            status: ends.status,
            sample_rate: output_rate as f32,
            tap_overflow: 0,
            _source: source,
        })
    }

    /// capture → estimate → acceptance → voice
    fn run_frame(&mut self) -> PitchEstimate {
        let window = self.sampler.capture_window();
        let estimate = self.detector.estimate(window, self.sample_rate);
        self.voices.apply(&estimate);

        let overflow = self.status.tap_overflow();
        if overflow > self.tap_overflow {
            warn!(
                dropped = overflow - self.tap_overflow,
                "analysis tap overflowed between frames"
            );
            self.tap_overflow = overflow;
        }
        estimate
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.voices.stop();
        self.stream.halt();
        debug!(clock = self.status.clock(), "session torn down");
    }
}

/// Orchestrates decode, playback, analysis and resynthesis for one upload
/// at a time.
pub struct TransportController<O: AudioOutput> {
    session: Option<Session>,
    preview: Option<PreviewUrl>,
    output: O,
    config: PipelineConfig,
    state: SessionState,
    instrument: Instrument,
    schedule: FrameSchedule,
    previews: PreviewStore,
    source_info: Option<SourceInfo>,
    last_estimate: Option<PitchEstimate>,
    frames_run: u64,
    idle_window: Vec<f32>,
}

impl<O: AudioOutput> TransportController<O> {
    pub fn new(output: O, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            session: None,
            preview: None,
            output,
            instrument: config.instrument,
            idle_window: vec![0.0; config.window_size],
            config,
            state: SessionState::Idle,
            schedule: FrameSchedule::default(),
            previews: PreviewStore::new(),
            source_info: None,
            last_estimate: None,
            frames_run: 0,
        })
    }

    /// Replace whatever is loaded with `upload` and start playing it.
    ///
    /// The previous session (voice, frame loop, output stream) and its
    /// preview are released before anything new is opened. On error the
    /// transport is left idle.
    pub fn upload(&mut self, upload: Upload) -> Result<(), TransportError> {
        self.end_session();
        self.preview = None;
        self.source_info = None;
        self.last_estimate = None;
        self.set_state(SessionState::Loading);

        let extension = upload.extension();
        let bytes: Arc<[u8]> = upload.bytes.into();
        self.preview = Some(self.previews.create(&upload.name, bytes.clone()));

        let source = match decode_with_hint(&bytes, extension.as_deref()) {
            Ok(source) => source,
            Err(err) => {
                warn!(name = %upload.name, %err, "decode failed");
                self.set_state(SessionState::Idle);
                return Err(err.into());
            }
        };

        let info = SourceInfo {
            name: upload.name,
            sample_rate: source.sample_rate(),
            channels: source.channel_count(),
            duration: source.duration(),
            output_rate: self.output.sample_rate(),
        };

        match Session::open(&mut self.output, source, &self.config, self.instrument) {
            Ok(session) => {
                info!(
                    name = %info.name,
                    sample_rate = info.sample_rate,
                    channels = info.channels,
                    duration_secs = info.duration.as_secs_f64(),
                    instrument = %self.instrument,
                    "session started"
                );
                self.session = Some(session);
                self.source_info = Some(info);
                self.schedule.arm();
                self.set_state(SessionState::Playing);
                Ok(())
            }
            Err(err) => {
                error!(%err, "could not open playback graph");
                self.set_state(SessionState::Idle);
                Err(err.into())
            }
        }
    }

    /// Run one analysis frame. Call once per display refresh.
    pub fn tick(&mut self) -> FrameOutcome {
        if self.state != SessionState::Playing || !self.schedule.is_armed() {
            return FrameOutcome::Halted;
        }
        let Some(session) = self.session.as_mut() else {
            return FrameOutcome::Halted;
        };

        let estimate = session.run_frame();
        let still_playing = session.status.is_playing();
        self.last_estimate = Some(estimate);
        self.frames_run += 1;

        if still_playing {
            FrameOutcome::Continued
        } else {
            debug!("source ended");
            self.end_session();
            self.set_state(SessionState::Stopped);
            FrameOutcome::Ended
        }
    }

    /// Stop playback and analysis. Returns false if nothing was playing.
    pub fn user_stop(&mut self) -> bool {
        if !self.can_stop() {
            return false;
        }
        self.end_session();
        self.set_state(SessionState::Stopped);
        true
    }

    /// Instrument for the next voice created. A sounding voice keeps its
    /// timbre.
    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
        if let Some(session) = self.session.as_mut() {
            session.voices.select_instrument(instrument);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn can_stop(&self) -> bool {
        self.state == SessionState::Playing
    }

    /// Estimate from the most recent frame of the current upload.
    pub fn last_estimate(&self) -> Option<PitchEstimate> {
        self.last_estimate
    }

    pub fn voice(&self) -> Option<VoiceSnapshot> {
        self.session
            .as_ref()
            .and_then(|session| session.voices.voice().copied())
    }

    /// Analysis window as of the last frame, zeros when nothing is playing.
    pub fn analysis_window(&self) -> &[f32] {
        match &self.session {
            Some(session) => session.sampler.window(),
            None => &self.idle_window,
        }
    }

    /// Rate the analysis window was captured at.
    pub fn analysis_rate(&self) -> u32 {
        self.output.sample_rate()
    }

    pub fn source_info(&self) -> Option<&SourceInfo> {
        self.source_info.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewUrl> {
        self.preview.as_ref()
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Frames run since the controller was created.
    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    fn end_session(&mut self) {
        self.schedule.cancel();
        // Drop runs voice stop, then stream halt
        self.session = None;
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = self.state.label(), to = state.label(), "transport state");
            self.state = state;
        }
    }
}

impl<O: AudioOutput> Drop for TransportController<O> {
    fn drop(&mut self) {
        self.end_session();
        self.preview = None;
    }
}
