use crate::{
    config::{CLARITY_THRESHOLD, VOICE_GAIN},
    dsp::{oscillator::OscillatorWaveform, pitch::PitchEstimate},
    synth::{instrument::Instrument, message::VoiceCommand},
};

/// Where voice mutations go, and the clock they are stamped with.
///
/// The production sink pushes into the playback graph's command ring; tests
/// record the commands instead.
pub trait VoiceSink {
    /// Current output-clock position in frames.
    fn now(&self) -> u64;

    fn send(&mut self, command: VoiceCommand);
}

/// Frequency of an estimate that passes the acceptance policy.
///
/// Accepted iff a frequency was found and clarity is strictly above
/// [`CLARITY_THRESHOLD`]. Anything else leaves the voice untouched.
pub fn accepted_frequency(estimate: &PitchEstimate) -> Option<f32> {
    estimate
        .frequency_hz
        .filter(|hz| hz.is_finite() && *hz > 0.0)
        .filter(|_| estimate.clarity > CLARITY_THRESHOLD)
}

/// What the live voice is doing, as last commanded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSnapshot {
    pub instrument: Instrument,
    pub waveform: OscillatorWaveform,
    pub frequency_hz: f32,
    pub gain: f32,
    /// Output-clock frame the voice was started at
    pub started_at: u64,
}

/// Owns at most one synthesis voice.
///
/// The voice is created on the first accepted estimate with the waveform of
/// the instrument selected at that moment. Later selections only affect the
/// next voice; a sounding voice keeps its timbre until it is stopped.
pub struct VoiceController<S: VoiceSink> {
    sink: S,
    selected: Instrument,
    voice: Option<VoiceSnapshot>,
}

impl<S: VoiceSink> VoiceController<S> {
    pub fn new(sink: S, instrument: Instrument) -> Self {
        Self {
            sink,
            selected: instrument,
            voice: None,
        }
    }

    /// Run one estimate through the acceptance policy.
    ///
    /// Returns true if the voice was driven.
    pub fn apply(&mut self, estimate: &PitchEstimate) -> bool {
        match accepted_frequency(estimate) {
            Some(hz) => {
                self.on_accepted(hz);
                true
            }
            None => false,
        }
    }

    /// Create the voice if needed, then set frequency and gain at the current
    /// output-clock time.
    pub fn on_accepted(&mut self, frequency_hz: f32) {
        let at = self.sink.now();

        if self.voice.is_none() {
            let waveform = self.selected.waveform();
            self.sink.send(VoiceCommand::Start { waveform, at });
            self.voice = Some(VoiceSnapshot {
                instrument: self.selected,
                waveform,
                frequency_hz,
                gain: VOICE_GAIN,
                started_at: at,
            });
        }

        self.sink.send(VoiceCommand::SetFrequency {
            hz: frequency_hz,
            at,
        });
        self.sink.send(VoiceCommand::SetGain {
            level: VOICE_GAIN,
            at,
        });

        if let Some(voice) = self.voice.as_mut() {
            voice.frequency_hz = frequency_hz;
            voice.gain = VOICE_GAIN;
        }
    }

    /// Halt and forget the voice. Does nothing when no voice exists.
    pub fn stop(&mut self) {
        if self.voice.take().is_some() {
            let at = self.sink.now();
            self.sink.send(VoiceCommand::Stop { at });
        }
    }

    /// Choose the instrument for the next voice created.
    pub fn select_instrument(&mut self, instrument: Instrument) {
        self.selected = instrument;
    }

    pub fn selected_instrument(&self) -> Instrument {
        self.selected
    }

    pub fn voice(&self) -> Option<&VoiceSnapshot> {
        self.voice.as_ref()
    }

    pub fn has_voice(&self) -> bool {
        self.voice.is_some()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
