use rtrb::Consumer;

use crate::dsp::oscillator::OscillatorWaveform;

/// Voice mutation sent from the control thread to the audio thread.
///
/// `at` is an output-clock position in frames. The playback graph applies the
/// command at that frame, or at the start of the next block if it is late.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VoiceCommand {
    Start { waveform: OscillatorWaveform, at: u64 },
    SetFrequency { hz: f32, at: u64 },
    SetGain { level: f32, at: u64 },
    Stop { at: u64 },
}

impl VoiceCommand {
    pub fn at(&self) -> u64 {
        match *self {
            VoiceCommand::Start { at, .. }
            | VoiceCommand::SetFrequency { at, .. }
            | VoiceCommand::SetGain { at, .. }
            | VoiceCommand::Stop { at } => at,
        }
    }
}

pub trait CommandReceiver {
    /// Timestamp of the next queued command, without removing it.
    fn next_due(&self) -> Option<u64>;

    fn pop(&mut self) -> Option<VoiceCommand>;
}

impl CommandReceiver for Consumer<VoiceCommand> {
    fn next_due(&self) -> Option<u64> {
        self.peek().ok().map(VoiceCommand::at)
    }

    fn pop(&mut self) -> Option<VoiceCommand> {
        Consumer::pop(self).ok()
    }
}
