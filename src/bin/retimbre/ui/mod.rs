//! TUI for retimbre
//!
//! Shows the transport, the instrument selector, the analysis window and its
//! spectrum with the tracked pitch marked.

mod instruments;
pub mod spectrum;
mod transport;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use retimbre::{
    dsp::PitchEstimate,
    runtime::{SessionState, SourceInfo},
    synth::{Instrument, VoiceSnapshot},
};

use instruments::render_instruments;
use spectrum::render_spectrum;
use transport::render_transport;
use waveform::render_waveform;

/// Status line content
pub enum Message {
    Info(String),
    Error(String),
}

/// Everything one draw needs, borrowed from the app.
pub struct View<'a> {
    pub state: SessionState,
    pub can_stop: bool,
    pub instrument: Instrument,
    pub estimate: Option<PitchEstimate>,
    pub voice: Option<VoiceSnapshot>,
    pub source: Option<&'a SourceInfo>,
    pub preview: Option<&'a str>,
    pub previewing: bool,
    pub window: &'a [f32],
    pub spectrum: &'a [(f64, f64)],
    pub input: Option<&'a str>,
    pub message: Option<&'a Message>,
}

pub fn render(frame: &mut Frame, view: &View) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Transport bar
            Constraint::Length(3), // Instruments
            Constraint::Min(6),    // Waveform
            Constraint::Min(6),    // Spectrum
            Constraint::Length(1), // Status / help
        ])
        .split(area);

    render_transport(frame, chunks[0], view);
    render_instruments(frame, chunks[1], view.instrument);
    render_waveform(frame, chunks[2], view.window);
    render_spectrum(
        frame,
        chunks[3],
        view.spectrum,
        view.voice.map(|v| v.frequency_hz),
    );
    render_status(frame, chunks[4], view);
}

fn render_status(frame: &mut Frame, area: ratatui::layout::Rect, view: &View) {
    let line = if let Some(input) = view.input {
        Line::from(vec![
            Span::styled(" open: ", Style::default().fg(Color::Cyan)),
            Span::raw(input),
            Span::styled("█", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let stop = if view.can_stop { "[S] Stop  " } else { "" };
        let preview = match (view.preview, view.previewing) {
            (_, true) => "[P] Stop preview  ",
            (Some(_), false) => "[P] Preview  ",
            (None, false) => "",
        };
        let mut spans = vec![Span::styled(
            format!(" [Q] Quit  [O] Open  {stop}{preview}[←/→ 1-6] Instrument  "),
            Style::default().fg(Color::DarkGray),
        )];
        match view.message {
            Some(Message::Info(text)) => {
                spans.push(Span::styled(text.as_str(), Style::default().fg(Color::Green)))
            }
            Some(Message::Error(text)) => {
                spans.push(Span::styled(text.as_str(), Style::default().fg(Color::Red)))
            }
            None => {}
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}
