//! Transport bar widget - shows session state, the loaded file and the
//! tracked pitch

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use retimbre::runtime::SessionState;

use super::View;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_transport(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" retimbre ").borders(Borders::ALL);

    let (symbol, color) = match view.state {
        SessionState::Idle => ("·", Color::DarkGray),
        SessionState::Loading => ("…", Color::Yellow),
        SessionState::Playing => ("▶", Color::Green),
        SessionState::Stopped => ("■", Color::Yellow),
    };

    let source = match view.source {
        Some(info) => format!(
            "{}  {:.1}s  {}ch  {:.1}kHz",
            info.name,
            info.duration.as_secs_f64(),
            info.channels,
            info.sample_rate as f32 / 1000.0
        ),
        None => "no file".to_owned(),
    };

    let stats = AudioStats::from_buffer(view.window);
    let first = Line::from(vec![
        Span::styled(
            format!(" {} {:<8} ", symbol, view.state.label()),
            Style::default().fg(color),
        ),
        Span::styled(format!("{source}  "), Style::default().fg(Color::White)),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let estimate = match view.estimate {
        Some(est) => match est.frequency_hz {
            Some(hz) => format!("{hz:7.1} Hz  clarity {:.2}", est.clarity),
            None => format!("   ---  Hz  clarity {:.2}", est.clarity),
        },
        None => "   ---".to_owned(),
    };
    let voice = match view.voice {
        Some(v) => format!("voice {} {:.1} Hz", v.waveform.name(), v.frequency_hz),
        None => "voice off".to_owned(),
    };
    let second = Line::from(vec![
        Span::styled(format!(" {estimate}  "), Style::default().fg(Color::Cyan)),
        Span::styled(format!("{voice}  "), Style::default().fg(Color::Yellow)),
        Span::styled(
            view.preview.unwrap_or_default().to_owned(),
            Style::default().fg(if view.previewing {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
    ]);

    let paragraph = Paragraph::new(vec![first, second]).block(block);
    frame.render_widget(paragraph, area);
}
