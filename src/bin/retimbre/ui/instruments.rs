//! Instrument selector - one tab per instrument

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Tabs},
    Frame,
};
use retimbre::synth::{Instrument, INSTRUMENTS};

pub fn render_instruments(frame: &mut Frame, area: Rect, selected: Instrument) {
    let titles: Vec<Line> = INSTRUMENTS
        .iter()
        .enumerate()
        .map(|(i, instrument)| {
            Line::from(format!("{} {} ({})", i + 1, instrument, instrument.waveform().name()))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().title(" Instrument ").borders(Borders::ALL))
        .select(selected.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}
