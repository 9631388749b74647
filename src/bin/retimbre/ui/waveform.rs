//! Oscilloscope of the current analysis window

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

pub fn render_waveform(frame: &mut Frame, area: Rect, window: &[f32]) {
    let block = Block::default()
        .title(" Analysis window ")
        .borders(Borders::ALL);

    // Braille packs two points per column, more than that is wasted
    let width = (area.width as usize * 2).max(1);
    let step = (window.len() / width).max(1);
    let data: Vec<(f64, f64)> = window
        .iter()
        .enumerate()
        .step_by(step)
        .map(|(i, &sample)| (i as f64 / window.len() as f64, sample as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
