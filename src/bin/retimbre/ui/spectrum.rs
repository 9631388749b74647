//! Spectrum analyzer widget
//!
//! FFT of the analysis window on a log-frequency axis, with the voice's
//! frequency drawn as a vertical marker.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Number of frequency bins to display
const SPECTRUM_BINS: usize = 96;

const MIN_DB: f64 = -100.0;

/// Spectrum analyzer with FFT processing
pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// log10 of the frequency for each displayed bin
    log_freqs: Vec<f64>,
    /// FFT bin indices corresponding to each frequency
    bin_indices: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Current spectrum data: (log10 frequency, magnitude_db)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    /// # Arguments
    /// * `buffer_len` - FFT size, the analysis window length
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(buffer_len);

        // Hann window - reduces spectral leakage
        let window: Vec<f32> = (0..buffer_len)
            .map(|i| {
                if buffer_len > 1 {
                    let denom = (buffer_len - 1) as f32;
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();

        // Log-spaced frequency bins (20 Hz to Nyquist)
        let max_freq = (sample_rate as f64 / 2.0).clamp(1.0, 20_000.0);
        let min_freq = 20.0f64.min(max_freq);
        let half = (buffer_len / 2).max(1);

        let mut log_freqs = Vec::with_capacity(SPECTRUM_BINS);
        let mut bin_indices = Vec::with_capacity(SPECTRUM_BINS);
        for i in 0..SPECTRUM_BINS {
            let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
            let freq = min_freq * (max_freq / min_freq).powf(t);
            let index = (freq * buffer_len as f64 / sample_rate as f64).round() as usize;
            log_freqs.push(freq.log10());
            bin_indices.push(index.min(half - 1));
        }

        let scratch = vec![Complex::new(0.0, 0.0); buffer_len];
        let spectrum = log_freqs.iter().map(|&f| (f, MIN_DB)).collect();

        Self {
            window,
            log_freqs,
            bin_indices,
            fft,
            scratch,
            spectrum,
        }
    }

    /// Recompute from a new window. Ignored if the length does not match.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for (i, sample) in buffer.iter().enumerate() {
            self.scratch[i].re = *sample * self.window[i];
            self.scratch[i].im = 0.0;
        }
        self.fft.process(&mut self.scratch);

        for (i, &index) in self.bin_indices.iter().enumerate() {
            let bin = self.scratch[index];
            let power = (bin.re * bin.re + bin.im * bin.im).max(1e-12);
            self.spectrum[i] = (self.log_freqs[i], 10.0 * (power as f64).log10());
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

/// Render the spectrum with an optional pitch marker (Hz).
pub fn render_spectrum(
    frame: &mut Frame,
    area: Rect,
    spectrum: &[(f64, f64)],
    pitch: Option<f32>,
) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let min_x = spectrum.first().map_or(20f64.log10(), |(f, _)| *f);
    let max_x = spectrum.last().map_or(20_000f64.log10(), |(f, _)| *f).max(min_x + 1e-3);
    let max_db = spectrum
        .iter()
        .map(|(_, db)| *db)
        .fold(MIN_DB, f64::max)
        .max(0.0)
        + 10.0;

    let marker: Vec<(f64, f64)> = pitch
        .map(|hz| (hz as f64).log10())
        .filter(|x| (min_x..=max_x).contains(x))
        .map(|x| vec![(x, MIN_DB), (x, max_db)])
        .unwrap_or_default();

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(spectrum)];
    if !marker.is_empty() {
        datasets.push(
            Dataset::default()
                .name(format!("{:.1} Hz", pitch.unwrap_or_default()))
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Yellow))
                .data(&marker),
        );
    }

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([min_x, max_x])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([MIN_DB, max_db])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
