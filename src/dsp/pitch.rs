//! Fundamental frequency estimation.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/*
McLeod Pitch Method
===================

A pitch detector answers one question about a short window of audio: "after
how many samples does this signal repeat itself?" That lag is the period, and
sample_rate / period is the fundamental frequency.


Vocabulary
----------

  lag (τ)       A shift in samples. We compare the window with a copy of
                itself shifted by τ.

  period        The smallest lag at which the signal lines up with itself.

  NSDF          Normalized Square Difference Function. For each lag it scores
                how well the window matches its shifted copy:

                           2 · Σ x[j]·x[j+τ]
                n(τ) = ─────────────────────────
                        Σ (x[j]² + x[j+τ]²)

                Both sums run over the overlapping part, j = 0 .. N-1-τ.
                n(τ) lives in [-1, 1]. 1 means a perfect match, -1 a perfect
                inversion, 0 no relation.

  key maximum   The highest point of one positive lobe of n(τ).

  clarity       The NSDF value at the chosen key maximum. A pure tone scores
                close to 1.0, noise scores close to 0.0.


Why NSDF Instead of Plain Autocorrelation
-----------------------------------------

The numerator alone (autocorrelation) shrinks as τ grows, simply because
fewer samples overlap. Dividing by the energy of the overlapping part undoes
that bias, so the peak at two periods is as tall as the peak at one period.
That is what lets us pick "the first peak that is nearly as tall as the
tallest" without being fooled by octave errors.


Computing It Fast
-----------------

The numerator for every lag is the autocorrelation, which the FFT gives us in
O(N log N):

    X = FFT(x zero-padded to ≥ 2N)
    r = IFFT(|X|²) / len

Zero padding to at least 2N keeps the circular correlation from wrapping
around. The denominator is updated in O(1) per lag:

    m(0) = 2 · Σ x²
    m(τ) = m(τ-1) - x[τ-1]² - x[N-τ]²


Picking the Period
------------------

    n(τ)
    1.0 ┐╲              ╱╲             ╱╲
        │ ╲            ╱  ╲           ╱  ╲
    0.0 ┼──╲──────────╱────╲─────────╱────╲──→ τ
        │   ╲        ╱      ╲       ╱      ╲
   -1.0 ┘    ╲______╱        ╲_____╱
        skip    key max #1      key max #2

1. Skip the lobe around τ = 0 (every signal matches itself there).
2. In each later positive lobe, remember the highest point.
3. Choose the first key maximum whose height is at least 0.9 × the tallest.
4. Fit a parabola through the chosen point and its neighbours to get a
   fractional lag and a refined peak height.

Only lags up to N/2 are examined: beyond that the overlap is too short for
the score to mean much. A lobe cut off at N/2 still counts if its peak is
inside the range and the curve is already falling at the edge, so the
longest usable period is N/2 - 2 lags: sample_rate / (N/2 - 2), about 43 Hz
for a 2048-sample window at 44.1 kHz.
*/

/// Fraction of the tallest key maximum a peak must reach to be chosen.
const PEAK_RATIO: f32 = 0.9;

/// Mean-square level under which a window counts as silence.
const SILENCE_MEAN_SQUARE: f64 = 1e-10;

/// One frame's pitch estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz, `None` when no periodicity was found.
    pub frequency_hz: Option<f32>,
    /// Confidence in [0, 1]; 1.0 is perfectly periodic.
    pub clarity: f32,
}

impl PitchEstimate {
    /// No periodicity found.
    pub const UNPITCHED: Self = Self {
        frequency_hz: None,
        clarity: 0.0,
    };

    pub fn new(frequency_hz: f32, clarity: f32) -> Self {
        Self {
            frequency_hz: Some(frequency_hz),
            clarity,
        }
    }
}

/// Reusable McLeod pitch detector for a fixed window size.
///
/// All buffers are allocated in [`McLeodDetector::new`]; [`estimate`] never
/// allocates, so one instance can serve every frame of a session.
///
/// [`estimate`]: McLeodDetector::estimate
pub struct McLeodDetector {
    window_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// Zero-padded window, then spectrum, then autocorrelation (in place)
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    nsdf: Vec<f32>,
    key_maxima: Vec<usize>,
}

impl McLeodDetector {
    /// Create a detector for windows of exactly `window_size` samples.
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(4);
        let fft_len = (2 * window_size).next_power_of_two();

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            window_size,
            forward,
            inverse,
            spectrum: vec![Complex::new(0.0, 0.0); fft_len],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            nsdf: vec![0.0; window_size / 2],
            key_maxima: Vec::with_capacity(window_size / 4),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Lowest frequency this detector can report at `sample_rate`.
    ///
    /// A key maximum needs one falling lag after it inside the examined
    /// range, so the longest usable period is two lags short of N/2.
    pub fn min_frequency(&self, sample_rate: f32) -> f32 {
        sample_rate / (self.nsdf.len() - 2) as f32
    }

    /// Estimate the fundamental frequency of `window`.
    ///
    /// Returns [`PitchEstimate::UNPITCHED`] for silence, non-finite samples, a
    /// window of the wrong length, or a signal without a repeating lobe.
    pub fn estimate(&mut self, window: &[f32], sample_rate: f32) -> PitchEstimate {
        if window.len() != self.window_size || !(sample_rate > 0.0) {
            return PitchEstimate::UNPITCHED;
        }
        if window.iter().any(|s| !s.is_finite()) {
            return PitchEstimate::UNPITCHED;
        }
        if !self.compute_nsdf(window) {
            return PitchEstimate::UNPITCHED;
        }

        self.collect_key_maxima();
        let Some(&first) = self.key_maxima.first() else {
            return PitchEstimate::UNPITCHED;
        };

        let tallest = self
            .key_maxima
            .iter()
            .map(|&i| self.nsdf[i])
            .fold(f32::MIN, f32::max);
        let chosen = self
            .key_maxima
            .iter()
            .copied()
            .find(|&i| self.nsdf[i] >= PEAK_RATIO * tallest)
            .unwrap_or(first);

        let (lag, peak) = self.refine(chosen);
        if !(lag > 0.0) {
            return PitchEstimate::UNPITCHED;
        }

        PitchEstimate::new(sample_rate / lag, peak.clamp(0.0, 1.0))
    }

    /// Fill `self.nsdf`. Returns false when the window is silent.
    fn compute_nsdf(&mut self, window: &[f32]) -> bool {
        for (i, bin) in self.spectrum.iter_mut().enumerate() {
            *bin = Complex::new(window.get(i).copied().unwrap_or(0.0), 0.0);
        }

        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);
        for bin in self.spectrum.iter_mut() {
            *bin = Complex::new(bin.norm_sqr(), 0.0);
        }
        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        // rustfft leaves the inverse unnormalized
        let scale = 1.0 / self.spectrum.len() as f64;
        let n = window.len();

        let mut m: f64 = window.iter().map(|&x| 2.0 * (x as f64) * (x as f64)).sum();
        if m / (2.0 * n as f64) < SILENCE_MEAN_SQUARE {
            return false;
        }

        for tau in 0..self.nsdf.len() {
            if tau > 0 {
                let head = window[tau - 1] as f64;
                let tail = window[n - tau] as f64;
                m -= head * head + tail * tail;
            }
            let r = self.spectrum[tau].re as f64 * scale;
            self.nsdf[tau] = if m > f64::EPSILON {
                (2.0 * r / m) as f32
            } else {
                0.0
            };
        }

        true
    }

    /// Record the peak of every positive lobe after the one at lag 0.
    ///
    /// The last lobe may be cut off at N/2. It still counts once its peak is
    /// interior and the NSDF is falling at the edge.
    fn collect_key_maxima(&mut self) {
        self.key_maxima.clear();
        let nsdf = &self.nsdf;
        let len = nsdf.len();

        let mut i = 0;
        while i < len && nsdf[i] > 0.0 {
            i += 1;
        }

        loop {
            while i < len && nsdf[i] <= 0.0 {
                i += 1;
            }
            if i >= len {
                break;
            }

            let mut peak = i;
            while i < len && nsdf[i] > 0.0 {
                if nsdf[i] > nsdf[peak] {
                    peak = i;
                }
                i += 1;
            }

            if i >= len {
                // A lobe still rising at the edge has no trustworthy peak
                if peak + 1 < len && nsdf[len - 1] < nsdf[peak] {
                    self.key_maxima.push(peak);
                }
                break;
            }
            self.key_maxima.push(peak);
        }
    }

    /// Parabolic interpolation around `index`: (fractional lag, peak height).
    fn refine(&self, index: usize) -> (f32, f32) {
        let y1 = self.nsdf[index];
        if index == 0 || index + 1 >= self.nsdf.len() {
            return (index as f32, y1);
        }

        let y0 = self.nsdf[index - 1];
        let y2 = self.nsdf[index + 1];
        let a = (y0 + y2) / 2.0 - y1;
        let b = (y2 - y0) / 2.0;
        if a.abs() < f32::EPSILON {
            return (index as f32, y1);
        }

        (index as f32 - b / (2.0 * a), y1 - b * b / (4.0 * a))
    }
}
