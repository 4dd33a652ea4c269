//! Sine-windowed short-time Fourier transform with 50% overlap.

use hades_core::{SignalContainer, HOP_SIZE};
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis window length in samples.
pub const WINDOW_LEN: usize = 2 * HOP_SIZE;

/// Non-negative frequency bins, DC to Nyquist inclusive.
pub const NUM_BANDS: usize = WINDOW_LEN / 2 + 1;

const ZERO: Complex32 = Complex32::new(0.0, 0.0);

/// `sin(pi (n + 0.5) / len)`; squared, it overlap-adds to one at hop `len / 2`.
pub fn sine_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| (PI * (n as f32 + 0.5) / len as f32).sin())
        .collect()
}

pub fn band_frequencies(sample_rate: f32) -> Vec<f32> {
    (0..NUM_BANDS)
        .map(|k| k as f32 * sample_rate / WINDOW_LEN as f32)
        .collect()
}

/// `WINDOW_LEN`-point spectrum of a zero-padded or truncated impulse response.
pub fn ir_spectrum(fft: &dyn Fft<f32>, ir: &[f32], out: &mut [Complex32]) {
    let mut buffer = vec![ZERO; WINDOW_LEN];
    for (dst, &src) in buffer.iter_mut().zip(ir) {
        dst.re = src;
    }
    fft.process(&mut buffer);
    out.copy_from_slice(&buffer[..NUM_BANDS]);
}

/// Multichannel forward transform, one spectrum per hop.
///
/// Each slot covers the previous hop and the current one, so output lags
/// input by [`HOP_SIZE`] samples.
pub struct ForwardStft {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Last hop of the previous frame, per channel.
    history: Vec<Vec<f32>>,
    buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl ForwardStft {
    pub fn new(num_channels: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(WINDOW_LEN);
        let scratch = vec![ZERO; fft.get_inplace_scratch_len()];
        Self {
            fft,
            window: sine_window(WINDOW_LEN),
            history: vec![vec![0.0; HOP_SIZE]; num_channels],
            buffer: vec![ZERO; WINDOW_LEN],
            scratch,
        }
    }

    pub fn reset(&mut self) {
        for channel in &mut self.history {
            channel.fill(0.0);
        }
    }

    /// Transform `frame_size` samples of every channel into `signals`
    /// (`frame_size / HOP_SIZE` slots).
    pub fn analyse(&mut self, input: &[Vec<f32>], frame_size: usize, signals: &mut SignalContainer) {
        let num_slots = (frame_size / HOP_SIZE).min(signals.num_slots());
        if num_slots == 0 {
            return;
        }
        for (ch, (samples, history)) in input.iter().zip(&mut self.history).enumerate() {
            for slot in 0..num_slots {
                let current = &samples[slot * HOP_SIZE..(slot + 1) * HOP_SIZE];
                let previous = if slot == 0 {
                    &history[..]
                } else {
                    &samples[(slot - 1) * HOP_SIZE..slot * HOP_SIZE]
                };
                for (i, (dst, &w)) in self.buffer.iter_mut().zip(&self.window).enumerate() {
                    let s = if i < HOP_SIZE {
                        previous[i]
                    } else {
                        current[i - HOP_SIZE]
                    };
                    *dst = Complex32::new(s * w, 0.0);
                }
                self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
                for (band, &bin) in self.buffer[..NUM_BANDS].iter().enumerate() {
                    signals.bin_mut(slot, band)[ch] = bin;
                }
            }
            history.copy_from_slice(&samples[(num_slots - 1) * HOP_SIZE..num_slots * HOP_SIZE]);
        }
    }
}

/// Multichannel inverse transform with overlap-add.
pub struct InverseStft {
    ifft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    overlap: Vec<Vec<f32>>,
    buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl InverseStft {
    pub fn new(num_channels: usize) -> Self {
        let ifft = FftPlanner::new().plan_fft_inverse(WINDOW_LEN);
        let scratch = vec![ZERO; ifft.get_inplace_scratch_len()];
        Self {
            ifft,
            window: sine_window(WINDOW_LEN),
            overlap: vec![vec![0.0; HOP_SIZE]; num_channels],
            buffer: vec![ZERO; WINDOW_LEN],
            scratch,
        }
    }

    pub fn reset(&mut self) {
        for channel in &mut self.overlap {
            channel.fill(0.0);
        }
    }

    /// Turn one `NUM_BANDS` half-spectrum into `HOP_SIZE` output samples.
    pub fn synthesise(&mut self, channel: usize, spectrum: &[Complex32], out: &mut [f32]) {
        let half = WINDOW_LEN / 2;
        self.buffer[0] = Complex32::new(spectrum[0].re, 0.0);
        self.buffer[half] = Complex32::new(spectrum[half].re, 0.0);
        for k in 1..half {
            self.buffer[k] = spectrum[k];
            self.buffer[WINDOW_LEN - k] = spectrum[k].conj();
        }
        self.ifft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / WINDOW_LEN as f32;
        let overlap = &mut self.overlap[channel];
        for i in 0..HOP_SIZE {
            out[i] = overlap[i] + self.buffer[i].re * scale * self.window[i];
            overlap[i] = self.buffer[i + HOP_SIZE].re * scale * self.window[i + HOP_SIZE];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hades_core::FRAME_SIZE;

    #[test]
    fn test_band_frequencies() {
        let freqs = band_frequencies(48_000.0);
        assert_eq!(freqs.len(), 129);
        assert_eq!(freqs[0], 0.0);
        assert_relative_eq!(freqs[128], 24_000.0);
    }

    #[test]
    fn test_window_overlap_adds_to_one() {
        let w = sine_window(WINDOW_LEN);
        for n in 0..HOP_SIZE {
            assert_relative_eq!(w[n] * w[n] + w[n + HOP_SIZE] * w[n + HOP_SIZE], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_reconstruction_delayed_by_one_hop() {
        let num_slots = FRAME_SIZE / HOP_SIZE;
        let mut forward = ForwardStft::new(1);
        let mut inverse = InverseStft::new(1);
        let mut signals = SignalContainer::new(num_slots, NUM_BANDS, 1);
        let mut spectrum = vec![ZERO; NUM_BANDS];

        let input: Vec<f32> = (0..2 * FRAME_SIZE)
            .map(|n| (n as f32 * 0.05).sin() + 0.3 * (n as f32 * 0.31).cos())
            .collect();
        let mut output = vec![0.0; 2 * FRAME_SIZE];

        for (frame_in, frame_out) in input.chunks(FRAME_SIZE).zip(output.chunks_mut(FRAME_SIZE)) {
            forward.analyse(&[frame_in.to_vec()], FRAME_SIZE, &mut signals);
            for slot in 0..num_slots {
                for (band, bin) in spectrum.iter_mut().enumerate() {
                    *bin = signals.bin(slot, band)[0];
                }
                inverse.synthesise(0, &spectrum, &mut frame_out[slot * HOP_SIZE..(slot + 1) * HOP_SIZE]);
            }
        }

        for n in HOP_SIZE..2 * FRAME_SIZE {
            assert_relative_eq!(output[n], input[n - HOP_SIZE], epsilon = 1e-4);
        }
    }
}
