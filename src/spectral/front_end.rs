//! Spectral front end: raw audio in, magnitude spectrum out.
//!
//! Keeps a sliding window of `fft_size` samples. Each frame reads `step`
//! new samples from the stream, shifts the previous tail forward, applies
//! a Hamming window to a scratch copy, runs the forward FFT and takes
//! per-bin magnitudes. An optional spur filter subtracts a fraction of the
//! neighboring bins from each magnitude.

use std::io::{ErrorKind, Read};
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::NEIGH_WEIGHT;
use crate::params::FrameParams;

/// Wire encoding of the input samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// 32-bit little-endian floats already in [-1, 1)
    #[default]
    F32Le,
    /// Signed 16-bit little-endian integers, normalized by 1/32768
    S16Le,
}

impl SampleFormat {
    fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::F32Le => 4,
            SampleFormat::S16Le => 2,
        }
    }
}

/// Front-end options fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct FrontEndConfig {
    pub format: SampleFormat,
    /// Apply the Hamming window before the transform
    pub window: bool,
    /// Subtract neighbor magnitudes to attenuate spectral spurs
    pub subtract_neighbors: bool,
}

impl Default for FrontEndConfig {
    fn default() -> Self {
        Self {
            format: SampleFormat::F32Le,
            window: true,
            subtract_neighbors: true,
        }
    }
}

/// Outcome of one framing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    /// A full frame was read; `magnitudes()` holds the new spectrum
    Ready,
    /// The stream ended exactly on a frame boundary
    Eof,
    /// The stream ended mid-frame; the partial frame is discarded
    ShortRead,
}

/// Streaming short-time spectral transform over a byte source.
pub struct SpectralFrontEnd<R: Read> {
    reader: R,
    config: FrontEndConfig,
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    step: usize,
    bin_count: usize,
    samples: Vec<f32>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    raw: Vec<u8>,
    magnitudes: Vec<f32>,
    filtered: Vec<f32>,
}

impl<R: Read> SpectralFrontEnd<R> {
    /// Build the front end; the FFT plan and all scratch buffers are
    /// allocated here and reused for every frame.
    pub fn new(reader: R, params: &FrameParams, config: FrontEndConfig) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(params.fft_size);
        let window = hamming(params.fft_size);
        Self {
            reader,
            config,
            fft,
            fft_size: params.fft_size,
            step: params.step,
            bin_count: params.bin_count,
            samples: vec![0.0; params.fft_size],
            window,
            scratch: vec![Complex::new(0.0, 0.0); params.fft_size],
            raw: vec![0; params.step * config.format.bytes_per_sample()],
            magnitudes: vec![0.0; params.bin_count],
            filtered: vec![0.0; params.bin_count],
        }
    }

    /// Advance the sliding window by `step` samples and transform.
    ///
    /// Interrupted reads are retried; any other read error is treated as a
    /// short read, which the caller handles as a clean end of stream.
    pub fn read_frame(&mut self) -> FrameResult {
        let want = self.raw.len();
        let mut filled = 0;
        while filled < want {
            match self.reader.read(&mut self.raw[filled..want]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        if filled == 0 {
            return FrameResult::Eof;
        }
        if filled < want {
            return FrameResult::ShortRead;
        }

        // Shift the previous tail forward, decode new samples behind it
        self.samples.copy_within(self.step.., 0);
        let tail = self.fft_size - self.step;
        match self.config.format {
            SampleFormat::F32Le => {
                for (dst, chunk) in self.samples[tail..].iter_mut().zip(self.raw.chunks_exact(4)) {
                    *dst = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
            }
            SampleFormat::S16Le => {
                for (dst, chunk) in self.samples[tail..].iter_mut().zip(self.raw.chunks_exact(2)) {
                    *dst = i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / 32768.0;
                }
            }
        }

        self.transform();
        FrameResult::Ready
    }

    /// Magnitude spectrum of the most recent `Ready` frame.
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    fn transform(&mut self) {
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let x = if self.config.window {
                self.samples[i] * self.window[i]
            } else {
                self.samples[i]
            };
            *slot = Complex::new(x, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (m, c) in self.magnitudes.iter_mut().zip(&self.scratch[..self.bin_count]) {
            *m = c.norm();
        }

        if self.config.subtract_neighbors && self.bin_count >= 2 {
            self.subtract_spurs();
        }
    }

    /// `m'[k] = max(0, m[k] - 0.5*W*(m[k-1] + m[k+1]))`; edge bins use the
    /// single available neighbor at weight `W`.
    fn subtract_spurs(&mut self) {
        let m = &self.magnitudes;
        let last = self.bin_count - 1;
        self.filtered[0] = (m[0] - NEIGH_WEIGHT * m[1]).max(0.0);
        for k in 1..last {
            self.filtered[k] = (m[k] - 0.5 * NEIGH_WEIGHT * (m[k - 1] + m[k + 1])).max(0.0);
        }
        self.filtered[last] = (m[last] - NEIGH_WEIGHT * m[last - 1]).max(0.0);
        std::mem::swap(&mut self.magnitudes, &mut self.filtered);
    }

    #[cfg(test)]
    fn window_samples(&self) -> &[f32] {
        &self.samples
    }
}

fn hamming(len: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    let denom = len.saturating_sub(1).max(1) as f32;
    (0..len)
        .map(|n| 0.54 - 0.46 * f32::cos(2.0 * PI * n as f32 / denom))
        .collect()
}
