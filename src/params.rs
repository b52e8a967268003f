//! Frame geometry derived from the sample rate.
//!
//! The band from DC to Nyquist is split into ~100 Hz channels, each channel
//! covering two 50 Hz FFT bins. All sizes are fixed once at startup.

/// Lowest accepted sample rate in Hz
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest accepted sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 48000;

/// Fewest pending characters that trigger a printout
pub const MIN_PRINT_CHARS: usize = 1;

/// Most pending characters that trigger a printout
pub const MAX_PRINT_CHARS: usize = 32;

/// Derived per-run frame parameters, immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    /// Input sample rate in Hz
    pub sample_rate: u32,
    /// Number of ~100 Hz decoding channels
    pub channel_count: usize,
    /// FFT length in samples (four bins per channel width)
    pub fft_size: usize,
    /// Positive-frequency bin count (two bins per channel)
    pub bin_count: usize,
    /// New input samples consumed per frame
    pub step: usize,
    /// Pending characters required before a channel line is printed
    pub print_chars: usize,
}

impl FrameParams {
    /// Build the frame geometry for a sample rate and print threshold.
    ///
    /// Out-of-range values are clamped, not rejected.
    pub fn new(sample_rate: u32, print_chars: usize) -> Self {
        let sample_rate = sample_rate.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE);
        let print_chars = print_chars.clamp(MIN_PRINT_CHARS, MAX_PRINT_CHARS);
        let channel_count = (sample_rate / 200) as usize;
        let fft_size = 4 * channel_count;
        Self {
            sample_rate,
            channel_count,
            fft_size,
            bin_count: fft_size / 2,
            step: fft_size,
            print_chars,
        }
    }

    /// Center-aligned frequency label for a channel, in integer Hz.
    pub fn channel_freq_hz(&self, channel: usize) -> u32 {
        channel as u32 * self.sample_rate / 2 / self.channel_count as u32
    }
}

impl Default for FrameParams {
    fn default() -> Self {
        Self::new(MAX_SAMPLE_RATE, 8)
    }
}
