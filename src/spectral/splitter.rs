//! Bin-to-channel reduction and adaptive thresholding.

use super::THRES_WEIGHT;
use crate::params::FrameParams;

/// Guard against division by a zero ground power in ratio mode
const GROUND_EPSILON: f32 = 1e-10;

/// How a channel peak becomes an envelope sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdMode {
    /// Binary keying: 1 when the peak clears `avg_power * weight`
    Threshold { weight: f32 },
    /// Peak over ground, floored at 1
    Ratio,
    /// Peak with the ground subtracted, floored at 0
    Bottom,
    /// Raw peak
    Passthrough,
}

impl Default for ThresholdMode {
    fn default() -> Self {
        ThresholdMode::Threshold {
            weight: THRES_WEIGHT,
        }
    }
}

impl ThresholdMode {
    /// Map one channel peak to an envelope sample.
    ///
    /// The threshold comparison is strict so that pure silence (peak and
    /// ground both zero) stays sub-threshold.
    pub fn apply(self, peak: f32, avg_power: f32) -> f32 {
        match self {
            ThresholdMode::Threshold { weight } => {
                if peak > avg_power * weight {
                    1.0
                } else {
                    0.0
                }
            }
            ThresholdMode::Ratio => (peak / avg_power.max(GROUND_EPSILON)).max(1.0),
            ThresholdMode::Bottom => (peak - avg_power).max(0.0),
            ThresholdMode::Passthrough => peak,
        }
    }
}

/// Reduces the magnitude spectrum to one peak per channel.
///
/// Channel `c` owns the bins `{ b : b*channel_count/bin_count == c }`; with
/// two bins per channel that is bins `2c` and `2c+1`. The reduction is a
/// maximum, making the envelope a peak detector.
#[derive(Debug)]
pub struct ChannelSplitter {
    channel_count: usize,
    bin_count: usize,
    mode: ThresholdMode,
    peaks: Vec<f32>,
}

impl ChannelSplitter {
    pub fn new(params: &FrameParams, mode: ThresholdMode) -> Self {
        Self {
            channel_count: params.channel_count,
            bin_count: params.bin_count,
            mode,
            peaks: vec![0.0; params.channel_count],
        }
    }

    pub fn mode(&self) -> ThresholdMode {
        self.mode
    }

    /// Fold a magnitude spectrum into per-channel peaks.
    pub fn reduce(&mut self, magnitudes: &[f32]) -> &[f32] {
        debug_assert_eq!(magnitudes.len(), self.bin_count);
        self.peaks.fill(0.0);
        for (b, &m) in magnitudes.iter().enumerate() {
            let c = b * self.channel_count / self.bin_count;
            if m > self.peaks[c] {
                self.peaks[c] = m;
            }
        }
        &self.peaks
    }
}
