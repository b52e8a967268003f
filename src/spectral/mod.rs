//! Spectral analysis stage: framing, transform, ground noise, channel split.
//!
//! One frame of `step` new samples goes through a windowed FFT; the bin
//! magnitudes feed a rolling ground-power estimate and are reduced to one
//! envelope sample per ~100 Hz channel.
//!
//! **Module organization**:
//! - `front_end` - framing, windowing, FFT, magnitude post-processing
//! - `noise` - populated-scale ground power estimator
//! - `splitter` - bin-to-channel reduction and threshold modes

mod front_end;
mod noise;
mod splitter;

pub use front_end::{FrameResult, FrontEndConfig, SampleFormat, SpectralFrontEnd};
pub use noise::NoiseEstimator;
pub use splitter::{ChannelSplitter, ThresholdMode};

/// Number of logarithmic magnitude scales in the ground estimator
pub const MAX_SCALES: usize = 16;

/// Ground-power low-pass time constant in seconds
pub const AVG_SECONDS: f32 = 3.0;

/// Peak-over-ground factor for the default threshold envelope mode
pub const THRES_WEIGHT: f32 = 8.0;

/// Neighbor magnitude weight subtracted by the spur filter
pub const NEIGH_WEIGHT: f32 = 0.5;

/// Ground power at startup; high enough that warm-up under-triggers
pub const INITIAL_AVG_POWER: f32 = 4.0;
