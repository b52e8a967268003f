//! Multichannel CW skimmer.
//!
//! Splits an audio stream into ~100 Hz channels with a short-time FFT and
//! independently decodes Morse on every channel, printing the frequency
//! and decoded text per channel.

pub mod channel;
pub mod cw;
pub mod output;
pub mod params;
pub mod ring;
pub mod skimmer;
pub mod spectral;
pub mod tracing_init;

pub use params::FrameParams;
pub use skimmer::{SkimStats, Skimmer, SkimmerConfig};
