//! Per-channel ownership bundle: ring pair, decoder and repair state.

use crate::cw::CwDecoder;
use crate::output::{RepairFilter, RepairPolicy};
use crate::params::FrameParams;
use crate::ring::RingBuffer;

/// One decoding channel. Owns both rings and its decoder exclusively; the
/// skimmer holds all channels in a single vector.
#[derive(Debug)]
pub struct ChannelPipeline {
    freq_hz: u32,
    input: RingBuffer<f32>,
    output: RingBuffer<u8>,
    decoder: CwDecoder,
    repair: RepairFilter,
}

impl ChannelPipeline {
    pub fn new(freq_hz: u32, params: &FrameParams, show_cw: bool, policy: RepairPolicy) -> Self {
        Self {
            freq_hz,
            // At least one second of envelope history
            input: RingBuffer::with_capacity(params.sample_rate as usize),
            output: RingBuffer::with_capacity(4 * params.print_chars),
            decoder: CwDecoder::new(params.sample_rate, show_cw),
            repair: RepairFilter::new(policy),
        }
    }

    pub fn freq_hz(&self) -> u32 {
        self.freq_hz
    }

    /// Push one envelope sample replicated `count` times, keeping the
    /// decoder's time base aligned with the audio stream.
    ///
    /// Returns false without writing anything when the ring lacks space;
    /// the decoder is behind and the burst is dropped.
    pub fn push_envelope(&mut self, env: f32, count: usize) -> bool {
        if self.input.writeable() < count {
            return false;
        }
        self.input.push_splat(env, count);
        true
    }

    /// Let the decoder catch up with everything buffered.
    pub fn run_decoder(&mut self) {
        while self.decoder.can_process(&self.input) {
            self.decoder.process(&mut self.input, &mut self.output);
        }
    }

    /// Decoded bytes waiting in the output ring.
    pub fn pending(&self) -> usize {
        self.output.available()
    }

    /// Move all pending decoder output into `out`.
    pub fn take_pending(&mut self, out: &mut Vec<u8>) {
        while self.output.available() > 0 {
            let slice = self.output.read_slice();
            out.extend_from_slice(slice);
            let n = slice.len();
            self.output.consume(n);
        }
    }

    pub fn repair_mut(&mut self) -> &mut RepairFilter {
        &mut self.repair
    }

    /// End-of-stream: feed silence so a character still pending inside the
    /// decoder is emitted before the final drain.
    pub fn flush(&mut self) {
        let n = self.input.writeable();
        self.input.push_splat(0.0, n);
        self.run_decoder();
    }

    /// Inject a byte as if the decoder had emitted it.
    #[cfg(test)]
    pub(crate) fn push_decoded(&mut self, byte: u8) {
        self.output.push_overwrite(byte);
    }
}
