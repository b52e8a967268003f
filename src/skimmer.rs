//! The skimmer loop: frame in, envelope fan-out, decoded lines out.
//!
//! Single-threaded and cooperative. Each frame is read, transformed,
//! folded into the ground estimate and split into per-channel envelope
//! bursts; every channel then drives its decoder and the formatter drains
//! whatever decoded text has accumulated. On end of stream the channels
//! are flushed and drained once more.

use std::io::{self, Read, Write};

use snafu::{ResultExt, Snafu};

use crate::channel::ChannelPipeline;
use crate::output::{OutputFormatter, RepairPolicy};
use crate::params::FrameParams;
use crate::spectral::{
    ChannelSplitter, FrameResult, FrontEndConfig, NoiseEstimator, SpectralFrontEnd, ThresholdMode,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed writing decoded output: {source}"))]
    WriteOutput { source: io::Error },
}

/// Everything configurable about a run, fixed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkimmerConfig {
    pub params: FrameParams,
    pub front_end: FrontEndConfig,
    pub mode: ThresholdMode,
    pub repair: RepairPolicy,
    /// Decoders also emit their dit/dah element trace
    pub show_cw: bool,
    /// Per-frame diagnostic line on standard error
    pub diagnostics: bool,
}

/// Counters reported when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkimStats {
    /// Whole frames processed
    pub frames: u64,
    /// Envelope bursts dropped to backpressure
    pub dropped_bursts: u64,
}

/// The assembled pipeline. Construction allocates everything; the loop
/// itself never allocates.
pub struct Skimmer<R: Read, W: Write> {
    front_end: SpectralFrontEnd<R>,
    noise: NoiseEstimator,
    splitter: ChannelSplitter,
    channels: Vec<ChannelPipeline>,
    formatter: OutputFormatter<W>,
    params: FrameParams,
    diagnostics: bool,
    diag_line: String,
    diag_out: Box<dyn Write>,
    stats: SkimStats,
}

impl<R: Read, W: Write> Skimmer<R, W> {
    pub fn new(reader: R, writer: W, config: SkimmerConfig) -> Self {
        let params = config.params;
        let channels = (0..params.channel_count)
            .map(|c| {
                ChannelPipeline::new(
                    params.channel_freq_hz(c),
                    &params,
                    config.show_cw,
                    config.repair,
                )
            })
            .collect();
        Self {
            front_end: SpectralFrontEnd::new(reader, &params, config.front_end),
            noise: NoiseEstimator::new(&params),
            splitter: ChannelSplitter::new(&params, config.mode),
            channels,
            formatter: OutputFormatter::new(writer, params.print_chars),
            params,
            diagnostics: config.diagnostics,
            diag_line: String::new(),
            diag_out: Box::new(io::stderr()),
            stats: SkimStats::default(),
        }
    }

    /// Redirect the per-frame diagnostic line away from standard error.
    pub fn set_diag_writer(&mut self, writer: Box<dyn Write>) {
        self.diag_out = writer;
    }

    /// Run until the input ends, then flush and drain every channel.
    pub fn run(mut self) -> Result<SkimStats, Error> {
        loop {
            match self.front_end.read_frame() {
                FrameResult::Ready => self.process_frame()?,
                FrameResult::Eof | FrameResult::ShortRead => break,
            }
        }
        self.finish()?;
        tracing::debug!(
            frames = self.stats.frames,
            dropped = self.stats.dropped_bursts,
            "stream finished"
        );
        Ok(self.stats)
    }

    fn process_frame(&mut self) -> Result<(), Error> {
        self.stats.frames += 1;

        let Self {
            front_end,
            noise,
            splitter,
            channels,
            formatter,
            params,
            diag_line,
            stats,
            ..
        } = self;

        let magnitudes = front_end.magnitudes();
        let avg_power = noise.update(magnitudes);
        let mode = splitter.mode();
        let peaks = splitter.reduce(magnitudes);
        let max_power = peaks.iter().cloned().fold(0.0f32, f32::max);

        diag_line.clear();
        for (c, chan) in channels.iter_mut().enumerate() {
            let peak = peaks[c];
            let env = mode.apply(peak, avg_power);
            if self.diagnostics {
                diag_line.push(diag_glyph(peak, env, max_power));
            }

            if !chan.push_envelope(env, params.step) {
                stats.dropped_bursts += 1;
                tracing::trace!(channel = c, "envelope burst dropped");
                continue;
            }
            chan.run_decoder();
            formatter
                .drain_channel(chan, false)
                .context(WriteOutputSnafu)?;
        }

        if self.diagnostics {
            let _ = writeln!(
                self.diag_out,
                "{} ({:.2}, {:.2})",
                self.diag_line,
                avg_power,
                max_power
            );
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        for chan in &mut self.channels {
            chan.flush();
            self.formatter
                .drain_channel(chan, true)
                .context(WriteOutputSnafu)?;
        }
        Ok(())
    }
}

/// One diagnostic glyph per channel: `.` below threshold, else the peak
/// scaled against the strongest channel this frame.
fn diag_glyph(peak: f32, env: f32, max_power: f32) -> char {
    if env <= 0.0 || max_power <= 0.0 {
        '.'
    } else {
        let digit = (peak / max_power * 10.0).round().clamp(0.0, 9.0) as u8;
        (b'0' + digit) as char
    }
}
