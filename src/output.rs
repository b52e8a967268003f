//! Line output with post-decode character repair.
//!
//! Stray decodes around word boundaries come out as the short letters T, E
//! and I. The repair filter holds such letters when they directly follow a
//! space and only lets them through if real text follows — or, under the
//! default policy, drops them entirely.

use std::io::{self, BufWriter, Write};

use crate::channel::ChannelPipeline;

/// Letters (and the separator itself) considered boundary noise.
fn is_noise(byte: u8) -> bool {
    matches!(byte, b'T' | b'E' | b'I' | b' ')
}

/// Most held bytes; older ones are discarded first.
const MAX_HELD: usize = 3;

/// What happens to held noise bytes when real text arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairPolicy {
    /// Discard the held bytes and emit only the new byte
    #[default]
    Drop,
    /// Emit the held bytes ahead of the new byte
    Emit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairState {
    Normal,
    AfterSpace,
    Holding,
}

/// Per-channel repair state machine.
#[derive(Debug)]
pub struct RepairFilter {
    policy: RepairPolicy,
    state: RepairState,
    held: [u8; MAX_HELD],
    held_len: usize,
}

impl RepairFilter {
    pub fn new(policy: RepairPolicy) -> Self {
        Self {
            policy,
            state: RepairState::Normal,
            held: [0; MAX_HELD],
            held_len: 0,
        }
    }

    /// Feed one decoded byte; emitted bytes are appended to `out`.
    pub fn push(&mut self, byte: u8, out: &mut Vec<u8>) {
        match self.state {
            RepairState::Normal => {
                out.push(byte);
                if byte == b' ' {
                    self.state = RepairState::AfterSpace;
                }
            }
            RepairState::AfterSpace => {
                if is_noise(byte) {
                    self.hold(byte);
                    self.state = RepairState::Holding;
                } else {
                    out.push(byte);
                    self.state = RepairState::Normal;
                }
            }
            RepairState::Holding => {
                if is_noise(byte) {
                    self.hold(byte);
                } else {
                    if self.policy == RepairPolicy::Emit {
                        out.extend_from_slice(&self.held[..self.held_len]);
                    }
                    self.held_len = 0;
                    out.push(byte);
                    self.state = RepairState::Normal;
                }
            }
        }
    }

    /// End of stream: resolve any held bytes.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if self.policy == RepairPolicy::Emit {
            out.extend_from_slice(&self.held[..self.held_len]);
        }
        self.held_len = 0;
        self.state = RepairState::Normal;
    }

    fn hold(&mut self, byte: u8) {
        if self.held_len == MAX_HELD {
            self.held.copy_within(1.., 0);
            self.held_len -= 1;
        }
        self.held[self.held_len] = byte;
        self.held_len += 1;
    }
}

/// Drains channel output rings and prints `"{freq_hz}:{text}"` lines.
pub struct OutputFormatter<W: Write> {
    writer: BufWriter<W>,
    print_chars: usize,
    raw: Vec<u8>,
    text: Vec<u8>,
}

impl<W: Write> OutputFormatter<W> {
    pub fn new(writer: W, print_chars: usize) -> Self {
        Self {
            writer: BufWriter::new(writer),
            print_chars,
            raw: Vec::new(),
            text: Vec::new(),
        }
    }

    /// Print the channel's pending text once it has accumulated enough.
    ///
    /// The header prints whenever the threshold is met, even when the
    /// repair filter swallows the whole batch. With `force` the threshold
    /// drops to a single byte and the repair filter is finalized; used
    /// once per channel at end of stream.
    pub fn drain_channel(&mut self, chan: &mut ChannelPipeline, force: bool) -> io::Result<()> {
        let threshold = if force { 1 } else { self.print_chars };

        self.raw.clear();
        self.text.clear();
        let drained = chan.pending() >= threshold;
        if drained {
            chan.take_pending(&mut self.raw);
        }
        for i in 0..self.raw.len() {
            let byte = self.raw[i];
            chan.repair_mut().push(byte, &mut self.text);
        }
        if force {
            chan.repair_mut().finish(&mut self.text);
        }

        if !drained && self.text.is_empty() {
            return Ok(());
        }
        write!(self.writer, "{}:", chan.freq_hz())?;
        self.writer.write_all(&self.text)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}
