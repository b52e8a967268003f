//! End-to-end skimmer tests over synthesized audio.


use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use cwskim::output::RepairPolicy;
use cwskim::params::FrameParams;
use cwskim::skimmer::{SkimStats, Skimmer, SkimmerConfig};
use cwskim::spectral::{FrontEndConfig, SampleFormat, ThresholdMode};

use test_utils::{
    f32le_bytes, init_test_tracing, key_cw, mix, s16le_bytes, uniform_noise,
};

fn run_skimmer(bytes: Vec<u8>, config: SkimmerConfig) -> (SkimStats, String) {
    let mut out = Vec::new();
    let stats = Skimmer::new(Cursor::new(bytes), &mut out, config)
        .run()
        .expect("skimmer run");
    (stats, String::from_utf8(out).expect("output is ASCII"))
}

fn config_48k(print_chars: usize, format: SampleFormat) -> SkimmerConfig {
    SkimmerConfig {
        params: FrameParams::new(48000, print_chars),
        front_end: FrontEndConfig {
            format,
            ..FrontEndConfig::default()
        },
        mode: ThresholdMode::default(),
        repair: RepairPolicy::default(),
        show_cw: false,
        diagnostics: false,
    }
}

#[test]
fn empty_input_exits_cleanly_with_no_output() {
    init_test_tracing();
    let (stats, out) = run_skimmer(Vec::new(), config_48k(8, SampleFormat::F32Le));
    assert_eq!(stats.frames, 0);
    assert!(out.is_empty(), "unexpected output: {out:?}");
}

#[test]
fn sub_threshold_noise_prints_nothing() {
    init_test_tracing();
    let noise = uniform_noise(48000 * 10, 0x2b5c, 0.01);
    let (stats, out) = run_skimmer(f32le_bytes(&noise), config_48k(8, SampleFormat::F32Le));
    assert_eq!(stats.frames, 500);
    assert!(out.is_empty(), "noise alone must not decode: {out:?}");
}

#[test]
fn keyed_carrier_decodes_on_its_channel_only() {
    init_test_tracing();
    // 625 Hz sits mid-channel 6 (600..700 Hz); the printed label is 600
    let mut audio = key_cw("PARIS PARIS", 20, 625.0, 48000, 0.5);
    let floor = uniform_noise(audio.len(), 0x5eed, 0.08);
    mix(&mut audio, &floor);

    let (stats, out) = run_skimmer(s16le_bytes(&audio), config_48k(5, SampleFormat::S16Le));
    assert!(stats.frames > 0);

    let lines: Vec<&str> = out.lines().collect();
    assert!(!lines.is_empty(), "the keyed channel must print something");
    for line in &lines {
        assert!(
            line.starts_with("600:"),
            "unexpected channel in output: {line:?}"
        );
    }

    let text: String = lines.iter().map(|l| &l[4..]).collect();
    assert!(text.contains("PARIS"), "decoded text was {text:?}");
}

#[test]
fn short_final_frame_is_discarded_and_tails_flush() {
    init_test_tracing();
    let params = FrameParams::new(48000, 8);
    // A single character, then the stream dies mid-frame
    let mut audio = key_cw("K", 20, 625.0, 48000, 0.5);
    let floor = uniform_noise(audio.len(), 0x17, 0.08);
    mix(&mut audio, &floor);
    // Cut inside a frame: the partial tail must be discarded
    let whole = audio.len() / params.fft_size - 1;
    audio.truncate(whole * params.fft_size + params.fft_size / 2);

    let (stats, out) = run_skimmer(s16le_bytes(&audio), config_48k(8, SampleFormat::S16Le));
    assert_eq!(stats.frames, whole as u64);
    assert!(
        out.contains('K'),
        "the pending character must survive the short read: {out:?}"
    );
}

#[test]
fn s16_and_f32_inputs_decode_the_same_text() {
    init_test_tracing();
    let mut audio = key_cw("CQ CQ", 20, 1225.0, 48000, 0.5);
    let floor = uniform_noise(audio.len(), 0x99, 0.08);
    mix(&mut audio, &floor);

    let (_, out_f) = run_skimmer(f32le_bytes(&audio), config_48k(2, SampleFormat::F32Le));
    let (_, out_i) = run_skimmer(s16le_bytes(&audio), config_48k(2, SampleFormat::S16Le));

    // Lines may chunk differently than words; compare the joined text
    let text: String = out_f
        .lines()
        .map(|l| l.trim_start_matches("1200:"))
        .collect();
    assert!(text.contains("CQ CQ"), "f32 run decoded {text:?}");
    assert_eq!(out_f, out_i, "sample formats must behave identically");
}

#[test]
fn dit_dah_trace_rides_the_output_lines() {
    init_test_tracing();
    let mut audio = key_cw("EE", 20, 625.0, 48000, 0.5);
    let floor = uniform_noise(audio.len(), 0x3a, 0.08);
    mix(&mut audio, &floor);

    let mut config = config_48k(1, SampleFormat::S16Le);
    config.show_cw = true;
    let (_, out) = run_skimmer(s16le_bytes(&audio), config);
    assert!(out.contains(".E"), "trace missing from {out:?}");
}

/// Capturable sink for the skimmer's diagnostic stream.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn diagnostic_line_shape_matches_channel_count() {
    init_test_tracing();
    let mut audio = key_cw("EE", 20, 625.0, 48000, 0.5);
    let floor = uniform_noise(audio.len(), 0x61, 0.08);
    mix(&mut audio, &floor);

    let mut config = config_48k(8, SampleFormat::S16Le);
    config.diagnostics = true;
    let channel_count = config.params.channel_count;

    let diag = SharedBuf::default();
    let mut out = Vec::new();
    let mut skimmer = Skimmer::new(Cursor::new(s16le_bytes(&audio)), &mut out, config);
    skimmer.set_diag_writer(Box::new(diag.clone()));
    let stats = skimmer.run().expect("skimmer run");

    let text = String::from_utf8(diag.contents()).expect("diagnostics are ASCII");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len() as u64, stats.frames, "one diagnostic line per frame");

    let mut keyed = 0;
    let mut idle = 0;
    for line in &lines {
        assert!(
            line.len() > channel_count,
            "diagnostic line too short: {line:?}"
        );
        let (glyphs, tail) = line.split_at(channel_count);

        // Exactly channel_count glyphs, each a dot or a digit
        for (c, g) in glyphs.chars().enumerate() {
            assert!(
                g == '.' || g.is_ascii_digit(),
                "bad glyph {g:?} in {line:?}"
            );
            if c != 6 {
                assert_eq!(g, '.', "only channel 6 may key in {line:?}");
            }
        }

        // Trailing " (avg_power, max_power)" with two parseable floats
        assert!(
            tail.starts_with(" (") && tail.ends_with(')'),
            "bad diagnostic tail: {tail:?}"
        );
        let floats: Vec<&str> = tail[2..tail.len() - 1].split(", ").collect();
        assert_eq!(floats.len(), 2, "bad diagnostic tail: {tail:?}");
        for f in floats {
            f.parse::<f32>()
                .unwrap_or_else(|_| panic!("not a float: {f:?}"));
        }

        match glyphs.as_bytes()[6] {
            b'.' => idle += 1,
            g if g >= b'1' => keyed += 1,
            _ => {}
        }
    }
    assert!(keyed > 0, "channel 6 must show a strong glyph while keyed");
    assert!(idle > 0, "channel 6 must show a dot between marks");
}

#[test]
fn wav_fixture_roundtrip_decodes() {
    init_test_tracing();
    let mut audio = key_cw("R R R", 20, 625.0, 48000, 0.5);
    let floor = uniform_noise(audio.len(), 0x77, 0.08);
    mix(&mut audio, &floor);

    let path = std::env::temp_dir().join("cwskim_fixture.wav");
    test_utils::write_wav_fixture(&path, &audio, 48000);
    let restored = test_utils::read_wav_fixture(&path);
    std::fs::remove_file(&path).ok();
    assert_eq!(restored.len(), audio.len());

    let (_, out) = run_skimmer(f32le_bytes(&restored), config_48k(1, SampleFormat::F32Le));
    assert!(out.contains('R'), "fixture did not decode: {out:?}");
}
