// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::f64::consts::PI;

use coda_codec_aac::{
    AacDecoder, DecoderOptions, Framing, M4AType, OverlapState, SbrConfig, StreamConfig,
};
use coda_core::audio::{Channels, Position};
use coda_core::errors::Error;

const ONLY_LONG: u32 = 0;
const LONG_START: u32 = 1;
const EIGHT_SHORT: u32 = 2;
const LONG_STOP: u32 = 3;

/// Writes bits most-significant first.
#[derive(Default)]
struct BitWriter {
    buf: Vec<u8>,
    len: usize,
}

impl BitWriter {
    fn put(&mut self, value: u32, bits: u32) {
        for i in (0..bits).rev() {
            if self.len % 8 == 0 {
                self.buf.push(0);
            }

            if (value >> i) & 1 == 1 {
                let last = self.buf.len() - 1;
                self.buf[last] |= 0x80 >> (self.len % 8);
            }

            self.len += 1;
        }
    }

    fn align(&mut self) {
        let rem = self.len % 8;

        if rem != 0 {
            self.put(0, 8 - rem as u32);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// An individual channel stream with no scale factor bands, which decodes to silence.
fn put_ics(w: &mut BitWriter, window_sequence: u32) {
    // Global gain.
    w.put(100, 8);
    // Reserved bit, window sequence, window shape.
    w.put(0, 1);
    w.put(window_sequence, 2);
    w.put(0, 1);

    if window_sequence == EIGHT_SHORT {
        // Max. SFB and scale factor grouping.
        w.put(0, 4);
        w.put(0, 7);
    }
    else {
        // Max. SFB and predictor data present.
        w.put(0, 6);
        w.put(0, 1);
    }

    // Pulse, TNS, and gain control data present.
    w.put(0, 3);
}

/// Codebook 1 codewords of the quads (1, 0, 0, 0) and (0, 1, 0, 0).
const QUAD_FIRST_LINE: (u32, u32) = (0x10, 5);
const QUAD_SECOND_LINE: (u32, u32) = (0x13, 5);

/// Long window stream info with a sine window and one scale factor band.
fn put_one_band_info(w: &mut BitWriter) {
    w.put(0, 1);
    w.put(ONLY_LONG, 2);
    w.put(0, 1);
    w.put(1, 6);
    w.put(0, 1);
}

/// The data following the stream info of a stream whose one band uses codebook 1. The band's
/// scale factor equals the global gain, and its first four lines are coded by `quad`.
fn put_band_data(w: &mut BitWriter, quad: (u32, u32)) {
    // Codebook 1 for one band.
    w.put(1, 4);
    w.put(1, 5);
    // Scale factor delta of 0.
    w.put(0, 1);
    // Pulse, TNS, and gain control data present.
    w.put(0, 3);
    w.put(quad.0, quad.1);
}

/// A single channel element with a unit coefficient on line 0 at a global gain of 188, a
/// spectral value of 256.
fn tone_frame() -> Vec<u8> {
    let mut w = BitWriter::default();
    w.put(0, 3);
    w.put(0, 4);
    w.put(188, 8);
    put_one_band_info(&mut w);
    put_band_data(&mut w, QUAD_FIRST_LINE);
    put_end(&mut w);
    w.finish()
}

/// A common window channel pair with mid/side coding of band 0. Mid has 256 on line 0, and side
/// has 64 on line 1.
fn mid_side_frame() -> Vec<u8> {
    let mut w = BitWriter::default();
    w.put(1, 3);
    w.put(0, 4);
    w.put(1, 1);
    put_one_band_info(&mut w);
    // Mid/side mask with band 0 set.
    w.put(1, 2);
    w.put(1, 1);
    w.put(188, 8);
    put_band_data(&mut w, QUAD_FIRST_LINE);
    w.put(180, 8);
    put_band_data(&mut w, QUAD_SECOND_LINE);
    put_end(&mut w);
    w.finish()
}

/// The 2048 output samples of the inverse transform of a long spectrum, evaluated directly as
/// `2 / N * sum(X[k] * cos(2 * pi / N * (n + n0) * (k + 1/2)))` in 16-bit units. `lines` holds
/// the non-zero lines of the dequantized spectrum, at 2^-14 of the ISO/IEC 14496-3 scale.
fn reference_imdct(lines: &[(usize, f64)]) -> Vec<f64> {
    (0..2048)
        .map(|n| {
            let sum: f64 = lines
                .iter()
                .map(|&(k, x)| {
                    x * (PI / 1024.0 * (n as f64 + 512.5) * (k as f64 + 0.5)).cos()
                })
                .sum();

            2.0 / 2048.0 * sum * 16384.0
        })
        .collect()
}

fn sine_window(n: usize) -> f64 {
    (PI / 2048.0 * (n as f64 + 0.5)).sin()
}

fn assert_near(sample: i16, expected: f64) {
    assert!((f64::from(sample) - expected).abs() <= 1.0, "{} != {}", sample, expected);
}

fn put_sce(w: &mut BitWriter, tag: u32, window_sequence: u32) {
    w.put(0, 3);
    w.put(tag, 4);
    put_ics(w, window_sequence);
}

fn put_cpe(w: &mut BitWriter, tag: u32, window_sequence: u32) {
    w.put(1, 3);
    w.put(tag, 4);
    // No common window.
    w.put(0, 1);
    put_ics(w, window_sequence);
    put_ics(w, window_sequence);
}

fn put_end(w: &mut BitWriter) {
    w.put(7, 3);
}

fn sce_frame(window_sequence: u32) -> Vec<u8> {
    let mut w = BitWriter::default();
    put_sce(&mut w, 0, window_sequence);
    put_end(&mut w);
    w.finish()
}

fn cpe_frame(window_sequence: u32) -> Vec<u8> {
    let mut w = BitWriter::default();
    put_cpe(&mut w, 0, window_sequence);
    put_end(&mut w);
    w.finish()
}

/// A program config element declaring a single front channel pair.
fn put_stereo_pce(w: &mut BitWriter) {
    w.put(5, 3);
    // Element tag, object type (LC), sample rate index (44100 Hz).
    w.put(0, 4);
    w.put(1, 2);
    w.put(4, 4);
    // One front element, no side, back, LFE, associated data, or coupling elements.
    w.put(1, 4);
    w.put(0, 4);
    w.put(0, 4);
    w.put(0, 2);
    w.put(0, 3);
    w.put(0, 4);
    // No mixdowns.
    w.put(0, 3);
    // Front element: CPE with tag 0.
    w.put(1, 1);
    w.put(0, 4);
    w.align();
    // Empty comment.
    w.put(0, 8);
}

/// An ADTS header without a CRC for an AAC-LC frame of `frame_len` bytes, header included.
fn adts_header(sample_rate_index: u32, channel_config: u32, frame_len: usize) -> Vec<u8> {
    let mut w = BitWriter::default();
    w.put(0xfff, 12);
    // MPEG-4, layer 0, protection absent.
    w.put(0, 1);
    w.put(0, 2);
    w.put(1, 1);
    // LC profile.
    w.put(1, 2);
    w.put(sample_rate_index, 4);
    w.put(0, 1);
    w.put(channel_config, 3);
    w.put(0, 4);
    w.put(frame_len as u32, 13);
    w.put(0x7ff, 11);
    w.put(0, 2);
    w.finish()
}

fn lc_decoder(channel_config: u32) -> AacDecoder {
    let config = StreamConfig::new(M4AType::Lc, 4, channel_config);
    AacDecoder::try_new(&config, &Default::default()).unwrap()
}

#[test]
fn verify_decode_silent_mono_frame() {
    let mut decoder = lc_decoder(1);

    let block = decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();

    assert_eq!(block.sample_rate(), 44100);
    assert_eq!(block.num_channels(), 1);
    assert_eq!(block.frames(), 1024);
    assert_eq!(block.layout(), &[Position::FRONT_CENTER]);
    assert!(block.samples().iter().all(|&s| s == 0));
}

#[test]
fn verify_decode_silent_stereo_frame() {
    let mut decoder = lc_decoder(2);

    let block = decoder.decode_frame(&cpe_frame(ONLY_LONG)).unwrap();

    let stereo = Position::FRONT_LEFT | Position::FRONT_RIGHT;

    assert_eq!(block.channels(), Channels::Positioned(stereo));
    assert_eq!(block.samples().len(), 2048);
    assert!(block.samples().iter().all(|&s| s == 0));
}

#[test]
fn verify_missing_element_is_silent() {
    let mut decoder = lc_decoder(3);

    // Only the centre channel is present.
    let block = decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();

    assert_eq!(block.num_channels(), 3);
    assert_eq!(block.frames(), 1024);
    assert!(block.samples().iter().all(|&s| s == 0));
}

#[test]
fn verify_unexpected_element_is_rejected() {
    let mut decoder = lc_decoder(1);

    let mut w = BitWriter::default();
    put_sce(&mut w, 0, ONLY_LONG);
    put_sce(&mut w, 1, ONLY_LONG);
    put_end(&mut w);

    assert!(matches!(decoder.decode_frame(&w.finish()), Err(Error::MalformedElement(_))));

    // A channel pair has no slot in a mono topology.
    assert!(matches!(decoder.decode_frame(&cpe_frame(ONLY_LONG)), Err(Error::MalformedElement(_))));
}

#[test]
fn verify_window_sequence_transitions() {
    let mut decoder = lc_decoder(1);

    decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();

    assert_eq!(
        decoder.decode_frame(&sce_frame(EIGHT_SHORT)).unwrap_err(),
        Error::InvalidWindowSequenceTransition { prev: 0, next: 2 }
    );

    // The rejected frame did not advance the decoder.
    for seq in [LONG_START, EIGHT_SHORT, EIGHT_SHORT, LONG_STOP, ONLY_LONG] {
        let block = decoder.decode_frame(&sce_frame(seq)).unwrap();
        assert_eq!(block.frames(), 1024);
    }

    // After a reset any window sequence may start the stream.
    decoder.reset();
    decoder.decode_frame(&sce_frame(EIGHT_SHORT)).unwrap();
}

#[test]
fn verify_truncated_frames() {
    let mut decoder = lc_decoder(1);

    assert_eq!(decoder.decode_frame(&[]).unwrap_err(), Error::InsufficientBits);

    let frame = sce_frame(ONLY_LONG);
    assert_eq!(decoder.decode_frame(&frame[..2]).unwrap_err(), Error::InsufficientBits);

    // The decoder remains usable.
    assert!(decoder.decode_frame(&frame).is_ok());
}

#[test]
fn verify_unsupported_elements() {
    let mut decoder = lc_decoder(1);

    // Coupling channel element.
    let mut w = BitWriter::default();
    w.put(2, 3);
    w.put(0, 28);

    assert!(matches!(decoder.decode_frame(&w.finish()), Err(Error::Unsupported(_))));
}

#[test]
fn verify_fill_and_data_stream_elements_are_skipped() {
    let mut decoder = lc_decoder(1);

    let mut w = BitWriter::default();
    put_sce(&mut w, 0, ONLY_LONG);
    // Data stream element: tag 0, no alignment, 2 bytes.
    w.put(4, 3);
    w.put(0, 4);
    w.put(0, 1);
    w.put(2, 8);
    w.put(0xabcd, 16);
    // Fill element: 1 byte of fill data.
    w.put(6, 3);
    w.put(1, 4);
    w.put(0, 4);
    w.put(0xa, 4);
    put_end(&mut w);

    let block = decoder.decode_frame(&w.finish()).unwrap();
    assert_eq!(block.num_channels(), 1);
}

#[test]
fn verify_program_config_changes_topology() {
    let mut decoder = lc_decoder(1);

    assert_eq!(decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap().num_channels(), 1);

    let mut w = BitWriter::default();
    put_stereo_pce(&mut w);
    put_cpe(&mut w, 0, ONLY_LONG);
    put_end(&mut w);

    let block = decoder.decode_frame(&w.finish()).unwrap();

    assert_eq!(block.layout(), &[Position::FRONT_LEFT, Position::FRONT_RIGHT]);
    assert_eq!(block.frames(), 1024);

    // The new topology persists.
    assert_eq!(decoder.decode_frame(&cpe_frame(ONLY_LONG)).unwrap().num_channels(), 2);

    assert!(matches!(decoder.decode_frame(&sce_frame(ONLY_LONG)), Err(Error::MalformedElement(_))));
}

#[test]
fn verify_program_config_new_topology_resets_overlap() {
    let mut decoder = lc_decoder(1);

    decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();

    // A new topology starts without history, so any window sequence is legal.
    let mut w = BitWriter::default();
    put_stereo_pce(&mut w);
    put_cpe(&mut w, 0, EIGHT_SHORT);
    put_end(&mut w);

    assert!(decoder.decode_frame(&w.finish()).is_ok());
}

#[test]
fn verify_adts_framing() {
    let config = StreamConfig::new(M4AType::Lc, 4, 1);
    let opts = DecoderOptions { framing: Framing::Adts, ..Default::default() };

    let mut decoder = AacDecoder::try_new(&config, &opts).unwrap();

    let raw = sce_frame(ONLY_LONG);

    let mut frame = adts_header(4, 1, 7 + raw.len());
    frame.extend_from_slice(&raw);

    let block = decoder.decode_frame(&frame).unwrap();
    assert_eq!(block.frames(), 1024);
    assert!(block.samples().iter().all(|&s| s == 0));

    // Trailing bytes beyond the frame length are ignored.
    frame.push(0xff);
    assert!(decoder.decode_frame(&frame).is_ok());

    // Truncated.
    assert_eq!(decoder.decode_frame(&frame[..8]).unwrap_err(), Error::InsufficientBits);

    // A header that contradicts the stream configuration.
    let mut frame = adts_header(3, 1, 7 + raw.len());
    frame.extend_from_slice(&raw);

    assert!(matches!(decoder.decode_frame(&frame), Err(Error::MalformedElement(_))));

    // Missing sync word.
    assert!(matches!(decoder.decode_frame(&raw), Err(Error::MalformedElement(_))));
}

#[test]
fn verify_config_errors() {
    let opts = DecoderOptions::default();

    let is_config_err =
        |config: &StreamConfig| matches!(AacDecoder::try_new(config, &opts), Err(Error::Config(_)));

    assert!(is_config_err(&StreamConfig::new(M4AType::Main, 4, 2)));
    assert!(is_config_err(&StreamConfig::new(M4AType::Lc, 4, 0)));
    assert!(is_config_err(&StreamConfig::new(M4AType::Lc, 4, 8)));
    assert!(is_config_err(&StreamConfig::new(M4AType::Lc, 13, 2)));

    let stereo = StreamConfig::new(M4AType::Lc, 4, 2);
    assert!(is_config_err(&StreamConfig { frame_len: 960, ..stereo }));

    let bad_sbr = StreamConfig {
        sbr: Some(SbrConfig { sample_rate: 44100 }),
        ..StreamConfig::new(M4AType::Lc, 4, 2)
    };
    assert!(is_config_err(&bad_sbr));

    // Without SBR processing the SBR configuration is not consulted.
    let opts = DecoderOptions { sbr: false, ..Default::default() };
    assert!(AacDecoder::try_new(&bad_sbr, &opts).is_ok());
}

#[test]
fn verify_audio_specific_config() {
    // AAC-LC, 44100 Hz, stereo.
    let config = StreamConfig::from_audio_specific_config(&[0x12, 0x10]).unwrap();

    let mut decoder = AacDecoder::try_new(&config, &Default::default()).unwrap();

    assert_eq!(decoder.output_sample_rate(), 44100);
    assert_eq!(decoder.decode_frame(&cpe_frame(ONLY_LONG)).unwrap().num_channels(), 2);
}

fn sbr_config() -> StreamConfig {
    StreamConfig {
        sbr: Some(SbrConfig { sample_rate: 48000 }),
        ..StreamConfig::new(M4AType::Lc, 6, 1)
    }
}

/// A single channel element followed by an SBR extension payload carrying a header and one
/// envelope of constant energy.
fn sbr_frame() -> Vec<u8> {
    let mut w = BitWriter::default();

    put_sce(&mut w, 0, ONLY_LONG);

    // Fill element, 11 bytes.
    w.put(6, 3);
    w.put(11, 4);
    let start = w.len;

    // SBR data, header present.
    w.put(0xd, 4);
    w.put(1, 1);
    // Amplitude resolution, start and stop frequency, crossover band, reserved, no extra headers.
    w.put(0, 1);
    w.put(5, 4);
    w.put(9, 4);
    w.put(0, 3);
    w.put(0, 2);
    w.put(0, 2);

    // No extended data. FIXFIX grid with one envelope at high frequency resolution.
    w.put(0, 1);
    w.put(0, 4);
    w.put(1, 1);
    // Delta coded in frequency.
    w.put(0, 2);
    // Inverse filtering modes of 4 noise bands.
    w.put(0, 8);
    // Envelope: start value, then 15 zero deltas.
    w.put(30, 7);
    for _ in 0..15 {
        w.put(0, 2);
    }
    // Noise floor: start value, then 3 zero deltas.
    w.put(10, 5);
    w.put(0, 3);
    // No harmonics, no extended data.
    w.put(0, 2);

    while w.len < start + 88 {
        w.put(0, 1);
    }

    put_end(&mut w);
    w.finish()
}

#[test]
fn verify_sbr_doubles_output() {
    let mut decoder = AacDecoder::try_new(&sbr_config(), &Default::default()).unwrap();

    assert_eq!(decoder.output_sample_rate(), 48000);

    // Without SBR data the core output is upsampled.
    let block = decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();

    assert_eq!(block.sample_rate(), 48000);
    assert_eq!(block.frames(), 2048);
    assert!(block.samples().iter().all(|&s| s == 0));
}

#[test]
fn verify_sbr_reconstructs_high_band() {
    let mut decoder = AacDecoder::try_new(&sbr_config(), &Default::default()).unwrap();

    let frame = sbr_frame();

    let mut nonzero = false;

    for _ in 0..3 {
        let block = decoder.decode_frame(&frame).unwrap();

        assert_eq!(block.frames(), 2048);
        nonzero |= block.samples().iter().any(|&s| s != 0);
    }

    // The core is silent, so any output is the reconstructed noise floor.
    assert!(nonzero);

    // Once reset, the decoder waits for a new SBR header and upsamples the silent core.
    decoder.reset();

    let block = decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();
    assert!(block.samples().iter().all(|&s| s == 0));
}

#[test]
fn verify_parametric_stereo_decodes_as_sbr() {
    // HE-AAC v2, 24 kHz mono core, 48 kHz SBR output.
    let config = StreamConfig::from_audio_specific_config(&[0xeb, 0x09, 0x88, 0x00]).unwrap();

    assert!(config.ps);
    assert_eq!(config.sbr, sbr_config().sbr);

    let mut decoder = AacDecoder::try_new(&config, &Default::default()).unwrap();

    assert_eq!(decoder.output_sample_rate(), 48000);

    // The stream decodes as SBR without the stereo upmix.
    let block = decoder.decode_frame(&sbr_frame()).unwrap();

    assert_eq!(block.sample_rate(), 48000);
    assert_eq!(block.frames(), 2048);
    assert_eq!(block.num_channels(), 1);
}

#[test]
fn verify_sbr_disabled() {
    let opts = DecoderOptions { sbr: false, ..Default::default() };
    let mut decoder = AacDecoder::try_new(&sbr_config(), &opts).unwrap();

    assert_eq!(decoder.output_sample_rate(), 24000);

    // SBR data is parsed over but not applied.
    let block = decoder.decode_frame(&sbr_frame()).unwrap();

    assert_eq!(block.sample_rate(), 24000);
    assert_eq!(block.frames(), 1024);
    assert!(block.samples().iter().all(|&s| s == 0));
}

#[test]
fn verify_mid_side_pair_output() {
    let mut decoder = lc_decoder(2);

    let block = decoder.decode_frame(&mid_side_frame()).unwrap();

    assert_eq!(block.frames(), 1024);

    // Left is mid plus side, right is mid minus side.
    let left = reference_imdct(&[(0, 256.0), (1, 64.0)]);
    let right = reference_imdct(&[(0, 256.0), (1, -64.0)]);

    let samples = block.samples();

    for n in 0..1024 {
        assert_near(samples[2 * n], left[n] * sine_window(n));
        assert_near(samples[2 * n + 1], right[n] * sine_window(n));
    }

    let golden: [(usize, i16, i16); 6] = [
        (0, 2, 3),
        (100, 222, 520),
        (256, 237, 962),
        (700, -340, -1714),
        (1000, -1991, -3586),
        (1023, -2168, -3620),
    ];

    for (n, l, r) in golden {
        assert_near(samples[2 * n], f64::from(l));
        assert_near(samples[2 * n + 1], f64::from(r));
    }
}

#[test]
fn verify_overlap_survives_failed_frame() {
    let tone = tone_frame();

    let mut decoder = lc_decoder(1);

    let first = decoder.decode_frame(&tone).unwrap();

    assert_eq!(decoder.decode_frame(&tone[..3]).unwrap_err(), Error::InsufficientBits);

    // The silent frame outputs the tail of the tone frame.
    let tail = decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();

    let reference = reference_imdct(&[(0, 256.0)]);

    for n in 0..1024 {
        assert_near(first.samples()[n], reference[n] * sine_window(n));
        assert_near(tail.samples()[n], reference[n + 1024] * sine_window(1023 - n));
    }

    assert_near(first.samples()[256], 600.0);
    assert_near(tail.samples()[256], -3496.0);

    // Then silence.
    let block = decoder.decode_frame(&sce_frame(ONLY_LONG)).unwrap();

    assert!(block.samples().iter().all(|&s| s == 0));
}

#[test]
fn verify_caller_owned_overlap() {
    let tone = tone_frame();
    let silence = sce_frame(ONLY_LONG);

    let mut decoder = lc_decoder(1);
    let mut overlap = decoder.new_overlap();

    assert_eq!(overlap.num_channels(), 1);

    decoder.decode_frame_with(&tone, &mut overlap).unwrap();

    let saved = overlap.clone();

    assert!(saved.tail(0).iter().any(|&x| x != 0.0));

    // A failed frame leaves the state untouched.
    assert!(decoder.decode_frame_with(&tone[..3], &mut overlap).is_err());
    assert_eq!(overlap.tail(0), saved.tail(0));

    let tail = decoder.decode_frame_with(&silence, &mut overlap).unwrap();

    for (&s, &x) in tail.samples().iter().zip(saved.tail(0)) {
        assert_near(s, f64::from(x) * 32768.0);
    }

    // The same as with the decoder's own state.
    let mut owned = lc_decoder(1);
    owned.decode_frame(&tone).unwrap();

    assert_eq!(owned.decode_frame(&silence).unwrap().samples(), tail.samples());

    // A saved state resumes the stream in another decoder.
    let mut other = lc_decoder(1);
    let mut resumed = saved.clone();

    assert_eq!(other.decode_frame_with(&silence, &mut resumed).unwrap().samples(), tail.samples());

    // A cleared state is the start of a stream.
    let mut cleared = saved;
    cleared.reset();

    let block = other.decode_frame_with(&silence, &mut cleared).unwrap();

    assert!(block.samples().iter().all(|&s| s == 0));

    // So is a state for another channel count.
    let mut stereo = OverlapState::new(2);

    let block = decoder.decode_frame_with(&silence, &mut stereo).unwrap();

    assert_eq!(stereo.num_channels(), 1);
    assert!(block.samples().iter().all(|&s| s == 0));
}
