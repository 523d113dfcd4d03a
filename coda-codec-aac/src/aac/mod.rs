// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The AAC-LC decoder, with optional spectral band replication.

use coda_core::audio::PcmBlock;
use coda_core::errors::{config_error, decode_error, insufficient_bits_error, unsupported_error};
use coda_core::errors::Result;
use coda_core::io::BitReaderLtr;

use log::{debug, trace};

mod codebooks;
mod common;
mod dequant;
mod element;
mod filterbank;
mod ics;
mod output;
mod sbr;
mod stereo;
mod window;

pub use element::ProgramConfig;
pub use filterbank::OverlapState;

use crate::adts::AdtsHeader;
use crate::common::{M4AType, Topology};
use crate::config::StreamConfig;

use common::*;
use element::{Element, Frame};
use filterbank::Filterbank;
use ics::Ics;
use sbr::SbrDecoder;

/// How the frames passed to [`AacDecoder::decode_frame`] are framed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Framing {
    /// Each frame is one raw data block.
    #[default]
    Raw,
    /// Each frame is one ADTS frame, header included.
    Adts,
}

/// Decoder options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderOptions {
    pub framing: Framing,
    /// Apply spectral band replication when the stream configuration signals it. If false, only
    /// the core is decoded.
    pub sbr: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions { framing: Framing::Raw, sbr: true }
    }
}

/// Per-channel buffers and state of the active topology.
struct Channels {
    topology: Topology,
    /// Core decoder output, 1024 samples per channel.
    core: Vec<Vec<f32>>,
    /// SBR output, 2048 samples per channel.
    out: Vec<Vec<f32>>,
    /// One SBR decoder per channel element, if SBR is applied.
    sbr: Option<Vec<SbrDecoder>>,
}

impl Channels {
    fn new(topology: Topology, sbr_rate: Option<u32>) -> Self {
        let n = topology.num_channels();

        let sbr = sbr_rate.map(|rate| {
            topology
                .elements
                .iter()
                .map(|(el, _)| SbrDecoder::new(rate, el.num_channels()))
                .collect()
        });

        let out_len = if sbr.is_some() { 2048 } else { 0 };

        Channels {
            topology,
            core: vec![vec![0.0; 1024]; n],
            out: vec![vec![0.0; out_len]; n],
            sbr,
        }
    }
}

/// Advanced Audio Coding (AAC) decoder.
///
/// Implements a decoder for AAC Low-Complexity (AAC-LC) as defined in ISO/IEC 13818-7 and
/// ISO/IEC 14496-3, and explicitly signalled High-Efficiency AAC (AAC-LC with SBR).
///
/// The overlap state carried between frames may be owned by the caller and passed to
/// [`AacDecoder::decode_frame_with`]. [`AacDecoder::decode_frame`] uses a state owned by the
/// decoder.
pub struct AacDecoder {
    config: StreamConfig,
    opts: DecoderOptions,
    sbinfo: GASubbandInfo,
    filterbank: Filterbank,
    lcg: Lcg,
    chans: Channels,
    overlap: OverlapState,
    sbr_rate: Option<u32>,
    implicit_sbr_logged: bool,
    spec: [Box<[f32; 1024]>; 2],
}

impl AacDecoder {
    /// Instantiates a decoder for a stream configuration.
    pub fn try_new(config: &StreamConfig, opts: &DecoderOptions) -> Result<Self> {
        if config.object_type != M4AType::Lc {
            debug!("aac: object type {}", config.object_type);
            return config_error("aac: unsupported object type");
        }

        if config.ps {
            debug!("aac: decoding parametric stereo stream without parametric stereo");
        }

        if config.sample_rate == 0 {
            return config_error("aac: invalid sample rate");
        }

        if config.frame_len != 1024 {
            return config_error("aac: 960 sample frames are not supported");
        }

        let topology = match config.channel_config {
            0 => match &config.program_config {
                Some(pce) if pce.topology.num_channels() > 0 => pce.topology.clone(),
                _ => return config_error("aac: channel configuration 0 without a program config"),
            },
            channel_config => match Topology::from_channel_config(channel_config) {
                Some(topology) => topology,
                None => return config_error("aac: reserved channel configuration"),
            },
        };

        let sbr_rate = match config.sbr {
            Some(sbr) if opts.sbr => {
                if sbr.sample_rate != 2 * config.sample_rate {
                    return config_error("aac: sbr must double the sample rate");
                }

                if !sbr::is_supported_rate(sbr.sample_rate) {
                    return config_error("aac: unsupported sbr sample rate");
                }

                Some(sbr.sample_rate)
            }
            _ => None,
        };

        debug!(
            "aac: {}, {} Hz, {} channels, sbr output {:?}",
            config.object_type,
            config.sample_rate,
            topology.num_channels(),
            sbr_rate
        );

        Ok(AacDecoder {
            config: config.clone(),
            opts: *opts,
            sbinfo: GASubbandInfo::find(config.sample_rate),
            filterbank: Filterbank::new(),
            lcg: Lcg::new(Lcg::SEED),
            overlap: OverlapState::new(topology.num_channels()),
            chans: Channels::new(topology, sbr_rate),
            sbr_rate,
            implicit_sbr_logged: false,
            spec: [Box::new([0.0; 1024]), Box::new([0.0; 1024])],
        })
    }

    /// Gets the stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Gets the sampling rate of the decoded output.
    pub fn output_sample_rate(&self) -> u32 {
        self.sbr_rate.unwrap_or(self.config.sample_rate)
    }

    /// Gets the number of output channels of the active channel topology.
    pub fn num_channels(&self) -> usize {
        self.chans.topology.num_channels()
    }

    /// Instantiates the overlap state at the start of a stream, for use with
    /// [`AacDecoder::decode_frame_with`].
    pub fn new_overlap(&self) -> OverlapState {
        OverlapState::new(self.num_channels())
    }

    /// Clears all overlap and SBR history, as after a discontinuity in the stream.
    pub fn reset(&mut self) {
        self.overlap.reset();
        self.reset_history();
    }

    /// Clears the SBR history. The caller resets an overlap state it owns itself.
    pub fn reset_history(&mut self) {
        if let Some(sbr) = &mut self.chans.sbr {
            for dec in sbr.iter_mut() {
                dec.reset();
            }
        }
    }

    /// Decodes one frame into a block of interleaved PCM samples. On error, the decoder state
    /// is unchanged.
    pub fn decode_frame(&mut self, buf: &[u8]) -> Result<PcmBlock> {
        let mut overlap = std::mem::take(&mut self.overlap);
        let res = self.decode_frame_with(buf, &mut overlap);
        self.overlap = overlap;
        res
    }

    /// Decodes one frame into a block of interleaved PCM samples, overlap-adding with the tails
    /// in `overlap` and replacing them with the tails of this frame.
    ///
    /// On error, neither the decoder nor `overlap` is changed. A state with a channel count
    /// other than that of the channel topology is treated as the start of a stream.
    pub fn decode_frame_with(
        &mut self,
        buf: &[u8],
        overlap: &mut OverlapState,
    ) -> Result<PcmBlock> {
        let buf = match self.opts.framing {
            Framing::Raw => buf,
            Framing::Adts => self.strip_adts(buf)?,
        };

        let mut bs = BitReaderLtr::new(buf);

        let frame = Frame::read(&mut bs, &self.sbinfo)?;

        // A program config element in the frame applies to this and all later frames.
        let pce_topology = frame.elements.iter().rev().find_map(|el| match el {
            Element::Pce(pce) => Some(&pce.topology),
            _ => None,
        });

        let fresh = match pce_topology {
            Some(topology) if *topology != self.chans.topology => {
                if topology.num_channels() == 0 {
                    return decode_error("aac: program config without channels");
                }
                true
            }
            _ => false,
        };

        let topology = match pce_topology {
            Some(topology) if fresh => topology,
            _ => &self.chans.topology,
        };

        let slots = assign_elements(&frame, topology)?;

        let stale = fresh || overlap.num_channels() != topology.num_channels();

        // Validate window sequence transitions before any state changes.
        let mut ch = 0;

        for ((el_type, _), slot) in topology.elements.iter().zip(slots.iter()) {
            if let Some(idx) = slot {
                for (i, ics) in element_ics(&frame.elements[*idx]).iter().enumerate() {
                    let prev = if stale { None } else { overlap.channel(ch + i).prev_sequence };

                    ics.info.window_sequence.check_transition(prev)?;
                }
            }

            ch += el_type.num_channels();
        }

        if fresh {
            debug!("aac: new channel topology, {} channels", topology.num_channels());
            let topology = topology.clone();
            self.chans = Channels::new(topology, self.sbr_rate);
        }

        if stale {
            *overlap = self.new_overlap();
        }

        if self.sbr_rate.is_none()
            && !self.implicit_sbr_logged
            && frame.elements.iter().any(|el| matches!(el, Element::Sbr(_)))
        {
            debug!("aac: ignoring implicitly signalled sbr");
            self.implicit_sbr_logged = true;
        }

        // Render. Nothing below fails.
        self.render(buf, &frame, &slots, overlap);

        let sample_rate = self.output_sample_rate();

        let layout = &self.chans.topology.layout;

        let block = match &self.chans.sbr {
            Some(_) => output::assemble(&self.chans.out, 2048, layout, sample_rate),
            None => output::assemble(&self.chans.core, 1024, layout, sample_rate),
        };

        Ok(block)
    }

    /// Validates the ADTS header of `buf` and returns the raw data block it frames.
    fn strip_adts<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8]> {
        let header = AdtsHeader::read(buf)?;

        if header.sample_rate != self.config.sample_rate
            || (header.channel_config != 0 && header.channel_config != self.config.channel_config)
        {
            return decode_error("adts: header does not match the stream configuration");
        }

        if header.num_raw_blocks > 1 {
            return unsupported_error("adts: multiple raw data blocks per frame");
        }

        if buf.len() < header.frame_len {
            return insufficient_bits_error();
        }

        Ok(&buf[header.header_len()..header.frame_len])
    }

    fn render(
        &mut self,
        buf: &[u8],
        frame: &Frame,
        slots: &[Option<usize>],
        overlap: &mut OverlapState,
    ) {
        let mut ch = 0;

        for (s, slot) in slots.iter().enumerate() {
            let (el_type, _) = self.chans.topology.elements[s];

            match slot.map(|idx| &frame.elements[idx]) {
                Some(Element::Sce { tag, ics }) | Some(Element::Lfe { tag, ics }) => {
                    trace!(
                        "render: {:?} {}, channel {}, global gain {}",
                        el_type,
                        tag,
                        ch,
                        ics.global_gain
                    );
                    self.render_single(ics, ch, overlap);
                }
                Some(Element::Cpe { tag, pair }) => {
                    trace!("render: cpe {}, channels {} and {}", tag, ch, ch + 1);

                    let [spec0, spec1] = &mut self.spec;

                    dequant::dequantize_pair(pair, &self.sbinfo, &mut self.lcg, spec0, spec1);

                    stereo::apply(pair, &self.sbinfo, spec0, spec1);

                    for (i, (ics, spec)) in pair.ics.iter().zip([spec0, spec1]).enumerate() {
                        Self::tns_and_synth(
                            &mut self.filterbank,
                            &self.sbinfo,
                            ics,
                            spec,
                            overlap,
                            &mut self.chans,
                            ch + i,
                        );
                    }
                }
                _ => {
                    // A channel element missing from the frame decodes to silence.
                    trace!("render: {:?} missing, channel {}", el_type, ch);

                    for i in ch..ch + el_type.num_channels() {
                        *overlap.channel_mut(i) = Default::default();
                        self.chans.core[i].fill(0.0);
                    }
                }
            }

            if let Some(sbr) = &mut self.chans.sbr {
                let n = el_type.num_channels();

                // SBR data directly follows the element it extends.
                let payload = slot.and_then(|idx| match frame.elements.get(idx + 1) {
                    Some(Element::Sbr(payload)) => Some(payload),
                    _ => None,
                });

                let core = &self.chans.core[ch..ch + n];
                sbr[s].apply(buf, payload, core, &mut self.chans.out[ch..ch + n]);
            }

            ch += el_type.num_channels();
        }
    }

    fn render_single(&mut self, ics: &Ics, ch: usize, overlap: &mut OverlapState) {
        let spec = &mut *self.spec[0];

        dequant::dequantize(ics, &self.sbinfo, &mut self.lcg, spec);

        let (filterbank, sbinfo) = (&mut self.filterbank, &self.sbinfo);

        Self::tns_and_synth(filterbank, sbinfo, ics, spec, overlap, &mut self.chans, ch);
    }

    fn tns_and_synth(
        filterbank: &mut Filterbank,
        sbinfo: &GASubbandInfo,
        ics: &Ics,
        spec: &mut [f32; 1024],
        overlap: &mut OverlapState,
        chans: &mut Channels,
        ch: usize,
    ) {
        if let Some(tns) = &ics.tns {
            tns.synth(&ics.info, ics.bands(sbinfo), sbinfo.rate_idx, spec);
        }

        filterbank.synth(spec, &ics.info, overlap.channel_mut(ch), &mut chans.core[ch]);
    }
}

/// Gets the individual channel streams of a channel element.
fn element_ics(el: &Element) -> Vec<&Ics> {
    match el {
        Element::Sce { ics, .. } | Element::Lfe { ics, .. } => vec![&**ics],
        Element::Cpe { pair, .. } => pair.ics.iter().map(|ics| &**ics).collect(),
        _ => Vec::new(),
    }
}

/// Matches the channel elements of a frame to the slots of a topology. The n-th element of each
/// type fills the n-th slot of that type. Returns the element index of each slot.
fn assign_elements(frame: &Frame, topology: &Topology) -> Result<Vec<Option<usize>>> {
    let mut slots = vec![None; topology.elements.len()];
    let mut counts = [0usize; 3];

    for (idx, el) in frame.elements.iter().enumerate() {
        let el_type = match el.channel_element_type() {
            Some(el_type) => el_type,
            None => continue,
        };

        let count = &mut counts[el_type as usize];

        let slot = topology
            .elements
            .iter()
            .enumerate()
            .filter(|(_, (t, _))| *t == el_type)
            .nth(*count)
            .map(|(slot, _)| slot);

        match slot {
            Some(slot) => slots[slot] = Some(idx),
            None => return decode_error("aac: more channel elements than the channel layout"),
        }

        *count += 1;
    }

    Ok(slots)
}
