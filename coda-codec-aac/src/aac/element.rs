// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The frame parser. A raw data block is parsed into an ordered list of syntactic elements
//! without touching any decoder state.

use coda_core::audio::{Layout, Position};
use coda_core::errors::{decode_error, unsupported_error, Result};
use coda_core::io::{BitPosition, BitReaderLtr, ReadBitsLtr};

use log::{debug, trace};

use crate::aac::common::*;
use crate::aac::ics::{Ics, IcsInfo};
use crate::common::{ChannelElementType, Topology};

const ID_SCE: u32 = 0;
const ID_CPE: u32 = 1;
const ID_CCE: u32 = 2;
const ID_LFE: u32 = 3;
const ID_DSE: u32 = 4;
const ID_PCE: u32 = 5;
const ID_FIL: u32 = 6;
const ID_END: u32 = 7;

const EXT_SBR_DATA: u32 = 0xd;
const EXT_SBR_DATA_CRC: u32 = 0xe;

/// A channel pair element: two individual channel streams and their joint-stereo side info.
#[derive(Clone)]
pub struct ChannelPair {
    pub common_window: bool,
    pub ms_mask_present: u8,
    pub ms_used: [[bool; MAX_SFBS]; MAX_WINDOWS],
    pub ics: [Box<Ics>; 2],
}

impl ChannelPair {
    fn read<B: ReadBitsLtr>(bs: &mut B, sbinfo: &GASubbandInfo) -> Result<Box<Self>> {
        let common_window = bs.read_bool()?;

        let mut ms_mask_present = 0;
        let mut ms_used = [[false; MAX_SFBS]; MAX_WINDOWS];

        let common = if common_window {
            let info = IcsInfo::read(bs, sbinfo)?;

            ms_mask_present = bs.read_bits_leq32(2)? as u8;

            match ms_mask_present {
                0 => (),
                1 => {
                    // One bit per band indicates if the band uses mid-side coding.
                    for g in 0..info.window_groups {
                        for sfb in 0..info.max_sfb {
                            ms_used[g][sfb] = bs.read_bool()?;
                        }
                    }
                }
                2 => {
                    // Mid-side coding is used on all bands.
                    for g in 0..info.window_groups {
                        ms_used[g][..info.max_sfb].fill(true);
                    }
                }
                _ => return decode_error("aac: invalid mid-side mask"),
            }

            Some(info)
        }
        else {
            None
        };

        let ics0 = Ics::read(bs, sbinfo, common.as_ref())?;
        let ics1 = Ics::read(bs, sbinfo, common.as_ref())?;

        // Intensity stereo is only possible in the second channel of a common window pair.
        validate!(!has_intensity(&ics0));
        validate!(common_window || !has_intensity(&ics1));

        Ok(Box::new(ChannelPair { common_window, ms_mask_present, ms_used, ics: [ics0, ics1] }))
    }

    /// Returns true if both channels substitute noise in a band with the mid/side bit set. The
    /// channels then share the left channel's noise vector.
    pub fn shares_noise(&self, g: usize, sfb: usize) -> bool {
        self.ms_used[g][sfb] && self.ics[0].is_noise(g, sfb) && self.ics[1].is_noise(g, sfb)
    }
}

fn has_intensity(ics: &Ics) -> bool {
    (0..ics.info.window_groups)
        .any(|g| (0..ics.info.max_sfb).any(|sfb| ics.is_intensity(g, sfb)))
}

/// The location of an SBR extension payload within the frame.
#[derive(Clone, Copy, Debug)]
pub struct SbrPayload {
    /// Position of the extension type field.
    pub start: BitPosition,
    /// Length of the payload, including the extension type field, in bits.
    pub len: u64,
}

/// A syntactic element of a raw data block.
#[derive(Clone)]
pub enum Element {
    Sce { tag: u8, ics: Box<Ics> },
    Cpe { tag: u8, pair: Box<ChannelPair> },
    Lfe { tag: u8, ics: Box<Ics> },
    Pce(Box<ProgramConfig>),
    /// SBR data for the preceding SCE or CPE.
    Sbr(SbrPayload),
}

impl Element {
    /// Gets the channel element type if the element carries audio channels.
    pub fn channel_element_type(&self) -> Option<ChannelElementType> {
        match self {
            Element::Sce { .. } => Some(ChannelElementType::Sce),
            Element::Cpe { .. } => Some(ChannelElementType::Cpe),
            Element::Lfe { .. } => Some(ChannelElementType::Lfe),
            _ => None,
        }
    }
}

/// One parsed raw data block.
#[derive(Clone, Default)]
pub struct Frame {
    pub elements: Vec<Element>,
}

impl Frame {
    pub fn read(bs: &mut BitReaderLtr<'_>, sbinfo: &GASubbandInfo) -> Result<Frame> {
        let mut elements = Vec::new();

        loop {
            let id = bs.read_bits_leq32(3)?;

            match id {
                ID_SCE => {
                    let tag = bs.read_bits_leq32(4)? as u8;
                    let ics = Ics::read(bs, sbinfo, None)?;
                    validate!(!has_intensity(&ics));
                    elements.push(Element::Sce { tag, ics });
                }
                ID_CPE => {
                    let tag = bs.read_bits_leq32(4)? as u8;
                    let pair = ChannelPair::read(bs, sbinfo)?;
                    elements.push(Element::Cpe { tag, pair });
                }
                ID_CCE => {
                    return unsupported_error("aac: coupling channel element");
                }
                ID_LFE => {
                    let tag = bs.read_bits_leq32(4)? as u8;
                    let ics = Ics::read(bs, sbinfo, None)?;
                    validate!(ics.info.window_sequence == WindowSequence::OnlyLong);
                    validate!(!has_intensity(&ics));
                    elements.push(Element::Lfe { tag, ics });
                }
                ID_DSE => {
                    let tag = bs.read_bits_leq32(4)?;
                    let align = bs.read_bool()?;

                    let mut count = bs.read_bits_leq32(8)?;

                    if count == 255 {
                        count += bs.read_bits_leq32(8)?;
                    }

                    if align {
                        bs.realign();
                    }

                    trace!("dse: tag={}, skipping {} bytes", tag, count);

                    bs.ignore_bits(count * 8)?;
                }
                ID_PCE => {
                    let pce = ProgramConfig::read(bs)?;
                    elements.push(Element::Pce(Box::new(pce)));
                }
                ID_FIL => {
                    let mut count = bs.read_bits_leq32(4)?;

                    if count == 15 {
                        count += bs.read_bits_leq32(8)?;
                        count -= 1;
                    }

                    if count > 0 {
                        let start = bs.pos();

                        match bs.peek_bits_leq32(4)? {
                            EXT_SBR_DATA | EXT_SBR_DATA_CRC => {
                                // SBR data extends the element before it.
                                validate!(matches!(
                                    elements.last(),
                                    Some(Element::Sce { .. }) | Some(Element::Cpe { .. })
                                ));

                                elements.push(Element::Sbr(SbrPayload {
                                    start,
                                    len: u64::from(count) * 8,
                                }));
                            }
                            ext_type => {
                                trace!("fil: skipping extension type {:#x}", ext_type);
                            }
                        }

                        bs.ignore_bits(count * 8)?;
                    }
                }
                ID_END => break,
                _ => unreachable!(),
            }
        }

        Ok(Frame { elements })
    }
}

/// A program config element (ISO/IEC 14496-3, 4.4.1.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramConfig {
    pub element_tag: u8,
    pub object_type: u8,
    pub sample_rate_index: u8,
    pub topology: Topology,
    pub assoc_data_tags: Vec<u8>,
    /// Coupling channel elements as (independently switched, tag).
    pub cc_elements: Vec<(bool, u8)>,
    pub mono_mixdown: Option<u8>,
    pub stereo_mixdown: Option<u8>,
    /// Matrix mixdown index and pseudo-surround flag.
    pub matrix_mixdown: Option<(u8, bool)>,
    pub comment: String,
}

impl ProgramConfig {
    /// Reads a program config element. The byte alignment within the element is relative to the
    /// start of the reader's buffer.
    pub fn read(bs: &mut BitReaderLtr<'_>) -> Result<ProgramConfig> {
        let element_tag = bs.read_bits_leq32(4)? as u8;
        let object_type = bs.read_bits_leq32(2)? as u8;
        let sample_rate_index = bs.read_bits_leq32(4)? as u8;

        let num_front = bs.read_bits_leq32(4)? as usize;
        let num_side = bs.read_bits_leq32(4)? as usize;
        let num_back = bs.read_bits_leq32(4)? as usize;
        let num_lfe = bs.read_bits_leq32(2)? as usize;
        let num_assoc_data = bs.read_bits_leq32(3)? as usize;
        let num_valid_cc = bs.read_bits_leq32(4)? as usize;

        let mono_mixdown =
            if bs.read_bool()? { Some(bs.read_bits_leq32(4)? as u8) } else { None };

        let stereo_mixdown =
            if bs.read_bool()? { Some(bs.read_bits_leq32(4)? as u8) } else { None };

        let matrix_mixdown = if bs.read_bool()? {
            Some((bs.read_bits_leq32(2)? as u8, bs.read_bool()?))
        }
        else {
            None
        };

        let mut builder = LayoutBuilder::default();

        for group in [SpeakerGroup::Front, SpeakerGroup::Side, SpeakerGroup::Back] {
            let num = match group {
                SpeakerGroup::Front => num_front,
                SpeakerGroup::Side => num_side,
                SpeakerGroup::Back => num_back,
            };

            for _ in 0..num {
                let is_cpe = bs.read_bool()?;
                let tag = bs.read_bits_leq32(4)? as u8;
                builder.push(group, is_cpe, tag);
            }
        }

        for _ in 0..num_lfe {
            let tag = bs.read_bits_leq32(4)? as u8;
            builder.push_lfe(tag);
        }

        let mut assoc_data_tags = Vec::with_capacity(num_assoc_data);

        for _ in 0..num_assoc_data {
            assoc_data_tags.push(bs.read_bits_leq32(4)? as u8);
        }

        let mut cc_elements = Vec::with_capacity(num_valid_cc);

        for _ in 0..num_valid_cc {
            let is_ind_sw = bs.read_bool()?;
            cc_elements.push((is_ind_sw, bs.read_bits_leq32(4)? as u8));
        }

        bs.realign();

        let comment_len = bs.read_bits_leq32(8)? as usize;

        let mut comment = Vec::with_capacity(comment_len);

        for _ in 0..comment_len {
            comment.push(bs.read_bits_leq32(8)? as u8);
        }

        let topology = builder.build();

        debug!(
            "pce: tag={}, {} front, {} side, {} back, {} lfe elements, {} channels",
            element_tag,
            num_front,
            num_side,
            num_back,
            num_lfe,
            topology.num_channels()
        );

        Ok(ProgramConfig {
            element_tag,
            object_type,
            sample_rate_index,
            topology,
            assoc_data_tags,
            cc_elements,
            mono_mixdown,
            stereo_mixdown,
            matrix_mixdown,
            comment: String::from_utf8_lossy(&comment).into_owned(),
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SpeakerGroup {
    Front,
    Side,
    Back,
}

/// Assigns speaker positions to the channel elements of a program config element. Positions are
/// assigned from the center outwards. Channels that cannot be assigned a unique position are left
/// unpositioned.
#[derive(Default)]
struct LayoutBuilder {
    elements: Vec<(ChannelElementType, u8)>,
    layout: Layout,
    used: Position,
}

impl LayoutBuilder {
    fn take(&mut self, candidates: &[Position]) -> Position {
        match candidates.iter().find(|&&pos| !self.used.contains(pos)) {
            Some(&pos) => {
                self.used |= pos;
                pos
            }
            None => Position::empty(),
        }
    }

    fn push(&mut self, group: SpeakerGroup, is_cpe: bool, tag: u8) {
        if is_cpe {
            let pairs: &[(Position, Position)] = match group {
                SpeakerGroup::Front => &[
                    (Position::FRONT_LEFT, Position::FRONT_RIGHT),
                    (Position::FRONT_LEFT_WIDE, Position::FRONT_RIGHT_WIDE),
                    (Position::FRONT_LEFT_CENTER, Position::FRONT_RIGHT_CENTER),
                ],
                SpeakerGroup::Side => &[(Position::SIDE_LEFT, Position::SIDE_RIGHT)],
                SpeakerGroup::Back => &[
                    (Position::REAR_LEFT, Position::REAR_RIGHT),
                    (Position::SIDE_LEFT, Position::SIDE_RIGHT),
                ],
            };

            let lefts: Vec<Position> = pairs.iter().map(|p| p.0).collect();
            let rights: Vec<Position> = pairs.iter().map(|p| p.1).collect();

            let left = self.take(&lefts);
            let right = self.take(&rights);

            self.elements.push((ChannelElementType::Cpe, tag));
            self.layout.push(left);
            self.layout.push(right);
        }
        else {
            let singles: &[Position] = match group {
                SpeakerGroup::Front => &[Position::FRONT_CENTER],
                SpeakerGroup::Side => &[],
                SpeakerGroup::Back => &[Position::REAR_CENTER],
            };

            let pos = self.take(singles);

            self.elements.push((ChannelElementType::Sce, tag));
            self.layout.push(pos);
        }
    }

    fn push_lfe(&mut self, tag: u8) {
        let pos = self.take(&[Position::LFE1, Position::LFE2]);

        self.elements.push((ChannelElementType::Lfe, tag));
        self.layout.push(pos);
    }

    fn build(self) -> Topology {
        Topology { elements: self.elements, layout: self.layout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coda_core::audio::Channels;
    use coda_core::errors::Error;

    #[test]
    fn verify_pce_5_1() {
        // tag 0, object type 1, sampling index 3, 2 front, 0 side, 1 back, 1 lfe, 0 assoc,
        // 0 cc, no mixdowns, front: SCE 0, CPE 0, back: CPE 1, lfe: 0, align, comment "hi".
        //
        // 0000 01 0011 0010 0000 0001 01 000 0000 0 0 0
        // 0 0000 1 0000 1 0001 0000 | align (3 bits) | 00000010 'h' 'i'
        let bits = "0000010011001000000001010000000000\
                    000001000010001 0000 000"
            .replace(' ', "");

        let mut buf: Vec<u8> = bits
            .as_bytes()
            .chunks(8)
            .map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | (b - b'0')))
            .collect();

        buf.extend_from_slice(&[2, b'h', b'i']);

        let mut bs = BitReaderLtr::new(&buf);

        let pce = ProgramConfig::read(&mut bs).unwrap();

        assert_eq!(pce.sample_rate_index, 3);
        assert_eq!(pce.comment, "hi");
        assert_eq!(pce.topology.num_channels(), 6);
        assert_eq!(
            pce.topology.elements,
            vec![
                (ChannelElementType::Sce, 0),
                (ChannelElementType::Cpe, 0),
                (ChannelElementType::Cpe, 1),
                (ChannelElementType::Lfe, 0),
            ]
        );
        assert_eq!(
            Channels::from_layout(&pce.topology.layout),
            Channels::Positioned(
                Position::FRONT_CENTER
                    | Position::FRONT_LEFT
                    | Position::FRONT_RIGHT
                    | Position::REAR_LEFT
                    | Position::REAR_RIGHT
                    | Position::LFE1
            )
        );
    }

    #[test]
    fn verify_frame_end_only() {
        let sbinfo = GASubbandInfo::find(44100);

        // END
        let buf = [0b1110_0000];
        let mut bs = BitReaderLtr::new(&buf);

        let frame = Frame::read(&mut bs, &sbinfo).unwrap();
        assert!(frame.elements.is_empty());
    }

    #[test]
    fn verify_frame_missing_end() {
        let sbinfo = GASubbandInfo::find(44100);

        // FIL with 1 byte of fill payload, then the buffer ends.
        let buf = [0b1100_0010, 0b0000_0000];
        let mut bs = BitReaderLtr::new(&buf);

        assert_eq!(Frame::read(&mut bs, &sbinfo).err(), Some(Error::InsufficientBits));
    }

    #[test]
    fn verify_frame_rejects_cce() {
        let sbinfo = GASubbandInfo::find(44100);

        let buf = [0b0100_0000, 0x00];
        let mut bs = BitReaderLtr::new(&buf);

        assert!(matches!(Frame::read(&mut bs, &sbinfo), Err(Error::Unsupported(_))));
    }

    #[test]
    fn verify_frame_skips_dse() {
        let sbinfo = GASubbandInfo::find(44100);

        // DSE tag 0, align, 2 bytes, then END.
        // 100 0000 1 | 00000010 | 0xaa 0xbb | 111
        let buf = [0b1000_0001, 0b0000_0010, 0xaa, 0xbb, 0b1110_0000];
        let mut bs = BitReaderLtr::new(&buf);

        let frame = Frame::read(&mut bs, &sbinfo).unwrap();

        assert!(frame.elements.is_empty());
        assert_eq!(bs.bits_read(), 35);
    }
}
