// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use coda_core::audio::{Layout, Position};
use smallvec::smallvec;

/// MPEG-4 audio object types (ISO/IEC 14496-3, Table 1.17).
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum M4AType {
    Main,
    Lc,
    Ssr,
    Ltp,
    Sbr,
    Scalable,
    ER_AAC_LC,
    ER_AAC_LTP,
    ER_AAC_Scalable,
    ER_BSAC,
    ER_AAC_LD,
    ER_AAC_ELD,
    PS,
    /// Any other object type, by index.
    Other(u32),
}

impl M4AType {
    pub fn from_index(index: u32) -> M4AType {
        match index {
            1 => M4AType::Main,
            2 => M4AType::Lc,
            3 => M4AType::Ssr,
            4 => M4AType::Ltp,
            5 => M4AType::Sbr,
            6 => M4AType::Scalable,
            17 => M4AType::ER_AAC_LC,
            19 => M4AType::ER_AAC_LTP,
            20 => M4AType::ER_AAC_Scalable,
            22 => M4AType::ER_BSAC,
            23 => M4AType::ER_AAC_LD,
            29 => M4AType::PS,
            39 => M4AType::ER_AAC_ELD,
            other => M4AType::Other(other),
        }
    }

    /// Returns true if the object type is coded with the general audio (GA) syntax.
    pub fn is_general_audio(&self) -> bool {
        matches!(
            self,
            M4AType::Main
                | M4AType::Lc
                | M4AType::Ssr
                | M4AType::Ltp
                | M4AType::Scalable
                | M4AType::ER_AAC_LC
                | M4AType::ER_AAC_LTP
                | M4AType::ER_AAC_Scalable
                | M4AType::ER_BSAC
                | M4AType::ER_AAC_LD
        )
    }

    /// Returns true if the object type uses error resilient (ER) tools.
    pub fn is_error_resilient(&self) -> bool {
        match self {
            M4AType::ER_AAC_LC
            | M4AType::ER_AAC_LTP
            | M4AType::ER_AAC_Scalable
            | M4AType::ER_BSAC
            | M4AType::ER_AAC_LD
            | M4AType::ER_AAC_ELD => true,
            M4AType::Other(idx) => (17..=27).contains(idx),
            _ => false,
        }
    }
}

impl std::fmt::Display for M4AType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            M4AType::Main => write!(f, "AAC Main"),
            M4AType::Lc => write!(f, "AAC LC"),
            M4AType::Ssr => write!(f, "AAC SSR"),
            M4AType::Ltp => write!(f, "AAC LTP"),
            M4AType::Sbr => write!(f, "SBR"),
            M4AType::Scalable => write!(f, "AAC Scalable"),
            M4AType::ER_AAC_LC => write!(f, "ER AAC LC"),
            M4AType::ER_AAC_LTP => write!(f, "ER AAC LTP"),
            M4AType::ER_AAC_Scalable => write!(f, "ER AAC Scalable"),
            M4AType::ER_BSAC => write!(f, "ER BSAC"),
            M4AType::ER_AAC_LD => write!(f, "ER AAC LD"),
            M4AType::ER_AAC_ELD => write!(f, "ER AAC ELD"),
            M4AType::PS => write!(f, "PS"),
            M4AType::Other(idx) => write!(f, "object type {}", idx),
        }
    }
}

/// Sample rates by sampling frequency index. Indicies 13 and 14 are reserved, 15 is the escape.
pub const AAC_SAMPLE_RATES: [u32; 16] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350, 0, 0,
    0,
];

/// Gets the sampling frequency index of a sample rate. Rates that are not in the table map to the
/// index of the nearest table rate, per ISO/IEC 14496-3, Table 4.82.
pub fn sample_rate_index(srate: u32) -> usize {
    const MIN_RATES: [u32; 12] =
        [92017, 75132, 55426, 46009, 37566, 27713, 23004, 18783, 13856, 11502, 9391, 0];

    MIN_RATES.iter().position(|&min| srate >= min).unwrap_or(11)
}

/// A syntactic element that carries audio channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelElementType {
    /// Single channel element.
    Sce,
    /// Channel pair element.
    Cpe,
    /// Low-frequency effects element.
    Lfe,
}

impl ChannelElementType {
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelElementType::Cpe => 2,
            _ => 1,
        }
    }
}

/// A channel topology: the ordered list of channel elements expected in a raw data block, and the
/// speaker position of each channel they carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Topology {
    pub elements: Vec<(ChannelElementType, u8)>,
    pub layout: Layout,
}

impl Topology {
    /// Gets the total number of audio channels.
    pub fn num_channels(&self) -> usize {
        self.layout.len()
    }

    /// Gets the topology of a channel configuration index (ISO/IEC 14496-3, Table 1.19).
    /// Configuration 0 is defined by a program config element and returns `None`, as do the
    /// reserved configurations.
    pub fn from_channel_config(config: u32) -> Option<Topology> {
        use ChannelElementType::*;

        let (elements, layout): (&[ChannelElementType], Layout) = match config {
            1 => (&[Sce], smallvec![Position::FRONT_CENTER]),
            2 => (&[Cpe], smallvec![Position::FRONT_LEFT, Position::FRONT_RIGHT]),
            3 => (
                &[Sce, Cpe],
                smallvec![Position::FRONT_CENTER, Position::FRONT_LEFT, Position::FRONT_RIGHT],
            ),
            4 => (
                &[Sce, Cpe, Sce],
                smallvec![
                    Position::FRONT_CENTER,
                    Position::FRONT_LEFT,
                    Position::FRONT_RIGHT,
                    Position::REAR_CENTER,
                ],
            ),
            5 => (
                &[Sce, Cpe, Cpe],
                smallvec![
                    Position::FRONT_CENTER,
                    Position::FRONT_LEFT,
                    Position::FRONT_RIGHT,
                    Position::SIDE_LEFT,
                    Position::SIDE_RIGHT,
                ],
            ),
            6 => (
                &[Sce, Cpe, Cpe, Lfe],
                smallvec![
                    Position::FRONT_CENTER,
                    Position::FRONT_LEFT,
                    Position::FRONT_RIGHT,
                    Position::SIDE_LEFT,
                    Position::SIDE_RIGHT,
                    Position::LFE1,
                ],
            ),
            7 => (
                &[Sce, Cpe, Cpe, Cpe, Lfe],
                smallvec![
                    Position::FRONT_CENTER,
                    Position::FRONT_LEFT,
                    Position::FRONT_RIGHT,
                    Position::FRONT_LEFT_WIDE,
                    Position::FRONT_RIGHT_WIDE,
                    Position::SIDE_LEFT,
                    Position::SIDE_RIGHT,
                    Position::LFE1,
                ],
            ),
            _ => return None,
        };

        // Elements of the same type are tagged in order of appearance.
        let mut tags = [0u8; 3];

        let elements = elements
            .iter()
            .map(|&el| {
                let tag = &mut tags[el as usize];
                *tag += 1;
                (el, *tag - 1)
            })
            .collect();

        Some(Topology { elements, layout })
    }
}
