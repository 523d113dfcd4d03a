// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stream configuration: the AudioSpecificConfig of ISO/IEC 14496-3, 1.6.2.1, or the equivalent
//! fields of an ADTS header.

use coda_core::errors::{config_error, Result};
use coda_core::io::{BitReaderLtr, FiniteBitStream, ReadBitsLtr};

use log::debug;

use crate::aac::ProgramConfig;
use crate::adts::AdtsHeader;
use crate::common::{M4AType, AAC_SAMPLE_RATES};

const SYNC_EXTENSION_SBR: u32 = 0x2b7;
const SYNC_EXTENSION_PS: u32 = 0x548;

/// Explicitly signalled spectral band replication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SbrConfig {
    /// The output sampling rate of the SBR tool.
    pub sample_rate: u32,
}

/// The configuration of an AAC stream, as needed to instantiate a decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// The object type of the core coder.
    pub object_type: M4AType,
    /// The sampling rate of the core coder.
    pub sample_rate: u32,
    pub channel_config: u32,
    /// The number of samples per channel per frame of the core coder.
    pub frame_len: usize,
    pub sbr: Option<SbrConfig>,
    /// True if parametric stereo is explicitly signalled.
    pub ps: bool,
    /// The program config element of channel configuration 0.
    pub program_config: Option<ProgramConfig>,
}

impl StreamConfig {
    /// Instantiates a configuration for a core coder without SBR.
    pub fn new(object_type: M4AType, sample_rate_index: usize, channel_config: u32) -> Self {
        StreamConfig {
            object_type,
            sample_rate: AAC_SAMPLE_RATES.get(sample_rate_index).copied().unwrap_or(0),
            channel_config,
            frame_len: 1024,
            sbr: None,
            ps: false,
            program_config: None,
        }
    }

    /// Instantiates a configuration from the fields of an ADTS header.
    pub fn from_adts_header(header: &AdtsHeader) -> Self {
        StreamConfig::new(header.profile, header.sample_rate_index, header.channel_config)
    }

    /// Parses an AudioSpecificConfig.
    pub fn from_audio_specific_config(buf: &[u8]) -> Result<Self> {
        let mut bs = BitReaderLtr::new(buf);

        let mut object_type = read_object_type(&mut bs)?;
        let sample_rate = read_sample_rate(&mut bs)?;
        let channel_config = bs.read_bits_leq32(4)?;

        let mut sbr = None;
        let mut ps = false;

        let explicit = matches!(object_type, M4AType::Sbr | M4AType::PS);

        if explicit {
            ps = object_type == M4AType::PS;

            let ext_sample_rate = read_sample_rate(&mut bs)?;
            sbr = Some(SbrConfig { sample_rate: ext_sample_rate });

            object_type = read_object_type(&mut bs)?;

            if object_type == M4AType::ER_BSAC {
                let _ext_channel_config = bs.read_bits_leq32(4)?;
            }
        }

        if !object_type.is_general_audio() {
            debug!("asc: object type {}", object_type);
            return config_error("aac: unsupported object type");
        }

        // GASpecificConfig
        let frame_len = if bs.read_bool()? { 960 } else { 1024 };

        if bs.read_bool()? {
            let _core_coder_delay = bs.read_bits_leq32(14)?;
        }

        let extension_flag = bs.read_bool()?;

        let program_config =
            if channel_config == 0 { Some(ProgramConfig::read(&mut bs)?) } else { None };

        if matches!(object_type, M4AType::Scalable | M4AType::ER_AAC_Scalable) {
            let _layer = bs.read_bits_leq32(3)?;
        }

        if extension_flag {
            if object_type == M4AType::ER_BSAC {
                let _num_sub_frames = bs.read_bits_leq32(5)?;
                let _layer_length = bs.read_bits_leq32(11)?;
            }

            if object_type.is_error_resilient() && object_type != M4AType::ER_BSAC {
                // Section data, scale factor and spectral data resilience flags.
                bs.ignore_bits(3)?;
            }

            if bs.read_bool()? {
                return config_error("aac: version 3 extensions");
            }
        }

        if object_type.is_error_resilient() {
            // Error protection configuration.
            bs.ignore_bits(2)?;
        }

        // Backward compatible signalling follows the core configuration.
        if !explicit && bs.bits_left() >= 16 {
            if bs.read_bits_leq32(11)? == SYNC_EXTENSION_SBR {
                match read_object_type(&mut bs)? {
                    M4AType::Sbr => {
                        if bs.read_bool()? {
                            let ext_sample_rate = read_sample_rate(&mut bs)?;
                            sbr = Some(SbrConfig { sample_rate: ext_sample_rate });

                            if bs.bits_left() >= 12
                                && bs.read_bits_leq32(11)? == SYNC_EXTENSION_PS
                                && bs.read_bool()?
                            {
                                debug!("asc: ignoring parametric stereo");
                            }
                        }
                    }
                    ext => debug!("asc: ignoring extension object type {}", ext),
                }
            }
        }

        if sample_rate == 0 {
            return config_error("aac: invalid sample rate");
        }

        // A core rate above the SBR output rate is invalid, treat it as no SBR.
        if let Some(cfg) = sbr {
            if cfg.sample_rate < sample_rate {
                debug!("asc: sbr rate {} below core rate {}", cfg.sample_rate, sample_rate);
                sbr = None;
            }
        }

        Ok(StreamConfig {
            object_type,
            sample_rate,
            channel_config,
            frame_len,
            sbr,
            ps,
            program_config,
        })
    }

    /// The sampling rate of the decoded output when SBR is applied.
    pub fn output_sample_rate(&self, sbr: bool) -> u32 {
        match self.sbr {
            Some(cfg) if sbr => cfg.sample_rate,
            _ => self.sample_rate,
        }
    }
}

fn read_object_type<B: ReadBitsLtr>(bs: &mut B) -> Result<M4AType> {
    let index = match bs.read_bits_leq32(5)? {
        31 => 32 + bs.read_bits_leq32(6)?,
        index => index,
    };

    Ok(M4AType::from_index(index))
}

fn read_sample_rate<B: ReadBitsLtr>(bs: &mut B) -> Result<u32> {
    match bs.read_bits_leq32(4)? {
        15 => bs.read_bits_leq32(24),
        index => Ok(AAC_SAMPLE_RATES[index as usize]),
    }
}
