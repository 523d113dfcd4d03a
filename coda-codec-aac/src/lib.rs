// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An AAC-LC and HE-AAC (SBR) decoder.
//!
//! Frames are decoded one at a time with [`AacDecoder::decode_frame`], or with
//! [`AacDecoder::decode_frame_with`] and an [`OverlapState`] owned by the caller. Locating frames
//! in a container is left to the caller: each call takes exactly one raw data block, or one ADTS
//! frame with [`Framing::Adts`].

#![allow(clippy::needless_range_loop)]

mod aac;
mod adts;
mod common;
mod config;

pub use aac::{AacDecoder, DecoderOptions, Framing, OverlapState, ProgramConfig};
pub use adts::AdtsHeader;
pub use common::{ChannelElementType, M4AType, Topology};
pub use config::{SbrConfig, StreamConfig};
