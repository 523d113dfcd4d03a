// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `audio` module provides primitives for describing decoded audio.

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

bitflags! {
    /// Speaker positions, as a bitmask.
    ///
    /// Bits 0 to 10 follow the channel mask of `WAVEFORMATEXTENSIBLE`. Only the positions an AAC
    /// channel configuration or program config element can name are defined.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Position: u32 {
        const FRONT_LEFT          = 1 << 0;
        const FRONT_RIGHT         = 1 << 1;
        /// Also used for mono.
        const FRONT_CENTER        = 1 << 2;
        const LFE1                = 1 << 3;
        /// Surround left, behind the listener.
        const REAR_LEFT           = 1 << 4;
        const REAR_RIGHT          = 1 << 5;
        const FRONT_LEFT_CENTER   = 1 << 6;
        const FRONT_RIGHT_CENTER  = 1 << 7;
        const REAR_CENTER         = 1 << 8;
        const SIDE_LEFT           = 1 << 9;
        const SIDE_RIGHT          = 1 << 10;
        /// A second LFE channel, for program configs that carry more than one.
        const LFE2                = 1 << 18;
        const FRONT_LEFT_WIDE     = 1 << 24;
        const FRONT_RIGHT_WIDE    = 1 << 25;
    }
}

/// A set of channels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Channels {
    /// Channels are assigned explict speaker positions. A bit set to 1 indicates that the
    /// corresponding channel position is present.
    Positioned(Position),
    /// Channels 0 to the specified count (0..count) are discrete and independent channels.
    Discrete(u16),
    /// No channels.
    #[default]
    None,
}

impl Channels {
    /// Get the total number of channels.
    pub fn count(&self) -> usize {
        match self {
            Channels::Positioned(positions) => positions.bits().count_ones() as usize,
            Channels::Discrete(count) => usize::from(*count),
            Channels::None => 0,
        }
    }

    /// Build a channel set from an ordered list of single positions. If any position is empty or
    /// repeated, the set degrades to `Discrete`.
    pub fn from_layout(layout: &[Position]) -> Channels {
        let mut mask = Position::empty();

        for &pos in layout {
            if pos.bits().count_ones() != 1 || mask.intersects(pos) {
                return Channels::Discrete(layout.len() as u16);
            }
            mask |= pos;
        }

        if layout.is_empty() {
            Channels::None
        }
        else {
            Channels::Positioned(mask)
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channels::Positioned(positions) => write!(f, "{:?}", positions),
            Channels::Discrete(count) => write!(f, "{} discrete", count),
            Channels::None => write!(f, "none"),
        }
    }
}

/// The channel layout of a `PcmBlock`: one position per interleaved channel, in interleaving
/// order.
pub type Layout = SmallVec<[Position; 8]>;

/// A block of interleaved, signed 16-bit PCM samples.
#[derive(Clone, Debug, Default)]
pub struct PcmBlock {
    samples: Vec<i16>,
    layout: Layout,
    frames: usize,
    sample_rate: u32,
}

impl PcmBlock {
    /// Instantiate a new `PcmBlock` from interleaved samples. The number of samples must be the
    /// number of frames times the number of channels in `layout`.
    pub fn new(sample_rate: u32, layout: Layout, samples: Vec<i16>) -> Self {
        let frames = if layout.is_empty() { 0 } else { samples.len() / layout.len() };

        assert_eq!(frames * layout.len(), samples.len());

        PcmBlock { samples, layout, frames, sample_rate }
    }

    /// Gets the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the number of interleaved channels.
    pub fn num_channels(&self) -> usize {
        self.layout.len()
    }

    /// Gets the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Gets the position of each interleaved channel.
    pub fn layout(&self) -> &[Position] {
        &self.layout
    }

    /// Gets the channel set of the block.
    pub fn channels(&self) -> Channels {
        Channels::from_layout(&self.layout)
    }

    /// Gets all interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Gets an iterator over the samples of a single channel.
    pub fn chan(&self, ch: usize) -> impl Iterator<Item = i16> + '_ {
        assert!(ch < self.num_channels());
        self.samples.iter().skip(ch).step_by(self.num_channels()).copied()
    }

    /// Consumes the block, returning the interleaved samples.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn verify_channels_from_layout() {
        let stereo = [Position::FRONT_LEFT, Position::FRONT_RIGHT];
        assert_eq!(
            Channels::from_layout(&stereo),
            Channels::Positioned(Position::FRONT_LEFT | Position::FRONT_RIGHT)
        );

        let repeated = [Position::FRONT_LEFT, Position::FRONT_RIGHT, Position::FRONT_LEFT];
        assert_eq!(Channels::from_layout(&repeated), Channels::Discrete(3));

        let unknown = [Position::FRONT_CENTER, Position::empty()];
        assert_eq!(Channels::from_layout(&unknown), Channels::Discrete(2));

        assert_eq!(Channels::from_layout(&[]), Channels::None);
    }

    #[test]
    fn verify_pcm_block_channels() {
        let layout: Layout = smallvec![Position::FRONT_CENTER, Position::FRONT_LEFT];
        let block = PcmBlock::new(48000, layout, vec![1, -1, 2, -2, 3, -3]);

        assert_eq!(block.frames(), 3);
        assert_eq!(block.num_channels(), 2);
        assert_eq!(block.chan(0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(block.chan(1).collect::<Vec<_>>(), vec![-1, -2, -3]);
        assert_eq!(block.channels().count(), 2);
    }
}
