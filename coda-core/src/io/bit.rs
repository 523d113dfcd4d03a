// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::errors::{insufficient_bits_error, invalid_symbol_error, Result};
use crate::io::vlc::{Codebook, CodebookEntry};

mod private {
    pub trait FetchBitsLtr {
        /// Get the next (up-to) 64 bits from the source, most-significant bit first. Bits past the
        /// end of the source are zero.
        fn get_bits(&self) -> u64;

        /// Get the number of bits left in the source.
        fn num_bits_left(&self) -> u64;

        /// Consume `num` bits from the source. `num` must not exceed the number of bits left.
        fn consume_bits(&mut self, num: u64);
    }
}

/// Sign extends an arbitrary, 0 to 32-bit, signed two's complement integer stored within a u32 to
/// a full width i32.
#[inline(always)]
pub fn sign_extend_leq32_to_i32(value: u32, width: u32) -> i32 {
    if width == 0 {
        return 0;
    }
    // Rust uses an arithmetic shift right (the original sign bit is repeatedly shifted on) for
    // signed integer types. Therefore, shift the value to the left so that the sign bit is the
    // left-most bit, then shift back to the right to the original location.
    let shift = u32::BITS - width;
    ((value << shift) as i32) >> shift
}

/// A `FiniteBitStream` is a bit stream that has a known length in bits.
pub trait FiniteBitStream {
    /// Gets the number of bits left unread.
    fn bits_left(&self) -> u64;
}

/// An opaque bit position within a [`BitReaderLtr`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BitPosition(u64);

impl BitPosition {
    /// The number of bits between `self` and a later position `end`.
    pub fn bits_until(&self, end: BitPosition) -> u64 {
        end.0.saturating_sub(self.0)
    }
}

/// `ReadBitsLtr` reads bits from most-significant to least-significant.
pub trait ReadBitsLtr: private::FetchBitsLtr {
    /// Discards bits up-to the next byte boundary.
    #[inline(always)]
    fn realign(&mut self) {
        let skip = self.num_bits_left() & 0x7;
        self.consume_bits(skip);
    }

    /// Ignores the specified number of bits from the stream or returns an error. On error, no bits
    /// are consumed.
    #[inline(always)]
    fn ignore_bits(&mut self, num_bits: u32) -> Result<()> {
        if u64::from(num_bits) > self.num_bits_left() {
            return insufficient_bits_error();
        }
        self.consume_bits(u64::from(num_bits));
        Ok(())
    }

    /// Ignores one bit from the stream or returns an error.
    #[inline(always)]
    fn ignore_bit(&mut self) -> Result<()> {
        self.ignore_bits(1)
    }

    /// Read a single bit as a boolean value or returns an error.
    #[inline(always)]
    fn read_bool(&mut self) -> Result<bool> {
        if self.num_bits_left() < 1 {
            return insufficient_bits_error();
        }

        let bit = self.get_bits() & (1 << 63) != 0;

        self.consume_bits(1);
        Ok(bit)
    }

    /// Read a single bit or returns an error.
    #[inline(always)]
    fn read_bit(&mut self) -> Result<u32> {
        Ok(u32::from(self.read_bool()?))
    }

    /// Returns the next `bit_width` (0 to 32) bits without consuming them, or an error if fewer
    /// bits are left.
    #[inline(always)]
    fn peek_bits_leq32(&self, bit_width: u32) -> Result<u32> {
        debug_assert!(bit_width <= u32::BITS);

        if u64::from(bit_width) > self.num_bits_left() {
            return insufficient_bits_error();
        }

        // Shift in two 32-bit operations instead of a single 64-bit operation to avoid panicing
        // when bit_width == 0.
        Ok(((self.get_bits() >> u32::BITS) >> (u32::BITS - bit_width)) as u32)
    }

    /// Reads up-to 32-bits as an unsigned integer or returns an error.
    #[inline(always)]
    fn read_bits_leq32(&mut self, bit_width: u32) -> Result<u32> {
        let bits = self.peek_bits_leq32(bit_width)?;
        self.consume_bits(u64::from(bit_width));
        Ok(bits)
    }

    /// Reads up-to 32-bits and interprets them as a signed two's complement integer or returns an
    /// error.
    #[inline(always)]
    fn read_bits_leq32_signed(&mut self, bit_width: u32) -> Result<i32> {
        let value = self.read_bits_leq32(bit_width)?;
        Ok(sign_extend_leq32_to_i32(value, bit_width))
    }

    /// Reads and returns a unary ones encoded integer or an error.
    #[inline(always)]
    fn read_unary_ones(&mut self) -> Result<u32> {
        let mut num = 0;

        loop {
            let avail = self.num_bits_left().min(32) as u32;

            if avail == 0 {
                return insufficient_bits_error();
            }

            let n_ones = self.get_bits().leading_ones().min(avail);

            if n_ones < avail {
                // A 0 bit terminated the run.
                self.consume_bits(u64::from(n_ones) + 1);
                return Ok(num + n_ones);
            }

            num += n_ones;
            self.consume_bits(u64::from(n_ones));
        }
    }

    /// Reads a codeword from the stream using the provided `Codebook`, and returns the decoded
    /// value together with the length of the codeword, or an error.
    ///
    /// If the bits at the current position do not match any codeword then
    /// [`Error::InvalidCodebookSymbol`](crate::errors::Error::InvalidCodebookSymbol) is returned.
    /// If the codeword is cut short by the end of the stream, then
    /// [`Error::InsufficientBits`](crate::errors::Error::InsufficientBits) is returned. In either
    /// case, no bits are consumed.
    fn read_codebook<E: CodebookEntry>(
        &mut self,
        codebook: &Codebook<E>,
    ) -> Result<(E::ValueType, u32)> {
        debug_assert!(codebook.max_code_len <= 32);

        let num_bits_left = self.num_bits_left();

        let mut bits = self.get_bits();

        let mut block_len = codebook.init_block_len;
        let mut entry = codebook.table[(bits >> (u64::BITS - block_len)) as usize];

        let mut consumed = 0;

        while entry.is_jump() {
            // Consume the bits used for the previous look-up.
            consumed += block_len;
            bits <<= block_len;

            if u64::from(consumed) > num_bits_left {
                return insufficient_bits_error();
            }

            // Jump to the next block.
            block_len = entry.jump_len();

            let index = bits >> (u64::BITS - block_len);

            entry = codebook.table[entry.jump_offset() + index as usize];
        }

        if !entry.is_value() {
            return invalid_symbol_error();
        }

        consumed += entry.value_len();

        if u64::from(consumed) > num_bits_left {
            return insufficient_bits_error();
        }

        self.consume_bits(u64::from(consumed));

        Ok((entry.value(), consumed))
    }
}

/// `BitReaderLtr` reads bits from most-significant to least-significant from any `&[u8]`.
///
/// Stated another way, if N-bits are read from a `BitReaderLtr` then bit 0, the first bit read,
/// is the most-significant bit, and bit N-1, the last bit read, is the least-significant.
///
/// The reader is a cursor over the buffer: its position may be saved with
/// [`pos`](BitReaderLtr::pos) and later restored with [`seek_to`](BitReaderLtr::seek_to).
#[derive(Clone)]
pub struct BitReaderLtr<'a> {
    buf: &'a [u8],
    pos: u64,
}

impl<'a> BitReaderLtr<'a> {
    /// Instantiate a new `BitReaderLtr` with the given buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        BitReaderLtr { buf, pos: 0 }
    }

    /// Gets the current position of the reader.
    pub fn pos(&self) -> BitPosition {
        BitPosition(self.pos)
    }

    /// Restores a position previously obtained from [`pos`](BitReaderLtr::pos).
    pub fn seek_to(&mut self, pos: BitPosition) {
        self.pos = pos.0.min(8 * self.buf.len() as u64);
    }

    /// Gets the number of bits consumed since the start of the buffer.
    pub fn bits_read(&self) -> u64 {
        self.pos
    }
}

impl private::FetchBitsLtr for BitReaderLtr<'_> {
    #[inline(always)]
    fn get_bits(&self) -> u64 {
        let byte_pos = (self.pos >> 3) as usize;
        let bit_pos = (self.pos & 0x7) as u32;

        let mut word = [0u8; 8];

        if byte_pos < self.buf.len() {
            let avail = (self.buf.len() - byte_pos).min(8);
            word[..avail].copy_from_slice(&self.buf[byte_pos..byte_pos + avail]);
        }

        let mut bits = u64::from_be_bytes(word) << bit_pos;

        // Pull in the remaining low bits from the ninth byte, if any.
        if bit_pos > 0 && byte_pos + 8 < self.buf.len() {
            bits |= u64::from(self.buf[byte_pos + 8]) >> (8 - bit_pos);
        }

        bits
    }

    #[inline(always)]
    fn num_bits_left(&self) -> u64 {
        (8 * self.buf.len() as u64) - self.pos
    }

    #[inline(always)]
    fn consume_bits(&mut self, num: u64) {
        debug_assert!(num <= self.num_bits_left());
        self.pos += num;
    }
}

impl ReadBitsLtr for BitReaderLtr<'_> {}

impl FiniteBitStream for BitReaderLtr<'_> {
    fn bits_left(&self) -> u64 {
        (8 * self.buf.len() as u64) - self.pos
    }
}
