// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `vlc` module provides support for decoding variable-length codes (VLC).
//!
//! A [`Codebook`] is a flattened table-of-tables. The first block is indexed by the first
//! `init_block_len` bits of a codeword. Each entry of a block either holds a decoded value and the
//! length of its codeword, or a jump to a further block indexed by the next few bits. Unused
//! entries hold neither, and decoding them yields an invalid symbol error.

use log::trace;

/// A `CodebookEntry` is a single entry of a [`Codebook`] table.
pub trait CodebookEntry: Copy + Clone + Default {
    /// The type of a decoded value.
    type ValueType: Copy;

    /// The maximum jump offset.
    const JUMP_OFFSET_MAX: u32;

    /// Create a new value entry.
    fn new_value(value: Self::ValueType, len: u8) -> Self;

    /// Create a new jump entry.
    fn new_jump(offset: u32, len: u8) -> Self;

    /// Returns `true` if this entry is a value entry.
    fn is_value(&self) -> bool;

    /// Returns `true` if this entry is a jump entry.
    fn is_jump(&self) -> bool;

    /// Gets the value.
    fn value(&self) -> Self::ValueType;

    /// Get the length of the value's codeword in bits.
    fn value_len(&self) -> u32;

    /// Get the position in the table to jump to.
    fn jump_offset(&self) -> usize;

    /// Get the number of bits to read after jumping in the table.
    fn jump_len(&self) -> u32;
}

const JUMP_FLAG: u8 = 0x80;

macro_rules! decl_entry {
    (
        #[doc = $expr:expr]
        $name:ident, $value_type:ty, $offset_type:ty
    ) => {
        #[doc = $expr]
        #[derive(Copy, Clone, Default)]
        pub struct $name {
            value: $value_type,
            offset: $offset_type,
            // The upper bit is set for jump entries. A zero length marks an unused entry.
            len: u8,
        }

        impl CodebookEntry for $name {
            type ValueType = $value_type;

            const JUMP_OFFSET_MAX: u32 = <$offset_type>::MAX as u32;

            #[inline(always)]
            fn new_value(value: Self::ValueType, len: u8) -> Self {
                debug_assert!(len > 0 && len < JUMP_FLAG);
                $name { value, offset: 0, len }
            }

            #[inline(always)]
            fn new_jump(offset: u32, len: u8) -> Self {
                debug_assert!(offset <= Self::JUMP_OFFSET_MAX);
                $name {
                    value: Default::default(),
                    offset: offset as $offset_type,
                    len: JUMP_FLAG | len,
                }
            }

            #[inline(always)]
            fn is_jump(&self) -> bool {
                self.len & JUMP_FLAG != 0
            }

            #[inline(always)]
            fn is_value(&self) -> bool {
                self.len != 0 && self.len & JUMP_FLAG == 0
            }

            #[inline(always)]
            fn value(&self) -> Self::ValueType {
                debug_assert!(self.is_value());
                self.value
            }

            #[inline(always)]
            fn value_len(&self) -> u32 {
                debug_assert!(self.is_value());
                u32::from(self.len)
            }

            #[inline(always)]
            fn jump_offset(&self) -> usize {
                debug_assert!(self.is_jump());
                self.offset as usize
            }

            #[inline(always)]
            fn jump_len(&self) -> u32 {
                debug_assert!(self.is_jump());
                u32::from(self.len & !JUMP_FLAG)
            }
        }
    };
}

decl_entry!(
    /// `Entry8x16` is a codebook entry for 8-bit values with codes up-to 16-bits.
    Entry8x16, u8, u16
);

decl_entry!(
    /// `Entry16x16` is a codebook entry for 16-bit values with codes up-to 16-bits.
    Entry16x16, u16, u16
);

/// A decoding table for a set of variable-length codes.
#[derive(Default)]
pub struct Codebook<E: CodebookEntry> {
    pub table: Vec<E>,
    pub max_code_len: u32,
    pub init_block_len: u32,
}

impl<E: CodebookEntry> Codebook<E> {
    /// Returns `true` if the codebook is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns `true` if every bit pattern of `max_code_len` bits decodes to a value, i.e., the
    /// codebook has no unused entries.
    pub fn is_complete(&self) -> bool {
        !self.table.is_empty() && self.table.iter().all(|e| e.is_value() || e.is_jump())
    }
}

#[derive(Clone, Copy)]
struct CodeWord<V: Copy> {
    code: u32,
    len: u32,
    value: V,
}

/// `CodebookBuilder` generates a [`Codebook`] from a list of codewords, their lengths, and values.
pub struct CodebookBuilder {
    max_bits_per_block: u32,
}

impl Default for CodebookBuilder {
    fn default() -> Self {
        CodebookBuilder::new()
    }
}

impl CodebookBuilder {
    /// Instantiates a new `CodebookBuilder`.
    ///
    /// Codewords are matched verbatim: the first bit of a codeword is its most-significant bit.
    pub fn new() -> Self {
        CodebookBuilder { max_bits_per_block: 8 }
    }

    /// Specify the maximum number of bits that should be consumed from the source at a time.
    /// This value must be within the range 1 <= `max_bits_per_read` <= 16. Values outside of
    /// this range will cause this function to panic. If not provided, a value will be
    /// automatically chosen.
    pub fn bits_per_read(&mut self, max_bits_per_read: u32) -> &mut Self {
        assert!(max_bits_per_read <= 16);
        assert!(max_bits_per_read > 0);
        self.max_bits_per_block = max_bits_per_read;
        self
    }

    fn gen_block<E: CodebookEntry>(
        &self,
        table: &mut Vec<E>,
        words: &mut [CodeWord<E::ValueType>],
    ) -> (usize, u32) {
        let max_len = words.iter().map(|w| w.len).max().unwrap_or(0);

        let block_len = max_len.clamp(1, self.max_bits_per_block);

        let offset = table.len();
        table.resize(offset + (1 << block_len), Default::default());

        // Sort the codewords by the prefix indexing this block so that the codewords sharing a
        // prefix are adjacent.
        let prefix = |w: &CodeWord<E::ValueType>| {
            if w.len > block_len {
                w.code >> (w.len - block_len)
            }
            else {
                w.code << (block_len - w.len)
            }
        };

        words.sort_by_key(|w| (prefix(w), w.len));

        let mut i = 0;

        while i < words.len() {
            let start = prefix(&words[i]);

            if words[i].len <= block_len {
                // The codeword ends within this block. It occupies every entry sharing its prefix.
                let count = 1 << (block_len - words[i].len);

                for entry in &mut table[offset + start as usize..offset + (start + count) as usize]
                {
                    debug_assert!(!entry.is_value() && !entry.is_jump(), "vlc: codes overlap");
                    *entry = E::new_value(words[i].value, words[i].len as u8);
                }

                i += 1;
            }
            else {
                // The codeword continues past this block. Collect every codeword with the same
                // prefix, strip the prefix, and generate a sub-block for them.
                let mut end = i + 1;

                while end < words.len()
                    && words[end].len > block_len
                    && prefix(&words[end]) == start
                {
                    end += 1;
                }

                let mut sub_words: Vec<CodeWord<E::ValueType>> = words[i..end]
                    .iter()
                    .map(|w| {
                        let len = w.len - block_len;
                        CodeWord { code: w.code & ((1 << len) - 1), len, value: w.value }
                    })
                    .collect();

                let (sub_offset, sub_len) = self.gen_block(table, &mut sub_words);

                debug_assert!(!table[offset + start as usize].is_value(), "vlc: codes overlap");
                table[offset + start as usize] = E::new_jump(sub_offset as u32, sub_len as u8);

                i = end;
            }
        }

        (offset, block_len)
    }

    /// Construct a `Codebook` using the given codewords, their respective lengths, and values.
    ///
    /// The codewords must form a prefix-free code and no codeword may be longer than 32 bits.
    pub fn make<E: CodebookEntry>(
        &mut self,
        codes: &[u32],
        code_lens: &[u8],
        values: &[E::ValueType],
    ) -> Codebook<E> {
        assert!(codes.len() == code_lens.len());
        assert!(codes.len() == values.len());

        let mut words: Vec<CodeWord<E::ValueType>> = codes
            .iter()
            .zip(code_lens)
            .zip(values)
            .filter(|((_, &len), _)| len > 0)
            .map(|((&code, &len), &value)| CodeWord { code, len: u32::from(len), value })
            .collect();

        let max_code_len = words.iter().map(|w| w.len).max().unwrap_or(0);

        assert!(max_code_len <= 32);

        let mut table = Vec::new();

        let (_, init_block_len) = self.gen_block(&mut table, &mut words);

        trace!(
            "vlc: built codebook of {} codes, {} entries, max length {}",
            codes.len(),
            table.len(),
            max_code_len
        );

        Codebook { table, max_code_len, init_block_len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::io::{BitReaderLtr, ReadBitsLtr};

    #[test]
    fn verify_codebook_decode() {
        // A complete prefix code: 0, 10, 110, 1110, 11110, 111110, 1111110, 11111110, 111111110,
        // 1111111110, 1111111111.
        let codes = [0x0, 0x2, 0x6, 0xe, 0x1e, 0x3e, 0x7e, 0xfe, 0x1fe, 0x3fe, 0x3ff];
        let lens = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10];
        let values: Vec<u8> = (0..11).collect();

        let mut builder = CodebookBuilder::new();
        builder.bits_per_read(4);

        let cb: Codebook<Entry8x16> = builder.make(&codes, &lens, &values);

        assert!(cb.is_complete());
        assert_eq!(cb.max_code_len, 10);

        // 0 | 10 | 1111111111 | 111111110 | 1110 | pad
        let buf = [0b0101_1111, 0b1111_1111, 0b1111_1011, 0b1000_0000];
        let mut bs = BitReaderLtr::new(&buf);

        assert_eq!(bs.read_codebook(&cb).unwrap(), (0, 1));
        assert_eq!(bs.read_codebook(&cb).unwrap(), (1, 2));
        assert_eq!(bs.read_codebook(&cb).unwrap(), (10, 10));
        assert_eq!(bs.read_codebook(&cb).unwrap(), (8, 9));
        assert_eq!(bs.read_codebook(&cb).unwrap(), (3, 4));
    }

    #[test]
    fn verify_codebook_errors() {
        // An incomplete code: 00, 01, 10. The pattern 11 is unused.
        let codes = [0x0, 0x1, 0x2];
        let lens = [2, 2, 2];
        let values = [7u16, 8, 9];

        let cb: Codebook<Entry16x16> = CodebookBuilder::new().make(&codes, &lens, &values);

        assert!(!cb.is_complete());

        let mut bs = BitReaderLtr::new(&[0b1011_0000]);

        assert_eq!(bs.read_codebook(&cb).unwrap(), (9, 2));
        assert_eq!(bs.read_codebook(&cb), Err(Error::InvalidCodebookSymbol));

        // A codeword cut short by the end of the stream.
        let codes = [0x0, 0x1fe, 0x1ff];
        let lens = [1, 9, 9];
        let values = [1u8, 2, 3];

        let cb: Codebook<Entry8x16> = CodebookBuilder::new().make(&codes, &lens, &values);

        let mut bs = BitReaderLtr::new(&[0xff]);

        assert_eq!(bs.read_codebook(&cb), Err(Error::InsufficientBits));
    }
}
