// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements bit-level reading of compressed frames.
//!
//! All readers consume a `&[u8]` holding exactly one frame (or configuration record). Reads never
//! block and never panic: reading past the end of the buffer returns
//! [`Error::InsufficientBits`](crate::errors::Error::InsufficientBits).

mod bit;
pub mod vlc;

pub use bit::*;
