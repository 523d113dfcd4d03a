// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared structs, traits, and DSP primitives for Project Coda codecs.

pub mod audio;
pub mod dsp;
pub mod errors;
pub mod io;
