// Coda
// Copyright (c) 2026 The Project Coda Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Coda.
///
/// Every variant except `Config` describes a failure of a single frame. A decoder that returns one
/// of those remains usable, and the caller may continue with the next frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The bitstream ended before a read could be completed. The frame is truncated.
    InsufficientBits,
    /// An unsupported codec feature, object type, or channel layout was encountered.
    Unsupported(&'static str),
    /// A variable-length code did not match any entry of the codebook.
    InvalidCodebookSymbol,
    /// Two consecutive window sequences do not form a legal transition.
    InvalidWindowSequenceTransition {
        /// The window sequence of the previous frame.
        prev: u8,
        /// The window sequence of the current frame.
        next: u8,
    },
    /// The stream contained a structurally impossible syntactic element.
    MalformedElement(&'static str),
    /// The stream configuration could not be used to instantiate a decoder.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::InsufficientBits => {
                write!(f, "insufficient bits: frame is truncated")
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Error::InvalidCodebookSymbol => {
                write!(f, "malformed stream: invalid codebook symbol")
            }
            Error::InvalidWindowSequenceTransition { prev, next } => {
                write!(
                    f,
                    "malformed stream: invalid window sequence transition {} -> {}",
                    prev, next
                )
            }
            Error::MalformedElement(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Error::Config(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a malformed element error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::MalformedElement(desc))
}

/// Convenience function to create an unsupported feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create a configuration error.
pub fn config_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::Config(desc))
}

/// Convenience function to create an insufficient bits error.
pub fn insufficient_bits_error<T>() -> Result<T> {
    Err(Error::InsufficientBits)
}

/// Convenience function to create an invalid codebook symbol error.
pub fn invalid_symbol_error<T>() -> Result<T> {
    Err(Error::InvalidCodebookSymbol)
}
