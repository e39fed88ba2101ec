// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Line protocol spoken with the wooden-fish controller board.
//!
//! Outbound commands are `:`-delimited ASCII fields, one per line. Inbound
//! lines are free text; a line carrying one of the strike markers is a
//! strike, anything else is diagnostic output.

pub mod codec;

pub use codec::{decode, encode, parse_command, LINE_TERMINATOR, STRIKE_MARKERS};
