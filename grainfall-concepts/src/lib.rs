#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! This crate encapsulates the concepts which govern the abelian sandpile model simulated by
//! [grainfall](https://docs.rs/grainfall).
//!
//! The [Board] stores pile heights and offers the [topple](Board::topple) rule which is the
//! only operation changing the state of a run.
//! A board is stable when every cell holds less than [TOPPLE_THRESHOLD] grains.

mod board;
/// Error types shared by all crates of this workspace
pub mod errors;

pub use board::*;
pub use errors::*;
