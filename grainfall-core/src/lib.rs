#![deny(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! This crate collects the methods needed to relax a [Board](grainfall_concepts::Board) of
//! the abelian sandpile model.
//!
//! ## Backends
//! The [backend::serial] relaxers operate on a single thread and serve as reference.
//! The [backend::partitioned] backend splits the board into row bands which are relaxed
//! concurrently.
//! Both arrive at the identical stable board and perform the same number of topples since
//! the final state does not depend on the order in which cells are toppled.
//!
//! ## Storage
//! Boards and information about a run can be exported as json or ron files.
//! See the [storage] module.

/// Serial and partitioned relaxation of boards
pub mod backend;

pub mod progress;

/// Export boards and run information to files
pub mod storage;

#[doc(hidden)]
pub use rayon;

#[cfg(feature = "tracing")]
#[doc(hidden)]
pub use tracing;
