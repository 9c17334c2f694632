#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
//! # grainfall - Building Blocks
//!
//! Building blocks to set up and inspect runs.
//! Initial boards are created by a [Placement] of a pile of grains.
//! ```
//! # use grainfall_building_blocks::prelude::*;
//! let mut rng = rand::thread_rng();
//! let board = initial_board(11, 1_000, Placement::Central, &mut rng)?;
//! assert_eq!(board.get(5, 5), Some(1_000));
//! # Ok::<(), grainfall_concepts::SetupError>(())
//! ```
//! With the `plotters` feature, stable boards can be rendered to png images.

/// Distribute the initial pile of grains over the board
mod placement;

/// Render stable boards as images
#[cfg(feature = "plotters")]
pub mod plotting;

pub use placement::*;
#[cfg(feature = "plotters")]
pub use plotting::*;

/// Re-exports all building blocks
pub mod prelude;
