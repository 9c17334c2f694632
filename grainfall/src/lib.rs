#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! [grainfall](crate) relaxes boards of the abelian sandpile model.
//!
//! Every cell of a [Board](concepts::Board) which holds 4 or more grains topples and hands one
//! grain to each of its 4 neighbours.
//! Grains which leave the board are lost.
//! The stable board which is reached in the end does not depend on the order of topples.
//! This allows us to split the board into row bands and relax them concurrently.
//!
//! ```
//! use grainfall::prelude::*;
//! let mut rng = rand::thread_rng();
//! let initial = initial_board(31, 3_000, Placement::Central, &mut rng)?;
//!
//! let mut serial = initial.clone();
//! SweepRelaxer.relax(&mut serial)?;
//!
//! let partitioned = grainfall::core::backend::partitioned::run(initial, 4)?;
//! assert_eq!(serial, partitioned);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use grainfall_building_blocks as building_blocks;

pub use grainfall_concepts as concepts;

pub use grainfall_core as core;

/// Re-exports the default types and traits.
pub mod prelude;
