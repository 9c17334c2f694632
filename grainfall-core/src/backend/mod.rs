use grainfall_concepts::Board;
use serde::{Deserialize, Serialize};

mod errors;
pub use errors::*;

/// Single-threaded relaxation which serves as reference for all other backends
pub mod serial;

/// Relax a board by splitting it into row bands which are relaxed by multiple workers.
///
/// Every round consists of a local relaxation of all bands followed by a merge of the
/// grains which spilled over band boundaries.
/// The workers are either short-lived os-threads which report back via [crossbeam_channel] or
/// tasks of a [rayon::ThreadPool].
/// The [Coordinator](partitioned::Coordinator) drives the rounds.
pub mod partitioned;

/// Summary of a finished relaxation
///
/// The number of topple events per cell does not depend on the order in which cells are
/// toppled.
/// Thus `n_topples` and `grains_lost` agree between all relaxers while `n_iterations` counts
/// sweeps or rounds and is specific to the relaxer which produced the report.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct RelaxationReport {
    /// Total number of topple events
    pub n_topples: u64,
    /// Number of sweeps (serial) or rounds (partitioned)
    pub n_iterations: u64,
    /// Grains which fell off the edges of the board
    pub grains_lost: u64,
}

/// Relaxes a [Board] in place until it is stable.
pub trait Relax {
    /// After returning successfully, [Board::is_stable] holds.
    fn relax(&self, board: &mut Board) -> Result<RelaxationReport, RelaxationError>;
}

/// Panics when a relaxer which stops without scanning the whole board left it unstable.
pub(crate) fn assert_relaxed(board: &Board, relaxer: &str) {
    if !board.is_stable() {
        panic!(
            "{}",
            grainfall_concepts::format_error_message!(
                "unstable board after relaxation",
                format!(
                    "{} returned a board with {} unstable cells and maximum height {}",
                    relaxer,
                    board.n_unstable(),
                    board.max_height()
                )
            )
        );
    }
}
