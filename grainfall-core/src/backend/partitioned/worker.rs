use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::partition::{Partition, SubBoard};

/// Grains which spilled over the boundary of a band during one round
///
/// They need to be added to `target_row` of the global board.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct HaloContribution {
    /// Row of the global board which receives the grains
    pub target_row: usize,
    /// Number of grains for every column
    pub grains: Array1<u64>,
}

/// Result of a worker after relaxing its [SubBoard] to a local fixpoint
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WorkerReport {
    /// The band which was relaxed
    pub partition: Partition,
    /// Relaxed rows owned by the band. None of them holds 4 or more grains.
    pub owned_rows: Array2<u64>,
    /// At most one contribution for the band above and one for the band below
    pub halos: Vec<HaloContribution>,
    /// Topple events performed by this worker
    pub n_topples: u64,
    /// Sweeps over the owned rows
    pub n_sweeps: u64,
    /// Grains which fell off the left, right or outer edges of the board
    pub grains_lost: u64,
}

impl SubBoard {
    /// Sweeps the owned rows until none of them holds 4 or more grains.
    ///
    /// Halo rows are excluded from the stability test and never topple.
    /// They may end up holding any number of grains which are then handed to the
    /// neighbouring band by the coordinator.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn relax(self) -> WorkerReport {
        let SubBoard {
            partition,
            mut board,
        } = self;
        let owned = partition.local_owned_rows();

        let initial_grains = board.total_grains();
        let mut n_topples = 0;
        let mut n_sweeps = 0;
        while !board.is_stable_rows(owned.clone()) {
            n_topples += board.sweep_rows(owned.clone());
            n_sweeps += 1;
        }
        let grains_lost = initial_grains - board.total_grains();

        let cells = board.into_array();
        let mut halos = Vec::with_capacity(2);
        if let Some(target_row) = partition.row_above() {
            halos.push(HaloContribution {
                target_row,
                grains: cells.row(0).to_owned(),
            });
        }
        if let Some(target_row) = partition.row_below() {
            halos.push(HaloContribution {
                target_row,
                grains: cells.row(cells.nrows() - 1).to_owned(),
            });
        }

        WorkerReport {
            partition,
            owned_rows: cells.slice(s![owned, ..]).to_owned(),
            halos,
            n_topples,
            n_sweeps,
            grains_lost,
        }
    }
}
