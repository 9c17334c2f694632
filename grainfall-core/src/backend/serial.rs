use std::collections::VecDeque;

use grainfall_concepts::{Board, TOPPLE_THRESHOLD};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{assert_relaxed, Relax, RelaxationError, RelaxationReport};

/// Sweeps over the whole board in row-major order until it is stable.
///
/// This is the reference implementation.
/// It is simple and slow on purpose.
///
/// ```
/// # use grainfall_concepts::Board;
/// # use grainfall_core::backend::{Relax, serial::SweepRelaxer};
/// let mut board = Board::square(5)?;
/// board.add_grains(2, 2, 16)?;
/// let report = SweepRelaxer.relax(&mut board)?;
/// assert!(board.is_stable());
/// assert_eq!(report.grains_lost, 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct SweepRelaxer;

impl Relax for SweepRelaxer {
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    fn relax(&self, board: &mut Board) -> Result<RelaxationReport, RelaxationError> {
        let initial_grains = board.total_grains();
        let mut report = RelaxationReport::default();
        while !board.is_stable() {
            report.n_topples += board.sweep();
            report.n_iterations += 1;
        }
        report.grains_lost = initial_grains - board.total_grains();
        Ok(report)
    }
}

/// Only revisits cells which received grains since they were last checked.
///
/// Cells are kept in a first-in first-out queue.
/// Initially all unstable cells are queued and every neighbour which becomes unstable by
/// receiving grains is appended unless it is already waiting.
/// `n_iterations` of the returned report counts how many cells were taken from the queue.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct WorklistRelaxer;

impl Relax for WorklistRelaxer {
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    fn relax(&self, board: &mut Board) -> Result<RelaxationReport, RelaxationError> {
        let initial_grains = board.total_grains();
        let mut report = RelaxationReport::default();

        let mut queued = Array2::from_elem(board.shape(), false);
        let mut queue: VecDeque<(usize, usize)> = board
            .as_array()
            .indexed_iter()
            .filter(|(_, &height)| height >= TOPPLE_THRESHOLD)
            .map(|(index, _)| index)
            .collect();
        for &(i, j) in queue.iter() {
            queued[[i, j]] = true;
        }

        while let Some((i, j)) = queue.pop_front() {
            queued[[i, j]] = false;
            report.n_iterations += 1;
            let n_topples = board.topple(i, j);
            if n_topples == 0 {
                continue;
            }
            report.n_topples += n_topples;
            for (k, l) in board.neighbors(i, j) {
                if !queued[[k, l]] && board.get(k, l).unwrap_or(0) >= TOPPLE_THRESHOLD {
                    queued[[k, l]] = true;
                    queue.push_back((k, l));
                }
            }
        }

        report.grains_lost = initial_grains - board.total_grains();
        assert_relaxed(board, "WorklistRelaxer");
        Ok(report)
    }
}
