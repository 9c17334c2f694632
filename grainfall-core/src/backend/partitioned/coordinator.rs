use grainfall_concepts::{Board, IndexError, ShapeError, TOPPLE_THRESHOLD};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::communication::{relax_on_os_threads, relax_on_thread_pool};
use super::config::{Parallelizer, Settings};
use super::partition::{decompose_rows, SubBoard};
use super::worker::WorkerReport;
use crate::backend::{Relax, RelaxationError, RelaxationReport};
use crate::progress::RoundCounter;

enum Executor {
    OsThreads,
    Rayon(rayon::ThreadPool),
}

/// Information about a single finished round
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    /// Counted from 1
    pub round: u64,
    /// Number of bands which were relaxed concurrently
    pub n_workers: usize,
    /// Topple events of all workers in this round
    pub n_topples: u64,
    /// Grains which fell off the board in this round
    pub grains_lost: u64,
    /// Cells holding 4 or more grains after merging
    pub n_unstable: usize,
}

/// Owns the global board and drives the rounds of the partitioned relaxation
///
/// Every round consists of the following steps
/// 1. Split the board into row bands and copy them into [SubBoard]s.
/// 2. Relax all sub-boards concurrently and wait for every [WorkerReport].
/// 3. Write the owned rows back into a zeroed board and add all halo contributions.
/// 4. Check that no grains appeared or vanished.
///
/// Rounds are repeated until the board is stable.
///
/// ```
/// # use grainfall_concepts::Board;
/// # use grainfall_core::backend::partitioned::{Coordinator, Parallelizer, Settings};
/// let mut board = Board::square(21)?;
/// board.add_grains(10, 10, 500)?;
/// let settings = Settings::new(3, Parallelizer::Rayon)?;
/// let (board, report) = Coordinator::new(board, settings)?.run()?;
/// assert!(board.is_stable());
/// assert_eq!(board.total_grains() + report.grains_lost, 500);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Coordinator {
    board: Board,
    settings: Settings,
    executor: Executor,
    report: RelaxationReport,
}

impl Coordinator {
    /// Takes ownership of the initial board.
    ///
    /// When [Parallelizer::Rayon] is chosen, the thread pool is built here and reused in every
    /// round.
    pub fn new(board: Board, settings: Settings) -> Result<Self, RelaxationError> {
        let executor = match settings.parallelizer {
            Parallelizer::OsThreads => Executor::OsThreads,
            Parallelizer::Rayon => Executor::Rayon(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(settings.n_threads.get())
                    .thread_name(|n| format!("worker_thread_{:03.0}", n))
                    .build()?,
            ),
        };
        Ok(Self {
            board,
            settings,
            executor,
            report: RelaxationReport::default(),
        })
    }

    /// Current state of the global board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Accumulated results of all rounds performed so far
    pub fn report(&self) -> RelaxationReport {
        self.report
    }

    /// Performs one round.
    ///
    /// Calling this on a stable board performs no topples but still counts as a round.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn run_round(&mut self) -> Result<RoundSummary, RelaxationError> {
        let partitions = decompose_rows(self.board.n_rows(), self.settings.n_threads)?;
        let sub_boards = partitions
            .into_iter()
            .map(|partition| SubBoard::from_global(&self.board, partition))
            .collect::<Result<Vec<_>, _>>()?;
        let n_workers = sub_boards.len();

        let reports = match &self.executor {
            Executor::OsThreads => relax_on_os_threads(sub_boards)?,
            Executor::Rayon(pool) => relax_on_thread_pool(pool, sub_boards),
        };

        let merged = merge(self.board.shape(), self.board.total_grains(), &reports)?;
        let n_topples: u64 = reports.iter().map(|report| report.n_topples).sum();
        let grains_lost: u64 = reports.iter().map(|report| report.grains_lost).sum();
        self.board = merged;

        self.report.n_iterations += 1;
        self.report.n_topples += n_topples;
        self.report.grains_lost += grains_lost;
        let summary = RoundSummary {
            round: self.report.n_iterations,
            n_workers,
            n_topples,
            grains_lost,
            n_unstable: self.board.n_unstable(),
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            round = summary.round,
            n_workers = summary.n_workers,
            n_topples = summary.n_topples,
            grains_lost = summary.grains_lost,
            n_unstable = summary.n_unstable,
            "merged round"
        );
        Ok(summary)
    }

    /// Performs rounds until the board is stable and returns it together with the accumulated
    /// report.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn run(mut self) -> Result<(Board, RelaxationReport), RelaxationError> {
        let mut counter = RoundCounter::new(self.settings.show_progressbar)?;
        while !self.board.is_stable() {
            let summary = self.run_round()?;
            counter.update(summary.n_unstable)?;
        }
        counter.finish()?;
        Ok((self.board, self.report))
    }
}

/// Writes all owned rows into a zeroed board and adds the halo contributions on top.
///
/// Malformed reports are returned as errors.
/// Panics if a worker handed back an unstable owned row or if the merged board does not hold
/// `grains_before` minus the grains the workers lost at the edges.
fn merge(
    shape: (usize, usize),
    grains_before: u64,
    reports: &[WorkerReport],
) -> Result<Board, RelaxationError> {
    let (n_rows, n_cols) = shape;
    let mut cells = Array2::<u64>::zeros(shape);

    let mut n_written = 0;
    for report in reports {
        let rows = report.partition.rows();
        if rows.end > n_rows || report.owned_rows.dim() != (rows.len(), n_cols) {
            return Err(ShapeError(format!(
                "report of band {} with rows {:?} and shape {:?} does not fit board of shape {:?}",
                report.partition.index.0,
                rows,
                report.owned_rows.dim(),
                shape
            ))
            .into());
        }
        if let Some(height) = report
            .owned_rows
            .iter()
            .copied()
            .find(|&height| height >= TOPPLE_THRESHOLD)
        {
            panic!(
                "{}",
                grainfall_concepts::format_error_message!(
                    "worker returned unstable rows",
                    format!(
                        "band {} with rows {:?} holds a cell of height {}",
                        report.partition.index.0, rows, height
                    )
                )
            );
        }
        n_written += rows.len();
        cells.slice_mut(s![rows, ..]).assign(&report.owned_rows);
    }
    if n_written != n_rows {
        return Err(IndexError(format!(
            "reports covered {} rows of a board with {} rows",
            n_written, n_rows
        ))
        .into());
    }

    for halo in reports.iter().flat_map(|report| report.halos.iter()) {
        if halo.target_row >= n_rows {
            return Err(IndexError(format!(
                "halo targets row {} of a board with {} rows",
                halo.target_row, n_rows
            ))
            .into());
        }
        if halo.grains.len() != n_cols {
            return Err(ShapeError(format!(
                "halo of length {} does not fit board with {} columns",
                halo.grains.len(),
                n_cols
            ))
            .into());
        }
        let mut target = cells.row_mut(halo.target_row);
        target += &halo.grains;
    }

    let grains_lost: u64 = reports.iter().map(|report| report.grains_lost).sum();
    let grains_after = cells.sum();
    if grains_after + grains_lost != grains_before {
        panic!(
            "{}",
            grainfall_concepts::format_error_message!(
                "grains not conserved during merge",
                format!(
                    "round started with {} grains, ended with {} and lost {} at the edges",
                    grains_before, grains_after, grains_lost
                )
            )
        );
    }
    Ok(Board::from_array(cells)?)
}

/// Relaxes a board with `n_workers` os-threads and returns the stable result.
///
/// ```
/// # use grainfall_concepts::Board;
/// let mut board = Board::square(9)?;
/// board.add_grains(4, 4, 64)?;
/// let stable = grainfall_core::backend::partitioned::run(board, 2)?;
/// assert!(stable.is_stable());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run(initial: Board, n_workers: usize) -> Result<Board, RelaxationError> {
    let settings = Settings::new(n_workers, Parallelizer::OsThreads)?;
    let (board, _) = Coordinator::new(initial, settings)?.run()?;
    Ok(board)
}

/// [Relax] implementation which runs a [Coordinator] with the given [Settings]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct PartitionedRelaxer {
    /// Determines the number of workers and how they are executed
    pub settings: Settings,
}

impl Relax for PartitionedRelaxer {
    fn relax(&self, board: &mut Board) -> Result<RelaxationReport, RelaxationError> {
        let coordinator = Coordinator::new(board.clone(), self.settings.clone())?;
        let (relaxed, report) = coordinator.run()?;
        *board = relaxed;
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::partitioned::{HaloContribution, Partition, PartitionPlainIndex};
    use crate::backend::serial::SweepRelaxer;

    fn central_board(size: usize, pile: u64) -> Board {
        let mut board = Board::square(size).unwrap();
        board.add_grains(size / 2, size / 2, pile).unwrap();
        board
    }

    fn relaxers(n_threads: usize) -> [PartitionedRelaxer; 2] {
        [Parallelizer::OsThreads, Parallelizer::Rayon].map(|parallelizer| PartitionedRelaxer {
            settings: Settings::new(n_threads, parallelizer).unwrap(),
        })
    }

    #[test]
    fn matches_serial_for_all_worker_counts() -> Result<(), RelaxationError> {
        let initial = central_board(31, 2_000);
        let mut serial = initial.clone();
        let serial_report = SweepRelaxer.relax(&mut serial)?;
        for n_threads in [1, 2, 4, 7] {
            for relaxer in relaxers(n_threads) {
                let mut board = initial.clone();
                let report = relaxer.relax(&mut board)?;
                assert_eq!(board, serial);
                assert_eq!(report.n_topples, serial_report.n_topples);
                assert_eq!(report.grains_lost, serial_report.grains_lost);
            }
        }
        Ok(())
    }

    #[test]
    fn grains_lost_at_edges_match_serial() -> Result<(), RelaxationError> {
        let initial = central_board(7, 5_000);
        let mut serial = initial.clone();
        let serial_report = SweepRelaxer.relax(&mut serial)?;
        assert!(serial_report.grains_lost > 0);
        for relaxer in relaxers(3) {
            let mut board = initial.clone();
            let report = relaxer.relax(&mut board)?;
            assert_eq!(board, serial);
            assert_eq!(report.grains_lost, serial_report.grains_lost);
        }
        Ok(())
    }

    #[test]
    fn stable_board_needs_no_round() -> Result<(), RelaxationError> {
        let board = Board::from_rows(vec![vec![3, 0, 3], vec![1, 2, 3]])?;
        let settings = Settings::new(2, Parallelizer::OsThreads)?;
        let (relaxed, report) = Coordinator::new(board.clone(), settings)?.run()?;
        assert_eq!(relaxed, board);
        assert_eq!(report, RelaxationReport::default());
        Ok(())
    }

    #[test]
    fn rounds_are_counted() -> Result<(), RelaxationError> {
        let mut coordinator = Coordinator::new(
            central_board(16, 256),
            Settings::new(4, Parallelizer::OsThreads)?,
        )?;
        let first = coordinator.run_round()?;
        assert_eq!(first.round, 1);
        assert_eq!(first.n_workers, 4);
        let mut n_rounds = 1u64;
        while !coordinator.board().is_stable() {
            coordinator.run_round()?;
            n_rounds += 1;
        }
        assert_eq!(coordinator.report().n_iterations, n_rounds);
        Ok(())
    }

    #[test]
    fn more_workers_than_rows() -> Result<(), RelaxationError> {
        let mut initial = Board::new(3, 40)?;
        initial.add_grains(1, 20, 400)?;
        let mut serial = initial.clone();
        SweepRelaxer.relax(&mut serial)?;
        assert_eq!(run(initial, 16)?, serial);
        Ok(())
    }

    #[test]
    fn zero_workers_rejected() {
        let result = run(central_board(5, 10), 0);
        assert!(matches!(result, Err(RelaxationError::SetupError(_))));
    }

    #[test]
    fn merge_sums_both_halos_into_shared_row() -> Result<(), RelaxationError> {
        let partition = |index, start, end, halo_above, halo_below| Partition {
            index: PartitionPlainIndex(index),
            start,
            end,
            halo_above,
            halo_below,
        };
        let reports = vec![
            WorkerReport {
                partition: partition(0, 0, 1, false, true),
                owned_rows: ndarray::array![[1u64, 0]],
                halos: vec![HaloContribution {
                    target_row: 1,
                    grains: ndarray::array![2u64, 1],
                }],
                n_topples: 0,
                n_sweeps: 0,
                grains_lost: 0,
            },
            WorkerReport {
                partition: partition(1, 1, 2, true, true),
                owned_rows: ndarray::array![[3u64, 3]],
                halos: vec![],
                n_topples: 0,
                n_sweeps: 0,
                grains_lost: 0,
            },
            WorkerReport {
                partition: partition(2, 2, 3, true, false),
                owned_rows: ndarray::array![[0u64, 2]],
                halos: vec![HaloContribution {
                    target_row: 1,
                    grains: ndarray::array![1u64, 4],
                }],
                n_topples: 0,
                n_sweeps: 0,
                grains_lost: 0,
            },
        ];
        let merged = merge((3, 2), 17, &reports)?;
        assert_eq!(merged.into_rows(), vec![vec![1, 0], vec![6, 8], vec![0, 2]]);
        Ok(())
    }

    #[test]
    fn merge_rejects_missing_rows() {
        let reports = vec![WorkerReport {
            partition: Partition {
                index: PartitionPlainIndex(0),
                start: 0,
                end: 1,
                halo_above: false,
                halo_below: true,
            },
            owned_rows: ndarray::array![[0u64, 0]],
            halos: vec![],
            n_topples: 0,
            n_sweeps: 0,
            grains_lost: 0,
        }];
        assert!(matches!(
            merge((2, 2), 0, &reports),
            Err(RelaxationError::IndexError(_))
        ));
    }

    fn single_band_report(owned_rows: Array2<u64>, grains_lost: u64) -> WorkerReport {
        WorkerReport {
            partition: Partition {
                index: PartitionPlainIndex(0),
                start: 0,
                end: owned_rows.nrows(),
                halo_above: false,
                halo_below: false,
            },
            owned_rows,
            halos: vec![],
            n_topples: 0,
            n_sweeps: 0,
            grains_lost,
        }
    }

    #[test]
    #[should_panic(expected = "holds a cell of height 9")]
    fn merge_panics_on_unstable_owned_rows() {
        let reports = vec![single_band_report(ndarray::array![[9u64, 0]], 0)];
        let _ = merge((1, 2), 9, &reports);
    }

    #[test]
    #[should_panic(expected = "holds a cell of height 4")]
    fn merge_panics_on_owned_row_at_threshold() {
        let reports = vec![single_band_report(ndarray::array![[3u64, 4]], 0)];
        let _ = merge((1, 2), 7, &reports);
    }

    #[test]
    #[should_panic(expected = "round started with 10 grains, ended with 5 and lost 2")]
    fn merge_panics_when_grains_vanish() {
        let reports = vec![single_band_report(ndarray::array![[2u64, 3]], 2)];
        let _ = merge((1, 2), 10, &reports);
    }

    #[test]
    fn merge_accounts_for_lost_grains() -> Result<(), RelaxationError> {
        let reports = vec![single_band_report(ndarray::array![[2u64, 3]], 5)];
        let merged = merge((1, 2), 10, &reports)?;
        assert_eq!(merged.total_grains(), 5);
        Ok(())
    }
}
