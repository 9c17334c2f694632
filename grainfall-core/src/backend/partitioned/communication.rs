use crossbeam_channel::{bounded, SendError};
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::partition::SubBoard;
use super::worker::WorkerReport;
use crate::backend::RelaxationError;

/// Relaxes every sub-board on its own os-thread.
///
/// Threads are named `worker_thread_000`, `worker_thread_001`, ... and send their
/// [WorkerReport] to the calling thread over a [crossbeam_channel].
/// This function only returns after it received one report per sub-board and joined all
/// threads.
/// The reports are ordered by their partition index.
/// If a worker panics, the panic is resumed on the calling thread.
#[cfg_attr(feature = "tracing", instrument(skip_all))]
pub fn relax_on_os_threads(
    sub_boards: Vec<SubBoard>,
) -> Result<Vec<WorkerReport>, RelaxationError> {
    let n_workers = sub_boards.len();
    let (sender, receiver) = bounded::<WorkerReport>(n_workers);

    std::thread::scope(|scope| -> Result<Vec<WorkerReport>, RelaxationError> {
        let handles = sub_boards
            .into_iter()
            .map(|sub_board| {
                let sender = sender.clone();
                std::thread::Builder::new()
                    .name(format!("worker_thread_{:03.0}", sub_board.partition.index.0))
                    .spawn_scoped(scope, move || -> Result<(), SendError<WorkerReport>> {
                        sender.send(sub_board.relax())
                    })
            })
            .collect::<Result<Vec<_>, std::io::Error>>()?;
        // Only the workers hold senders from now on
        drop(sender);

        let received = (0..n_workers)
            .map(|_| receiver.recv())
            .collect::<Result<Vec<_>, _>>();

        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }

        let mut reports = received?;
        reports.sort_by_key(|report| report.partition.index);
        Ok(reports)
    })
}

/// Relaxes all sub-boards as tasks of the given pool.
///
/// The results keep the order of the sub-boards.
#[cfg_attr(feature = "tracing", instrument(skip_all))]
pub fn relax_on_thread_pool(
    pool: &rayon::ThreadPool,
    sub_boards: Vec<SubBoard>,
) -> Vec<WorkerReport> {
    pool.install(|| sub_boards.into_par_iter().map(SubBoard::relax).collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::partitioned::decompose_rows;
    use grainfall_concepts::Board;

    fn sub_boards(n_workers: usize) -> Vec<SubBoard> {
        let mut board = Board::square(12).unwrap();
        board.add_grains(6, 6, 300).unwrap();
        board.add_grains(2, 9, 17).unwrap();
        decompose_rows(12, core::num::NonZeroUsize::new(n_workers).unwrap())
            .unwrap()
            .into_iter()
            .map(|partition| SubBoard::from_global(&board, partition).unwrap())
            .collect()
    }

    #[test]
    fn os_threads_report_in_partition_order() -> Result<(), RelaxationError> {
        let reports = relax_on_os_threads(sub_boards(5))?;
        assert_eq!(reports.len(), 4);
        for (n, report) in reports.iter().enumerate() {
            assert_eq!(report.partition.index.0, n);
        }
        Ok(())
    }

    #[test]
    fn executors_agree() -> Result<(), RelaxationError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build()?;
        let from_threads = relax_on_os_threads(sub_boards(3))?;
        let from_pool = relax_on_thread_pool(&pool, sub_boards(3));
        assert_eq!(from_threads.len(), from_pool.len());
        for (r1, r2) in from_threads.iter().zip(from_pool.iter()) {
            assert_eq!(r1.partition, r2.partition);
            assert_eq!(r1.owned_rows, r2.owned_rows);
            assert_eq!(r1.halos, r2.halos);
            assert_eq!(r1.n_topples, r2.n_topples);
        }
        Ok(())
    }

    #[test]
    fn no_sub_boards() -> Result<(), RelaxationError> {
        assert!(relax_on_os_threads(Vec::new())?.is_empty());
        Ok(())
    }
}
