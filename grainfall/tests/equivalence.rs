use grainfall::prelude::*;
use rand::SeedableRng;

fn relax_serial(initial: &Board) -> Result<(Board, RelaxationReport), RelaxationError> {
    let mut board = initial.clone();
    let report = SweepRelaxer.relax(&mut board)?;
    Ok((board, report))
}

fn relax_partitioned(
    initial: &Board,
    n_threads: usize,
    parallelizer: Parallelizer,
) -> Result<(Board, RelaxationReport), RelaxationError> {
    let settings = Settings::new(n_threads, parallelizer)?;
    Coordinator::new(initial.clone(), settings)?.run()
}

fn compare_engines(
    size: usize,
    pile: u64,
    placement: Placement,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    let initial = initial_board(size, pile, placement, &mut rng)?;
    let (serial, serial_report) = relax_serial(&initial)?;
    assert!(serial.is_stable());
    assert!(serial.total_grains() <= pile);

    for n_threads in [1, 2, 4, 7] {
        for parallelizer in [Parallelizer::OsThreads, Parallelizer::Rayon] {
            let (partitioned, report) = relax_partitioned(&initial, n_threads, parallelizer)?;
            assert!(partitioned.is_stable());
            assert_eq!(
                serial, partitioned,
                "size={size} pile={pile} placement={placement} n_threads={n_threads} \
                parallelizer={parallelizer}"
            );
            assert_eq!(report.n_topples, serial_report.n_topples);
            assert_eq!(report.grains_lost, serial_report.grains_lost);
        }
    }
    Ok(())
}

#[test]
fn central_100_10000() -> Result<(), Box<dyn std::error::Error>> {
    compare_engines(100, 10_000, Placement::Central, 0)
}

#[test]
fn random_100_10000() -> Result<(), Box<dyn std::error::Error>> {
    compare_engines(100, 10_000, Placement::Random, 1)
}

#[test]
fn central_41_100000() -> Result<(), Box<dyn std::error::Error>> {
    compare_engines(41, 100_000, Placement::Central, 2)
}

#[test]
fn random_41_100000() -> Result<(), Box<dyn std::error::Error>> {
    compare_engines(41, 100_000, Placement::Random, 3)
}

#[test]
fn central_53_large_pile() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(debug_assertions)]
    let pile = 20_000;
    #[cfg(not(debug_assertions))]
    let pile = 1_088_000;
    compare_engines(53, pile, Placement::Central, 4)
}

#[test]
fn random_200_23413() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(debug_assertions)]
    let size = 60;
    #[cfg(not(debug_assertions))]
    let size = 200;
    compare_engines(size, 23_413, Placement::Random, 6)
}

#[test]
fn sizes_not_divisible_by_workers() -> Result<(), Box<dyn std::error::Error>> {
    for size in [1, 2, 3, 5, 13, 29] {
        compare_engines(size, 300, Placement::Random, size as u64)?;
    }
    Ok(())
}

#[test]
fn worklist_relaxer_agrees() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(11);
    let initial = initial_board(64, 20_000, Placement::Random, &mut rng)?;
    let (serial, serial_report) = relax_serial(&initial)?;
    let mut worklist = initial.clone();
    let report = WorklistRelaxer.relax(&mut worklist)?;
    assert_eq!(serial, worklist);
    assert_eq!(report.n_topples, serial_report.n_topples);
    Ok(())
}

#[test]
fn free_run_function() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
    let initial = initial_board(25, 2_500, Placement::Central, &mut rng)?;
    let (serial, _) = relax_serial(&initial)?;
    let stable = grainfall::core::backend::partitioned::run(initial, 3)?;
    assert_eq!(serial, stable);
    Ok(())
}
