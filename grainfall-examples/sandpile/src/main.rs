use clap::{Args, Parser};
use grainfall::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Args, Debug)]
#[clap(next_help_heading = Some("Board"))]
struct BoardParameters {
    /// Number of rows and columns of the square board
    size: usize,
    /// Total number of grains placed on the board
    pile: u64,
    /// Either central or random
    placement: Placement,
    /// Seed for random placements. Drawn from the operating system if omitted.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Args, Debug)]
#[clap(next_help_heading = Some("Output"))]
struct OutputParameters {
    /// Folder which receives images and stored boards
    #[arg(short, long, default_value = "out/sandpile")]
    output: std::path::PathBuf,
    /// Side length of a single cell in pixels
    #[arg(long, default_value_t = 1)]
    cell_size: u32,
    /// Do not render the stable boards
    #[arg(long)]
    no_image: bool,
    /// Store boards and run information as json or ron. Can be given multiple times.
    #[arg(long)]
    storage: Vec<StorageOption>,
}

#[derive(Clone, Parser, Debug)]
#[command(version, about, long_about = None)]
struct Parameters {
    #[command(flatten)]
    board: BoardParameters,

    #[command(flatten)]
    output: OutputParameters,

    #[clap(help_heading = Some("Other"))]
    /// Number of workers. Defaults to the available parallelism.
    #[arg(short, long)]
    threads: Option<usize>,
    /// Either os-threads or rayon
    #[arg(long, default_value_t = Parallelizer::OsThreads)]
    parallelizer: Parallelizer,
    /// Print debug information for every round
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct RunInformation {
    size: usize,
    pile: u64,
    placement: Placement,
    seed: u64,
    settings: Settings,
    serial: RelaxationReport,
    partitioned: RelaxationReport,
    serial_seconds: f64,
    partitioned_seconds: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let parameters = Parameters::parse();
    let level = match parameters.verbose {
        true => tracing::Level::DEBUG,
        false => tracing::Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    run(parameters)
}

fn run(parameters: Parameters) -> Result<(), Box<dyn std::error::Error>> {
    let Parameters {
        board:
            BoardParameters {
                size,
                pile,
                placement,
                seed,
            },
        output:
            OutputParameters {
                output,
                cell_size,
                no_image,
                storage,
            },
        threads,
        parallelizer,
        verbose,
    } = parameters;

    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let initial = initial_board(size, pile, placement, &mut rng)?;
    tracing::info!(size, pile, %placement, seed, "initialized board");

    let mut settings = match threads {
        Some(n_threads) => Settings::new(n_threads, parallelizer)?,
        None => Settings::from_available_parallelism(parallelizer),
    };
    settings.show_progressbar = !verbose;

    let start = std::time::Instant::now();
    let mut serial = initial.clone();
    let serial_report = SweepRelaxer.relax(&mut serial)?;
    let serial_seconds = start.elapsed().as_secs_f64();
    tracing::info!(
        n_topples = serial_report.n_topples,
        sweeps = serial_report.n_iterations,
        seconds = serial_seconds,
        "serial relaxation finished"
    );

    let start = std::time::Instant::now();
    let (partitioned, partitioned_report) =
        Coordinator::new(initial.clone(), settings.clone())?.run()?;
    let partitioned_seconds = start.elapsed().as_secs_f64();
    tracing::info!(
        n_threads = settings.n_threads.get(),
        %parallelizer,
        n_topples = partitioned_report.n_topples,
        rounds = partitioned_report.n_iterations,
        seconds = partitioned_seconds,
        "partitioned relaxation finished"
    );

    if serial != partitioned {
        return Err(format!(
            "serial and partitioned relaxation disagree in {} cells",
            serial
                .as_array()
                .iter()
                .zip(partitioned.as_array().iter())
                .filter(|(h1, h2)| h1 != h2)
                .count()
        )
        .into());
    }
    tracing::info!(
        grains_left = serial.total_grains(),
        grains_lost = serial_report.grains_lost,
        "serial and partitioned boards agree"
    );

    if !no_image {
        std::fs::create_dir_all(&output)?;
        draw_board_png(&serial, output.join("serial.png"), cell_size)?;
        draw_board_png(&partitioned, output.join("partitioned.png"), cell_size)?;
        tracing::info!(output = %output.display(), "saved images");
    }

    if !storage.is_empty() {
        let builder = StorageBuilder::new()
            .location(output.clone())
            .priority(storage)
            .init();
        let manager = StorageManager::open_or_create(builder)?;
        manager.store_board("initial", &initial)?;
        manager.store_board("serial", &serial)?;
        manager.store_board("partitioned", &partitioned)?;
        manager.store_metadata(&RunInformation {
            size,
            pile,
            placement,
            seed,
            settings,
            serial: serial_report,
            partitioned: partitioned_report,
            serial_seconds,
            partitioned_seconds,
        })?;
        tracing::info!(
            location = %manager.extract_builder().get_full_path().display(),
            "stored boards"
        );
    }
    Ok(())
}
