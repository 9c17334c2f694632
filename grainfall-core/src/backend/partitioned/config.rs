use grainfall_concepts::SetupError;
use serde::{Deserialize, Serialize};

/// Determines which workers relax the bands of one round
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum Parallelizer {
    /// Spawns one named os-thread per band and round which reports back over a channel.
    #[default]
    OsThreads,
    /// Uses a dedicated [rayon::ThreadPool] which lives as long as the
    /// [Coordinator](super::Coordinator).
    Rayon,
}

impl core::str::FromStr for Parallelizer {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "os-threads" | "osthreads" | "threads" => Ok(Parallelizer::OsThreads),
            "rayon" => Ok(Parallelizer::Rayon),
            _ => Err(SetupError(format!(
                "unknown parallelizer \"{}\", expected one of os-threads, rayon",
                s
            ))),
        }
    }
}

impl core::fmt::Display for Parallelizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Parallelizer::OsThreads => write!(f, "os-threads"),
            Parallelizer::Rayon => write!(f, "rayon"),
        }
    }
}

/// Specify settings surrounding execution
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Upper bound for the number of bands and thus for the number of concurrent workers.
    /// Small boards may use fewer.
    pub n_threads: core::num::NonZeroUsize,
    /// See [Parallelizer]
    pub parallelizer: Parallelizer,
    /// Determines if a progress bar counting rounds should be shown
    pub show_progressbar: bool,
}

impl Settings {
    /// Checks that at least one worker was requested.
    ///
    /// ```
    /// # use grainfall_core::backend::partitioned::{Parallelizer, Settings};
    /// let settings = Settings::new(4, Parallelizer::Rayon)?;
    /// assert_eq!(settings.n_threads.get(), 4);
    /// assert!(Settings::new(0, Parallelizer::Rayon).is_err());
    /// # Ok::<(), grainfall_concepts::SetupError>(())
    /// ```
    pub fn new(n_threads: usize, parallelizer: Parallelizer) -> Result<Self, SetupError> {
        let n_threads = core::num::NonZeroUsize::new(n_threads)
            .ok_or(SetupError("number of workers must be at least 1".to_owned()))?;
        Ok(Self {
            n_threads,
            parallelizer,
            show_progressbar: false,
        })
    }

    /// Uses as many workers as [std::thread::available_parallelism] reports or a single one if
    /// this information is not available.
    pub fn from_available_parallelism(parallelizer: Parallelizer) -> Self {
        Self {
            n_threads: std::thread::available_parallelism()
                .unwrap_or(core::num::NonZeroUsize::MIN),
            parallelizer,
            show_progressbar: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_available_parallelism(Parallelizer::default())
    }
}
