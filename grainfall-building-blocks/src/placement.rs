use grainfall_concepts::{Board, SetupError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of cells which receive grains when using [Placement::Random]
///
/// Cells may be picked multiple times.
pub const RANDOM_PICKS: usize = 100;

/// Determines where the initial pile of grains is placed
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum Placement {
    /// All grains are placed on the cell `(size/2, size/2)`.
    #[default]
    Central,
    /// [RANDOM_PICKS] uniformly chosen cells receive a random share of the grains which have
    /// not been placed yet.
    /// The last chosen cell additionally receives all remaining grains.
    Random,
}

impl core::str::FromStr for Placement {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "central" => Ok(Placement::Central),
            "random" => Ok(Placement::Random),
            _ => Err(SetupError(format!(
                "unknown placement \"{}\", expected one of central, random",
                s
            ))),
        }
    }
}

impl core::fmt::Display for Placement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Placement::Central => write!(f, "central"),
            Placement::Random => write!(f, "random"),
        }
    }
}

/// Creates a square board of the given size holding exactly `pile` grains.
///
/// ```
/// # use grainfall_building_blocks::{initial_board, Placement};
/// use rand::SeedableRng;
/// let mut rng = rand::rngs::SmallRng::seed_from_u64(3);
/// let board = initial_board(20, 5_000, Placement::Random, &mut rng)?;
/// assert_eq!(board.total_grains(), 5_000);
///
/// assert!(initial_board(0, 5_000, Placement::Central, &mut rng).is_err());
/// # Ok::<(), grainfall_concepts::SetupError>(())
/// ```
pub fn initial_board<R>(
    size: usize,
    pile: u64,
    placement: Placement,
    rng: &mut R,
) -> Result<Board, SetupError>
where
    R: Rng + ?Sized,
{
    if size == 0 {
        return Err(SetupError("board size must be at least 1".to_owned()));
    }
    let mut board = Board::square(size)?;
    match placement {
        Placement::Central => board
            .add_grains(size / 2, size / 2, pile)
            .map_err(|e| SetupError(e.0))?,
        Placement::Random => {
            let mut remain = pile;
            let mut last = (0, 0);
            for _ in 0..RANDOM_PICKS {
                last = (rng.gen_range(0..size), rng.gen_range(0..size));
                let grains = rng.gen_range(0..=remain);
                board
                    .add_grains(last.0, last.1, grains)
                    .map_err(|e| SetupError(e.0))?;
                remain -= grains;
            }
            board
                .add_grains(last.0, last.1, remain)
                .map_err(|e| SetupError(e.0))?;
        }
    }
    Ok(board)
}
