use grainfall_concepts::{errors::*, Board};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// Identifier of a row band
#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize)]
pub struct PartitionPlainIndex(pub usize);

/// Ownership record of a contiguous band of rows `[start, end)` of the global board.
///
/// Bands which border another band carry a halo row on that side.
/// The outer edges of the first and last band have no halo since grains leaving the board there
/// are lost anyway.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Position of the band counted from the top
    pub index: PartitionPlainIndex,
    /// First row owned by this band
    pub start: usize,
    /// One past the last row owned by this band
    pub end: usize,
    /// The band is not the first one and exchanges grains with the band above
    pub halo_above: bool,
    /// The band is not the last one and exchanges grains with the band below
    pub halo_below: bool,
}

impl Partition {
    /// Number of owned rows
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Every partition produced by [decompose_rows] owns at least one row.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Global row indices owned by this band
    pub fn rows(&self) -> core::ops::Range<usize> {
        self.start..self.end
    }

    /// Number of rows of the local sub-board including halos
    pub fn local_len(&self) -> usize {
        self.len() + self.halo_above as usize + self.halo_below as usize
    }

    /// Rows of the local sub-board which are owned by this band
    pub fn local_owned_rows(&self) -> core::ops::Range<usize> {
        let offset = self.halo_above as usize;
        offset..offset + self.len()
    }

    /// Global row which receives the grains collected in the upper halo
    pub fn row_above(&self) -> Option<usize> {
        match self.halo_above {
            true => self.start.checked_sub(1),
            false => None,
        }
    }

    /// Global row which receives the grains collected in the lower halo
    pub fn row_below(&self) -> Option<usize> {
        match self.halo_below {
            true => Some(self.end),
            false => None,
        }
    }
}

/// Splits `n_rows` into bands of `ceil(n_rows / n_workers)` rows.
///
/// The last band holds the remaining rows and may thus be shorter.
/// If the bands of this length already cover every row before all workers were served,
/// fewer bands are returned.
///
/// ```
/// # use grainfall_core::backend::partitioned::decompose_rows;
/// # use core::num::NonZeroUsize;
/// let partitions = decompose_rows(10, NonZeroUsize::new(4).unwrap())?;
/// let lengths: Vec<_> = partitions.iter().map(|p| p.len()).collect();
/// assert_eq!(lengths, vec![3, 3, 3, 1]);
///
/// // Only 5 bands of length 2 are needed
/// let partitions = decompose_rows(10, NonZeroUsize::new(7).unwrap())?;
/// assert_eq!(partitions.len(), 5);
/// # Ok::<(), grainfall_concepts::DecomposeError>(())
/// ```
pub fn decompose_rows(
    n_rows: usize,
    n_workers: core::num::NonZeroUsize,
) -> Result<Vec<Partition>, DecomposeError> {
    if n_rows == 0 {
        return Err(ShapeError("cannot decompose a board without rows".to_owned()).into());
    }
    let band_len = n_rows.div_ceil(n_workers.get());
    let starts: Vec<usize> = (0..n_rows).step_by(band_len).collect();
    let n_bands = starts.len();
    let partitions = starts
        .into_iter()
        .enumerate()
        .map(|(index, start)| Partition {
            index: PartitionPlainIndex(index),
            start,
            end: (start + band_len).min(n_rows),
            halo_above: index > 0,
            halo_below: index + 1 < n_bands,
        })
        .collect::<Vec<_>>();
    if partitions.len() > n_workers.get() {
        return Err(DecomposeError::Generic(grainfall_concepts::format_error_message!(
            "too many row bands",
            format!(
                "Created {} bands for {} workers and {} rows",
                partitions.len(),
                n_workers,
                n_rows
            )
        )));
    }
    Ok(partitions)
}

/// Private copy of a band of rows handed to exactly one worker
///
/// Consists of the owned rows of the global board and zeroed halo rows.
/// Halo rows never topple, they only collect grains for the neighbouring band.
#[derive(Clone, Debug)]
pub struct SubBoard {
    pub(crate) partition: Partition,
    pub(crate) board: Board,
}

impl SubBoard {
    /// Copies the owned rows of `partition` out of the global board.
    pub fn from_global(global: &Board, partition: Partition) -> Result<Self, ShapeError> {
        if partition.is_empty() || partition.end > global.n_rows() {
            return Err(ShapeError(format!(
                "partition with rows {:?} does not fit board with {} rows",
                partition.rows(),
                global.n_rows()
            )));
        }
        let mut cells = Array2::zeros((partition.local_len(), global.n_cols()));
        cells
            .slice_mut(s![partition.local_owned_rows(), ..])
            .assign(&global.rows(partition.rows()));
        Ok(Self {
            partition,
            board: Board::from_array(cells)?,
        })
    }

    /// The band this sub-board was created for
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// The local board including halo rows
    pub fn board(&self) -> &Board {
        &self.board
    }
}
