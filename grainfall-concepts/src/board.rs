use ndarray::{s, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, ShapeError};

/// A cell holding at least this many grains is unstable and will topple.
pub const TOPPLE_THRESHOLD: u64 = 4;

/// Returns the Von Neumann neighbours of `(i, j)` which lie inside a grid of the given shape.
///
/// Neighbours are returned in the order above, below, left, right.
/// Indices outside of the grid are dropped which is the reason why grains are lost at the edges.
///
/// ```
/// # use grainfall_concepts::von_neumann_neighbors;
/// let neighbors: Vec<_> = von_neumann_neighbors((3, 3), 0, 1).collect();
/// assert_eq!(neighbors, vec![(1, 1), (0, 0), (0, 2)]);
/// ```
pub fn von_neumann_neighbors(
    shape: (usize, usize),
    i: usize,
    j: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let (n_rows, n_cols) = shape;
    [
        (i.checked_sub(1), Some(j)),
        (i.checked_add(1), Some(j)),
        (Some(i), j.checked_sub(1)),
        (Some(i), j.checked_add(1)),
    ]
    .into_iter()
    .filter_map(move |index| match index {
        (Some(k), Some(l)) if k < n_rows && l < n_cols => Some((k, l)),
        _ => None,
    })
}

/// Rectangular grid of pile heights
///
/// The [Board] is the only state of a sandpile run.
/// It is created once per run, relaxed by one of the relaxers and handed to rendering or
/// storage afterwards.
/// Every board has at least one row and one column.
///
/// ```
/// # use grainfall_concepts::Board;
/// let mut board = Board::square(3)?;
/// board.add_grains(1, 1, 4)?;
/// assert!(!board.is_stable());
///
/// let n_topples = board.topple(1, 1);
/// assert_eq!(n_topples, 1);
/// assert_eq!(board.get(0, 1), Some(1));
/// assert_eq!(board.get(1, 1), Some(0));
/// assert!(board.is_stable());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Board {
    cells: Array2<u64>,
}

impl Board {
    /// Zero-filled board with the given number of rows and columns
    pub fn new(n_rows: usize, n_cols: usize) -> Result<Self, ShapeError> {
        Self::from_array(Array2::zeros((n_rows, n_cols)))
    }

    /// Zero-filled board of size `size x size`
    pub fn square(size: usize) -> Result<Self, ShapeError> {
        Self::new(size, size)
    }

    /// Wraps an existing array. Fails if it has no rows or no columns.
    pub fn from_array(cells: Array2<u64>) -> Result<Self, ShapeError> {
        let (n_rows, n_cols) = cells.dim();
        if n_rows == 0 || n_cols == 0 {
            return Err(ShapeError(format!(
                "board must have at least one row and one column but has shape {}x{}",
                n_rows, n_cols
            )));
        }
        Ok(Self { cells })
    }

    /// Construct a board from a list of rows which all need to have the same length.
    ///
    /// ```
    /// # use grainfall_concepts::Board;
    /// let res = Board::from_rows(vec![vec![1, 2], vec![3]]);
    /// assert!(res.is_err());
    /// ```
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, ShapeError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |row| row.len());
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n_cols) {
            return Err(ShapeError(format!(
                "row {} has length {} but expected {}",
                index,
                row.len(),
                n_cols
            )));
        }
        let cells = Array2::from_shape_vec((n_rows, n_cols), rows.into_iter().flatten().collect())?;
        Self::from_array(cells)
    }

    /// Returns the contents row by row.
    pub fn into_rows(self) -> Vec<Vec<u64>> {
        self.cells.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.cells.ncols()
    }

    /// `(n_rows, n_cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Checks if the index lies inside of the board.
    pub fn contains(&self, i: usize, j: usize) -> bool {
        i < self.n_rows() && j < self.n_cols()
    }

    /// Height of the pile at `(i, j)` or `None` when out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<u64> {
        self.cells.get([i, j]).copied()
    }

    /// Puts additional grains on the cell at `(i, j)`.
    pub fn add_grains(&mut self, i: usize, j: usize, grains: u64) -> Result<(), IndexError> {
        let shape = self.shape();
        match self.cells.get_mut([i, j]) {
            Some(height) => {
                *height += grains;
                Ok(())
            }
            None => Err(IndexError(format!(
                "index ({}, {}) is out of bounds for board of shape {:?}",
                i, j, shape
            ))),
        }
    }

    /// In-bounds Von Neumann neighbours of `(i, j)`. See [von_neumann_neighbors].
    pub fn neighbors(&self, i: usize, j: usize) -> impl Iterator<Item = (usize, usize)> {
        von_neumann_neighbors(self.shape(), i, j)
    }

    /// Topples the cell at `(i, j)` until it holds less than [TOPPLE_THRESHOLD] grains.
    ///
    /// Every topple event removes 4 grains from the cell and gives one grain to each neighbour
    /// inside of the board. Grains for neighbours outside of the board are lost.
    /// All topple events of the cell are carried out at once.
    /// Returns the number of topple events which is zero if the cell was already stable.
    ///
    /// # Panics
    /// If `(i, j)` is out of bounds.
    pub fn topple(&mut self, i: usize, j: usize) -> u64 {
        let n_topples = self.cells[[i, j]] / TOPPLE_THRESHOLD;
        if n_topples == 0 {
            return 0;
        }
        self.cells[[i, j]] -= TOPPLE_THRESHOLD * n_topples;
        for (k, l) in von_neumann_neighbors(self.shape(), i, j) {
            self.cells[[k, l]] += n_topples;
        }
        n_topples
    }

    /// Topples every cell of the board once in row-major order.
    pub fn sweep(&mut self) -> u64 {
        self.sweep_rows(0..self.n_rows())
    }

    /// Topples every cell within the given rows once in row-major order.
    pub fn sweep_rows(&mut self, rows: core::ops::Range<usize>) -> u64 {
        let n_cols = self.n_cols();
        let mut n_topples = 0;
        for i in rows {
            for j in 0..n_cols {
                n_topples += self.topple(i, j);
            }
        }
        n_topples
    }

    /// True if no cell holds [TOPPLE_THRESHOLD] or more grains.
    pub fn is_stable(&self) -> bool {
        self.cells.iter().all(|&height| height < TOPPLE_THRESHOLD)
    }

    /// Similar to [Board::is_stable] but only checks the given rows.
    pub fn is_stable_rows(&self, rows: core::ops::Range<usize>) -> bool {
        self.cells
            .slice(s![rows, ..])
            .iter()
            .all(|&height| height < TOPPLE_THRESHOLD)
    }

    /// Number of cells which would topple
    pub fn n_unstable(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&height| height >= TOPPLE_THRESHOLD)
            .count()
    }

    /// Sum of all grains on the board
    pub fn total_grains(&self) -> u64 {
        self.cells.sum()
    }

    /// Height of the largest pile
    pub fn max_height(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// View of a single row
    pub fn row(&self, i: usize) -> ArrayView1<'_, u64> {
        self.cells.row(i)
    }

    /// View of a contiguous range of rows
    pub fn rows(&self, rows: core::ops::Range<usize>) -> ArrayView2<'_, u64> {
        self.cells.slice(s![rows, ..])
    }

    /// Access the underlying array.
    pub fn as_array(&self) -> &Array2<u64> {
        &self.cells
    }

    /// Consumes the board and returns the underlying array.
    pub fn into_array(self) -> Array2<u64> {
        self.cells
    }
}

impl core::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.outer_iter() {
            let line = row
                .iter()
                .map(|height| height.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_board_is_rejected() {
        assert!(Board::new(0, 3).is_err());
        assert!(Board::new(3, 0).is_err());
        assert!(Board::from_rows(vec![]).is_err());
    }

    #[test]
    fn from_rows_roundtrip() -> Result<(), ShapeError> {
        let rows = vec![vec![0, 1, 2], vec![3, 4, 5]];
        let board = Board::from_rows(rows.clone())?;
        assert_eq!(board.shape(), (2, 3));
        assert_eq!(board.get(1, 1), Some(4));
        assert_eq!(board.into_rows(), rows);
        Ok(())
    }

    #[test]
    fn add_grains_out_of_bounds() -> Result<(), ShapeError> {
        let mut board = Board::square(2)?;
        assert!(board.add_grains(2, 0, 1).is_err());
        assert!(board.add_grains(1, 1, 7).is_ok());
        assert_eq!(board.total_grains(), 7);
        Ok(())
    }

    #[test]
    fn neighbors_at_corner() {
        let neighbors: Vec<_> = von_neumann_neighbors((4, 5), 3, 4).collect();
        assert_eq!(neighbors, vec![(2, 4), (3, 3)]);
        let neighbors: Vec<_> = von_neumann_neighbors((1, 1), 0, 0).collect();
        assert!(neighbors.is_empty());
    }

    #[test]
    fn topple_interior_conserves_grains() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = Board::square(5)?;
        board.add_grains(2, 2, 9)?;
        let n_topples = board.topple(2, 2);
        assert_eq!(n_topples, 2);
        assert_eq!(board.get(2, 2), Some(1));
        for (i, j) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(board.get(i, j), Some(2));
        }
        assert_eq!(board.total_grains(), 9);
        Ok(())
    }

    #[test]
    fn topple_corner_loses_grains() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = Board::square(3)?;
        board.add_grains(0, 0, 4)?;
        board.topple(0, 0);
        assert_eq!(board.total_grains(), 2);
        assert_eq!(board.get(0, 1), Some(1));
        assert_eq!(board.get(1, 0), Some(1));
        Ok(())
    }

    #[test]
    fn topple_stable_cell_is_noop() -> Result<(), Box<dyn std::error::Error>> {
        let mut board = Board::from_rows(vec![vec![3, 2], vec![1, 0]])?;
        let before = board.clone();
        assert_eq!(board.topple(0, 0), 0);
        assert_eq!(board.sweep(), 0);
        assert_eq!(board, before);
        assert!(board.is_stable());
        assert!(board.is_stable());
        Ok(())
    }

    #[test]
    fn stability_of_row_ranges() -> Result<(), ShapeError> {
        let board = Board::from_rows(vec![vec![0, 0], vec![5, 0], vec![1, 3]])?;
        assert!(!board.is_stable());
        assert!(board.is_stable_rows(0..1));
        assert!(!board.is_stable_rows(0..2));
        assert!(board.is_stable_rows(2..3));
        assert_eq!(board.n_unstable(), 1);
        assert_eq!(board.max_height(), 5);
        Ok(())
    }

    #[test]
    fn random_sweeps_never_create_grains() -> Result<(), Box<dyn std::error::Error>> {
        use rand::{Rng, SeedableRng};
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let mut board = Board::new(7, 11)?;
        for _ in 0..50 {
            let i = rng.gen_range(0..7);
            let j = rng.gen_range(0..11);
            board.add_grains(i, j, rng.gen_range(0..40))?;
        }
        let mut total = board.total_grains();
        while !board.is_stable() {
            board.sweep();
            let new_total = board.total_grains();
            assert!(new_total <= total);
            total = new_total;
        }
        Ok(())
    }

    #[test]
    fn display_rows() -> Result<(), ShapeError> {
        let board = Board::from_rows(vec![vec![0, 1], vec![2, 3]])?;
        assert_eq!(format!("{board}"), "0 1\n2 3\n");
        Ok(())
    }
}
