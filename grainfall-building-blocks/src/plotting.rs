use grainfall_concepts::{Board, DrawingError};
use plotters::prelude::*;

/// Color of a cell of a stable board
///
/// | Height | Color |
/// | --- | --- |
/// | 0 | black |
/// | 1 | dark grey `(85, 85, 85)` |
/// | 2 | light grey `(170, 170, 170)` |
/// | 3 | white |
///
/// Any other height means that the board is not stable and results in an error.
pub fn height_color(height: u64) -> Result<RGBColor, DrawingError> {
    match height {
        0 => Ok(RGBColor(0, 0, 0)),
        1 => Ok(RGBColor(85, 85, 85)),
        2 => Ok(RGBColor(170, 170, 170)),
        3 => Ok(RGBColor(255, 255, 255)),
        _ => Err(DrawingError(format!(
            "cannot draw cell of height {}, only stable boards can be drawn",
            height
        ))),
    }
}

/// Number of pixels needed for `n_cells` cells of `cell_size` pixels
fn image_length(n_cells: usize, cell_size: u32) -> Result<u32, DrawingError> {
    u32::try_from(n_cells)
        .ok()
        .and_then(|n| n.checked_mul(cell_size))
        .filter(|&length| i32::try_from(length).is_ok())
        .ok_or_else(|| {
            DrawingError(format!(
                "image of {} cells with {} pixels each is too large",
                n_cells, cell_size
            ))
        })
}

/// Draws every cell as a square of `cell_size` pixels and saves the image as png file.
///
/// The board is checked before anything is written to `path`.
pub fn draw_board_png(
    board: &Board,
    path: impl AsRef<std::path::Path>,
    cell_size: u32,
) -> Result<(), DrawingError> {
    let colors = board
        .as_array()
        .indexed_iter()
        .map(|((i, j), &height)| Ok(((i, j), height_color(height)?)))
        .collect::<Result<Vec<_>, DrawingError>>()?;
    if cell_size == 0 {
        return Err(DrawingError("cell size must be at least 1 pixel".to_owned()));
    }

    let width = image_length(board.n_cols(), cell_size)?;
    let height = image_length(board.n_rows(), cell_size)?;
    let root = BitMapBackend::new(path.as_ref(), (width, height)).into_drawing_area();
    // Every pixel coordinate is below width or height which fit into i32
    let cell_size = cell_size as i32;
    for ((i, j), color) in colors {
        let (x, y) = (j as i32 * cell_size, i as i32 * cell_size);
        root.draw(&Rectangle::new(
            [(x, y), (x + cell_size, y + cell_size)],
            color.filled(),
        ))?;
    }
    root.present()?;
    Ok(())
}
