//! Uniform grid used for broad-phase proximity queries.

use bulwark_core::EntityId;

/// Uniform bucket grid over the fixed world bounds.
///
/// Queries return every identifier stored in the cells overlapping the query
/// shape's bounding box. Results are a superset of the exact answer; callers
/// perform their own fine distance checks.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    columns: usize,
    rows: usize,
    cells: Vec<Vec<EntityId>>,
    touched: Vec<usize>,
}

impl SpatialGrid {
    /// Creates a grid covering `width` x `height` pixels with square cells.
    ///
    /// Degenerate inputs collapse to a single cell rather than failing.
    #[must_use]
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            width.max(height).max(1.0)
        };
        let columns = cells_along(width, cell_size);
        let rows = cells_along(height, cell_size);
        Self {
            cell_size,
            columns,
            rows,
            cells: vec![Vec::new(); columns * rows],
            touched: Vec::new(),
        }
    }

    /// Side length of a cell in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of cell columns and rows.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Empties every bucket. Only buckets filled since the last clear are
    /// visited, so the cost does not depend on the grid size.
    pub fn clear(&mut self) {
        for index in self.touched.drain(..) {
            if let Some(cell) = self.cells.get_mut(index) {
                cell.clear();
            }
        }
    }

    /// Buckets `entity` into the cell containing `(x, y)`.
    ///
    /// Positions outside the bounds land in the nearest edge cell.
    pub fn insert(&mut self, entity: EntityId, x: f32, y: f32) {
        let (column, row) = self.cell_of(x, y);
        let index = row * self.columns + column;
        if let Some(cell) = self.cells.get_mut(index) {
            if cell.is_empty() {
                self.touched.push(index);
            }
            cell.push(entity);
        }
    }

    /// Appends every entity bucketed in cells overlapping the bounding square
    /// of the circle at `(x, y)` with radius `radius`.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32, out: &mut Vec<EntityId>) {
        let radius = radius.max(0.0);
        self.collect(x - radius, y - radius, x + radius, y + radius, out);
    }

    /// Appends every entity bucketed in cells overlapping the rectangle with
    /// top-left corner `(x, y)` and the provided size.
    pub fn query_rect(&self, x: f32, y: f32, width: f32, height: f32, out: &mut Vec<EntityId>) {
        let (left, right) = ordered(x, x + width);
        let (top, bottom) = ordered(y, y + height);
        self.collect(left, top, right, bottom, out);
    }

    /// Number of identifiers currently bucketed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.touched
            .iter()
            .filter_map(|index| self.cells.get(*index))
            .map(Vec::len)
            .sum()
    }

    /// Reports whether the grid holds no identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    fn collect(&self, left: f32, top: f32, right: f32, bottom: f32, out: &mut Vec<EntityId>) {
        let (min_column, min_row) = self.cell_of(left, top);
        let (max_column, max_row) = self.cell_of(right, bottom);
        for row in min_row..=max_row {
            let start = row * self.columns;
            for cell in &self.cells[start + min_column..=start + max_column] {
                out.extend_from_slice(cell);
            }
        }
    }

    fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        (
            clamp_cell(x / self.cell_size, self.columns),
            clamp_cell(y / self.cell_size, self.rows),
        )
    }
}

fn cells_along(extent: f32, cell_size: f32) -> usize {
    if extent.is_finite() && extent > 0.0 {
        ((extent / cell_size).ceil() as usize).max(1)
    } else {
        1
    }
}

fn clamp_cell(scaled: f32, count: usize) -> usize {
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else {
        (scaled.floor() as usize).min(count - 1)
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
