use crate::{BoundaryPolicy, Pattern, Row};
use ahash::AHashSet;
use anyhow::{anyhow, Result};
use rand::{distr::Bernoulli, Rng, SeedableRng};
use std::fmt;
use tracing::trace;

/// One generation of Conway's Game of Life on a fixed square field.
///
/// Every row of the field is a single bit-packed word of type `R`, so the
/// field is `R::BITS x R::BITS` cells (64x64 for the default `u64`).
///
/// Instead of rescanning the whole field on every update, the grid remembers
/// the coordinates whose neighbourhood was written since it was created
/// ("candidates"). [`Grid::next_frame`] evaluates only those, so its cost is
/// proportional to the recent activity rather than to the area.
///
/// All operations are total: reads outside the field return the state given by
/// the [`BoundaryPolicy`], and writes outside the field are ignored.
///
/// # Example
///
/// ```rust
/// use life_grid::{BoundaryPolicy, Grid};
///
/// let mut grid: Grid = Grid::new(BoundaryPolicy::Dead);
/// for x in 10..13 {
///     grid.set_state(x, 20, true);
/// }
///
/// let next = grid.next_frame();
/// assert_eq!(next.generation(), 1);
/// assert!(next.get_state(11, 19) && next.get_state(11, 21));
/// assert!(!next.get_state(10, 20));
/// ```
#[derive(Clone, Debug)]
pub struct Grid<R: Row = u64> {
    /// `rows[y]` holds the cells `(0..R::BITS, y)`.
    rows: Vec<R>,
    generation: u64,
    boundary: BoundaryPolicy,
    /// Coordinates to re-evaluate on the next update, may lie outside the field.
    candidates: AHashSet<(i64, i64)>,
}

impl<R: Row> Grid<R> {
    /// Creates a blank generation-0 grid.
    pub fn new(boundary: BoundaryPolicy) -> Self {
        Self {
            rows: vec![R::default(); R::BITS as usize],
            generation: 0,
            boundary,
            candidates: AHashSet::new(),
        }
    }

    /// Creates the successor of `parent`: same cells and boundary policy,
    /// generation incremented, no candidates.
    pub fn from_parent(parent: &Self) -> Self {
        Self {
            rows: parent.rows.clone(),
            generation: parent.generation + 1,
            boundary: parent.boundary,
            candidates: AHashSet::new(),
        }
    }

    /// Creates a generation-0 grid where every cell is alive with probability `fill_rate`.
    ///
    /// # Arguments
    ///
    /// * `fill_rate` - Probability of a cell being alive, within `0.0..=1.0`.
    /// * `seed` - Optional seed for the random number generator.
    ///   If None, seeds from the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if `fill_rate` is not a valid probability.
    pub fn random(boundary: BoundaryPolicy, fill_rate: f64, seed: Option<u64>) -> Result<Self> {
        let dist = Bernoulli::new(fill_rate)
            .map_err(|_| anyhow!("fill_rate {} is not within [0, 1]", fill_rate))?;
        let mut rng = if let Some(x) = seed {
            rand_chacha::ChaCha8Rng::seed_from_u64(x)
        } else {
            rand_chacha::ChaCha8Rng::from_os_rng()
        };

        let mut grid = Self::new(boundary);
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                if rng.sample(dist) {
                    grid.set_state(x, y, true);
                }
            }
        }
        Ok(grid)
    }

    /// Creates a generation-0 grid with `pattern` stamped at `(x, y)`.
    pub fn with_pattern(boundary: BoundaryPolicy, pattern: &Pattern, x: i64, y: i64) -> Self {
        let mut grid = Self::new(boundary);
        grid.stamp(pattern, x, y);
        grid
    }

    pub fn width(&self) -> i64 {
        R::BITS as i64
    }

    pub fn height(&self) -> i64 {
        self.rows.len() as i64
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn boundary_policy(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Number of coordinates that the next update will examine.
    pub fn candidates_len(&self) -> usize {
        self.candidates.len()
    }

    /// Bit-packed rows, bit `x` of `rows()[y]` is the cell `(x, y)`.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    #[inline]
    fn contains(&self, x: i64, y: i64) -> bool {
        (0..self.width()).contains(&x) && (0..self.height()).contains(&y)
    }

    /// Returns the state of the cell, or the boundary state if it lies outside the field.
    #[inline]
    pub fn get_state(&self, x: i64, y: i64) -> bool {
        if !self.contains(x, y) {
            return self.boundary.is_alive();
        }
        self.rows[y as usize].bit(x as u32)
    }

    /// Writes the cell and marks its 3x3 neighbourhood as candidates.
    ///
    /// Does nothing if the cell lies outside the field.
    pub fn set_state(&mut self, x: i64, y: i64, alive: bool) {
        if !self.contains(x, y) {
            return;
        }
        for dy in -1..=1 {
            for dx in -1..=1 {
                self.candidates.insert((x + dx, y + dy));
            }
        }
        let row = &mut self.rows[y as usize];
        *row = if alive {
            row.with_bit(x as u32)
        } else {
            row.without_bit(x as u32)
        };
    }

    /// Flips the cell; out-of-field coordinates are ignored.
    pub fn toggle(&mut self, x: i64, y: i64) {
        let state = self.get_state(x, y);
        self.set_state(x, y, !state);
    }

    /// Computes the state of the cell in the next generation by the B3/S23 rule.
    pub fn next_state_of(&self, x: i64, y: i64) -> bool {
        let mut neighbours = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0)
                    && self.get_state(x.saturating_add(dx), y.saturating_add(dy))
                {
                    neighbours += 1;
                }
            }
        }
        if self.get_state(x, y) {
            neighbours == 2 || neighbours == 3
        } else {
            neighbours == 3
        }
    }

    /// Computes the next generation.
    ///
    /// Only the candidates are evaluated; every other cell is carried over
    /// unchanged. `self` is left untouched, so calling this twice yields equal grids.
    pub fn next_frame(&self) -> Self {
        let mut next = Self::from_parent(self);
        let mut changed = 0;
        for &(x, y) in &self.candidates {
            if !self.contains(x, y) {
                continue;
            }
            let new = self.next_state_of(x, y);
            if self.get_state(x, y) != new {
                next.set_state(x, y, new);
                changed += 1;
            }
        }
        trace!(
            generation = next.generation,
            examined = self.candidates.len(),
            changed,
            "computed next frame"
        );
        next
    }

    /// Advances by `generations` frames, returning the last one.
    pub fn advance(&self, generations: u64) -> Self {
        let mut grid = self.clone();
        for _ in 0..generations {
            grid = grid.next_frame();
        }
        grid
    }

    /// Number of cells the next update would flip.
    pub fn pending_changes(&self) -> usize {
        self.candidates
            .iter()
            .filter(|&&(x, y)| {
                self.contains(x, y) && self.get_state(x, y) != self.next_state_of(x, y)
            })
            .count()
    }

    /// Returns a blank generation-0 grid with the same boundary policy.
    pub fn clear(&self) -> Self {
        Self::new(self.boundary)
    }

    /// Marks every cell of the field as a candidate without changing it.
    ///
    /// Useful when the boundary alone can change cells, e.g. a blank grid
    /// with [`BoundaryPolicy::Alive`] where nothing was ever written.
    pub fn mark_all(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.candidates.insert((x, y));
            }
        }
    }

    pub fn population(&self) -> u32 {
        self.rows.iter().map(|row| row.count_ones()).sum()
    }

    /// Iterates over alive cells in row-major order.
    pub fn alive_cells(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, &row)| {
            (0..R::BITS)
                .filter(move |&x| row.bit(x))
                .map(move |x| (x as i64, y as i64))
        })
    }

    /// Writes every alive cell of `pattern` shifted by `(x, y)`.
    ///
    /// Cells that land outside the field are dropped.
    pub fn stamp(&mut self, pattern: &Pattern, x: i64, y: i64) {
        for &(px, py) in pattern.cells() {
            self.set_state(x.saturating_add(px as i64), y.saturating_add(py as i64), true);
        }
    }

    /// Extracts the alive cells as a pattern trimmed to their bounding box.
    pub fn to_pattern(&self) -> Pattern {
        let cells = self
            .alive_cells()
            .map(|(x, y)| (x as u32, y as u32))
            .collect::<Vec<_>>();
        Pattern::from_cells(&cells).trimmed()
    }
}

impl<R: Row> Default for Grid<R> {
    fn default() -> Self {
        Self::new(BoundaryPolicy::default())
    }
}

impl<R: Row> fmt::Display for Grid<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &row in &self.rows {
            for x in 0..R::BITS {
                f.write_str(if row.bit(x) { "*" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
