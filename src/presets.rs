use crate::{BoundaryPolicy, Grid, Pattern, Row};

/// Small well-known seeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// 2x2 still life.
    Block,
    /// Period 2 oscillator, three cells in a row.
    Blinker,
    /// Period 2 oscillator.
    Toad,
    /// Travels by (+1, +1) every 4 generations.
    Glider,
    /// 5x5 seed that grows without bound on an infinite plane.
    InfiniteGrowth,
}

impl Preset {
    pub fn pattern(self) -> Pattern {
        match self {
            Preset::Block => Pattern::from_rows(&[0b11, 0b11]),
            Preset::Blinker => Pattern::from_rows(&[0b111]),
            Preset::Toad => Pattern::from_rows(&[0b1110, 0b0111]),
            Preset::Glider => Pattern::from_rows(&[0b010, 0b100, 0b111]),
            Preset::InfiniteGrowth => {
                Pattern::from_rows(&[0b11101, 0b10000, 0b00011, 0b01101, 0b10101])
            }
        }
    }
}

impl<R: Row> Grid<R> {
    /// Creates the start-up field: [`Preset::InfiniteGrowth`] near the centre.
    pub fn seeded(boundary: BoundaryPolicy) -> Self {
        let mut grid = Self::new(boundary);
        let offset = grid.width() / 2 - 3;
        grid.stamp(&Preset::InfiniteGrowth.pattern(), offset, offset);
        grid
    }
}
