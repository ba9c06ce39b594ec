use anyhow::Result;
use chrono::Local;
use clap::ValueEnum;
use life_grid::{BoundaryPolicy, Grid, Pattern, Row};
use num_format::{CustomFormat, Grouping, ToFormattedString};
use tracing::warn;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum Width {
    /// 32x32 field, one u32 per row
    #[value(name = "32")]
    W32,
    /// 64x64 field, one u64 per row
    #[value(name = "64")]
    W64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum Boundary {
    /// Cells beyond the field are always dead
    Dead,
    /// Cells beyond the field are always alive
    Alive,
}

impl From<Boundary> for BoundaryPolicy {
    fn from(value: Boundary) -> Self {
        match value {
            Boundary::Dead => BoundaryPolicy::Dead,
            Boundary::Alive => BoundaryPolicy::Alive,
        }
    }
}

pub(super) fn format_count(count: u64) -> Result<String> {
    let fmt = CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator("_")
        .build()?;
    Ok(count.to_formatted_string(&fmt))
}

pub(super) fn print_population<R: Row>(grid: &Grid<R>) -> Result<()> {
    println!("Population: {}", format_count(grid.population() as u64)?);
    Ok(())
}

pub(super) fn local_time() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Places `pattern` in the middle of a blank field.
pub(super) fn centered<R: Row>(boundary: BoundaryPolicy, pattern: &Pattern) -> Grid<R> {
    let mut grid = Grid::new(boundary);
    let (w, h) = (pattern.width() as i64, pattern.height() as i64);
    if w > grid.width() || h > grid.height() {
        warn!(
            "Pattern of {}x{} does not fit into {}x{}, it will be clipped",
            w,
            h,
            grid.width(),
            grid.height()
        );
    }
    let x = ((grid.width() - w) / 2).max(0);
    let y = ((grid.height() - h) / 2).max(0);
    grid.stamp(pattern, x, y);
    grid
}
