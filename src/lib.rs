#![warn(clippy::all)]

mod boundary;
mod grid;
mod pattern;
mod presets;
mod row;

pub use boundary::BoundaryPolicy;
pub use grid::Grid;
pub use pattern::{Pattern, PatternFormat};
pub use presets::Preset;
pub use row::Row;

pub const VERSION: &str = "0.1.0";
