use crate::util::{centered, format_count, print_population, Boundary, Width};
use anyhow::Result;
use clap::Args;
use life_grid::{Pattern, Row};

#[derive(Args, Debug)]
pub(super) struct StatsArgs {
    /// Path to the file containing the pattern; supports .rle and .rle.gz formats
    pattern: String,

    /// The number of cells in a row (and of rows)
    #[arg(short, long, value_enum, default_value_t = Width::W64)]
    width: Width,

    /// The state assumed for cells beyond the field
    #[arg(short, long, value_enum, default_value_t = Boundary::Dead)]
    boundary: Boundary,
}

pub(super) fn run_stats(args: StatsArgs) -> Result<()> {
    let timer = std::time::Instant::now();
    let pattern = Pattern::from_file(&args.pattern)?;
    for comment in pattern.comments() {
        println!("# {comment}");
    }
    println!("Pattern size: {}x{}", pattern.width(), pattern.height());
    match args.width {
        Width::W32 => print_field_stats::<u32>(&pattern, args.boundary)?,
        Width::W64 => print_field_stats::<u64>(&pattern, args.boundary)?,
    }
    println!(
        "Computed stats in {:.3} secs",
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}

fn print_field_stats<R: Row>(pattern: &Pattern, boundary: Boundary) -> Result<()> {
    let grid = centered::<R>(boundary.into(), pattern);
    println!("Field size: {}x{}", grid.width(), grid.height());
    print_population(&grid)?;
    if (grid.population() as usize) < pattern.population() {
        println!(
            "Clipped cells: {}",
            format_count((pattern.population() - grid.population() as usize) as u64)?
        );
    }
    println!("Candidates: {}", grid.candidates_len());
    println!("Cells changing next generation: {}", grid.pending_changes());
    Ok(())
}
