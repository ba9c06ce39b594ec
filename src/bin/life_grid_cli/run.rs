use crate::util::{centered, format_count, local_time, print_population, Boundary, Width};
use anyhow::Result;
use clap::{Args, ValueEnum};
use life_grid::{BoundaryPolicy, Grid, Pattern, Preset, Row};
use tracing::info;

#[derive(Args, Debug)]
pub(super) struct RunArgs {
    /// Path to the file containing the initial pattern; supports .rle and .rle.gz formats
    pattern: Option<String>,

    /// The seed to start from when no pattern file is given, default is infinite-growth
    #[arg(long, value_enum, conflicts_with = "pattern")]
    preset: Option<PresetArg>,

    /// Fill the field randomly, each cell being alive with this probability
    #[arg(short, long, conflicts_with_all = ["pattern", "preset"])]
    fill_rate: Option<f64>,

    /// Seed for the random fill; seeds from the OS if omitted
    #[arg(short, long, requires = "fill_rate")]
    seed: Option<u64>,

    /// The number of cells in a row (and of rows)
    #[arg(short, long, value_enum, default_value_t = Width::W64)]
    width: Width,

    /// The state assumed for cells beyond the field
    #[arg(short, long, value_enum, default_value_t = Boundary::Dead)]
    boundary: Boundary,

    /// Re-evaluate every cell on the first update, not only the written ones
    #[arg(long)]
    full_scan: bool,

    /// The number of generations to compute
    #[arg(short, long)]
    generations: u64,

    /// Report progress every this many generations
    #[arg(short, long)]
    report_every: Option<u64>,

    /// Path to the file where the resulting pattern will be saved
    #[arg(short, long)]
    output: Option<String>,

    /// Print the resulting field
    #[arg(long)]
    print: bool,

    /// Count population of the resulting field
    #[arg(short, long)]
    population: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    /// 2x2 still life
    Block,
    /// Period 2 oscillator
    Blinker,
    /// Period 2 oscillator
    Toad,
    /// See https://conwaylife.com/wiki/Glider
    Glider,
    /// 5x5 seed that grows without bound on an infinite plane
    InfiniteGrowth,
}

impl From<PresetArg> for Preset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Block => Preset::Block,
            PresetArg::Blinker => Preset::Blinker,
            PresetArg::Toad => Preset::Toad,
            PresetArg::Glider => Preset::Glider,
            PresetArg::InfiniteGrowth => Preset::InfiniteGrowth,
        }
    }
}

pub(super) fn run_simulation(args: RunArgs) -> Result<()> {
    match args.width {
        Width::W32 => simulate::<u32>(&args),
        Width::W64 => simulate::<u64>(&args),
    }
}

fn build_grid<R: Row>(args: &RunArgs) -> Result<Grid<R>> {
    let boundary = BoundaryPolicy::from(args.boundary);
    let grid = if let Some(path) = &args.pattern {
        centered(boundary, &Pattern::from_file(path)?)
    } else if let Some(fill_rate) = args.fill_rate {
        Grid::random(boundary, fill_rate, args.seed)?
    } else {
        match args.preset.map(Preset::from) {
            None | Some(Preset::InfiniteGrowth) => Grid::seeded(boundary),
            Some(preset) => centered(boundary, &preset.pattern()),
        }
    };
    Ok(grid)
}

fn simulate<R: Row>(args: &RunArgs) -> Result<()> {
    let timer = std::time::Instant::now();
    let mut grid = build_grid::<R>(args)?;
    if args.full_scan {
        grid.mark_all();
    }
    info!(
        "Built {}x{} field with population {} in {:.3} secs",
        grid.width(),
        grid.height(),
        grid.population(),
        timer.elapsed().as_secs_f64()
    );

    let timer = std::time::Instant::now();
    let mut examined = 0u64;
    for _ in 0..args.generations {
        examined += grid.candidates_len() as u64;
        grid = grid.next_frame();
        if let Some(every) = args.report_every.filter(|&x| x != 0) {
            if grid.generation() % every == 0 {
                info!(
                    "Generation {}: population {}, {} candidates",
                    grid.generation(),
                    grid.population(),
                    grid.candidates_len()
                );
            }
        }
    }
    info!(
        "Updated field by {} generations in {:.3} secs, examined {} cells",
        args.generations,
        timer.elapsed().as_secs_f64(),
        format_count(examined)?
    );

    if args.print {
        print!("{grid}");
    }
    if args.population {
        print_population(&grid)?;
    }
    if let Some(output) = &args.output {
        grid.to_pattern()
            .with_comment(format!(
                "Generation {} of a {}x{} field, saved at {}",
                grid.generation(),
                grid.width(),
                grid.height(),
                local_time()
            ))
            .to_file(output)?;
        info!("Saved field to {}", output);
    }
    Ok(())
}
