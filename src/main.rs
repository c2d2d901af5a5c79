use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use millsim::{init_logging, Config, Simulation, SimulationSummary, VERSION};
use tracing::info;

#[derive(Parser)]
#[command(name = "millsim")]
#[command(about = "Replay a machining program against a heightmap stock block", long_about = None)]
#[command(version = VERSION, long_version = LONG_VERSION)]
struct Cli {
    /// Program file; a `.fRR` / `.kRR` suffix selects a flat / ball cutter
    program: PathBuf,

    /// Configuration file (.toml or .json); defaults to the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the blade height, in world units
    #[arg(short, long)]
    blade_height: Option<f32>,

    /// Time step for paced simulation, in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Run the whole path in one call instead of stepping by `--dt`
    #[arg(long)]
    instant: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ")"
);

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => match Config::default_path() {
            Ok(path) => Ok(Config::load_or_default(&path)?),
            Err(_) => Ok(Config::default()),
        },
    }
}

fn print_summary(summary: &SimulationSummary) {
    if let Some(program) = &summary.program {
        println!("Program:        {}", program.display());
    }
    if let Some(tool) = &summary.tool {
        println!("Tool:           {} r={:.3}", tool.shape, tool.radius);
    }
    println!("Blade height:   {:.3}", summary.blade_height);
    println!(
        "Commands:       {} ({} invalid{})",
        summary.commands,
        summary.invalid_commands,
        if summary.truncated { ", truncated" } else { "" }
    );
    println!(
        "Segments:       {}/{}",
        summary.segments_completed, summary.segments
    );
    println!("Collisions:     {}", summary.events.collisions);
    println!("Over depth:     {}", summary.events.over_depth);
    println!("Flat plunges:   {}", summary.events.flat_on_vertical);
    println!("Removed volume: {:.4}", summary.removed_volume);
    println!("Deepest point:  {:.4}", summary.deepest_point);
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let mut sim = Simulation::new(config)?;
    if let Some(blade_height) = cli.blade_height {
        sim.set_blade_height(blade_height)?;
    }
    sim.load_program(&cli.program)?;

    if cli.instant || !(cli.dt > 0.0) {
        sim.complete_instantly()?;
    } else {
        let mut steps = 0usize;
        while !sim.is_done() {
            sim.update(cli.dt)?;
            steps += 1;
        }
        info!("Finished after {} steps of {}s", steps, cli.dt);
    }

    let summary = sim.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging() {
        eprintln!("Failed to initialize logging: {err}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
