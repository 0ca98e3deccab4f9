mod config;
mod scenario;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mechworks_common::Orientation;
use mechworks_kernel::World;
use tracing_subscriber::EnvFilter;

use config::MechworksConfig;
use scenario::{Layout, Scenario};

#[derive(Parser)]
#[command(name = "mechworks-cli", about = "Drive actuator scenarios on a voxel grid")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the world event log as JSON lines after the run
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Facing {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl From<Facing> for Orientation {
    fn from(f: Facing) -> Self {
        match f {
            Facing::Down => Orientation::Down,
            Facing::Up => Orientation::Up,
            Facing::North => Orientation::North,
            Facing::South => Orientation::South,
            Facing::West => Orientation::West,
            Facing::East => Orientation::East,
        }
    }
}

#[derive(clap::Args)]
struct RowArgs {
    /// Cells in the row ahead of the base
    #[arg(short, long, default_value = "3")]
    row: i32,
    /// Use the sticky variant
    #[arg(short, long)]
    sticky: bool,
    /// Direction the base pushes
    #[arg(short, long, value_enum, default_value = "east")]
    facing: Facing,
    /// Make this row cell (1-based) immovable
    #[arg(short, long)]
    blocker: Option<i32>,
}

impl RowArgs {
    fn layout(&self) -> Layout {
        Layout {
            orientation: self.facing.into(),
            sticky: self.sticky,
            row: self.row,
            blocker: self.blocker,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective settings
    Info,
    /// Power an actuator and show the row before and after
    Extend(RowArgs),
    /// Extend, then cut power and show the row after retraction
    Retract(RowArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => MechworksConfig::load(path)?,
        None => MechworksConfig::default(),
    };

    match &cli.command {
        Commands::Info => {
            println!("mechworks-cli v{}", env!("CARGO_PKG_VERSION"));
            print!("{}", config.to_yaml()?);
        }
        Commands::Extend(args) => {
            let mut s = Scenario::build(&config, args.layout())?;
            println!("before:\n{}", s.render());
            s.set_power(true)?;
            let steps = s.settle()?;
            println!("after {steps} step(s):\n{}", s.render());
            report(&s, cli.json)?;
        }
        Commands::Retract(args) => {
            let mut s = Scenario::build(&config, args.layout())?;
            s.set_power(true)?;
            s.settle()?;
            println!("extended:\n{}", s.render());
            s.set_power(false)?;
            let steps = s.settle()?;
            println!("retracted after {steps} step(s):\n{}", s.render());
            report(&s, cli.json)?;
        }
    }

    Ok(())
}

/// Summarize the base, check the log replays to the same world, and
/// optionally dump the log.
fn report(s: &Scenario, json: bool) -> anyhow::Result<()> {
    let world = s.sim.world();
    match s.base_state() {
        Some(state) => println!(
            "base: facing={:?} powered={} pending={} arm={}",
            state.orientation,
            state.powered,
            state.pending,
            s.arm_present()
        ),
        None => println!("base: gone"),
    }

    let replayed = World::replay(world.events());
    let hash = world.state_hash();
    println!(
        "tick={} events={} hash={hash:#018x} replay={}",
        world.tick(),
        world.events().len(),
        if replayed.state_hash() == hash { "OK" } else { "MISMATCH" }
    );

    if json {
        for event in world.events() {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}
