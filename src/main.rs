use std::{io::Write, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use kicad_fab::{generator::Generator, Manufacturer};

#[derive(Parser)]
#[command(name = "kicad-fab")]
#[command(about = "Write assembly files from a KiCad net file and board file", long_about = None)]
#[command(version)]
struct Cli {
    /// Net file exported from the schematic
    #[arg(long, value_name = "PATH")]
    input_net: PathBuf,

    /// Board file; its directory names the design
    #[arg(long, value_name = "PATH")]
    input_pcb: PathBuf,

    /// Directory receiving the generated files
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = Manufacturer::Pcbpool)]
    manufacturer: Manufacturer,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log extraction details
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Bill of materials
    Bom,
    /// Pick and place file
    Pickplace,
    /// Every supported file
    All,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let design = kicad_fab::read_design_files(&cli.input_net, &cli.input_pcb)
        .with_context(|| format!("Failed to read design from {}", cli.input_pcb.display()))?;
    log::debug!(
        "Design {} has {} components and {} fiducials",
        design.name,
        design.components.len(),
        design.fiducials.len()
    );

    let generator = Generator::new(cli.manufacturer);
    let command = cli.command.unwrap_or(Commands::All);

    if matches!(command, Commands::Bom | Commands::All) {
        log::info!("Generating {} BOM", cli.manufacturer);
        generator
            .process_bom(&cli.output_dir, &design)
            .context("Failed to write BOM")?;
    }
    if matches!(command, Commands::Pickplace | Commands::All) {
        log::info!("Generating {} pick and place file", cli.manufacturer);
        generator
            .process_pickplace(&cli.output_dir, &design)
            .context("Failed to write pick and place file")?;
    }
    Ok(())
}
