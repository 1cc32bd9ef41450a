use anyhow::Result;
use clap::Parser;

use coi_analysis::cli::{Cli, Commands};
use coi_analysis::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Build(args) => commands::build(&cli, args),
        Commands::Cluster(args) => commands::cluster(&cli, args),
        Commands::Chain(args) => commands::chain(&cli, args),
    }
}
