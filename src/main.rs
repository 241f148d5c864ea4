use anyhow::Result;
use clap::Parser;
use debtcoach::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
