use anyhow::Result;
use clap::Parser;
use flasktrack::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
