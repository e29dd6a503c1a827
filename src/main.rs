use clap::Parser;
use wirekit::cli::{run, Cli};
use wirekit::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging()?;
    run(&cli)
}
