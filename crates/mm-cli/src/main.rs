mod config;
mod run;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Cli, Command, RunConfig};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = RunConfig::from(&cli);

    match cli.command.unwrap_or(Command::Matmul) {
        Command::Matmul => {
            let report = run::run_matmul(&config)?;
            println!(
                "Matrix multiplication of {0}x{0} verified successfully.",
                report.size
            );
        }
        Command::VectorAdd { len, block } => {
            run::run_vector_add(&config, len, block)?;
            println!("Vector addition of {} elements verified successfully.", len);
        }
    }
    Ok(())
}
