//! Metaharvest CLI: harvest EXIF metadata from a bucket (or directory) into flat records.

use anyhow::Result;
use clap::Parser;
use metaharvest::engine::arg_parser::Cli;
use metaharvest::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    // .env feeds the METAHARVEST_* variables clap reads.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
