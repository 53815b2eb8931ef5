use std::process;
use clap::Parser;

#[macro_use]
extern crate log;

use anyhow::Result;
use parser::Commands;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Parse command line arguments and run `pedsim_rs::run()`
fn main() -> Result<()> {
    // ----------------------------- Run CLI Parser
    let cli = parser::Cli::parse();

    // ----------------------------- Init logger. Simulations, replayed or not, are mirrored into '<prefix>.log'
    let verbosity = if cli.quiet {0} else {cli.verbose + 1};
    let cli = cli.resolve()?;
    let log_file = cli.log_file();
    if let (Some(path), Commands::Simulate{common, ..}) = (&log_file, &cli.commands) {
        common.can_write_file(path)?;
    }
    logger::Logger::init(verbosity, log_file.as_deref())?;

    // ----------------------------- unpack Cli and run the appropriate modules.
    if let Err(e) = pedsim_rs::run(cli) {
        error!("{:?}", e);
        process::exit(1);
    };

    Ok(())
}
