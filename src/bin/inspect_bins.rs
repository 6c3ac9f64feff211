//! Dump the contents of a raw bin stream file.
//!
//! The bin wire format carries no framing of its own, but every payload
//! is self-describing (observation count, feature count, features), so a
//! plain concatenation of bins can be walked from the start.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use gridbin::SpatialBin;

/// Inspect a file of concatenated binary bin payloads
#[derive(Parser, Debug)]
#[command(name = "inspect_bins")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the bin stream file
    file: PathBuf,

    /// Print at most this many bins
    #[arg(short, long)]
    limit: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GRIDBIN_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    gridbin::init_tracing(&args.log_level);

    let data = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let mut buf = data.as_slice();

    println!("Inspecting bin stream: {}", args.file.display());
    println!("File size: {} bytes", data.len());
    println!();

    let mut count = 0usize;
    let mut total_obs = 0u64;
    while !buf.is_empty() {
        let bin = SpatialBin::read_from(&mut buf)
            .with_context(|| format!("Failed to decode bin #{}", count))?;

        if args.limit.map_or(true, |limit| count < limit) {
            println!(
                "bin #{:<6} num_obs = {:<8} features = {:?}",
                count, bin.num_obs, bin.features
            );
        }
        total_obs += u64::from(bin.num_obs);
        count += 1;
    }

    println!();
    println!("{} bins, {} observations in total", count, total_obs);
    Ok(())
}
