//! Core module for collating per-read isoform reports
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Given a collapse group file (isoform -> reads), a lima report
//! (ZMW -> dual barcodes), a SQANTI classification (isoform ->
//! transcript, gene, category) and optionally an on-target table and
//! an ORF-dedup group prefix, this binary writes one row per read with
//! everything known about it. Dropped reads are reported on stderr.

use clap::Parser;
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use iso_collate::{cli::Args, core::collate_isoforms};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let output = collate_isoforms(args).unwrap_or_else(|e| {
        error!("{:#}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Collated report written to {}", output.display());
    info!("Elapsed time: {:.3?}", elapsed);
}
