//! Collate collapse groups, lima barcodes and SQANTI annotations
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Library entry point for iso-collate. Other crates can call
//! `lib_iso_collate` with the same arguments the binary accepts.

use anyhow::Result;
use config::ArgCheck;
use std::path::PathBuf;

pub mod cli;
pub mod core;
pub mod record;
pub mod utils;

pub fn lib_iso_collate(args: Vec<String>) -> Result<PathBuf> {
    let args = cli::Args::from(args);
    args.check()?;

    crate::core::collate_isoforms(args)
}
