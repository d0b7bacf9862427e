//! `root2pb convert` command implementation
//!
//! Runs the conversion engine against a compiled descriptor set. This is
//! also what `generate --convert-mode subprocess` launches.

use super::{default_data_path, require};
use crate::config::expand_env;
use crate::error::Result;
use crate::progress::create_conversion_progress;
use colored::Colorize;
use indicatif::HumanBytes;
use root2pb_common::checksum::compute_file_checksum;
use root2pb_core::convert::{convert_blocking, ConvertRequest, ConvertSummary};
use root2pb_core::Framing;
use std::path::PathBuf;

/// Flags of the `convert` command
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub descriptor: String,
    pub file: Option<String>,
    pub tree: Option<String>,
    pub message: Option<String>,
    pub max_entries: i64,
    pub output: Option<String>,
    pub framing: Framing,
}

/// Convert a tree into a `.pbuf` data file
pub async fn run(options: ConvertOptions, verbose: bool) -> Result<()> {
    let file = PathBuf::from(require(options.file.as_deref(), "--file")?);
    let tree = require(options.tree.as_deref(), "--tree")?;
    let descriptor = PathBuf::from(expand_env(&options.descriptor));
    let output = options
        .output
        .as_deref()
        .map(|o| PathBuf::from(expand_env(o)))
        .unwrap_or_else(|| default_data_path(&descriptor, &file));

    let request = ConvertRequest {
        source: file,
        tree,
        descriptor,
        message: options.message,
        max_entries: options.max_entries,
        output,
        framing: options.framing,
    };

    let progress = create_conversion_progress(verbose, "Converting entries");
    let summary = convert_blocking(request, progress).await?;
    print_summary(&summary)
}

/// Print the converted entry count, size and checksum of a data file.
pub(crate) fn print_summary(summary: &ConvertSummary) -> Result<()> {
    let path = &summary.output;
    let checksum = compute_file_checksum(path)?;
    let size = std::fs::metadata(path)?.len();

    println!("{}", "Data file:".cyan().bold());
    println!("  Path:     {}", path.display().to_string().green());
    println!("  Message:  {}", summary.message);
    println!("  Entries:  {}", summary.entries);
    println!("  Size:     {}", HumanBytes(size));
    println!("  SHA-256:  {}", checksum);
    Ok(())
}
