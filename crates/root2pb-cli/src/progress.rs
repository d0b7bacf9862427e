//! Progress bar utilities for CLI operations

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for the conversion row loop; hidden unless `verbose`.
///
/// The engine sets the length once it knows the entry count.
pub fn create_conversion_progress(verbose: bool, message: &str) -> ProgressBar {
    if !verbose {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} entries ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
