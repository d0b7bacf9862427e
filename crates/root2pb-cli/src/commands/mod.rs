//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod convert;
pub mod generate;
pub mod inspect;

use crate::config::expand_env;
use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};

/// Unwrap a flag that has to be present, expanding `$VAR` references.
pub(crate) fn require(value: Option<&str>, flag: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(expand_env(v)),
        _ => Err(CliError::MissingArgument(flag)),
    }
}

/// `<dir>/<input stem>.pbuf`, with any `.gz` suffix dropped before the stem
/// is taken.
pub(crate) fn default_data_path(dir_of: &Path, input: &Path) -> PathBuf {
    let dir = match dir_of.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());

    dir.join(format!("{}.pbuf", stem))
}
