//! `root2pb inspect` command implementation
//!
//! Lists the branches of a tree with their mapped protobuf types and the
//! selection decision, without writing anything.

use super::require;
use crate::error::Result;
use colored::Colorize;
use root2pb_common::Root2pbError;
use root2pb_core::schema::FieldType;
use root2pb_core::select::BranchSelection;
use root2pb_core::source::open_source;
use root2pb_core::typemap::map_native_type;
use serde::Serialize;
use tracing::error;

/// One row of the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    pub index: usize,
    pub name: String,
    pub native: String,
    pub mapped: FieldType,
    pub repeated: bool,
    pub selected: bool,
}

/// Inspect `tree`; an unreadable file or missing tree gives an empty listing.
pub async fn run(
    file: Option<&str>,
    tree: Option<&str>,
    branches: &str,
    json: bool,
) -> Result<()> {
    let file = require(file, "--file")?;
    let tree = require(tree, "--tree")?;
    let selection = BranchSelection::parse(branches);

    let reports = match report(&file, &tree, &selection) {
        Ok(reports) => reports,
        Err(e) if e.is_missing_source() => {
            error!(file = %file, tree = %tree, error = %e, "Cannot inspect tree");
            Vec::new()
        },
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("{} {} ({})", "Tree:".cyan().bold(), tree, file);
    println!("  Branches:  {}", reports.len());
    println!("  Selection: {}", selection);
    println!();

    for r in &reports {
        let mapped = match &r.mapped {
            FieldType::Scalar(kind) => kind.to_string().green(),
            FieldType::Unresolved(native) => native.as_str().red(),
        };
        let modifier = if r.repeated { "repeated" } else { "optional" };
        let mark = if r.selected { "+".green() } else { "-".yellow() };
        println!(
            "{} [{:>3}] {:<24} {:<28} {} {}",
            mark, r.index, r.name, r.native, modifier, mapped
        );
    }

    let selected = reports.iter().filter(|r| r.selected).count();
    println!();
    println!("{}", "Summary:".cyan().bold());
    println!("  Selected: {}/{}", selected, reports.len());

    Ok(())
}

/// Build the listing for `tree` in `file`.
pub fn report(
    file: &str,
    tree: &str,
    selection: &BranchSelection,
) -> std::result::Result<Vec<BranchReport>, Root2pbError> {
    let source = open_source(file)?;
    let tree = source.require_tree(tree)?;

    Ok(tree
        .branches()
        .iter()
        .enumerate()
        .map(|(index, branch)| {
            let (mapped, repeated) = map_native_type(branch.native_type());
            BranchReport {
                index,
                name: branch.name.clone(),
                native: branch.native_type().to_string(),
                mapped,
                repeated,
                selected: selection.accepts(&branch.name),
            }
        })
        .collect())
}
