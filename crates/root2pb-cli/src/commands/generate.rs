//! `root2pb generate` command implementation
//!
//! Extracts the schema of a tree, writes it as a `.proto` file, and hands it
//! to the build orchestrator for compilation and conversion.

use super::convert::print_summary;
use super::{default_data_path, require};
use crate::config::{expand_env, Config};
use crate::error::Result;
use crate::progress::create_conversion_progress;
use crate::ConvertModeArg;
use colored::Colorize;
use root2pb_core::emit::write_schema;
use root2pb_core::extract::extract_fields;
use root2pb_core::ids::IdAllocator;
use root2pb_core::orchestrate::{self, BuildRequest, ConversionPlan, ConvertMode};
use root2pb_core::schema::SchemaDocument;
use root2pb_core::select::BranchSelection;
use root2pb_core::source::open_source;
use root2pb_core::Framing;
use std::path::PathBuf;
use tracing::info;

/// Flags of the `generate` command
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub file: Option<String>,
    pub tree: Option<String>,
    pub output: String,
    pub branches: String,
    pub package: Option<String>,
    pub message: Option<String>,
    pub languages: Vec<String>,
    pub convert: bool,
    pub convert_mode: ConvertModeArg,
    pub data_output: Option<String>,
    pub max_entries: i64,
    pub framing: Framing,
    pub keep_workspace: bool,
}

/// Generate a schema and optionally compile and convert it
pub async fn run(config: &Config, options: GenerateOptions, verbose: bool) -> Result<()> {
    let file = PathBuf::from(require(options.file.as_deref(), "--file")?);
    let tree = require(options.tree.as_deref(), "--tree")?;
    let schema = PathBuf::from(expand_env(&options.output));

    println!("{}", ":: root -> proto ::".cyan().bold());
    println!("  Input file:  {}", file.display());
    println!("  Output file: {}", schema.display());
    println!("  Tree:        {}", tree);

    let selection = BranchSelection::parse(&options.branches);
    let fields = {
        let source = open_source(&file)?;
        let ids = IdAllocator::start()?;
        extract_fields(source.as_ref(), &tree, &selection, &ids, verbose)?
    };

    let doc = SchemaDocument::new(
        options.package.unwrap_or_else(|| config.package.clone()),
        options.message.unwrap_or_else(|| config.message.clone()),
        fields,
    )?;
    write_schema(&doc, &schema)?;
    println!(
        "  Schema:      {} ({} fields)",
        "written".green(),
        doc.fields.len()
    );

    let conversion = if options.convert {
        let output = options
            .data_output
            .as_deref()
            .map(|o| PathBuf::from(expand_env(o)))
            .unwrap_or_else(|| default_data_path(&schema, &file));
        let mode = match options.convert_mode {
            ConvertModeArg::InProcess => ConvertMode::InProcess,
            ConvertModeArg::Subprocess => ConvertMode::Subprocess {
                program: std::env::current_exe()?,
            },
        };
        Some(ConversionPlan {
            mode,
            output,
            message: Some(doc.message.clone()),
            max_entries: options.max_entries,
            framing: options.framing,
            keep_workspace: options.keep_workspace,
        })
    } else {
        None
    };

    let request = BuildRequest {
        source: file,
        tree,
        schema,
        languages: options.languages,
        conversion,
    };

    let progress = create_conversion_progress(verbose, "Converting entries");
    let outcome = orchestrate::run(&config.compiler(), &request, progress).await?;

    if let Some(descriptor) = &outcome.descriptor {
        println!("  Descriptor:  {}", descriptor.display());
    }
    if let Some(workspace) = &outcome.workspace {
        println!("  Workspace:   {} (kept)", workspace.display());
    }
    // A subprocess conversion has already reported its data file.
    if let Some(summary) = &outcome.summary {
        print_summary(summary)?;
    }

    info!(schema = %request.schema.display(), "Generate finished");
    println!("{}", ":: bye.".cyan());
    Ok(())
}
