//! Build orchestration.
//!
//! Takes an emitted schema through `protoc` and, when asked, on to a data
//! file. Conversion runs either on the blocking thread pool of this process
//! or as a separate `root2pb convert` process inside a disposable
//! [`BuildWorkspace`] that holds a private copy of the descriptor set.

use crate::convert::{convert_blocking, ConvertRequest, ConvertSummary, Framing};
use crate::protoc::SchemaCompiler;
use crate::workspace::BuildWorkspace;
use indicatif::ProgressBar;
use root2pb_common::{Result, Root2pbError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Where the conversion engine runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConvertMode {
    #[default]
    InProcess,
    /// Run `<program> convert ...` with a fresh workspace as its cwd
    Subprocess { program: PathBuf },
}

/// Conversion settings for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    pub mode: ConvertMode,
    pub output: PathBuf,
    pub message: Option<String>,
    pub max_entries: i64,
    pub framing: Framing,
    pub keep_workspace: bool,
}

/// A schema ready for compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub source: PathBuf,
    pub tree: String,
    pub schema: PathBuf,
    /// `protoc` output languages (`cpp`, `python`, ...)
    pub languages: Vec<String>,
    pub conversion: Option<ConversionPlan>,
}

/// Artifacts of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Descriptor set, when the compiler ran
    pub descriptor: Option<PathBuf>,
    /// Written data file
    pub data: Option<PathBuf>,
    /// In-process conversion report
    pub summary: Option<ConvertSummary>,
    /// Workspace left on disk by `keep_workspace`
    pub workspace: Option<PathBuf>,
}

/// Compile the schema and convert the tree as requested.
///
/// Nothing runs when neither languages nor a conversion are requested.
pub async fn run(
    compiler: &SchemaCompiler,
    request: &BuildRequest,
    progress: ProgressBar,
) -> Result<BuildOutcome> {
    let mut outcome = BuildOutcome::default();
    if request.languages.is_empty() && request.conversion.is_none() {
        info!("No languages or conversion requested; skipping schema compiler");
        return Ok(outcome);
    }

    let compiled = compiler.compile(&request.schema, &request.languages).await?;
    outcome.descriptor = Some(compiled.descriptor.clone());

    let Some(plan) = &request.conversion else {
        return Ok(outcome);
    };

    let convert_request = ConvertRequest {
        source: request.source.clone(),
        tree: request.tree.clone(),
        descriptor: compiled.descriptor,
        message: plan.message.clone(),
        max_entries: plan.max_entries,
        output: plan.output.clone(),
        framing: plan.framing,
    };

    match &plan.mode {
        ConvertMode::InProcess => {
            let summary = convert_blocking(convert_request, progress).await?;
            outcome.data = Some(summary.output.clone());
            outcome.summary = Some(summary);
        },
        ConvertMode::Subprocess { program } => {
            let workspace = BuildWorkspace::create()?;
            let result = run_subprocess(program, &workspace, convert_request).await;
            if plan.keep_workspace {
                outcome.workspace = Some(workspace.keep());
            } else {
                workspace.close()?;
            }
            outcome.data = Some(result?);
        },
    }

    Ok(outcome)
}

/// Arguments of the `convert` subcommand for `request`.
pub fn convert_args(request: &ConvertRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "convert".into(),
        "--descriptor".into(),
        request.descriptor.clone().into(),
        "--file".into(),
        request.source.clone().into(),
        "--tree".into(),
        request.tree.clone().into(),
        "--max-entries".into(),
        request.max_entries.to_string().into(),
        "--output".into(),
        request.output.clone().into(),
        "--framing".into(),
        request.framing.to_string().into(),
    ];
    if let Some(message) = &request.message {
        args.push("--message".into());
        args.push(message.into());
    }
    args
}

async fn run_subprocess(
    program: &Path,
    workspace: &BuildWorkspace,
    mut request: ConvertRequest,
) -> Result<PathBuf> {
    // The child runs inside the workspace, so every path must be absolute.
    request.descriptor = workspace.stage(&request.descriptor)?;
    request.source = std::path::absolute(&request.source)?;
    request.output = std::path::absolute(&request.output)?;

    let program_name = program.display().to_string();
    info!(
        program = %program_name,
        workspace = %workspace.path().display(),
        "Running conversion subprocess"
    );

    let status = Command::new(program)
        .args(convert_args(&request))
        .current_dir(workspace.path())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| Root2pbError::ToolLaunch {
            program: program_name.clone(),
            source,
        })?;

    if !status.success() {
        return Err(Root2pbError::ToolFailed {
            program: program_name,
            status: status.to_string(),
        });
    }
    Ok(request.output)
}
