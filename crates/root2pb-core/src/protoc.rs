//! `protoc` driver

use root2pb_common::{Result, Root2pbError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Default compiler program when `$PROTOC` is unset.
pub const DEFAULT_PROTOC: &str = "protoc";

/// Files produced by one compiler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// Directory holding the generated bindings
    pub out_dir: PathBuf,
    /// Binary descriptor set of the schema
    pub descriptor: PathBuf,
}

/// Invokes the external schema compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCompiler {
    program: PathBuf,
    proto_paths: Vec<PathBuf>,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOC)
    }
}

impl SchemaCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            proto_paths: Vec::new(),
        }
    }

    /// Extra include directories passed as `--proto_path`.
    pub fn with_proto_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.proto_paths.extend(paths);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Directory the compiler runs in for `schema`.
    fn out_dir(schema: &Path) -> PathBuf {
        match schema.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Descriptor set path for `schema`: `<dir>/<stem>.desc`.
    pub fn descriptor_path(schema: &Path) -> PathBuf {
        let stem = schema
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "schema".to_string());
        Self::out_dir(schema).join(format!("{}.desc", stem))
    }

    /// Arguments for compiling `schema`, relative to its directory.
    pub fn args(&self, schema: &Path, languages: &[String]) -> Result<Vec<OsString>> {
        let file_name = schema.file_name().ok_or_else(|| {
            Root2pbError::config(format!("schema path {} has no file name", schema.display()))
        })?;
        let descriptor = Self::descriptor_path(schema);
        let descriptor_name = descriptor.file_name().unwrap_or(file_name);

        let mut args: Vec<OsString> = vec!["--proto_path=.".into()];
        for path in &self.proto_paths {
            let mut arg = OsString::from("--proto_path=");
            arg.push(path);
            args.push(arg);
        }
        for lang in languages {
            args.push(format!("--{}_out=.", lang).into());
        }
        let mut arg = OsString::from("--descriptor_set_out=");
        arg.push(descriptor_name);
        args.push(arg);
        args.push(file_name.to_os_string());
        Ok(args)
    }

    /// Compile `schema` for `languages` and emit its descriptor set next to
    /// it. The compiler's output streams are inherited.
    pub async fn compile(&self, schema: &Path, languages: &[String]) -> Result<CompileOutput> {
        let out_dir = Self::out_dir(schema);
        let args = self.args(schema, languages)?;
        let program = self.program.display().to_string();

        info!(
            program = %program,
            schema = %schema.display(),
            languages = ?languages,
            "Compiling schema"
        );
        debug!(args = ?args, cwd = %out_dir.display(), "protoc invocation");

        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| Root2pbError::ToolLaunch {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(Root2pbError::ToolFailed {
                program,
                status: status.to_string(),
            });
        }

        Ok(CompileOutput {
            descriptor: Self::descriptor_path(schema),
            out_dir,
        })
    }
}
