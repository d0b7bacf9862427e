//! Configuration management for the root2pb CLI
//!
//! Settings come from environment variables (a `.env` file in the working
//! directory is loaded first); command-line flags override them.

use regex::{Captures, Regex};
use root2pb_core::protoc::{SchemaCompiler, DEFAULT_PROTOC};
use std::path::PathBuf;
use std::sync::OnceLock;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default protobuf package of generated schemas.
pub const DEFAULT_PACKAGE: &str = "root2pb";

/// Default name of the generated data message.
pub const DEFAULT_MESSAGE: &str = "Event";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Schema compiler program (`PROTOC`)
    pub protoc: PathBuf,

    /// Extra include directories for protoc (`ROOT2PB_PROTO_PATH`)
    pub proto_paths: Vec<PathBuf>,

    /// Package of generated schemas (`ROOT2PB_PACKAGE`)
    pub package: String,

    /// Data message name (`ROOT2PB_MESSAGE`)
    pub message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protoc: PathBuf::from(DEFAULT_PROTOC),
            proto_paths: Vec::new(),
            package: DEFAULT_PACKAGE.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

impl Config {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(protoc) = lookup("PROTOC").filter(|v| !v.is_empty()) {
            config.protoc = PathBuf::from(protoc);
        }

        if let Some(paths) = lookup("ROOT2PB_PROTO_PATH") {
            config.proto_paths = paths
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }

        if let Some(package) = lookup("ROOT2PB_PACKAGE").filter(|v| !v.is_empty()) {
            config.package = package;
        }

        if let Some(message) = lookup("ROOT2PB_MESSAGE").filter(|v| !v.is_empty()) {
            config.message = message;
        }

        config
    }

    /// Schema compiler configured with the program and include paths.
    pub fn compiler(&self) -> SchemaCompiler {
        SchemaCompiler::new(&self.protoc).with_proto_paths(self.proto_paths.iter().cloned())
    }
}

fn env_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("Invalid env reference pattern")
    })
}

/// Replace `$VAR` and `${VAR}` with the variable's value, or with nothing
/// when it is unset.
pub fn expand_env(input: &str) -> String {
    expand_with(input, |key| std::env::var(key).ok())
}

/// [`expand_env`] over an arbitrary lookup.
pub fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    env_reference()
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}
