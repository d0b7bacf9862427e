//! root2pb CLI Library
//!
//! Command-line interface for turning ROOT-style trees into protobuf
//! schemas and data files.
//!
//! # Overview
//!
//! - **Schema generation**: emit a `.proto` for a tree, compile it with
//!   `protoc` and optionally convert the data (`root2pb generate`)
//! - **Inspection**: list branches with their mapped types and selection
//!   decisions (`root2pb inspect`)
//! - **Conversion**: stream a tree into a `.pbuf` file from a compiled
//!   descriptor set (`root2pb convert`)

pub mod commands;
pub mod config;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand, ValueEnum};
use root2pb_core::Framing;

/// root2pb - ROOT trees to protocol buffers
#[derive(Parser, Debug)]
#[command(name = "root2pb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the full command reference as Markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a .proto schema from a tree, optionally compiling and converting it
    Generate {
        /// Path to the input data file
        #[arg(short, long)]
        file: Option<String>,

        /// Name of the tree to convert
        #[arg(short, long)]
        tree: Option<String>,

        /// Path to the output .proto file
        #[arg(short, long, default_value = "event.proto")]
        output: String,

        /// Comma-separated branch selection, e.g. "+el_*,-el_internal*"
        #[arg(short, long, default_value = "")]
        branches: String,

        /// Protobuf package of the generated schema
        #[arg(long)]
        package: Option<String>,

        /// Name of the generated data message
        #[arg(long)]
        message: Option<String>,

        /// protoc output languages, e.g. "cpp,python"
        #[arg(long = "gen", value_name = "LANGS", value_delimiter = ',')]
        languages: Vec<String>,

        /// Convert the tree into a .pbuf data file after compiling the schema
        #[arg(long)]
        convert: bool,

        /// Where the conversion runs
        #[arg(long, value_enum, default_value_t = ConvertModeArg::InProcess)]
        convert_mode: ConvertModeArg,

        /// Path of the data file (defaults to <schema dir>/<input stem>.pbuf)
        #[arg(long)]
        data_output: Option<String>,

        /// Number of entries to convert (negative for all)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        max_entries: i64,

        /// Record framing of the data file
        #[arg(long, value_enum, default_value_t = FramingArg::Concatenated)]
        framing: FramingArg,

        /// Leave the subprocess conversion workspace on disk
        #[arg(long)]
        keep_workspace: bool,
    },

    /// List the branches of a tree with their mapped protobuf types
    Inspect {
        /// Path to the input data file
        #[arg(short, long)]
        file: Option<String>,

        /// Name of the tree to inspect
        #[arg(short, long)]
        tree: Option<String>,

        /// Comma-separated branch selection
        #[arg(short, long, default_value = "")]
        branches: String,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a tree into protobuf records using a compiled descriptor set
    Convert {
        /// Descriptor set written by protoc --descriptor_set_out
        #[arg(short, long)]
        descriptor: String,

        /// Path to the input data file
        #[arg(short, long)]
        file: Option<String>,

        /// Name of the tree to convert
        #[arg(short, long)]
        tree: Option<String>,

        /// Data message to fill (discovered next to DataHeader when omitted)
        #[arg(long)]
        message: Option<String>,

        /// Number of entries to convert (negative for all)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        max_entries: i64,

        /// Path of the data file (defaults to <descriptor dir>/<input stem>.pbuf)
        #[arg(short, long)]
        output: Option<String>,

        /// Record framing of the data file
        #[arg(long, value_enum, default_value_t = FramingArg::Concatenated)]
        framing: FramingArg,
    },
}

/// Where `generate --convert` runs the conversion engine
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertModeArg {
    /// On a worker thread of this process
    InProcess,
    /// As a `root2pb convert` child process in a temporary workspace
    Subprocess,
}

/// Record framing of the data file
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramingArg {
    /// Records back to back
    Concatenated,
    /// Each record preceded by its varint length
    LengthDelimited,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Concatenated => Framing::Concatenated,
            FramingArg::LengthDelimited => Framing::LengthDelimited,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["root2pb", "generate", "-f", "a.json", "-t", "events"]).unwrap();
        let Some(Commands::Generate {
            output,
            languages,
            max_entries,
            convert_mode,
            framing,
            ..
        }) = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(output, "event.proto");
        assert!(languages.is_empty());
        assert_eq!(max_entries, -1);
        assert_eq!(convert_mode, ConvertModeArg::InProcess);
        assert_eq!(framing, FramingArg::Concatenated);
    }

    #[test]
    fn test_gen_list_and_negative_entries() {
        let cli = Cli::try_parse_from([
            "root2pb",
            "generate",
            "--gen",
            "cpp,python",
            "--max-entries",
            "-1",
            "--framing",
            "length-delimited",
        ])
        .unwrap();
        let Some(Commands::Generate {
            languages,
            max_entries,
            framing,
            ..
        }) = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(languages, vec!["cpp".to_string(), "python".to_string()]);
        assert_eq!(max_entries, -1);
        assert_eq!(Framing::from(framing), Framing::LengthDelimited);
    }

    #[test]
    fn test_framing_names_match_convert_args() {
        for framing in [Framing::Concatenated, Framing::LengthDelimited] {
            let arg = FramingArg::from_str(&framing.to_string(), false).unwrap();
            assert_eq!(Framing::from(arg), framing);
        }
    }
}
