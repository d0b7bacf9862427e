//! Build automation tasks for root2pb
//!
//! This tool provides automation tasks for the root2pb project, including:
//! - Generating the CLI reference from the clap definitions

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for root2pb", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<root2pb_cli::Cli>();

    let content = format!(
        r#"# root2pb CLI Reference

This documentation is auto-generated from the CLI source code. Last updated: {}.

## Overview

root2pb derives a proto2 schema from the branches of a ROOT-style tree,
compiles it with `protoc`, and converts the tree entries into a `.pbuf`
data file: one `DataHeader` record followed by one data record per entry.

## Installation

```bash
cargo install --path crates/root2pb-cli
```

`protoc` must be on the `PATH` (or named by `PROTOC`) for `--gen` and
`--convert`.

## Quick Start

```bash
# Look at the branches and what they map to
root2pb inspect -f events.json -t events

# Write event.proto for every branch except internal ones
root2pb generate -f events.json -t events -b "+*,-internal*"

# Compile it for C++ and Python and convert all entries
root2pb generate -f events.json -t events --gen cpp,python --convert

# Convert again later from the compiled descriptor set
root2pb convert -d event.desc -f events.json -t events --max-entries 100
```

## Commands

{}

## Environment Variables

- `PROTOC` - Path of the protobuf compiler (default: `protoc`)
- `ROOT2PB_PROTO_PATH` - Extra `--proto_path` directories, `:`-separated
- `ROOT2PB_PACKAGE` - Default package of generated schemas (default: `root2pb`)
- `ROOT2PB_MESSAGE` - Default data message name (default: `Event`)
- `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR`, `LOG_FILE_PREFIX`, `LOG_FILTER` - Logging overrides

Paths given on the command line may reference variables as `$VAR` or `${{VAR}}`.
A `.env` file in the working directory is loaded first.

## Input Files

Trees are read from JSON dumps (`.json` or `.json.gz`):

```json
{{"trees": [{{"name": "events", "branches": [
  {{"name": "el_n", "leaf_type": "Int_t", "values": [2, 0]}},
  {{"name": "el_eta", "class_name": "vector<float>", "values": [[0.1, -1.2], []]}}
]}}]}}
```

---

*To update, run `cargo run --manifest-path xtask/Cargo.toml -- generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
