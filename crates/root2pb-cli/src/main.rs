//! root2pb CLI - Main entry point

use clap::{CommandFactory, Parser};
use root2pb_cli::commands::convert::ConvertOptions;
use root2pb_cli::commands::generate::GenerateOptions;
use root2pb_cli::{Cli, CliError, Commands, Config};
use root2pb_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    let Some(command) = &cli.command else {
        let _ = Cli::command().print_help();
        process::exit(1);
    };

    // Verbose mode logs debug to the console, normal mode only warnings
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("root2pb")
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // Initialize logging (ignore errors as CLI should work without logging)
    let _ = init_logging(&log_config);

    let config = Config::from_env();

    // Execute command
    let result = execute_command(&config, command, cli.verbose).await;

    // Handle result
    if let Err(e) = result {
        if let CliError::MissingArgument(flag) = &e {
            eprintln!("Error: {} is required", flag);
            eprintln!();
            print_usage(command);
            process::exit(1);
        }
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(
    config: &Config,
    command: &Commands,
    verbose: bool,
) -> root2pb_cli::Result<()> {
    match command {
        Commands::Generate {
            file,
            tree,
            output,
            branches,
            package,
            message,
            languages,
            convert,
            convert_mode,
            data_output,
            max_entries,
            framing,
            keep_workspace,
        } => {
            let options = GenerateOptions {
                file: file.clone(),
                tree: tree.clone(),
                output: output.clone(),
                branches: branches.clone(),
                package: package.clone(),
                message: message.clone(),
                languages: languages.clone(),
                convert: *convert,
                convert_mode: *convert_mode,
                data_output: data_output.clone(),
                max_entries: *max_entries,
                framing: (*framing).into(),
                keep_workspace: *keep_workspace,
            };
            root2pb_cli::commands::generate::run(config, options, verbose).await
        },

        Commands::Inspect {
            file,
            tree,
            branches,
            json,
        } => {
            root2pb_cli::commands::inspect::run(file.as_deref(), tree.as_deref(), branches, *json)
                .await
        },

        Commands::Convert {
            descriptor,
            file,
            tree,
            message,
            max_entries,
            output,
            framing,
        } => {
            let options = ConvertOptions {
                descriptor: descriptor.clone(),
                file: file.clone(),
                tree: tree.clone(),
                message: message.clone(),
                max_entries: *max_entries,
                output: output.clone(),
                framing: (*framing).into(),
            };
            root2pb_cli::commands::convert::run(options, verbose).await
        },
    }
}

/// Print the usage line of the failed subcommand to stderr.
fn print_usage(command: &Commands) {
    let name = match command {
        Commands::Generate { .. } => "generate",
        Commands::Inspect { .. } => "inspect",
        Commands::Convert { .. } => "convert",
    };
    let mut cmd = Cli::command();
    cmd.build();
    if let Some(sub) = cmd.find_subcommand_mut(name) {
        eprintln!("{}", sub.render_usage());
        eprintln!();
        eprintln!("For more information, try '--help'.");
    }
}
