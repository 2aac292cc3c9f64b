mod adapter;
mod cache;
mod commands;
mod config;
mod diagnostics;
mod error;
mod grammar;
mod info;
mod inspect;
mod logging;
mod provider;
mod resolver;
mod scope;
mod server;
#[cfg(test)]
mod testing;
mod tree;
mod types;
mod validators;

use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::provider::Provider;
use crate::types::Position;

/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "nodescope",
    version,
    about = "Resolve positions and selections to syntax tree nodes and scopes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Log level or filter directive (overrides RUST_LOG and the config file)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    /// Disable colored diagnostics and logs
    #[arg(long, global = true)]
    no_color: bool,
}

/// Subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Dump the top-level nodes of a file
    Analyze {
        /// Levels of nesting to print
        #[arg(long, default_value_t = inspect::DEFAULT_DEPTH)]
        depth: usize,
        /// Source file
        file: PathBuf,
        /// Grammar name, instead of the file extension
        #[arg(long)]
        language: Option<String>,
    },
    /// List the arguments of the single function defined in a file
    Args {
        /// Source file
        file: PathBuf,
        /// Grammar name, instead of the file extension
        #[arg(long)]
        language: Option<String>,
    },
    /// Show the reference document: commands, languages, methods, config
    Info,
    /// List callable methods, or describe one
    Methods {
        /// Print the help text of this method instead
        #[arg(long, value_name = "NAME")]
        describe: Option<String>,
        /// Only list methods that accept this file
        file: Option<PathBuf>,
        /// Grammar name, instead of the file extension
        #[arg(long)]
        language: Option<String>,
    },
    /// Show the innermost node at ROW:COL
    Point {
        /// Source file
        file: PathBuf,
        /// Grammar name, instead of the file extension
        #[arg(long)]
        language: Option<String>,
        /// One-based ROW:COL
        position: Position,
    },
    /// Show the node or sibling run covering START..=END
    Region {
        /// Last position of the selection, ROW:COL
        #[arg(index = 3)]
        end: Position,
        /// Source file
        #[arg(index = 1)]
        file: PathBuf,
        /// Grammar name, instead of the file extension
        #[arg(long)]
        language: Option<String>,
        /// First position of the selection, ROW:COL
        #[arg(index = 2)]
        start: Position,
    },
    /// Show the scopes enclosing ROW:COL, innermost first
    Scopes {
        /// Source file
        file: PathBuf,
        /// Grammar name, instead of the file extension
        #[arg(long)]
        language: Option<String>,
        /// One-based ROW:COL
        position: Position,
    },
    /// Answer JSON-lines requests on stdio, or on TCP with --port
    Serve {
        /// Listen on 127.0.0.1:PORT (0 picks a free port, printed first)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    return match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e, color);
            match e {
                error::Error::Validation { .. } => ExitCode::from(2),
                _ => ExitCode::from(3),
            }
        }
    };
}

/// Load config, set up logging, and dispatch the subcommand.
///
/// # Errors
///
/// Returns errors from config loading, logging setup, or the command.
fn run(cli: Cli) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let logging = logging::init(cli.no_color, cli.log_level.as_deref(), config.log_level.as_deref())?;

    let provider = Provider::new(config, Some(logging));
    let json = cli.json;
    return match cli.command {
        Commands::Analyze { depth, file, language } => {
            commands::analyze(&provider, &file, language.as_deref(), depth, json)
        }
        Commands::Args { file, language } => commands::args(&provider, &file, language.as_deref(), json),
        Commands::Info => {
            commands::info(json, provider.config());
            Ok(())
        }
        Commands::Methods { describe, file, language } => {
            commands::methods(&provider, file.as_deref(), language.as_deref(), describe.as_deref(), json)
        }
        Commands::Point { file, language, position } => {
            commands::point(&provider, &file, language.as_deref(), position, json)
        }
        Commands::Region { end, file, language, start } => {
            commands::region(&provider, &file, language.as_deref(), start, end, json)
        }
        Commands::Scopes { file, language, position } => {
            commands::scopes(&provider, &file, language.as_deref(), position, json)
        }
        Commands::Serve { port } => commands::serve(provider, port),
    };
}
