// File: src/main.rs
//
// Main entry point for the DMO interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run or dump). Programs are read as JSON ASTs produced by an
// external DMO front end.

use clap::{Parser as ClapParser, Subcommand};
use dmo::ast::{program_from_json, Node};
use dmo::config::{InterpreterConfig, ScopeFallback};
use dmo::errors::DmoError;
use dmo::interpreter::Interpreter;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code when the program or configuration cannot be loaded
const EXIT_LOAD_FAILURE: i32 = 1;
/// Exit code under `--strict` when runtime errors were reported
const EXIT_RUNTIME_ERRORS: i32 = 2;

#[derive(ClapParser)]
#[command(
    name = "dmo",
    about = "DMO: a tree-walking interpreter for the Diamond scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Log filter, e.g. `debug` or `dmo::interpreter=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a DMO program
    Run {
        /// Path to the program's JSON AST (.dmo.json)
        file: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the SVG produced by graphics calls to this file
        #[arg(long)]
        svg: Option<PathBuf>,

        /// How far variable and function lookups fall back through callers
        #[arg(long, value_enum)]
        fallback: Option<ScopeFallback>,

        /// Maximum nesting of function calls
        #[arg(long)]
        max_call_depth: Option<usize>,

        /// Extra directory to search for modules (repeatable)
        #[arg(long = "module-path", short = 'I')]
        module_paths: Vec<PathBuf>,

        /// Exit with status 2 if any runtime error was reported
        #[arg(long)]
        strict: bool,

        /// Do not print runtime error reports to stderr
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print a program's AST as an indented tree
    Dump {
        /// Path to the program's JSON AST (.dmo.json)
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Run {
            file,
            config,
            svg,
            fallback,
            max_call_depth,
            module_paths,
            strict,
            quiet,
        } => {
            let mut config = match config {
                Some(path) => load_or_exit(InterpreterConfig::load(&path)),
                None => InterpreterConfig::default(),
            };
            if let Some(svg) = svg {
                config.svg_output = Some(svg);
            }
            if let Some(fallback) = fallback {
                config.scope_fallback = fallback;
            }
            if let Some(depth) = max_call_depth {
                config.max_call_depth = depth;
            }
            config.module_paths.extend(module_paths);
            config.echo_diagnostics = !quiet;

            let program = load_or_exit(load_program(&file));
            let mut interpreter = Interpreter::with_config(config);
            interpreter.set_source_file(file.display().to_string());
            let outcome = interpreter.interpret(&program);

            if strict && !outcome.is_clean() {
                eprintln!("{} runtime error(s) reported", outcome.error_count);
                process::exit(EXIT_RUNTIME_ERRORS);
            }
        }

        Commands::Dump { file } => {
            let program = load_or_exit(load_program(&file));
            print!("{}", program.dump());
        }
    }
}

/// Installs the stderr log subscriber. Quiet unless asked for.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();
}

fn load_program(path: &Path) -> Result<Node, DmoError> {
    let source = fs::read_to_string(path).map_err(|e| {
        DmoError::parse_error(format!("Failed to read {}: {}", path.display(), e))
    })?;
    program_from_json(&source)
}

fn load_or_exit<T>(result: Result<T, DmoError>) -> T {
    result.unwrap_or_else(|error| {
        eprint!("{}", error);
        process::exit(EXIT_LOAD_FAILURE);
    })
}
