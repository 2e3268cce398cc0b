#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use claimlens::cli::app::{Cli, Command, RuntimeArgs};
use claimlens::cli::commands;
use claimlens::config::RuntimePaths;
use claimlens::models::CommandEnvelopeFailure;
use clap::Parser;
use clap::error::ErrorKind;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_COMMAND_FAILURE: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(&error),
    };
    let command_name = cli.command.name();
    println!("claimlens: starting `{command_name}`");

    match execute(cli) {
        Ok(()) => {
            println!("claimlens: completed `{command_name}` (exit_code={EXIT_SUCCESS})");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            eprintln!("claimlens: failed `{command_name}` (exit_code={exit_code})");
            eprintln!("{error:#}");
            exit_code
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
    match cli.command {
        Command::Render(args) => commands::render::run(&args, &runtime_paths),
        Command::Sql(args) => commands::sql::run(&args, &runtime_paths),
        Command::Seed(args) => commands::seed::run(&args, &runtime_paths),
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<CommandEnvelopeFailure>().is_some() {
        EXIT_COMMAND_FAILURE
    } else {
        EXIT_RUNTIME_FAILURE
    }
}

fn exit_code_for_parse_error(error: &clap::Error) -> i32 {
    let _ = error.print();
    if matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
        EXIT_SUCCESS
    } else {
        EXIT_USAGE_ERROR
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    let warehouse_override = match &args.warehouse {
        Some(path) => Some(path.clone()),
        None => std::env::var_os(claimlens::config::WAREHOUSE_PATH_ENV).map(PathBuf::from),
    };

    claimlens::config::resolve_runtime_paths(&home_dir, &cwd, warehouse_override.as_deref())
}
