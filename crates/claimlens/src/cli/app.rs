use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{render::RenderArgs, seed::SeedArgs, sql::SqlArgs};

#[derive(Debug, Parser)]
#[command(name = "claimlens", version, about = "Claims warehouse explorer and analytics")]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub warehouse: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Render(RenderArgs),
    Sql(SqlArgs),
    Seed(SeedArgs),
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Command::Render(_) => "render",
            Command::Sql(_) => "sql",
            Command::Seed(_) => "seed",
        }
    }
}
