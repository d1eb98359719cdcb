use crate::commands::check::CheckArgs;
use crate::commands::parse::ParseArgs;
use crate::commands::{check, parse};
use clap::{Parser, Subcommand};
use std::env;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Strata schema language CLI", version, author)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a schema file and output the JSON representation of the parse tree
    Parse(Box<ParseArgs>),

    /// Load a schema with its imports and report diagnostics
    Check(Box<CheckArgs>),
}

pub fn run() -> anyhow::Result<()> {
    let os_args = env::args_os();
    let all_args =
        argfile::expand_args_from(os_args, argfile::parse_fromfile, argfile::PREFIX).unwrap();
    let cli = Cli::parse_from(all_args);

    match cli.command {
        Commands::Parse(args) => parse::execute(*args),

        Commands::Check(args) => check::execute(*args),
    }
}
