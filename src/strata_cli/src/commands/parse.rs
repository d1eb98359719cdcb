use anyhow::{Context, bail};
use clap::Args;
use std::path::PathBuf;
use strata_parser::Parser;
use strata_syntax::source::SourceId;

#[derive(Args)]
pub struct ParseArgs {
    /// Schema file to parse
    pub input: PathBuf,

    /// Emit compact JSON instead of pretty-printed output
    #[arg(long)]
    pub compact: bool,
}

pub fn execute(args: ParseArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let id = SourceId::file(&args.input);
    match Parser::new().parse(&id, &text) {
        Ok(decl) => {
            let json = if args.compact {
                serde_json::to_string(&decl)?
            } else {
                serde_json::to_string_pretty(&decl)?
            };
            println!("{json}");
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure.render(&text));
            bail!("failed to parse {}", args.input.display());
        }
    }
}
