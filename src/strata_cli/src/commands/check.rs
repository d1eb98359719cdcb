use anyhow::bail;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use strata_analysis::diagnostics::render::render;
use strata_analysis::{Loader, LoaderOptions, SchemaRegistry};
use strata_syntax::source::SourceRegistry;

#[derive(Args)]
pub struct CheckArgs {
    /// Entry schema file
    pub input: PathBuf,

    /// Directory all imports must live under; defaults to the entry file's
    /// directory
    #[arg(long)]
    pub module_root: Option<PathBuf>,

    /// Emit diagnostics as JSON instead of rendered text
    #[arg(long)]
    pub json: bool,

    /// Maximum number of diagnostics to keep
    #[arg(long, default_value_t = 256)]
    pub max_diagnostics: usize,
}

pub fn execute(args: CheckArgs) -> anyhow::Result<()> {
    let options = LoaderOptions {
        module_root: args.module_root.clone(),
        diagnostic_limit: args.max_diagnostics,
        ..LoaderOptions::default()
    };
    let mut loader = Loader::new(
        Arc::new(SourceRegistry::new()),
        Arc::new(SchemaRegistry::new()),
        options,
    );

    let outcome = loader.load_path(&args.input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.diagnostics)?);
    } else {
        for diagnostic in outcome.diagnostics.iter() {
            eprint!("{}", render(diagnostic, loader.sources()));
        }
    }

    match outcome.schema {
        Some(schema) => {
            log::info!(
                "{}: schema {:?} with {} type(s), {} datatype(s)",
                args.input.display(),
                schema.name(),
                schema.types().len(),
                schema.data_types().len()
            );
            Ok(())
        }
        None => bail!(
            "{} failed with {} error(s)",
            args.input.display(),
            outcome.diagnostics.error_count()
        ),
    }
}
