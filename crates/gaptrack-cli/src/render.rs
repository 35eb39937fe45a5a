use crate::{OrderingArg, load_config};
use anyhow::{Context, Result};
use clap::Args;
use gaptrack_core::{config::TrackerConfig, gap::GapSet, predicate::build_predicate};
use std::{
    io::Read as _,
    path::{Path, PathBuf},
};

///
/// RenderArgs
///

#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// JSON gap set to render; `-` reads stdin
    #[arg(value_name = "FILE", default_value = "-")]
    input: PathBuf,

    /// Tracker config supplying table and column names
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate the gap set under this comparator before rendering
    #[arg(long, value_enum)]
    check: Option<OrderingArg>,

    /// Wrap the condition in the full select statement
    #[arg(long)]
    select: bool,
}

pub(crate) fn run(args: &RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let source = read_source(&args.input)?;

    println!("{}", render(&source, &config, args.check, args.select)?);

    Ok(())
}

/// Decode a JSON gap set and render its predicate, or the full select
/// statement when `select` is set.
fn render(
    source: &str,
    config: &TrackerConfig,
    check: Option<OrderingArg>,
    select: bool,
) -> Result<String> {
    let columns = config.predicate_columns()?;
    let gaps: GapSet = serde_json::from_str(source).context("decoding gap set JSON")?;

    if let Some(ordering) = check {
        gaps.validate(ordering.into())
            .context("gap set failed validation")?;
    }

    let predicate = build_predicate(&gaps);
    tracing::debug!(
        category = gaps.category(),
        clauses = predicate.clauses.len(),
        "rendering predicate"
    );

    Ok(if select {
        predicate.select_sql(&config.table, &columns)
    } else {
        predicate.to_sql(&columns)
    })
}

fn read_source(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading gap set from stdin")?;
        return Ok(buf);
    }

    std::fs::read_to_string(input)
        .with_context(|| format!("reading gap set {}", input.display()))
}

///
/// TESTS
///
