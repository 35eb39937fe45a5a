use crate::{OrderingArg, load_config};
use anyhow::{Context, Result};
use clap::Args;
use gaptrack_core::{
    boundary::RowPosition,
    config::TrackerConfig,
    gap::GapSet,
    obs::metrics_report,
    tracker::{MemoryTable, Poller},
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{RngCore, SeedableRng},
};
use serde::Serialize;
use std::path::PathBuf;

const BASE_WEIGHT: f64 = 10_000.0;
const BASE_CREATE_TIME: i64 = 100_000;

///
/// SimulateArgs
///

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// Tracker config file (TOML); flags below override it
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for row arrivals
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of poll cycles
    #[arg(long, default_value_t = 1000)]
    cycles: usize,

    /// Rows present before the first poll
    #[arg(long, default_value_t = 20)]
    initial_rows: u32,

    /// Upper bound (exclusive) on rows arriving between polls
    #[arg(long, default_value_t = 20)]
    max_arrivals: u32,

    /// Gap capacity; 0 disables eviction
    #[arg(long)]
    limit: Option<usize>,

    /// Rows fetched per poll
    #[arg(long)]
    batch_size: Option<usize>,

    /// Boundary comparator
    #[arg(long, value_enum)]
    ordering: Option<OrderingArg>,

    /// Emit one JSON object per cycle instead of text
    #[arg(long)]
    json: bool,
}

impl SimulateArgs {
    fn tracker_config(&self) -> Result<TrackerConfig> {
        let mut config = load_config(self.config.as_ref())?;
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(ordering) = self.ordering {
            config.ordering = ordering.into();
        }
        config.validate().context("invalid simulation settings")?;

        Ok(config)
    }
}

///
/// RowFeed
///
/// Seeded stand-in for a live table: every arrival is heavier and newer
/// than the last.
///

struct RowFeed {
    rng: ChaCha8Rng,
    next_id: i64,
    category: String,
}

impl RowFeed {
    fn new(seed: u64, category: &str) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 1,
            category: category.to_string(),
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn push(&mut self, table: &mut MemoryTable, count: u32) {
        for _ in 0..count {
            let id = self.next_id;
            table.insert(
                self.category.as_str(),
                RowPosition::new(id, BASE_WEIGHT + id as f64, BASE_CREATE_TIME + id),
            );
            self.next_id += 1;
        }
    }

    fn arrivals(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.rng.next_u32() % max
    }
}

///
/// CycleReport
///

#[derive(Serialize)]
struct CycleReport<'a> {
    cycle: usize,
    arrivals: u32,
    query: String,
    fetched: Vec<i64>,
    gaps: Option<&'a GapSet>,
}

pub(crate) fn run(args: &SimulateArgs) -> Result<()> {
    let config = args.tracker_config()?;
    let columns = config.predicate_columns()?;
    let category = config.category.clone();

    let mut feed = RowFeed::new(args.seed, &category);
    let mut table = MemoryTable::new();
    feed.push(&mut table, args.initial_rows);
    let mut poller = Poller::from_config(&config, table);

    tracing::info!(
        seed = args.seed,
        cycles = args.cycles,
        limit = config.limit,
        batch_size = config.batch_size,
        ordering = ?config.ordering,
        "starting simulation"
    );

    for cycle in 0..args.cycles {
        let arrivals = feed.arrivals(args.max_arrivals);
        feed.push(poller.source_mut(), arrivals);

        let outcome = poller.poll_once(&category)?;
        let report = CycleReport {
            cycle,
            arrivals,
            query: outcome.predicate.select_sql(&config.table, &columns),
            fetched: outcome.fetched.iter().map(|row| row.resource_id).collect(),
            gaps: poller.tracker().gaps(&category),
        };

        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_text(&report);
        }
    }

    let summary = metrics_report(None);
    if let Some(counters) = summary.counters {
        tracing::info!(
            polls = counters.ops.poll_cycles,
            rows = counters.ops.rows_fetched,
            empty_polls = counters.ops.empty_polls,
            evictions = counters.ops.evictions,
            narrow_dropped = counters.ops.narrow_dropped,
            truncated = counters.ops.truncated,
            table_rows = poller.source().len(),
            "simulation finished"
        );
    }

    Ok(())
}

fn print_text(report: &CycleReport<'_>) {
    println!("cycle {} (+{} rows)", report.cycle, report.arrivals);
    println!("query: {}", report.query);
    if report.fetched.is_empty() {
        println!("fetched: nothing new");
    } else {
        println!("fetched: {:?}", report.fetched);
    }
    if let Some(gaps) = report.gaps {
        println!("{gaps}");
    }
    println!();
}

///
/// TESTS
///
