use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use geofeed::cluster::config::DEFAULT_MARKER_RADIUS_PX;
use geofeed::geo::mean_latitude;
use geofeed::io::{read_items, write_json, write_json_to_writer};
use geofeed::{
    cluster_items, score_items, Clock, ClusterConfig, EngineConfig, FixedClock, SystemClock,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Cluster and rank location-tagged items from a JSON file.
#[derive(Debug, Parser)]
#[command(name = "geofeed", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Partition items into large clusters, small clusters and single items.
    Cluster(ClusterArgs),
    /// Order items for feed display, best first.
    Rank(RankArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// JSON array of items.
    #[arg(short, long)]
    input: PathBuf,
    /// Engine configuration in TOML.
    #[arg(short, long, env = "GEOFEED_CONFIG")]
    config: Option<PathBuf>,
    /// Write JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ClusterArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Connection distance in meters.
    #[arg(long)]
    threshold: Option<f64>,
    /// Minimum membership rendered as a circle.
    #[arg(long)]
    min_for_circle: Option<usize>,
    /// Radius padding in meters.
    #[arg(long)]
    padding: Option<f64>,
    /// Derive the threshold from a map zoom level instead.
    #[arg(long, conflicts_with = "threshold")]
    zoom: Option<f64>,
    /// Marker radius in pixels used with --zoom.
    #[arg(long, default_value_t = DEFAULT_MARKER_RADIUS_PX)]
    marker_radius: f64,
}

#[derive(Debug, Args)]
struct RankArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Rank as of this RFC 3339 instant instead of the current time.
    #[arg(long)]
    now: Option<DateTime<Utc>>,
    /// Keep only the best N items.
    #[arg(long)]
    limit: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        let mut source = err.source();
        while let Some(inner) = source {
            eprintln!("  caused by: {inner}");
            source = inner.source();
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Cluster(args) => run_cluster(args),
        Command::Rank(args) => run_rank(args),
    }
}

fn load_engine_config(common: &CommonArgs) -> CliResult<EngineConfig> {
    match &common.config {
        Some(path) => {
            info!(path = %path.display(), "loading engine configuration");
            Ok(EngineConfig::load(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn run_cluster(args: ClusterArgs) -> CliResult<()> {
    let engine = load_engine_config(&args.common)?;
    let items = read_items(&args.common.input)?;

    let mut config = engine.clustering;
    if let Some(zoom) = args.zoom {
        let positions: Vec<_> = items.iter().map(|item| item.position).collect();
        let latitude = mean_latitude(&positions);
        config.threshold_meters =
            ClusterConfig::for_zoom(zoom, latitude, args.marker_radius).threshold_meters;
    }
    if let Some(threshold) = args.threshold {
        config.threshold_meters = threshold;
    }
    if let Some(min_for_circle) = args.min_for_circle {
        config.min_for_circle = min_for_circle;
    }
    if let Some(padding) = args.padding {
        config.radius_padding_meters = padding;
    }
    config.validate()?;

    let start = Instant::now();
    let partition = cluster_items(&items, &config);
    info!(
        items = items.len(),
        threshold_meters = config.threshold_meters,
        large = partition.large_clusters.len(),
        small = partition.small_clusters.len(),
        unclustered = partition.unclustered.len(),
        elapsed = ?start.elapsed(),
        "clustered items"
    );

    emit(&args.common, &partition)
}

fn run_rank(args: RankArgs) -> CliResult<()> {
    let engine = load_engine_config(&args.common)?;
    let items = read_items(&args.common.input)?;

    let clock: Box<dyn Clock> = match args.now {
        Some(now) => Box::new(FixedClock::new(now)),
        None => Box::new(SystemClock),
    };
    let now = clock.now();

    let start = Instant::now();
    let mut ranked = score_items(&items, &engine.ranking, now);
    if let Some(limit) = args.limit {
        ranked.truncate(limit);
    }
    info!(
        items = items.len(),
        returned = ranked.len(),
        now = %now.to_rfc3339(),
        elapsed = ?start.elapsed(),
        "ranked items"
    );

    emit(&args.common, &ranked)
}

fn emit<T: serde::Serialize>(common: &CommonArgs, value: &T) -> CliResult<()> {
    match &common.output {
        Some(path) => write_json(path, value)?,
        None => write_json_to_writer(io::stdout().lock(), value)?,
    }
    Ok(())
}
