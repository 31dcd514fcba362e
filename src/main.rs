use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cricket_markets::cache::MatchCache;
use cricket_markets::config::{EngineConfig, parse_custom_line};
use cricket_markets::pipeline::{CorpusReport, MatchSource, analyze_corpus};
use cricket_markets::synthetic::generate_corpus;

#[derive(Parser)]
#[command(name = "cricket_markets")]
#[command(about = "Aggregate ball-by-ball cricket match files into market statistics", long_about = None)]
struct Cli {
    /// Match JSON files or directories of them
    inputs: Vec<PathBuf>,

    /// Which part of the report to print
    #[arg(long, value_enum, default_value = "all")]
    report: ReportKind,

    /// Extra over/under line, e.g. total_runs=345.5 (repeatable)
    #[arg(long = "line", value_name = "MARKET=VALUE")]
    lines: Vec<String>,

    /// Also build per-team ball outcome tables
    #[arg(long)]
    team_wise: bool,

    /// Memoize per-match results in the user cache dir
    #[arg(long)]
    cache: bool,

    /// Extract matches on the current thread only
    #[arg(long)]
    sequential: bool,

    /// Analyze N generated matches instead of reading files
    #[arg(long, value_name = "N")]
    demo: Option<usize>,

    /// Seed for --demo
    #[arg(long, default_value_t = 2024)]
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    All,
    Summaries,
    Players,
    Markets,
    Markov,
    Venues,
    Teams,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let cli = Cli::parse();
    let mut config = EngineConfig::from_env().context("read engine config from env")?;
    if cli.team_wise {
        config.team_wise = true;
    }
    if cli.cache {
        config.cache = true;
    }
    if cli.sequential {
        config.parallel = false;
    }
    for raw in &cli.lines {
        let line = parse_custom_line(raw).with_context(|| format!("bad --line {raw}"))?;
        config.custom_lines.push(line);
    }
    if !matches!(cli.report, ReportKind::All | ReportKind::Summaries) {
        config.ball_rows = false;
    }

    let sources = match cli.demo {
        Some(n) => generate_corpus(cli.seed, n),
        None => {
            if cli.inputs.is_empty() {
                bail!("no input files given (pass paths or --demo N)");
            }
            load_sources(&cli.inputs)?
        }
    };
    info!(matches = sources.len(), "loaded match sources");

    let mut cache = config.cache.then(|| MatchCache::load(config.cache_path.clone()));
    let report = analyze_corpus(&sources, &config, cache.as_mut())?;
    if let Some(cache) = cache.as_mut() {
        match cache.save() {
            Ok(()) => debug!(path = ?cache.path(), entries = cache.len(), "match cache saved"),
            Err(err) => warn!("match cache not saved: {err:#}"),
        }
    }

    print_report(&report, cli.report)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cricket_markets=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn load_sources(inputs: &[PathBuf]) -> Result<Vec<MatchSource>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = fs::read_dir(input)
                .with_context(|| format!("read dir {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
                .collect::<Vec<_>>();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }

    paths
        .iter()
        .map(|path| {
            let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            Ok(MatchSource::new(source_id(path), raw))
        })
        .collect()
}

fn source_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_report(report: &CorpusReport, kind: ReportKind) -> Result<()> {
    #[derive(Serialize)]
    struct Players<'a> {
        batting: &'a [cricket_markets::players::BattingRow],
        bowling: &'a [cricket_markets::players::BowlingRow],
    }

    #[derive(Serialize)]
    struct Summaries<'a> {
        diagnostics: &'a [cricket_markets::pipeline::MatchDiagnostic],
        summaries: &'a [cricket_markets::match_rows::MatchSummaryRow],
        overview: &'a [cricket_markets::match_rows::MatchOverviewRow],
        balls: &'a [cricket_markets::match_rows::BallRow],
    }

    #[derive(Serialize)]
    struct Markov<'a> {
        markov: &'a cricket_markets::markov::MarkovReport,
        transition_table: &'a [cricket_markets::markov::TransitionRow],
    }

    let json = match kind {
        ReportKind::All => serde_json::to_string_pretty(report),
        ReportKind::Summaries => serde_json::to_string_pretty(&Summaries {
            diagnostics: &report.diagnostics,
            summaries: &report.summaries,
            overview: &report.overview,
            balls: &report.balls,
        }),
        ReportKind::Players => serde_json::to_string_pretty(&Players {
            batting: &report.batting,
            bowling: &report.bowling,
        }),
        ReportKind::Markets => serde_json::to_string_pretty(&report.markets),
        ReportKind::Markov => serde_json::to_string_pretty(&Markov {
            markov: &report.markov,
            transition_table: &report.transition_table,
        }),
        ReportKind::Venues => serde_json::to_string_pretty(&report.venues),
        ReportKind::Teams => serde_json::to_string_pretty(&report.teams),
    }
    .context("serialize report")?;

    let mut out = io::stdout().lock();
    writeln!(out, "{json}").context("write report")?;
    Ok(())
}
