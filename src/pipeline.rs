use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::MatchCache;
use crate::config::EngineConfig;
use crate::distribution::{MarketReport, summarize_book};
use crate::error::{EngineError, EngineResult};
use crate::grouping::{GroupBy, GroupLedger, GroupSummary, GroupTotals, TeamAggregate, VenueAggregate, group_contributions};
use crate::markets::{MarketBook, MatchMarkets, derive_match_markets};
use crate::markov::{BallEvent, MarkovReport, TransitionRow, flatten_match, markov_report};
use crate::match_rows::{
    BallRow, MatchOverviewRow, MatchSummaryRow, ball_rows, overview_row, sort_overview_rows, summary_row,
};
use crate::match_stats::{MatchStats, extract_match_stats};
use crate::model::{MatchRecord, parse_match_json};
use crate::players::{BattingRow, BowlingRow, PlayerLedger, PlayerMatchStat, batting_view, player_match_stats};

/// One match file: its identity and raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSource {
    pub id: String,
    pub raw: String,
}

impl MatchSource {
    pub fn new(id: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw: raw.into(),
        }
    }
}

/// Everything derived from a single match. Pure function of the match
/// content, so it can be built in parallel and memoized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub match_id: String,
    pub stats: MatchStats,
    pub summary: MatchSummaryRow,
    pub overview: MatchOverviewRow,
    pub balls: Vec<BallRow>,
    pub players: Vec<PlayerMatchStat>,
    pub markets: MatchMarkets,
    /// Legal deliveries; `match_index` is assigned when the corpus is merged.
    pub events: Vec<BallEvent>,
    pub overall_group: Vec<(String, GroupTotals)>,
    pub venue_group: Vec<(String, GroupTotals)>,
    pub team_group: Vec<(String, GroupTotals)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDiagnostic {
    pub match_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub files: usize,
    pub analyzed: usize,
    pub diagnostics: Vec<MatchDiagnostic>,
    pub summaries: Vec<MatchSummaryRow>,
    pub overview: Vec<MatchOverviewRow>,
    pub balls: Vec<BallRow>,
    pub batting: Vec<BattingRow>,
    pub bowling: Vec<BowlingRow>,
    pub markets: MarketReport,
    pub markov: MarkovReport,
    pub transition_table: Vec<TransitionRow>,
    pub overall: Option<GroupSummary>,
    pub venues: Vec<VenueAggregate>,
    pub teams: Vec<TeamAggregate>,
}

pub fn analyze_record(record: &MatchRecord) -> MatchAnalysis {
    let stats = extract_match_stats(record);
    let players = player_match_stats(record);
    let batting = batting_view(&players);
    MatchAnalysis {
        match_id: record.match_id.clone(),
        summary: summary_row(record, &stats, &batting),
        overview: overview_row(record, &stats),
        balls: ball_rows(record),
        markets: derive_match_markets(record, &stats),
        events: flatten_match(0, record),
        overall_group: group_contributions(record, &stats, GroupBy::Overall),
        venue_group: group_contributions(record, &stats, GroupBy::Venue),
        team_group: group_contributions(record, &stats, GroupBy::Team),
        players,
        stats,
    }
}

pub fn analyze_match(source: &MatchSource) -> EngineResult<MatchAnalysis> {
    let record = parse_match_json(&source.id, &source.raw)?;
    Ok(analyze_record(&record))
}

fn with_extract_pool<T>(threads: Option<usize>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    let Some(threads) = threads else {
        return action();
    };
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(err) => {
            warn!("extract pool build failed, using global pool: {err}");
            action()
        }
    }
}

/// Run the whole corpus: parse and extract each match (isolating malformed
/// ones), then merge every accumulator in input order and summarize.
pub fn analyze_corpus(
    sources: &[MatchSource],
    config: &EngineConfig,
    mut cache: Option<&mut MatchCache>,
) -> EngineResult<CorpusReport> {
    info!(files = sources.len(), parallel = config.parallel, "analyzing corpus");

    let keys = cache.as_ref().map(|_| {
        sources
            .iter()
            .map(|s| MatchCache::key(&s.id, &s.raw))
            .collect::<Vec<_>>()
    });
    let cached: Vec<Option<MatchAnalysis>> = match (cache.as_deref(), keys.as_ref()) {
        (Some(c), Some(keys)) => keys.iter().map(|k| c.get(k).cloned()).collect(),
        _ => vec![None; sources.len()],
    };
    let hits = cached.iter().filter(|c| c.is_some()).count();
    if cache.is_some() {
        debug!(hits, misses = sources.len() - hits, "match cache lookup");
    }

    let extract = |(source, hit): (&MatchSource, &Option<MatchAnalysis>)| match hit {
        Some(analysis) => Ok(analysis.clone()),
        None => analyze_match(source),
    };
    let results: Vec<EngineResult<MatchAnalysis>> = if config.parallel {
        with_extract_pool(config.threads, || {
            sources.par_iter().zip(cached.par_iter()).map(extract).collect()
        })
    } else {
        sources.iter().zip(cached.iter()).map(extract).collect()
    };

    let mut analyses = Vec::with_capacity(results.len());
    let mut diagnostics = Vec::new();
    for (idx, (source, result)) in sources.iter().zip(results).enumerate() {
        match result {
            Ok(analysis) => {
                if let (Some(c), Some(keys)) = (cache.as_deref_mut(), keys.as_ref())
                    && cached[idx].is_none()
                {
                    c.insert(keys[idx].clone(), analysis.clone());
                }
                analyses.push(analysis);
            }
            Err(err) => {
                warn!(match_id = %source.id, "skipping match: {err}");
                diagnostics.push(MatchDiagnostic {
                    match_id: source.id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    if let (Some(c), Some(keys)) = (cache.as_deref_mut(), keys.as_ref()) {
        let dropped = c.retain_keys(keys);
        if dropped > 0 {
            debug!(dropped, "pruned match cache entries not in this corpus");
        }
    }

    let report = merge_analyses(sources.len(), analyses, diagnostics, config)?;
    info!(
        analyzed = report.analyzed,
        skipped = report.diagnostics.len(),
        balls = report.markov.corpus.overall.balls,
        "corpus analyzed"
    );
    Ok(report)
}

/// Deterministic sequential merge of per-match pieces, in the order given.
pub fn merge_analyses(
    files: usize,
    analyses: Vec<MatchAnalysis>,
    diagnostics: Vec<MatchDiagnostic>,
    config: &EngineConfig,
) -> EngineResult<CorpusReport> {
    let analyzed = analyses.len();
    let mut book = MarketBook::new();
    let mut ledger = PlayerLedger::new();
    let mut overall = GroupLedger::new();
    let mut venues = GroupLedger::new();
    let mut teams = GroupLedger::new();
    let mut events = Vec::new();
    let mut summaries = Vec::with_capacity(analyzed);
    let mut overview = Vec::with_capacity(analyzed);
    let mut balls = Vec::new();

    for (idx, a) in analyses.into_iter().enumerate() {
        book.absorb(&a.markets);
        ledger.absorb(&a.players);
        overall.absorb(a.overall_group);
        venues.absorb(a.venue_group);
        teams.absorb(a.team_group);
        events.extend(a.events.into_iter().map(|mut e| {
            e.match_index = idx;
            e
        }));
        summaries.push(a.summary);
        overview.push(a.overview);
        if config.ball_rows {
            balls.extend(a.balls);
        }
    }

    let Some(markov) = markov_report(&events, analyzed, config.team_wise) else {
        warn!(files, skipped = diagnostics.len(), "no legal deliveries in corpus");
        return Err(EngineError::NoData {
            files,
            skipped: diagnostics.len(),
        });
    };
    sort_overview_rows(&mut overview);

    Ok(CorpusReport {
        files,
        analyzed,
        diagnostics,
        summaries,
        overview,
        balls,
        batting: ledger.batting_rows(),
        bowling: ledger.bowling_rows(),
        markets: summarize_book(&book, &config.custom_line_pairs()),
        transition_table: markov.transition_rows(),
        markov,
        overall: overall.summaries().into_iter().next(),
        venues: venues.venue_rows(),
        teams: teams.team_rows(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_json(home_runs: &[i64], away_runs: &[i64]) -> String {
        let deliveries = |runs: &[i64]| {
            runs.iter()
                .map(|r| serde_json::json!({"batter": "x", "bowler": "y", "runs": r}))
                .collect::<Vec<_>>()
        };
        serde_json::json!({
            "info": {"teams": ["A", "B"], "outcome": {"winner": "A"}},
            "innings": [
                {"team": "A", "overs": [{"over": 0, "deliveries": deliveries(home_runs)}]},
                {"team": "B", "overs": [{"over": 0, "deliveries": deliveries(away_runs)}]}
            ]
        })
        .to_string()
    }

    fn sequential() -> EngineConfig {
        EngineConfig {
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn malformed_matches_become_diagnostics() {
        let sources = vec![
            MatchSource::new("good", match_json(&[1, 4], &[0, 6])),
            MatchSource::new("bad", "{\"info\": {\"teams\": [\"A\"]}}"),
            MatchSource::new("junk", "not json"),
        ];
        let report = analyze_corpus(&sources, &sequential(), None).unwrap();
        assert_eq!(report.files, 3);
        assert_eq!(report.analyzed, 1);
        let ids = report
            .diagnostics
            .iter()
            .map(|d| d.match_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["bad", "junk"]);
    }

    #[test]
    fn empty_corpus_is_reported_once() {
        let sources = vec![MatchSource::new("bad", "[]")];
        let err = analyze_corpus(&sources, &sequential(), None).unwrap_err();
        assert!(matches!(err, EngineError::NoData { files: 1, skipped: 1 }));
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let sources = (0..8)
            .map(|i| MatchSource::new(format!("m{i}"), match_json(&[i, 4, 0], &[6, i % 3])))
            .collect::<Vec<_>>();
        let seq = analyze_corpus(&sources, &sequential(), None).unwrap();
        let par = analyze_corpus(
            &sources,
            &EngineConfig {
                threads: Some(3),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn cache_hits_reproduce_the_same_report() {
        let sources = vec![
            MatchSource::new("m1", match_json(&[1, 2], &[4])),
            MatchSource::new("m2", match_json(&[6], &[0, 0])),
        ];
        let mut cache = MatchCache::in_memory();
        let first = analyze_corpus(&sources, &sequential(), Some(&mut cache)).unwrap();
        assert_eq!(cache.len(), 2);
        let second = analyze_corpus(&sources, &sequential(), Some(&mut cache)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cache_keeps_only_the_current_corpus() {
        let m1 = MatchSource::new("m1", match_json(&[1, 2], &[4]));
        let m2 = MatchSource::new("m2", match_json(&[6], &[0, 0]));
        let mut cache = MatchCache::in_memory();
        analyze_corpus(&[m1.clone(), m2], &sequential(), Some(&mut cache)).unwrap();
        assert_eq!(cache.len(), 2);

        analyze_corpus(&[m1.clone()], &sequential(), Some(&mut cache)).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&MatchCache::key(&m1.id, &m1.raw)).is_some());
    }
}
