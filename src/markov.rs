//! Per-ball outcome tables over the flattened stream of legal deliveries.
//! The transition table is an output for an external simulator; nothing
//! here fits or validates a chain.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::MatchRecord;
use crate::phase::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallEvent {
    pub match_index: usize,
    pub innings_index: usize,
    pub team: String,
    pub over: u32,
    pub runs_off_bat: u32,
    pub total_runs: u32,
    pub is_wicket: bool,
    pub is_four: bool,
    pub is_six: bool,
    pub is_dot: bool,
    pub is_single: bool,
    pub phase: Phase,
}

/// Legal deliveries of one match, in ball order.
pub fn flatten_match(match_index: usize, record: &MatchRecord) -> Vec<BallEvent> {
    let mut out = Vec::new();
    for (innings_index, innings) in record.innings.iter().enumerate() {
        for ball in innings.balls().filter(|b| b.delivery.is_legal) {
            let d = ball.delivery;
            out.push(BallEvent {
                match_index,
                innings_index,
                team: innings.team.clone(),
                over: ball.over,
                runs_off_bat: d.batter_runs,
                total_runs: d.total_runs,
                is_wicket: d.is_wicket,
                is_four: d.is_four(),
                is_six: d.is_six(),
                is_dot: d.is_dot(),
                is_single: d.batter_runs == 1,
                phase: Phase::of_over(ball.over),
            });
        }
    }
    out
}

pub fn flatten_corpus(records: &[MatchRecord]) -> Vec<BallEvent> {
    records
        .iter()
        .enumerate()
        .flat_map(|(idx, r)| flatten_match(idx, r))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallOutcomeStats {
    pub balls: usize,
    pub avg_runs_per_ball: f64,
    pub avg_total_runs_per_ball: f64,
    pub run_rate: f64,
    pub total_run_rate: f64,
    pub dot_pct: f64,
    pub single_pct: f64,
    pub four_pct: f64,
    pub six_pct: f64,
    pub wicket_pct: f64,
    pub boundary_pct: f64,
    /// Percentage of balls with exactly 0..=6 runs off the bat.
    pub runs_distribution: [f64; 7],
    pub avg_balls_between_wickets: Option<f64>,
    pub avg_balls_between_boundaries: Option<f64>,
}

impl BallOutcomeStats {
    pub fn runs_probability(&self, runs: usize) -> f64 {
        self.runs_distribution.get(runs).copied().unwrap_or(0.0)
    }
}

/// The one reduction used for every scope: overall, per phase and per team.
pub fn reduce_events(events: &[&BallEvent]) -> Option<BallOutcomeStats> {
    if events.is_empty() {
        return None;
    }
    let n = events.len() as f64;
    let count = |f: fn(&BallEvent) -> bool| events.iter().filter(|e| f(e)).count();
    let pct = |c: usize| c as f64 / n * 100.0;

    let bat_runs: u32 = events.iter().map(|e| e.runs_off_bat).sum();
    let total_runs: u32 = events.iter().map(|e| e.total_runs).sum();
    let wickets = count(|e| e.is_wicket);
    let boundaries = count(|e| e.is_four || e.is_six);

    let mut runs_distribution = [0.0; 7];
    for (runs, slot) in runs_distribution.iter_mut().enumerate() {
        *slot = pct(events
            .iter()
            .filter(|e| e.runs_off_bat as usize == runs)
            .count());
    }

    let avg = f64::from(bat_runs) / n;
    let avg_total = f64::from(total_runs) / n;
    Some(BallOutcomeStats {
        balls: events.len(),
        avg_runs_per_ball: avg,
        avg_total_runs_per_ball: avg_total,
        run_rate: avg * 6.0,
        total_run_rate: avg_total * 6.0,
        dot_pct: pct(count(|e| e.is_dot)),
        single_pct: pct(count(|e| e.is_single)),
        four_pct: pct(count(|e| e.is_four)),
        six_pct: pct(count(|e| e.is_six)),
        wicket_pct: pct(wickets),
        boundary_pct: pct(boundaries),
        runs_distribution,
        avg_balls_between_wickets: (wickets > 0).then(|| n / wickets as f64),
        avg_balls_between_boundaries: (boundaries > 0).then(|| n / boundaries as f64),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub zero: u64,
    pub one: u64,
    pub two: u64,
    pub three_plus: u64,
}

impl BucketCounts {
    fn add(&mut self, n: usize) {
        match n {
            0 => self.zero += 1,
            1 => self.one += 1,
            2 => self.two += 1,
            _ => self.three_plus += 1,
        }
    }
}

/// Fours / sixes / boundaries per completed over (six or more legal balls).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverBuckets {
    pub completed_overs: u64,
    pub fours: BucketCounts,
    pub sixes: BucketCounts,
    pub boundaries: BucketCounts,
}

pub fn over_buckets(events: &[&BallEvent]) -> OverBuckets {
    let mut out = OverBuckets::default();
    let same_over = |a: &&BallEvent, b: &&BallEvent| {
        (a.match_index, a.innings_index, a.over) == (b.match_index, b.innings_index, b.over)
    };
    for over in events.chunk_by(same_over) {
        if over.len() < 6 {
            continue;
        }
        let fours = over.iter().filter(|e| e.is_four).count();
        let sixes = over.iter().filter(|e| e.is_six).count();
        out.completed_overs += 1;
        out.fours.add(fours);
        out.sixes.add(sixes);
        out.boundaries.add(fours + sixes);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub stats: BallOutcomeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeReport {
    pub overall: BallOutcomeStats,
    /// Phases with no balls are omitted.
    pub phases: Vec<PhaseOutcome>,
    pub over_buckets: OverBuckets,
}

impl ScopeReport {
    pub fn phase(&self, phase: Phase) -> Option<&BallOutcomeStats> {
        self.phases.iter().find(|p| p.phase == phase).map(|p| &p.stats)
    }
}

fn scope_report(events: &[&BallEvent]) -> Option<ScopeReport> {
    let overall = reduce_events(events)?;
    let phases = Phase::ALL
        .into_iter()
        .filter_map(|phase| {
            let subset = events
                .iter()
                .copied()
                .filter(|e| e.phase == phase)
                .collect::<Vec<_>>();
            reduce_events(&subset).map(|stats| PhaseOutcome { phase, stats })
        })
        .collect();
    Some(ScopeReport {
        overall,
        phases,
        over_buckets: over_buckets(events),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScope {
    pub team: String,
    #[serde(flatten)]
    pub report: ScopeReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkovReport {
    pub total_matches: usize,
    #[serde(flatten)]
    pub corpus: ScopeReport,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<TeamScope>,
}

/// One row of the exported transition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRow {
    pub scope: String,
    pub team: Option<String>,
    pub p_runs: [f64; 7],
    pub p_wicket: f64,
}

/// `None` when the stream holds no legal deliveries.
pub fn markov_report(events: &[BallEvent], total_matches: usize, team_wise: bool) -> Option<MarkovReport> {
    let all = events.iter().collect::<Vec<_>>();
    let corpus = scope_report(&all)?;

    let mut teams = Vec::new();
    if team_wise {
        let names = events.iter().map(|e| e.team.as_str()).collect::<BTreeSet<_>>();
        for name in names {
            let subset = all
                .iter()
                .copied()
                .filter(|e| e.team == name)
                .collect::<Vec<_>>();
            if let Some(report) = scope_report(&subset) {
                teams.push(TeamScope {
                    team: name.to_string(),
                    report,
                });
            }
        }
    }

    Some(MarkovReport {
        total_matches,
        corpus,
        teams,
    })
}

impl MarkovReport {
    pub fn team(&self, name: &str) -> Option<&ScopeReport> {
        self.teams.iter().find(|t| t.team == name).map(|t| &t.report)
    }

    pub fn transition_rows(&self) -> Vec<TransitionRow> {
        let mut rows = Vec::new();
        push_scope_rows(&mut rows, None, &self.corpus);
        for t in &self.teams {
            push_scope_rows(&mut rows, Some(&t.team), &t.report);
        }
        rows
    }
}

fn push_scope_rows(rows: &mut Vec<TransitionRow>, team: Option<&str>, report: &ScopeReport) {
    let row = |scope: &str, s: &BallOutcomeStats| TransitionRow {
        scope: scope.to_string(),
        team: team.map(str::to_string),
        p_runs: s.runs_distribution.map(|p| p / 100.0),
        p_wicket: s.wicket_pct / 100.0,
    };
    rows.push(row("overall", &report.overall));
    for p in &report.phases {
        rows.push(row(p.phase.label(), &p.stats));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(team: &str, over: u32, runs: u32, wicket: bool) -> BallEvent {
        BallEvent {
            match_index: 0,
            innings_index: 0,
            team: team.to_string(),
            over,
            runs_off_bat: runs,
            total_runs: runs,
            is_wicket: wicket,
            is_four: runs == 4,
            is_six: runs == 6,
            is_dot: runs == 0,
            is_single: runs == 1,
            phase: Phase::of_over(over),
        }
    }

    #[test]
    fn six_ball_outcome_percentages() {
        let events = [0, 0, 1, 4, 6, 0]
            .into_iter()
            .map(|r| event("A", 0, r, false))
            .collect::<Vec<_>>();
        let report = markov_report(&events, 1, false).unwrap();
        let s = &report.corpus.overall;
        assert!((s.dot_pct - 50.0).abs() < 0.01);
        assert!((s.four_pct - 16.67).abs() < 0.01);
        assert!((s.six_pct - 16.67).abs() < 0.01);
        assert!((s.runs_probability(1) - 16.67).abs() < 0.01);
        assert_eq!(s.avg_balls_between_wickets, None);
        assert_eq!(s.avg_balls_between_boundaries, Some(3.0));
        assert_eq!(report.corpus.over_buckets.completed_overs, 1);
        assert_eq!(report.corpus.over_buckets.boundaries.two, 1);
    }

    #[test]
    fn empty_stream_has_no_report() {
        assert!(markov_report(&[], 0, true).is_none());
    }

    #[test]
    fn team_scope_matches_reduction_of_the_subsequence() {
        let events = vec![
            event("A", 0, 4, false),
            event("B", 0, 0, true),
            event("A", 7, 1, false),
            event("B", 16, 6, false),
        ];
        let report = markov_report(&events, 1, true).unwrap();
        let a = report.team("A").unwrap();
        let subset = events.iter().filter(|e| e.team == "A").collect::<Vec<_>>();
        assert_eq!(a.overall, reduce_events(&subset).unwrap());
        assert_eq!(a.phases.len(), 2);
        assert!(report.team("B").unwrap().phase(Phase::Death).is_some());

        let rows = report.transition_rows();
        assert_eq!(rows[0].scope, "overall");
        assert_eq!(rows[0].team, None);
        let sum: f64 = rows[0].p_runs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn short_overs_are_not_bucketed() {
        let events = (0..5).map(|_| event("A", 3, 4, false)).collect::<Vec<_>>();
        let refs = events.iter().collect::<Vec<_>>();
        assert_eq!(over_buckets(&refs).completed_overs, 0);
    }
}
