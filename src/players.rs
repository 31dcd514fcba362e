use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::MatchRecord;

/// Per (player, match) counters. One is created for every squad member,
/// zeroed, so join keys are stable even for players who never featured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatchStat {
    pub player: String,
    pub team: String,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub runs_conceded: u32,
    pub balls_bowled: u32,
    pub wickets: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingRow {
    pub player_name: String,
    pub team: String,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlingRow {
    pub player_name: String,
    pub team: String,
    pub runs_conceded: u32,
    pub balls_bowled: u32,
    pub wickets: u32,
    pub overs: String,
    pub economy_rate: f64,
}

pub fn player_match_stats(record: &MatchRecord) -> Vec<PlayerMatchStat> {
    let mut stats: Vec<PlayerMatchStat> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (team, squad) in &record.info.players {
        for player in squad {
            if index.contains_key(player.as_str()) {
                continue;
            }
            index.insert(player.as_str(), stats.len());
            stats.push(PlayerMatchStat {
                player: player.clone(),
                team: team.clone(),
                ..Default::default()
            });
        }
    }

    for innings in &record.innings {
        for ball in innings.balls() {
            let d = ball.delivery;
            if let Some(&idx) = index.get(ball.batter) {
                let s = &mut stats[idx];
                s.runs += d.batter_runs;
                if d.is_legal {
                    s.balls_faced += 1;
                }
                if d.is_four() {
                    s.fours += 1;
                }
                if d.is_six() {
                    s.sixes += 1;
                }
            }
            if let Some(&idx) = index.get(ball.bowler) {
                let s = &mut stats[idx];
                s.runs_conceded += d.total_runs;
                if d.is_legal {
                    s.balls_bowled += 1;
                }
                if d.is_wicket {
                    s.wickets += 1;
                }
            }
        }
    }

    stats
}

pub fn strike_rate(runs: u32, balls_faced: u32) -> f64 {
    round2(runs as f64 / balls_faced.max(1) as f64 * 100.0)
}

pub fn economy_rate(runs_conceded: u32, balls_bowled: u32) -> f64 {
    round2(runs_conceded as f64 / (balls_bowled.max(1) as f64 / 6.0))
}

pub fn overs_notation(balls: u32) -> String {
    format!("{}.{}", balls / 6, balls % 6)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Records with at least one legal ball faced, sorted by runs (descending, stable).
pub fn batting_view(stats: &[PlayerMatchStat]) -> Vec<BattingRow> {
    let mut rows = stats
        .iter()
        .filter(|s| s.balls_faced > 0)
        .map(|s| BattingRow {
            player_name: s.player.clone(),
            team: s.team.clone(),
            runs: s.runs,
            balls_faced: s.balls_faced,
            fours: s.fours,
            sixes: s.sixes,
            strike_rate: strike_rate(s.runs, s.balls_faced),
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.runs.cmp(&a.runs));
    rows
}

/// Records with at least one legal ball bowled, sorted by wickets (descending, stable).
pub fn bowling_view(stats: &[PlayerMatchStat]) -> Vec<BowlingRow> {
    let mut rows = stats
        .iter()
        .filter(|s| s.balls_bowled > 0)
        .map(|s| BowlingRow {
            player_name: s.player.clone(),
            team: s.team.clone(),
            runs_conceded: s.runs_conceded,
            balls_bowled: s.balls_bowled,
            wickets: s.wickets,
            overs: overs_notation(s.balls_bowled),
            economy_rate: economy_rate(s.runs_conceded, s.balls_bowled),
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.wickets.cmp(&a.wickets));
    rows
}

/// Cross-match totals keyed by (player, team). Additive fields are summed
/// first; rates are derived from the sums, never averaged across matches.
#[derive(Debug, Clone, Default)]
pub struct PlayerLedger {
    totals: Vec<PlayerMatchStat>,
    index: HashMap<(String, String), usize>,
}

impl PlayerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, stats: &[PlayerMatchStat]) {
        for s in stats {
            let key = (s.player.clone(), s.team.clone());
            let idx = *self.index.entry(key).or_insert_with(|| {
                self.totals.push(PlayerMatchStat {
                    player: s.player.clone(),
                    team: s.team.clone(),
                    ..Default::default()
                });
                self.totals.len() - 1
            });
            let t = &mut self.totals[idx];
            t.runs += s.runs;
            t.balls_faced += s.balls_faced;
            t.fours += s.fours;
            t.sixes += s.sixes;
            t.runs_conceded += s.runs_conceded;
            t.balls_bowled += s.balls_bowled;
            t.wickets += s.wickets;
        }
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn batting_rows(&self) -> Vec<BattingRow> {
        batting_view(&self.totals)
    }

    pub fn bowling_rows(&self) -> Vec<BowlingRow> {
        bowling_view(&self.totals)
    }
}
