use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::match_stats::{InningsStats, MatchStats};
use crate::model::{MatchRecord, TossDecision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Overall,
    Venue,
    Team,
}

const OVERALL_KEY: &str = "All Matches";

/// Additive running totals for one group. Every field merges by addition
/// (or set union), so per-match contributions can be built independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub matches: u32,
    pub innings: u32,
    pub total_runs: u64,
    pub first_innings_runs: u64,
    pub first_innings_count: u32,
    pub second_innings_runs: u64,
    pub second_innings_count: u32,
    pub powerplay_runs: u64,
    pub middle_runs: u64,
    pub death_runs: u64,
    pub legal_balls: u64,
    pub fours: u64,
    pub sixes: u64,
    pub wickets: u64,
    pub decisive_matches: u32,
    pub toss_winner_won: u32,
    pub bat_first_decisions: u32,
    pub bat_first_wins: u32,
    pub field_first_decisions: u32,
    pub field_first_wins: u32,
    pub wins: u32,
    pub runs_scored: u64,
    pub runs_conceded: u64,
    pub opponents: BTreeSet<String>,
    pub venues: BTreeSet<String>,
}

impl GroupTotals {
    fn add_innings(&mut self, inn: &InningsStats) {
        let runs = u64::from(inn.total_runs);
        self.innings += 1;
        self.total_runs += runs;
        match inn.index {
            0 => {
                self.first_innings_runs += runs;
                self.first_innings_count += 1;
            }
            1 => {
                self.second_innings_runs += runs;
                self.second_innings_count += 1;
            }
            _ => {}
        }
        self.powerplay_runs += u64::from(inn.phase_runs.powerplay);
        self.middle_runs += u64::from(inn.phase_runs.middle);
        self.death_runs += u64::from(inn.phase_runs.death);
        self.legal_balls += u64::from(inn.legal_balls);
        self.fours += u64::from(inn.fours);
        self.sixes += u64::from(inn.sixes);
        self.wickets += u64::from(inn.wickets);
    }

    /// Toss outcome from the point of view of the side that won it.
    fn add_toss(&mut self, record: &MatchRecord) {
        let (Some(toss_winner), Some(winner)) = (record.toss_winner(), record.winner()) else {
            return;
        };
        let won = toss_winner == winner;
        self.decisive_matches += 1;
        if won {
            self.toss_winner_won += 1;
        }
        match record.toss_decision() {
            Some(TossDecision::Bat) => {
                self.bat_first_decisions += 1;
                self.bat_first_wins += u32::from(won);
            }
            Some(TossDecision::Field) => {
                self.field_first_decisions += 1;
                self.field_first_wins += u32::from(won);
            }
            None => {}
        }
    }

    pub fn merge(&mut self, other: GroupTotals) {
        self.matches += other.matches;
        self.innings += other.innings;
        self.total_runs += other.total_runs;
        self.first_innings_runs += other.first_innings_runs;
        self.first_innings_count += other.first_innings_count;
        self.second_innings_runs += other.second_innings_runs;
        self.second_innings_count += other.second_innings_count;
        self.powerplay_runs += other.powerplay_runs;
        self.middle_runs += other.middle_runs;
        self.death_runs += other.death_runs;
        self.legal_balls += other.legal_balls;
        self.fours += other.fours;
        self.sixes += other.sixes;
        self.wickets += other.wickets;
        self.decisive_matches += other.decisive_matches;
        self.toss_winner_won += other.toss_winner_won;
        self.bat_first_decisions += other.bat_first_decisions;
        self.bat_first_wins += other.bat_first_wins;
        self.field_first_decisions += other.field_first_decisions;
        self.field_first_wins += other.field_first_wins;
        self.wins += other.wins;
        self.runs_scored += other.runs_scored;
        self.runs_conceded += other.runs_conceded;
        self.opponents.extend(other.opponents);
        self.venues.extend(other.venues);
    }
}

/// What one match adds to each group it belongs to.
pub fn group_contributions(record: &MatchRecord, stats: &MatchStats, by: GroupBy) -> Vec<(String, GroupTotals)> {
    match by {
        GroupBy::Overall | GroupBy::Venue => {
            let mut t = GroupTotals {
                matches: 1,
                ..Default::default()
            };
            for inn in &stats.innings {
                t.add_innings(inn);
            }
            t.add_toss(record);
            let key = if by == GroupBy::Venue {
                record.venue().to_string()
            } else {
                OVERALL_KEY.to_string()
            };
            vec![(key, t)]
        }
        GroupBy::Team => {
            let teams = [record.home(), record.away()];
            teams
                .into_iter()
                .enumerate()
                // Guard against a match listing the same side twice.
                .filter(|(i, team)| *i == 0 || *team != teams[0])
                .map(|(_, team)| (team.to_string(), team_contribution(record, stats, team)))
                .collect()
        }
    }
}

fn team_contribution(record: &MatchRecord, stats: &MatchStats, team: &str) -> GroupTotals {
    let mut t = GroupTotals {
        matches: 1,
        ..Default::default()
    };
    if record.winner() == Some(team) {
        t.wins = 1;
    }
    for inn in &stats.innings {
        if inn.team == team {
            t.add_innings(inn);
            t.runs_scored += u64::from(inn.total_runs);
        } else {
            t.runs_conceded += u64::from(inn.total_runs);
        }
    }
    if record.toss_winner() == Some(team) {
        t.add_toss(record);
    }
    if let Some(opponent) = record.opponent_of(team) {
        t.opponents.insert(opponent.to_string());
    }
    t.venues.insert(record.venue().to_string());
    t
}

/// Keyed totals for one grouped run. Keys iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupLedger {
    groups: BTreeMap<String, GroupTotals>,
}

impl GroupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, contributions: Vec<(String, GroupTotals)>) {
        for (key, totals) in contributions {
            self.groups.entry(key).or_default().merge(totals);
        }
    }

    pub fn get(&self, key: &str) -> Option<&GroupTotals> {
        self.groups.get(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn summaries(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|(key, t)| GroupSummary::from_totals(key, t))
            .collect()
    }

    pub fn venue_rows(&self) -> Vec<VenueAggregate> {
        self.summaries()
            .into_iter()
            .map(|summary| VenueAggregate { summary })
            .collect()
    }

    pub fn team_rows(&self) -> Vec<TeamAggregate> {
        self.groups
            .iter()
            .map(|(key, t)| TeamAggregate {
                summary: GroupSummary::from_totals(key, t),
                wins: t.wins,
                win_percentage: pct(t.wins.into(), t.matches.into()),
                runs_scored: t.runs_scored,
                runs_conceded: t.runs_conceded,
                opponents_faced: t.opponents.len(),
                venues_played: t.venues.len(),
            })
            .collect()
    }
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn avg(sum: u64, n: u64) -> f64 {
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: String,
    pub matches: u32,
    pub innings: u32,
    pub avg_innings_runs: f64,
    pub avg_first_innings: f64,
    pub avg_second_innings: f64,
    pub avg_powerplay_runs: f64,
    pub avg_middle_runs: f64,
    pub avg_death_runs: f64,
    pub run_rate: f64,
    pub boundary_pct: f64,
    pub wicket_pct: f64,
    /// Decisive matches only.
    pub toss_winner_win_pct: f64,
    pub bat_first_win_pct: f64,
    pub field_first_win_pct: f64,
}

impl GroupSummary {
    fn from_totals(key: &str, t: &GroupTotals) -> Self {
        let innings = u64::from(t.innings);
        Self {
            key: key.to_string(),
            matches: t.matches,
            innings: t.innings,
            avg_innings_runs: avg(t.total_runs, innings),
            avg_first_innings: avg(t.first_innings_runs, t.first_innings_count.into()),
            avg_second_innings: avg(t.second_innings_runs, t.second_innings_count.into()),
            avg_powerplay_runs: avg(t.powerplay_runs, innings),
            avg_middle_runs: avg(t.middle_runs, innings),
            avg_death_runs: avg(t.death_runs, innings),
            run_rate: avg(t.total_runs, t.legal_balls) * 6.0,
            boundary_pct: pct(t.fours + t.sixes, t.legal_balls),
            wicket_pct: pct(t.wickets, t.legal_balls),
            toss_winner_win_pct: pct(t.toss_winner_won.into(), t.decisive_matches.into()),
            bat_first_win_pct: pct(t.bat_first_wins.into(), t.bat_first_decisions.into()),
            field_first_win_pct: pct(t.field_first_wins.into(), t.field_first_decisions.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueAggregate {
    #[serde(flatten)]
    pub summary: GroupSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregate {
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub wins: u32,
    pub win_percentage: f64,
    pub runs_scored: u64,
    pub runs_conceded: u64,
    pub opponents_faced: usize,
    pub venues_played: usize,
}
