use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::delivery::{DismissalKind, NormalizedDelivery, ScoringShot};
use crate::model::{InningsRecord, MatchRecord};
use crate::phase::{PhaseRuns, WindowRuns};

const FIFTY: u32 = 50;
const HUNDRED: u32 = 100;

/// Derived statistics for one innings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InningsStats {
    /// 0 = first innings of the match.
    pub index: usize,
    pub team: String,
    pub total_runs: u32,
    pub extras_runs: u32,
    pub legal_balls: u32,
    pub fours: u32,
    pub sixes: u32,
    /// Deliveries carrying at least one dismissal.
    pub wickets: u32,
    pub caught_dismissals: u32,
    pub phase_runs: PhaseRuns,
    pub window_runs: WindowRuns,
    pub runs_first_6: u32,
    pub runs_first_10: u32,
    pub runs_first_15: u32,
    pub runs_per_over: Vec<u32>,
    pub highest_over: u32,
    pub four_and_six_in_over: bool,
    /// Some over held six or more boundary deliveries.
    pub six_boundary_over: bool,
    pub overs_with_wicket: u32,
    /// Running score when the first wicket fell; `None` if no wicket fell.
    pub fall_of_first_wicket: Option<u32>,
    pub first_wicket_method: Option<DismissalKind>,
    pub highest_individual: u32,
    pub fifty_scored: bool,
    pub hundred_scored: bool,
}

impl InningsStats {
    pub fn boundaries(&self) -> u32 {
        self.fours + self.sixes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub match_id: String,
    pub innings: Vec<InningsStats>,
    /// Whether the first legal delivery of the match was a dot.
    pub first_ball_dot: Option<bool>,
    /// Scoring-shot category of the first legal delivery, if it scored off the bat.
    pub first_ball_shot: Option<ScoringShot>,
}

impl MatchStats {
    pub fn total_runs(&self) -> u32 {
        self.innings.iter().map(|i| i.total_runs).sum()
    }

    pub fn total_fours(&self) -> u32 {
        self.innings.iter().map(|i| i.fours).sum()
    }

    pub fn total_sixes(&self) -> u32 {
        self.innings.iter().map(|i| i.sixes).sum()
    }

    pub fn total_extras(&self) -> u32 {
        self.innings.iter().map(|i| i.extras_runs).sum()
    }

    pub fn innings_total(&self, index: usize) -> u32 {
        self.innings.get(index).map(|i| i.total_runs).unwrap_or(0)
    }

    /// First innings batted by `team`.
    pub fn innings_for(&self, team: &str) -> Option<&InningsStats> {
        self.innings.iter().find(|i| i.team == team)
    }

    /// The last innings in which a wicket fell. A later innings with a wicket
    /// replaces an earlier one, so a two-innings match reports the chase.
    pub fn last_wicket_innings(&self) -> Option<&InningsStats> {
        self.innings
            .iter()
            .rev()
            .find(|i| i.fall_of_first_wicket.is_some())
    }
}

/// Runs before the first wicket. Accumulates `total_runs` ball by ball until
/// a delivery carries a wicket, then freezes for the rest of the innings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpeningPartnership {
    running: u32,
    fallen_at: Option<u32>,
}

impl OpeningPartnership {
    pub fn observe(&mut self, delivery: &NormalizedDelivery) {
        if self.fallen_at.is_some() {
            return;
        }
        self.running += delivery.total_runs;
        if delivery.is_wicket {
            self.fallen_at = Some(self.running);
        }
    }

    pub fn current(&self) -> u32 {
        self.fallen_at.unwrap_or(self.running)
    }

    pub fn fall_of_first_wicket(&self) -> Option<u32> {
        self.fallen_at
    }
}

pub fn extract_match_stats(record: &MatchRecord) -> MatchStats {
    let innings = record
        .innings
        .iter()
        .enumerate()
        .map(|(idx, inn)| extract_innings_stats(idx, inn))
        .collect();

    let first_legal = record
        .innings
        .iter()
        .flat_map(InningsRecord::balls)
        .map(|ball| ball.delivery)
        .find(|d| d.is_legal);
    let first_ball_dot = first_legal.map(|d| d.is_dot());
    let first_ball_shot = first_legal.and_then(|d| ScoringShot::from_batter_runs(d.batter_runs));

    MatchStats {
        match_id: record.match_id.clone(),
        innings,
        first_ball_dot,
        first_ball_shot,
    }
}

pub fn extract_innings_stats(index: usize, innings: &InningsRecord) -> InningsStats {
    let mut out = InningsStats {
        index,
        team: innings.team.clone(),
        ..Default::default()
    };
    let mut partnership = OpeningPartnership::default();
    let mut batter_scores: HashMap<&str, u32> = HashMap::new();

    for over in innings.overs() {
        let mut over_runs = 0u32;
        let mut has_four = false;
        let mut has_six = false;
        let mut has_wicket = false;
        let mut over_boundaries = 0u32;

        for ball in over.balls() {
            let d = ball.delivery;
            over_runs += d.total_runs;
            out.extras_runs += d.extras_runs;
            *batter_scores.entry(ball.batter).or_insert(0) += d.batter_runs;

            if d.is_legal {
                out.legal_balls += 1;
            }
            if d.is_four() {
                out.fours += 1;
                has_four = true;
                over_boundaries += 1;
            } else if d.is_six() {
                out.sixes += 1;
                has_six = true;
                over_boundaries += 1;
            }
            if d.is_wicket {
                out.wickets += 1;
                out.caught_dismissals += d.caught_dismissals;
                has_wicket = true;
                if out.first_wicket_method.is_none() {
                    out.first_wicket_method = d.wicket_method;
                }
            }
            partnership.observe(&d);
        }

        out.total_runs += over_runs;
        out.runs_per_over.push(over_runs);
        out.highest_over = out.highest_over.max(over_runs);
        out.phase_runs.add(over.over, over_runs);
        out.window_runs.add(over.over, over_runs);
        if over.over < 6 {
            out.runs_first_6 += over_runs;
        }
        if over.over < 10 {
            out.runs_first_10 += over_runs;
        }
        if over.over < 15 {
            out.runs_first_15 += over_runs;
        }
        if has_four && has_six {
            out.four_and_six_in_over = true;
        }
        if over_boundaries >= 6 {
            out.six_boundary_over = true;
        }
        if has_wicket {
            out.overs_with_wicket += 1;
        }
    }

    out.fall_of_first_wicket = partnership.fall_of_first_wicket();
    out.highest_individual = batter_scores.values().copied().max().unwrap_or(0);
    out.fifty_scored = out.highest_individual >= FIFTY;
    out.hundred_scored = out.highest_individual >= HUNDRED;
    out
}
