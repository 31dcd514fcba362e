use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::match_stats::{InningsStats, MatchStats};
use crate::model::MatchRecord;
use crate::players::BattingRow;

/// Flat per-match record consumed by table/CSV sinks. Field names follow the
/// column labels those sinks already expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummaryRow {
    pub match_id: String,
    #[serde(rename = "Match Winner")]
    pub match_winner: String,
    #[serde(rename = "Tied Match")]
    pub tied_match: bool,
    #[serde(rename = "Innings 1 Team")]
    pub innings_1_team: String,
    #[serde(rename = "Innings 1 Runs")]
    pub innings_1_runs: u32,
    #[serde(rename = "Innings 1 Runs (Overs 1-6)")]
    pub innings_1_overs_1_6: u32,
    #[serde(rename = "Innings 1 Runs (Overs 7-13)")]
    pub innings_1_overs_7_13: u32,
    #[serde(rename = "Innings 1 Runs (Overs 14-20)")]
    pub innings_1_overs_14_20: u32,
    #[serde(rename = "Innings 2 Team")]
    pub innings_2_team: String,
    #[serde(rename = "Innings 2 Runs")]
    pub innings_2_runs: u32,
    #[serde(rename = "Innings 2 Runs (Overs 1-6)")]
    pub innings_2_overs_1_6: u32,
    #[serde(rename = "Innings 2 Runs (Overs 7-13)")]
    pub innings_2_overs_7_13: u32,
    #[serde(rename = "Innings 2 Runs (Overs 14-20)")]
    pub innings_2_overs_14_20: u32,
    #[serde(rename = "Top Batsman Match")]
    pub top_batsman: Option<String>,
    #[serde(rename = "Top Batsman Runs")]
    pub top_batsman_runs: Option<u32>,
    #[serde(rename = "Man of the Match")]
    pub player_of_match: Option<String>,
    #[serde(rename = "Toss Winner")]
    pub toss_winner: Option<String>,
    #[serde(rename = "Four and Six in an Over")]
    pub four_and_six_in_over: bool,
    #[serde(rename = "Overs with a Wicket")]
    pub overs_with_wicket: u32,
    /// Per innings, in batting order.
    pub fall_of_1st_wicket: Vec<Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOverviewRow {
    pub match_id: String,
    pub date: Option<NaiveDate>,
    pub home_team: String,
    pub away_team: String,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<String>,
    pub winner: String,
    /// Innings 1 total (positional, like the team labels).
    pub home_score: u32,
    pub away_score: u32,
    pub venue: String,
}

/// One delivery of the combined ball-by-ball table; illegal deliveries included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallRow {
    pub match_id: String,
    pub inning: usize,
    pub over: u32,
    pub ball: usize,
    pub batting_team: String,
    pub batter: String,
    pub bowler: String,
    pub runs_off_bat: u32,
    pub extras: u32,
    pub total_runs: u32,
}

const NO_RESULT: &str = "No Result";

pub fn summary_row(record: &MatchRecord, stats: &MatchStats, batting: &[BattingRow]) -> MatchSummaryRow {
    let empty = InningsStats::default();
    let first = stats.innings.first();
    let second = stats.innings.get(1);
    let i1 = first.unwrap_or(&empty);
    let i2 = second.unwrap_or(&empty);
    let top = batting.first();

    MatchSummaryRow {
        match_id: record.match_id.clone(),
        match_winner: record.winner().unwrap_or(NO_RESULT).to_string(),
        tied_match: record.is_tie(),
        innings_1_team: first.map(|i| i.team.clone()).unwrap_or_else(|| "N/A".to_string()),
        innings_1_runs: i1.total_runs,
        innings_1_overs_1_6: i1.window_runs.overs_1_6,
        innings_1_overs_7_13: i1.window_runs.overs_7_13,
        innings_1_overs_14_20: i1.window_runs.overs_14_20,
        innings_2_team: second.map(|i| i.team.clone()).unwrap_or_else(|| "N/A".to_string()),
        innings_2_runs: i2.total_runs,
        innings_2_overs_1_6: i2.window_runs.overs_1_6,
        innings_2_overs_7_13: i2.window_runs.overs_7_13,
        innings_2_overs_14_20: i2.window_runs.overs_14_20,
        top_batsman: top.map(|b| b.player_name.clone()),
        top_batsman_runs: top.map(|b| b.runs),
        player_of_match: record.player_of_match().map(str::to_string),
        toss_winner: record.toss_winner().map(str::to_string),
        four_and_six_in_over: stats.innings.iter().any(|i| i.four_and_six_in_over),
        overs_with_wicket: stats.innings.iter().map(|i| i.overs_with_wicket).sum(),
        fall_of_1st_wicket: stats.innings.iter().map(|i| i.fall_of_first_wicket).collect(),
    }
}

pub fn overview_row(record: &MatchRecord, stats: &MatchStats) -> MatchOverviewRow {
    MatchOverviewRow {
        match_id: record.match_id.clone(),
        date: record.first_date(),
        home_team: record.home().to_string(),
        away_team: record.away().to_string(),
        toss_winner: record.toss_winner().map(str::to_string),
        toss_decision: record.info.toss.decision.clone(),
        winner: record.winner().unwrap_or(NO_RESULT).to_string(),
        home_score: stats.innings_total(0),
        away_score: stats.innings_total(1),
        venue: record.venue().to_string(),
    }
}

pub fn ball_rows(record: &MatchRecord) -> Vec<BallRow> {
    let mut rows = Vec::new();
    for (idx, innings) in record.innings.iter().enumerate() {
        for ball in innings.balls() {
            rows.push(BallRow {
                match_id: record.match_id.clone(),
                inning: idx + 1,
                over: ball.over + 1,
                ball: ball.index_in_over + 1,
                batting_team: innings.team.clone(),
                batter: ball.batter.to_string(),
                bowler: ball.bowler.to_string(),
                runs_off_bat: ball.delivery.batter_runs,
                extras: ball.delivery.extras_runs,
                total_runs: ball.delivery.total_runs,
            });
        }
    }
    rows
}

/// Chronological order; undated matches keep their relative order at the end.
pub fn sort_overview_rows(rows: &mut [MatchOverviewRow]) {
    rows.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview(id: &str, date: Option<(i32, u32, u32)>) -> MatchOverviewRow {
        MatchOverviewRow {
            match_id: id.to_string(),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            home_team: "A".to_string(),
            away_team: "B".to_string(),
            toss_winner: None,
            toss_decision: None,
            winner: NO_RESULT.to_string(),
            home_score: 0,
            away_score: 0,
            venue: "V".to_string(),
        }
    }

    #[test]
    fn overview_rows_sort_by_date_with_undated_last() {
        let mut rows = vec![
            overview("x", None),
            overview("b", Some((2023, 5, 2))),
            overview("y", None),
            overview("a", Some((2022, 1, 1))),
        ];
        sort_overview_rows(&mut rows);
        let ids = rows.iter().map(|r| r.match_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "x", "y"]);
    }

    #[test]
    fn summary_labels_serialize_as_column_names() {
        let record = crate::model::parse_match_json(
            "m.json",
            r#"{"info": {"teams": ["A", "B"], "outcome": {"result": "no result"}}}"#,
        )
        .unwrap();
        let stats = crate::match_stats::extract_match_stats(&record);
        let row = summary_row(&record, &stats, &[]);
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["Match Winner"], "No Result");
        assert_eq!(v["Innings 1 Team"], "N/A");
        assert_eq!(v["Innings 1 Runs"], 0);
    }
}
