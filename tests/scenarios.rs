use serde_json::{Value, json};

use cricket_markets::config::EngineConfig;
use cricket_markets::markets::NumericMarket;
use cricket_markets::pipeline::{MatchSource, analyze_corpus};

/// One innings from a flat list of `(runs, wicket)` balls, six to an over.
fn innings(team: &str, balls: &[(i64, bool)]) -> Value {
    let overs = balls
        .chunks(6)
        .enumerate()
        .map(|(over, chunk)| {
            let deliveries = chunk
                .iter()
                .map(|(runs, wicket)| {
                    let mut d = json!({"batter": format!("{team} bat"), "bowler": "bowler", "runs": runs});
                    if *wicket {
                        d["wickets"] = json!([{"kind": "bowled"}]);
                    }
                    d
                })
                .collect::<Vec<_>>();
            json!({"over": over, "deliveries": deliveries})
        })
        .collect::<Vec<_>>();
    json!({"team": team, "overs": overs})
}

fn sixes(n: usize) -> Vec<(i64, bool)> {
    vec![(6, false); n]
}

fn source(id: &str, teams: [&str; 2], venue: &str, winner: Option<&str>, innings: Vec<Value>) -> MatchSource {
    let mut outcome = json!({});
    if let Some(w) = winner {
        outcome["winner"] = json!(w);
    }
    let raw = json!({
        "info": {
            "teams": teams,
            "venue": venue,
            "toss": {"winner": teams[0], "decision": "bat"},
            "outcome": outcome
        },
        "innings": innings
    });
    MatchSource::new(id, raw.to_string())
}

fn sequential() -> EngineConfig {
    EngineConfig {
        parallel: false,
        ..Default::default()
    }
}

#[test]
fn first_wicket_and_total_runs_market() {
    let mut first = sixes(7);
    first.push((0, true));
    first.extend(sixes(23));
    let mut second = sixes(27);
    second.push((3, false));

    let sources = vec![source(
        "a",
        ["Home", "Away"],
        "Ground",
        Some("Home"),
        vec![innings("Home", &first), innings("Away", &second)],
    )];
    let report = analyze_corpus(&sources, &sequential(), None).unwrap();

    let summary = &report.summaries[0];
    assert_eq!(summary.innings_1_runs, 180);
    assert_eq!(summary.innings_2_runs, 165);
    assert_eq!(summary.fall_of_1st_wicket[0], Some(42));

    let row = serde_json::to_value(summary).unwrap();
    assert_eq!(row["Innings 1 Runs"], 180);

    let total = report.markets.numeric_summary(NumericMarket::TotalRuns).unwrap();
    assert_eq!(total.count, 1);
    assert_eq!(total.mean, 345.0);
    let fall = report
        .markets
        .numeric_summary(NumericMarket::RunsAtFallFirstWicket)
        .unwrap();
    assert_eq!(fall.max, 42.0);
}

#[test]
fn six_ball_outcome_distribution() {
    let balls = [0, 0, 1, 4, 6, 0].map(|r| (r, false));
    let sources = vec![source(
        "b",
        ["Home", "Away"],
        "Ground",
        None,
        vec![innings("Home", &balls)],
    )];
    let report = analyze_corpus(&sources, &sequential(), None).unwrap();
    let s = &report.markov.corpus.overall;
    assert_eq!(s.balls, 6);
    assert!((s.dot_pct - 50.0).abs() < 0.01);
    assert!((s.four_pct - 16.67).abs() < 0.01);
    assert!((s.six_pct - 16.67).abs() < 0.01);
    assert!((s.runs_probability(1) - 16.67).abs() < 0.01);
}

#[test]
fn venue_first_and_second_innings_averages() {
    let one_ball = |runs: i64| vec![(runs, false)];
    let sources = vec![
        source(
            "c1",
            ["Home", "Away"],
            "Venue A",
            Some("Home"),
            vec![innings("Home", &one_ball(150)), innings("Away", &one_ball(140))],
        ),
        source(
            "c2",
            ["Home", "Away"],
            "Venue A",
            Some("Away"),
            vec![innings("Home", &one_ball(160)), innings("Away", &one_ball(155))],
        ),
    ];
    let report = analyze_corpus(&sources, &sequential(), None).unwrap();
    let venue = report
        .venues
        .iter()
        .find(|v| v.summary.key == "Venue A")
        .unwrap();
    assert!((venue.summary.avg_first_innings - 155.0).abs() < 1e-9);
    assert!((venue.summary.avg_second_innings - 147.5).abs() < 1e-9);
}

#[test]
fn team_win_percentage() {
    let play = |id: &str, winner: &str| {
        source(
            id,
            ["Alpha", "Beta"],
            "Ground",
            Some(winner),
            vec![innings("Alpha", &[(10, false)]), innings("Beta", &[(8, false)])],
        )
    };
    let sources = vec![play("d1", "Alpha"), play("d2", "Beta"), play("d3", "Alpha")];
    let report = analyze_corpus(&sources, &sequential(), None).unwrap();
    let alpha = report.teams.iter().find(|t| t.summary.key == "Alpha").unwrap();
    assert_eq!(alpha.summary.matches, 3);
    assert_eq!(alpha.wins, 2);
    assert!((alpha.win_percentage - 66.67).abs() < 0.01);
    // Alpha won every toss and batted first.
    assert!((alpha.summary.bat_first_win_pct - 66.67).abs() < 0.01);
}
