use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::match_stats::MatchStats;
use crate::model::MatchRecord;

/// Markets that collect one scalar per match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NumericMarket {
    TotalRuns,
    MatchFours,
    MatchSixes,
    MatchBoundaries,
    HomeTotalFours,
    AwayTotalFours,
    HomeTotalSixes,
    AwayTotalSixes,
    HomeTotalBoundaries,
    AwayTotalBoundaries,
    HighestIndividualScore,
    HomeHighestIndividual,
    AwayHighestIndividual,
    MostRunsSingleOver,
    HomeMostRunsSingleOver,
    AwayMostRunsSingleOver,
    HomeWicketsCaught,
    AwayWicketsCaught,
    RunsFirst6Overs,
    RunsFirst10Overs,
    RunsFirst15Overs,
    FirstInningsPowerplay,
    FirstInningsMiddle,
    FirstInningsDeath,
    FirstInningsOvers7To13,
    FirstInningsOvers14To20,
    RunsAtFallFirstWicket,
    OpeningPartnership,
    TotalExtras,
}

impl NumericMarket {
    pub const ALL: [NumericMarket; 29] = [
        NumericMarket::TotalRuns,
        NumericMarket::MatchFours,
        NumericMarket::MatchSixes,
        NumericMarket::MatchBoundaries,
        NumericMarket::HomeTotalFours,
        NumericMarket::AwayTotalFours,
        NumericMarket::HomeTotalSixes,
        NumericMarket::AwayTotalSixes,
        NumericMarket::HomeTotalBoundaries,
        NumericMarket::AwayTotalBoundaries,
        NumericMarket::HighestIndividualScore,
        NumericMarket::HomeHighestIndividual,
        NumericMarket::AwayHighestIndividual,
        NumericMarket::MostRunsSingleOver,
        NumericMarket::HomeMostRunsSingleOver,
        NumericMarket::AwayMostRunsSingleOver,
        NumericMarket::HomeWicketsCaught,
        NumericMarket::AwayWicketsCaught,
        NumericMarket::RunsFirst6Overs,
        NumericMarket::RunsFirst10Overs,
        NumericMarket::RunsFirst15Overs,
        NumericMarket::FirstInningsPowerplay,
        NumericMarket::FirstInningsMiddle,
        NumericMarket::FirstInningsDeath,
        NumericMarket::FirstInningsOvers7To13,
        NumericMarket::FirstInningsOvers14To20,
        NumericMarket::RunsAtFallFirstWicket,
        NumericMarket::OpeningPartnership,
        NumericMarket::TotalExtras,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericMarket::TotalRuns => "total_runs",
            NumericMarket::MatchFours => "match_fours",
            NumericMarket::MatchSixes => "match_sixes",
            NumericMarket::MatchBoundaries => "match_boundaries",
            NumericMarket::HomeTotalFours => "home_total_fours",
            NumericMarket::AwayTotalFours => "away_total_fours",
            NumericMarket::HomeTotalSixes => "home_total_sixes",
            NumericMarket::AwayTotalSixes => "away_total_sixes",
            NumericMarket::HomeTotalBoundaries => "home_total_boundaries",
            NumericMarket::AwayTotalBoundaries => "away_total_boundaries",
            NumericMarket::HighestIndividualScore => "highest_individual_score",
            NumericMarket::HomeHighestIndividual => "home_highest_individual",
            NumericMarket::AwayHighestIndividual => "away_highest_individual",
            NumericMarket::MostRunsSingleOver => "most_runs_single_over",
            NumericMarket::HomeMostRunsSingleOver => "home_most_runs_single_over",
            NumericMarket::AwayMostRunsSingleOver => "away_most_runs_single_over",
            NumericMarket::HomeWicketsCaught => "home_wickets_caught",
            NumericMarket::AwayWicketsCaught => "away_wickets_caught",
            NumericMarket::RunsFirst6Overs => "runs_first_6_overs",
            NumericMarket::RunsFirst10Overs => "runs_first_10_overs",
            NumericMarket::RunsFirst15Overs => "runs_first_15_overs",
            NumericMarket::FirstInningsPowerplay => "first_innings_powerplay",
            NumericMarket::FirstInningsMiddle => "first_innings_middle",
            NumericMarket::FirstInningsDeath => "first_innings_death",
            NumericMarket::FirstInningsOvers7To13 => "first_innings_overs_7_13",
            NumericMarket::FirstInningsOvers14To20 => "first_innings_overs_14_20",
            NumericMarket::RunsAtFallFirstWicket => "runs_at_fall_first_wicket",
            NumericMarket::OpeningPartnership => "opening_partnership",
            NumericMarket::TotalExtras => "total_extras",
        }
    }
}

impl fmt::Display for NumericMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumericMarket {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        NumericMarket::ALL
            .into_iter()
            .find(|m| m.name() == key)
            .ok_or_else(|| EngineError::UnknownMarket(s.to_string()))
    }
}

impl TryFrom<String> for NumericMarket {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NumericMarket> for String {
    fn from(value: NumericMarket) -> Self {
        value.name().to_string()
    }
}

/// Markets that tally one outcome bucket per match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalMarket {
    MatchWinner,
    TossWinner,
    MostSixes,
    MostFours,
    MostExtras,
    FirstWicketMethod,
    FiftyScored,
    HundredScored,
    HomeFiftyScored,
    AwayFiftyScored,
    HomeHundredScored,
    AwayHundredScored,
    FirstBallDot,
    SixBoundariesInOver,
    FourAndSixInOver,
    FirstScoringShot,
    OpeningPartnershipOutcome,
}

const YES_NO: &[&str] = &["yes", "no"];
const HEAD_TO_HEAD: &[&str] = &["team_1", "team_2", "tie"];

impl CategoricalMarket {
    pub const ALL: [CategoricalMarket; 17] = [
        CategoricalMarket::MatchWinner,
        CategoricalMarket::TossWinner,
        CategoricalMarket::MostSixes,
        CategoricalMarket::MostFours,
        CategoricalMarket::MostExtras,
        CategoricalMarket::FirstWicketMethod,
        CategoricalMarket::FiftyScored,
        CategoricalMarket::HundredScored,
        CategoricalMarket::HomeFiftyScored,
        CategoricalMarket::AwayFiftyScored,
        CategoricalMarket::HomeHundredScored,
        CategoricalMarket::AwayHundredScored,
        CategoricalMarket::FirstBallDot,
        CategoricalMarket::SixBoundariesInOver,
        CategoricalMarket::FourAndSixInOver,
        CategoricalMarket::FirstScoringShot,
        CategoricalMarket::OpeningPartnershipOutcome,
    ];

    /// Bucket labels in reporting order.
    pub fn outcomes(self) -> &'static [&'static str] {
        match self {
            CategoricalMarket::MatchWinner => &["team_1", "team_2", "tie", "no_result"],
            CategoricalMarket::TossWinner => &["team_1", "team_2"],
            CategoricalMarket::MostSixes
            | CategoricalMarket::MostFours
            | CategoricalMarket::MostExtras => HEAD_TO_HEAD,
            CategoricalMarket::FirstWicketMethod => {
                &["caught", "bowled", "lbw", "run_out", "stumped", "others"]
            }
            CategoricalMarket::FirstScoringShot => {
                &["single", "two", "three", "four", "six", "others"]
            }
            CategoricalMarket::OpeningPartnershipOutcome => &["home_wins", "away_wins", "ties"],
            CategoricalMarket::FiftyScored
            | CategoricalMarket::HundredScored
            | CategoricalMarket::HomeFiftyScored
            | CategoricalMarket::AwayFiftyScored
            | CategoricalMarket::HomeHundredScored
            | CategoricalMarket::AwayHundredScored
            | CategoricalMarket::FirstBallDot
            | CategoricalMarket::SixBoundariesInOver
            | CategoricalMarket::FourAndSixInOver => YES_NO,
        }
    }
}

/// Outcome label -> occurrence count, in a fixed bucket order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalTally {
    pub buckets: Vec<(String, u64)>,
}

impl CategoricalTally {
    pub fn for_market(market: CategoricalMarket) -> Self {
        Self {
            buckets: market
                .outcomes()
                .iter()
                .map(|label| (label.to_string(), 0))
                .collect(),
        }
    }

    pub fn increment(&mut self, label: &str) {
        self.add(label, 1);
    }

    fn add(&mut self, label: &str, n: u64) {
        match self.buckets.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += n,
            None => self.buckets.push((label.to_string(), n)),
        }
    }

    pub fn count(&self, label: &str) -> u64 {
        self.buckets
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|(_, c)| c).sum()
    }
}

/// Everything one match contributes to the corpus-wide markets. Produced by a
/// pure reduction so matches can be extracted independently and merged later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMarkets {
    pub match_id: String,
    pub numeric: Vec<(NumericMarket, f64)>,
    pub categorical: Vec<(CategoricalMarket, String)>,
}

impl MatchMarkets {
    fn num(&mut self, market: NumericMarket, value: u32) {
        self.numeric.push((market, f64::from(value)));
    }

    fn cat(&mut self, market: CategoricalMarket, label: &str) {
        self.categorical.push((market, label.to_string()));
    }

    fn yes_no(&mut self, market: CategoricalMarket, flag: bool) {
        self.cat(market, if flag { "yes" } else { "no" });
    }

    pub fn value(&self, market: NumericMarket) -> Option<f64> {
        self.numeric
            .iter()
            .find(|(m, _)| *m == market)
            .map(|(_, v)| *v)
    }

    pub fn outcome(&self, market: CategoricalMarket) -> Option<&str> {
        self.categorical
            .iter()
            .find(|(m, _)| *m == market)
            .map(|(_, l)| l.as_str())
    }
}

/// Batting totals for one side, summed over every innings it batted.
#[derive(Debug, Clone, Copy, Default)]
struct SideTotals {
    fours: u32,
    sixes: u32,
    extras: u32,
    caught: u32,
    highest_individual: u32,
    highest_over: u32,
    fifty: bool,
    hundred: bool,
}

fn side_totals(stats: &MatchStats, team: &str) -> Option<SideTotals> {
    let mut out: Option<SideTotals> = None;
    for inn in stats.innings.iter().filter(|i| i.team == team) {
        let t = out.get_or_insert_with(SideTotals::default);
        t.fours += inn.fours;
        t.sixes += inn.sixes;
        t.extras += inn.extras_runs;
        t.caught += inn.caught_dismissals;
        t.highest_individual = t.highest_individual.max(inn.highest_individual);
        t.highest_over = t.highest_over.max(inn.highest_over);
        t.fifty |= inn.fifty_scored;
        t.hundred |= inn.hundred_scored;
    }
    out
}

fn head_to_head(home: u32, away: u32) -> &'static str {
    if home > away {
        "team_1"
    } else if away > home {
        "team_2"
    } else {
        "tie"
    }
}

/// Derive every market sample and tally for one match.
pub fn derive_match_markets(record: &MatchRecord, stats: &MatchStats) -> MatchMarkets {
    use CategoricalMarket as C;
    use NumericMarket as N;

    let mut out = MatchMarkets {
        match_id: record.match_id.clone(),
        ..Default::default()
    };
    let home = record.home();
    let away = record.away();

    match record.winner() {
        Some(w) if w == home => out.cat(C::MatchWinner, "team_1"),
        Some(w) if w == away => out.cat(C::MatchWinner, "team_2"),
        _ if record.is_tie() => out.cat(C::MatchWinner, "tie"),
        _ => out.cat(C::MatchWinner, "no_result"),
    }
    match record.toss_winner() {
        Some(t) if t == home => out.cat(C::TossWinner, "team_1"),
        Some(t) if t == away => out.cat(C::TossWinner, "team_2"),
        _ => {}
    }

    let fours = stats.total_fours();
    let sixes = stats.total_sixes();
    out.num(N::TotalRuns, stats.total_runs());
    out.num(N::MatchFours, fours);
    out.num(N::MatchSixes, sixes);
    out.num(N::MatchBoundaries, fours + sixes);
    out.num(
        N::HighestIndividualScore,
        stats.innings.iter().map(|i| i.highest_individual).max().unwrap_or(0),
    );
    out.num(
        N::MostRunsSingleOver,
        stats.innings.iter().map(|i| i.highest_over).max().unwrap_or(0),
    );
    out.num(N::TotalExtras, stats.total_extras());

    // Phase markets look at the first innings only.
    if let Some(first) = stats.innings.first() {
        out.num(N::RunsFirst6Overs, first.runs_first_6);
        out.num(N::RunsFirst10Overs, first.runs_first_10);
        out.num(N::RunsFirst15Overs, first.runs_first_15);
        out.num(N::FirstInningsPowerplay, first.phase_runs.powerplay);
        out.num(N::FirstInningsMiddle, first.phase_runs.middle);
        out.num(N::FirstInningsDeath, first.phase_runs.death);
        out.num(N::FirstInningsOvers7To13, first.window_runs.overs_7_13);
        out.num(N::FirstInningsOvers14To20, first.window_runs.overs_14_20);
    }

    // Taken from the last innings that lost a wicket, not the first.
    if let Some(inn) = stats.last_wicket_innings() {
        if let Some(fall) = inn.fall_of_first_wicket
            && fall > 0
        {
            out.num(N::RunsAtFallFirstWicket, fall);
        }
        if let Some(method) = inn.first_wicket_method {
            out.cat(C::FirstWicketMethod, method.label());
        }
    }

    let partnerships = stats
        .innings
        .iter()
        .filter_map(|i| i.fall_of_first_wicket)
        .collect::<Vec<_>>();
    for p in &partnerships {
        out.num(N::OpeningPartnership, *p);
    }
    if !partnerships.is_empty() {
        let label = match record.winner() {
            Some(w) if w == home => "home_wins",
            Some(w) if w == away => "away_wins",
            _ => "ties",
        };
        out.cat(C::OpeningPartnershipOutcome, label);
    }

    if let Some(dot) = stats.first_ball_dot {
        out.yes_no(C::FirstBallDot, dot);
    }
    if let Some(shot) = stats.first_ball_shot {
        out.cat(C::FirstScoringShot, shot.label());
    }
    out.yes_no(
        C::SixBoundariesInOver,
        stats.innings.iter().any(|i| i.six_boundary_over),
    );
    out.yes_no(
        C::FourAndSixInOver,
        stats.innings.iter().any(|i| i.four_and_six_in_over),
    );
    out.yes_no(C::FiftyScored, stats.innings.iter().any(|i| i.fifty_scored));
    out.yes_no(
        C::HundredScored,
        stats.innings.iter().any(|i| i.hundred_scored),
    );

    let home_side = side_totals(stats, home);
    let away_side = side_totals(stats, away);
    if let Some(h) = home_side {
        out.num(N::HomeTotalFours, h.fours);
        out.num(N::HomeTotalSixes, h.sixes);
        out.num(N::HomeTotalBoundaries, h.fours + h.sixes);
        out.num(N::HomeHighestIndividual, h.highest_individual);
        out.num(N::HomeMostRunsSingleOver, h.highest_over);
        out.num(N::HomeWicketsCaught, h.caught);
        out.yes_no(C::HomeFiftyScored, h.fifty);
        out.yes_no(C::HomeHundredScored, h.hundred);
    }
    if let Some(a) = away_side {
        out.num(N::AwayTotalFours, a.fours);
        out.num(N::AwayTotalSixes, a.sixes);
        out.num(N::AwayTotalBoundaries, a.fours + a.sixes);
        out.num(N::AwayHighestIndividual, a.highest_individual);
        out.num(N::AwayMostRunsSingleOver, a.highest_over);
        out.num(N::AwayWicketsCaught, a.caught);
        out.yes_no(C::AwayFiftyScored, a.fifty);
        out.yes_no(C::AwayHundredScored, a.hundred);
    }

    let h = home_side.unwrap_or_default();
    let a = away_side.unwrap_or_default();
    out.cat(C::MostSixes, head_to_head(h.sixes, a.sixes));
    out.cat(C::MostFours, head_to_head(h.fours, a.fours));
    out.cat(C::MostExtras, head_to_head(h.extras, a.extras));

    out
}

/// Corpus-wide market state: an append-only sample per numeric market and a
/// tally per categorical market. Not shared between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBook {
    pub matches: usize,
    numeric: BTreeMap<NumericMarket, Vec<f64>>,
    categorical: BTreeMap<CategoricalMarket, CategoricalTally>,
}

impl Default for MarketBook {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketBook {
    pub fn new() -> Self {
        Self {
            matches: 0,
            numeric: NumericMarket::ALL
                .into_iter()
                .map(|m| (m, Vec::new()))
                .collect(),
            categorical: CategoricalMarket::ALL
                .into_iter()
                .map(|m| (m, CategoricalTally::for_market(m)))
                .collect(),
        }
    }

    pub fn absorb(&mut self, markets: &MatchMarkets) {
        self.matches += 1;
        for (market, value) in &markets.numeric {
            self.numeric.entry(*market).or_default().push(*value);
        }
        for (market, label) in &markets.categorical {
            self.categorical
                .entry(*market)
                .or_insert_with(|| CategoricalTally::for_market(*market))
                .increment(label);
        }
    }

    /// Append `other` after everything already held. Merging partial books in
    /// corpus order reproduces the sequential result exactly.
    pub fn merge(&mut self, other: MarketBook) {
        self.matches += other.matches;
        for (market, values) in other.numeric {
            self.numeric.entry(market).or_default().extend(values);
        }
        for (market, tally) in other.categorical {
            let dst = self
                .categorical
                .entry(market)
                .or_insert_with(|| CategoricalTally::for_market(market));
            for (label, n) in tally.buckets {
                dst.add(&label, n);
            }
        }
    }

    pub fn sample(&self, market: NumericMarket) -> &[f64] {
        self.numeric.get(&market).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tally(&self, market: CategoricalMarket) -> Option<&CategoricalTally> {
        self.categorical.get(&market)
    }

    pub fn numeric_markets(&self) -> impl Iterator<Item = (NumericMarket, &[f64])> {
        self.numeric.iter().map(|(m, v)| (*m, v.as_slice()))
    }

    pub fn categorical_markets(&self) -> impl Iterator<Item = (CategoricalMarket, &CategoricalTally)> {
        self.categorical.iter().map(|(m, t)| (*m, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_stats::extract_match_stats;
    use crate::model::parse_match_json;

    fn sample_match() -> MatchRecord {
        let raw = serde_json::json!({
            "info": {
                "teams": ["Home XI", "Away XI"],
                "toss": {"winner": "Away XI", "decision": "field"},
                "outcome": {"winner": "Away XI"}
            },
            "innings": [
                {"team": "Home XI", "overs": [
                    {"over": 0, "deliveries": [
                        {"batter": "h1", "bowler": "a1", "runs": {"batter": 0, "extras": 0, "total": 0}},
                        {"batter": "h1", "bowler": "a1", "runs": {"batter": 6, "extras": 0, "total": 6}},
                        {"batter": "h1", "bowler": "a1", "runs": {"batter": 0, "extras": 0, "total": 0},
                         "wickets": [{"kind": "caught", "player_out": "h1"}]}
                    ]}
                ]},
                {"team": "Away XI", "overs": [
                    {"over": 0, "deliveries": [
                        {"batter": "a2", "bowler": "h2", "runs": {"batter": 4, "extras": 0, "total": 4}},
                        {"batter": "a2", "bowler": "h2", "runs": {"batter": 0, "extras": 1, "total": 1},
                         "extras": {"wides": 1}},
                        {"batter": "a2", "bowler": "h2", "runs": 4}
                    ]}
                ]}
            ]
        });
        parse_match_json("m1", &raw.to_string()).unwrap()
    }

    #[test]
    fn market_names_round_trip_through_from_str() {
        for m in NumericMarket::ALL {
            assert_eq!(m.name().parse::<NumericMarket>().unwrap(), m);
        }
        assert!("nope".parse::<NumericMarket>().is_err());
    }

    #[test]
    fn derives_positional_and_comparative_markets() {
        let record = sample_match();
        let stats = extract_match_stats(&record);
        let mk = derive_match_markets(&record, &stats);

        assert_eq!(mk.value(NumericMarket::TotalRuns), Some(15.0));
        assert_eq!(mk.value(NumericMarket::MatchBoundaries), Some(3.0));
        assert_eq!(mk.value(NumericMarket::HomeTotalSixes), Some(1.0));
        assert_eq!(mk.value(NumericMarket::AwayTotalFours), Some(2.0));
        assert_eq!(mk.value(NumericMarket::HomeWicketsCaught), Some(1.0));
        assert_eq!(mk.value(NumericMarket::RunsAtFallFirstWicket), Some(6.0));
        assert_eq!(mk.value(NumericMarket::RunsFirst6Overs), Some(6.0));
        assert_eq!(mk.value(NumericMarket::TotalExtras), Some(1.0));

        assert_eq!(mk.outcome(CategoricalMarket::MatchWinner), Some("team_2"));
        assert_eq!(mk.outcome(CategoricalMarket::TossWinner), Some("team_2"));
        assert_eq!(mk.outcome(CategoricalMarket::MostSixes), Some("team_1"));
        assert_eq!(mk.outcome(CategoricalMarket::MostFours), Some("team_2"));
        assert_eq!(mk.outcome(CategoricalMarket::MostExtras), Some("team_2"));
        assert_eq!(mk.outcome(CategoricalMarket::FirstBallDot), Some("yes"));
        assert_eq!(mk.outcome(CategoricalMarket::FirstScoringShot), None);
        assert_eq!(mk.outcome(CategoricalMarket::FirstWicketMethod), Some("caught"));
        assert_eq!(
            mk.outcome(CategoricalMarket::OpeningPartnershipOutcome),
            Some("away_wins")
        );
        let partnerships = mk
            .numeric
            .iter()
            .filter(|(m, _)| *m == NumericMarket::OpeningPartnership)
            .map(|(_, v)| *v)
            .collect::<Vec<_>>();
        assert_eq!(partnerships, vec![6.0]);
    }

    fn two_ball_match(outcome: serde_json::Value, first: i64, second: i64) -> MatchRecord {
        let raw = serde_json::json!({
            "info": {"teams": ["Home XI", "Away XI"], "outcome": outcome},
            "innings": [{"team": "Home XI", "overs": [{"over": 0, "deliveries": [
                {"batter": "h1", "bowler": "a1", "runs": first},
                {"batter": "h1", "bowler": "a1", "runs": second}
            ]}]}]
        });
        parse_match_json("m2", &raw.to_string()).unwrap()
    }

    #[test]
    fn scoring_shot_comes_from_the_opening_ball_only() {
        let record = two_ball_match(serde_json::json!({}), 0, 4);
        let mk = derive_match_markets(&record, &extract_match_stats(&record));
        assert_eq!(mk.outcome(CategoricalMarket::FirstBallDot), Some("yes"));
        assert_eq!(mk.outcome(CategoricalMarket::FirstScoringShot), None);

        let record = two_ball_match(serde_json::json!({}), 4, 0);
        let mk = derive_match_markets(&record, &extract_match_stats(&record));
        assert_eq!(mk.outcome(CategoricalMarket::FirstBallDot), Some("no"));
        assert_eq!(mk.outcome(CategoricalMarket::FirstScoringShot), Some("four"));
    }

    #[test]
    fn tied_result_lands_in_tie_bucket() {
        let record = two_ball_match(serde_json::json!({"result": "tie"}), 1, 1);
        let mk = derive_match_markets(&record, &extract_match_stats(&record));
        assert_eq!(mk.outcome(CategoricalMarket::MatchWinner), Some("tie"));

        let record = two_ball_match(serde_json::json!({"result": "no result"}), 1, 1);
        let mk = derive_match_markets(&record, &extract_match_stats(&record));
        assert_eq!(mk.outcome(CategoricalMarket::MatchWinner), Some("no_result"));
    }

    #[test]
    fn book_merge_matches_sequential_absorb() {
        let record = sample_match();
        let stats = extract_match_stats(&record);
        let mk = derive_match_markets(&record, &stats);

        let mut sequential = MarketBook::new();
        sequential.absorb(&mk);
        sequential.absorb(&mk);

        let mut left = MarketBook::new();
        left.absorb(&mk);
        let mut right = MarketBook::new();
        right.absorb(&mk);
        left.merge(right);

        assert_eq!(left, sequential);
        assert_eq!(left.sample(NumericMarket::TotalRuns), &[15.0, 15.0]);
        let tally = left.tally(CategoricalMarket::MatchWinner).unwrap();
        assert_eq!(tally.count("team_2"), 2);
        assert_eq!(tally.total(), 2);
    }
}
