//! Seeded generator of plausible T20 match files, for demos, benches and
//! property tests. Mixes both run encodings and includes extras and wickets.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::pipeline::MatchSource;

const TEAMS: [&str; 8] = [
    "Harbour Kings",
    "Desert Falcons",
    "River Rangers",
    "Hill Tigers",
    "Coast Strikers",
    "Valley Royals",
    "City Titans",
    "Plains Warriors",
];

const VENUES: [&str; 5] = [
    "Harbour Oval",
    "Desert Park",
    "Riverside Ground",
    "Hilltop Stadium",
    "Coastline Arena",
];

const DISMISSALS: [(&str, u32); 6] = [
    ("caught", 55),
    ("bowled", 17),
    ("lbw", 12),
    ("run out", 8),
    ("stumped", 4),
    ("caught and bowled", 4),
];

// Runs off the bat on a legal, non-wicket ball.
const RUN_WEIGHTS: [(u32, u32); 6] = [(0, 36), (1, 37), (2, 8), (3, 1), (4, 13), (6, 5)];

pub fn generate_corpus(seed: u64, matches: usize) -> Vec<MatchSource> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..matches)
        .map(|idx| {
            let value = generate_match(&mut rng, idx);
            MatchSource::new(format!("synthetic_{idx:04}.json"), value.to_string())
        })
        .collect()
}

pub fn generate_match(rng: &mut impl Rng, idx: usize) -> Value {
    let mut pair = TEAMS.choose_multiple(rng, 2).copied().collect::<Vec<_>>();
    pair.shuffle(rng);
    let (home, away) = (pair[0], pair[1]);
    let squads = [squad(home), squad(away)];
    // Every fifth match uses the legacy bare-integer run encoding.
    let legacy = idx % 5 == 4;

    let toss_idx = rng.gen_range(0..2);
    let bat_first = rng.gen_bool(0.45);
    let decision = if bat_first { "bat" } else { "field" };
    let first_bat = if bat_first { toss_idx } else { 1 - toss_idx };
    let order = [first_bat, 1 - first_bat];

    let (first, first_total) = innings(rng, &squads[order[0]], &squads[order[1]], None, legacy);
    let (second, second_total) =
        innings(rng, &squads[order[1]], &squads[order[0]], Some(first_total + 1), legacy);

    let mut outcome = json!({});
    if first_total > second_total {
        outcome["winner"] = json!(squads[order[0]].name);
    } else if second_total > first_total {
        outcome["winner"] = json!(squads[order[1]].name);
    } else {
        outcome["result"] = json!("tie");
    }

    let date = NaiveDate::from_ymd_opt(2023, 4, 1)
        .map(|d| d + Duration::days(idx as i64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let potm = squads[order[0]].players[rng.gen_range(0..4)].clone();

    json!({
        "info": {
            "teams": [home, away],
            "toss": {"winner": squads[toss_idx].name, "decision": decision},
            "outcome": outcome,
            "player_of_match": [potm],
            "players": {
                home: squads[0].players,
                away: squads[1].players,
            },
            "dates": [date],
            "venue": VENUES[idx % VENUES.len()],
            "season": 2023 + (idx / 60) as i64,
        },
        "innings": [first, second]
    })
}

struct Squad {
    name: String,
    players: Vec<String>,
}

fn squad(team: &str) -> Squad {
    let short = team
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .collect::<String>();
    Squad {
        name: team.to_string(),
        players: (1..=11).map(|n| format!("{short} Player {n}")).collect(),
    }
}

fn weighted<'a, T>(rng: &mut impl Rng, table: &'a [(T, u32)]) -> &'a T {
    let total: u32 = table.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (item, w) in table {
        if roll < *w {
            return item;
        }
        roll -= w;
    }
    &table[table.len() - 1].0
}

fn innings(rng: &mut impl Rng, batting: &Squad, bowling: &Squad, target: Option<u32>, legacy: bool) -> (Value, u32) {
    let mut overs = Vec::new();
    let mut total = 0u32;
    let mut wickets = 0usize;
    let mut striker = 0usize;
    let mut non_striker = 1usize;
    let mut next_in = 2usize;

    'overs: for over in 0..20u32 {
        let bowler = &bowling.players[6 + (over as usize % 5)];
        let mut deliveries = Vec::new();
        let mut legal = 0;
        while legal < 6 {
            let batter = &batting.players[striker];
            let roll: f64 = rng.gen_range(0.0..1.0);
            let delivery = if roll < 0.035 {
                total += 1;
                json!({"batter": batter, "bowler": bowler,
                       "runs": {"batter": 0, "extras": 1, "total": 1},
                       "extras": {"wides": 1}})
            } else if roll < 0.045 {
                let off_bat = *weighted(rng, &RUN_WEIGHTS);
                total += off_bat + 1;
                json!({"batter": batter, "bowler": bowler,
                       "runs": {"batter": off_bat, "extras": 1, "total": off_bat + 1},
                       "extras": {"noballs": 1}})
            } else if roll < 0.095 {
                legal += 1;
                let kind = *weighted(rng, &DISMISSALS);
                let out = batter.clone();
                wickets += 1;
                if next_in < batting.players.len() {
                    striker = next_in;
                    next_in += 1;
                }
                let runs = if legacy { json!(0) } else { json!({"batter": 0, "extras": 0, "total": 0}) };
                json!({"batter": out, "bowler": bowler, "runs": runs,
                       "wickets": [{"kind": kind, "player_out": out}]})
            } else if roll < 0.11 {
                legal += 1;
                total += 1;
                std::mem::swap(&mut striker, &mut non_striker);
                json!({"batter": batter, "bowler": bowler,
                       "runs": {"batter": 0, "extras": 1, "total": 1},
                       "extras": {"legbyes": 1}})
            } else {
                legal += 1;
                let off_bat = *weighted(rng, &RUN_WEIGHTS);
                total += off_bat;
                if off_bat % 2 == 1 {
                    std::mem::swap(&mut striker, &mut non_striker);
                }
                let runs = if legacy {
                    json!(off_bat)
                } else {
                    json!({"batter": off_bat, "extras": 0, "total": off_bat})
                };
                json!({"batter": batter, "bowler": bowler, "runs": runs})
            };
            deliveries.push(delivery);

            let chased = target.is_some_and(|t| total >= t);
            if wickets >= 10 || chased {
                overs.push(json!({"over": over, "deliveries": deliveries}));
                break 'overs;
            }
        }
        overs.push(json!({"over": over, "deliveries": deliveries}));
        std::mem::swap(&mut striker, &mut non_striker);
    }

    (json!({"team": batting.name, "overs": overs}), total)
}
