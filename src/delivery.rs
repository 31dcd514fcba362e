use serde::{Deserialize, Serialize};

use crate::model::{InningsRecord, OverRecord, RawDelivery, RawRuns};

/// Canonical delivery. `total_runs == batter_runs + extras_runs` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedDelivery {
    pub batter_runs: u32,
    pub extras_runs: u32,
    pub total_runs: u32,
    pub wides: u32,
    pub is_wicket: bool,
    pub wicket_method: Option<DismissalKind>,
    /// Dismissals on this ball whose kind contains "caught".
    pub caught_dismissals: u32,
    /// No wide or no-ball entry in the extras breakdown.
    pub is_legal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalKind {
    Caught,
    Bowled,
    Lbw,
    RunOut,
    Stumped,
    Others,
}

impl DismissalKind {
    pub const ALL: [DismissalKind; 6] = [
        DismissalKind::Caught,
        DismissalKind::Bowled,
        DismissalKind::Lbw,
        DismissalKind::RunOut,
        DismissalKind::Stumped,
        DismissalKind::Others,
    ];

    /// Substring classification; order matters ("caught and bowled" is caught).
    pub fn classify(raw_kind: &str) -> Self {
        let kind = raw_kind.to_ascii_lowercase();
        if kind.contains("caught") {
            DismissalKind::Caught
        } else if kind.contains("bowled") {
            DismissalKind::Bowled
        } else if kind.contains("lbw") {
            DismissalKind::Lbw
        } else if kind.contains("run out") {
            DismissalKind::RunOut
        } else if kind.contains("stumped") {
            DismissalKind::Stumped
        } else {
            DismissalKind::Others
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DismissalKind::Caught => "caught",
            DismissalKind::Bowled => "bowled",
            DismissalKind::Lbw => "lbw",
            DismissalKind::RunOut => "run_out",
            DismissalKind::Stumped => "stumped",
            DismissalKind::Others => "others",
        }
    }
}

/// Category of a scoring shot, keyed on runs off the bat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringShot {
    Single,
    Two,
    Three,
    Four,
    Six,
    Others,
}

impl ScoringShot {
    pub const ALL: [ScoringShot; 6] = [
        ScoringShot::Single,
        ScoringShot::Two,
        ScoringShot::Three,
        ScoringShot::Four,
        ScoringShot::Six,
        ScoringShot::Others,
    ];

    /// `None` for a ball that scored nothing off the bat.
    pub fn from_batter_runs(runs: u32) -> Option<Self> {
        match runs {
            0 => None,
            1 => Some(ScoringShot::Single),
            2 => Some(ScoringShot::Two),
            3 => Some(ScoringShot::Three),
            4 => Some(ScoringShot::Four),
            6 => Some(ScoringShot::Six),
            _ => Some(ScoringShot::Others),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoringShot::Single => "single",
            ScoringShot::Two => "two",
            ScoringShot::Three => "three",
            ScoringShot::Four => "four",
            ScoringShot::Six => "six",
            ScoringShot::Others => "others",
        }
    }
}

pub fn normalize(raw: &RawDelivery) -> NormalizedDelivery {
    let (batter_runs, extras_runs) = match raw.runs.as_ref() {
        Some(RawRuns::Legacy(n)) => (clamp_runs(*n), 0),
        Some(RawRuns::Structured(b)) => {
            let batter = b.batter.map(clamp_runs).unwrap_or(0);
            // A missing extras field is recovered from total when possible.
            let extras = match (b.extras, b.total) {
                (Some(e), _) => clamp_runs(e),
                (None, Some(t)) => clamp_runs(t).saturating_sub(batter),
                (None, None) => 0,
            };
            (batter, extras)
        }
        Some(RawRuns::Unrecognized(_)) | None => (0, 0),
    };

    let (wides, is_legal) = match raw.extras.as_ref() {
        Some(extras) => (
            extras.wides.map(clamp_runs).unwrap_or(0),
            extras.wides.is_none() && extras.noballs.is_none(),
        ),
        None => (0, true),
    };

    let wicket_method = raw
        .wickets
        .first()
        .map(|w| DismissalKind::classify(&w.kind));
    let caught_dismissals = raw
        .wickets
        .iter()
        .filter(|w| w.kind.to_ascii_lowercase().contains("caught"))
        .count() as u32;

    NormalizedDelivery {
        batter_runs,
        extras_runs,
        total_runs: batter_runs + extras_runs,
        wides,
        is_wicket: !raw.wickets.is_empty(),
        wicket_method,
        caught_dismissals,
        is_legal,
    }
}

fn clamp_runs(n: i64) -> u32 {
    n.clamp(0, i64::from(u32::MAX / 2)) as u32
}

impl NormalizedDelivery {
    pub fn is_four(&self) -> bool {
        self.batter_runs == 4
    }

    pub fn is_six(&self) -> bool {
        self.batter_runs == 6
    }

    pub fn is_boundary(&self) -> bool {
        self.is_four() || self.is_six()
    }

    pub fn is_dot(&self) -> bool {
        self.total_runs == 0
    }
}

/// A normalized delivery together with the names and position it came with.
#[derive(Debug, Clone, Copy)]
pub struct Ball<'a> {
    pub over: u32,
    /// 0-based position within the over, counting every delivery.
    pub index_in_over: usize,
    pub batter: &'a str,
    pub bowler: &'a str,
    pub delivery: NormalizedDelivery,
}

impl OverRecord {
    pub fn balls(&self) -> impl Iterator<Item = Ball<'_>> {
        self.deliveries.iter().enumerate().map(|(idx, raw)| Ball {
            over: self.over,
            index_in_over: idx,
            batter: raw.batter.as_str(),
            bowler: raw.bowler.as_str(),
            delivery: normalize(raw),
        })
    }
}

impl InningsRecord {
    pub fn balls(&self) -> impl Iterator<Item = Ball<'_>> {
        self.overs().iter().flat_map(OverRecord::balls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtrasBreakdown, RunsBreakdown, WicketEvent};

    fn structured(batter: Option<i64>, extras: Option<i64>, total: Option<i64>) -> RawDelivery {
        RawDelivery {
            runs: Some(RawRuns::Structured(RunsBreakdown {
                batter,
                extras,
                total,
            })),
            ..Default::default()
        }
    }

    #[test]
    fn legacy_integer_is_all_batter_runs() {
        let raw = RawDelivery {
            runs: Some(RawRuns::Legacy(3)),
            ..Default::default()
        };
        let d = normalize(&raw);
        assert_eq!((d.batter_runs, d.extras_runs, d.total_runs), (3, 0, 3));
        assert!(d.is_legal);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let d = normalize(&structured(None, None, None));
        assert_eq!(d.total_runs, 0);
        let d = normalize(&RawDelivery::default());
        assert_eq!(d.total_runs, 0);
        let d = normalize(&structured(Some(1), None, Some(3)));
        assert_eq!((d.batter_runs, d.extras_runs, d.total_runs), (1, 2, 3));
    }

    #[test]
    fn total_always_sums_components() {
        // A disagreeing raw total is ignored in favour of batter + extras.
        let d = normalize(&structured(Some(4), Some(1), Some(9)));
        assert_eq!(d.total_runs, d.batter_runs + d.extras_runs);
        assert_eq!(d.total_runs, 5);
    }

    #[test]
    fn wides_and_noballs_are_illegal() {
        let mut raw = structured(Some(0), Some(1), Some(1));
        raw.extras = Some(ExtrasBreakdown {
            wides: Some(1),
            ..Default::default()
        });
        let d = normalize(&raw);
        assert!(!d.is_legal);
        assert_eq!(d.wides, 1);

        raw.extras = Some(ExtrasBreakdown {
            legbyes: Some(1),
            ..Default::default()
        });
        assert!(normalize(&raw).is_legal);
    }

    #[test]
    fn extras_key_presence_decides_legality() {
        let parse = |json: &str| normalize(&serde_json::from_str::<RawDelivery>(json).unwrap());

        let d = parse(r#"{"runs": {"batter": 0, "extras": 1, "total": 1}, "extras": {"wides": null}}"#);
        assert!(!d.is_legal);
        assert_eq!(d.wides, 0);

        let d = parse(r#"{"runs": 1, "extras": {"noballs": "x"}}"#);
        assert!(!d.is_legal);

        let d = parse(r#"{"runs": 0, "extras": {"byes": 1}}"#);
        assert!(d.is_legal);
    }

    #[test]
    fn malformed_fields_degrade_to_zero() {
        let raw: RawDelivery = serde_json::from_str(
            r#"{"batter": null, "bowler": 7, "runs": {"batter": "4", "extras": null, "total": 4},
                "extras": "oops", "wickets": {"kind": "stumped", "player_out": null}}"#,
        )
        .unwrap();
        assert_eq!(raw.batter, "");
        assert_eq!(raw.bowler, "7");
        let d = normalize(&raw);
        assert_eq!((d.batter_runs, d.extras_runs, d.total_runs), (4, 0, 4));
        assert!(d.is_legal);
        assert!(d.is_wicket);
        assert_eq!(d.wicket_method, Some(DismissalKind::Stumped));
    }

    #[test]
    fn first_wicket_kind_is_classified() {
        let mut raw = structured(Some(0), Some(0), Some(0));
        raw.wickets = vec![
            WicketEvent {
                kind: "caught and bowled".to_string(),
                player_out: None,
            },
            WicketEvent {
                kind: "run out".to_string(),
                player_out: None,
            },
        ];
        let d = normalize(&raw);
        assert!(d.is_wicket);
        assert_eq!(d.wicket_method, Some(DismissalKind::Caught));
        assert_eq!(d.caught_dismissals, 1);
        assert_eq!(DismissalKind::classify("LBW"), DismissalKind::Lbw);
        assert_eq!(DismissalKind::classify("hit wicket"), DismissalKind::Others);
        assert_eq!(DismissalKind::classify("run out"), DismissalKind::RunOut);
    }

    #[test]
    fn scoring_shot_categories() {
        assert_eq!(ScoringShot::from_batter_runs(0), None);
        assert_eq!(ScoringShot::from_batter_runs(6), Some(ScoringShot::Six));
        assert_eq!(ScoringShot::from_batter_runs(5), Some(ScoringShot::Others));
    }
}
