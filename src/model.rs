use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// One match file: `info` block plus ball-by-ball innings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// File identity, assigned by the loader (not part of the source JSON).
    #[serde(default)]
    pub match_id: String,
    pub info: MatchInfo,
    #[serde(default)]
    pub innings: Vec<InningsRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub toss: TossInfo,
    #[serde(default)]
    pub outcome: OutcomeInfo,
    #[serde(default)]
    pub player_of_match: Vec<String>,
    /// Squads keyed by team name.
    #[serde(default)]
    pub players: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub venue: Option<String>,
    // Seen as both "2019" and 2019 in the wild.
    #[serde(default)]
    pub season: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TossInfo {
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub decision: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeInfo {
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Field,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InningsRecord {
    #[serde(default = "unknown_team")]
    pub team: String,
    #[serde(default)]
    pub overs: Option<Vec<OverRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverRecord {
    /// 0-indexed over number.
    #[serde(default)]
    pub over: u32,
    /// Entries that are not objects are dropped.
    #[serde(default, deserialize_with = "objects_only")]
    pub deliveries: Vec<RawDelivery>,
}

/// One delivery as found in the file. Every field tolerates nulls and
/// mistyped values so a damaged delivery degrades to zero instead of failing
/// the whole match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDelivery {
    #[serde(default, deserialize_with = "string_or_default")]
    pub batter: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub bowler: String,
    #[serde(default)]
    pub runs: Option<RawRuns>,
    #[serde(default, deserialize_with = "object_or_none")]
    pub extras: Option<ExtrasBreakdown>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub wickets: Vec<WicketEvent>,
}

/// The two historical encodings of a delivery's runs. Anything else lands in
/// `Unrecognized` and normalizes to zero runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRuns {
    Legacy(i64),
    Structured(RunsBreakdown),
    Unrecognized(Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunsBreakdown {
    #[serde(default, deserialize_with = "int_or_none")]
    pub batter: Option<i64>,
    #[serde(default, deserialize_with = "int_or_none")]
    pub extras: Option<i64>,
    #[serde(default, deserialize_with = "int_or_none")]
    pub total: Option<i64>,
}

/// `Some` whenever the key is present, whatever its value; an unreadable
/// value counts as 0. Legality checks rely on presence alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtrasBreakdown {
    #[serde(default, deserialize_with = "int_if_present")]
    pub wides: Option<i64>,
    #[serde(default, deserialize_with = "int_if_present")]
    pub noballs: Option<i64>,
    #[serde(default, deserialize_with = "int_if_present")]
    pub byes: Option<i64>,
    #[serde(default, deserialize_with = "int_if_present")]
    pub legbyes: Option<i64>,
    #[serde(default, deserialize_with = "int_if_present")]
    pub penalty: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WicketEvent {
    #[serde(default, deserialize_with = "string_or_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub player_out: Option<String>,
}

fn unknown_team() -> String {
    "Unknown".to_string()
}

fn string_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let rendered = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(rendered)
}

fn string_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let rendered = string_or_default(deserializer)?;
    Ok(if rendered.is_empty() { None } else { Some(rendered) })
}

fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn int_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_int(&value))
}

fn int_if_present<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(value_to_int(&value).unwrap_or(0)))
}

fn object_or_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Accepts a list, a single object, or null.
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn objects_only<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Parse and validate one match file. Structural problems are reported as
/// malformed-match errors so the caller can skip the file and continue.
pub fn parse_match_json(match_id: &str, raw: &str) -> EngineResult<MatchRecord> {
    let mut record: MatchRecord = serde_json::from_str(raw.trim())?;
    record.match_id = match_id.to_string();
    record.validate()?;
    Ok(record)
}

impl MatchRecord {
    pub fn validate(&self) -> EngineResult<()> {
        if self.info.teams.len() < 2 {
            return Err(EngineError::MissingTeams {
                found: self.info.teams.len(),
            });
        }
        if let Some(index) = self.innings.iter().position(|inn| inn.overs.is_none()) {
            return Err(EngineError::MissingOvers { index });
        }
        Ok(())
    }

    /// First listed team. Purely positional; not a venue concept.
    pub fn home(&self) -> &str {
        self.info.teams.first().map(String::as_str).unwrap_or("N/A")
    }

    /// Second listed team. Purely positional; not a venue concept.
    pub fn away(&self) -> &str {
        self.info.teams.get(1).map(String::as_str).unwrap_or("N/A")
    }

    pub fn winner(&self) -> Option<&str> {
        self.info.outcome.winner.as_deref()
    }

    pub fn is_tie(&self) -> bool {
        self.info
            .outcome
            .result
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("tie"))
    }

    /// A match with a named winner. Ties and no-results are not decisive.
    pub fn is_decisive(&self) -> bool {
        self.winner().is_some()
    }

    pub fn toss_winner(&self) -> Option<&str> {
        self.info.toss.winner.as_deref()
    }

    pub fn toss_decision(&self) -> Option<TossDecision> {
        match self
            .info
            .toss
            .decision
            .as_deref()
            .map(|d| d.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("bat") => Some(TossDecision::Bat),
            Some("field") | Some("bowl") => Some(TossDecision::Field),
            _ => None,
        }
    }

    /// The other listed team, if `team` is one of the two.
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home() == team {
            Some(self.away())
        } else if self.away() == team {
            Some(self.home())
        } else {
            None
        }
    }

    pub fn venue(&self) -> &str {
        self.info.venue.as_deref().unwrap_or("Unknown Venue")
    }

    pub fn season_label(&self) -> Option<String> {
        match self.info.season.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        let raw = self.info.dates.first()?;
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
    }

    pub fn player_of_match(&self) -> Option<&str> {
        self.info.player_of_match.first().map(String::as_str)
    }
}

impl InningsRecord {
    pub fn overs(&self) -> &[OverRecord] {
        self.overs.as_deref().unwrap_or(&[])
    }
}
