use std::env;
use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};
use crate::markets::NumericMarket;

/// Run options for one corpus pass. Defaults come from the environment; the
/// binary overrides individual fields from its flags.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Extract matches on the rayon pool. The merge is sequential either way.
    pub parallel: bool,
    /// Size of a dedicated pool; `None` uses the global one.
    pub threads: Option<usize>,
    pub team_wise: bool,
    /// Keep the combined ball-by-ball table in the report.
    pub ball_rows: bool,
    pub cache: bool,
    pub cache_path: Option<PathBuf>,
    pub custom_lines: Vec<CustomLine>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomLine {
    pub market: NumericMarket,
    pub line: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            team_wise: false,
            ball_rows: true,
            cache: false,
            cache_path: None,
            custom_lines: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> EngineResult<Self> {
        let d = Self::default();
        let custom_lines = match opt_env("CRICKET_CUSTOM_LINES") {
            Some(raw) => parse_custom_lines(&raw)?,
            None => Vec::new(),
        };
        Ok(Self {
            parallel: bool_env("CRICKET_PARALLEL").unwrap_or(d.parallel),
            threads: opt_env("CRICKET_THREADS").and_then(|val| {
                let threads = parse_threads(&val);
                if threads.is_none() {
                    tracing::warn!(value = %val, "ignoring CRICKET_THREADS, expected a positive integer");
                }
                threads
            }),
            team_wise: bool_env("CRICKET_TEAM_WISE").unwrap_or(d.team_wise),
            ball_rows: bool_env("CRICKET_BALL_ROWS").unwrap_or(d.ball_rows),
            cache: bool_env("CRICKET_CACHE").unwrap_or(d.cache),
            cache_path: opt_env("CRICKET_CACHE_PATH").map(PathBuf::from),
            custom_lines,
        })
    }

    pub fn custom_line_pairs(&self) -> Vec<(NumericMarket, f64)> {
        self.custom_lines.iter().map(|c| (c.market, c.line)).collect()
    }
}

/// `market=line` pairs separated by `,`, `;` or spaces.
pub fn parse_custom_lines(raw: &str) -> EngineResult<Vec<CustomLine>> {
    raw.split([',', ';', ' '])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_custom_line)
        .collect()
}

pub fn parse_custom_line(raw: &str) -> EngineResult<CustomLine> {
    let Some((market, line)) = raw.split_once('=') else {
        return Err(EngineError::InvalidLine(raw.to_string()));
    };
    let market = market.parse::<NumericMarket>()?;
    let line = line
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EngineError::InvalidLine(raw.to_string()))?;
    Ok(CustomLine { market, line })
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

fn bool_env(key: &str) -> Option<bool> {
    let val = opt_env(key)?;
    let parsed = parse_bool(&val);
    if parsed.is_none() {
        tracing::warn!(key, value = %val, "ignoring unrecognized boolean");
    }
    parsed
}

fn parse_threads(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_line_lists_with_mixed_separators() {
        let lines = parse_custom_lines("total_runs=345.5; match_sixes=14.5,opening_partnership=30").unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].market, NumericMarket::TotalRuns);
        assert_eq!(lines[0].line, 345.5);
        assert_eq!(lines[2].market, NumericMarket::OpeningPartnership);
    }

    #[test]
    fn rejects_unknown_markets_and_bad_lines() {
        assert!(matches!(
            parse_custom_line("total_goals=2.5"),
            Err(EngineError::UnknownMarket(_))
        ));
        assert!(matches!(
            parse_custom_line("total_runs"),
            Err(EngineError::InvalidLine(_))
        ));
        assert!(matches!(
            parse_custom_line("total_runs=abc"),
            Err(EngineError::InvalidLine(_))
        ));
        assert!(matches!(
            parse_custom_line("total_runs=inf"),
            Err(EngineError::InvalidLine(_))
        ));
    }

    #[test]
    fn bool_spellings() {
        assert_eq!(parse_bool(" Yes "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn thread_counts_must_be_positive() {
        assert_eq!(parse_threads(" 4 "), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("many"), None);
    }
}
