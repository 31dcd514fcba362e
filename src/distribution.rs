use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::markets::{CategoricalMarket, CategoricalTally, MarketBook, NumericMarket};

/// Empirical over/under split of a sample at one line. A value equal to the
/// line counts as under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    pub line: f64,
    pub over_count: usize,
    pub under_count: usize,
    pub over_pct: f64,
    pub under_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub market: NumericMarket,
    pub count: usize,
    pub mean: f64,
    /// `sorted[count / 2]`. For even-sized samples this is the upper of the
    /// two middle values, not their average.
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub thresholds: Vec<ThresholdRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeShare {
    pub outcome: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub market: CategoricalMarket,
    pub total: u64,
    pub outcomes: Vec<OutcomeShare>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub matches: usize,
    pub numeric: Vec<DistributionSummary>,
    /// Markets that received no samples in this corpus.
    pub empty_markets: Vec<NumericMarket>,
    pub categorical: Vec<CategoricalSummary>,
    pub custom_lines: Vec<CustomLineResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomLineResult {
    pub market: NumericMarket,
    pub sample_size: usize,
    #[serde(flatten)]
    pub row: ThresholdRow,
}

static DEFAULT_LINES: Lazy<BTreeMap<NumericMarket, Vec<f64>>> = Lazy::new(|| {
    use NumericMarket as N;

    fn stepped(from: u32, to: u32, step: usize) -> Vec<f64> {
        (from..=to).step_by(step).map(f64::from).collect()
    }

    BTreeMap::from([
        (N::TotalRuns, stepped(300, 400, 20)),
        (N::MatchFours, stepped(40, 60, 5)),
        (N::MatchSixes, vec![8.0, 10.0, 12.0, 15.0, 18.0, 20.0]),
        (N::MatchBoundaries, stepped(50, 70, 5)),
        (N::HighestIndividualScore, stepped(30, 100, 10)),
        (N::MostRunsSingleOver, vec![15.0, 18.0, 20.0, 22.0, 25.0]),
        (N::RunsFirst6Overs, stepped(45, 60, 5)),
        (N::RunsFirst10Overs, stepped(80, 110, 10)),
        (N::RunsFirst15Overs, stepped(130, 160, 10)),
        (N::RunsAtFallFirstWicket, stepped(20, 40, 5)),
        (N::OpeningPartnership, stepped(25, 50, 5)),
    ])
});

/// Candidate lines for a market; `None` means "use the sample mean".
pub fn default_lines(market: NumericMarket) -> Option<&'static [f64]> {
    DEFAULT_LINES.get(&market).map(Vec::as_slice)
}

pub fn threshold_row(sample: &[f64], line: f64) -> ThresholdRow {
    let n = sample.len();
    let over_count = sample.iter().filter(|v| **v > line).count();
    let under_count = n - over_count;
    let pct = |c: usize| if n == 0 { 0.0 } else { c as f64 / n as f64 * 100.0 };
    ThresholdRow {
        line,
        over_count,
        under_count,
        over_pct: pct(over_count),
        under_pct: pct(under_count),
    }
}

/// Descriptive statistics plus threshold table. `None` for an empty sample.
pub fn summarize(market: NumericMarket, sample: &[f64]) -> Option<DistributionSummary> {
    if sample.is_empty() {
        return None;
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;

    let thresholds = match default_lines(market) {
        Some(lines) => lines.iter().map(|l| threshold_row(sample, *l)).collect(),
        None => vec![threshold_row(sample, mean)],
    };

    Some(DistributionSummary {
        market,
        count,
        mean,
        median: sorted[count / 2],
        min: sorted[0],
        max: sorted[count - 1],
        thresholds,
    })
}

pub fn custom_over_under(market: NumericMarket, sample: &[f64], line: f64) -> EngineResult<CustomLineResult> {
    if sample.is_empty() {
        return Err(EngineError::EmptySample {
            market: market.name().to_string(),
        });
    }
    Ok(CustomLineResult {
        market,
        sample_size: sample.len(),
        row: threshold_row(sample, line),
    })
}

pub fn summarize_tally(market: CategoricalMarket, tally: &CategoricalTally) -> CategoricalSummary {
    let total = tally.total();
    let outcomes = tally
        .buckets
        .iter()
        .map(|(label, count)| OutcomeShare {
            outcome: label.clone(),
            count: *count,
            percentage: if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64 * 100.0
            },
        })
        .collect();
    CategoricalSummary {
        market,
        total,
        outcomes,
    }
}

/// Summarize every market in the book. Custom lines on markets with no data
/// are logged and left out rather than failing the report.
pub fn summarize_book(book: &MarketBook, custom_lines: &[(NumericMarket, f64)]) -> MarketReport {
    let mut report = MarketReport {
        matches: book.matches,
        ..Default::default()
    };
    for (market, sample) in book.numeric_markets() {
        match summarize(market, sample) {
            Some(summary) => report.numeric.push(summary),
            None => report.empty_markets.push(market),
        }
    }
    for (market, tally) in book.categorical_markets() {
        report.categorical.push(summarize_tally(market, tally));
    }
    for (market, line) in custom_lines {
        match custom_over_under(*market, book.sample(*market), *line) {
            Ok(row) => report.custom_lines.push(row),
            Err(err) => tracing::warn!(%market, line, "custom line skipped: {err}"),
        }
    }
    report
}

impl MarketReport {
    pub fn numeric_summary(&self, market: NumericMarket) -> Option<&DistributionSummary> {
        self.numeric.iter().find(|s| s.market == market)
    }

    pub fn categorical_summary(&self, market: CategoricalMarket) -> Option<&CategoricalSummary> {
        self.categorical.iter().find(|s| s.market == market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_median_takes_upper_middle() {
        let s = summarize(NumericMarket::MatchSixes, &[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.median, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.mean - 2.5).abs() < 1e-9);

        let odd = summarize(NumericMarket::MatchSixes, &[5.0, 1.0, 3.0]).unwrap();
        assert_eq!(odd.median, 3.0);
    }

    #[test]
    fn value_on_the_line_counts_as_under() {
        let row = threshold_row(&[300.0, 320.0, 340.0, 360.0], 320.0);
        assert_eq!(row.over_count, 2);
        assert_eq!(row.under_count, 2);
        assert!((row.over_pct + row.under_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn uncatalogued_market_uses_its_mean() {
        let s = summarize(NumericMarket::TotalExtras, &[10.0, 20.0]).unwrap();
        assert_eq!(s.thresholds.len(), 1);
        assert_eq!(s.thresholds[0].line, 15.0);
        assert_eq!(s.thresholds[0].over_count, 1);

        let cat = summarize(NumericMarket::TotalRuns, &[345.0]).unwrap();
        let lines = cat.thresholds.iter().map(|t| t.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![300.0, 320.0, 340.0, 360.0, 380.0, 400.0]);
    }

    #[test]
    fn custom_line_on_empty_sample_is_an_error() {
        assert!(matches!(
            custom_over_under(NumericMarket::TotalRuns, &[], 300.0),
            Err(EngineError::EmptySample { .. })
        ));
        let ok = custom_over_under(NumericMarket::TotalRuns, &[290.0, 310.0], 300.0).unwrap();
        assert_eq!(ok.sample_size, 2);
        assert_eq!(ok.row.over_pct, 50.0);
    }

    #[test]
    fn empty_tally_reports_zero_percentages() {
        let tally = CategoricalTally::for_market(CategoricalMarket::FirstBallDot);
        let s = summarize_tally(CategoricalMarket::FirstBallDot, &tally);
        assert_eq!(s.total, 0);
        assert_eq!(s.outcomes.len(), 2);
        assert!(s.outcomes.iter().all(|o| o.percentage == 0.0));
    }
}
