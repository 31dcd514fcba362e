use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // Malformed-match errors: recovered at match granularity by the pipeline.
    #[error("invalid match json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("match lists {found} team(s), expected two")]
    MissingTeams { found: usize },

    #[error("innings {index} has no overs")]
    MissingOvers { index: usize },

    // Empty-corpus: one explicit result instead of per-market failures.
    #[error("no deliveries found in {files} match file(s) ({skipped} skipped)")]
    NoData { files: usize, skipped: usize },

    #[error("empty sample for market {market}")]
    EmptySample { market: String },

    #[error("unknown market: {0}")]
    UnknownMarket(String),

    #[error("invalid custom line {0:?}, expected market=number")]
    InvalidLine(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn is_malformed_match(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidJson(_)
                | EngineError::MissingTeams { .. }
                | EngineError::MissingOvers { .. }
        )
    }
}
