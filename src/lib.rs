pub mod cache;
pub mod config;
pub mod delivery;
pub mod distribution;
pub mod error;
pub mod grouping;
pub mod markets;
pub mod markov;
pub mod match_rows;
pub mod match_stats;
pub mod model;
pub mod phase;
pub mod pipeline;
pub mod players;
pub mod synthetic;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use pipeline::{CorpusReport, MatchSource, analyze_corpus};
