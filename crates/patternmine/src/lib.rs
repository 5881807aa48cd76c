//! patternmine: pattern mining over year-partitioned business records.
//!
//! Records from CRM, ERP, HR, financial, project and tender datasets are
//! grouped by composite keys, summarized, and turned into ranked,
//! human-readable rules about churn, profitability, delay risk and
//! turnover. Numeric outliers and pairwise correlations are reported
//! alongside.
//!
//! # Core Principles
//!
//! - **Deterministic**: group order, rule ranking and tie-breaks depend
//!   only on input order
//! - **Non-destructive**: agents read shared, immutable record sets
//! - **Data-quality tolerant**: missing fields and sparse data are
//!   skipped, never fatal
//!
//! # Example
//!
//! ```no_run
//! use patternmine::agents::{PatternAgent, RuleAgent};
//! use patternmine::DatasetLoader;
//!
//! let erp = DatasetLoader::new("data").load("erp_data").unwrap();
//! let agent = RuleAgent::erp(erp.records);
//! for line in agent.detect().unwrap().lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod agents;
pub mod engine;
pub mod error;
pub mod input;
pub mod normalize;
pub mod record;
pub mod report;

mod miner;

pub use crate::miner::{Miner, MinerConfig, MiningReport};
pub use agents::{Message, MessageKind, PatternAgent, PatternResult, Registry, Reply};
pub use engine::{OutlierDetector, RuleCandidate, RuleSpec};
pub use error::{PatternError, Result};
pub use input::{DatasetLoader, LoadedDataset, SourceMetadata};
pub use normalize::{Cleaner, Normalizer};
pub use record::{FieldSchema, FieldType, Record};
