pub mod analysis;
pub mod config;
pub mod process;
pub mod report;
pub mod rules;
pub mod schema;

pub use analysis::{analyze, run_analysis, AnalysisError};
pub use config::{RuleConfiguration, RuleId, Thresholds};
pub use process::{load_period, PeriodDataset, Table};
pub use report::{write_summary, TechnicalSummary};
pub use rules::{Category, Finding, RuleEngine};
pub use schema::{RecordSchema, SchemaRegistry};
