// src/process/mod.rs
//
// Source file → record groups → typed tables → one dataset per period.

pub mod dataset;
pub mod table;
pub mod tokenize;
pub mod utils;

pub use dataset::{
    check_period_order, load_period, PeriodDataset, PeriodRange, PeriodSummary, MANDATORY_BLOCKS,
};
pub use table::{build_table, build_tables, ColumnResolution, Table};
pub use tokenize::{
    tokenize_file, tokenize_line, tokenize_reader, tokenize_str, LineOutcome, ParseStats,
    ParsedFile, RawRecord, RecordGroup, SourceStatus,
};
pub use utils::{parse_decimal, same_code, ColumnSum, Numeric};
