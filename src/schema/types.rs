// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One layout for a record type: the ordered field names, `REG` included.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct RecordSchema {
    pub code: String,
    pub fields: Vec<String>,
}

impl RecordSchema {
    pub fn new<S: Into<String>>(code: S, fields: &[&str]) -> Self {
        Self {
            code: code.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Number of fields a line must carry to bind to this layout.
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Returns the first repeated field name, if any.
    pub fn duplicate_field(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        self.fields
            .iter()
            .find(|f| !seen.insert(f.as_str()))
            .map(String::as_str)
    }
}

/// Positional names used when no layout matches: `FIELD_1..FIELD_n`.
pub fn positional_columns(arity: usize) -> Vec<String> {
    (1..=arity).map(|i| format!("FIELD_{}", i)).collect()
}
