use serde::Serialize;

/// Outcome of reading a numeric-semantics field.
/// `Blank` and `Invalid` both contribute zero to sums but are kept apart
/// so that bad text never hides behind a legitimate zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Value(f64),
    Blank,
    Invalid,
}

impl Numeric {
    pub fn value(self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn contribution(self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

/// Parses a bookkeeping amount. Accepts `1234.56`, `1234,56` and `1.234,56`.
pub fn parse_decimal(raw: &str) -> Numeric {
    let v = raw.trim();
    if v.is_empty() {
        return Numeric::Blank;
    }
    let normalized = if v.contains(',') {
        v.replace('.', "").replace(',', ".")
    } else {
        v.to_string()
    };
    match normalized.parse::<f64>() {
        // "inf" and "NaN" parse as f64 but are not amounts
        Ok(n) if n.is_finite() => Numeric::Value(n),
        _ => Numeric::Invalid,
    }
}

/// Result of summing one column with per-cell coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ColumnSum {
    pub total: f64,
    pub parsed: usize,
    pub blank: usize,
    pub invalid: usize,
}

impl ColumnSum {
    pub fn add(&mut self, n: Numeric) {
        match n {
            Numeric::Value(v) => {
                self.total += v;
                self.parsed += 1;
            }
            Numeric::Blank => self.blank += 1,
            Numeric::Invalid => self.invalid += 1,
        }
    }

    pub fn merge(mut self, other: ColumnSum) -> Self {
        self.total += other.total;
        self.parsed += other.parsed;
        self.blank += other.blank;
        self.invalid += other.invalid;
        self
    }
}

/// Compares codes that may or may not carry leading zeros (`"1"` vs `"01"`).
pub fn same_code(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    let strip = |s: &str| -> String {
        let t = s.trim_start_matches('0');
        if t.is_empty() && !s.is_empty() {
            "0".to_string()
        } else {
            t.to_string()
        }
    };
    a == b || strip(a) == strip(b)
}
