// src/process/tokenize.rs

use encoding_rs::WINDOWS_1252;
use serde::Serialize;
use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

const DELIMITER: char = '|';

/// One parsed line: the record-type code plus every interior token.
/// `fields[0]` is the code itself (the `REG` column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub code: String,
    pub fields: Vec<String>,
    /// 1-based line number in the source file.
    pub line: usize,
}

/// All records of one type, in file order.
#[derive(Debug, Clone)]
pub struct RecordGroup {
    pub code: String,
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded,
    Missing,
    Unreadable { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines: usize,
    pub blank_lines: usize,
    pub malformed_lines: usize,
    pub records: usize,
}

#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub source: PathBuf,
    pub status: SourceStatus,
    pub groups: Vec<RecordGroup>,
    pub stats: ParseStats,
}

impl ParsedFile {
    fn empty(source: PathBuf, status: SourceStatus) -> Self {
        Self {
            source,
            status,
            groups: Vec::new(),
            stats: ParseStats::default(),
        }
    }
}

pub enum LineOutcome {
    Blank,
    Malformed { tokens: usize },
    Record(RawRecord),
}

/// Split one decoded line. Surrounding whitespace (including `\r`) is ignored.
pub fn tokenize_line(line: &str, line_no: usize) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Blank;
    }
    let tokens: Vec<&str> = line.split(DELIMITER).collect();
    if tokens.len() <= 3 || tokens[1].trim().is_empty() {
        return LineOutcome::Malformed {
            tokens: tokens.len(),
        };
    }
    if !tokens[0].is_empty() || !tokens[tokens.len() - 1].is_empty() {
        debug!(line = line_no, "record not wrapped in delimiters");
    }
    // `REG` is stored trimmed so it always equals `code`; other cells stay raw
    let code = tokens[1].trim().to_string();
    let fields: Vec<String> = std::iter::once(code.clone())
        .chain(tokens[2..tokens.len() - 1].iter().map(|s| s.to_string()))
        .collect();
    LineOutcome::Record(RawRecord {
        code,
        fields,
        line: line_no,
    })
}

/// Groups records by code, keeping first-seen order of codes and file order within a code.
#[derive(Default)]
struct Grouper {
    groups: Vec<RecordGroup>,
    index: HashMap<String, usize>,
}

impl Grouper {
    fn push(&mut self, rec: RawRecord) {
        let idx = match self.index.get(&rec.code) {
            Some(&i) => i,
            None => {
                self.groups.push(RecordGroup {
                    code: rec.code.clone(),
                    records: Vec::new(),
                });
                self.index.insert(rec.code.clone(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[idx].records.push(rec);
    }
}

fn feed(grouper: &mut Grouper, stats: &mut ParseStats, line: &str, line_no: usize) {
    stats.lines += 1;
    match tokenize_line(line, line_no) {
        LineOutcome::Blank => stats.blank_lines += 1,
        LineOutcome::Malformed { tokens } => {
            stats.malformed_lines += 1;
            warn!(line = line_no, tokens, "skipping malformed line");
        }
        LineOutcome::Record(rec) => {
            stats.records += 1;
            grouper.push(rec);
        }
    }
}

/// Tokenize already-decoded text.
pub fn tokenize_str(text: &str) -> (Vec<RecordGroup>, ParseStats) {
    let mut grouper = Grouper::default();
    let mut stats = ParseStats::default();
    for (i, line) in text.lines().enumerate() {
        feed(&mut grouper, &mut stats, line, i + 1);
    }
    (grouper.groups, stats)
}

/// Tokenize a byte stream line by line, decoding each line as Windows-1252.
pub fn tokenize_reader<R: BufRead>(mut reader: R) -> io::Result<(Vec<RecordGroup>, ParseStats)> {
    let mut grouper = Grouper::default();
    let mut stats = ParseStats::default();
    let mut buf = Vec::with_capacity(512);
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&buf);
        feed(&mut grouper, &mut stats, &decoded, line_no);
    }
    Ok((grouper.groups, stats))
}

/// Read and tokenize one period file.
/// Never fails: a missing or unreadable file yields empty output with the
/// matching `SourceStatus`, and the caller decides whether to go on.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn tokenize_file<P: AsRef<Path>>(path: P) -> ParsedFile {
    let path = path.as_ref().to_path_buf();
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("source file not found");
            return ParsedFile::empty(path, SourceStatus::Missing);
        }
        Err(e) => {
            warn!(error = %e, "cannot open source file");
            return ParsedFile::empty(
                path,
                SourceStatus::Unreadable {
                    reason: e.to_string(),
                },
            );
        }
    };

    match tokenize_reader(BufReader::new(file)) {
        Ok((groups, stats)) => {
            info!(
                record_types = groups.len(),
                records = stats.records,
                malformed = stats.malformed_lines,
                "tokenized"
            );
            ParsedFile {
                source: path,
                status: SourceStatus::Loaded,
                groups,
                stats,
            }
        }
        Err(e) => {
            warn!(error = %e, "read failed, discarding partial output");
            ParsedFile::empty(
                path,
                SourceStatus::Unreadable {
                    reason: e.to_string(),
                },
            )
        }
    }
}
