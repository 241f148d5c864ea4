use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use csv::StringRecord;
use thiserror::Error;
use tracing::debug;

use crate::domain::{format_cents, parse_cents, BudgetRecord};

/// Column names of the backing file, in order.
pub const LEDGER_HEADER: [&str; 4] = ["timestamp", "category", "amount", "note"];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Malformed ledger {} at line {line}: {message}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Cannot access ledger {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Append-only store of budget records backed by a CSV file.
///
/// The file path is fixed at construction; nothing else in the crate knows
/// where the ledger lives.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once the first record has been written.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read every record in file order.
    /// A missing file is a ledger nobody has written to yet, so it loads as empty.
    pub fn load(&self) -> Result<Vec<BudgetRecord>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "ledger file missing, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers().map_err(|e| self.csv_error(e))?.clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        self.check_header(&headers)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| self.csv_error(e))?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let record = parse_row(&row).map_err(|message| self.malformed(line, message))?;
            records.push(record);
        }

        debug!(path = %self.path.display(), records = records.len(), "loaded ledger");
        Ok(records)
    }

    /// Append one record at the end of the file.
    ///
    /// The record is checked before anything is written: a rejected record
    /// leaves the file untouched.
    pub fn append(&self, record: &BudgetRecord) -> Result<(), StoreError> {
        record
            .validate()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;

        if let Some(last) = self.load()?.last() {
            if record.timestamp < last.timestamp {
                return Err(StoreError::InvalidRecord(format!(
                    "timestamp {} is earlier than the last recorded entry ({})",
                    format_timestamp(record.timestamp),
                    format_timestamp(last.timestamp)
                )));
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let needs_header = file.metadata().map_err(|e| self.io_error(e))?.len() == 0;

        // A hand-edited file may lack the final line break.
        if !needs_header && !ends_with_newline(&mut file).map_err(|e| self.io_error(e))? {
            file.write_all(b"\n").map_err(|e| self.io_error(e))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer
                .write_record(LEDGER_HEADER)
                .map_err(|e| self.csv_error(e))?;
        }
        writer
            .write_record(&to_row(record))
            .map_err(|e| self.csv_error(e))?;
        writer.flush().map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            category = %record.category,
            amount = record.amount_cents,
            "appended record"
        );
        Ok(())
    }

    fn check_header(&self, headers: &StringRecord) -> Result<(), StoreError> {
        let matches = headers.len() == LEDGER_HEADER.len()
            && headers
                .iter()
                .zip(LEDGER_HEADER)
                .all(|(found, expected)| found.trim() == expected);
        if matches {
            Ok(())
        } else {
            Err(self.malformed(
                1,
                format!(
                    "expected header '{}', found '{}'",
                    LEDGER_HEADER.join(","),
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            ))
        }
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, line: u64, message: String) -> StoreError {
        StoreError::MalformedRow {
            path: self.path.clone(),
            line,
            message,
        }
    }

    fn csv_error(&self, error: csv::Error) -> StoreError {
        let line = error.position().map(|p| p.line()).unwrap_or(0);
        match error.into_kind() {
            csv::ErrorKind::Io(source) => self.io_error(source),
            csv::ErrorKind::UnequalLengths { expected_len, len, .. } => self.malformed(
                line,
                format!("expected {} fields, found {}", expected_len, len),
            ),
            other => self.malformed(line, format!("{:?}", other)),
        }
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// One ledger row, in `LEDGER_HEADER` order.
pub(crate) fn to_row(record: &BudgetRecord) -> [String; 4] {
    [
        format_timestamp(record.timestamp),
        record.category.clone(),
        format_cents(record.amount_cents),
        record.note.clone().unwrap_or_default(),
    ]
}

fn parse_row(row: &StringRecord) -> Result<BudgetRecord, String> {
    let timestamp_str = row.get(0).unwrap_or("");
    let category = row.get(1).unwrap_or("");
    let amount_str = row.get(2).unwrap_or("");
    let note = row.get(3).unwrap_or("");

    let timestamp = DateTime::parse_from_rfc3339(timestamp_str.trim())
        .map_err(|e| format!("invalid timestamp '{}': {}", timestamp_str, e))?
        .with_timezone(&Utc);

    let amount_cents = parse_cents(amount_str)
        .map_err(|e| format!("invalid amount '{}': {}", amount_str, e))?;

    let record = BudgetRecord::new(timestamp, category, amount_cents).with_note(note);
    record.validate().map_err(|e| e.to_string())?;
    Ok(record)
}
