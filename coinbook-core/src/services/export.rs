//! Export service - ledger to CSV
//!
//! Writes one header line and one line per transaction, in ledger order,
//! through a replaceable column-joining strategy. Any I/O failure aborts the
//! export; a partially written file counts as a failed export.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::currency::DEFAULT_NATIVE_TICKER;
use crate::domain::result::{ConfigurationError, ExportIoError};
use crate::domain::{ExportSummary, Wallet};
use crate::ports::Localizer;

use super::currency::{CurrencyConverter, RateSnapshot};
use super::projector::RowProjector;

/// Joins the fields of one row into a single line (without line ending)
pub trait ColumnJoiner: Send + Sync {
    fn join_columns(&self, columns: &[&str]) -> io::Result<String>;
}

/// Delimiter/quote configuration for CSV output
///
/// A field is quoted only when it contains the delimiter, the quote
/// character, or a line break; embedded quotes are doubled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvStrategy {
    delimiter: u8,
    quote: u8,
}

impl CsvStrategy {
    /// Comma delimited, double-quote quoting
    pub const UK_DEFAULT: CsvStrategy = CsvStrategy { delimiter: b',', quote: b'"' };
    /// Semicolon delimited, for locales using `,` as the decimal separator
    pub const SEMICOLON: CsvStrategy = CsvStrategy { delimiter: b';', quote: b'"' };
    /// Tab delimited
    pub const TAB: CsvStrategy = CsvStrategy { delimiter: b'\t', quote: b'"' };

    /// Custom strategy. Delimiter and quote must be distinct ASCII
    /// characters other than CR/LF.
    pub fn new(delimiter: char, quote: char) -> Result<Self, ConfigurationError> {
        let valid = |c: char| c.is_ascii() && c != '\r' && c != '\n';
        if !valid(delimiter) || !valid(quote) || delimiter == quote {
            return Err(ConfigurationError(format!(
                "invalid CSV delimiter/quote pair {:?}/{:?}",
                delimiter, quote
            )));
        }
        Ok(Self {
            delimiter: delimiter as u8,
            quote: quote as u8,
        })
    }

    /// Preset by name: `comma`, `semicolon` or `tab`
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "comma" | "," => Ok(Self::UK_DEFAULT),
            "semicolon" | ";" => Ok(Self::SEMICOLON),
            "tab" | "\\t" => Ok(Self::TAB),
            other => Err(ConfigurationError(format!("unknown CSV delimiter '{}'", other))),
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter as char
    }

    pub fn quote(&self) -> char {
        self.quote as char
    }
}

impl Default for CsvStrategy {
    fn default() -> Self {
        Self::UK_DEFAULT
    }
}

impl ColumnJoiner for CsvStrategy {
    fn join_columns(&self, columns: &[&str]) -> io::Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .quote_style(csv::QuoteStyle::Necessary)
            .double_quote(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(columns)?;
        let mut bytes = writer
            .into_inner()
            .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))?;
        bytes.pop(); // terminator

        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Line terminator for exported rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Create the file, or truncate an existing one
    #[default]
    Truncate,
    /// Refuse to touch an existing file
    FailIfExists,
}

/// Export settings that do not touch row content
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Ticker shown in the native amount header
    pub native_ticker: String,
    pub line_ending: LineEnding,
    pub overwrite: OverwritePolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            native_ticker: DEFAULT_NATIVE_TICKER.to_string(),
            line_ending: LineEnding::default(),
            overwrite: OverwritePolicy::default(),
        }
    }
}

/// Writes a wallet's ledger as a table
pub struct TabularExporter<'a> {
    projector: RowProjector<'a>,
    converter: &'a CurrencyConverter,
    joiner: &'a dyn ColumnJoiner,
    options: ExportOptions,
}

impl<'a> TabularExporter<'a> {
    pub fn new(
        converter: &'a CurrencyConverter,
        localizer: &'a dyn Localizer,
        joiner: &'a dyn ColumnJoiner,
        options: ExportOptions,
    ) -> Self {
        Self {
            projector: RowProjector::new(converter, localizer),
            converter,
            joiner,
            options,
        }
    }

    /// Column names with the native ticker and fiat symbol substituted
    pub fn header(&self) -> [String; 5] {
        self.header_at(&self.converter.snapshot())
    }

    fn header_at(&self, rates: &RateSnapshot) -> [String; 5] {
        [
            "Date".to_string(),
            "Description".to_string(),
            format!("Amount ({})", self.options.native_ticker),
            format!("Amount ({})", rates.currency.symbol),
            "Transaction Id".to_string(),
        ]
    }

    /// Export the ledger to `destination`
    ///
    /// The file is opened according to the overwrite policy and held under
    /// an exclusive lock for the duration of the export. It is closed on
    /// every exit path; on error the caller decides whether to delete it.
    pub fn export(&self, wallet: &Wallet, destination: &Path) -> Result<ExportSummary, ExportIoError> {
        let file = self.open_destination(destination)?;

        let mut sink = DigestWriter::new(BufWriter::new(&file));
        let rows = self
            .write_table(wallet, &mut sink)
            .map_err(|source| cannot_write(destination, source))?;

        let (buffered, bytes, sha256) = sink.finish();
        buffered
            .into_inner()
            .map_err(|e| cannot_write(destination, e.into_error()))?;
        file.sync_all().map_err(|source| ExportIoError::CannotClose {
            path: destination.to_path_buf(),
            source,
        })?;

        Ok(ExportSummary {
            path: destination.to_path_buf(),
            rows,
            bytes,
            sha256,
        })
    }

    /// Export the ledger to any writer (stdout, in-memory buffers)
    pub fn export_to_writer<W: Write>(&self, wallet: &Wallet, out: W) -> io::Result<ExportSummary> {
        let mut sink = DigestWriter::new(out);
        let rows = self.write_table(wallet, &mut sink)?;
        let (mut out, bytes, sha256) = sink.finish();
        out.flush()?;

        Ok(ExportSummary {
            path: PathBuf::from("-"),
            rows,
            bytes,
            sha256,
        })
    }

    fn write_table<W: Write>(&self, wallet: &Wallet, out: &mut W) -> io::Result<usize> {
        let eol = self.options.line_ending.as_str();
        let rates = self.converter.snapshot();

        let header = self.header_at(&rates);
        let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
        out.write_all(self.joiner.join_columns(&header_refs)?.as_bytes())?;
        out.write_all(eol.as_bytes())?;

        let mut rows = 0;
        for tx in wallet.transactions() {
            let row = self.projector.project_at(tx, &rates);
            out.write_all(self.joiner.join_columns(&row.fields())?.as_bytes())?;
            out.write_all(eol.as_bytes())?;
            rows += 1;
        }

        Ok(rows)
    }

    fn open_destination(&self, destination: &Path) -> Result<File, ExportIoError> {
        let cannot_create = |source: io::Error| ExportIoError::CannotCreate {
            path: destination.to_path_buf(),
            source,
        };

        let mut open = OpenOptions::new();
        open.write(true);
        match self.options.overwrite {
            OverwritePolicy::Truncate => open.create(true),
            OverwritePolicy::FailIfExists => open.create_new(true),
        };
        let file = open.open(destination).map_err(cannot_create)?;

        // Lock before truncating so a file held by another writer is left intact
        FileExt::try_lock_exclusive(&file).map_err(cannot_create)?;
        file.set_len(0).map_err(cannot_create)?;

        Ok(file)
    }
}

fn cannot_write(path: &Path, source: io::Error) -> ExportIoError {
    ExportIoError::CannotWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Counts and hashes everything written through it
struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
    bytes: u64,
}

impl<W: Write> DigestWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    fn finish(self) -> (W, u64, String) {
        (self.inner, self.bytes, hex::encode(self.hasher.finalize()))
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        self.bytes += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
