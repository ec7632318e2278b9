use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::OutputFormat;

/// One reported match. `line` and `column` are 1-based, `column` counts bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord<'a> {
    pub path: &'a str,
    pub line: usize,
    pub column: usize,
    pub length: usize,
    pub matched: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_text: Option<&'a str>,
    /// One-based position among all matches in the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    matches: usize,
    total: usize,
    wrapped: bool,
}

pub struct Printer<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn record(&mut self, record: &MatchRecord<'_>) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string(record).context("failed to encode match")?;
                writeln!(self.out, "{json}")?;
            }
            OutputFormat::Plain => {
                let shown = record.line_text.unwrap_or(record.matched);
                write!(self.out, "{}:{}:{}: {}", record.path, record.line, record.column, shown)?;
                if let Some(replacement) = &record.replacement {
                    write!(self.out, " => {replacement}")?;
                }
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    pub fn summary(&mut self, matches: usize, total: usize, wrapped: bool) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let summary = Summary {
                    matches,
                    total,
                    wrapped,
                };
                let json = serde_json::to_string(&summary).context("failed to encode summary")?;
                writeln!(self.out, "{json}")?;
            }
            OutputFormat::Plain => {
                let suffix = if wrapped { " (wrapped)" } else { "" };
                writeln!(self.out, "{matches} match(es){suffix}")?;
            }
        }
        Ok(())
    }

    pub fn count(&mut self, count: usize) -> Result<()> {
        writeln!(self.out, "{count}")?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
