//! Raw line items to canonical [`Transaction`]s.
//!
//! Pure: the same `RawExtraction` always yields the same transactions, ids and
//! report. Bad lines are skipped and recorded, never fatal to the document.

use super::model::{Direction, NormalizationReport, NormalizedDocument, Transaction};
use crate::documents::model::{DocumentId, DocumentType, ExtractedHeader, LineDefect, StatementPeriod};
use crate::error::{CoreError, CoreResult};
use crate::extraction::interface::{RawExtraction, RawHeader, RawLineItem};
use regex::Regex;
use time::{Date, Month};

/// Lowercase, strip punctuation, drop pure-number tokens (store numbers,
/// reference codes) and collapse whitespace.
pub fn normalize_description(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|tok| !tok.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedAmount {
    pub magnitude: f64,
    pub negative: bool,
    /// Set when the text carried an explicit CR/DR marker.
    pub marker: Option<Direction>,
}

impl ParsedAmount {
    pub fn signed(&self) -> f64 {
        if self.negative {
            -self.magnitude
        } else {
            self.magnitude
        }
    }

    pub fn direction_for(&self, document_type: DocumentType) -> Direction {
        if let Some(d) = self.marker {
            return d;
        }
        let debit = if document_type.positive_is_debit() {
            !self.negative
        } else {
            self.negative
        };
        if debit {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }
}

pub struct LineNormalizer {
    iso_date: Regex,
    us_date: Regex,
    day_month_name: Regex,
    month_name_day: Regex,
    number: Regex,
}

impl LineNormalizer {
    pub fn new() -> CoreResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CoreError::InvalidInput(format!("regex error: {}", e)))
        };
        Ok(Self {
            iso_date: compile(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$")?,
            us_date: compile(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$")?,
            day_month_name: compile(r"^(\d{1,2})[ -]([A-Za-z]{3,9})[ ,-]*(\d{4})$")?,
            month_name_day: compile(r"^([A-Za-z]{3,9})\.? (\d{1,2}),? (\d{4})$")?,
            number: compile(r"^\d+(\.\d+)?$")?,
        })
    }

    /// Accepts ISO (`2026-01-05`, `2026/01/05`), US (`01/05/2026`, `01/05/26`)
    /// and month-name forms (`05 Jan 2026`, `Jan 5, 2026`).
    pub fn parse_date(&self, raw: &str) -> Result<Date, String> {
        let text = raw.trim();
        if text.is_empty() {
            return Err("missing date".to_string());
        }
        let (year, month, day) = if let Some(c) = self.iso_date.captures(text) {
            (num(&c[1])?, num(&c[2])?, num(&c[3])?)
        } else if let Some(c) = self.us_date.captures(text) {
            let mut year = num(&c[3])?;
            if c[3].len() == 2 {
                year += 2000;
            }
            (year, num(&c[1])?, num(&c[2])?)
        } else if let Some(c) = self.day_month_name.captures(text) {
            (num(&c[3])?, month_number(&c[2])?, num(&c[1])?)
        } else if let Some(c) = self.month_name_day.captures(text) {
            (num(&c[3])?, month_number(&c[1])?, num(&c[2])?)
        } else {
            return Err(format!("unrecognized date '{}'", text));
        };
        let month = u8::try_from(month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or_else(|| format!("invalid month in '{}'", text))?;
        let day = u8::try_from(day).map_err(|_| format!("invalid day in '{}'", text))?;
        Date::from_calendar_date(year, month, day).map_err(|e| format!("invalid date '{}': {}", text, e))
    }

    /// Accepts `$1,234.56`, `-12.00`, `12.00-`, `(12.00)`, `12.00 CR`, `45 DR`.
    pub fn parse_amount(&self, raw: &str) -> Result<ParsedAmount, String> {
        let mut text = raw.trim().to_string();
        if text.is_empty() {
            return Err("missing amount".to_string());
        }

        let upper = text.to_ascii_uppercase();
        let mut marker = None;
        if upper.ends_with("CR") {
            marker = Some(Direction::Credit);
            text.truncate(text.len() - 2);
        } else if upper.ends_with("DR") {
            marker = Some(Direction::Debit);
            text.truncate(text.len() - 2);
        }

        let mut negative = false;
        let mut body: String = text
            .chars()
            .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' ' | '\u{a0}'))
            .collect();
        for code in ["USD", "usd", "EUR", "eur", "GBP", "gbp"] {
            body = body.replace(code, "");
        }
        if body.starts_with('(') && body.ends_with(')') && body.len() > 2 {
            negative = true;
            body = body[1..body.len() - 1].to_string();
        }
        if let Some(rest) = body.strip_prefix('-') {
            negative = !negative;
            body = rest.to_string();
        } else if let Some(rest) = body.strip_suffix('-') {
            negative = !negative;
            body = rest.to_string();
        } else if let Some(rest) = body.strip_prefix('+') {
            body = rest.to_string();
        }

        if !self.number.is_match(&body) {
            return Err(format!("unrecognized amount '{}'", raw.trim()));
        }
        let magnitude: f64 = body
            .parse()
            .map_err(|_| format!("unrecognized amount '{}'", raw.trim()))?;
        Ok(ParsedAmount {
            magnitude,
            negative,
            marker,
        })
    }

    pub fn parse_header(&self, raw: &RawHeader) -> ExtractedHeader {
        let date_field = |name: &str, value: &Option<String>| -> Option<Date> {
            let v = value.as_deref()?;
            match self.parse_date(v) {
                Ok(d) => Some(d),
                Err(reason) => {
                    tracing::warn!(field = name, %reason, "ignoring unparseable header field");
                    None
                }
            }
        };
        let amount_field = |name: &str, value: &Option<String>| -> Option<f64> {
            let v = value.as_deref()?;
            match self.parse_amount(v) {
                Ok(a) => Some(a.signed()),
                Err(reason) => {
                    tracing::warn!(field = name, %reason, "ignoring unparseable header field");
                    None
                }
            }
        };

        let start = date_field("period_start", &raw.period_start);
        let end = date_field("period_end", &raw.period_end);
        let statement_period = match (start, end) {
            (Some(start), Some(end)) if start <= end => Some(StatementPeriod { start, end }),
            (Some(_), Some(_)) => {
                tracing::warn!("statement period ends before it starts; ignoring");
                None
            }
            _ => None,
        };

        ExtractedHeader {
            account_identifier: raw
                .account_identifier
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            statement_period,
            opening_balance: amount_field("opening_balance", &raw.opening_balance),
            closing_balance: amount_field("closing_balance", &raw.closing_balance),
            total_debits: amount_field("total_debits", &raw.total_debits).map(f64::abs),
            total_credits: amount_field("total_credits", &raw.total_credits).map(f64::abs),
        }
    }

    /// Parses one line. `Ok(None)` means a zero-amount line to be discarded.
    pub fn parse_line(
        &self,
        document_id: &DocumentId,
        document_type: DocumentType,
        index: usize,
        item: &RawLineItem,
    ) -> CoreResult<Option<Transaction>> {
        let unparseable = |reason: String| CoreError::UnparseableLine {
            line: index + 1,
            reason,
        };
        let date = self.parse_date(&item.date).map_err(unparseable)?;
        let amount = self.parse_amount(&item.amount).map_err(unparseable)?;
        if amount.magnitude == 0.0 {
            return Ok(None);
        }
        let tx = Transaction::new(
            document_id,
            index,
            date,
            amount.magnitude,
            amount.direction_for(document_type),
            &item.description,
        )?;
        Ok(Some(tx))
    }

    pub fn normalize(
        &self,
        document_id: &DocumentId,
        document_type: DocumentType,
        raw: &RawExtraction,
    ) -> NormalizedDocument {
        let header = self.parse_header(&raw.header);
        let mut report = NormalizationReport {
            total_lines: raw.line_items.len(),
            ..NormalizationReport::default()
        };
        let mut transactions = Vec::with_capacity(raw.line_items.len());

        for (index, item) in raw.line_items.iter().enumerate() {
            match self.parse_line(document_id, document_type, index, item) {
                Ok(Some(mut tx)) => {
                    if let Some(period) = header.statement_period {
                        if !period.contains(tx.date()) {
                            tx.mark_out_of_period();
                            report.out_of_period += 1;
                            tracing::warn!(
                                document_id = %document_id,
                                line = index + 1,
                                date = %tx.date(),
                                "transaction date outside statement period"
                            );
                        }
                    }
                    transactions.push(tx);
                }
                Ok(None) => report.zero_amount += 1,
                Err(CoreError::UnparseableLine { line, reason }) => {
                    tracing::debug!(document_id = %document_id, line, %reason, "skipping line");
                    report.skipped += 1;
                    report.defects.push(LineDefect { line, reason });
                }
                Err(other) => {
                    report.skipped += 1;
                    report.defects.push(LineDefect {
                        line: index + 1,
                        reason: other.to_string(),
                    });
                }
            }
        }

        transactions.sort_by(|a, b| a.date().cmp(&b.date()).then(a.line_index().cmp(&b.line_index())));
        report.accepted = transactions.len();
        NormalizedDocument {
            header,
            transactions,
            report,
        }
    }
}

fn num(s: &str) -> Result<i32, String> {
    s.parse::<i32>().map_err(|_| format!("invalid number '{}'", s))
}

fn month_number(name: &str) -> Result<i32, String> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lowered = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| lowered.starts_with(m))
        .map(|i| i as i32 + 1)
        .ok_or_else(|| format!("unknown month '{}'", name))
}
