use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{CheckNumber, PartialDate};

/// Where a value came from: file, 1-based physical page, and the bates stamp
/// printed on that page when there is one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub file_name: String,
    pub page: u32,
    pub bates: Option<String>,
}

impl PageRef {
    pub fn new(file_name: impl Into<String>, page: u32) -> Self {
        Self { file_name: file_name.into(), page, bates: None }
    }

    pub fn with_bates(mut self, bates: impl Into<String>) -> Self {
        self.bates = Some(bates.into());
        self
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bates {
            Some(b) => write!(f, "{} p.{} ({b})", self.file_name, self.page),
            None => write!(f, "{} p.{}", self.file_name, self.page),
        }
    }
}

/// One transaction line as read off a statement page. Nothing here is
/// resolved yet: the date has no year and the amount may be split across
/// deposit/withdrawal columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransactionRecord {
    pub date: Option<PartialDate>,
    pub description: Option<String>,
    /// Signed amount, when the statement prints a single amount column.
    pub amount: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub withdrawal: Option<Decimal>,
    pub check_number: Option<CheckNumber>,
    pub source: PageRef,
    /// Zero-based order of the line on its page.
    pub position: usize,
}

/// One row of a `SummaryOfAccountsTable`. The start page is kept as printed;
/// validating it is the splitter's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAccountWindow {
    pub account_number: Option<String>,
    pub start_page: Option<String>,
    pub beginning_balance: Option<Decimal>,
    pub ending_balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPage {
    pub source: PageRef,
    pub bank: Option<String>,
    pub account_number: Option<String>,
    pub statement_date: Option<NaiveDate>,
    /// Printed "page X of Y" counters, not the physical index.
    pub page_number: Option<u32>,
    pub total_pages: Option<u32>,
    pub beginning_balance: Option<Decimal>,
    pub ending_balance: Option<Decimal>,
    pub summary_of_accounts: Vec<RawAccountWindow>,
    pub transactions: Vec<RawTransactionRecord>,
}

/// An image of a cleared check, extracted independently of statement pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckPage {
    pub source: PageRef,
    pub account_number: Option<String>,
    pub check_number: Option<CheckNumber>,
    pub payee: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
}

/// A classified page. Exactly one case is ever active; see
/// [`PageEnvelope::classify`](crate::page::PageEnvelope::classify) for the envelope conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedPage {
    Statement(StatementPage),
    Check(CheckPage),
    /// A page the classifier recognised but that carries no statement or
    /// check data (cover letters, disclosures).
    Extra { source: PageRef },
}

impl ExtractedPage {
    pub fn source(&self) -> &PageRef {
        match self {
            ExtractedPage::Statement(p) => &p.source,
            ExtractedPage::Check(p) => &p.source,
            ExtractedPage::Extra { source } => source,
        }
    }
}

/// Everything extracted from one source PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub file_name: String,
    /// Page count reported by the PDF splitter.
    pub page_count: usize,
    pub pages: Vec<ExtractedPage>,
}
