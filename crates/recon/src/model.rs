use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{AccountNumber, CheckDataKey, CheckNumber, Money};
use tally_extract::{PageRef, RawAccountWindow};

use crate::error::ReconError;
use crate::suspicion::SuspicionReason;

/// Identity of a transaction derived from where it was read, never from what
/// it says, so corrections to its content keep the same id.
///
/// Orders by file, page, then position on the page; the printed form
/// (`jan.pdf:p0003:r012`) is for people and may outgrow its padding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub file_name: String,
    pub page: u32,
    pub position: usize,
}

impl TransactionId {
    pub fn new(source: &PageRef, position: usize) -> Self {
        TransactionId { file_name: source.file_name.clone(), page: source.page, position }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:p{:04}:r{:03}", self.file_name, self.page, self.position)
    }
}

/// A cleared check, keyed by canonical account and check number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckData {
    pub account_number: AccountNumber,
    pub check_number: CheckNumber,
    pub payee: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub source: PageRef,
}

impl CheckData {
    pub fn key(&self) -> CheckDataKey {
        CheckDataKey::new(self.account_number.clone(), self.check_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    /// Positive for deposits, negative for withdrawals.
    pub amount: Money,
    pub check_number: Option<CheckNumber>,
    pub check: Option<CheckData>,
    pub source: PageRef,
    pub suspicious: bool,
    pub suspicion_reasons: Vec<SuspicionReason>,
}

impl TransactionRecord {
    pub fn is_deposit(&self) -> bool {
        !self.amount.is_negative()
    }

    pub fn is_withdrawal(&self) -> bool {
        self.amount.is_negative()
    }
}

/// Printed page counters for one page that contributed to a statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageMeta {
    pub source: PageRef,
    pub page_number: Option<u32>,
    pub total_pages: Option<u32>,
}

/// Statement-level values gathered from a document's statement pages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentMeta {
    pub file_name: String,
    pub bank: Option<String>,
    pub account_number: Option<String>,
    pub statement_date: Option<NaiveDate>,
    pub beginning_balance: Option<Decimal>,
    pub ending_balance: Option<Decimal>,
    pub pages: Vec<PageMeta>,
}

/// A validated row of a summary-of-accounts table.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountWindow {
    pub account_number: Option<String>,
    pub start_page: u32,
    pub beginning_balance: Option<Decimal>,
    pub ending_balance: Option<Decimal>,
}

impl AccountWindow {
    pub fn from_raw(raw: &RawAccountWindow, file_name: &str) -> Result<Self, ReconError> {
        let account = raw.account_number.clone().unwrap_or_default();
        let value = raw.start_page.as_deref().map(str::trim).ok_or_else(|| {
            ReconError::MissingWindowStartPage {
                file_name: file_name.to_string(),
                account: account.clone(),
            }
        })?;
        let start_page = value
            .parse::<u32>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| ReconError::InvalidWindowStartPage {
                file_name: file_name.to_string(),
                account: account.clone(),
                value: value.to_string(),
            })?;
        Ok(AccountWindow {
            account_number: raw.account_number.clone(),
            start_page,
            beginning_balance: raw.beginning_balance,
            ending_balance: raw.ending_balance,
        })
    }
}

/// One account's reconciled transactions for one statement period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub file_name: String,
    pub bank: Option<String>,
    pub account_number: AccountNumber,
    pub statement_date: Option<NaiveDate>,
    pub beginning_balance: Option<Money>,
    pub ending_balance: Option<Money>,
    /// Ascending by date (undated last), then page, then id.
    pub transactions: Vec<TransactionRecord>,
    pub pages: Vec<PageMeta>,
    pub suspicious: bool,
    pub suspicion_reasons: Vec<SuspicionReason>,
}

impl Statement {
    /// Sum of every signed amount, or `None` if it leaves `Decimal`'s range.
    /// Assembly rejects such statements, so an assembled one always has totals.
    pub fn net_change(&self) -> Option<Money> {
        Money::checked_sum(self.transactions.iter().map(|t| t.amount))
    }

    pub fn total_deposits(&self) -> Option<Money> {
        Money::checked_sum(self.transactions.iter().filter(|t| t.is_deposit()).map(|t| t.amount))
    }

    pub fn total_withdrawals(&self) -> Option<Money> {
        Money::checked_sum(
            self.transactions.iter().filter(|t| t.is_withdrawal()).map(|t| t.amount),
        )
    }

    /// Beginning balance carried forward through every transaction.
    pub fn expected_ending_balance(&self) -> Option<Money> {
        self.beginning_balance?.checked_add(self.net_change()?)
    }

    pub fn page_refs(&self) -> impl Iterator<Item = &PageRef> {
        self.pages.iter().map(|p| &p.source)
    }
}
