use std::fmt;

use serde::{Deserialize, Serialize};
use tally_core::Money;

use crate::config::ReconConfig;
use crate::model::{Statement, TransactionRecord};

/// Why a reviewer should look at a transaction or statement.
///
/// The variant order is the order reasons are reported in; downstream
/// formatting depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SuspicionReason {
    // Transaction level
    NoDate,
    NoDescription,
    CheckWithoutNumber,
    CheckNumberWithoutCheckDescription,
    CheckAmountMismatch { transaction: Money, check: Money },

    // Statement level
    BalanceMismatch { expected: Money, declared: Money, discrepancy: Money },
    ContainsSuspiciousRecords,
    MissingStatementDate,
    MissingPageNumber,
    MissingTotalPages,
    MissingAccountNumber,
    MissingBeginningBalance,
    MissingEndingBalance,
}

impl fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDate => write!(f, "no date"),
            Self::NoDescription => write!(f, "no description"),
            Self::CheckWithoutNumber => {
                write!(f, "description is 'check' but no check number")
            }
            Self::CheckNumberWithoutCheckDescription => {
                write!(f, "check number present but description is not 'check'")
            }
            Self::CheckAmountMismatch { transaction, check } => {
                write!(f, "transaction amount {transaction} does not match check amount {check}")
            }
            Self::BalanceMismatch { expected, declared, discrepancy } => write!(
                f,
                "balance mismatch: expected ending balance {expected}, statement shows {declared} (off by {discrepancy})"
            ),
            Self::ContainsSuspiciousRecords => write!(f, "contains suspicious records"),
            Self::MissingStatementDate => write!(f, "missing statement date"),
            Self::MissingPageNumber => write!(f, "missing page number"),
            Self::MissingTotalPages => write!(f, "missing total pages"),
            Self::MissingAccountNumber => write!(f, "missing account number"),
            Self::MissingBeginningBalance => write!(f, "missing beginning balance"),
            Self::MissingEndingBalance => write!(f, "missing ending balance"),
        }
    }
}

/// Reasons for a single transaction. Every predicate is independent.
pub fn transaction_reasons(tx: &TransactionRecord, config: &ReconConfig) -> Vec<SuspicionReason> {
    let mut reasons = Vec::new();
    let is_check = config.is_check_description(tx.description.as_deref());

    if tx.date.is_none() {
        reasons.push(SuspicionReason::NoDate);
    }
    if tx.description.is_none() {
        reasons.push(SuspicionReason::NoDescription);
    }
    if is_check && tx.check_number.is_none() {
        reasons.push(SuspicionReason::CheckWithoutNumber);
    }
    if tx.check_number.is_some() && !is_check {
        reasons.push(SuspicionReason::CheckNumberWithoutCheckDescription);
    }
    if config.cross_validate_check_amounts {
        if let Some(check_amount) = tx.check.as_ref().and_then(|c| c.amount) {
            if check_amount.abs() != tx.amount.abs() {
                reasons.push(SuspicionReason::CheckAmountMismatch {
                    transaction: tx.amount,
                    check: check_amount,
                });
            }
        }
    }
    reasons
}

/// Statement-level reasons. Expects transaction reasons to be current.
pub fn statement_reasons(statement: &Statement) -> Vec<SuspicionReason> {
    let mut reasons = Vec::new();

    if let (Some(expected), Some(declared)) =
        (statement.expected_ending_balance(), statement.ending_balance)
    {
        // Assembly has already rejected totals whose discrepancy overflows.
        if let Some(discrepancy) = declared.checked_sub(expected).filter(|d| !d.is_zero()) {
            reasons.push(SuspicionReason::BalanceMismatch { expected, declared, discrepancy });
        }
    }
    if statement.transactions.iter().any(|t| t.suspicious) {
        reasons.push(SuspicionReason::ContainsSuspiciousRecords);
    }
    if statement.statement_date.is_none() {
        reasons.push(SuspicionReason::MissingStatementDate);
    }
    if statement.pages.iter().any(|p| p.page_number.is_none()) {
        reasons.push(SuspicionReason::MissingPageNumber);
    }
    if statement.pages.iter().any(|p| p.total_pages.is_none()) {
        reasons.push(SuspicionReason::MissingTotalPages);
    }
    if statement.account_number.is_empty() {
        reasons.push(SuspicionReason::MissingAccountNumber);
    }
    if statement.beginning_balance.is_none() {
        reasons.push(SuspicionReason::MissingBeginningBalance);
    }
    if statement.ending_balance.is_none() {
        reasons.push(SuspicionReason::MissingEndingBalance);
    }
    reasons
}

/// Recomputes every suspicion flag on `statement`, transactions first.
/// Must run after anything mutates the statement.
pub fn evaluate(statement: &mut Statement, config: &ReconConfig) {
    for tx in &mut statement.transactions {
        tx.suspicion_reasons = transaction_reasons(tx, config);
        tx.suspicious = !tx.suspicion_reasons.is_empty();
    }
    statement.suspicion_reasons = statement_reasons(statement);
    statement.suspicious = !statement.suspicion_reasons.is_empty()
        || statement.transactions.iter().any(|t| t.suspicious);
}
