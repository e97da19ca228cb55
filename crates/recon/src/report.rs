use std::io::Write;

use serde::Serialize;

use crate::model::{Statement, TransactionRecord};

/// One flattened transaction for the CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRow {
    pub file_name: String,
    pub bank: String,
    pub account_number: String,
    pub statement_date: String,
    pub transaction_id: String,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub check_number: String,
    pub check_payee: String,
    pub suspicion_reasons: String,
}

impl TransactionRow {
    pub fn new(statement: &Statement, tx: &TransactionRecord) -> Self {
        Self {
            file_name: statement.file_name.clone(),
            bank: statement.bank.clone().unwrap_or_default(),
            account_number: statement.account_number.to_string(),
            statement_date: statement
                .statement_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            transaction_id: tx.id.to_string(),
            date: tx.date.map(|d| d.to_string()).unwrap_or_default(),
            description: tx.description.clone().unwrap_or_default(),
            amount: format!("{:.2}", tx.amount.as_decimal()),
            check_number: tx.check_number.map(|n| n.to_string()).unwrap_or_default(),
            check_payee: tx
                .check
                .as_ref()
                .and_then(|c| c.payee.clone())
                .unwrap_or_default(),
            suspicion_reasons: tx
                .suspicion_reasons
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

pub fn transaction_rows(statements: &[Statement]) -> Vec<TransactionRow> {
    statements
        .iter()
        .flat_map(|s| s.transactions.iter().map(move |tx| TransactionRow::new(s, tx)))
        .collect()
}

/// Writes every transaction of `statements` as CSV, header first. The header
/// is written even when there are no rows.
pub fn write_transactions_csv<W: Write>(statements: &[Statement], writer: W) -> Result<(), csv::Error> {
    let rows = transaction_rows(statements);
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(!rows.is_empty())
        .from_writer(writer);

    if rows.is_empty() {
        csv.write_record(HEADERS)?;
    }
    for row in &rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

const HEADERS: [&str; 11] = [
    "file_name",
    "bank",
    "account_number",
    "statement_date",
    "transaction_id",
    "date",
    "description",
    "amount",
    "check_number",
    "check_payee",
    "suspicion_reasons",
];
