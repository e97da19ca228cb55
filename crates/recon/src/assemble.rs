use tally_core::{resolve, AccountNumber, Money};
use tally_extract::RawTransactionRecord;
use tracing::{debug, warn};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{AccountWindow, DocumentMeta, Statement, TransactionId, TransactionRecord};
use crate::suspicion;

/// Builds one statement from raw records.
///
/// With a window, the account number and balances come from the window;
/// without one, from the document. Either way the page set is `meta.pages`,
/// so callers that split a document pass the already-partitioned meta.
pub fn assemble(
    records: &[RawTransactionRecord],
    window: Option<&AccountWindow>,
    meta: &DocumentMeta,
    config: &ReconConfig,
) -> Result<Statement, ReconError> {
    let (raw_account, beginning, ending) = match window {
        Some(w) => {
            if w.account_number.is_none() && meta.account_number.is_some() {
                warn!(
                    file = %meta.file_name,
                    start_page = w.start_page,
                    "Account window has no account number; using the document's"
                );
            }
            (
                w.account_number.as_deref().or(meta.account_number.as_deref()),
                w.beginning_balance,
                w.ending_balance,
            )
        }
        None => (meta.account_number.as_deref(), meta.beginning_balance, meta.ending_balance),
    };
    let account_number =
        AccountNumber::canonical_with_digits(raw_account.unwrap_or_default(), config.canonical_digits);

    let mut transactions = records
        .iter()
        .map(|r| build_transaction(r, meta))
        .collect::<Result<Vec<_>, _>>()?;
    transactions.sort_by(|a, b| {
        (a.date.is_none(), a.date, a.source.page, &a.id)
            .cmp(&(b.date.is_none(), b.date, b.source.page, &b.id))
    });

    let mut pages = meta.pages.clone();
    pages.sort();

    let mut statement = Statement {
        file_name: meta.file_name.clone(),
        bank: meta.bank.clone(),
        account_number,
        statement_date: meta.statement_date,
        beginning_balance: beginning.map(Money::from_decimal),
        ending_balance: ending.map(Money::from_decimal),
        transactions,
        pages,
        suspicious: false,
        suspicion_reasons: Vec::new(),
    };
    check_totals(&statement)?;
    suspicion::evaluate(&mut statement, config);

    debug!(
        file = %statement.file_name,
        account = %statement.account_number,
        transactions = statement.transactions.len(),
        suspicious = statement.suspicious,
        "Assembled statement"
    );
    Ok(statement)
}

fn build_transaction(
    record: &RawTransactionRecord,
    meta: &DocumentMeta,
) -> Result<TransactionRecord, ReconError> {
    let amount = signed_amount(record).ok_or_else(|| ReconError::MissingAmount {
        page: record.source.clone(),
        position: record.position,
    })?;
    let date = meta.statement_date.and_then(|reference| resolve(record.date, reference));

    Ok(TransactionRecord {
        id: TransactionId::new(&record.source, record.position),
        date,
        description: record.description.clone(),
        amount,
        check_number: record.check_number,
        check: None,
        source: record.source.clone(),
        suspicious: false,
        suspicion_reasons: Vec::new(),
    })
}

/// Every total the statement reports, and the balance discrepancy, must fit
/// in `Decimal`. Extracted amounts are only bounded individually.
fn check_totals(statement: &Statement) -> Result<(), ReconError> {
    let overflow = || ReconError::TotalOverflow {
        file_name: statement.file_name.clone(),
        account: statement.account_number.to_string(),
    };
    statement.total_deposits().ok_or_else(overflow)?;
    statement.total_withdrawals().ok_or_else(overflow)?;
    statement.net_change().ok_or_else(overflow)?;
    if statement.beginning_balance.is_some() {
        let expected = statement.expected_ending_balance().ok_or_else(overflow)?;
        if let Some(declared) = statement.ending_balance {
            declared.checked_sub(expected).ok_or_else(overflow)?;
        }
    }
    Ok(())
}

/// A single signed column wins. Otherwise deposits count positive and
/// withdrawals negative whatever sign the extraction printed.
fn signed_amount(record: &RawTransactionRecord) -> Option<Money> {
    if let Some(amount) = record.amount {
        return Some(Money::from_decimal(amount));
    }
    if record.deposit.is_none() && record.withdrawal.is_none() {
        return None;
    }
    // Both sides are non-negative, so the difference stays within range.
    let deposit = record.deposit.unwrap_or_default().abs();
    let withdrawal = record.withdrawal.unwrap_or_default().abs();
    Some(Money::from_decimal(deposit - withdrawal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageMeta;
    use crate::suspicion::SuspicionReason;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tally_core::{CheckNumber, PartialDate};
    use tally_extract::PageRef;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(page: u32, position: usize, date: Option<(u32, u32)>, amount: &str) -> RawTransactionRecord {
        RawTransactionRecord {
            date: date.map(|(m, d)| PartialDate::new(m, d).unwrap()),
            description: Some("POS PURCHASE".into()),
            amount: Some(dec(amount)),
            deposit: None,
            withdrawal: None,
            check_number: None,
            source: PageRef::new("jan.pdf", page),
            position,
        }
    }

    fn meta(begin: &str, end: &str) -> DocumentMeta {
        DocumentMeta {
            file_name: "jan.pdf".into(),
            bank: Some("First National".into()),
            account_number: Some("XXXX-XXXX-1111".into()),
            statement_date: NaiveDate::from_ymd_opt(2020, 1, 15),
            beginning_balance: Some(dec(begin)),
            ending_balance: Some(dec(end)),
            pages: vec![PageMeta {
                source: PageRef::new("jan.pdf", 1),
                page_number: Some(1),
                total_pages: Some(1),
            }],
        }
    }

    #[test]
    fn year_wrap_and_balanced_statement() {
        let records = vec![record(1, 0, Some((12, 5)), "-500.00")];
        let s = assemble(&records, None, &meta("500.00", "0.00"), &ReconConfig::default()).unwrap();
        assert_eq!(s.account_number.as_str(), "1111");
        assert_eq!(s.transactions[0].date, NaiveDate::from_ymd_opt(2019, 12, 5));
        assert_eq!(s.expected_ending_balance(), Some(Money::zero()));
        assert!(!s.suspicious, "reasons: {:?}", s.suspicion_reasons);
    }

    #[test]
    fn declared_balance_disagreement_is_flagged() {
        let records = vec![record(1, 0, Some((12, 5)), "-500.00")];
        let s = assemble(&records, None, &meta("500.00", "100.00"), &ReconConfig::default()).unwrap();
        assert!(s.suspicious);
        assert!(matches!(
            s.suspicion_reasons[0],
            SuspicionReason::BalanceMismatch { expected, .. } if expected == Money::zero()
        ));
    }

    #[test]
    fn transactions_sorted_by_date_then_page_then_id() {
        let records = vec![
            record(2, 0, Some((1, 10)), "-1.00"),
            record(1, 1, Some((1, 10)), "-2.00"),
            record(1, 0, Some((1, 10)), "-3.00"),
            record(1, 2, None, "-4.00"),
            record(2, 1, Some((12, 30)), "-5.00"),
        ];
        let s = assemble(&records, None, &meta("0", "-15.00"), &ReconConfig::default()).unwrap();
        let ids: Vec<String> = s.transactions.iter().map(|t| t.id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "jan.pdf:p0002:r001", // 2019-12-30
                "jan.pdf:p0001:r000",
                "jan.pdf:p0001:r001",
                "jan.pdf:p0002:r000",
                "jan.pdf:p0001:r002", // undated last
            ]
        );
    }

    #[test]
    fn assembly_is_deterministic() {
        let records = vec![
            record(1, 0, Some((1, 3)), "-1.00"),
            record(1, 1, Some((1, 2)), "-2.00"),
        ];
        let m = meta("10.00", "7.00");
        let config = ReconConfig::default();
        let a = assemble(&records, None, &m, &config).unwrap();
        let mut reversed = records.clone();
        reversed.reverse();
        let b = assemble(&reversed, None, &m, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn deposit_and_withdrawal_columns() {
        let mut dep = record(1, 0, Some((1, 2)), "0");
        dep.amount = None;
        dep.deposit = Some(dec("100.00"));
        let mut wd = record(1, 1, Some((1, 3)), "0");
        wd.amount = None;
        wd.withdrawal = Some(dec("-40.00"));
        let s = assemble(&[dep, wd], None, &meta("0", "60.00"), &ReconConfig::default()).unwrap();
        assert_eq!(s.transactions[0].amount, Money::from_cents(10_000));
        assert!(s.transactions[0].is_deposit());
        assert_eq!(s.transactions[1].amount, Money::from_cents(-4_000));
        assert!(s.transactions[1].is_withdrawal());
        assert_eq!(s.total_deposits(), Some(Money::from_cents(10_000)));
        assert_eq!(s.total_withdrawals(), Some(Money::from_cents(-4_000)));
        assert!(!s.suspicious);
    }

    #[test]
    fn record_without_any_amount_fails_fast() {
        let mut bad = record(1, 3, Some((1, 2)), "0");
        bad.amount = None;
        let err = assemble(&[bad], None, &meta("0", "0"), &ReconConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ReconError::MissingAmount { page: PageRef::new("jan.pdf", 1), position: 3 }
        );
    }

    const DECIMAL_MAX: &str = "79228162514264337593543950335";

    #[test]
    fn totals_beyond_decimal_range_are_rejected() {
        let records = vec![
            record(1, 0, Some((1, 2)), DECIMAL_MAX),
            record(1, 1, Some((1, 3)), DECIMAL_MAX),
        ];
        let err = assemble(&records, None, &meta("0", "0"), &ReconConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ReconError::TotalOverflow { file_name: "jan.pdf".into(), account: "1111".into() }
        );
    }

    #[test]
    fn withdrawal_totals_beyond_decimal_range_are_rejected() {
        let mut a = record(1, 0, Some((1, 2)), "0");
        a.amount = None;
        a.withdrawal = Some(dec(DECIMAL_MAX));
        let mut b = a.clone();
        b.position = 1;
        let err = assemble(&[a, b], None, &meta("0", "0"), &ReconConfig::default()).unwrap_err();
        assert!(matches!(err, ReconError::TotalOverflow { .. }));
    }

    #[test]
    fn balance_discrepancy_beyond_decimal_range_is_rejected() {
        // Each total fits; the declared-minus-expected difference does not.
        let records = vec![record(1, 0, Some((1, 2)), &format!("-{DECIMAL_MAX}"))];
        let err = assemble(&records, None, &meta("0", DECIMAL_MAX), &ReconConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReconError::TotalOverflow { .. }));
    }

    #[test]
    fn largest_single_amount_still_assembles() {
        let records = vec![record(1, 0, Some((1, 2)), DECIMAL_MAX)];
        let s = assemble(&records, None, &meta("0", DECIMAL_MAX), &ReconConfig::default()).unwrap();
        assert_eq!(s.net_change(), Some(Money::from_decimal(dec(DECIMAL_MAX))));
        assert!(!s.suspicious, "reasons: {:?}", s.suspicion_reasons);
    }

    #[test]
    fn positions_past_999_sort_after_earlier_lines() {
        let records = vec![
            record(1, 1000, Some((1, 10)), "-1.00"),
            record(1, 999, Some((1, 10)), "-2.00"),
        ];
        let s = assemble(&records, None, &meta("0", "-3.00"), &ReconConfig::default()).unwrap();
        let positions: Vec<usize> = s.transactions.iter().map(|t| t.id.position).collect();
        assert_eq!(positions, vec![999, 1000]);
    }

    #[test]
    fn window_without_account_falls_back_to_document() {
        let window = AccountWindow {
            account_number: None,
            start_page: 1,
            beginning_balance: Some(dec("20.00")),
            ending_balance: Some(dec("19.00")),
        };
        let s = assemble(
            &[record(1, 0, Some((1, 2)), "-1.00")],
            Some(&window),
            &meta("500.00", "0.00"),
            &ReconConfig::default(),
        )
        .unwrap();
        assert_eq!(s.account_number.as_str(), "1111");
        assert_eq!(s.beginning_balance, Some(Money::from_cents(2_000)));
    }

    #[test]
    fn missing_statement_date_leaves_transactions_undated() {
        let mut m = meta("10.00", "9.00");
        m.statement_date = None;
        let s = assemble(&[record(1, 0, Some((1, 2)), "-1.00")], None, &m, &ReconConfig::default())
            .unwrap();
        assert_eq!(s.transactions[0].date, None);
        assert_eq!(s.transactions[0].suspicion_reasons, vec![SuspicionReason::NoDate]);
        assert_eq!(
            s.suspicion_reasons,
            vec![SuspicionReason::ContainsSuspiciousRecords, SuspicionReason::MissingStatementDate]
        );
    }

    #[test]
    fn window_overrides_account_and_balances() {
        let window = AccountWindow {
            account_number: Some("9876542222".into()),
            start_page: 1,
            beginning_balance: Some(dec("20.00")),
            ending_balance: Some(dec("19.00")),
        };
        let s = assemble(
            &[record(1, 0, Some((1, 2)), "-1.00")],
            Some(&window),
            &meta("500.00", "0.00"),
            &ReconConfig::default(),
        )
        .unwrap();
        assert_eq!(s.account_number.as_str(), "2222");
        assert_eq!(s.beginning_balance, Some(Money::from_cents(2_000)));
        assert!(!s.suspicious);
    }

    #[test]
    fn check_line_keeps_its_number() {
        let mut r = record(1, 0, Some((1, 2)), "-25.00");
        r.description = Some("CHECK".into());
        r.check_number = Some(CheckNumber(1000));
        let s = assemble(&[r], None, &meta("25.00", "0"), &ReconConfig::default()).unwrap();
        assert_eq!(s.transactions[0].check_number, Some(CheckNumber(1000)));
        assert!(!s.suspicious);
    }
}
