use tally_extract::{
    CheckPage, DocumentExtraction, ExtractedPage, RawAccountWindow, RawTransactionRecord,
    StatementPage,
};
use tracing::{debug, info};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{DocumentMeta, PageMeta, Statement};
use crate::split::split;

/// Everything one source document contributes to a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    pub file_name: String,
    pub statements: Vec<Statement>,
    /// Check images found in the document, matched later across the batch.
    pub checks: Vec<CheckPage>,
}

/// Reconciles one document's pages into statements.
///
/// Statement-level values (bank, account, date, balances) are taken from the
/// first statement page that carries them.
pub fn reconcile_document(
    doc: &DocumentExtraction,
    config: &ReconConfig,
) -> Result<DocumentOutcome, ReconError> {
    if doc.page_count != doc.pages.len() {
        return Err(ReconError::PageCountMismatch {
            file_name: doc.file_name.clone(),
            expected: doc.page_count,
            actual: doc.pages.len(),
        });
    }

    let mut statement_pages: Vec<&StatementPage> = Vec::new();
    let mut checks = Vec::new();
    let mut extra = 0usize;
    for page in &doc.pages {
        match page {
            ExtractedPage::Statement(p) => statement_pages.push(p),
            ExtractedPage::Check(c) => checks.push(c.clone()),
            ExtractedPage::Extra { .. } => extra += 1,
        }
    }
    statement_pages.sort_by_key(|p| p.source.page);

    let meta = document_meta(&doc.file_name, &statement_pages);
    let windows = account_windows(&statement_pages);
    let records: Vec<RawTransactionRecord> = statement_pages
        .iter()
        .flat_map(|p| p.transactions.iter().cloned())
        .collect();

    debug!(
        file = %doc.file_name,
        statement_pages = statement_pages.len(),
        check_pages = checks.len(),
        extra_pages = extra,
        windows = windows.len(),
        "Classified document pages"
    );

    let statements = if statement_pages.is_empty() {
        Vec::new()
    } else {
        split(&records, &windows, &meta, config)?
    };

    info!(
        file = %doc.file_name,
        statements = statements.len(),
        transactions = records.len(),
        checks = checks.len(),
        "Reconciled document"
    );

    Ok(DocumentOutcome { file_name: doc.file_name.clone(), statements, checks })
}

fn document_meta(file_name: &str, pages: &[&StatementPage]) -> DocumentMeta {
    fn first<T: Clone>(pages: &[&StatementPage], get: impl Fn(&StatementPage) -> Option<&T>) -> Option<T> {
        pages.iter().find_map(|p| get(p)).cloned()
    }

    DocumentMeta {
        file_name: file_name.to_string(),
        bank: first(pages, |p| p.bank.as_ref()),
        account_number: first(pages, |p| p.account_number.as_ref()),
        statement_date: first(pages, |p| p.statement_date.as_ref()),
        beginning_balance: first(pages, |p| p.beginning_balance.as_ref()),
        ending_balance: first(pages, |p| p.ending_balance.as_ref()),
        pages: pages
            .iter()
            .map(|p| PageMeta {
                source: p.source.clone(),
                page_number: p.page_number,
                total_pages: p.total_pages,
            })
            .collect(),
    }
}

/// Summary tables are often reprinted on several pages; identical rows
/// collapse to the first occurrence.
fn account_windows(pages: &[&StatementPage]) -> Vec<RawAccountWindow> {
    let mut windows: Vec<RawAccountWindow> = Vec::new();
    for window in pages.iter().flat_map(|p| &p.summary_of_accounts) {
        if !windows.contains(window) {
            windows.push(window.clone());
        }
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tally_core::{CheckNumber, PartialDate};
    use tally_extract::PageRef;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn statement_page(page: u32, total: u32) -> StatementPage {
        StatementPage {
            source: PageRef::new("jan.pdf", page),
            bank: None,
            account_number: None,
            statement_date: None,
            page_number: Some(page),
            total_pages: Some(total),
            beginning_balance: None,
            ending_balance: None,
            summary_of_accounts: vec![],
            transactions: vec![],
        }
    }

    fn tx(page: u32, position: usize, amount: &str) -> RawTransactionRecord {
        RawTransactionRecord {
            date: Some(PartialDate::new(1, 5).unwrap()),
            description: Some("POS".into()),
            amount: Some(dec(amount)),
            deposit: None,
            withdrawal: None,
            check_number: None,
            source: PageRef::new("jan.pdf", page),
            position,
        }
    }

    fn single_account_doc() -> DocumentExtraction {
        let mut first = statement_page(1, 2);
        first.bank = Some("First National".into());
        first.account_number = Some("XXXX1111".into());
        first.statement_date = NaiveDate::from_ymd_opt(2020, 1, 15);
        first.beginning_balance = Some(dec("100.00"));
        first.ending_balance = Some(dec("70.00"));
        first.transactions = vec![tx(1, 0, "-10.00")];
        let mut second = statement_page(2, 2);
        second.account_number = Some("XXXX9999".into());
        second.transactions = vec![tx(2, 0, "-20.00")];

        DocumentExtraction {
            file_name: "jan.pdf".into(),
            page_count: 3,
            pages: vec![
                ExtractedPage::Statement(second),
                ExtractedPage::Check(CheckPage {
                    source: PageRef::new("jan.pdf", 3),
                    account_number: Some("1111".into()),
                    check_number: Some(CheckNumber(1000)),
                    payee: None,
                    date: None,
                    amount: None,
                }),
                ExtractedPage::Statement(first),
            ],
        }
    }

    #[test]
    fn single_account_document() {
        let outcome = reconcile_document(&single_account_doc(), &ReconConfig::default()).unwrap();
        assert_eq!(outcome.statements.len(), 1);
        assert_eq!(outcome.checks.len(), 1);

        let s = &outcome.statements[0];
        // First page that names an account wins.
        assert_eq!(s.account_number.as_str(), "1111");
        assert_eq!(s.bank.as_deref(), Some("First National"));
        assert_eq!(s.transactions.len(), 2);
        assert_eq!(s.pages.len(), 2);
        assert!(!s.suspicious, "reasons: {:?}", s.suspicion_reasons);
    }

    #[test]
    fn page_count_mismatch_fails_document() {
        let mut doc = single_account_doc();
        doc.page_count = 4;
        assert_eq!(
            reconcile_document(&doc, &ReconConfig::default()),
            Err(ReconError::PageCountMismatch { file_name: "jan.pdf".into(), expected: 4, actual: 3 })
        );
    }

    #[test]
    fn checks_only_document_has_no_statements() {
        let mut doc = single_account_doc();
        doc.pages.retain(|p| matches!(p, ExtractedPage::Check(_)));
        doc.page_count = 1;
        let outcome = reconcile_document(&doc, &ReconConfig::default()).unwrap();
        assert!(outcome.statements.is_empty());
        assert_eq!(outcome.checks.len(), 1);
    }

    #[test]
    fn repeated_summary_rows_collapse() {
        let window = |account: &str, start: &str| RawAccountWindow {
            account_number: Some(account.into()),
            start_page: Some(start.into()),
            beginning_balance: Some(dec("0")),
            ending_balance: Some(dec("0")),
        };
        let mut first = statement_page(1, 2);
        first.statement_date = NaiveDate::from_ymd_opt(2020, 1, 31);
        first.summary_of_accounts = vec![window("1111", "1"), window("2222", "2")];
        let mut second = statement_page(2, 2);
        second.summary_of_accounts = vec![window("1111", "1"), window("2222", "2")];

        let doc = DocumentExtraction {
            file_name: "combo.pdf".into(),
            page_count: 2,
            pages: vec![ExtractedPage::Statement(first), ExtractedPage::Statement(second)],
        };
        let outcome = reconcile_document(&doc, &ReconConfig::default()).unwrap();
        assert_eq!(outcome.statements.len(), 2);
        assert_eq!(outcome.statements[0].pages.len(), 1);
        assert_eq!(outcome.statements[1].pages.len(), 1);
    }
}
