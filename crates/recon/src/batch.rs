use std::sync::Arc;

use tally_extract::DocumentExtraction;
use tracing::{info, warn};

use crate::check_match::{match_checks, CheckIndex, CheckReport};
use crate::config::ReconConfig;
use crate::document::{reconcile_document, DocumentOutcome};
use crate::error::ReconError;
use crate::model::Statement;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub file_name: String,
    pub error: ReconError,
}

/// Result of reconciling a batch of documents together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Sorted by file name, then account number.
    pub statements: Vec<Statement>,
    pub report: CheckReport,
    /// Documents that failed a data-integrity check, in submission order.
    pub failures: Vec<DocumentFailure>,
}

/// Reconciles every document on the blocking pool, then matches checks once
/// across everything that succeeded.
pub async fn run_batch(docs: Vec<DocumentExtraction>, config: Arc<ReconConfig>) -> BatchOutcome {
    let total = docs.len();
    let handles: Vec<_> = docs
        .into_iter()
        .map(|doc| {
            let config = Arc::clone(&config);
            let file_name = doc.file_name.clone();
            let handle = tokio::task::spawn_blocking(move || reconcile_document(&doc, &config));
            (file_name, handle)
        })
        .collect();

    let mut outcomes: Vec<DocumentOutcome> = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (file_name, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ReconError::Task { file_name: file_name.clone(), message: e.to_string() }),
        };
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(error) => {
                warn!(file = %file_name, error = %error, "Document failed reconciliation");
                failures.push(DocumentFailure { file_name, error });
            }
        }
    }

    let checks = CheckIndex::from_pages(outcomes.iter().flat_map(|o| &o.checks), &config);
    let mut statements: Vec<Statement> =
        outcomes.into_iter().flat_map(|o| o.statements).collect();
    statements.sort_by(|a, b| {
        (&a.file_name, &a.account_number).cmp(&(&b.file_name, &b.account_number))
    });

    let matched = match_checks(statements, &checks, &config);

    info!(
        documents = total,
        failed = failures.len(),
        statements = matched.statements.len(),
        suspicious = matched.statements.iter().filter(|s| s.suspicious).count(),
        checks_not_found = matched.report.checks_not_found.len(),
        checks_not_used = matched.report.checks_not_used.len(),
        "Batch reconciled"
    );

    BatchOutcome { statements: matched.statements, report: matched.report, failures }
}
