use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tally_core::{AccountNumber, CheckDataKey, Money};
use tally_extract::CheckPage;
use tracing::{debug, warn};

use crate::config::ReconConfig;
use crate::model::{CheckData, Statement};
use crate::suspicion;

/// Extracted checks keyed by canonical account and check number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckIndex {
    checks: BTreeMap<CheckDataKey, CheckData>,
}

impl CheckIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from check pages. Pages without an account or check
    /// number cannot be keyed and are skipped; a repeated key keeps the
    /// first page seen.
    pub fn from_pages<'a>(
        pages: impl IntoIterator<Item = &'a CheckPage>,
        config: &ReconConfig,
    ) -> Self {
        let mut index = Self::new();
        for page in pages {
            let (Some(raw_account), Some(check_number)) =
                (page.account_number.as_deref(), page.check_number)
            else {
                warn!(page = %page.source, "Skipping check page without account or check number");
                continue;
            };
            let account_number =
                AccountNumber::canonical_with_digits(raw_account, config.canonical_digits);
            if account_number.is_empty() {
                warn!(page = %page.source, account = raw_account, "Skipping check page without account digits");
                continue;
            }
            index.insert(CheckData {
                account_number,
                check_number,
                payee: page.payee.clone(),
                date: page.date,
                amount: page.amount.map(Money::from_decimal),
                source: page.source.clone(),
            });
        }
        index
    }

    /// Returns false, leaving the index unchanged, when the key is taken.
    pub fn insert(&mut self, check: CheckData) -> bool {
        let key = check.key();
        if let Some(existing) = self.checks.get(&key) {
            warn!(
                key = %key,
                kept = %existing.source,
                dropped = %check.source,
                "Duplicate check image"
            );
            return false;
        }
        self.checks.insert(key, check);
        true
    }

    pub fn get(&self, key: &CheckDataKey) -> Option<&CheckData> {
        self.checks.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CheckDataKey> {
        self.checks.keys()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Reconciliation gaps between statement check lines and check images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub matched: BTreeSet<CheckDataKey>,
    /// Referenced by a transaction but with no check image.
    pub checks_not_found: BTreeSet<CheckDataKey>,
    /// Check images no transaction referenced.
    pub checks_not_used: BTreeSet<CheckDataKey>,
}

impl CheckReport {
    /// True when neither gap set holds a key for any of `accounts`.
    pub fn is_reconciled_for(&self, accounts: &[AccountNumber]) -> bool {
        !self
            .checks_not_found
            .iter()
            .chain(&self.checks_not_used)
            .any(|key| accounts.contains(&key.account))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMatchOutcome {
    pub statements: Vec<Statement>,
    pub report: CheckReport,
}

/// Attaches check images to the transactions that reference them.
///
/// Runs once over a whole batch. Statements that gain a check are
/// re-evaluated so their suspicion state reflects the attached data.
pub fn match_checks(
    mut statements: Vec<Statement>,
    checks: &CheckIndex,
    config: &ReconConfig,
) -> CheckMatchOutcome {
    let mut report = CheckReport::default();

    for statement in &mut statements {
        let mut attached = false;
        for tx in &mut statement.transactions {
            let Some(check_number) = tx.check_number else {
                continue;
            };
            let key = CheckDataKey::new(statement.account_number.clone(), check_number);
            match checks.get(&key) {
                Some(check) => {
                    debug!(transaction = %tx.id, key = %key, "Matched check");
                    tx.check = Some(check.clone());
                    report.matched.insert(key);
                    attached = true;
                }
                None => {
                    report.checks_not_found.insert(key);
                }
            }
        }
        if attached {
            suspicion::evaluate(statement, config);
        }
    }

    report.checks_not_used = checks
        .keys()
        .filter(|key| !report.matched.contains(*key))
        .cloned()
        .collect();

    CheckMatchOutcome { statements, report }
}
