//! Statement reconciliation: turns classified page extractions into balanced,
//! suspicion-flagged statements and joins statement check lines with check
//! images across a batch.

pub mod assemble;
pub mod batch;
pub mod check_match;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod report;
pub mod split;
pub mod suspicion;

pub use assemble::assemble;
pub use batch::{run_batch, BatchOutcome, DocumentFailure};
pub use check_match::{match_checks, CheckIndex, CheckMatchOutcome, CheckReport};
pub use config::ReconConfig;
pub use document::{reconcile_document, DocumentOutcome};
pub use error::{ConfigError, ReconError};
pub use model::{
    AccountWindow, CheckData, DocumentMeta, PageMeta, Statement, TransactionId, TransactionRecord,
};
pub use report::{transaction_rows, write_transactions_csv, TransactionRow};
pub use split::split;
pub use suspicion::SuspicionReason;
