use tally_extract::PageRef;
use thiserror::Error;

/// Data-integrity failures. Each one stops the affected document; other
/// documents in a batch carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconError {
    #[error("{page}: transaction {position} has neither a deposit nor a withdrawal amount")]
    MissingAmount { page: PageRef, position: usize },
    #[error("{file_name}: totals for account '{account}' exceed the representable amount range")]
    TotalOverflow { file_name: String, account: String },
    #[error("{file_name}: account window '{account}' has no starting page")]
    MissingWindowStartPage { file_name: String, account: String },
    #[error("{file_name}: account window '{account}' has an unparsable starting page '{value}'")]
    InvalidWindowStartPage { file_name: String, account: String, value: String },
    #[error("{file_name}: splitter reported {expected} pages but {actual} were extracted")]
    PageCountMismatch { file_name: String, expected: usize, actual: usize },
    #[error("{file_name}: reconciliation task failed: {message}")]
    Task { file_name: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
