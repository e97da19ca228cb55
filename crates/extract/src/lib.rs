//! Boundary with the external document-understanding service: typed page
//! extractions built from its per-page field maps.

pub mod fields;
pub mod page;
pub mod types;

pub use page::{ExtractError, FieldMap, PageEnvelope};
pub use types::{
    CheckPage, DocumentExtraction, ExtractedPage, PageRef, RawAccountWindow, RawTransactionRecord,
    StatementPage,
};
