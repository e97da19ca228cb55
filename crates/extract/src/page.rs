use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::fields;
use crate::types::{
    CheckPage, DocumentExtraction, ExtractedPage, PageRef, RawAccountWindow, RawTransactionRecord,
    StatementPage,
};

/// Named fields for one page, as delivered by the document-understanding
/// service.
pub type FieldMap = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid extraction JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{file_name} page {page}: expected exactly one of statement/check/extra_page, found {populated}")]
    AmbiguousPage { file_name: String, page: u32, populated: usize },
    #[error("{page}: field '{field}' must be {expected}")]
    FieldShape { page: PageRef, field: &'static str, expected: &'static str },
}

/// The service's per-page payload: an optional-field union where, in a
/// well-formed page, exactly one member is present.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope {
    pub page: u32,
    #[serde(default)]
    pub bates: Option<String>,
    #[serde(default)]
    pub statement: Option<FieldMap>,
    #[serde(default)]
    pub check: Option<FieldMap>,
    #[serde(default)]
    pub extra_page: Option<FieldMap>,
}

impl PageEnvelope {
    /// Converts the union into a single [`ExtractedPage`], rejecting envelopes
    /// with zero or several populated members.
    pub fn classify(self, file_name: &str) -> Result<ExtractedPage, ExtractError> {
        let mut source = PageRef::new(file_name, self.page);
        source.bates = self.bates.filter(|b| !b.trim().is_empty());

        match (self.statement, self.check, self.extra_page) {
            (Some(map), None, None) => Ok(ExtractedPage::Statement(statement_page(source, &map)?)),
            (None, Some(map), None) => Ok(ExtractedPage::Check(check_page(source, &map))),
            (None, None, Some(_)) => Ok(ExtractedPage::Extra { source }),
            (s, c, e) => Err(ExtractError::AmbiguousPage {
                file_name: file_name.to_string(),
                page: source.page,
                populated: [s.is_some(), c.is_some(), e.is_some()]
                    .iter()
                    .filter(|p| **p)
                    .count(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentEnvelope {
    file_name: String,
    page_count: usize,
    pages: Vec<PageEnvelope>,
}

impl DocumentExtraction {
    /// Parses a whole-document payload:
    /// `{ "file_name": …, "page_count": …, "pages": [envelope, …] }`.
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let doc: DocumentEnvelope = serde_json::from_str(json)?;
        let pages = doc
            .pages
            .into_iter()
            .map(|p| p.classify(&doc.file_name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DocumentExtraction { file_name: doc.file_name, page_count: doc.page_count, pages })
    }
}

// ── Field-map readers ─────────────────────────────────────────────────────────

fn field<T>(
    map: &FieldMap,
    name: &'static str,
    at: &PageRef,
    coerce: fn(Option<&Value>) -> Option<T>,
) -> Option<T> {
    let raw = map.get(name).filter(|v| !v.is_null());
    let value = coerce(raw);
    if value.is_none() {
        if let Some(raw) = raw {
            debug!(page = %at, field = name, value = %raw, "Dropping uncoercible field");
        }
    }
    value
}

fn objects<'a>(
    map: &'a FieldMap,
    name: &'static str,
    at: &PageRef,
) -> Result<Vec<&'a FieldMap>, ExtractError> {
    let shape_err = || ExtractError::FieldShape {
        page: at.clone(),
        field: name,
        expected: "an array of objects",
    };
    match map.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_object().ok_or_else(shape_err))
            .collect(),
        Some(_) => Err(shape_err()),
    }
}

fn statement_page(source: PageRef, map: &FieldMap) -> Result<StatementPage, ExtractError> {
    let summary_of_accounts = objects(map, "summary_of_accounts", &source)?
        .into_iter()
        .map(|row| RawAccountWindow {
            account_number: field(row, "account_number", &source, fields::text),
            start_page: field(row, "start_page", &source, fields::text),
            beginning_balance: field(row, "beginning_balance", &source, fields::amount),
            ending_balance: field(row, "ending_balance", &source, fields::amount),
        })
        .collect();

    let transactions = objects(map, "transactions", &source)?
        .into_iter()
        .enumerate()
        .map(|(position, row)| RawTransactionRecord {
            date: field(row, "date", &source, fields::partial_date),
            description: field(row, "description", &source, fields::text),
            amount: field(row, "amount", &source, fields::amount),
            deposit: field(row, "deposit", &source, fields::amount),
            withdrawal: field(row, "withdrawal", &source, fields::amount),
            check_number: field(row, "check_number", &source, fields::check_number),
            source: source.clone(),
            position,
        })
        .collect();

    Ok(StatementPage {
        bank: field(map, "bank", &source, fields::text),
        account_number: field(map, "account_number", &source, fields::text),
        statement_date: field(map, "statement_date", &source, fields::full_date),
        page_number: field(map, "page_number", &source, fields::counter),
        total_pages: field(map, "total_pages", &source, fields::counter),
        beginning_balance: field(map, "beginning_balance", &source, fields::amount),
        ending_balance: field(map, "ending_balance", &source, fields::amount),
        summary_of_accounts,
        transactions,
        source,
    })
}

fn check_page(source: PageRef, map: &FieldMap) -> CheckPage {
    CheckPage {
        account_number: field(map, "account_number", &source, fields::text),
        check_number: field(map, "check_number", &source, fields::check_number),
        payee: field(map, "payee", &source, fields::text),
        date: field(map, "date", &source, fields::full_date),
        amount: field(map, "amount", &source, fields::amount),
        source,
    }
}
