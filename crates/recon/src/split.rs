use tally_extract::{RawAccountWindow, RawTransactionRecord};
use tracing::debug;

use crate::assemble::assemble;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{AccountWindow, DocumentMeta, Statement};

/// Splits a composite document into one statement per account window.
///
/// With no windows the whole document is one implicit account. Otherwise
/// every window yields a statement, even one that owns no transactions.
pub fn split(
    records: &[RawTransactionRecord],
    windows: &[RawAccountWindow],
    meta: &DocumentMeta,
    config: &ReconConfig,
) -> Result<Vec<Statement>, ReconError> {
    if windows.is_empty() {
        return Ok(vec![assemble(records, None, meta, config)?]);
    }

    let mut windows = windows
        .iter()
        .map(|w| AccountWindow::from_raw(w, &meta.file_name))
        .collect::<Result<Vec<_>, _>>()?;
    windows.sort_by_key(|w| w.start_page);

    let mut partitions: Vec<(Vec<RawTransactionRecord>, DocumentMeta)> = windows
        .iter()
        .map(|_| (Vec::new(), DocumentMeta { pages: Vec::new(), ..meta.clone() }))
        .collect();
    for record in records {
        partitions[owner(&windows, record.source.page)].0.push(record.clone());
    }
    for page in &meta.pages {
        partitions[owner(&windows, page.source.page)].1.pages.push(page.clone());
    }

    debug!(
        file = %meta.file_name,
        windows = windows.len(),
        records = records.len(),
        "Splitting composite document"
    );

    windows
        .iter()
        .zip(partitions)
        .map(|(window, (records, meta))| assemble(&records, Some(window), &meta, config))
        .collect()
}

/// Index of the window that owns `page`: the last window starting at or
/// before it, or the first window when the page precedes them all.
///
/// `windows` must be sorted by start page and non-empty.
pub fn owner(windows: &[AccountWindow], page: u32) -> usize {
    windows.iter().rposition(|w| w.start_page <= page).unwrap_or(0)
}
