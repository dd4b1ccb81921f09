//! Export module for OrderDesk
//!
//! Streams every order and line item into a two-sheet `.xlsx` workbook,
//! stores it in the artifact store and serves it back for download. Exports
//! are pruned after each run according to the retention settings.

pub mod xlsx;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{ExportRetention, ExportSettings};
use crate::error::{OrderError, OrderResult};
use crate::models::{LineItem, LineItemId, OrderField, OrderId, OrderNumber};
use crate::storage::{validate_artifact_name, ArtifactStore, Datastore, Repositories};

use xlsx::ExportWorkbook;

const FILE_PREFIX: &str = "orders_export_";
const FILE_EXTENSION: &str = ".xlsx";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the export file written at `timestamp`
pub fn export_file_name(timestamp: NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        FILE_PREFIX,
        timestamp.format(TIMESTAMP_FORMAT),
        FILE_EXTENSION
    )
}

/// Timestamp encoded in an export file name, None for other files
pub fn parse_export_file_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_EXTENSION)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Shared flag used to stop a running export between batches
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone sees it
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> OrderResult<()> {
        if self.is_cancelled() {
            return Err(OrderError::Cancelled("export cancelled".into()));
        }
        Ok(())
    }
}

/// Outcome of a finished export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub file_name: String,
    /// Data rows in the Orders sheet
    pub order_rows: usize,
    /// Data rows in the Order Product sheet
    pub line_item_rows: usize,
    pub size_bytes: u64,
    /// Older exports removed by the retention policy
    pub pruned: Vec<String>,
}

/// A stored export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub name: String,
    pub created_at: NaiveDateTime,
    pub size_bytes: u64,
}

/// Service for spreadsheet exports
pub struct ExportService<'a, D: Datastore, A: ArtifactStore> {
    store: &'a D,
    artifacts: &'a A,
    batch_size: usize,
    retention: ExportRetention,
    rows_per_sheet: u32,
}

impl<'a, D: Datastore, A: ArtifactStore> ExportService<'a, D, A> {
    /// Create a new export service with default settings
    pub fn new(store: &'a D, artifacts: &'a A) -> Self {
        Self::from_settings(store, artifacts, &ExportSettings::default())
    }

    pub fn from_settings(store: &'a D, artifacts: &'a A, settings: &ExportSettings) -> Self {
        Self {
            store,
            artifacts,
            batch_size: settings.batch_size.max(1),
            retention: settings.retention.normalized(),
            rows_per_sheet: xlsx::MAX_SHEET_ROWS,
        }
    }

    /// Rows read per store batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_retention(mut self, retention: ExportRetention) -> Self {
        self.retention = retention.normalized();
        self
    }

    /// Rows per worksheet before a continuation sheet is started
    pub fn with_rows_per_sheet(mut self, rows: u32) -> Self {
        self.rows_per_sheet = rows;
        self
    }

    /// Export everything now
    pub fn export(&self) -> OrderResult<ExportSummary> {
        self.export_at(Local::now().naive_local(), &CancelToken::new())
    }

    /// Export everything, naming the file after `timestamp`.
    ///
    /// Rows are streamed to a scratch file that only becomes the named
    /// export once complete. The token is checked before every batch and
    /// once more before the file is published; a cancelled export stores
    /// nothing.
    #[instrument(skip(self, cancel))]
    pub fn export_at(
        &self,
        timestamp: NaiveDateTime,
        cancel: &CancelToken,
    ) -> OrderResult<ExportSummary> {
        let file_name = export_file_name(timestamp);
        let mut rows = (0, 0);

        let size_bytes = self.artifacts.put_with(&file_name, |path| {
            let mut book = ExportWorkbook::new().with_rows_per_sheet(self.rows_per_sheet);
            rows.0 = self.write_orders(&mut book, cancel)?;
            rows.1 = self.write_line_items(&mut book, cancel)?;
            book.save(path)?;
            cancel.check()
        })?;
        let (order_rows, line_item_rows) = rows;
        info!(
            file = %file_name,
            order_rows,
            line_item_rows,
            size_bytes,
            "export written"
        );

        // The export is stored by now; cleanup failures are only logged
        let pruned = match self.prune_keeping(timestamp, Some(&file_name)) {
            Ok(pruned) => pruned,
            Err(e) => {
                warn!(error = %e, "pruning old exports failed");
                Vec::new()
            }
        };

        Ok(ExportSummary {
            file_name,
            order_rows,
            line_item_rows,
            size_bytes,
            pruned,
        })
    }

    /// Read an export file
    pub fn download(&self, file_name: &str) -> OrderResult<Vec<u8>> {
        validate_artifact_name(file_name)?;
        self.artifacts.get(file_name)
    }

    /// Stored export files, newest first
    pub fn list(&self) -> OrderResult<Vec<ExportFile>> {
        let mut files: Vec<ExportFile> = self
            .artifacts
            .list()?
            .into_iter()
            .filter_map(|artifact| {
                parse_export_file_name(&artifact.name).map(|created_at| ExportFile {
                    name: artifact.name,
                    created_at,
                    size_bytes: artifact.size_bytes,
                })
            })
            .collect();

        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    /// Apply the retention policy as of `now`, returning the removed names
    pub fn prune(&self, now: NaiveDateTime) -> OrderResult<Vec<String>> {
        self.prune_keeping(now, None)
    }

    /// Prune, never removing `pinned`. The pinned file takes one of the
    /// `max_files` slots.
    fn prune_keeping(&self, now: NaiveDateTime, pinned: Option<&str>) -> OrderResult<Vec<String>> {
        let max_age = Duration::days(i64::from(self.retention.max_age_days));
        let files = self.list()?;

        let is_pinned = |file: &ExportFile| pinned == Some(file.name.as_str());
        let mut slots = self.retention.max_files;
        if files.iter().any(is_pinned) {
            slots = slots.saturating_sub(1);
        }

        let mut kept = 0;
        let mut removed = Vec::new();
        for file in files {
            if is_pinned(&file) {
                continue;
            }

            let too_many = kept >= slots;
            let expired = now.signed_duration_since(file.created_at) > max_age;
            if too_many || expired {
                self.artifacts.remove(&file.name)?;
                warn!(file = %file.name, too_many, expired, "pruned export");
                removed.push(file.name);
            } else {
                kept += 1;
            }
        }

        Ok(removed)
    }

    /// Orders in id order, one store read per batch
    fn write_orders(&self, book: &mut ExportWorkbook, cancel: &CancelToken) -> OrderResult<usize> {
        let mut sheet = book.orders()?;
        let mut next_id = OrderId::from_raw(1);
        loop {
            cancel.check()?;
            let batch = self.store.read(|repos| repos.orders_from(next_id, self.batch_size))?;

            for order in &batch {
                sheet.append_order(order)?;
            }
            debug!(rows = batch.len(), "exported order batch");

            match batch.last() {
                Some(last) if batch.len() == self.batch_size => {
                    next_id = OrderId::from_raw(last.id.get() + 1)
                }
                _ => return Ok(sheet.data_rows()),
            }
        }
    }

    /// Line items in id order with their order number. Items whose order is
    /// gone by the time the batch is read are left out.
    fn write_line_items(
        &self,
        book: &mut ExportWorkbook,
        cancel: &CancelToken,
    ) -> OrderResult<usize> {
        let mut sheet = book.line_items()?;
        let mut next_id = LineItemId::from_raw(1);
        loop {
            cancel.check()?;
            let (batch, scanned, last_id) = self.store.read(|repos| {
                let items = repos.line_items_from(next_id, self.batch_size)?;
                let scanned = items.len();
                let last_id = items.last().map(|item| item.id);

                let mut numbers: HashMap<OrderId, OrderNumber> = HashMap::new();
                let mut joined: Vec<(OrderNumber, LineItem)> = Vec::with_capacity(scanned);
                for item in items {
                    let order_no = match numbers.get(&item.order_id) {
                        Some(number) => Some(*number),
                        None => order_number_of(repos, item.order_id)?,
                    };
                    if let Some(order_no) = order_no {
                        numbers.insert(item.order_id, order_no);
                        joined.push((order_no, item));
                    }
                }
                Ok((joined, scanned, last_id))
            })?;

            for (order_no, item) in &batch {
                sheet.append_line_item(order_no, item)?;
            }
            debug!(rows = batch.len(), scanned, "exported line item batch");

            match last_id {
                Some(last) if scanned == self.batch_size => {
                    next_id = LineItemId::from_raw(last.get() + 1)
                }
                _ => return Ok(sheet.data_rows()),
            }
        }
    }
}

/// Order number of an order, None when the order no longer exists
fn order_number_of(repos: &dyn Repositories, id: OrderId) -> OrderResult<Option<OrderNumber>> {
    match repos.find_order_projected(id, &[OrderField::OrderNo]) {
        Ok(row) => Ok(row.order_no),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
