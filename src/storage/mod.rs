//! Storage layer for OrderDesk
//!
//! Orders and line items live in one table set behind a lock. Writes run as
//! transactions: the closure works on a private copy which is persisted with
//! an atomic write and swapped in only if the closure succeeds.

pub mod artifacts;
pub mod file_io;
pub mod line_items;
pub mod orders;
pub mod query;
pub mod tables;

pub use artifacts::{validate_artifact_name, ArtifactInfo, ArtifactStore, FsArtifactStore};
pub use file_io::{read_json, write_bytes_atomic, write_json_atomic, write_path_atomic};
pub use line_items::LineItemStore;
pub use orders::OrderStore;
pub use query::{Criteria, Direction, Operator, Paginated, Pagination, Sort, Value};
pub use tables::Tables;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::config::paths::OrderdeskPaths;
use crate::error::{OrderError, OrderResult};

/// Both repositories, as handed to a read or transaction closure
pub trait Repositories: OrderStore + LineItemStore {}

impl<T: OrderStore + LineItemStore> Repositories for T {}

/// Transactional access to the repositories
pub trait Datastore: Sync {
    /// Run a read-only closure against a consistent view
    fn read<T>(&self, f: impl FnOnce(&dyn Repositories) -> OrderResult<T>) -> OrderResult<T>;

    /// Run a closure as one write transaction.
    ///
    /// Everything the closure wrote is committed when it returns `Ok`, and
    /// discarded when it returns `Err`.
    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut dyn Repositories) -> OrderResult<T>,
    ) -> OrderResult<T>;
}

/// Main storage coordinator
pub struct Storage {
    paths: Option<OrderdeskPaths>,
    tables: RwLock<Tables>,
}

impl Storage {
    /// Open the store under the given paths, loading any saved data
    pub fn new(paths: OrderdeskPaths) -> Result<Self, OrderError> {
        paths.ensure_directories()?;
        let tables = Tables::load(&paths.store_file())?;

        Ok(Self {
            paths: Some(paths),
            tables: RwLock::new(tables),
        })
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            paths: None,
            tables: RwLock::new(Tables::new()),
        }
    }

    /// Get the paths configuration, if the store is on disk
    pub fn paths(&self) -> Option<&OrderdeskPaths> {
        self.paths.as_ref()
    }

    /// Discard the in-memory state and load it again from disk
    pub fn reload(&self) -> Result<(), OrderError> {
        if let Some(paths) = &self.paths {
            let loaded = Tables::load(&paths.store_file())?;
            *self.write_tables()? = loaded;
        }
        Ok(())
    }

    fn read_tables(&self) -> Result<RwLockReadGuard<'_, Tables>, OrderError> {
        self.tables
            .read()
            .map_err(|e| OrderError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_tables(&self) -> Result<RwLockWriteGuard<'_, Tables>, OrderError> {
        self.tables
            .write()
            .map_err(|e| OrderError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

impl Datastore for Storage {
    fn read<T>(&self, f: impl FnOnce(&dyn Repositories) -> OrderResult<T>) -> OrderResult<T> {
        let tables = self.read_tables()?;
        f(&*tables)
    }

    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut dyn Repositories) -> OrderResult<T>,
    ) -> OrderResult<T> {
        // Held until the end of the transaction, so writers are serialized
        let mut tables = self.write_tables()?;
        let mut working = tables.clone();

        match f(&mut working) {
            Ok(value) => {
                if let Some(paths) = &self.paths {
                    working.save(&paths.store_file())?;
                }
                *tables = working;
                debug!(
                    orders = tables.order_count(),
                    line_items = tables.line_item_count(),
                    "transaction committed"
                );
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, "transaction rolled back");
                Err(e)
            }
        }
    }
}
