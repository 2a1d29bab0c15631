//! Refresh Driver: feeds one analytics record per batch into a sink table.
//!
//! The sink is split in two traits. A `TableEngine` is the hosting environment's
//! table factory; it is asked for a table once, when the driver mounts. The
//! `Table` it returns receives the view configuration and then one single-row
//! update per batch.
//!
//! Batches may start arriving before the table exists. Until `on_mount`
//! succeeds, `on_batch` does nothing and reports success.

use log::{debug, warn};

use crate::quote::QuoteBatch;
use crate::record::AnalyticsRecord;
use crate::result::Result;
use crate::schema::{Schema, ViewConfig};

/// Table factory provided by the rendering environment.
pub trait TableEngine {
    /// Table type produced by this engine.
    type Table: Table;

    /// Creates a table for `schema`, or fails if the environment is not ready.
    fn table(&mut self, schema: &Schema) -> Result<Self::Table>;
}

/// Rendering sink that stores and displays the record stream.
pub trait Table {
    /// Applies presentation hints. Called once, right after creation.
    fn configure(&mut self, view: &ViewConfig);

    /// Appends `rows` to the table.
    fn update(&mut self, rows: &[AnalyticsRecord]) -> Result<()>;
}

/// Owns the sink and pushes a fresh record into it on every batch.
pub struct RefreshDriver<E: TableEngine> {
    engine: E,
    table: Option<E::Table>,
    view: ViewConfig,
}

impl<E: TableEngine> RefreshDriver<E> {
    /// Driver bound to `engine`, configured with the ratio chart view.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            table: None,
            view: ViewConfig::ratio_chart(),
        }
    }

    /// Creates the sink table from the analytics schema and configures its view.
    ///
    /// Mounting twice is a no-op. If the engine fails the driver stays unmounted
    /// and later batches are skipped.
    pub fn on_mount(&mut self) -> Result<()> {
        if self.table.is_some() {
            warn!("Refresh driver already mounted; ignoring repeated mount");
            return Ok(());
        }

        let schema = Schema::analytics();
        let mut table = self.engine.table(&schema)?;
        table.configure(&self.view);
        self.table = Some(table);
        debug!("Refresh driver mounted with {} columns", schema.fields().len());
        Ok(())
    }

    /// Derives the record for `batch` and appends it to the table as a single row.
    pub fn on_batch(&mut self, batch: &QuoteBatch) -> Result<()> {
        let Some(table) = self.table.as_mut() else {
            debug!("Batch arrived before mount; skipping");
            return Ok(());
        };

        let record = AnalyticsRecord::generate(batch);
        if record.is_alert() {
            debug!(
                "Pushing alerting record ratio={} outside [{}, {}] at {}",
                record.ratio, record.lower_bound, record.upper_bound, record.timestamp
            );
        } else {
            debug!("Pushing record ratio={} at {}", record.ratio, record.timestamp);
        }
        table.update(std::slice::from_ref(&record))
    }

    /// Whether `on_mount` has succeeded.
    pub fn is_mounted(&self) -> bool {
        self.table.is_some()
    }

    /// The mounted table, if any.
    pub fn table(&self) -> Option<&E::Table> {
        self.table.as_ref()
    }
}
