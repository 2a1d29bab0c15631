//! In-memory pivot table used as the chart sink.
//!
//! Rows are grouped by their timestamp, the only row pivot the ratio chart
//! uses. Within a group every column is folded with the aggregate the view
//! configures: `avg` over the non-null values (a group whose alerts are all
//! empty keeps an empty alert) and `distinct count` over the distinct values.
//! The table is the only holder of the record history. Each update logs the
//! group the appended record landed in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use ratio_common::schema::{Aggregate, Column, FieldType, Schema, ViewConfig};
use ratio_common::{AnalyticsRecord, RatioError, Result, Table, TableEngine};

/// Table factory for `PivotTable`.
#[derive(Debug, Default)]
pub struct PivotEngine;

impl TableEngine for PivotEngine {
    type Table = PivotTable;

    fn table(&mut self, schema: &Schema) -> Result<PivotTable> {
        debug!("Creating pivot table with schema {:?}", schema.to_type_map());
        match schema.field(Column::Timestamp) {
            Some(field) if field.kind == FieldType::Date => Ok(PivotTable::new(schema.clone())),
            _ => Err(RatioError::TableUnavailable(String::from(
                "schema has no date column to pivot on",
            ))),
        }
    }
}

/// Raw values collected for one timestamp.
#[derive(Debug, Default)]
struct Group {
    rows: usize,
    values: BTreeMap<Column, Vec<f64>>,
}

/// One aggregated row of the pivoted view.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    /// Group key.
    pub timestamp: DateTime<Utc>,
    /// Number of raw rows folded into this one.
    pub rows: usize,
    /// Aggregated values for the view's columns, in view order.
    pub values: Vec<(Column, Option<f64>)>,
}

impl PivotRow {
    /// Aggregated value of `column`, if the view shows it and it is not empty.
    pub fn value(&self, column: Column) -> Option<f64> {
        self.values
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, v)| *v)
    }

    /// Whether the row carries an alert.
    pub fn is_alert(&self) -> bool {
        self.value(Column::TriggerAlert).is_some()
    }

    fn render(&self) -> String {
        let cells: Vec<String> = self
            .values
            .iter()
            .map(|(column, value)| match value {
                Some(v) => format!("{}={:.4}", column, v),
                None => format!("{}=-", column),
            })
            .collect();
        format!("{} {}", self.timestamp.format("%H:%M:%S%.3f"), cells.join(" "))
    }
}

/// Sink table grouping records by timestamp.
#[derive(Debug)]
pub struct PivotTable {
    schema: Schema,
    view: ViewConfig,
    groups: BTreeMap<DateTime<Utc>, Group>,
    total_rows: usize,
    last_pushed: Option<DateTime<Utc>>,
}

impl PivotTable {
    /// Empty table for `schema`, showing the ratio chart until configured otherwise.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            view: ViewConfig::ratio_chart(),
            groups: BTreeMap::new(),
            total_rows: 0,
            last_pushed: None,
        }
    }

    /// Number of raw rows appended so far.
    pub fn len(&self) -> usize {
        self.total_rows
    }

    /// Whether nothing was appended yet.
    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }

    /// Number of distinct timestamps.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Aggregated row with the latest timestamp.
    pub fn latest(&self) -> Option<PivotRow> {
        self.groups
            .iter()
            .next_back()
            .map(|(ts, group)| self.aggregate_group(*ts, group))
    }

    /// Aggregated row of the group the most recently appended record went into.
    ///
    /// Differs from `latest` when a record arrives with an older timestamp.
    pub fn last_updated(&self) -> Option<PivotRow> {
        let timestamp = self.last_pushed?;
        self.groups
            .get(&timestamp)
            .map(|group| self.aggregate_group(timestamp, group))
    }

    /// All aggregated rows in timestamp order.
    pub fn rows(&self) -> Vec<PivotRow> {
        self.groups
            .iter()
            .map(|(ts, group)| self.aggregate_group(*ts, group))
            .collect()
    }

    fn aggregate_group(&self, timestamp: DateTime<Utc>, group: &Group) -> PivotRow {
        let values = self
            .view
            .columns
            .iter()
            .map(|column| {
                let raw = group.values.get(column).map(Vec::as_slice).unwrap_or(&[]);
                (*column, fold(self.view.aggregate(*column), raw))
            })
            .collect();
        PivotRow {
            timestamp,
            rows: group.rows,
            values,
        }
    }

    fn push(&mut self, record: &AnalyticsRecord) {
        let group = self.groups.entry(record.timestamp).or_default();
        group.rows += 1;
        for field in self.schema.fields() {
            let value = match field.column {
                Column::Timestamp => Some(record.timestamp.timestamp_millis() as f64),
                column => record.numeric(column),
            };
            if let Some(value) = value {
                group.values.entry(field.column).or_default().push(value);
            }
        }
        self.total_rows += 1;
        self.last_pushed = Some(record.timestamp);
    }
}

/// Folds the non-null values of one column; `None` when there are none.
fn fold(aggregate: Aggregate, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match aggregate {
        Aggregate::Avg => Some(values.iter().sum::<f64>() / values.len() as f64),
        Aggregate::DistinctCount => {
            let mut bits: Vec<u64> = values.iter().map(|v| v.to_bits()).collect();
            bits.sort_unstable();
            bits.dedup();
            Some(bits.len() as f64)
        }
    }
}

impl Table for PivotTable {
    fn configure(&mut self, view: &ViewConfig) {
        if view.row_pivots.first() != Some(&Column::Timestamp) {
            warn!(
                "Unsupported row pivots {:?}; grouping by timestamp",
                view.row_pivots
            );
        }
        match view.attributes() {
            Ok(attributes) => {
                for (name, value) in attributes {
                    debug!("view attribute {}={}", name, value);
                }
            }
            Err(e) => warn!("Could not render view attributes: {}", e),
        }
        self.view = view.clone();
        info!("Chart configured: {} over {:?}", self.view.view, self.view.columns);
    }

    fn update(&mut self, rows: &[AnalyticsRecord]) -> Result<()> {
        for record in rows {
            self.push(record);
        }
        if let Some(row) = self.last_updated() {
            if row.is_alert() {
                warn!("ALERT {}", row.render());
            } else {
                info!("{}", row.render());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ratio_common::record::{LOWER_BOUND, UPPER_BOUND};

    fn record(ratio: f64, secs: i64) -> AnalyticsRecord {
        AnalyticsRecord {
            price_abc: ratio * 10.0,
            price_def: 10.0,
            ratio,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            upper_bound: UPPER_BOUND,
            lower_bound: LOWER_BOUND,
            trigger_alert: (ratio > UPPER_BOUND || ratio < LOWER_BOUND).then_some(ratio),
        }
    }

    fn table() -> PivotTable {
        let mut table = PivotEngine.table(&Schema::analytics()).unwrap();
        table.configure(&ViewConfig::ratio_chart());
        table
    }

    #[test]
    fn duplicate_timestamps_are_averaged() {
        let mut table = table();
        table.update(&[record(1.0, 1)]).unwrap();
        table.update(&[record(1.04, 1)]).unwrap();

        let row = table.latest().unwrap();
        assert_eq!(row.timestamp, Utc.timestamp_opt(1, 0).unwrap());
        assert_eq!(table.len(), 2);
        assert_eq!(table.group_count(), 1);
        assert_eq!(row.rows, 2);
        assert!((row.value(Column::Ratio).unwrap() - 1.02).abs() < 1e-12);
        assert_eq!(row.value(Column::UpperBound), Some(UPPER_BOUND));
        assert_eq!(row.value(Column::LowerBound), Some(LOWER_BOUND));
    }

    #[test]
    fn empty_alerts_are_ignored_by_avg() {
        let mut table = table();
        table.update(&[record(1.0, 1)]).unwrap();
        table.update(&[record(2.0, 1)]).unwrap();

        let row = table.latest().unwrap();
        assert_eq!(row.value(Column::TriggerAlert), Some(2.0));
        assert!(row.is_alert());
    }

    #[test]
    fn group_without_alerts_stays_empty() {
        let mut table = table();
        table.update(&[record(1.0, 1)]).unwrap();
        table.update(&[record(1.05, 1)]).unwrap();

        let row = table.latest().unwrap();
        assert_eq!(row.value(Column::TriggerAlert), None);
        assert!(!row.is_alert());
    }

    #[test]
    fn rows_follow_view_columns_in_time_order() {
        let mut table = table();
        table.update(&[record(1.0, 3)]).unwrap();
        table.update(&[record(1.2, 1)]).unwrap();
        table.update(&[record(0.5, 2)]).unwrap();

        let rows = table.rows();
        let stamps: Vec<i64> = rows.iter().map(|r| r.timestamp.timestamp()).collect();
        assert_eq!(stamps, vec![1, 2, 3]);

        let columns: Vec<Column> = rows[0].values.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            columns,
            vec![Column::Ratio, Column::LowerBound, Column::UpperBound, Column::TriggerAlert]
        );
        assert_eq!(table.latest().unwrap().timestamp.timestamp(), 3);
        assert_eq!(rows[1].value(Column::TriggerAlert), Some(0.5));
    }

    #[test]
    fn late_record_updates_its_own_group() {
        let mut table = table();
        table.update(&[record(1.0, 5)]).unwrap();
        table.update(&[record(1.5, 2)]).unwrap();

        let updated = table.last_updated().unwrap();
        assert_eq!(updated.timestamp.timestamp(), 2);
        assert!(updated.is_alert());
        assert!(updated.render().starts_with("00:00:02.000"));

        let latest = table.latest().unwrap();
        assert_eq!(latest.timestamp.timestamp(), 5);
        assert!(!latest.is_alert());
    }

    #[test]
    fn nothing_updated_on_empty_table() {
        let mut table = table();
        assert!(table.last_updated().is_none());
        table.update(&[]).unwrap();
        assert!(table.last_updated().is_none());
    }

    #[test]
    fn timestamp_distinct_count_is_one_per_group() {
        let mut table = table();
        let mut view = ViewConfig::ratio_chart();
        view.columns.push(Column::Timestamp);
        table.configure(&view);

        table.update(&[record(1.0, 7), record(1.0, 7), record(1.0, 7)]).unwrap();

        let row = table.latest().unwrap();
        assert_eq!(row.rows, 3);
        assert_eq!(row.value(Column::Timestamp), Some(1.0));
    }

    #[test]
    fn infinite_ratio_is_kept() {
        let mut table = table();
        table.update(&[record(f64::INFINITY, 1)]).unwrap();

        let row = table.latest().unwrap();
        assert_eq!(row.value(Column::Ratio), Some(f64::INFINITY));
        assert_eq!(row.value(Column::TriggerAlert), Some(f64::INFINITY));
    }

    #[test]
    fn engine_rejects_schema_without_date_pivot() {
        let fields = Schema::analytics()
            .fields()
            .iter()
            .copied()
            .filter(|f| f.column != Column::Timestamp)
            .collect();
        let err = PivotEngine.table(&Schema::new(fields));
        assert!(matches!(err, Err(RatioError::TableUnavailable(_))));
    }

    #[test]
    fn render_marks_empty_cells() {
        let mut table = table();
        table.update(&[record(1.0, 0)]).unwrap();
        let text = table.latest().unwrap().render();
        assert!(text.contains("ratio=1.0000"));
        assert!(text.contains("trigger_alert=-"));
    }
}
