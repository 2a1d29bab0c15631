//! Sink schema and view configuration.
//!
//! The sink is told once, at mount time, which columns a record carries and how
//! the chart should present them. Column names are the wire names used by the
//! sink (`price_abc`, `trigger_alert`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::RatioError;

/// Columns of an analytics record, in schema order.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    PriceAbc,
    PriceDef,
    Ratio,
    Timestamp,
    UpperBound,
    LowerBound,
    TriggerAlert,
}

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    /// 64-bit float.
    Float,
    /// UTC date/time.
    Date,
}

/// One field of the sink schema.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Field {
    /// Column name.
    pub column: Column,
    /// Value type.
    pub kind: FieldType,
    /// Whether a row may leave the field empty.
    pub nullable: bool,
}

/// Ordered list of fields the sink table is created with.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Schema with the given fields, in order.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Schema of `AnalyticsRecord`: seven fields, only `trigger_alert` nullable.
    pub fn analytics() -> Self {
        use strum::IntoEnumIterator;

        let fields = Column::iter()
            .map(|column| Field {
                column,
                kind: match column {
                    Column::Timestamp => FieldType::Date,
                    _ => FieldType::Float,
                },
                nullable: column == Column::TriggerAlert,
            })
            .collect();
        Self::new(fields)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by column.
    pub fn field(&self, column: Column) -> Option<&Field> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Column name to type name, the form a table factory consumes.
    pub fn to_type_map(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.column.to_string(), f.kind.to_string()))
            .collect()
    }
}

/// How duplicate rows inside one pivot group are folded together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, Eq, PartialEq)]
pub enum Aggregate {
    /// Arithmetic mean of the non-null values.
    #[serde(rename = "avg")]
    #[strum(serialize = "avg")]
    Avg,
    /// Number of distinct values.
    #[serde(rename = "distinct count")]
    #[strum(serialize = "distinct count")]
    DistinctCount,
}

/// Presentation hints set on the sink once at mount time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Chart plugin name.
    pub view: String,
    /// Columns rows are grouped by (the x-axis).
    pub row_pivots: Vec<Column>,
    /// Columns plotted on the y-axis.
    pub columns: Vec<Column>,
    /// Per-column aggregation for duplicate groups.
    pub aggregates: BTreeMap<Column, Aggregate>,
}

impl ViewConfig {
    /// Line chart of the ratio against its bounds, one point per timestamp.
    pub fn ratio_chart() -> Self {
        use strum::IntoEnumIterator;

        let aggregates = Column::iter()
            .map(|column| match column {
                Column::Timestamp => (column, Aggregate::DistinctCount),
                _ => (column, Aggregate::Avg),
            })
            .collect();

        Self {
            view: String::from("y_line"),
            row_pivots: vec![Column::Timestamp],
            columns: vec![
                Column::Ratio,
                Column::LowerBound,
                Column::UpperBound,
                Column::TriggerAlert,
            ],
            aggregates,
        }
    }

    /// Aggregate configured for `column`, averaging when none is set.
    pub fn aggregate(&self, column: Column) -> Aggregate {
        self.aggregates.get(&column).copied().unwrap_or(Aggregate::Avg)
    }

    /// Renders the view as element attributes with JSON-encoded values.
    pub fn attributes(&self) -> Result<Vec<(String, String)>, RatioError> {
        Ok(vec![
            (String::from("view"), self.view.clone()),
            (String::from("row-pivots"), serde_json::to_string(&self.row_pivots)?),
            (String::from("columns"), serde_json::to_string(&self.columns)?),
            (String::from("aggregates"), serde_json::to_string(&self.aggregates)?),
        ])
    }
}
