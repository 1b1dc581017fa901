use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// One source row, cells positioned by column index. `None` is an absent or null cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub cells: Vec<Option<CellValue>>,
}

impl RawRow {
    pub fn new(cells: Vec<Option<CellValue>>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column).and_then(Option::as_ref)
    }
}

impl From<Vec<String>> for RawRow {
    fn from(values: Vec<String>) -> Self {
        Self {
            cells: values.into_iter().map(|v| Some(CellValue::Text(v))).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultReason {
    Missing,
    Unparseable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultedField {
    pub field: String,
    pub reason: DefaultReason,
}

/// A normalized entity (dam, district, taluka). Numeric fields are always finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub fields: BTreeMap<String, Scalar>,
    pub defaulted: Vec<DefaultedField>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, field: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(field.to_string(), Scalar::Text(value.into()));
        self
    }

    pub fn with_number(mut self, field: &str, value: f64) -> Self {
        let value = if value.is_finite() { value } else { 0.0 };
        self.fields.insert(field.to_string(), Scalar::Number(value));
        self
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Scalar::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> f64 {
        match self.fields.get(field) {
            Some(Scalar::Number(n)) => *n,
            _ => 0.0,
        }
    }

    pub fn is_defaulted(&self, field: &str) -> bool {
        self.defaulted.iter().any(|d| d.field == field)
    }
}

// Boundary schemas for the external response shapes.

#[derive(Debug, Deserialize)]
pub struct GvizResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<GvizMessage>,
    pub table: Option<GvizTable>,
}

#[derive(Debug, Deserialize)]
pub struct GvizMessage {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detailed_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GvizTable {
    #[serde(default)]
    pub rows: Vec<GvizRow>,
}

#[derive(Debug, Deserialize)]
pub struct GvizRow {
    #[serde(default)]
    pub c: Vec<Option<GvizCell>>,
}

#[derive(Debug, Deserialize)]
pub struct GvizCell {
    #[serde(default)]
    pub v: Option<CellValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesBatchResponse {
    #[serde(default)]
    pub value_ranges: Vec<ValueRange>,
    #[serde(default)]
    pub error: Option<ValuesApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Deserialize)]
pub struct ValuesApiError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticDocument {
    #[serde(default)]
    pub districts: Vec<DistrictEntry>,
    #[serde(default)]
    pub talukas: Vec<TalukaEntry>,
}

/// Entries are loosely typed: a quoted number or a numeric name is coerced, not rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistrictEntry {
    #[serde(default)]
    pub name: Option<CellValue>,
    #[serde(default)]
    pub storage: Option<CellValue>,
    #[serde(default)]
    pub last_year: Option<CellValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TalukaEntry {
    #[serde(default)]
    pub name: Option<CellValue>,
    #[serde(default)]
    pub percent: Option<CellValue>,
    #[serde(default)]
    pub capacity: Option<CellValue>,
    #[serde(default)]
    pub storage: Option<CellValue>,
}

#[derive(Debug, Clone)]
pub enum SourceData {
    Sheet(Vec<RawRow>),
    Labeled(Vec<RawRow>),
    Static(StaticDocument),
}

// Chart-ready output.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Category label to aggregated value, in first-appearance order of the labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.points.iter().find(|p| p.label == label).map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub members: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub label: String,
    pub current: f64,
    pub previous: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamKpis {
    pub total_dams: usize,
    pub avg_percentage: f64,
    pub dams_above_90: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamDashboard {
    pub kpis: DamKpis,
    pub storage_by_district: Series,
    pub storage_by_type: Series,
    pub top_dams: Series,
    pub dams_by_taluka: Series,
    pub percentage_buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictDashboard {
    pub district_storage: Series,
    pub taluka_percent: Series,
    pub district_compare: Vec<ComparisonPoint>,
    pub taluka_capacity: Vec<ComparisonPoint>,
    pub taluka_distribution: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledDashboard {
    pub values: Series,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardBody {
    Dams(DamDashboard),
    Districts(DistrictDashboard),
    Labeled(LabeledDashboard),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub generated_at: String,
    pub record_count: usize,
    pub defaulted_fields: usize,
    #[serde(flatten)]
    pub body: DashboardBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStatus {
    pub phase: RefreshPhase,
    pub source: String,
    pub cycles: u64,
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
    pub last_success_at: Option<String>,
    pub last_failure_at: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    Updated,
    Failed,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub outcome: RefreshOutcome,
    pub error: Option<String>,
}
