use crate::models::{CellValue, DefaultReason, DefaultedField, RawRow, Record, Scalar};

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    /// Keeps only the leading integer of the cell, like `parseInt`.
    Integer,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: usize,
    pub kind: FieldKind,
}

const fn field(name: &'static str, column: usize, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, column, kind }
}

pub mod fields {
    pub const SERIAL: &str = "serial";
    pub const DISTRICT: &str = "district";
    pub const TALUKA: &str = "taluka";
    pub const DAM_NAME: &str = "dam_name";
    pub const PROJECT_TYPE: &str = "project_type";
    pub const TOTAL_STORAGE: &str = "total_storage";
    pub const PERCENTAGE: &str = "percentage";
    pub const LABEL: &str = "label";
    pub const VALUE: &str = "value";
    pub const NAME: &str = "name";
    pub const STORAGE: &str = "storage";
    pub const LAST_YEAR: &str = "last_year";
    pub const PERCENT: &str = "percent";
    pub const CAPACITY: &str = "capacity";
}

/// Column layout of the dam storage sheet.
pub const DAM_SHEET: &[FieldSpec] = &[
    field(fields::SERIAL, 0, FieldKind::Text),
    field(fields::DISTRICT, 1, FieldKind::Text),
    field(fields::TALUKA, 2, FieldKind::Text),
    field(fields::DAM_NAME, 3, FieldKind::Text),
    field(fields::PROJECT_TYPE, 4, FieldKind::Text),
    field(fields::TOTAL_STORAGE, 5, FieldKind::Number),
    field(fields::PERCENTAGE, 6, FieldKind::Number),
];

/// Label in the first column, value in the second.
pub const LABELED_VALUES: &[FieldSpec] = &[
    field(fields::LABEL, 0, FieldKind::Text),
    field(fields::VALUE, 1, FieldKind::Integer),
];

/// Result of coercing one cell to a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedNumber {
    Parsed(f64),
    Defaulted(DefaultReason),
}

impl ParsedNumber {
    pub fn value(self) -> f64 {
        match self {
            ParsedNumber::Parsed(n) => n,
            ParsedNumber::Defaulted(_) => 0.0,
        }
    }
}

pub fn normalize_row(row: &RawRow, columns: &[FieldSpec]) -> Record {
    let mut record = Record::new();
    for field in columns {
        normalize_field(&mut record, field.name, field.kind, row.cell(field.column));
    }
    record
}

/// Coerces one cell into `record`, noting the field when it had to be defaulted.
pub fn normalize_field(record: &mut Record, name: &str, kind: FieldKind, cell: Option<&CellValue>) {
    let (value, defaulted) = match kind {
        FieldKind::Text => {
            let text = cell.map(cell_text).unwrap_or_default();
            let missing = text.is_empty().then_some(DefaultReason::Missing);
            (Scalar::Text(text), missing)
        }
        FieldKind::Number | FieldKind::Integer => {
            let parsed = match cell {
                Some(cell) => parse_number(cell, kind == FieldKind::Integer),
                None => ParsedNumber::Defaulted(DefaultReason::Missing),
            };
            let reason = match parsed {
                ParsedNumber::Defaulted(reason) => Some(reason),
                ParsedNumber::Parsed(_) => None,
            };
            (Scalar::Number(parsed.value()), reason)
        }
    };
    if let Some(reason) = defaulted {
        record.defaulted.push(DefaultedField {
            field: name.to_string(),
            reason,
        });
    }
    record.fields.insert(name.to_string(), value);
}

pub fn normalize_rows(rows: &[RawRow], columns: &[FieldSpec]) -> Vec<Record> {
    rows.iter().map(|row| normalize_row(row, columns)).collect()
}

pub fn parse_number(cell: &CellValue, integer: bool) -> ParsedNumber {
    let parsed = match cell {
        CellValue::Number(n) => Some(if integer { n.trunc() } else { *n }),
        CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        CellValue::Text(s) => {
            let cleaned = clean_numeric(s);
            if cleaned.is_empty() {
                return ParsedNumber::Defaulted(DefaultReason::Missing);
            }
            if integer {
                leading_integer(&cleaned)
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
    };
    match parsed {
        Some(n) if n.is_finite() => ParsedNumber::Parsed(n),
        _ => ParsedNumber::Defaulted(DefaultReason::Unparseable),
    }
}

pub fn cell_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(s) => clean_display(s),
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        CellValue::Number(n) => n.to_string(),
        CellValue::Bool(b) => b.to_string(),
    }
}

fn clean_display(s: &str) -> String {
    s.replace('\u{200B}', "").trim().to_string()
}

fn clean_numeric(s: &str) -> String {
    clean_display(s).replace(',', "")
}

fn leading_integer(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<f64>().ok()
}
