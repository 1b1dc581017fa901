use crate::aggregate::{
    bucket_by_threshold, count_at_least, group_count, group_sum, mean, top_n_series, FILL_THRESHOLDS,
    STORAGE_THRESHOLDS, TOP_DAMS,
};
use crate::models::{
    ComparisonPoint, DamDashboard, DamKpis, Dashboard, DashboardBody, DistrictDashboard, DistrictEntry,
    LabeledDashboard, Record, Series, SeriesPoint, SourceData, StaticDocument, TalukaEntry,
};
use crate::normalize::{
    fields, normalize_field, normalize_rows, FieldKind, DAM_SHEET, LABELED_VALUES, UNKNOWN_LABEL,
};
use chrono::Utc;

pub fn build_dashboard(data: SourceData) -> Dashboard {
    build_dashboard_at(Utc::now().to_rfc3339(), data)
}

pub fn build_dashboard_at(generated_at: String, data: SourceData) -> Dashboard {
    let (records, body) = match data {
        SourceData::Sheet(rows) => {
            let records = normalize_rows(&rows, DAM_SHEET);
            let body = DashboardBody::Dams(dam_dashboard(&records));
            (records, body)
        }
        SourceData::Labeled(rows) => {
            let records = normalize_rows(&rows, LABELED_VALUES);
            let body = DashboardBody::Labeled(LabeledDashboard {
                values: labeled_series(&records),
            });
            (records, body)
        }
        SourceData::Static(doc) => {
            let (districts, talukas) = static_records(&doc);
            let body = DashboardBody::Districts(district_dashboard(&districts, &talukas));
            let mut records = districts;
            records.extend(talukas);
            (records, body)
        }
    };

    Dashboard {
        generated_at,
        record_count: records.len(),
        defaulted_fields: records.iter().map(|r| r.defaulted.len()).sum(),
        body,
    }
}

pub fn dam_dashboard(records: &[Record]) -> DamDashboard {
    DamDashboard {
        kpis: DamKpis {
            total_dams: records.len(),
            avg_percentage: mean(records, fields::PERCENTAGE),
            dams_above_90: count_at_least(records, fields::PERCENTAGE, 90.0),
        },
        storage_by_district: group_sum(records, Some(fields::DISTRICT), fields::TOTAL_STORAGE),
        storage_by_type: group_sum(records, Some(fields::PROJECT_TYPE), fields::TOTAL_STORAGE),
        top_dams: top_n_series(records, fields::DAM_NAME, fields::TOTAL_STORAGE, TOP_DAMS),
        dams_by_taluka: group_count(records, Some(fields::TALUKA)),
        percentage_buckets: bucket_by_threshold(records, fields::PERCENTAGE, fields::DAM_NAME, STORAGE_THRESHOLDS),
    }
}

/// Label/value rows are plotted as-is, one point per row.
fn labeled_series(records: &[Record]) -> Series {
    Series {
        points: records
            .iter()
            .map(|record| SeriesPoint {
                label: record.text(fields::LABEL).unwrap_or_default().to_string(),
                value: record.number(fields::VALUE),
            })
            .collect(),
    }
}

fn district_record(entry: &DistrictEntry) -> Record {
    let mut record = Record::new();
    normalize_field(&mut record, fields::NAME, FieldKind::Text, entry.name.as_ref());
    normalize_field(&mut record, fields::STORAGE, FieldKind::Number, entry.storage.as_ref());
    normalize_field(&mut record, fields::LAST_YEAR, FieldKind::Number, entry.last_year.as_ref());
    record
}

fn taluka_record(entry: &TalukaEntry) -> Record {
    let mut record = Record::new();
    normalize_field(&mut record, fields::NAME, FieldKind::Text, entry.name.as_ref());
    normalize_field(&mut record, fields::PERCENT, FieldKind::Number, entry.percent.as_ref());
    normalize_field(&mut record, fields::CAPACITY, FieldKind::Number, entry.capacity.as_ref());
    normalize_field(&mut record, fields::STORAGE, FieldKind::Number, entry.storage.as_ref());
    record
}

pub fn static_records(doc: &StaticDocument) -> (Vec<Record>, Vec<Record>) {
    (
        doc.districts.iter().map(district_record).collect(),
        doc.talukas.iter().map(taluka_record).collect(),
    )
}

fn per_entry(records: &[Record], value: &str) -> Series {
    Series {
        points: records
            .iter()
            .map(|record| SeriesPoint {
                label: record.text(fields::NAME).unwrap_or(UNKNOWN_LABEL).to_string(),
                value: record.number(value),
            })
            .collect(),
    }
}

fn comparison(records: &[Record], current: &str, previous: &str) -> Vec<ComparisonPoint> {
    records
        .iter()
        .map(|record| ComparisonPoint {
            label: record.text(fields::NAME).unwrap_or(UNKNOWN_LABEL).to_string(),
            current: record.number(current),
            previous: record.number(previous),
        })
        .collect()
}

pub fn district_dashboard(districts: &[Record], talukas: &[Record]) -> DistrictDashboard {
    DistrictDashboard {
        district_storage: per_entry(districts, fields::STORAGE),
        taluka_percent: per_entry(talukas, fields::PERCENT),
        district_compare: comparison(districts, fields::STORAGE, fields::LAST_YEAR),
        taluka_capacity: comparison(talukas, fields::CAPACITY, fields::STORAGE),
        taluka_distribution: bucket_by_threshold(talukas, fields::PERCENT, fields::NAME, FILL_THRESHOLDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, DefaultReason, RawRow};

    fn num(n: f64) -> Option<CellValue> {
        Some(CellValue::Number(n))
    }

    fn text(s: &str) -> Option<CellValue> {
        Some(CellValue::Text(s.to_string()))
    }

    fn dam_row(district: Option<&str>, name: &str, kind: Option<&str>, storage: Option<f64>, pct: Option<f64>) -> RawRow {
        let text = |s: Option<&str>| s.map(|s| CellValue::Text(s.to_string()));
        RawRow::new(vec![
            Some(CellValue::Number(1.0)),
            text(district),
            text(Some("Walwa")),
            Some(CellValue::Text(name.to_string())),
            text(kind),
            storage.map(CellValue::Number),
            pct.map(CellValue::Number),
        ])
    }

    #[test]
    fn sheet_rows_become_dam_dashboard() {
        let rows = vec![
            dam_row(Some("Sangli"), "Warna", Some("Major"), Some(900.0), Some(95.0)),
            dam_row(Some("Sangli"), "Chandoli", Some("Medium"), Some(300.0), Some(60.0)),
            dam_row(None, "Ghatprabha", None, None, Some(10.0)),
        ];
        let dashboard = build_dashboard_at("2026-01-01T00:00:00+00:00".to_string(), SourceData::Sheet(rows));

        assert_eq!(dashboard.record_count, 3);
        assert!(dashboard.defaulted_fields >= 3);
        let DashboardBody::Dams(dams) = dashboard.body else {
            panic!("expected dam dashboard");
        };
        assert_eq!(dams.kpis.total_dams, 3);
        assert_eq!(dams.kpis.dams_above_90, 1);
        assert!((dams.kpis.avg_percentage - 55.0).abs() < 1e-9);
        assert_eq!(dams.storage_by_district.get("Sangli"), Some(1200.0));
        assert_eq!(dams.storage_by_district.get(UNKNOWN_LABEL), Some(0.0));
        assert_eq!(dams.storage_by_type.get(UNKNOWN_LABEL), Some(0.0));
        assert_eq!(dams.dams_by_taluka.get("Walwa"), Some(3.0));
        assert_eq!(dams.top_dams.points[0].label, "Warna");
        assert_eq!(dams.top_dams.len(), 3);
        let counts: Vec<usize> = dams.percentage_buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn empty_sheet_has_zero_kpis() {
        let dashboard = build_dashboard_at(String::new(), SourceData::Sheet(Vec::new()));
        let DashboardBody::Dams(dams) = dashboard.body else {
            panic!("expected dam dashboard");
        };
        assert_eq!(dams.kpis.avg_percentage, 0.0);
        assert!(dams.top_dams.is_empty());
        assert_eq!(dams.percentage_buckets.len(), 5);
    }

    #[test]
    fn static_document_becomes_district_dashboard() {
        let doc = StaticDocument {
            districts: vec![
                DistrictEntry {
                    name: text("Sangli"),
                    storage: num(120.0),
                    last_year: num(100.0),
                },
                DistrictEntry::default(),
            ],
            talukas: vec![
                TalukaEntry {
                    name: text("Miraj"),
                    percent: num(80.0),
                    capacity: num(50.0),
                    storage: num(40.0),
                },
                TalukaEntry {
                    name: text("Jath"),
                    percent: num(20.0),
                    capacity: None,
                    storage: num(2.0),
                },
            ],
        };
        let dashboard = build_dashboard_at(String::new(), SourceData::Static(doc));
        assert_eq!(dashboard.record_count, 4);
        let DashboardBody::Districts(view) = dashboard.body else {
            panic!("expected district dashboard");
        };
        assert_eq!(view.district_storage.get("Sangli"), Some(120.0));
        assert_eq!(view.district_storage.get(UNKNOWN_LABEL), Some(0.0));
        assert_eq!(view.district_compare[0].previous, 100.0);
        assert_eq!(view.taluka_capacity[1].current, 0.0);
        assert_eq!(view.taluka_distribution[0].members, vec!["Miraj".to_string()]);
        assert_eq!(view.taluka_distribution[3].members, vec!["Jath".to_string()]);
    }

    #[test]
    fn static_entries_coerce_loose_json_types() {
        let doc = crate::fetch::parse_static(
            br#"{"districts":[{"name":"Sangli","storage":"1,212.5","last_year":"n/a"},{"name":101,"storage":7}]}"#,
        )
        .expect("loosely typed entries still parse");
        let (districts, _) = static_records(&doc);

        assert_eq!(districts[0].number(fields::STORAGE), 1212.5);
        assert_eq!(districts[0].number(fields::LAST_YEAR), 0.0);
        let last_year = districts[0]
            .defaulted
            .iter()
            .find(|d| d.field == fields::LAST_YEAR)
            .expect("last_year defaulted");
        assert_eq!(last_year.reason, DefaultReason::Unparseable);
        assert_eq!(districts[1].text(fields::NAME), Some("101"));
        assert_eq!(districts[1].number(fields::STORAGE), 7.0);
        assert!(districts[1].is_defaulted(fields::LAST_YEAR));
    }

    #[test]
    fn labeled_rows_keep_row_order() {
        let rows = vec![
            RawRow::from(vec!["Warna".to_string(), "12".to_string()]),
            RawRow::from(vec!["Koyna".to_string(), "oops".to_string()]),
        ];
        let dashboard = build_dashboard_at(String::new(), SourceData::Labeled(rows));
        assert_eq!(dashboard.defaulted_fields, 1);
        let DashboardBody::Labeled(view) = dashboard.body else {
            panic!("expected labeled dashboard");
        };
        assert_eq!(view.values.points[0].value, 12.0);
        assert_eq!(view.values.get("Koyna"), Some(0.0));
    }

    #[test]
    fn dashboard_serializes_with_kind_tag() {
        let dashboard = build_dashboard_at("now".to_string(), SourceData::Labeled(Vec::new()));
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["kind"], "labeled");
        assert_eq!(json["generated_at"], "now");
        assert!(json["values"]["points"].is_array());
    }
}
