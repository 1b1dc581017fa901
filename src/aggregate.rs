use crate::models::{Bucket, Record, Series, SeriesPoint};
use crate::normalize::UNKNOWN_LABEL;
use std::collections::HashMap;

pub const ALL_LABEL: &str = "All";

/// Descending lower bounds of the dam storage buckets, in percent.
pub const STORAGE_THRESHOLDS: &[f64] = &[90.0, 75.0, 50.0, 25.0];
/// Descending lower bounds of the "% filled" distribution for talukas.
pub const FILL_THRESHOLDS: &[f64] = &[75.0, 50.0, 25.0];

pub const TOP_DAMS: usize = 10;

fn category_of<'a>(record: &'a Record, category: Option<&str>) -> &'a str {
    match category {
        Some(field) => record.text(field).unwrap_or(UNKNOWN_LABEL),
        None => ALL_LABEL,
    }
}

fn reduce<F>(records: &[Record], category: Option<&str>, mut value: F) -> Series
where
    F: FnMut(&Record) -> f64,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut points: Vec<SeriesPoint> = Vec::new();
    for record in records {
        let label = category_of(record, category);
        let slot = *index.entry(label).or_insert_with(|| {
            points.push(SeriesPoint {
                label: label.to_string(),
                value: 0.0,
            });
            points.len() - 1
        });
        points[slot].value += value(record);
    }
    Series { points }
}

/// Sums `value` per category. Labels keep the order they first appear in.
pub fn group_sum(records: &[Record], category: Option<&str>, value: &str) -> Series {
    reduce(records, category, |record| record.number(value))
}

pub fn group_count(records: &[Record], category: Option<&str>) -> Series {
    reduce(records, category, |_| 1.0)
}

/// The `n` records with the largest `value`, ties in input order.
pub fn top_n<'a>(records: &'a [Record], value: &str, n: usize) -> Vec<&'a Record> {
    let mut ranked: Vec<&Record> = records.iter().collect();
    // stable: ties keep input order
    ranked.sort_by(|a, b| b.number(value).total_cmp(&a.number(value)));
    ranked.truncate(n);
    ranked
}

pub fn top_n_series(records: &[Record], label: &str, value: &str, n: usize) -> Series {
    let points = top_n(records, value, n)
        .into_iter()
        .map(|record| SeriesPoint {
            label: record.text(label).unwrap_or(UNKNOWN_LABEL).to_string(),
            value: record.number(value),
        })
        .collect();
    Series { points }
}

/// `[90, 75]` yields `>=90%`, `75-90%` and `<75%`.
pub fn bucket_layout(thresholds: &[f64]) -> Vec<Bucket> {
    let mut buckets = Vec::with_capacity(thresholds.len() + 1);
    let mut upper: Option<f64> = None;
    for &lower in thresholds {
        let label = match upper {
            None => format!(">={}%", lower),
            Some(upper) => format!("{}-{}%", lower, upper),
        };
        buckets.push(Bucket {
            label,
            lower: Some(lower),
            upper,
            members: Vec::new(),
            count: 0,
        });
        upper = Some(lower);
    }
    buckets.push(Bucket {
        label: match upper {
            Some(upper) => format!("<{}%", upper),
            None => "all".to_string(),
        },
        lower: None,
        upper,
        members: Vec::new(),
        count: 0,
    });
    buckets
}

fn bucket_index(buckets: &[Bucket], value: f64) -> usize {
    buckets
        .iter()
        .position(|bucket| bucket.lower.is_none_or(|lower| value >= lower))
        .unwrap_or(buckets.len() - 1)
}

/// Partitions records into percentage ranges, listing members by `label`.
pub fn bucket_by_threshold(records: &[Record], field: &str, label: &str, thresholds: &[f64]) -> Vec<Bucket> {
    let mut buckets = bucket_layout(thresholds);
    for record in records {
        let slot = bucket_index(&buckets, record.number(field));
        let bucket = &mut buckets[slot];
        bucket
            .members
            .push(record.text(label).unwrap_or(UNKNOWN_LABEL).to_string());
        bucket.count += 1;
    }
    buckets
}

/// Arithmetic mean of a field; zero for an empty collection.
pub fn mean(records: &[Record], field: &str) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records.iter().map(|r| r.number(field)).sum();
    sum / records.len() as f64
}

pub fn count_at_least(records: &[Record], field: &str, threshold: f64) -> usize {
    records
        .iter()
        .filter(|r| r.number(field) >= threshold)
        .count()
}
