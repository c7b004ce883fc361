//! Read-only derived views over one collection's snapshot.
//!
//! Stages always run in the same order: filter/search, then sort, then
//! skip, then top. The pre-pagination match count is reported so callers
//! can fetch further pages.

use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::Record;

/// Page size applied when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    /// Field name to expected value (equality) or a constraint object with
    /// `min` / `max` / `contains` keys. Empty filter matches everything.
    pub filter: Map<String, Value>,
    /// Case-insensitive substring over the stringified search fields.
    pub search: Option<String>,
    /// Fields consulted by `search`; all string-typed fields when absent.
    pub search_fields: Option<Vec<String>>,
    pub order_by: Option<String>,
    pub descending: bool,
    pub skip: Option<i64>,
    pub top: Option<i64>,
}

#[derive(Debug)]
pub struct Page {
    pub items: Vec<Record>,
    /// Match count before pagination.
    pub total: usize,
}

pub fn run(records: Vec<Record>, q: &Query) -> Page {
    let mut matches: Vec<Record> = records
        .into_iter()
        .filter(|r| matches_filter(r, &q.filter))
        .filter(|r| match &q.search {
            Some(needle) => matches_search(r, needle, q.search_fields.as_deref()),
            None => true,
        })
        .collect();

    if let Some(field) = &q.order_by {
        // sort_by is stable, so ties keep insertion order.
        matches.sort_by(|a, b| {
            let ord = value_cmp(a.get(field.as_str()), b.get(field.as_str()));
            if q.descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    let total = matches.len();
    let skip = q.skip.unwrap_or(0).max(0) as usize;
    let top = q.top.unwrap_or(DEFAULT_PAGE_SIZE as i64).max(0) as usize;
    let items = matches.into_iter().skip(skip).take(top).collect();
    Page { items, total }
}

fn matches_filter(record: &Record, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(field, expected)| matches_constraint(record.get(field.as_str()), expected))
}

fn matches_constraint(actual: Option<&Value>, expected: &Value) -> bool {
    if let Value::Object(constraint) = expected {
        let recognized = constraint
            .keys()
            .any(|k| matches!(k.as_str(), "min" | "max" | "contains"));
        if recognized {
            if let Some(min) = constraint.get("min") {
                if value_cmp(actual, Some(min)) == Ordering::Less {
                    return false;
                }
            }
            if let Some(max) = constraint.get("max") {
                if value_cmp(actual, Some(max)) == Ordering::Greater {
                    return false;
                }
            }
            if let Some(needle) = constraint.get("contains") {
                let haystack = match actual {
                    Some(v) => stringify(v).to_lowercase(),
                    None => return false,
                };
                if !haystack.contains(&stringify(needle).to_lowercase()) {
                    return false;
                }
            }
            return true;
        }
    }
    actual == Some(expected)
}

fn matches_search(record: &Record, needle: &str, fields: Option<&[String]>) -> bool {
    let needle = needle.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    match fields {
        Some(fields) => fields.iter().any(|f| {
            record
                .get(f.as_str())
                .is_some_and(|v| stringify(v).to_lowercase().contains(&needle))
        }),
        None => record
            .values()
            .filter_map(Value::as_str)
            .any(|s| s.to_lowercase().contains(&needle)),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Total order over optional JSON values. A missing field sorts lowest;
/// mixed types fall back to a fixed type ranking.
pub fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .unwrap_or(0.0)
                .total_cmp(&y.as_f64().unwrap_or(0.0)),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        match fields {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn people() -> Vec<Record> {
        vec![
            record(json!({ "id": "1", "name": "John", "email": "john@example.com", "age": 40 })),
            record(json!({ "id": "2", "name": "Jane", "email": "jane@example.com", "age": 35 })),
            record(json!({ "id": "3", "name": "Johnny", "email": "j2@example.com", "age": 35 })),
        ]
    }

    #[test]
    fn empty_filter_matches_everything() {
        let page = run(people(), &Query::default());
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn filter_on_unknown_field_matches_nothing() {
        let q = Query {
            filter: record(json!({ "shoeSize": 42 })),
            ..Query::default()
        };
        let page = run(people(), &q);
        assert_eq!(page.total, 0);
    }

    #[test]
    fn range_constraints_apply() {
        let q = Query {
            filter: record(json!({ "age": { "min": 36 } })),
            ..Query::default()
        };
        let page = run(people(), &q);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0]["name"], "John");
    }

    #[test]
    fn search_is_case_insensitive_substring_over_named_fields() {
        let q = Query {
            search: Some("JOHN".to_string()),
            search_fields: Some(vec!["email".to_string()]),
            ..Query::default()
        };
        let page = run(people(), &q);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0]["email"], "john@example.com");
    }

    #[test]
    fn search_without_field_list_uses_string_fields() {
        let q = Query {
            search: Some("johnny".to_string()),
            ..Query::default()
        };
        let page = run(people(), &q);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0]["id"], "3");
    }

    #[test]
    fn sort_is_stable_and_missing_keys_sort_lowest() {
        let mut records = people();
        records.push(record(json!({ "id": "4", "name": "Ageless" })));
        let q = Query {
            order_by: Some("age".to_string()),
            ..Query::default()
        };
        let page = run(records, &q);
        let ids: Vec<_> = page.items.iter().map(|r| r["id"].clone()).collect();
        // Missing age first, then the two 35s in insertion order, then 40.
        assert_eq!(ids, [json!("4"), json!("2"), json!("3"), json!("1")]);
    }

    #[test]
    fn negative_skip_and_top_are_clamped() {
        let q = Query {
            skip: Some(-5),
            top: Some(-1),
            ..Query::default()
        };
        let page = run(people(), &q);
        assert_eq!(page.total, 3);
        assert!(page.items.is_empty());
    }

    #[test]
    fn concatenated_pages_reproduce_the_full_sorted_sequence() {
        let records: Vec<Record> = (0..10)
            .map(|i| record(json!({ "id": i.to_string(), "rank": 9 - i })))
            .collect();

        let full = run(
            records.clone(),
            &Query {
                order_by: Some("rank".to_string()),
                ..Query::default()
            },
        );

        let mut paged = Vec::new();
        let top = 3;
        let mut skip = 0;
        loop {
            let page = run(
                records.clone(),
                &Query {
                    order_by: Some("rank".to_string()),
                    skip: Some(skip),
                    top: Some(top),
                    ..Query::default()
                },
            );
            if page.items.is_empty() {
                break;
            }
            paged.extend(page.items);
            skip += top;
        }
        assert_eq!(paged, full.items);
    }
}
