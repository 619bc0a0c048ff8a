use std::cmp::Ordering;

use recordstore_storage::{
    CREATED_AT_FIELD, Document, Filter, FindOptions, ID_FIELD, SortParam, UPDATED_AT_FIELD,
};
use serde_json::Value;

/// Check if a document satisfies every condition of the filter
pub fn matches(filter: &Filter, doc: &Document) -> bool {
    if let Some(id) = &filter.id
        && &doc.id != id
    {
        return false;
    }

    if let Some(window) = &filter.created_at
        && !window.contains(doc.created_at)
    {
        return false;
    }

    true
}

/// Orders two documents by the given sort keys. Equal keys compare equal;
/// callers break ties themselves.
pub fn compare_documents(a: &Document, b: &Document, sort: &[SortParam]) -> Ordering {
    for param in sort {
        let comparison = match param.field.as_str() {
            CREATED_AT_FIELD => a.created_at.cmp(&b.created_at),
            UPDATED_AT_FIELD => a.updated_at.cmp(&b.updated_at),
            ID_FIELD => a.id.cmp(&b.id),
            field => compare_values(a.get(field), b.get(field)),
        };

        let comparison = if param.descending {
            comparison.reverse()
        } else {
            comparison
        };

        if comparison != Ordering::Equal {
            return comparison;
        }
    }
    Ordering::Equal
}

/// Sorts `(insertion sequence, document)` pairs and applies skip/limit.
///
/// Documents equal under every sort key keep insertion order, reversed when
/// the last sort key is descending so that "newest first" also holds for
/// documents stamped with the same instant.
pub fn sort_and_paginate(mut rows: Vec<(u64, Document)>, options: &FindOptions) -> Vec<Document> {
    let tie_descending = options.sort.last().is_some_and(|param| param.descending);

    rows.sort_by(|(seq_a, a), (seq_b, b)| {
        compare_documents(a, b, &options.sort).then_with(|| {
            if tie_descending {
                seq_b.cmp(seq_a)
            } else {
                seq_a.cmp(seq_b)
            }
        })
    });

    let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
    let limit = options
        .limit
        .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

    rows.into_iter()
        .skip(skip)
        .take(limit)
        .map(|(_, doc)| doc)
        .collect()
}

// Type order: missing/null < numbers < strings < objects < arrays < booleans
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    let x = x.as_f64().unwrap_or(f64::NAN);
                    let y = y.as_f64().unwrap_or(f64::NAN);
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
