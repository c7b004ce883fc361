//! Schema-free escape hatch: raw CRUD over any named collection.
//!
//! The typed operations stay authoritative for carts and loyalty; this
//! surface exists for reference data (countries, tender types, delivery
//! options) and ad-hoc experimentation.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::Dispatcher;
use crate::domain::parse_args;
use crate::error::{EngineError, EngineResult};
use crate::store::query::Query;

fn validate_collection(name: &str) -> EngineResult<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(EngineError::invalid_argument(format!(
            "collection names are snake_case identifiers, got '{name}'"
        )))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    collection: String,
    fields: Map<String, Value>,
}

pub fn create(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CreateInput = parse_args(args)?;
    validate_collection(&input.collection)?;
    let entity = cx.store().create(&input.collection, input.fields)?;
    Ok(json!({ "collection": input.collection, "entity": entity }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityRef {
    collection: String,
    id: String,
}

pub fn get(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: EntityRef = parse_args(args)?;
    let entity = cx.store().read(&input.collection, &input.id)?;
    Ok(json!({ "collection": input.collection, "entity": entity }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInput {
    collection: String,
    id: String,
    changes: Map<String, Value>,
}

pub fn update(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: UpdateInput = parse_args(args)?;
    let entity = cx
        .store()
        .update(&input.collection, &input.id, input.changes)?;
    Ok(json!({ "collection": input.collection, "entity": entity }))
}

pub fn delete(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: EntityRef = parse_args(args)?;
    cx.store().delete(&input.collection, &input.id)?;
    Ok(json!({ "collection": input.collection, "deletedId": input.id }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListInput {
    collection: String,
    #[serde(flatten)]
    query: Query,
}

pub fn list(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: ListInput = parse_args(args)?;
    let page = cx.store().query(&input.collection, &input.query);
    Ok(json!({
        "collection": input.collection,
        "entities": page.items,
        "totalCount": page.total,
    }))
}
