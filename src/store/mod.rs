//! Collection-oriented in-memory entity store.
//!
//! Collections are named sets of JSON records kept in insertion order.
//! DashMap gives one shard-locked entry per collection, so mutations on a
//! collection are serialized while reads of other collections proceed
//! concurrently.

pub mod query;
pub mod seed;

use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::error::{EngineError, EngineResult};
use query::{Page, Query};

/// One entity instance: an ordered field-to-value mapping.
pub type Record = Map<String, Value>;

/// Returns the `id` field of a record, if present and a string.
pub fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

struct Collection {
    records: Vec<Record>,
    /// Monotonic per-collection counter. Never reset, so deleted ids are
    /// not reissued.
    next_seq: u64,
}

impl Collection {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            next_seq: 0,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| record_id(r) == Some(id))
    }
}

#[derive(Default)]
pub struct EntityStore {
    collections: DashMap<String, Collection>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
        }
    }

    /// Inserts a record, allocating an identifier when the caller did not
    /// supply one. Fails with `DuplicateKey` for a supplied id that already
    /// exists.
    pub fn create(&self, collection: &str, mut fields: Record) -> EngineResult<Record> {
        let mut entry = self
            .collections
            .entry(collection.to_string())
            .or_insert_with(Collection::new);
        let coll = entry.value_mut();

        match fields.get("id") {
            Some(Value::String(id)) => {
                if coll.position(id).is_some() {
                    return Err(EngineError::DuplicateKey {
                        collection: collection.to_string(),
                        id: id.clone(),
                    });
                }
            }
            Some(other) => {
                return Err(EngineError::invalid_argument(format!(
                    "id must be a string, got {other}"
                )));
            }
            None => {
                let id = loop {
                    coll.next_seq += 1;
                    let candidate = generated_id(collection, coll.next_seq);
                    if coll.position(&candidate).is_none() {
                        break candidate;
                    }
                };
                fields.insert("id".to_string(), Value::String(id));
            }
        }

        let now = Value::String(Utc::now().to_rfc3339());
        fields
            .entry("createdDate".to_string())
            .or_insert_with(|| now.clone());
        fields.insert("modifiedDate".to_string(), now);

        coll.records.push(fields.clone());
        Ok(fields)
    }

    /// Returns a copy of the record or `NotFound`.
    pub fn read(&self, collection: &str, id: &str) -> EngineResult<Record> {
        self.collections
            .get(collection)
            .and_then(|coll| coll.position(id).map(|i| coll.records[i].clone()))
            .ok_or_else(|| EngineError::not_found(collection, id))
    }

    /// Runs a read-modify-write on one record while holding the
    /// collection's exclusive entry, so concurrent mutations of the same
    /// collection are serialized and cannot clobber each other. The
    /// closure must not touch the store again (other collections may
    /// share a shard with this one). A closure error propagates and skips
    /// the `modifiedDate` stamp; callers that decode, mutate and replace
    /// the whole record leave it untouched on error.
    pub fn mutate<T>(
        &self,
        collection: &str,
        id: &str,
        f: impl FnOnce(&mut Record) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut coll = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::not_found(collection, id))?;
        let index = coll
            .position(id)
            .ok_or_else(|| EngineError::not_found(collection, id))?;
        let record = &mut coll.records[index];
        let out = f(record)?;
        record.insert(
            "modifiedDate".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Ok(out)
    }

    /// Shallow-merges `changes` into the record: top-level fields are
    /// replaced, not deep-merged. The `id` field is immutable.
    pub fn update(&self, collection: &str, id: &str, mut changes: Record) -> EngineResult<Record> {
        let mut coll = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::not_found(collection, id))?;
        let index = coll
            .position(id)
            .ok_or_else(|| EngineError::not_found(collection, id))?;

        changes.remove("id");
        let record = &mut coll.records[index];
        for (field, value) in changes {
            record.insert(field, value);
        }
        record.insert(
            "modifiedDate".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Ok(record.clone())
    }

    /// Removes and returns the record; deleting an unknown id is an error,
    /// never a silent no-op.
    pub fn delete(&self, collection: &str, id: &str) -> EngineResult<Record> {
        let mut coll = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::not_found(collection, id))?;
        let index = coll
            .position(id)
            .ok_or_else(|| EngineError::not_found(collection, id))?;
        Ok(coll.records.remove(index))
    }

    /// All records of a collection in insertion order. Unknown collections
    /// yield an empty list.
    pub fn list(&self, collection: &str) -> Vec<Record> {
        self.collections
            .get(collection)
            .map(|coll| coll.records.clone())
            .unwrap_or_default()
    }

    /// Runs a read-only query over the collection's current snapshot.
    pub fn query(&self, collection: &str, q: &Query) -> Page {
        query::run(self.list(collection), q)
    }
}

fn generated_id(collection: &str, seq: u64) -> String {
    let prefix: String = collection.to_uppercase().chars().take(4).collect();
    format!("{prefix}{seq:03}")
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

    #[test]
    fn create_then_read_round_trips() {
        let store = EntityStore::new();
        let created = store
            .create("customers", record(json!({ "name": "Jane Smith" })))
            .unwrap();
        let id = record_id(&created).unwrap().to_string();

        let read = store.read("customers", &id).unwrap();
        assert_eq!(read, created);
        assert_eq!(read["name"], "Jane Smith");
        assert!(read.contains_key("createdDate"));
    }

    #[test]
    fn caller_supplied_id_is_kept_and_duplicates_rejected() {
        let store = EntityStore::new();
        store
            .create("products", record(json!({ "id": "PROD001", "name": "Headphones" })))
            .unwrap();

        let err = store
            .create("products", record(json!({ "id": "PROD001", "name": "Copy" })))
            .unwrap_err();
        assert_eq!(err.kind(), "DuplicateKey");
    }

    #[test]
    fn update_merges_without_clobbering_unnamed_fields() {
        let store = EntityStore::new();
        let created = store
            .create(
                "customers",
                record(json!({ "name": "Jane", "email": "jane@example.com" })),
            )
            .unwrap();
        let id = record_id(&created).unwrap().to_string();

        let updated = store
            .update("customers", &id, record(json!({ "email": "jane@shop.example" })))
            .unwrap();
        assert_eq!(updated["name"], "Jane");
        assert_eq!(updated["email"], "jane@shop.example");
        assert_eq!(record_id(&updated), Some(id.as_str()));
    }

    #[test]
    fn update_cannot_change_the_id() {
        let store = EntityStore::new();
        let created = store.create("carts", record(json!({}))).unwrap();
        let id = record_id(&created).unwrap().to_string();

        let updated = store
            .update("carts", &id, record(json!({ "id": "HIJACK", "status": "Active" })))
            .unwrap();
        assert_eq!(record_id(&updated), Some(id.as_str()));
    }

    #[test]
    fn mutate_applies_in_place_and_propagates_closure_errors() {
        let store = EntityStore::new();
        let created = store
            .create("carts", record(json!({ "count": 1 })))
            .unwrap();
        let id = record_id(&created).unwrap().to_string();

        let seen = store
            .mutate("carts", &id, |r| {
                let next = r["count"].as_i64().unwrap() + 1;
                r.insert("count".to_string(), json!(next));
                Ok(next)
            })
            .unwrap();
        assert_eq!(seen, 2);
        assert_eq!(store.read("carts", &id).unwrap()["count"], json!(2));

        let err = store
            .mutate("carts", &id, |_| -> EngineResult<()> {
                Err(EngineError::invalid_state("nope"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidState");
        assert_eq!(
            store.mutate("carts", "GHOST", |_| Ok(())).unwrap_err().kind(),
            "NotFound"
        );
    }

    #[test]
    fn delete_then_read_fails_and_delete_of_missing_fails() {
        let store = EntityStore::new();
        let created = store.create("carts", record(json!({}))).unwrap();
        let id = record_id(&created).unwrap().to_string();

        store.delete("carts", &id).unwrap();
        assert_eq!(store.read("carts", &id).unwrap_err().kind(), "NotFound");
        assert_eq!(store.delete("carts", &id).unwrap_err().kind(), "NotFound");
    }

    #[test]
    fn generated_ids_are_not_reused_after_delete() {
        let store = EntityStore::new();
        let first = store.create("orders", record(json!({}))).unwrap();
        let first_id = record_id(&first).unwrap().to_string();
        store.delete("orders", &first_id).unwrap();

        let second = store.create("orders", record(json!({}))).unwrap();
        assert_ne!(record_id(&second).unwrap(), first_id);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = EntityStore::new();
        for name in ["a", "b", "c"] {
            store
                .create("things", record(json!({ "name": name })))
                .unwrap();
        }
        let names: Vec<_> = store
            .list("things")
            .into_iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(store.list("unknown").is_empty());
    }
}
