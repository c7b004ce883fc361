//! Business operations built on top of the entity store and query engine.
//!
//! Each handler takes the dispatcher context and the raw argument mapping,
//! deserializes a typed input, and returns the JSON payload for the
//! response envelope.

pub mod cart;
pub mod customers;
pub mod loyalty;
pub mod pricing;
pub mod products;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::store::{EntityStore, Record};

pub const CARTS: &str = "carts";
pub const CUSTOMERS: &str = "customers";
pub const PRODUCTS: &str = "products";
pub const SALES_ORDERS: &str = "sales_orders";
pub const LOYALTY_CARDS: &str = "loyalty_cards";
pub const STORES: &str = "stores";

/// Deserializes tool arguments; a shape mismatch is the caller's fault.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> EngineResult<T> {
    serde_json::from_value(args).map_err(|e| EngineError::invalid_argument(e.to_string()))
}

/// Decodes a stored record into a typed entity. Failures here mean the
/// stored shape drifted from the schema and are reported as internal.
pub fn decode<T: DeserializeOwned>(record: Record) -> EngineResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Encodes a typed entity back into a record for storage.
pub fn encode<T: Serialize>(entity: &T) -> EngineResult<Record> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(EngineError::invalid_argument(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Looks up a product's catalog price for callers that did not supply one.
pub fn catalog_price(store: &EntityStore, product_id: &str) -> EngineResult<Decimal> {
    let product = store.read(PRODUCTS, product_id)?;
    product
        .get("price")
        .and_then(Value::as_f64)
        .and_then(Decimal::from_f64)
        .ok_or_else(|| {
            EngineError::invalid_argument(format!("product {product_id} has no usable price"))
        })
}
