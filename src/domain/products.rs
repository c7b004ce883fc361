//! Product catalog reads: search, detail, availability, recommendations.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{parse_args, PRODUCTS, STORES};
use crate::dispatch::Dispatcher;
use crate::error::EngineResult;
use crate::store::{query::Query, Record};

pub fn search(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let mut q: Query = parse_args(args)?;
    if q.search.is_some() && q.search_fields.is_none() {
        q.search_fields = Some(vec![
            "name".to_string(),
            "description".to_string(),
            "sku".to_string(),
            "brand".to_string(),
        ]);
    }
    let page = cx.store().query(PRODUCTS, &q);
    Ok(json!({
        "api": cx.api("GET", "Products/Search"),
        "products": page.items,
        "totalCount": page.total,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRef {
    product_id: String,
}

pub fn get(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: ProductRef = parse_args(args)?;
    let product = cx.store().read(PRODUCTS, &input.product_id)?;
    Ok(json!({
        "api": cx.api("GET", &format!("Products/{}", input.product_id)),
        "product": product,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityInput {
    product_id: String,
    store_id: Option<String>,
}

fn store_stock(store_record: &Record, product_id: &str) -> i64 {
    store_record
        .get("inventory")
        .and_then(Value::as_object)
        .and_then(|inv| inv.get(product_id))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

/// Global quantity plus per-store stock. Naming a store narrows the
/// answer to that store; stores without an inventory entry report zero.
pub fn availability(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: AvailabilityInput = parse_args(args)?;
    let product = cx.store().read(PRODUCTS, &input.product_id)?;
    let global = product
        .get("inventoryQuantity")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let per_store: Vec<Value> = match &input.store_id {
        Some(store_id) => {
            let record = cx.store().read(STORES, store_id)?;
            vec![json!({
                "storeId": store_id,
                "quantity": store_stock(&record, &input.product_id),
            })]
        }
        None => cx
            .store()
            .list(STORES)
            .iter()
            .map(|record| {
                json!({
                    "storeId": crate::store::record_id(record),
                    "quantity": store_stock(record, &input.product_id),
                })
            })
            .collect(),
    };

    Ok(json!({
        "api": cx.api("GET", &format!("Products/{}/Availability", input.product_id)),
        "productId": input.product_id,
        "globalQuantity": global,
        "stores": per_store,
    }))
}

fn default_limit() -> usize {
    5
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationsInput {
    product_id: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

/// Same-category products, the product itself excluded. A product with
/// no category has no peers, so it gets no recommendations.
pub fn recommendations(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: RecommendationsInput = parse_args(args)?;
    let product = cx.store().read(PRODUCTS, &input.product_id)?;

    let related: Vec<Record> = match product.get("categoryId").filter(|c| !c.is_null()) {
        Some(category) => {
            let mut filter = Map::new();
            filter.insert("categoryId".to_string(), category.clone());
            let q = Query {
                filter,
                top: Some(i64::MAX),
                ..Query::default()
            };
            cx.store()
                .query(PRODUCTS, &q)
                .items
                .into_iter()
                .filter(|r| crate::store::record_id(r) != Some(input.product_id.as_str()))
                .take(input.limit)
                .collect()
        }
        None => Vec::new(),
    };

    Ok(json!({
        "api": cx.api("GET", &format!("Products/{}/Recommendations", input.product_id)),
        "productId": input.product_id,
        "recommendations": related,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommerceConfig;
    use crate::store::seed::demo_store;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(demo_store(), CommerceConfig::with_base_url("http://test"))
    }

    #[test]
    fn search_defaults_to_catalog_text_fields() {
        let cx = dispatcher();
        let result = search(&cx, json!({ "search": "headphones" })).unwrap();
        assert_eq!(result["totalCount"], json!(1));
        assert_eq!(result["products"][0]["id"], json!("PROD001"));
    }

    #[test]
    fn search_supports_price_ranges() {
        let cx = dispatcher();
        let result = search(
            &cx,
            json!({ "filter": { "price": { "max": 30.0 } }, "orderBy": "price" }),
        )
        .unwrap();
        assert_eq!(result["totalCount"], json!(2));
        assert_eq!(result["products"][0]["id"], json!("PROD003"));
    }

    #[test]
    fn availability_reports_global_and_per_store_stock() {
        let cx = dispatcher();
        let result = availability(&cx, json!({ "productId": "PROD001" })).unwrap();
        assert_eq!(result["globalQuantity"], json!(150));
        assert_eq!(result["stores"].as_array().unwrap().len(), 2);

        let one = availability(
            &cx,
            json!({ "productId": "PROD003", "storeId": "STORE001" }),
        )
        .unwrap();
        // STORE001 carries no PROD003.
        assert_eq!(one["stores"][0]["quantity"], json!(0));
    }

    #[test]
    fn recommendations_share_a_category_and_exclude_the_product() {
        let cx = dispatcher();
        let result = recommendations(&cx, json!({ "productId": "PROD001" })).unwrap();
        let recs = result["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0]["id"], json!("PROD003"));
    }

    #[test]
    fn recommendations_for_an_uncategorized_product_are_empty() {
        let cx = dispatcher();
        cx.store()
            .create(
                PRODUCTS,
                json!({ "id": "PROD099", "name": "Gift Card", "price": 25.00 })
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();

        let result = recommendations(&cx, json!({ "productId": "PROD099" })).unwrap();
        assert_eq!(result["recommendations"], json!([]));
    }
}
