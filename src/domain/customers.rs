//! Customer accounts and the sales order read surface.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{parse_args, CUSTOMERS, SALES_ORDERS};
use crate::dispatch::Dispatcher;
use crate::error::{EngineError, EngineResult};
use crate::store::query::Query;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    #[serde(flatten)]
    fields: Map<String, Value>,
}

pub fn create(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CreateInput = parse_args(args)?;
    if !input
        .fields
        .get("email")
        .map(Value::is_string)
        .unwrap_or(false)
    {
        return Err(EngineError::invalid_argument(
            "a customer requires an email address",
        ));
    }
    let customer = cx.store().create(CUSTOMERS, input.fields)?;
    Ok(json!({ "api": cx.api("POST", "Customers"), "customer": customer }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRef {
    customer_id: String,
}

pub fn get(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CustomerRef = parse_args(args)?;
    let customer = cx.store().read(CUSTOMERS, &input.customer_id)?;
    Ok(json!({
        "api": cx.api("GET", &format!("Customers/{}", input.customer_id)),
        "customer": customer,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInput {
    customer_id: String,
    changes: Map<String, Value>,
}

pub fn update(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: UpdateInput = parse_args(args)?;
    let customer = cx
        .store()
        .update(CUSTOMERS, &input.customer_id, input.changes)?;
    Ok(json!({
        "api": cx.api("PATCH", &format!("Customers/{}", input.customer_id)),
        "customer": customer,
    }))
}

pub fn delete(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CustomerRef = parse_args(args)?;
    cx.store().delete(CUSTOMERS, &input.customer_id)?;
    Ok(json!({
        "api": cx.api("DELETE", &format!("Customers/{}", input.customer_id)),
        "deletedCustomerId": input.customer_id,
    }))
}

pub fn search(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let mut q: Query = parse_args(args)?;
    if q.search.is_some() && q.search_fields.is_none() {
        q.search_fields = Some(vec![
            "firstName".to_string(),
            "lastName".to_string(),
            "email".to_string(),
            "phone".to_string(),
        ]);
    }
    let page = cx.store().query(CUSTOMERS, &q);
    Ok(json!({
        "api": cx.api("GET", "Customers/Search"),
        "customers": page.items,
        "totalCount": page.total,
    }))
}

/// Sales orders of one customer, newest first.
pub fn orders(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CustomerRef = parse_args(args)?;
    cx.store().read(CUSTOMERS, &input.customer_id)?;

    let mut filter = Map::new();
    filter.insert("customerId".to_string(), json!(input.customer_id));
    let q = Query {
        filter,
        order_by: Some("createdDate".to_string()),
        descending: true,
        ..Query::default()
    };
    let page = cx.store().query(SALES_ORDERS, &q);
    Ok(json!({
        "api": cx.api("GET", &format!("Customers/{}/Orders", input.customer_id)),
        "orders": page.items,
        "totalCount": page.total,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRef {
    order_id: String,
}

pub fn order_get(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: OrderRef = parse_args(args)?;
    let order = cx.store().read(SALES_ORDERS, &input.order_id)?;
    Ok(json!({
        "api": cx.api("GET", &format!("SalesOrders/{}", input.order_id)),
        "order": order,
    }))
}

pub fn order_search(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let q: Query = parse_args(args)?;
    let page = cx.store().query(SALES_ORDERS, &q);
    Ok(json!({
        "api": cx.api("GET", "SalesOrders/Search"),
        "orders": page.items,
        "totalCount": page.total,
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
    fn create_requires_an_email() {
        let cx = dispatcher();
        let err = create(&cx, json!({ "firstName": "Sam" })).unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");

        let result = create(
            &cx,
            json!({ "firstName": "Sam", "email": "sam@example.com" }),
        )
        .unwrap();
        assert!(result["customer"]["id"].is_string());
    }

    #[test]
    fn search_covers_contact_fields_by_default() {
        let cx = dispatcher();
        let result = search(&cx, json!({ "search": "john.smith" })).unwrap();
        assert_eq!(result["totalCount"], json!(1));
        assert_eq!(result["customers"][0]["id"], json!("CUST001"));
    }

    #[test]
    fn orders_lists_only_the_named_customers_orders() {
        let cx = dispatcher();
        let result = orders(&cx, json!({ "customerId": "CUST001" })).unwrap();
        assert_eq!(result["totalCount"], json!(1));
        assert_eq!(result["orders"][0]["id"], json!("SO001"));

        let none = orders(&cx, json!({ "customerId": "CUST002" })).unwrap();
        assert_eq!(none["totalCount"], json!(0));

        let err = orders(&cx, json!({ "customerId": "GHOST" })).unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn order_lookup_and_search() {
        let cx = dispatcher();
        let result = order_get(&cx, json!({ "orderId": "SO001" })).unwrap();
        assert_eq!(result["order"]["orderNumber"], json!("ORD-SEED001"));

        let page = order_search(&cx, json!({ "filter": { "status": "Fulfilled" } })).unwrap();
        assert_eq!(page["totalCount"], json!(1));
    }
}
