//! Name-routed dispatcher: one flat registry of operations, each with a
//! declared set of required arguments, all answering through the same
//! response envelope.

pub mod entities;
pub mod envelope;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::CommerceConfig;
use crate::domain::{cart, customers, loyalty, pricing, products};
use crate::error::{EngineError, EngineResult};
use crate::store::EntityStore;
pub use envelope::Envelope;

pub type Handler = fn(&Dispatcher, Value) -> EngineResult<Value>;

pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    /// Argument keys that must be present and non-null. Checked before the
    /// handler runs; deeper shape validation is the handler's job.
    pub required: &'static [&'static str],
    pub handler: Handler,
}

macro_rules! tool {
    ($name:literal, $desc:literal, [$($req:literal),*], $handler:path) => {
        ToolDef {
            name: $name,
            description: $desc,
            required: &[$($req),*],
            handler: $handler,
        }
    };
}

pub static TOOLS: &[ToolDef] = &[
    // Carts
    tool!("cart_create", "Create a new shopping cart, optionally bound to a customer and store", [], cart::create),
    tool!("cart_get", "Fetch a cart with product display data on its lines", ["cartId"], cart::get),
    tool!("cart_update", "Update cart metadata fields (never lines, charges or status)", ["cartId", "changes"], cart::update),
    tool!("cart_delete", "Delete a cart entirely", ["cartId"], cart::delete),
    tool!("cart_add_lines", "Add product lines to a cart, aggregating repeated products", ["cartId", "lines"], cart::add_lines),
    tool!("cart_update_lines", "Change line quantities; quantity zero removes the line", ["cartId", "lines"], cart::update_lines),
    tool!("cart_remove_lines", "Remove cart lines by line id", ["cartId", "lineIds"], cart::remove_lines),
    tool!("cart_add_charge", "Add a charge or discount line to a cart", ["cartId", "code", "amount"], cart::add_charge),
    tool!("cart_reset_charges", "Remove every charge and discount from a cart", ["cartId"], cart::reset_charges),
    tool!("cart_add_tender_line", "Record a payment against a cart", ["cartId", "tenderType", "amount"], cart::add_tender_line),
    tool!("cart_void_tender_line", "Void a previously recorded payment", ["cartId", "tenderLineId"], cart::void_tender_line),
    tool!("cart_suspend", "Park an active cart for later", ["cartId"], cart::suspend),
    tool!("cart_resume", "Reactivate a suspended cart", ["cartId"], cart::resume),
    tool!("cart_cancel", "Cancel an active cart permanently", ["cartId"], cart::cancel),
    tool!("cart_checkout", "Convert a fully tendered cart into a sales order", ["cartId"], cart::checkout),
    tool!("cart_merge", "Merge one cart's contents into another, cancelling the source", ["sourceCartId", "targetCartId"], cart::merge),
    tool!("cart_search", "Search carts with filters, sorting and pagination", [], cart::search),
    // Loyalty
    tool!("loyalty_issue_card", "Issue a loyalty card to a customer without one", ["customerId"], loyalty::issue_card),
    tool!("loyalty_get_card", "Fetch a loyalty card with its transaction history", ["cardId"], loyalty::get_card),
    tool!("loyalty_get_balance", "Fetch a card's current point balance", ["cardId"], loyalty::get_balance),
    tool!("loyalty_get_transactions", "List a card's point transactions", ["cardId"], loyalty::get_transactions),
    tool!("loyalty_earn_points", "Credit points to a loyalty card", ["cardId", "points"], loyalty::earn_points),
    tool!("loyalty_redeem_points", "Debit points from a loyalty card", ["cardId", "points"], loyalty::redeem_points),
    tool!("loyalty_transfer_points", "Move points between two loyalty cards", ["fromCardId", "toCardId", "points"], loyalty::transfer_points),
    // Products
    tool!("products_search", "Search the product catalog with filters and text search", [], products::search),
    tool!("products_get", "Fetch one product by id", ["productId"], products::get),
    tool!("products_availability", "Report global and per-store stock for a product", ["productId"], products::availability),
    tool!("products_recommendations", "Suggest products from the same category", ["productId"], products::recommendations),
    // Pricing
    tool!("pricing_calculate", "Price a basket with quantity tiers and discount codes", ["items"], pricing::calculate),
    // Customers and orders
    tool!("customer_create", "Create a customer record", ["email"], customers::create),
    tool!("customer_get", "Fetch one customer by id", ["customerId"], customers::get),
    tool!("customer_update", "Merge changes into a customer record", ["customerId", "changes"], customers::update),
    tool!("customer_delete", "Delete a customer record", ["customerId"], customers::delete),
    tool!("customer_search", "Search customers with filters and text search", [], customers::search),
    tool!("customer_orders", "List a customer's sales orders, newest first", ["customerId"], customers::orders),
    tool!("salesorder_get", "Fetch one sales order by id", ["orderId"], customers::order_get),
    tool!("salesorder_search", "Search sales orders with filters and pagination", [], customers::order_search),
    // Generic entities
    tool!("entity_create", "Create a record in any named collection", ["collection", "fields"], entities::create),
    tool!("entity_get", "Fetch a record from any named collection", ["collection", "id"], entities::get),
    tool!("entity_update", "Merge changes into a record of any named collection", ["collection", "id", "changes"], entities::update),
    tool!("entity_delete", "Delete a record from any named collection", ["collection", "id"], entities::delete),
    tool!("entity_list", "List and query records of any named collection", ["collection"], entities::list),
];

pub fn find_tool(name: &str) -> Option<&'static ToolDef> {
    TOOLS.iter().find(|t| t.name == name)
}

pub struct Dispatcher {
    store: EntityStore,
    config: CommerceConfig,
}

pub type SharedDispatcher = std::sync::Arc<Dispatcher>;

impl Dispatcher {
    pub fn new(store: EntityStore, config: CommerceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Cosmetic endpoint string echoed in responses, e.g.
    /// `POST https://host/api/CommerceRuntime/Carts`.
    pub fn api(&self, method: &str, path: &str) -> String {
        format!("{method} {}/api/CommerceRuntime/{path}", self.config.base_url())
    }

    /// Routes by name, validates required arguments, runs the handler.
    pub fn call(&self, operation: &str, args: Value) -> EngineResult<Value> {
        let tool = find_tool(operation)
            .ok_or_else(|| EngineError::UnknownOperation(operation.to_string()))?;

        let map = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(EngineError::invalid_argument(format!(
                    "arguments must be an object, got {other}"
                )));
            }
        };
        for key in tool.required {
            let missing = matches!(map.get(*key), None | Some(Value::Null));
            if missing {
                return Err(EngineError::invalid_argument(format!(
                    "missing required argument '{key}'"
                )));
            }
        }

        (tool.handler)(self, Value::Object(map))
    }

    /// Like [`call`](Self::call), with the result folded into the uniform
    /// envelope. This never fails: errors become failure envelopes.
    pub fn dispatch(&self, operation: &str, args: Value) -> Envelope {
        debug!(operation, "dispatching");
        let result = self.call(operation, args);
        if let Err(err) = &result {
            warn!(operation, kind = err.kind(), error = %err, "operation failed");
        }
        Envelope::from_result(operation, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            crate::store::seed::demo_store(),
            CommerceConfig::with_base_url("http://test"),
        )
    }

    #[test]
    fn tool_names_are_unique() {
        let mut names: Vec<_> = TOOLS.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TOOLS.len());
    }

    #[test]
    fn unknown_operation_yields_a_typed_failure_envelope() {
        let envelope = dispatcher().dispatch("cart_explode", json!({}));
        assert!(!envelope.success);
        assert_eq!(envelope.error.unwrap().kind, "UnknownOperation");
    }

    #[test]
    fn missing_required_arguments_are_caught_before_the_handler() {
        let envelope = dispatcher().dispatch("cart_get", json!({}));
        let error = envelope.error.unwrap();
        assert_eq!(error.kind, "InvalidArgument");
        assert!(error.message.contains("cartId"));

        // Explicit null counts as missing.
        let envelope = dispatcher().dispatch("cart_get", json!({ "cartId": null }));
        assert_eq!(envelope.error.unwrap().kind, "InvalidArgument");
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let envelope = dispatcher().dispatch("cart_search", json!([1, 2]));
        assert_eq!(envelope.error.unwrap().kind, "InvalidArgument");
    }

    #[test]
    fn a_full_flow_runs_through_dispatch_alone() {
        let cx = dispatcher();
        let created = cx.dispatch("cart_create", json!({ "customerId": "CUST002" }));
        assert!(created.success);
        let cart_id = created.data.unwrap()["cart"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let added = cx.dispatch(
            "cart_add_lines",
            json!({ "cartId": cart_id, "lines": [{ "productId": "PROD002", "quantity": 2 }] }),
        );
        assert!(added.success);
        assert_eq!(added.data.unwrap()["cart"]["total"], json!(59.98));

        cx.dispatch(
            "cart_add_tender_line",
            json!({ "cartId": cart_id, "tenderType": "CASH", "amount": 60.0 }),
        );
        let done = cx.dispatch("cart_checkout", json!({ "cartId": cart_id }));
        assert!(done.success);
        assert_eq!(done.data.unwrap()["cart"]["status"], json!("CheckedOut"));
    }

    #[test]
    fn the_api_echo_names_the_configured_host() {
        let cx = dispatcher();
        let envelope = cx.dispatch("products_get", json!({ "productId": "PROD001" }));
        let api = envelope.data.unwrap()["api"].as_str().unwrap().to_string();
        assert_eq!(api, "GET http://test/api/CommerceRuntime/Products/PROD001");
    }
}
