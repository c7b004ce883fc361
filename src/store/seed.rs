//! Demo fixtures so the server is explorable out of the box.
//!
//! Tests construct empty stores instead; seeding is strictly optional.

use serde_json::{json, Value};

use super::{EntityStore, Record};

fn record(fields: Value) -> Record {
    match fields {
        Value::Object(map) => map,
        _ => unreachable!("seed fixtures are objects"),
    }
}

/// Builds a store pre-populated with a small, internally consistent data
/// set: customers, products, categories, stores, one active cart, one
/// fulfilled order and one loyalty card.
pub fn demo_store() -> EntityStore {
    let store = EntityStore::new();

    for country in [
        json!({ "id": "US", "name": "United States", "code": "US" }),
        json!({ "id": "CA", "name": "Canada", "code": "CA" }),
        json!({ "id": "GB", "name": "United Kingdom", "code": "GB" }),
    ] {
        seed(&store, "countries", country);
    }

    seed(
        &store,
        "categories",
        json!({ "id": "CAT001", "name": "Electronics", "parentId": null, "sortOrder": 1 }),
    );
    seed(
        &store,
        "categories",
        json!({ "id": "CAT002", "name": "Accessories", "parentId": "CAT001", "sortOrder": 2 }),
    );

    seed(
        &store,
        "products",
        json!({
            "id": "PROD001",
            "name": "Wireless Bluetooth Headphones",
            "description": "Noise-cancelling wireless headphones with 30-hour battery life",
            "sku": "WBH001",
            "price": 199.99,
            "categoryId": "CAT001",
            "brand": "TechBrand",
            "inventoryQuantity": 150
        }),
    );
    seed(
        &store,
        "products",
        json!({
            "id": "PROD002",
            "name": "Smartphone Case",
            "description": "Durable protective case for smartphones",
            "sku": "SC002",
            "price": 29.99,
            "categoryId": "CAT002",
            "brand": "ProtectTech",
            "inventoryQuantity": 300
        }),
    );
    seed(
        &store,
        "products",
        json!({
            "id": "PROD003",
            "name": "Wired Earbuds",
            "description": "Entry-level wired earbuds",
            "sku": "WE003",
            "price": 19.99,
            "categoryId": "CAT001",
            "brand": "TechBrand",
            "inventoryQuantity": 80
        }),
    );

    seed(
        &store,
        "stores",
        json!({
            "id": "STORE001",
            "name": "Seattle Downtown",
            "address": "456 Commerce St, Seattle, WA 98102",
            "inventory": { "PROD001": 50, "PROD002": 120 }
        }),
    );
    seed(
        &store,
        "stores",
        json!({
            "id": "STORE002",
            "name": "Los Angeles West",
            "address": "789 Retail Ave, Los Angeles, CA 90210",
            "inventory": { "PROD001": 75, "PROD002": 200, "PROD003": 40 }
        }),
    );

    seed(
        &store,
        "customers",
        json!({
            "id": "CUST001",
            "firstName": "John",
            "lastName": "Smith",
            "email": "john.smith@example.com",
            "phone": "+1-555-0101",
            "customerGroup": "REGULAR",
            "loyaltyCardNumber": "LOY001"
        }),
    );
    seed(
        &store,
        "customers",
        json!({
            "id": "CUST002",
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane.doe@example.com",
            "phone": "+1-555-0102",
            "customerGroup": "VIP"
        }),
    );

    seed(
        &store,
        "loyalty_cards",
        json!({
            "id": "LOY001",
            "customerId": "CUST001",
            "cardType": "standard",
            "status": "Active",
            "pointsBalance": 1250,
            "transactions": [
                { "id": "LOYT001", "points": 1191, "type": "earned", "date": "2026-06-02T00:00:00Z" },
                { "id": "LOYT002", "points": 59, "type": "earned", "date": "2026-08-18T00:00:00Z", "orderId": "SO001" }
            ]
        }),
    );

    seed(
        &store,
        "sales_orders",
        json!({
            "id": "SO001",
            "orderNumber": "ORD-SEED001",
            "customerId": "CUST001",
            "storeId": "STORE001",
            "status": "Fulfilled",
            "currency": "USD",
            "lines": [
                { "id": "SOLINE001", "productId": "PROD002", "quantity": 2, "unitPrice": 29.99, "extendedPrice": 59.98 }
            ],
            "total": 59.98,
            "paymentStatus": "Paid"
        }),
    );

    // Shape matches domain::cart::Cart so the cart handlers can decode it.
    seed(
        &store,
        "carts",
        json!({
            "id": "CART001",
            "customerId": "CUST001",
            "storeId": "STORE001",
            "currency": "USD",
            "status": "Active",
            "lines": [
                { "id": "LINE001", "productId": "PROD001", "quantity": 1, "unitPrice": 199.99, "extendedPrice": 199.99 }
            ],
            "charges": [],
            "tenderLines": [],
            "journal": [],
            "total": 199.99
        }),
    );

    for tender in [
        json!({ "id": "CASH", "name": "Cash", "type": "Cash" }),
        json!({ "id": "CREDIT", "name": "Credit Card", "type": "Card" }),
        json!({ "id": "DEBIT", "name": "Debit Card", "type": "Card" }),
    ] {
        seed(&store, "tender_types", tender);
    }

    for option in [
        json!({ "id": "STANDARD", "name": "Standard Delivery", "cost": 5.99, "days": 3 }),
        json!({ "id": "EXPRESS", "name": "Express Delivery", "cost": 12.99, "days": 1 }),
        json!({ "id": "PICKUP", "name": "Store Pickup", "cost": 0.0, "days": 0 }),
    ] {
        seed(&store, "delivery_options", option);
    }

    store
}

fn seed(store: &EntityStore, collection: &str, fields: Value) {
    store
        .create(collection, record(fields))
        .expect("seed ids are unique");
}
