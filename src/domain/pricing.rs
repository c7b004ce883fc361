//! Standalone price calculation: quantity tiers plus order-level codes.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_args;
use crate::dispatch::Dispatcher;
use crate::error::{EngineError, EngineResult};

/// Volume tiers: five or more units takes 10% off the line, three or
/// more takes 5%.
fn tier_discount(quantity: u32) -> Decimal {
    if quantity >= 5 {
        Decimal::new(10, 2)
    } else if quantity >= 3 {
        Decimal::new(5, 2)
    } else {
        Decimal::ZERO
    }
}

/// Order-level codes. Unknown codes are an argument error, not a silent
/// zero discount.
fn code_discount(code: &str) -> Option<Decimal> {
    match code.to_uppercase().as_str() {
        "SAVE10" | "WELCOME10" => Some(Decimal::new(10, 2)),
        "SAVE20" | "VIP20" => Some(Decimal::new(20, 2)),
        _ => None,
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingItem {
    product_id: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    unit_price: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculateInput {
    items: Vec<PricingItem>,
    discount_code: Option<String>,
}

pub fn calculate(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CalculateInput = parse_args(args)?;
    if input.items.is_empty() {
        return Err(EngineError::invalid_argument("items must not be empty"));
    }

    let code_rate = match &input.discount_code {
        Some(code) => code_discount(code).ok_or_else(|| {
            EngineError::invalid_argument(format!("unknown discount code '{code}'"))
        })?,
        None => Decimal::ZERO,
    };

    let mut lines = Vec::with_capacity(input.items.len());
    let mut subtotal = Decimal::ZERO;
    let mut tier_savings = Decimal::ZERO;

    for item in &input.items {
        if item.quantity == 0 {
            return Err(EngineError::invalid_argument("item quantity must be at least 1"));
        }
        let unit_price = match item.unit_price {
            Some(price) => price,
            None => super::catalog_price(cx.store(), &item.product_id)?,
        };
        let base = Decimal::from(item.quantity) * unit_price;
        let rate = tier_discount(item.quantity);
        let discount = (base * rate).round_dp(2);

        subtotal += base;
        tier_savings += discount;
        lines.push(json!({
            "productId": item.product_id,
            "quantity": item.quantity,
            "unitPrice": unit_price,
            "basePrice": base,
            "tierDiscountRate": rate,
            "tierDiscount": discount,
            "linePrice": base - discount,
        }));
    }

    let after_tiers = subtotal - tier_savings;
    let code_savings = (after_tiers * code_rate).round_dp(2);
    let total = (after_tiers - code_savings).round_dp(2);

    Ok(json!({
        "api": cx.api("POST", "Pricing/Calculate"),
        "lines": lines,
        "subtotal": subtotal.round_dp(2),
        "tierDiscount": tier_savings,
        "discountCode": input.discount_code,
        "codeDiscount": code_savings,
        "total": total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommerceConfig;
    use crate::store::EntityStore;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(EntityStore::new(), CommerceConfig::with_base_url("http://test"))
    }

    #[test]
    fn quantity_tiers_scale_the_line_discount() {
        let cx = dispatcher();
        let result = calculate(
            &cx,
            json!({
                "items": [
                    { "productId": "A", "quantity": 1, "unitPrice": 10.00 },
                    { "productId": "B", "quantity": 3, "unitPrice": 10.00 },
                    { "productId": "C", "quantity": 5, "unitPrice": 10.00 }
                ]
            }),
        )
        .unwrap();

        assert_eq!(result["lines"][0]["tierDiscount"], json!(0.0));
        assert_eq!(result["lines"][1]["tierDiscount"], json!(1.5));
        assert_eq!(result["lines"][2]["tierDiscount"], json!(5.0));
        assert_eq!(result["subtotal"], json!(90.0));
        assert_eq!(result["total"], json!(83.5));
    }

    #[test]
    fn discount_codes_apply_after_tier_discounts() {
        let cx = dispatcher();
        let result = calculate(
            &cx,
            json!({
                "items": [{ "productId": "A", "quantity": 5, "unitPrice": 20.00 }],
                "discountCode": "save20"
            }),
        )
        .unwrap();

        // 100 − 10 tier, then 20% of 90.
        assert_eq!(result["codeDiscount"], json!(18.0));
        assert_eq!(result["total"], json!(72.0));
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let cx = dispatcher();
        let err = calculate(
            &cx,
            json!({
                "items": [{ "productId": "A", "unitPrice": 5.00 }],
                "discountCode": "NOPE"
            }),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[test]
    fn missing_unit_price_falls_back_to_the_catalog() {
        let cx = dispatcher();
        cx.store()
            .create(
                super::super::PRODUCTS,
                json!({ "id": "PROD010", "name": "Cable", "price": 7.25 })
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();

        let result = calculate(
            &cx,
            json!({ "items": [{ "productId": "PROD010", "quantity": 2 }] }),
        )
        .unwrap();
        assert_eq!(result["total"], json!(14.5));

        let err = calculate(
            &cx,
            json!({ "items": [{ "productId": "MISSING" }] }),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }
}
