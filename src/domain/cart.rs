//! Cart lifecycle: lines, charges, tenders, suspend/resume, checkout.
//!
//! The cart is the most stateful entity in the system. Its status drives
//! what is permitted (`Created → Active → (Suspended ⇄ Active) →
//! CheckedOut`, or `Active → Cancelled`) and its total is derived: it is
//! recomputed after every line, charge or tender mutation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{decode, encode, parse_args, CARTS, CUSTOMERS, PRODUCTS, SALES_ORDERS};
use crate::dispatch::Dispatcher;
use crate::error::{EngineError, EngineResult};
use crate::store::{query::Query, EntityStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartStatus {
    Created,
    Active,
    Suspended,
    CheckedOut,
    Cancelled,
}

impl CartStatus {
    /// Line, charge and tender mutations are only allowed here.
    fn is_mutable(self) -> bool {
        matches!(self, Self::Created | Self::Active)
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::CheckedOut | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Derived: quantity × unitPrice, refreshed on every quantity change.
    #[serde(with = "rust_decimal::serde::float")]
    pub extended_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeKind {
    Charge,
    Discount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeLine {
    pub id: String,
    pub code: String,
    pub kind: ChargeKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderLine {
    pub id: String,
    pub tender_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub currency: String,
    pub status: CartStatus,
    pub lines: Vec<CartLine>,
    pub charges: Vec<ChargeLine>,
    pub tender_lines: Vec<TenderLine>,
    pub journal: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Heterogeneous metadata that has no stable schema.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cart {
    fn empty(customer_id: Option<String>, store_id: Option<String>, currency: String) -> Self {
        Self {
            id: String::new(),
            customer_id,
            store_id,
            currency,
            status: CartStatus::Created,
            lines: Vec::new(),
            charges: Vec::new(),
            tender_lines: Vec::new(),
            journal: Vec::new(),
            total: Decimal::ZERO,
            extra: Map::new(),
        }
    }

    /// total = Σ(quantity × unitPrice) + Σ(charges) − Σ(discounts)
    pub fn recompute_total(&mut self) {
        let lines: Decimal = self.lines.iter().map(|l| l.extended_price).sum();
        let charges: Decimal = self
            .charges
            .iter()
            .map(|c| match c.kind {
                ChargeKind::Charge => c.amount,
                ChargeKind::Discount => -c.amount,
            })
            .sum();
        self.total = lines + charges;
    }

    pub fn tendered(&self) -> Decimal {
        self.tender_lines.iter().map(|t| t.amount).sum()
    }

    fn ensure_mutable(&self) -> EngineResult<()> {
        if self.status.is_mutable() {
            Ok(())
        } else {
            Err(EngineError::invalid_state(format!(
                "cart {} is {:?}; its lines, charges and tenders are frozen",
                self.id, self.status
            )))
        }
    }

    /// The first mutation on a fresh cart activates it.
    fn activate(&mut self) {
        if self.status == CartStatus::Created {
            self.status = CartStatus::Active;
        }
    }
}

fn load(store: &EntityStore, cart_id: &str) -> EngineResult<Cart> {
    decode(store.read(CARTS, cart_id)?)
}

/// Read-modify-write on one cart under the collection's exclusive entry,
/// so concurrent mutations of the same cart serialize instead of
/// overwriting each other with stale copies. The closure must not reach
/// back into the store; resolve any catalog lookups first.
fn mutate_cart<T>(
    store: &EntityStore,
    cart_id: &str,
    f: impl FnOnce(&mut Cart) -> EngineResult<T>,
) -> EngineResult<(Cart, T)> {
    store.mutate(CARTS, cart_id, |record| {
        let mut cart: Cart = decode(record.clone())?;
        let out = f(&mut cart)?;
        for (field, value) in encode(&cart)? {
            record.insert(field, value);
        }
        Ok((cart, out))
    })
}

fn line_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// =============================================================================
// Operations
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    customer_id: Option<String>,
    store_id: Option<String>,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

pub fn create(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CreateInput = parse_args(args)?;
    if let Some(customer_id) = &input.customer_id {
        cx.store().read(CUSTOMERS, customer_id)?;
    }

    let cart = Cart::empty(input.customer_id, input.store_id, input.currency);
    let mut record = encode(&cart)?;
    record.remove("id");
    let cart: Cart = decode(cx.store().create(CARTS, record)?)?;

    Ok(json!({ "api": cx.api("POST", "Carts"), "cart": cart }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartRef {
    cart_id: String,
}

pub fn get(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CartRef = parse_args(args)?;
    let cart = load(cx.store(), &input.cart_id)?;

    // Enrich lines with display fields from the product records.
    let mut value = serde_json::to_value(&cart)?;
    if let Some(lines) = value.get_mut("lines").and_then(Value::as_array_mut) {
        for line in lines {
            let product_id = line["productId"].as_str().unwrap_or_default().to_string();
            if let Ok(product) = cx.store().read(PRODUCTS, &product_id) {
                line["productName"] = product.get("name").cloned().unwrap_or(Value::Null);
                line["productSku"] = product.get("sku").cloned().unwrap_or(Value::Null);
            }
        }
    }

    Ok(json!({
        "api": cx.api("GET", &format!("Carts/{}", input.cart_id)),
        "cart": value,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInput {
    cart_id: String,
    changes: Map<String, Value>,
}

/// Structural fields are owned by the cart operations themselves; a generic
/// update may only touch metadata.
const PROTECTED_FIELDS: &[&str] = &[
    "id",
    "status",
    "lines",
    "charges",
    "tenderLines",
    "journal",
    "total",
];

pub fn update(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: UpdateInput = parse_args(args)?;
    if let Some(field) = input.changes.keys().find(|k| PROTECTED_FIELDS.contains(&k.as_str())) {
        return Err(EngineError::invalid_argument(format!(
            "field '{field}' cannot be set through cart_update"
        )));
    }

    let cart = cx.store().mutate(CARTS, &input.cart_id, |record| {
        let cart: Cart = decode(record.clone())?;
        if cart.status.is_terminal() {
            return Err(EngineError::invalid_state(format!(
                "cart {} is {:?} and logically immutable",
                cart.id, cart.status
            )));
        }
        for (field, value) in input.changes {
            record.insert(field, value);
        }
        let updated: Cart = decode(record.clone())?;
        Ok(updated)
    })?;
    Ok(json!({ "api": cx.api("PATCH", &format!("Carts/{}", input.cart_id)), "cart": cart }))
}

pub fn delete(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CartRef = parse_args(args)?;
    cx.store().delete(CARTS, &input.cart_id)?;
    Ok(json!({
        "api": cx.api("DELETE", &format!("Carts/{}", input.cart_id)),
        "deletedCartId": input.cart_id,
    }))
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineRequest {
    product_id: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    unit_price: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddLinesInput {
    cart_id: String,
    lines: Vec<LineRequest>,
}

pub fn add_lines(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: AddLinesInput = parse_args(args)?;

    // Catalog prices are resolved before the cart entry is locked.
    // An explicit unit price stands on its own; otherwise the product
    // record is the source of truth.
    let mut resolved = Vec::with_capacity(input.lines.len());
    for request in input.lines {
        if request.quantity == 0 {
            return Err(EngineError::invalid_argument("line quantity must be at least 1"));
        }
        let unit_price = match request.unit_price {
            Some(price) => price,
            None => super::catalog_price(cx.store(), &request.product_id)?,
        };
        resolved.push((request.product_id, request.quantity, unit_price));
    }

    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        cart.ensure_mutable()?;
        for (product_id, quantity, unit_price) in resolved {
            if let Some(existing) = cart.lines.iter_mut().find(|l| l.product_id == product_id) {
                existing.quantity += quantity;
                existing.extended_price = Decimal::from(existing.quantity) * existing.unit_price;
            } else {
                cart.lines.push(CartLine {
                    id: line_id(),
                    product_id,
                    quantity,
                    unit_price,
                    extended_price: Decimal::from(quantity) * unit_price,
                });
            }
        }
        cart.activate();
        cart.recompute_total();
        Ok(())
    })?;

    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/Lines", cart.id)),
        "cart": cart,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineUpdate {
    line_id: String,
    quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLinesInput {
    cart_id: String,
    lines: Vec<LineUpdate>,
}

pub fn update_lines(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: UpdateLinesInput = parse_args(args)?;
    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        cart.ensure_mutable()?;
        for change in input.lines {
            let index = cart
                .lines
                .iter()
                .position(|l| l.id == change.line_id)
                .ok_or_else(|| line_not_found(&cart.id, &change.line_id))?;
            if change.quantity == 0 {
                cart.lines.remove(index);
            } else {
                let line = &mut cart.lines[index];
                line.quantity = change.quantity;
                line.extended_price = Decimal::from(line.quantity) * line.unit_price;
            }
        }
        cart.activate();
        cart.recompute_total();
        Ok(())
    })?;
    Ok(json!({
        "api": cx.api("PUT", &format!("Carts/{}/Lines", cart.id)),
        "cart": cart,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveLinesInput {
    cart_id: String,
    line_ids: Vec<String>,
}

pub fn remove_lines(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: RemoveLinesInput = parse_args(args)?;
    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        cart.ensure_mutable()?;
        for line_id in &input.line_ids {
            let index = cart
                .lines
                .iter()
                .position(|l| &l.id == line_id)
                .ok_or_else(|| line_not_found(&cart.id, line_id))?;
            cart.lines.remove(index);
        }
        cart.activate();
        cart.recompute_total();
        Ok(())
    })?;
    Ok(json!({
        "api": cx.api("DELETE", &format!("Carts/{}/Lines", cart.id)),
        "cart": cart,
        "linesRemoved": input.line_ids.len(),
    }))
}

fn line_not_found(cart_id: &str, line_id: &str) -> EngineError {
    EngineError::not_found(&format!("carts/{cart_id}/lines"), line_id)
}

fn default_charge_kind() -> ChargeKind {
    ChargeKind::Charge
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddChargeInput {
    cart_id: String,
    code: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(default = "default_charge_kind")]
    kind: ChargeKind,
}

pub fn add_charge(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: AddChargeInput = parse_args(args)?;
    if input.amount < Decimal::ZERO {
        return Err(EngineError::invalid_argument(
            "charge amount must be non-negative; use kind 'discount' for reductions",
        ));
    }

    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        cart.ensure_mutable()?;
        cart.charges.push(ChargeLine {
            id: line_id(),
            code: input.code,
            kind: input.kind,
            amount: input.amount,
        });
        cart.activate();
        cart.recompute_total();
        Ok(())
    })?;
    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/Charges", cart.id)),
        "cart": cart,
    }))
}

pub fn reset_charges(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CartRef = parse_args(args)?;
    let (cart, removed) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        cart.ensure_mutable()?;
        let removed = cart.charges.len();
        cart.charges.clear();
        cart.recompute_total();
        Ok(removed)
    })?;
    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/ResetAllCharges", cart.id)),
        "cart": cart,
        "chargesRemoved": removed,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTenderInput {
    cart_id: String,
    tender_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

pub fn add_tender_line(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: AddTenderInput = parse_args(args)?;
    if input.amount <= Decimal::ZERO {
        return Err(EngineError::invalid_argument("tender amount must be positive"));
    }

    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        cart.ensure_mutable()?;
        cart.tender_lines.push(TenderLine {
            id: line_id(),
            tender_type: input.tender_type,
            amount: input.amount,
        });
        cart.activate();
        cart.recompute_total();
        Ok(())
    })?;
    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/TenderLines", cart.id)),
        "cart": cart,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoidTenderInput {
    cart_id: String,
    tender_line_id: String,
}

pub fn void_tender_line(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: VoidTenderInput = parse_args(args)?;
    let (cart, voided) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        cart.ensure_mutable()?;
        let index = cart
            .tender_lines
            .iter()
            .position(|t| t.id == input.tender_line_id)
            .ok_or_else(|| {
                EngineError::not_found(
                    &format!("carts/{}/tenderLines", cart.id),
                    &input.tender_line_id,
                )
            })?;
        let voided = cart.tender_lines.remove(index);
        cart.recompute_total();
        Ok(voided)
    })?;
    Ok(json!({
        "api": cx.api("DELETE", &format!("Carts/{}/TenderLines/{}", cart.id, voided.id)),
        "cart": cart,
        "voidedTenderLine": voided,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuspendInput {
    cart_id: String,
    note: Option<String>,
}

pub fn suspend(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: SuspendInput = parse_args(args)?;
    let note = input.note.unwrap_or_else(|| "no note".to_string());
    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        if cart.status != CartStatus::Active {
            return Err(EngineError::invalid_state(format!(
                "only an Active cart can be suspended; cart {} is {:?}",
                cart.id, cart.status
            )));
        }
        cart.status = CartStatus::Suspended;
        cart.journal.push(format!(
            "suspended at {}: {note}",
            chrono::Utc::now().to_rfc3339()
        ));
        Ok(())
    })?;
    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/Suspend", cart.id)),
        "cart": cart,
    }))
}

pub fn resume(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CartRef = parse_args(args)?;
    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        if cart.status != CartStatus::Suspended {
            return Err(EngineError::invalid_state(format!(
                "only a Suspended cart can be resumed; cart {} is {:?}",
                cart.id, cart.status
            )));
        }
        cart.status = CartStatus::Active;
        Ok(())
    })?;
    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/Resume", cart.id)),
        "cart": cart,
    }))
}

pub fn cancel(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CartRef = parse_args(args)?;
    let (cart, _) = mutate_cart(cx.store(), &input.cart_id, |cart| {
        if cart.status != CartStatus::Active {
            return Err(EngineError::invalid_state(format!(
                "only an Active cart can be cancelled; cart {} is {:?}",
                cart.id, cart.status
            )));
        }
        cart.status = CartStatus::Cancelled;
        Ok(())
    })?;
    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/Cancel", cart.id)),
        "cart": cart,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutInput {
    cart_id: String,
    receipt_email: Option<String>,
}

/// Checkout touches three collections in a fixed order: sales order
/// creation, cart status, loyalty posting. There is no cross-collection
/// transaction; a late failure is reported as `PartialFailure` so the
/// caller can tell "did nothing" from "did something and then failed".
pub fn checkout(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CheckoutInput = parse_args(args)?;
    let store = cx.store();
    let snapshot = load(store, &input.cart_id)?;

    if snapshot.status != CartStatus::Active {
        return Err(EngineError::invalid_state(format!(
            "only an Active cart can be checked out; cart {} is {:?}",
            snapshot.id, snapshot.status
        )));
    }
    if snapshot.lines.is_empty() {
        return Err(EngineError::invalid_state(format!(
            "cart {} has no lines to check out",
            snapshot.id
        )));
    }
    if snapshot.total < Decimal::ZERO {
        return Err(EngineError::invalid_state(format!(
            "cart {} has a negative total of {}",
            snapshot.id, snapshot.total
        )));
    }
    let tendered = snapshot.tendered();
    if tendered < snapshot.total {
        return Err(EngineError::PaymentInsufficient {
            tendered,
            total: snapshot.total,
        });
    }

    let mut completed: Vec<String> = Vec::new();

    // Step 1: materialize the sales order. Failure here leaves everything
    // untouched.
    let mut order = encode(&json!({
        "orderNumber": format!("ORD-{}", Uuid::new_v4().simple()),
        "cartId": snapshot.id.clone(),
        "customerId": snapshot.customer_id.clone(),
        "storeId": snapshot.store_id.clone(),
        "currency": snapshot.currency.clone(),
        "status": "Confirmed",
        "lines": snapshot.lines.clone(),
        "total": snapshot.total,
        "paymentStatus": "Paid",
    }))?;
    if let Some(email) = &input.receipt_email {
        order.insert("receiptEmail".to_string(), json!(email));
    }
    let order = store.create(SALES_ORDERS, order)?;
    let order_id = crate::store::record_id(&order).unwrap_or_default().to_string();
    completed.push(format!("created sales order {order_id}"));

    // Step 2: freeze the cart. The status flip re-checks Active under the
    // lock; a concurrent transition since the snapshot surfaces here.
    let (cart, _) = mutate_cart(store, &input.cart_id, |cart| {
        if cart.status != CartStatus::Active {
            return Err(EngineError::invalid_state(format!(
                "cart {} became {:?} during checkout",
                cart.id, cart.status
            )));
        }
        cart.status = CartStatus::CheckedOut;
        Ok(())
    })
    .map_err(|e| EngineError::partial(completed.clone(), "mark cart checked out", e))?;
    completed.push(format!("cart {} marked CheckedOut", cart.id));

    // Step 3: post loyalty points for the owning customer, when they hold
    // a card. One point per whole currency unit.
    let points = cart.total.trunc().to_i64().unwrap_or(0);
    let mut points_earned = 0;
    if points > 0 {
        if let Some(customer_id) = cart.customer_id.clone() {
            let customer = store
                .read(CUSTOMERS, &customer_id)
                .map_err(|e| EngineError::partial(completed.clone(), "post loyalty points", e))?;
            if let Some(card_id) = customer.get("loyaltyCardNumber").and_then(Value::as_str) {
                super::loyalty::post_points(store, card_id, points, Some(order_id.clone()))
                    .map_err(|e| {
                        EngineError::partial(completed.clone(), "post loyalty points", e)
                    })?;
                completed.push(format!("earned {points} loyalty points on {card_id}"));
                points_earned = points;
            }
        }
    }

    let charged = cart.total;
    Ok(json!({
        "api": cx.api("POST", &format!("Carts/{}/Checkout", cart.id)),
        "cart": cart,
        "order": order,
        "transaction": {
            "id": format!("TXN-{}", Uuid::new_v4().simple()),
            "amount": charged,
            "status": "Approved",
        },
        "pointsEarned": points_earned,
        "completedSteps": completed,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeInput {
    source_cart_id: String,
    target_cart_id: String,
}

/// Moves the source cart's lines (aggregating quantities per product),
/// charges and tenders into the target, then cancels the source.
pub fn merge(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: MergeInput = parse_args(args)?;
    if input.source_cart_id == input.target_cart_id {
        return Err(EngineError::invalid_argument(
            "source and target cart must differ",
        ));
    }

    let store = cx.store();
    let source = load(store, &input.source_cart_id)?;
    source.ensure_mutable()?;

    let moved = source.clone();
    let (target, _) = mutate_cart(store, &input.target_cart_id, |target| {
        target.ensure_mutable()?;
        for line in moved.lines {
            if let Some(existing) = target
                .lines
                .iter_mut()
                .find(|l| l.product_id == line.product_id)
            {
                existing.quantity += line.quantity;
                existing.extended_price = Decimal::from(existing.quantity) * existing.unit_price;
            } else {
                target.lines.push(line);
            }
        }
        target.charges.extend(moved.charges);
        target.tender_lines.extend(moved.tender_lines);
        target.activate();
        target.recompute_total();
        Ok(())
    })?;

    let mut completed = Vec::new();
    completed.push(format!("cart {} absorbed cart {}", target.id, source.id));

    let target_id = target.id.clone();
    mutate_cart(store, &input.source_cart_id, |source| {
        source.ensure_mutable()?;
        source.lines.clear();
        source.charges.clear();
        source.tender_lines.clear();
        source.status = CartStatus::Cancelled;
        source.recompute_total();
        source
            .journal
            .push(format!("merged into cart {target_id}"));
        Ok(())
    })
    .map_err(|e| EngineError::partial(completed.clone(), "cancel source cart", e))?;

    Ok(json!({
        "api": cx.api("POST", "Carts/Merge"),
        "cart": target,
        "cancelledCartId": source.id,
    }))
}

pub fn search(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let q: Query = parse_args(args)?;
    let page = cx.store().query(CARTS, &q);
    Ok(json!({
        "api": cx.api("GET", "Carts/Search"),
        "carts": page.items,
        "totalCount": page.total,
    }))
}
