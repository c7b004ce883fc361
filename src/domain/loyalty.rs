//! Loyalty cards and their point ledgers.
//!
//! Every balance change goes through [`post_points`] so the transaction
//! log and the balance cannot drift apart.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{decode, encode, parse_args, CUSTOMERS, LOYALTY_CARDS};
use crate::dispatch::Dispatcher;
use crate::error::{EngineError, EngineResult};
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyTransaction {
    pub id: String,
    /// Positive for earn and transfer-in, negative for redeem and
    /// transfer-out.
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyCard {
    pub id: String,
    pub customer_id: String,
    pub card_type: String,
    pub status: String,
    pub points_balance: i64,
    pub transactions: Vec<LoyaltyTransaction>,
}

fn load(store: &EntityStore, card_id: &str) -> EngineResult<LoyaltyCard> {
    decode(store.read(LOYALTY_CARDS, card_id)?)
}

/// Applies a signed point delta to a card, recording a ledger entry.
/// Negative deltas that would overdraw the balance fail with
/// `InsufficientBalance` and leave the card untouched. The balance check
/// and the write happen under the collection's exclusive entry, so
/// concurrent postings to the same card serialize instead of clobbering
/// each other with stale balances.
pub fn post_points(
    store: &EntityStore,
    card_id: &str,
    points: i64,
    order_id: Option<String>,
) -> EngineResult<LoyaltyCard> {
    store.mutate(LOYALTY_CARDS, card_id, |record| {
        let mut card: LoyaltyCard = decode(record.clone())?;
        if card.status != "Active" {
            return Err(EngineError::invalid_state(format!(
                "loyalty card {} is {}, not Active",
                card.id, card.status
            )));
        }
        if points < 0 && card.points_balance + points < 0 {
            return Err(EngineError::InsufficientBalance {
                balance: card.points_balance,
                requested: -points,
            });
        }

        card.points_balance += points;
        card.transactions.push(LoyaltyTransaction {
            id: format!("LTXN-{}", Uuid::new_v4().simple()),
            points,
            kind: if points >= 0 { "earned" } else { "redeemed" }.to_string(),
            date: Utc::now().to_rfc3339(),
            order_id,
        });
        for (field, value) in encode(&card)? {
            record.insert(field, value);
        }
        Ok(card)
    })
}

// =============================================================================
// Operations
// =============================================================================

fn default_card_type() -> String {
    "standard".to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCardInput {
    customer_id: String,
    #[serde(default = "default_card_type")]
    card_type: String,
}

/// Creates a card and links it onto the customer record. The link is the
/// second step; if it fails the card already exists and the error says so.
pub fn issue_card(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: IssueCardInput = parse_args(args)?;
    let store = cx.store();

    let customer = store.read(CUSTOMERS, &input.customer_id)?;
    if let Some(existing) = customer.get("loyaltyCardNumber").and_then(Value::as_str) {
        return Err(EngineError::invalid_state(format!(
            "customer {} already holds loyalty card {existing}",
            input.customer_id
        )));
    }

    let card = LoyaltyCard {
        id: String::new(),
        customer_id: input.customer_id.clone(),
        card_type: input.card_type,
        status: "Active".to_string(),
        points_balance: 0,
        transactions: Vec::new(),
    };
    let mut record = encode(&card)?;
    record.remove("id");
    let card: LoyaltyCard = decode(store.create(LOYALTY_CARDS, record)?)?;

    let completed = vec![format!("issued loyalty card {}", card.id)];
    let mut link = serde_json::Map::new();
    link.insert("loyaltyCardNumber".to_string(), json!(card.id));
    store
        .update(CUSTOMERS, &input.customer_id, link)
        .map_err(|e| EngineError::partial(completed, "link card to customer", e))?;

    Ok(json!({
        "api": cx.api("POST", "LoyaltyCards"),
        "card": card,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardRef {
    card_id: String,
}

pub fn get_card(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CardRef = parse_args(args)?;
    let card = load(cx.store(), &input.card_id)?;
    Ok(json!({
        "api": cx.api("GET", &format!("LoyaltyCards/{}", input.card_id)),
        "card": card,
    }))
}

pub fn get_balance(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CardRef = parse_args(args)?;
    let card = load(cx.store(), &input.card_id)?;
    Ok(json!({
        "api": cx.api("GET", &format!("LoyaltyCards/{}/Balance", input.card_id)),
        "cardId": card.id,
        "pointsBalance": card.points_balance,
        "status": card.status,
    }))
}

pub fn get_transactions(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: CardRef = parse_args(args)?;
    let card = load(cx.store(), &input.card_id)?;
    let count = card.transactions.len();
    Ok(json!({
        "api": cx.api("GET", &format!("LoyaltyCards/{}/Transactions", input.card_id)),
        "cardId": card.id,
        "transactions": card.transactions,
        "totalCount": count,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsInput {
    card_id: String,
    points: i64,
    order_id: Option<String>,
}

pub fn earn_points(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: PointsInput = parse_args(args)?;
    if input.points <= 0 {
        return Err(EngineError::invalid_argument("points must be positive"));
    }
    let card = post_points(cx.store(), &input.card_id, input.points, input.order_id)?;
    Ok(json!({
        "api": cx.api("POST", &format!("LoyaltyCards/{}/Earn", card.id)),
        "card": card,
        "pointsEarned": input.points,
    }))
}

pub fn redeem_points(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: PointsInput = parse_args(args)?;
    if input.points <= 0 {
        return Err(EngineError::invalid_argument("points must be positive"));
    }
    let card = post_points(cx.store(), &input.card_id, -input.points, input.order_id)?;
    Ok(json!({
        "api": cx.api("POST", &format!("LoyaltyCards/{}/Redeem", card.id)),
        "card": card,
        "pointsRedeemed": input.points,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferInput {
    from_card_id: String,
    to_card_id: String,
    points: i64,
}

/// Debit then credit. Both sides are validated up front, but the credit
/// can still fail after the debit; that surfaces as `PartialFailure`.
pub fn transfer_points(cx: &Dispatcher, args: Value) -> EngineResult<Value> {
    let input: TransferInput = parse_args(args)?;
    if input.points <= 0 {
        return Err(EngineError::invalid_argument("points must be positive"));
    }
    if input.from_card_id == input.to_card_id {
        return Err(EngineError::invalid_argument(
            "source and destination card must differ",
        ));
    }

    let store = cx.store();
    // Destination must exist before any balance moves.
    load(store, &input.to_card_id)?;

    let from = post_points(store, &input.from_card_id, -input.points, None)?;
    let completed = vec![format!(
        "debited {} points from {}",
        input.points, from.id
    )];
    let to = post_points(store, &input.to_card_id, input.points, None)
        .map_err(|e| EngineError::partial(completed, "credit destination card", e))?;

    Ok(json!({
        "api": cx.api("POST", "LoyaltyCards/Transfer"),
        "fromCard": from,
        "toCard": to,
        "pointsTransferred": input.points,
    }))
}
