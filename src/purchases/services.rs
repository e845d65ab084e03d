use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use serde_json::Value;
use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime, UtcOffset,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::gate::{can_act, Identity},
    error::ApiError,
    labels::repo_types::Label,
    purchases::{
        dto::{CreatePurchaseRequest, UpdatePurchaseRequest},
        repo_types::{DateRange, NewPurchase, Purchase},
    },
    state::AppState,
};

pub const COST_SCALE: u32 = 3;
pub const MAX_COST: i64 = 999_999_999_999;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

lazy_static! {
    /// Plain decimal notation: optional sign, digits, at most one point with digits after it.
    static ref COST_RE: Regex = Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap();
}

/// Parses a cost and rounds it half away from zero to three decimal places.
pub fn parse_cost(value: &Value) -> Result<Decimal, ApiError> {
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Some(s.trim())
            .filter(|s| COST_RE.is_match(s))
            .and_then(|s| Decimal::from_str(s).ok()),
        _ => None,
    };
    let cost = parsed
        .ok_or_else(|| ApiError::Validation("Invalid cost".into()))?
        .round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if cost.abs() > Decimal::from(MAX_COST) {
        return Err(ApiError::Validation(format!(
            "Cost cannot exceed {MAX_COST} in magnitude"
        )));
    }
    Ok(cost)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (taken as its UTC date).
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    Date::parse(raw, DATE_FORMAT).ok().or_else(|| {
        OffsetDateTime::parse(raw, &Rfc3339)
            .ok()
            .map(|dt| dt.to_offset(UtcOffset::UTC).date())
    })
}

/// Malformed bounds are dropped rather than rejected.
pub fn date_range(start: Option<&str>, end: Option<&str>) -> DateRange {
    DateRange {
        start: start.and_then(parse_date),
        end: end.and_then(parse_date),
    }
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn resolve_label(state: &AppState, name: &str) -> Result<Label, ApiError> {
    state
        .labels
        .default_label_by_name(name)
        .await?
        .ok_or_else(|| {
            warn!(label = %name, "unknown label");
            ApiError::NotFound("Unknown label".into())
        })
}

pub async fn create_purchase(
    state: &AppState,
    caller: &Identity,
    owner: Uuid,
    req: CreatePurchaseRequest,
) -> Result<Purchase, ApiError> {
    let name = non_blank(req.name)
        .ok_or_else(|| ApiError::Validation("Missing purchase name".into()))?;
    let cost = present(req.cost)
        .ok_or_else(|| ApiError::Validation("Missing purchase cost".into()))?;
    let label_name = non_blank(req.label)
        .ok_or_else(|| ApiError::Validation("Missing purchase label".into()))?;
    let cost = parse_cost(&cost)?;
    let date = match req.date {
        Some(raw) => {
            parse_date(&raw).ok_or_else(|| ApiError::Validation("Invalid purchase date".into()))?
        }
        None => OffsetDateTime::now_utc().date(),
    };
    let label = resolve_label(state, &label_name).await?;

    if owner != caller.user_id && state.users.find_by_id(owner).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let purchase = state
        .purchases
        .create_purchase(NewPurchase {
            name,
            description: req.description,
            cost,
            date,
            user_id: owner,
            label_id: label.id,
        })
        .await?;
    info!(purchase_id = %purchase.id, user_id = %owner, "purchase created");
    Ok(purchase)
}

async fn load_owned(state: &AppState, caller: &Identity, id: Uuid) -> Result<Purchase, ApiError> {
    let purchase = state
        .purchases
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Purchase not found".into()))?;
    if !can_act(caller, purchase.user_id) {
        warn!(purchase_id = %id, caller = %caller.user_id, "purchase owned by another user");
        return Err(ApiError::foreign_resource());
    }
    Ok(purchase)
}

pub async fn update_purchase(
    state: &AppState,
    caller: &Identity,
    id: Uuid,
    req: UpdatePurchaseRequest,
) -> Result<Purchase, ApiError> {
    let mut purchase = load_owned(state, caller, id).await?;

    if let Some(name) = req.name {
        purchase.name = non_blank(Some(name))
            .ok_or_else(|| ApiError::Validation("Invalid purchase name".into()))?;
    }
    if let Some(description) = req.description {
        purchase.description = Some(description);
    }
    if let Some(cost) = present(req.cost) {
        purchase.cost = parse_cost(&cost)?;
    }
    if let Some(raw) = req.date {
        purchase.date =
            parse_date(&raw).ok_or_else(|| ApiError::Validation("Invalid purchase date".into()))?;
    }
    if let Some(label) = req.label {
        purchase.label_id = resolve_label(state, label.trim()).await?.id;
    }

    let updated = state
        .purchases
        .update_purchase(&purchase)
        .await?
        .ok_or_else(|| ApiError::NotFound("Purchase not found".into()))?;
    info!(purchase_id = %id, "purchase updated");
    Ok(updated)
}

pub async fn delete_purchase(
    state: &AppState,
    caller: &Identity,
    id: Uuid,
) -> Result<(), ApiError> {
    load_owned(state, caller, id).await?;
    if !state.purchases.delete_purchase(id).await? {
        return Err(ApiError::NotFound("Purchase not found".into()));
    }
    info!(purchase_id = %id, "purchase deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::*;

    #[test]
    fn cost_rounds_to_three_places() {
        assert_eq!(parse_cost(&json!(19.9996)).unwrap(), Decimal::from(20));
        assert_eq!(
            parse_cost(&json!(1.2345)).unwrap(),
            Decimal::from_str("1.235").unwrap()
        );
        assert_eq!(
            parse_cost(&json!("-1.2345")).unwrap(),
            Decimal::from_str("-1.235").unwrap()
        );
        assert_eq!(parse_cost(&json!(42)).unwrap(), Decimal::from(42));
    }

    #[test]
    fn zero_cost_is_valid() {
        assert_eq!(parse_cost(&json!(0)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn cost_bounds_and_shapes() {
        assert!(parse_cost(&json!(999_999_999_999i64)).is_ok());
        assert!(parse_cost(&json!(1_000_000_000_000i64)).is_err());
        assert!(parse_cost(&json!(-1_000_000_000_000i64)).is_err());
        assert!(parse_cost(&json!("twelve")).is_err());
        assert!(parse_cost(&json!("1_000")).is_err());
        assert!(parse_cost(&json!("1e3")).is_err());
        assert!(parse_cost(&json!("1.2.3")).is_err());
        assert!(parse_cost(&json!("")).is_err());
        assert!(parse_cost(&json!("12.")).is_err());
        assert_eq!(parse_cost(&json!(" 12.5 ")).unwrap(), Decimal::from_str("12.5").unwrap());
        assert!(parse_cost(&json!(true)).is_err());
        assert!(parse_cost(&json!([1])).is_err());
    }

    #[test]
    fn dates_parse_from_day_or_timestamp() {
        assert_eq!(parse_date("2024-01-31"), Some(date!(2024 - 01 - 31)));
        assert_eq!(
            parse_date("2024-01-31T23:30:00-02:00"),
            Some(date!(2024 - 02 - 01))
        );
        assert_eq!(parse_date("31/01/2024"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn malformed_bounds_are_open() {
        let range = date_range(Some("2024-01-01"), Some("soon"));
        assert_eq!(range.start, Some(date!(2024 - 01 - 01)));
        assert_eq!(range.end, None);
        assert!(range.contains(date!(2030 - 01 - 01)));
        assert!(!range.contains(date!(2023 - 12 - 31)));
        assert_eq!(date_range(None, None), DateRange::default());
    }
}
