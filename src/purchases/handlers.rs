use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::gate::{resolve_target, Identity},
    error::{ApiError, DataBody, MessageBody},
    purchases::{
        dto::{CreatePurchaseRequest, PurchaseQuery, UpdatePurchaseRequest},
        repo_types::Purchase,
        services::{self, date_range},
    },
    state::AppState,
};

/// `/purchase/:id` is a user id for GET/POST and a purchase id for PUT/DELETE.
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/purchase", get(list_purchases).post(create_purchase))
        .route(
            "/purchase/:id",
            get(list_purchases)
                .post(create_purchase)
                .put(update_purchase)
                .delete(delete_purchase),
        )
}

fn parse_purchase_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("Invalid purchase id".into()))
}

#[instrument(skip(state, identity), fields(caller = %identity.user_id))]
pub async fn list_purchases(
    State(state): State<AppState>,
    identity: Identity,
    user_id: Option<Path<String>>,
    Query(q): Query<PurchaseQuery>,
) -> Result<Json<DataBody<Vec<Purchase>>>, ApiError> {
    let target = resolve_target(&identity, user_id.as_deref().map(String::as_str))?;
    let range = date_range(q.start.as_deref(), q.end.as_deref());
    let purchases = if range.start.is_none() && range.end.is_none() {
        state.purchases.list_by_user(target).await?
    } else {
        state.purchases.list_by_user_and_date(target, range).await?
    };
    Ok(DataBody::new(purchases))
}

#[instrument(skip(state, identity, payload), fields(caller = %identity.user_id))]
pub async fn create_purchase(
    State(state): State<AppState>,
    identity: Identity,
    user_id: Option<Path<String>>,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<Json<DataBody<Purchase>>, ApiError> {
    let owner = resolve_target(&identity, user_id.as_deref().map(String::as_str))?;
    let purchase = services::create_purchase(&state, &identity, owner, payload).await?;
    Ok(DataBody::new(purchase))
}

#[instrument(skip(state, identity, payload), fields(caller = %identity.user_id))]
pub async fn update_purchase(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePurchaseRequest>,
) -> Result<Json<DataBody<Purchase>>, ApiError> {
    let id = parse_purchase_id(&id)?;
    let purchase = services::update_purchase(&state, &identity, id, payload).await?;
    Ok(DataBody::new(purchase))
}

#[instrument(skip(state, identity), fields(caller = %identity.user_id))]
pub async fn delete_purchase(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_purchase_id(&id)?;
    services::delete_purchase(&state, &identity, id).await?;
    Ok(MessageBody::new("Purchase deleted"))
}
