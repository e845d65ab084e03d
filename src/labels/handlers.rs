use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::gate::Identity,
    error::{ApiError, DataBody},
    labels::repo_types::Label,
    state::AppState,
};

pub fn label_routes() -> Router<AppState> {
    Router::new().route("/labels", get(list_default_labels))
}

#[instrument(skip(state, identity), fields(caller = %identity.user_id))]
pub async fn list_default_labels(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<DataBody<Vec<Label>>>, ApiError> {
    let labels = state.labels.default_labels().await?;
    Ok(DataBody::new(labels))
}
