use axum::{extract::State, Json};

use crate::{error::AppResult, models::Analytics, state::AppState};

// Computed fresh on every request; nothing is cached or materialized.
pub async fn get_analytics(State(state): State<AppState>) -> AppResult<Json<Analytics>> {
    let analytics = state.store.analytics().await?;
    Ok(Json(analytics))
}
