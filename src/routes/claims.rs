use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{FoodClaim, NewFoodClaim, PickupStatus},
    state::AppState,
    utils::json::AppJson,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub food_listing_id: Uuid,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub pickup_status: Option<PickupStatus>,
}

#[derive(Deserialize)]
pub struct UpdateClaimStatusRequest {
    pub status: PickupStatus,
}

pub async fn create_claim(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<CreateClaimRequest>,
) -> AppResult<(StatusCode, Json<FoodClaim>)> {
    if !user.user.role.can_claim() {
        return Err(AppError::forbidden(
            "only volunteers and NGOs can claim food",
        ));
    }

    if let Some(status) = payload.pickup_status {
        if status != PickupStatus::Pending {
            return Err(AppError::bad_request("new claims must start pending"));
        }
    }

    let claim = state
        .store
        .claim_listing(NewFoodClaim {
            id: Uuid::new_v4(),
            food_listing_id: payload.food_listing_id,
            claimed_by_id: user.user.id,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(claim)))
}

pub async fn my_claims(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<FoodClaim>>> {
    let claims = state.store.claims_by_user(user.user.id).await?;
    Ok(Json(claims))
}

// No claimer-ownership check: organization staff hand pickups to teammates,
// so any authenticated user may advance a claim.
pub async fn update_claim_status(
    State(state): State<AppState>,
    Path(claim_id): Path<Uuid>,
    _user: AuthenticatedUser,
    AppJson(payload): AppJson<UpdateClaimStatusRequest>,
) -> AppResult<Json<Value>> {
    state.store.advance_claim(claim_id, payload.status).await?;
    Ok(Json(json!({ "success": true })))
}
