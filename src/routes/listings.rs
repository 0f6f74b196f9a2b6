use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{FoodListing, ListingStatus, NewFoodListing, UserRole},
    state::AppState,
    utils::json::AppJson,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub food_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub food_type: String,
    pub pickup_time_start: DateTime<Utc>,
    pub pickup_time_end: DateTime<Utc>,
    pub location: String,
}

#[derive(Deserialize)]
pub struct ListingsQuery {
    pub status: Option<String>,
}

pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> AppResult<Json<Vec<FoodListing>>> {
    let status = query
        .status
        .as_deref()
        .map(|value| {
            ListingStatus::parse(value)
                .ok_or_else(|| AppError::bad_request(format!("unknown listing status {value:?}")))
        })
        .transpose()?;

    let listings = state.store.listings(status).await?;
    Ok(Json(listings))
}

pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<CreateListingRequest>,
) -> AppResult<(StatusCode, Json<FoodListing>)> {
    if user.user.role != UserRole::Restaurant {
        return Err(AppError::forbidden(
            "only restaurants can create food listings",
        ));
    }

    if payload.food_name.trim().is_empty() {
        return Err(AppError::bad_request("foodName must not be empty"));
    }
    if payload.quantity < 1 {
        return Err(AppError::bad_request("quantity must be at least 1"));
    }
    if payload.pickup_time_end <= payload.pickup_time_start {
        return Err(AppError::bad_request(
            "pickup window must end after it starts",
        ));
    }

    let listing = state
        .store
        .create_listing(NewFoodListing {
            id: Uuid::new_v4(),
            restaurant_id: user.user.id,
            food_name: payload.food_name.trim().to_string(),
            description: payload.description,
            quantity: payload.quantity,
            unit: payload.unit,
            food_type: payload.food_type,
            pickup_time_start: payload.pickup_time_start,
            pickup_time_end: payload.pickup_time_end,
            location: payload.location,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn my_listings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<FoodListing>>> {
    let listings = state.store.listings_by_restaurant(user.user.id).await?;
    Ok(Json(listings))
}
