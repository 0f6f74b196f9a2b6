use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{PublicProfile, UserRole},
    state::AppState,
};

#[derive(Serialize)]
pub struct PublicProfilesResponse {
    pub restaurants: Vec<PublicProfile>,
    pub ngos: Vec<PublicProfile>,
}

// Public directory of restaurants and NGOs. Only the redacted profile view
// leaves the server; full user rows stay internal.
pub async fn public_profiles(
    State(state): State<AppState>,
) -> AppResult<Json<PublicProfilesResponse>> {
    let restaurants = state.store.users_by_role(UserRole::Restaurant).await?;
    let ngos = state.store.users_by_role(UserRole::Ngo).await?;

    Ok(Json(PublicProfilesResponse {
        restaurants: restaurants.iter().map(PublicProfile::from).collect(),
        ngos: ngos.iter().map(PublicProfile::from).collect(),
    }))
}
