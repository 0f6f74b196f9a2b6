use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{NewReview, Review, ReviewSubject},
    state::AppState,
    utils::json::AppJson,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewRequest {
    pub subject_id: Uuid,
    pub subject_type: ReviewSubject,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn list_reviews(State(state): State<AppState>) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.store.reviews().await?;
    Ok(Json(reviews))
}

// Demo feature: only the in-memory backend persists reviews. The store
// answers Unsupported elsewhere, which the client sees as 501.
pub async fn add_review(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AddReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::bad_request("rating must be between 1 and 5"));
    }

    let review = state
        .store
        .add_review(NewReview {
            id: Uuid::new_v4(),
            subject_id: payload.subject_id,
            subject_type: payload.subject_type,
            rating: payload.rating,
            comment: payload.comment,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}
