use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::NewContactSubmission,
    state::AppState,
    utils::json::AppJson,
};

#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

pub async fn submit_contact(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContactRequest>,
) -> AppResult<(StatusCode, Json<ContactResponse>)> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    let message = payload.message.trim();

    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::bad_request("name, email and message are required"));
    }

    let contact = state
        .store
        .create_contact(NewContactSubmission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        })
        .await?;

    tracing::info!(id = %contact.id, email = %contact.email, "contact form submission received");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            message: "Contact form submitted successfully".to_string(),
            id: contact.id,
        }),
    ))
}
