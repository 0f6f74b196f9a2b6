use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Restaurant,
    Volunteer,
    Ngo,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Restaurant => "restaurant",
            UserRole::Volunteer => "volunteer",
            UserRole::Ngo => "ngo",
        }
    }

    pub fn parse(value: &str) -> Option<UserRole> {
        match value {
            "restaurant" => Some(UserRole::Restaurant),
            "volunteer" => Some(UserRole::Volunteer),
            "ngo" => Some(UserRole::Ngo),
            _ => None,
        }
    }

    pub fn can_claim(self) -> bool {
        matches!(self, UserRole::Volunteer | UserRole::Ngo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Claimed,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Claimed => "claimed",
        }
    }

    pub fn parse(value: &str) -> Option<ListingStatus> {
        match value {
            "available" => Some(ListingStatus::Available),
            "claimed" => Some(ListingStatus::Claimed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    Pending,
    InProgress,
    Completed,
}

impl PickupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::InProgress => "in_progress",
            PickupStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<PickupStatus> {
        match value {
            "pending" => Some(PickupStatus::Pending),
            "in_progress" => Some(PickupStatus::InProgress),
            "completed" => Some(PickupStatus::Completed),
            _ => None,
        }
    }

    // Forward-only: pending -> in_progress -> completed, with the
    // in_progress step optional. Completed is terminal.
    pub fn can_advance_to(self, next: PickupStatus) -> bool {
        matches!(
            (self, next),
            (PickupStatus::Pending, PickupStatus::InProgress)
                | (PickupStatus::Pending, PickupStatus::Completed)
                | (PickupStatus::InProgress, PickupStatus::Completed)
        )
    }
}

// Client-facing error messages embed this; it stays on the snake_case
// names the API accepts.
impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSubject {
    Restaurant,
    Ngo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub role: UserRole,
    pub organization_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: UserRole,
    pub organization_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodListing {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub food_name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub food_type: String,
    pub pickup_time_start: DateTime<Utc>,
    pub pickup_time_end: DateTime<Utc>,
    pub location: String,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFoodListing {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub food_name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub food_type: String,
    pub pickup_time_start: DateTime<Utc>,
    pub pickup_time_end: DateTime<Utc>,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodClaim {
    pub id: Uuid,
    pub food_listing_id: Uuid,
    pub claimed_by_id: Uuid,
    pub claimed_at: DateTime<Utc>,
    pub pickup_status: PickupStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFoodClaim {
    pub id: Uuid,
    pub food_listing_id: Uuid,
    pub claimed_by_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub subject_type: ReviewSubject,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub subject_type: ReviewSubject,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_meals_saved: i64,
    pub active_restaurants: i64,
    pub active_volunteers: i64,
    pub total_listings: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub organization_name: Option<String>,
    pub address: Option<String>,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        PublicProfile {
            id: user.id,
            username: user.username.clone(),
            organization_name: user.organization_name.clone(),
            address: user.address.clone(),
        }
    }
}
