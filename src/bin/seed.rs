use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use diesel::connection::SimpleConnection;
use uuid::Uuid;

use ecoconnect::auth::password::hash_password;
use ecoconnect::config::AppConfig;
use ecoconnect::db;
use ecoconnect::models::{
    NewContactSubmission, NewFoodClaim, NewFoodListing, NewUser, PickupStatus, UserRole,
};
use ecoconnect::store::{PgStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required to run the seed binary")?;

    let pool = db::init_pool(database_url, config.database_max_pool_size)?;
    let storage = PgStorage::new(pool.clone());
    storage.run_migrations()?;

    println!("Seeding database with demo data...");

    let mut conn = pool.get().context("failed to get database connection")?;
    conn.batch_execute(
        "TRUNCATE TABLE food_claims, food_listings, contact_submissions, sessions, users CASCADE;",
    )
    .context("failed to clear existing data")?;
    drop(conn);

    let restaurant = storage
        .create_user(demo_user(
            "demo_restaurant",
            "restaurant@example.com",
            UserRole::Restaurant,
            "Green Bites",
            "+1-555-1010",
            "123 Market St, Springfield",
        )?)
        .await?;
    let volunteer = storage
        .create_user(demo_user(
            "demo_volunteer",
            "volunteer@example.com",
            UserRole::Volunteer,
            "Helping Hands",
            "+1-555-2020",
            "456 Elm St, Springfield",
        )?)
        .await?;
    let ngo = storage
        .create_user(demo_user(
            "demo_ngo",
            "ngo@example.com",
            UserRole::Ngo,
            "Food Bridge",
            "+1-555-3030",
            "789 Oak Ave, Springfield",
        )?)
        .await?;

    let now = Utc::now();

    let veggie_bowls = storage
        .create_listing(demo_listing(
            restaurant.id,
            "Fresh Veggie Bowls",
            "Assorted vegetable bowls with quinoa and chickpeas",
            20,
            "vegetarian",
            now + Duration::hours(2),
            now + Duration::hours(4),
        ))
        .await?;
    storage
        .create_listing(demo_listing(
            restaurant.id,
            "Chicken Sandwiches",
            "Leftover grilled chicken sandwiches",
            15,
            "non-vegetarian",
            now + Duration::hours(2),
            now + Duration::hours(4),
        ))
        .await?;
    let pasta_trays = storage
        .create_listing(demo_listing(
            restaurant.id,
            "Pasta Trays",
            "Two trays of tomato basil pasta",
            12,
            "vegetarian",
            now - Duration::hours(4),
            now - Duration::hours(2),
        ))
        .await?;

    // A pending pickup by the volunteer and a finished one by the NGO, both
    // driven through the same claim lifecycle the server uses.
    storage
        .claim_listing(NewFoodClaim {
            id: Uuid::new_v4(),
            food_listing_id: veggie_bowls.id,
            claimed_by_id: volunteer.id,
            notes: Some("Will arrive around pickup window start".to_string()),
        })
        .await?;

    let completed = storage
        .claim_listing(NewFoodClaim {
            id: Uuid::new_v4(),
            food_listing_id: pasta_trays.id,
            claimed_by_id: ngo.id,
            notes: Some("Picked up and distributed".to_string()),
        })
        .await?;
    storage
        .advance_claim(completed.id, PickupStatus::Completed)
        .await?;

    storage
        .create_contact(NewContactSubmission {
            id: Uuid::new_v4(),
            name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            message: "Excited to partner to reduce food waste!".to_string(),
        })
        .await?;

    println!("Seed completed.");
    println!("Demo accounts:");
    println!("- Restaurant: demo_restaurant / password123");
    println!("- Volunteer:  demo_volunteer / password123");
    println!("- NGO:        demo_ngo / password123");

    Ok(())
}

fn demo_user(
    username: &str,
    email: &str,
    role: UserRole,
    organization_name: &str,
    phone_number: &str,
    address: &str,
) -> Result<NewUser> {
    Ok(NewUser {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: hash_password("password123")?,
        email: email.to_string(),
        role,
        organization_name: Some(organization_name.to_string()),
        phone_number: Some(phone_number.to_string()),
        address: Some(address.to_string()),
    })
}

fn demo_listing(
    restaurant_id: Uuid,
    food_name: &str,
    description: &str,
    quantity: i32,
    food_type: &str,
    pickup_time_start: DateTime<Utc>,
    pickup_time_end: DateTime<Utc>,
) -> NewFoodListing {
    NewFoodListing {
        id: Uuid::new_v4(),
        restaurant_id,
        food_name: food_name.to_string(),
        description: Some(description.to_string()),
        quantity,
        unit: "meals".to_string(),
        food_type: food_type.to_string(),
        pickup_time_start,
        pickup_time_end,
        location: "Green Bites, 123 Market St".to_string(),
    }
}
