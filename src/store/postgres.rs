use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use uuid::Uuid;

use crate::db::PgPool;
use crate::models::{
    Analytics, ContactSubmission, FoodClaim, FoodListing, ListingStatus, NewContactSubmission,
    NewFoodClaim, NewFoodListing, NewReview, NewSession, NewUser, PickupStatus, Review, Session,
    User, UserRole,
};
use crate::schema::{contact_submissions, food_claims, food_listings, sessions, users};

use super::{Storage, StoreError, StoreResult};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn run_migrations(&self) -> anyhow::Result<()> {
        let mut conn = self
            .pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        Ok(())
    }

    fn conn(&self) -> StoreResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| StoreError::Pool(err.to_string()))
    }
}

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = users)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    email: String,
    role: String,
    organization_name: Option<String>,
    phone_number: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
struct NewUserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    email: String,
    role: String,
    organization_name: Option<String>,
    phone_number: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = food_listings)]
struct FoodListingRow {
    id: Uuid,
    restaurant_id: Uuid,
    food_name: String,
    description: Option<String>,
    quantity: i32,
    unit: String,
    food_type: String,
    pickup_time_start: DateTime<Utc>,
    pickup_time_end: DateTime<Utc>,
    location: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = food_listings)]
struct NewFoodListingRow {
    id: Uuid,
    restaurant_id: Uuid,
    food_name: String,
    description: Option<String>,
    quantity: i32,
    unit: String,
    food_type: String,
    pickup_time_start: DateTime<Utc>,
    pickup_time_end: DateTime<Utc>,
    location: String,
}

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = food_claims)]
struct FoodClaimRow {
    id: Uuid,
    food_listing_id: Uuid,
    claimed_by_id: Uuid,
    claimed_at: DateTime<Utc>,
    pickup_status: String,
    completed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = food_claims)]
struct NewFoodClaimRow {
    id: Uuid,
    food_listing_id: Uuid,
    claimed_by_id: Uuid,
    pickup_status: String,
    notes: Option<String>,
}

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = contact_submissions)]
struct ContactSubmissionRow {
    id: Uuid,
    name: String,
    email: String,
    message: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contact_submissions)]
struct NewContactSubmissionRow {
    id: Uuid,
    name: String,
    email: String,
    message: String,
}

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = sessions)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sessions)]
struct NewSessionRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<User> {
        let role = UserRole::parse(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown user role {:?}", row.role)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            email: row.email,
            role,
            organization_name: row.organization_name,
            phone_number: row.phone_number,
            address: row.address,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<FoodListingRow> for FoodListing {
    type Error = StoreError;

    fn try_from(row: FoodListingRow) -> StoreResult<FoodListing> {
        let status = ListingStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown listing status {:?}", row.status)))?;
        Ok(FoodListing {
            id: row.id,
            restaurant_id: row.restaurant_id,
            food_name: row.food_name,
            description: row.description,
            quantity: row.quantity,
            unit: row.unit,
            food_type: row.food_type,
            pickup_time_start: row.pickup_time_start,
            pickup_time_end: row.pickup_time_end,
            location: row.location,
            status,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<FoodClaimRow> for FoodClaim {
    type Error = StoreError;

    fn try_from(row: FoodClaimRow) -> StoreResult<FoodClaim> {
        let pickup_status = PickupStatus::parse(&row.pickup_status).ok_or_else(|| {
            StoreError::Corrupt(format!("unknown pickup status {:?}", row.pickup_status))
        })?;
        Ok(FoodClaim {
            id: row.id,
            food_listing_id: row.food_listing_id,
            claimed_by_id: row.claimed_by_id,
            claimed_at: row.claimed_at,
            pickup_status,
            completed_at: row.completed_at,
            notes: row.notes,
        })
    }
}

impl From<ContactSubmissionRow> for ContactSubmission {
    fn from(row: ContactSubmissionRow) -> Self {
        ContactSubmission {
            id: row.id,
            name: row.name,
            email: row.email,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            token_hash: row.token_hash,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut conn = self.conn()?;

        let row = NewUserRow {
            id: new_user.id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            email: new_user.email,
            role: new_user.role.as_str().to_string(),
            organization_name: new_user.organization_name,
            phone_number: new_user.phone_number,
            address: new_user.address,
        };

        match diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
        {
            Ok(_) => {}
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            )) => {
                let message = if info.constraint_name() == Some("users_email_key") {
                    "email already exists"
                } else {
                    "username already exists"
                };
                return Err(StoreError::Conflict(message.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        let stored: UserRow = users::table.find(row.id).first(&mut conn)?;
        stored.try_into()
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row: Option<UserRow> = users::table.find(id).first(&mut conn).optional()?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .first(&mut conn)
            .optional()?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .first(&mut conn)
            .optional()?;
        row.map(User::try_from).transpose()
    }

    async fn users_by_role(&self, role: UserRole) -> StoreResult<Vec<User>> {
        let mut conn = self.conn()?;
        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq(role.as_str()))
            .order(users::username.asc())
            .load(&mut conn)?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn create_listing(&self, new_listing: NewFoodListing) -> StoreResult<FoodListing> {
        let mut conn = self.conn()?;

        let row = NewFoodListingRow {
            id: new_listing.id,
            restaurant_id: new_listing.restaurant_id,
            food_name: new_listing.food_name,
            description: new_listing.description,
            quantity: new_listing.quantity,
            unit: new_listing.unit,
            food_type: new_listing.food_type,
            pickup_time_start: new_listing.pickup_time_start,
            pickup_time_end: new_listing.pickup_time_end,
            location: new_listing.location,
        };

        diesel::insert_into(food_listings::table)
            .values(&row)
            .execute(&mut conn)?;

        let stored: FoodListingRow = food_listings::table.find(row.id).first(&mut conn)?;
        stored.try_into()
    }

    async fn listings(&self, status: Option<ListingStatus>) -> StoreResult<Vec<FoodListing>> {
        let mut conn = self.conn()?;

        let mut query = food_listings::table.into_boxed();
        if let Some(status) = status {
            query = query.filter(food_listings::status.eq(status.as_str()));
        }

        let rows: Vec<FoodListingRow> = query
            .order(food_listings::created_at.desc())
            .load(&mut conn)?;
        rows.into_iter().map(FoodListing::try_from).collect()
    }

    async fn listings_by_restaurant(&self, restaurant_id: Uuid) -> StoreResult<Vec<FoodListing>> {
        let mut conn = self.conn()?;
        let rows: Vec<FoodListingRow> = food_listings::table
            .filter(food_listings::restaurant_id.eq(restaurant_id))
            .order(food_listings::created_at.desc())
            .load(&mut conn)?;
        rows.into_iter().map(FoodListing::try_from).collect()
    }

    async fn claim_listing(&self, new_claim: NewFoodClaim) -> StoreResult<FoodClaim> {
        let mut conn = self.conn()?;

        let stored = conn.transaction::<FoodClaimRow, StoreError, _>(|conn| {
            // Compare-and-swap on the listing status; zero rows means the
            // listing is missing or already claimed.
            let updated = diesel::update(
                food_listings::table
                    .filter(food_listings::id.eq(new_claim.food_listing_id))
                    .filter(food_listings::status.eq(ListingStatus::Available.as_str())),
            )
            .set(food_listings::status.eq(ListingStatus::Claimed.as_str()))
            .execute(conn)?;

            if updated == 0 {
                return Err(StoreError::ListingUnavailable);
            }

            let row = NewFoodClaimRow {
                id: new_claim.id,
                food_listing_id: new_claim.food_listing_id,
                claimed_by_id: new_claim.claimed_by_id,
                pickup_status: PickupStatus::Pending.as_str().to_string(),
                notes: new_claim.notes,
            };

            match diesel::insert_into(food_claims::table)
                .values(&row)
                .execute(conn)
            {
                Ok(_) => {}
                Err(diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                )) => {
                    return Err(StoreError::ListingUnavailable);
                }
                Err(err) => return Err(err.into()),
            }

            let stored: FoodClaimRow = food_claims::table.find(row.id).first(conn)?;
            Ok(stored)
        })?;

        stored.try_into()
    }

    async fn claims_by_user(&self, user_id: Uuid) -> StoreResult<Vec<FoodClaim>> {
        let mut conn = self.conn()?;
        let rows: Vec<FoodClaimRow> = food_claims::table
            .filter(food_claims::claimed_by_id.eq(user_id))
            .order(food_claims::claimed_at.desc())
            .load(&mut conn)?;
        rows.into_iter().map(FoodClaim::try_from).collect()
    }

    async fn claims_by_listing(&self, listing_id: Uuid) -> StoreResult<Vec<FoodClaim>> {
        let mut conn = self.conn()?;
        let rows: Vec<FoodClaimRow> = food_claims::table
            .filter(food_claims::food_listing_id.eq(listing_id))
            .order(food_claims::claimed_at.desc())
            .load(&mut conn)?;
        rows.into_iter().map(FoodClaim::try_from).collect()
    }

    async fn advance_claim(&self, claim_id: Uuid, next: PickupStatus) -> StoreResult<FoodClaim> {
        let mut conn = self.conn()?;

        let stored = conn.transaction::<FoodClaimRow, StoreError, _>(|conn| {
            let current: FoodClaimRow = food_claims::table
                .find(claim_id)
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::NotFound)?;

            let from = PickupStatus::parse(&current.pickup_status).ok_or_else(|| {
                StoreError::Corrupt(format!("unknown pickup status {:?}", current.pickup_status))
            })?;

            if !from.can_advance_to(next) {
                return Err(StoreError::InvalidTransition { from, to: next });
            }

            let completed_at = match next {
                PickupStatus::Completed => Some(Utc::now()),
                _ => current.completed_at,
            };

            diesel::update(food_claims::table.find(claim_id))
                .set((
                    food_claims::pickup_status.eq(next.as_str()),
                    food_claims::completed_at.eq(completed_at),
                ))
                .execute(conn)?;

            let updated: FoodClaimRow = food_claims::table.find(claim_id).first(conn)?;
            Ok(updated)
        })?;

        stored.try_into()
    }

    async fn create_contact(
        &self,
        new_contact: NewContactSubmission,
    ) -> StoreResult<ContactSubmission> {
        let mut conn = self.conn()?;

        let row = NewContactSubmissionRow {
            id: new_contact.id,
            name: new_contact.name,
            email: new_contact.email,
            message: new_contact.message,
        };

        diesel::insert_into(contact_submissions::table)
            .values(&row)
            .execute(&mut conn)?;

        let stored: ContactSubmissionRow =
            contact_submissions::table.find(row.id).first(&mut conn)?;
        Ok(stored.into())
    }

    async fn reviews(&self) -> StoreResult<Vec<Review>> {
        Ok(Vec::new())
    }

    async fn add_review(&self, _new_review: NewReview) -> StoreResult<Review> {
        Err(StoreError::Unsupported(
            "reviews not supported in current storage".to_string(),
        ))
    }

    async fn create_session(&self, new_session: NewSession) -> StoreResult<Session> {
        let mut conn = self.conn()?;

        let row = NewSessionRow {
            id: new_session.id,
            user_id: new_session.user_id,
            token_hash: new_session.token_hash,
            expires_at: new_session.expires_at,
        };

        diesel::insert_into(sessions::table)
            .values(&row)
            .execute(&mut conn)?;

        let stored: SessionRow = sessions::table.find(row.id).first(&mut conn)?;
        Ok(stored.into())
    }

    async fn session_user(&self, token_hash: &str) -> StoreResult<Option<(Session, User)>> {
        let mut conn = self.conn()?;

        let pair: Option<(SessionRow, UserRow)> = sessions::table
            .inner_join(users::table)
            .filter(sessions::token_hash.eq(token_hash))
            .filter(sessions::expires_at.gt(Utc::now()))
            .first(&mut conn)
            .optional()?;

        match pair {
            Some((session, user)) => Ok(Some((session.into(), user.try_into()?))),
            None => Ok(None),
        }
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(sessions::table.filter(sessions::token_hash.eq(token_hash)))
            .execute(&mut conn)?;
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> StoreResult<usize> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(sessions::table.filter(sessions::expires_at.le(Utc::now())))
            .execute(&mut conn)?;
        Ok(deleted)
    }

    async fn analytics(&self) -> StoreResult<Analytics> {
        let mut conn = self.conn()?;

        let total_meals_saved: Option<i64> = food_claims::table
            .inner_join(food_listings::table)
            .filter(food_claims::pickup_status.eq(PickupStatus::Completed.as_str()))
            .select(sum(food_listings::quantity))
            .first(&mut conn)?;

        let active_restaurants: i64 = users::table
            .filter(users::role.eq(UserRole::Restaurant.as_str()))
            .select(count_star())
            .first(&mut conn)?;

        let active_volunteers: i64 = users::table
            .filter(users::role.eq_any([
                UserRole::Volunteer.as_str(),
                UserRole::Ngo.as_str(),
            ]))
            .select(count_star())
            .first(&mut conn)?;

        let total_listings: i64 = food_listings::table
            .select(count_star())
            .first(&mut conn)?;

        Ok(Analytics {
            total_meals_saved: total_meals_saved.unwrap_or(0),
            active_restaurants,
            active_volunteers,
            total_listings,
        })
    }
}
