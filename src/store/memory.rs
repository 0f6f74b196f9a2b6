use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::models::{
    Analytics, ContactSubmission, FoodClaim, FoodListing, ListingStatus, NewContactSubmission,
    NewFoodClaim, NewFoodListing, NewReview, NewSession, NewUser, PickupStatus, Review, Session,
    User, UserRole,
};

use super::{Storage, StoreError, StoreResult};

#[derive(Default)]
struct MemoryInner {
    users: Vec<User>,
    listings: Vec<FoodListing>,
    claims: Vec<FoodClaim>,
    contacts: Vec<ContactSubmission>,
    reviews: Vec<Review>,
    sessions: Vec<Session>,
}

// Everything behind one lock. Claim exclusivity falls out of the critical
// section, the same way the Postgres backend gets it from a transaction.
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
        }
    }

    pub fn with_demo_data() -> anyhow::Result<Self> {
        Ok(Self {
            inner: Mutex::new(seed_demo_data()?),
        })
    }
}

fn demo_user(
    username: &str,
    email: &str,
    role: UserRole,
    organization_name: &str,
    phone_number: &str,
    address: &str,
) -> anyhow::Result<User> {
    Ok(User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: hash_password("password123")?,
        email: email.to_string(),
        role,
        organization_name: Some(organization_name.to_string()),
        phone_number: Some(phone_number.to_string()),
        address: Some(address.to_string()),
        created_at: Utc::now(),
    })
}

fn seed_demo_data() -> anyhow::Result<MemoryInner> {
    let mut inner = MemoryInner::default();
    let now = Utc::now();

    let restaurant = demo_user(
        "demo_restaurant",
        "restaurant@example.com",
        UserRole::Restaurant,
        "Green Bites",
        "+1-555-1010",
        "123 Market St, Springfield",
    )?;
    let volunteer = demo_user(
        "demo_volunteer",
        "volunteer@example.com",
        UserRole::Volunteer,
        "Helping Hands",
        "+1-555-2020",
        "456 Elm St, Springfield",
    )?;
    let ngo = demo_user(
        "demo_ngo",
        "ngo@example.com",
        UserRole::Ngo,
        "Food Bridge",
        "+1-555-3030",
        "789 Oak Ave, Springfield",
    )?;

    let veggie_bowls = FoodListing {
        id: Uuid::new_v4(),
        restaurant_id: restaurant.id,
        food_name: "Fresh Veggie Bowls".to_string(),
        description: Some("Assorted vegetable bowls with quinoa and chickpeas".to_string()),
        quantity: 20,
        unit: "meals".to_string(),
        food_type: "vegetarian".to_string(),
        pickup_time_start: now + Duration::hours(2),
        pickup_time_end: now + Duration::hours(4),
        location: "Green Bites, 123 Market St".to_string(),
        status: ListingStatus::Claimed,
        created_at: now,
    };
    let sandwiches = FoodListing {
        id: Uuid::new_v4(),
        restaurant_id: restaurant.id,
        food_name: "Chicken Sandwiches".to_string(),
        description: Some("Leftover grilled chicken sandwiches".to_string()),
        quantity: 15,
        unit: "meals".to_string(),
        food_type: "non-vegetarian".to_string(),
        pickup_time_start: now + Duration::hours(2),
        pickup_time_end: now + Duration::hours(4),
        location: "Green Bites, 123 Market St".to_string(),
        status: ListingStatus::Available,
        created_at: now,
    };
    let pasta_trays = FoodListing {
        id: Uuid::new_v4(),
        restaurant_id: restaurant.id,
        food_name: "Pasta Trays".to_string(),
        description: Some("Two trays of tomato basil pasta".to_string()),
        quantity: 12,
        unit: "meals".to_string(),
        food_type: "vegetarian".to_string(),
        pickup_time_start: now - Duration::hours(4),
        pickup_time_end: now - Duration::hours(2),
        location: "Green Bites, 123 Market St".to_string(),
        status: ListingStatus::Claimed,
        created_at: now,
    };

    inner.claims.push(FoodClaim {
        id: Uuid::new_v4(),
        food_listing_id: veggie_bowls.id,
        claimed_by_id: volunteer.id,
        claimed_at: now,
        pickup_status: PickupStatus::Pending,
        completed_at: None,
        notes: Some("Will arrive around pickup window start".to_string()),
    });
    inner.claims.push(FoodClaim {
        id: Uuid::new_v4(),
        food_listing_id: pasta_trays.id,
        claimed_by_id: ngo.id,
        claimed_at: now,
        pickup_status: PickupStatus::Completed,
        completed_at: Some(now),
        notes: Some("Picked up and distributed".to_string()),
    });

    inner.contacts.push(ContactSubmission {
        id: Uuid::new_v4(),
        name: "Demo User".to_string(),
        email: "demo@example.com".to_string(),
        message: "Excited to partner to reduce food waste!".to_string(),
        created_at: now,
    });

    inner.users.extend([restaurant, volunteer, ngo]);
    inner
        .listings
        .extend([veggie_bowls, sandwiches, pasta_trays]);

    Ok(inner)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().await;

        if inner.users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::Conflict("username already exists".to_string()));
        }
        if inner.users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict("email already exists".to_string()));
        }

        let user = User {
            id: new_user.id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            email: new_user.email,
            role: new_user.role,
            organization_name: new_user.organization_name,
            phone_number: new_user.phone_number,
            address: new_user.address,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn users_by_role(&self, role: UserRole) -> StoreResult<Vec<User>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner
            .users
            .iter()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn create_listing(&self, new_listing: NewFoodListing) -> StoreResult<FoodListing> {
        let mut inner = self.inner.lock().await;

        let listing = FoodListing {
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
            status: ListingStatus::Available,
            created_at: Utc::now(),
        };
        inner.listings.push(listing.clone());
        Ok(listing)
    }

    async fn listings(&self, status: Option<ListingStatus>) -> StoreResult<Vec<FoodListing>> {
        let inner = self.inner.lock().await;
        let mut listings: Vec<FoodListing> = inner
            .listings
            .iter()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn listings_by_restaurant(&self, restaurant_id: Uuid) -> StoreResult<Vec<FoodListing>> {
        let inner = self.inner.lock().await;
        let mut listings: Vec<FoodListing> = inner
            .listings
            .iter()
            .filter(|l| l.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn claim_listing(&self, new_claim: NewFoodClaim) -> StoreResult<FoodClaim> {
        let mut inner = self.inner.lock().await;

        let listing = inner
            .listings
            .iter_mut()
            .find(|l| l.id == new_claim.food_listing_id);

        match listing {
            Some(listing) if listing.status == ListingStatus::Available => {
                listing.status = ListingStatus::Claimed;
            }
            _ => return Err(StoreError::ListingUnavailable),
        }

        let claim = FoodClaim {
            id: new_claim.id,
            food_listing_id: new_claim.food_listing_id,
            claimed_by_id: new_claim.claimed_by_id,
            claimed_at: Utc::now(),
            pickup_status: PickupStatus::Pending,
            completed_at: None,
            notes: new_claim.notes,
        };
        inner.claims.push(claim.clone());
        Ok(claim)
    }

    async fn claims_by_user(&self, user_id: Uuid) -> StoreResult<Vec<FoodClaim>> {
        let inner = self.inner.lock().await;
        let mut claims: Vec<FoodClaim> = inner
            .claims
            .iter()
            .filter(|c| c.claimed_by_id == user_id)
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.claimed_at.cmp(&a.claimed_at));
        Ok(claims)
    }

    async fn claims_by_listing(&self, listing_id: Uuid) -> StoreResult<Vec<FoodClaim>> {
        let inner = self.inner.lock().await;
        let mut claims: Vec<FoodClaim> = inner
            .claims
            .iter()
            .filter(|c| c.food_listing_id == listing_id)
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.claimed_at.cmp(&a.claimed_at));
        Ok(claims)
    }

    async fn advance_claim(&self, claim_id: Uuid, next: PickupStatus) -> StoreResult<FoodClaim> {
        let mut inner = self.inner.lock().await;

        let claim = inner
            .claims
            .iter_mut()
            .find(|c| c.id == claim_id)
            .ok_or(StoreError::NotFound)?;

        if !claim.pickup_status.can_advance_to(next) {
            return Err(StoreError::InvalidTransition {
                from: claim.pickup_status,
                to: next,
            });
        }

        claim.pickup_status = next;
        if next == PickupStatus::Completed {
            claim.completed_at = Some(Utc::now());
        }

        Ok(claim.clone())
    }

    async fn create_contact(
        &self,
        new_contact: NewContactSubmission,
    ) -> StoreResult<ContactSubmission> {
        let mut inner = self.inner.lock().await;

        let contact = ContactSubmission {
            id: new_contact.id,
            name: new_contact.name,
            email: new_contact.email,
            message: new_contact.message,
            created_at: Utc::now(),
        };
        inner.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn reviews(&self) -> StoreResult<Vec<Review>> {
        let inner = self.inner.lock().await;
        let mut reviews = inner.reviews.clone();
        reviews.reverse();
        Ok(reviews)
    }

    async fn add_review(&self, new_review: NewReview) -> StoreResult<Review> {
        let mut inner = self.inner.lock().await;

        let review = Review {
            id: new_review.id,
            subject_id: new_review.subject_id,
            subject_type: new_review.subject_type,
            rating: new_review.rating,
            comment: new_review.comment,
            created_at: Utc::now(),
        };
        inner.reviews.push(review.clone());
        Ok(review)
    }

    async fn create_session(&self, new_session: NewSession) -> StoreResult<Session> {
        let mut inner = self.inner.lock().await;

        let session = Session {
            id: new_session.id,
            user_id: new_session.user_id,
            token_hash: new_session.token_hash,
            created_at: Utc::now(),
            expires_at: new_session.expires_at,
        };
        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn session_user(&self, token_hash: &str) -> StoreResult<Option<(Session, User)>> {
        let mut inner = self.inner.lock().await;

        // Expired rows are dropped on lookup; whatever survives is live.
        let now = Utc::now();
        inner.sessions.retain(|s| s.expires_at > now);

        let session = inner.sessions.iter().find(|s| s.token_hash == token_hash);

        match session {
            Some(session) => {
                let user = inner
                    .users
                    .iter()
                    .find(|u| u.id == session.user_id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::Corrupt(format!("session {} has no user", session.id))
                    })?;
                Ok(Some((session.clone(), user)))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.sessions.retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> StoreResult<usize> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let before = inner.sessions.len();
        inner.sessions.retain(|s| s.expires_at > now);
        Ok(before - inner.sessions.len())
    }

    async fn analytics(&self) -> StoreResult<Analytics> {
        let inner = self.inner.lock().await;

        let total_meals_saved = inner
            .claims
            .iter()
            .filter(|c| c.pickup_status == PickupStatus::Completed)
            .filter_map(|c| {
                inner
                    .listings
                    .iter()
                    .find(|l| l.id == c.food_listing_id)
                    .map(|l| i64::from(l.quantity))
            })
            .sum();

        let active_restaurants = inner
            .users
            .iter()
            .filter(|u| u.role == UserRole::Restaurant)
            .count() as i64;
        let active_volunteers = inner.users.iter().filter(|u| u.role.can_claim()).count() as i64;

        Ok(Analytics {
            total_meals_saved,
            active_restaurants,
            active_volunteers,
            total_listings: inner.listings.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn seeded_listing(store: &MemoryStorage) -> (User, FoodListing) {
        let restaurant = store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                username: "bistro".to_string(),
                password_hash: "$argon2id$test".to_string(),
                email: "bistro@example.com".to_string(),
                role: UserRole::Restaurant,
                organization_name: None,
                phone_number: None,
                address: None,
            })
            .await
            .unwrap();

        let listing = store
            .create_listing(NewFoodListing {
                id: Uuid::new_v4(),
                restaurant_id: restaurant.id,
                food_name: "Soup".to_string(),
                description: None,
                quantity: 8,
                unit: "portions".to_string(),
                food_type: "vegetarian".to_string(),
                pickup_time_start: Utc::now(),
                pickup_time_end: Utc::now() + Duration::hours(1),
                location: "Kitchen".to_string(),
            })
            .await
            .unwrap();

        (restaurant, listing)
    }

    fn claim_for(listing: &FoodListing, user_id: Uuid) -> NewFoodClaim {
        NewFoodClaim {
            id: Uuid::new_v4(),
            food_listing_id: listing.id,
            claimed_by_id: user_id,
            notes: None,
        }
    }

    #[tokio::test]
    async fn second_claim_is_rejected() {
        let store = MemoryStorage::new();
        let (_, listing) = seeded_listing(&store).await;
        let claimer = Uuid::new_v4();

        store.claim_listing(claim_for(&listing, claimer)).await.unwrap();
        let err = store
            .claim_listing(claim_for(&listing, claimer))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ListingUnavailable));

        let claims = store.claims_by_listing(listing.id).await.unwrap();
        assert_eq!(claims.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_claims_allow_exactly_one_winner() {
        let store = Arc::new(MemoryStorage::new());
        let (_, listing) = seeded_listing(&store).await;

        let first = {
            let store = Arc::clone(&store);
            let claim = claim_for(&listing, Uuid::new_v4());
            tokio::spawn(async move { store.claim_listing(claim).await })
        };
        let second = {
            let store = Arc::clone(&store);
            let claim = claim_for(&listing, Uuid::new_v4());
            tokio::spawn(async move { store.claim_listing(claim).await })
        };

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let winners = outcomes.iter().filter(|o| o.is_ok()).count();
        assert_eq!(winners, 1);
        assert_eq!(store.claims_by_listing(listing.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn advance_claim_validates_transitions_and_stamps_completion() {
        let store = MemoryStorage::new();
        let (_, listing) = seeded_listing(&store).await;

        let claim = store
            .claim_listing(claim_for(&listing, Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(claim.pickup_status, PickupStatus::Pending);
        assert!(claim.completed_at.is_none());

        let in_progress = store
            .advance_claim(claim.id, PickupStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(in_progress.pickup_status, PickupStatus::InProgress);
        assert!(in_progress.completed_at.is_none());

        let completed = store
            .advance_claim(claim.id, PickupStatus::Completed)
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());

        let err = store
            .advance_claim(claim.id, PickupStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let err = store
            .advance_claim(Uuid::new_v4(), PickupStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn expired_sessions_are_pruned_on_lookup() {
        let store = MemoryStorage::new();
        let (restaurant, _) = seeded_listing(&store).await;

        store
            .create_session(NewSession {
                id: Uuid::new_v4(),
                user_id: restaurant.id,
                token_hash: "stale".to_string(),
                expires_at: Utc::now() - Duration::hours(1),
            })
            .await
            .unwrap();
        store
            .create_session(NewSession {
                id: Uuid::new_v4(),
                user_id: restaurant.id,
                token_hash: "live".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();

        assert!(store.session_user("stale").await.unwrap().is_none());
        assert_eq!(store.inner.lock().await.sessions.len(), 1);

        let live = store.session_user("live").await.unwrap();
        assert!(live.is_some());
    }

    #[tokio::test]
    async fn demo_fixture_matches_expected_analytics() {
        let store = MemoryStorage::with_demo_data().unwrap();

        let analytics = store.analytics().await.unwrap();
        assert_eq!(analytics.total_meals_saved, 12);
        assert_eq!(analytics.active_restaurants, 1);
        assert_eq!(analytics.active_volunteers, 2);
        assert_eq!(analytics.total_listings, 3);

        let available = store
            .listings(Some(ListingStatus::Available))
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].food_name, "Chicken Sandwiches");

        let demo = store
            .user_by_username("demo_volunteer")
            .await
            .unwrap()
            .expect("demo volunteer seeded");
        assert!(crate::auth::password::verify_password("password123", &demo.password_hash).unwrap());
    }
}
