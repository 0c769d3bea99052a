//! Repository Implementation

use crate::models::{AuthProvider, NewOrder, NewRobot, NewUser, OAuthProfile, Order, Robot, User};
use crate::StorageError;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// Repository for data access (in-memory implementation)
pub struct Repository {
    users: Mutex<Vec<User>>,
    robots: Mutex<Vec<Robot>>,
    orders: Mutex<Vec<Order>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate and append under the caller's guard
fn insert_user(users: &mut Vec<User>, new: NewUser) -> Result<User, StorageError> {
    new.validate()?;

    let email = normalize_email(&new.email);
    if users.iter().any(|u| u.email == email) {
        return Err(StorageError::Duplicate(format!("email '{}'", email)));
    }
    if let Some(google_id) = &new.google_id {
        if users.iter().any(|u| u.google_id.as_ref() == Some(google_id)) {
            return Err(StorageError::Duplicate("googleId".into()));
        }
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: new.name.trim().to_string(),
        email,
        password_hash: new.password_hash,
        google_id: new.google_id,
        profile_picture: new.profile_picture,
        auth_provider: new.auth_provider,
        is_email_verified: new.is_email_verified,
        created_at: now,
        updated_at: now,
    };
    users.push(user.clone());
    debug!("Created {:?} user {}", user.auth_provider, user.id);
    Ok(user)
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            users: Mutex::new(Vec::new()),
            robots: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
        }
    }

    // ---- Users ----

    /// Insert a user; emails and Google ids are unique
    pub fn create_user(&self, new: NewUser) -> Result<User, StorageError> {
        let mut users = lock(&self.users)?;
        insert_user(&mut users, new)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let email = normalize_email(email);
        Ok(lock(&self.users)?.iter().find(|u| u.email == email).cloned())
    }

    pub fn find_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.users)?.iter().find(|u| u.id == id).cloned())
    }

    /// Find or create the account for an OAuth identity.
    ///
    /// An existing local account with the same email gets the Google id linked.
    pub fn upsert_google_user(&self, profile: &OAuthProfile) -> Result<User, StorageError> {
        let mut users = lock(&self.users)?;
        if let Some(user) = users
            .iter()
            .find(|u| u.google_id.as_deref() == Some(profile.provider_id.as_str()))
        {
            return Ok(user.clone());
        }

        let email = normalize_email(&profile.email);
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.google_id = Some(profile.provider_id.clone());
            if user.profile_picture.is_none() {
                user.profile_picture = profile.picture.clone();
            }
            user.is_email_verified |= profile.email_verified;
            user.updated_at = Utc::now();
            info!("Linked Google account to user {}", user.id);
            return Ok(user.clone());
        }

        insert_user(
            &mut users,
            NewUser {
                name: profile.name.clone(),
                email: profile.email.clone(),
                password_hash: None,
                google_id: Some(profile.provider_id.clone()),
                profile_picture: profile.picture.clone(),
                auth_provider: AuthProvider::Google,
                is_email_verified: profile.email_verified,
            },
        )
    }

    // ---- Robots ----

    pub fn create_robot(&self, new: NewRobot) -> Result<Robot, StorageError> {
        let robot = new.into_robot()?;
        lock(&self.robots)?.push(robot.clone());
        debug!("Created robot {} ({})", robot.name, robot.id);
        Ok(robot)
    }

    pub fn list_robots(&self) -> Result<Vec<Robot>, StorageError> {
        Ok(lock(&self.robots)?.clone())
    }

    pub fn find_robot(&self, id: Uuid) -> Result<Robot, StorageError> {
        lock(&self.robots)?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Load catalog entries from a JSON array; all-or-nothing
    pub fn seed_robots_from_json(&self, json: &str) -> Result<usize, StorageError> {
        let entries: Vec<NewRobot> =
            serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let robots = entries
            .into_iter()
            .map(NewRobot::into_robot)
            .collect::<Result<Vec<_>, _>>()?;

        let count = robots.len();
        lock(&self.robots)?.extend(robots);
        info!("Seeded {} catalog entries", count);
        Ok(count)
    }

    // ---- Orders ----

    pub fn create_order(&self, user_id: Uuid, new: NewOrder) -> Result<Order, StorageError> {
        let order = new.into_order(user_id, Utc::now())?;
        lock(&self.orders)?.push(order.clone());
        info!(
            "Order {} placed by {}: {} items, total {:.2}",
            order.id,
            user_id,
            order.items.len(),
            order.total_amount
        );
        Ok(order)
    }

    /// Orders of one user, newest first
    pub fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StorageError> {
        let orders = lock(&self.orders)?;
        let mut mine: Vec<Order> = orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    // ---- Stats ----

    pub fn user_count(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or(0)
    }

    pub fn robot_count(&self) -> usize {
        self.robots.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().map(|o| o.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut users) = self.users.lock() {
            users.clear();
        }
        if let Ok(mut robots) = self.robots.lock() {
            robots.clear();
        }
        if let Ok(mut orders) = self.orders.lock() {
            orders.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::item;
    use crate::models::{CustomerInfo, PaymentMethod};
    use proptest::prelude::*;

    fn order(items: Vec<crate::OrderItem>) -> NewOrder {
        NewOrder {
            items,
            customer_info: Some(CustomerInfo {
                name: "Sam".into(),
                address: "1 Main St".into(),
                phone: "555".into(),
            }),
            payment_method: Some(PaymentMethod::Online),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_insert_and_lookup() {
        let repo = Repository::new();
        let user = repo
            .create_user(NewUser::local("Sam", "Sam@Example.com ", "hash"))
            .unwrap();
        assert_eq!(user.email, "sam@example.com");

        let found = repo.find_user_by_email("SAM@example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(repo.find_user(user.id).unwrap().unwrap().name, "Sam");
        assert!(repo.find_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let repo = Repository::new();
        repo.create_user(NewUser::local("A", "a@example.com", "h")).unwrap();
        let err = repo
            .create_user(NewUser::local("B", "a@example.com", "h"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));
        assert_eq!(repo.user_count(), 1);
    }

    #[test]
    fn test_google_upsert_links_existing_account() {
        let repo = Repository::new();
        let local = repo.create_user(NewUser::local("Sam", "sam@example.com", "h")).unwrap();
        let profile = OAuthProfile {
            provider_id: "g-123".into(),
            email: "sam@example.com".into(),
            name: "Sam G".into(),
            picture: Some("https://img/sam.png".into()),
            email_verified: true,
        };

        let linked = repo.upsert_google_user(&profile).unwrap();
        assert_eq!(linked.id, local.id);
        assert_eq!(linked.google_id.as_deref(), Some("g-123"));
        assert!(linked.is_email_verified);
        assert_eq!(linked.auth_provider, AuthProvider::Local);

        // Second login finds the same account by Google id
        let again = repo.upsert_google_user(&profile).unwrap();
        assert_eq!(again.id, local.id);
        assert_eq!(repo.user_count(), 1);
    }

    #[test]
    fn test_google_upsert_creates_user() {
        let repo = Repository::new();
        let user = repo
            .upsert_google_user(&OAuthProfile {
                provider_id: "g-9".into(),
                email: "new@example.com".into(),
                name: "New".into(),
                picture: None,
                email_verified: false,
            })
            .unwrap();
        assert_eq!(user.auth_provider, AuthProvider::Google);
        assert!(user.is_oauth_user());
        assert!(!user.can_login_with_password());
    }

    #[test]
    fn test_concurrent_first_google_logins_share_one_account() {
        let repo = Repository::new();
        let profile = OAuthProfile {
            provider_id: "g-77".into(),
            email: "race@example.com".into(),
            name: "Race".into(),
            picture: None,
            email_verified: true,
        };

        let ids: Vec<Uuid> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| repo.upsert_google_user(&profile)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap().id)
                .collect()
        });

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(repo.user_count(), 1);
    }

    #[test]
    fn test_seed_catalog() {
        let repo = Repository::new();
        let json = r#"[
            {"name": "Hexapod", "description": "Six legs", "price": 499, "image": "h.png",
             "specifications": {"legs": 6}, "category": "walker"},
            {"name": "Arm", "description": "6-DOF arm", "price": 899.5, "image": "a.png",
             "specifications": {"dof": 6}, "category": "manipulator"}
        ]"#;
        assert_eq!(repo.seed_robots_from_json(json).unwrap(), 2);
        let robots = repo.list_robots().unwrap();
        assert_eq!(robots[1].name, "Arm");
        assert_eq!(repo.find_robot(robots[0].id).unwrap().price, 499.0);
        assert!(matches!(repo.find_robot(Uuid::new_v4()), Err(StorageError::NotFound)));
    }

    #[test]
    fn test_seed_is_all_or_nothing() {
        let repo = Repository::new();
        let json = r#"[{"name": "Hexapod"}]"#;
        assert!(repo.seed_robots_from_json(json).is_err());
        assert_eq!(repo.robot_count(), 0);
        assert!(matches!(
            repo.seed_robots_from_json("not json"),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_orders_newest_first_per_user() {
        let repo = Repository::new();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let first = repo.create_order(me, order(vec![item(1.0, 1)])).unwrap();
        repo.create_order(other, order(vec![item(2.0, 1)])).unwrap();
        let second = repo.create_order(me, order(vec![item(3.0, 1)])).unwrap();

        let mine = repo.orders_for_user(me).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);
        assert_eq!(mine[1].id, first.id);
        assert_eq!(repo.order_count(), 3);
    }

    proptest! {
        #[test]
        fn prop_order_total_is_sum_of_lines(
            lines in prop::collection::vec((0u32..10_000, 1u32..20), 1..8)
        ) {
            let repo = Repository::new();
            let items = lines.iter().map(|&(cents, qty)| item(cents as f64 / 100.0, qty)).collect();
            let placed = repo.create_order(Uuid::new_v4(), order(items)).unwrap();
            let expected: f64 = lines.iter().map(|&(c, q)| c as f64 / 100.0 * q as f64).sum();
            prop_assert!((placed.total_amount - expected).abs() < 1e-6);
        }
    }
}
