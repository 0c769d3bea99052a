//! Stored documents and their creation payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::StorageError;

/// How a user authenticates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Local,
    Google,
}

/// Registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// bcrypt hash; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn can_login_with_password(&self) -> bool {
        self.auth_provider == AuthProvider::Local && self.password_hash.is_some()
    }

    pub fn is_oauth_user(&self) -> bool {
        self.auth_provider != AuthProvider::Local
    }
}

/// User creation payload
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_email_verified: bool,
}

impl NewUser {
    /// Local account with an already hashed password
    pub fn local(name: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: Some(password_hash.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(StorageError::validation("User", &missing));
        }
        match self.auth_provider {
            AuthProvider::Local if self.password_hash.as_deref().map_or(true, str::is_empty) => Err(
                StorageError::Validation("Password is required for local authentication".into()),
            ),
            AuthProvider::Google if self.google_id.as_deref().map_or(true, str::is_empty) => Err(
                StorageError::Validation("Google ID is required for Google authentication".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// Identity returned by an OAuth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthProfile {
    pub provider_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub email_verified: bool,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub specifications: Value,
    pub category: String,
}

/// Catalog creation payload; every field is required
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewRobot {
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub image: String,
    pub specifications: Option<Value>,
    pub category: String,
}

impl NewRobot {
    /// Validate into a stored robot
    pub fn into_robot(self) -> Result<Robot, StorageError> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("image", &self.image),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        let price = self.price.filter(|p| p.is_finite() && *p >= 0.0);
        if price.is_none() {
            missing.push("price");
        }
        let specifications = self.specifications.filter(Value::is_object);
        if specifications.is_none() {
            missing.push("specifications");
        }
        if !missing.is_empty() {
            return Err(StorageError::validation("Robot", &missing));
        }

        Ok(Robot {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            price: price.unwrap_or_default(),
            image: self.image,
            specifications: specifications.unwrap_or_default(),
            category: self.category,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Cod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
}

/// Product snapshot inside an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    /// Catalog product id
    #[serde(rename = "_id")]
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub description: String,
    pub category: String,
    pub quantity: u32,
}

impl OrderItem {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("_id", &self.product_id),
            ("name", &self.name),
            ("image", &self.image),
            ("description", &self.description),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if !self.price.is_finite() || self.price < 0.0 {
            missing.push("price");
        }
        missing
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub items: Vec<OrderItem>,
    pub customer_info: CustomerInfo,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub total_amount: f64,
    pub user_id: Uuid,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order creation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub customer_info: Option<CustomerInfo>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub total_amount: Option<f64>,
}

impl NewOrder {
    /// Validate into an order owned by `user_id`.
    ///
    /// With items present the total is recomputed as Σ price × quantity and
    /// any client-supplied total is ignored.
    pub fn into_order(self, user_id: Uuid, now: DateTime<Utc>) -> Result<Order, StorageError> {
        for (i, item) in self.items.iter().enumerate() {
            let missing = item.missing_fields();
            if !missing.is_empty() {
                return Err(StorageError::validation(&format!("Order item {}", i), &missing));
            }
            if item.quantity < 1 {
                return Err(StorageError::Validation(format!(
                    "Order item {}: quantity must be at least 1",
                    i
                )));
            }
        }

        let customer_info = self.customer_info.unwrap_or_default();
        let mut missing = Vec::new();
        for (field, value) in [
            ("customerInfo.name", &customer_info.name),
            ("customerInfo.address", &customer_info.address),
            ("customerInfo.phone", &customer_info.phone),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if self.payment_method.is_none() {
            missing.push("paymentMethod");
        }

        let total_amount = if self.items.is_empty() {
            self.total_amount.filter(|t| t.is_finite())
        } else {
            Some(self.items.iter().map(OrderItem::line_total).sum())
        };
        if total_amount.is_none() {
            missing.push("totalAmount");
        }
        let (Some(payment_method), Some(total_amount), true) =
            (self.payment_method, total_amount, missing.is_empty())
        else {
            return Err(StorageError::validation("Order", &missing));
        };

        Ok(Order {
            id: Uuid::new_v4(),
            items: self.items,
            customer_info,
            payment_method,
            payment_status: self.payment_status.unwrap_or_default(),
            total_amount,
            user_id,
            order_status: OrderStatus::Processing,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn item(price: f64, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: "r1".into(),
            name: "Hexapod".into(),
            price,
            image: "hexapod.png".into(),
            description: "Six legs".into(),
            category: "walker".into(),
            quantity,
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Sam".into(),
            address: "1 Main St".into(),
            phone: "555-0100".into(),
        }
    }

    #[test]
    fn test_user_json_hides_password() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Sam".into(),
            email: "sam@example.com".into(),
            password_hash: Some("$2b$10$hash".into()),
            google_id: None,
            profile_picture: None,
            auth_provider: AuthProvider::Local,
            is_email_verified: false,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["authProvider"], "local");
        assert!(value.get("_id").is_some());
    }

    #[test]
    fn test_local_user_requires_password() {
        let user = NewUser {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            ..Default::default()
        };
        assert!(matches!(user.validate(), Err(StorageError::Validation(_))));
        assert!(NewUser::local("Sam", "sam@example.com", "h").validate().is_ok());
    }

    #[test]
    fn test_google_user_requires_google_id() {
        let user = NewUser {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            auth_provider: AuthProvider::Google,
            ..Default::default()
        };
        let err = user.validate().unwrap_err();
        assert_eq!(err.to_string(), "Google ID is required for Google authentication");
    }

    #[test]
    fn test_robot_requires_every_field() {
        let robot: NewRobot = serde_json::from_value(json!({
            "name": "Hexapod",
            "description": "Six legs",
            "price": 499.0,
            "image": "hexapod.png",
            "category": "walker"
        }))
        .unwrap();
        let err = robot.into_robot().unwrap_err();
        assert!(err.to_string().contains("specifications"));

        let robot: NewRobot = serde_json::from_value(json!({
            "name": "Hexapod",
            "description": "Six legs",
            "price": 499.0,
            "image": "hexapod.png",
            "specifications": { "legs": 6 },
            "category": "walker"
        }))
        .unwrap();
        assert_eq!(robot.into_robot().unwrap().specifications["legs"], 6);
    }

    #[test]
    fn test_order_total_recomputed() {
        let order = NewOrder {
            items: vec![item(10.0, 2), item(2.5, 4)],
            customer_info: Some(customer()),
            payment_method: Some(PaymentMethod::Cod),
            total_amount: Some(1.0),
            ..Default::default()
        }
        .into_order(Uuid::new_v4(), Utc::now())
        .unwrap();
        assert_eq!(order.total_amount, 30.0);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.order_status, OrderStatus::Processing);
    }

    #[test]
    fn test_order_rejects_zero_quantity() {
        let result = NewOrder {
            items: vec![item(10.0, 0)],
            customer_info: Some(customer()),
            payment_method: Some(PaymentMethod::Online),
            ..Default::default()
        }
        .into_order(Uuid::new_v4(), Utc::now());
        assert!(matches!(result, Err(StorageError::Validation(_))));
    }

    #[test]
    fn test_order_requires_customer_and_payment() {
        let err = NewOrder {
            items: vec![item(1.0, 1)],
            ..Default::default()
        }
        .into_order(Uuid::new_v4(), Utc::now())
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("customerInfo.name"));
        assert!(message.contains("paymentMethod"));
    }

    #[test]
    fn test_order_json_shape() {
        let order: NewOrder = serde_json::from_value(json!({
            "items": [{
                "_id": "r1", "name": "Hexapod", "price": 100.0, "image": "h.png",
                "description": "d", "category": "c", "quantity": 3
            }],
            "customerInfo": { "name": "Sam", "address": "1 Main St", "phone": "555" },
            "paymentMethod": "online",
            "paymentStatus": "paid"
        }))
        .unwrap();
        let order = order.into_order(Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(order.total_amount, 300.0);
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["orderStatus"], "processing");
        assert_eq!(value["paymentStatus"], "paid");
        assert_eq!(value["items"][0]["_id"], "r1");
    }
}
