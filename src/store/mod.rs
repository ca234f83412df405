//! Persistence port for the storefront.
//!
//! Services talk to the database only through [`Store`]. [`PgStore`] is the
//! production adapter; [`MemoryStore`] keeps the same semantics in process memory.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CartItem, CartLine, Category, Order, OrderItemLine, OrderStatus, OrderWithItems, Product, User,
};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(DbErr),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("stale read: {0}")]
    Stale(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
            _ => StoreError::Db(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A user row together with its stored password hash.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_admin: bool,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UserPatch {
    /// Trim every field. A blank field becomes `None` and leaves the stored value alone.
    pub fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            email: trimmed(self.email),
            phone: trimmed(self.phone),
            address: trimmed(self.address),
            city: trimmed(self.city),
            postal_code: trimmed(self.postal_code),
            country: trimmed(self.country),
        }
    }

    /// Merge the patch into an in-memory user record.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(address) = &self.address {
            user.address = Some(address.clone());
        }
        if let Some(city) = &self.city {
            user.city = Some(city.clone());
        }
        if let Some(postal_code) = &self.postal_code {
            user.postal_code = Some(postal_code.clone());
        }
        if let Some(country) = &self.country {
            user.country = Some(country.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub category: Category,
    pub stock: i32,
    pub featured: bool,
    pub is_new: bool,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub rating: f64,
    pub sales: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub category: Option<Category>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub is_new: Option<bool>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
}

impl ProductPatch {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(original_price) = self.original_price {
            product.original_price = Some(original_price);
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(is_new) = self.is_new {
            product.is_new = is_new;
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
    }
}

/// Catalog query. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub category: Option<Category>,
    pub featured: Option<bool>,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let search_ok = match self.search.as_deref().filter(|s| !s.is_empty()) {
            Some(term) => product.name.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        };
        let category_ok = self.category.is_none_or(|c| c == product.category);
        let featured_ok = self.featured.is_none_or(|f| f == product.featured);
        search_ok && category_ok && featured_ok
    }
}

/// Order query. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.is_none_or(|id| id == order.user_id)
            && self.status.is_none_or(|s| s == order.status)
    }
}

/// Everything needed to commit one checkout.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: Uuid,
    pub order_number: String,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub lines: Vec<OrderLineDraft>,
}

/// One order line plus the cart row (and the quantity read from it) it consumes.
#[derive(Debug, Clone)]
pub struct OrderLineDraft {
    pub cart_item_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductTotals {
    pub count: u64,
    pub stock: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrderTotals {
    pub count: u64,
    pub sales: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<Credentials>>;
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>>;

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<(Vec<Product>, u64)>;
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn insert_product(&self, new_product: NewProduct) -> StoreResult<Product>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
    async fn product_totals(&self) -> StoreResult<ProductTotals>;

    /// Cart rows for `user_id` joined with the current product, oldest first.
    async fn cart_lines(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;
    /// Insert the (user, product) row or add `quantity` to the existing one, atomically.
    async fn add_cart_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartItem>;
    async fn set_cart_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<CartItem>>;
    async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<u64>;
    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<u64>;

    /// Insert the order and its lines and consume the drafted cart rows in one unit.
    ///
    /// If any drafted cart row is gone or its quantity changed since the draft was
    /// read, nothing is written and [`StoreError::Stale`] is returned.
    async fn place_order(&self, draft: OrderDraft) -> StoreResult<OrderWithItems>;
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<(Vec<Order>, u64)>;
    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn order_lines(&self, order_id: Uuid) -> StoreResult<Vec<OrderItemLine>>;
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> StoreResult<Option<Order>>;
    async fn order_totals(&self) -> StoreResult<OrderTotals>;

    async fn record_audit(&self, entry: AuditEntry) -> StoreResult<()>;
}
