use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    CartItem, CartLine, CartProduct, Order, OrderItem, OrderItemLine, OrderStatus,
    OrderWithItems, Product, ProductSummary, User,
};

use super::{
    AuditEntry, Credentials, NewProduct, NewUser, OrderDraft, OrderFilter, OrderTotals,
    ProductFilter, ProductPatch, ProductTotals, Store, StoreError, StoreResult, UserPatch,
};

#[derive(Default)]
struct Tables {
    users: Vec<Credentials>,
    products: Vec<Product>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    audit_logs: Vec<AuditEntry>,
}

/// Process-local [`Store`]. Every operation runs under one lock, so each call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promote an existing user to administrator. Returns false for an unknown id.
    pub async fn set_admin(&self, user_id: Uuid, is_admin: bool) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|c| c.user.id == user_id) {
            Some(credentials) => {
                credentials.user.is_admin = is_admin;
                true
            }
            None => false,
        }
    }

    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        self.tables.read().await.audit_logs.clone()
    }

    pub async fn cart_item_count(&self) -> usize {
        self.tables.read().await.cart_items.len()
    }
}

fn paginate<T>(rows: Vec<T>, limit: Option<u64>, offset: u64) -> Vec<T> {
    let skipped = rows.into_iter().skip(offset as usize);
    match limit {
        Some(limit) => skipped.take(limit as usize).collect(),
        None => skipped.collect(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|c| c.user.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().any(|c| c.user.email == email))
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|c| c.user.email == new_user.email) {
            return Err(StoreError::Conflict(format!(
                "users.email `{}` already exists",
                new_user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            name: new_user.name,
            phone: new_user.phone,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            is_admin: new_user.is_admin,
            created_at: Utc::now(),
        };
        tables.users.push(Credentials {
            user: user.clone(),
            password_hash: new_user.password_hash,
        });
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &patch.email {
            if tables
                .users
                .iter()
                .any(|c| c.user.id != id && &c.user.email == email)
            {
                return Err(StoreError::Conflict(format!(
                    "users.email `{email}` already exists"
                )));
            }
        }
        Ok(tables
            .users
            .iter_mut()
            .find(|c| c.user.id == id)
            .map(|credentials| {
                patch.apply_to(&mut credentials.user);
                credentials.user.clone()
            }))
    }

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<(Vec<Product>, u64)> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Product> = tables
            .products
            .iter()
            .rev()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = rows.len() as u64;
        Ok((paginate(rows, filter.limit, filter.offset), total))
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, new_product: NewProduct) -> StoreResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: new_product.name,
            price: new_product.price,
            original_price: new_product.original_price,
            category: new_product.category,
            stock: new_product.stock,
            featured: new_product.featured,
            is_new: new_product.is_new,
            image_url: new_product.image_url,
            description: new_product.description,
            rating: new_product.rating,
            sales: new_product.sales,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .map(|product| {
                patch.apply_to(product);
                product.updated_at = Utc::now();
                product.clone()
            }))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        let deleted = tables.products.len() != before;
        if deleted {
            tables.cart_items.retain(|c| c.product_id != id);
        }
        Ok(deleted)
    }

    async fn product_totals(&self) -> StoreResult<ProductTotals> {
        let tables = self.tables.read().await;
        Ok(ProductTotals {
            count: tables.products.len() as u64,
            stock: tables.products.iter().map(|p| i64::from(p.stock)).sum(),
        })
    }

    async fn cart_lines(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let tables = self.tables.read().await;
        let lines = tables
            .cart_items
            .iter()
            .filter(|item| item.user_id == user_id)
            .filter_map(|item| {
                let product = tables.products.iter().find(|p| p.id == item.product_id)?;
                Some(CartLine {
                    id: item.id,
                    user_id: item.user_id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    created_at: item.created_at,
                    updated_at: item.updated_at,
                    product: CartProduct {
                        id: product.id,
                        name: product.name.clone(),
                        price: product.price,
                        image_url: product.image_url.clone(),
                        stock: product.stock,
                    },
                })
            })
            .collect();
        Ok(lines)
    }

    async fn add_cart_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        if let Some(item) = tables
            .cart_items
            .iter_mut()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
        {
            item.quantity = item.quantity.checked_add(quantity).ok_or_else(|| {
                StoreError::OutOfRange(format!("cart quantity {} + {quantity}", item.quantity))
            })?;
            item.updated_at = now;
            return Ok(item.clone());
        }
        let item = CartItem {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        tables.cart_items.push(item.clone());
        Ok(item)
    }

    async fn set_cart_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<CartItem>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .cart_items
            .iter_mut()
            .find(|c| c.id == item_id && c.user_id == user_id)
            .map(|item| {
                item.quantity = quantity;
                item.updated_at = Utc::now();
                item.clone()
            }))
    }

    async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.cart_items.len();
        tables
            .cart_items
            .retain(|c| !(c.id == item_id && c.user_id == user_id));
        Ok((before - tables.cart_items.len()) as u64)
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.cart_items.len();
        tables.cart_items.retain(|c| c.user_id != user_id);
        Ok((before - tables.cart_items.len()) as u64)
    }

    async fn place_order(&self, draft: OrderDraft) -> StoreResult<OrderWithItems> {
        let mut tables = self.tables.write().await;

        let unchanged = draft.lines.iter().all(|line| {
            tables.cart_items.iter().any(|c| {
                c.id == line.cart_item_id
                    && c.user_id == draft.user_id
                    && c.quantity == line.quantity
            })
        });
        if !unchanged {
            return Err(StoreError::Stale(
                "cart changed while the order was being placed".into(),
            ));
        }
        if tables
            .orders
            .iter()
            .any(|o| o.order_number == draft.order_number)
        {
            return Err(StoreError::Conflict(format!(
                "orders.order_number `{}` already exists",
                draft.order_number
            )));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            order_number: draft.order_number,
            total_amount: draft.total_amount,
            shipping_address: draft.shipping_address,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = draft
            .lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total_price: line.total_price,
            })
            .collect();

        tables
            .cart_items
            .retain(|c| !draft.lines.iter().any(|l| l.cart_item_id == c.id));
        tables.orders.push(order.clone());
        tables.order_items.extend(items.iter().cloned());

        Ok(OrderWithItems { order, items })
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<(Vec<Order>, u64)> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Order> = tables
            .orders
            .iter()
            .rev()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = rows.len() as u64;
        Ok((paginate(rows, filter.limit, filter.offset), total))
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_lines(&self, order_id: Uuid) -> StoreResult<Vec<OrderItemLine>> {
        let tables = self.tables.read().await;
        Ok(tables
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .map(|item| OrderItemLine {
                item: item.clone(),
                product: tables
                    .products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|p| ProductSummary {
                        name: p.name.clone(),
                        image_url: p.image_url.clone(),
                    }),
            })
            .collect())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.iter_mut().find(|o| o.id == id).map(|order| {
            order.status = status;
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn order_totals(&self) -> StoreResult<OrderTotals> {
        let tables = self.tables.read().await;
        Ok(OrderTotals {
            count: tables.orders.len() as u64,
            sales: tables.orders.iter().map(|o| o.total_amount).sum::<Decimal>(),
        })
    }

    async fn record_audit(&self, entry: AuditEntry) -> StoreResult<()> {
        self.tables.write().await.audit_logs.push(entry);
        Ok(())
    }
}
