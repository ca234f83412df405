use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{
        audit_logs::ActiveModel as AuditActive,
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    models::{
        CartItem, CartLine, CartProduct, Order, OrderItem, OrderItemLine, OrderStatus,
        OrderWithItems, Product, ProductSummary, User,
    },
};

use super::{
    AuditEntry, Credentials, NewProduct, NewUser, OrderDraft, OrderFilter, OrderTotals,
    ProductFilter, ProductPatch, ProductTotals, Store, StoreError, StoreResult, UserPatch,
};

/// [`Store`] backed by PostgreSQL through SeaORM.
#[derive(Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.db)
            .await?
            .map(user_from_entity);
        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let model = Users::find()
            .filter(UserCol::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(|model| {
            let password_hash = model.password_hash.clone();
            Credentials {
                user: user_from_entity(model),
                password_hash,
            }
        }))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let count = Users::find()
            .filter(UserCol::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let user = UserActive {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            phone: Set(new_user.phone),
            address: Set(None),
            city: Set(None),
            postal_code: Set(None),
            country: Set(None),
            is_admin: Set(new_user.is_admin),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(user_from_entity(user))
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>> {
        let existing = match Users::find_by_id(id).one(&self.db).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        let mut active: UserActive = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = patch.address {
            active.address = Set(Some(address));
        }
        if let Some(city) = patch.city {
            active.city = Set(Some(city));
        }
        if let Some(postal_code) = patch.postal_code {
            active.postal_code = Set(Some(postal_code));
        }
        if let Some(country) = patch.country {
            active.country = Set(Some(country));
        }
        active.updated_at = Set(Utc::now().into());

        let user = active.update(&self.db).await?;
        Ok(Some(user_from_entity(user)))
    }

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<(Vec<Product>, u64)> {
        let mut condition = Condition::all();
        if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
            let pattern = LikeExpr::new(like_pattern(search)).escape('\\');
            condition = condition.add(Expr::col(ProdCol::Name).ilike(pattern));
        }
        if let Some(category) = filter.category {
            condition = condition.add(ProdCol::Category.eq(category.as_str()));
        }
        if let Some(featured) = filter.featured {
            condition = condition.add(ProdCol::Featured.eq(featured));
        }

        let finder = Products::find()
            .filter(condition)
            .order_by_desc(ProdCol::CreatedAt);
        let total = finder.clone().count(&self.db).await?;

        let mut paged = finder.offset(filter.offset);
        if let Some(limit) = filter.limit {
            paged = paged.limit(limit);
        }
        let items = paged
            .all(&self.db)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Products::find_by_id(id)
            .one(&self.db)
            .await?
            .map(product_from_entity)
            .transpose()
    }

    async fn insert_product(&self, new_product: NewProduct) -> StoreResult<Product> {
        let now = Utc::now();
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(new_product.name),
            price: Set(new_product.price),
            original_price: Set(new_product.original_price),
            category: Set(new_product.category.as_str().to_string()),
            stock: Set(new_product.stock),
            featured: Set(new_product.featured),
            is_new: Set(new_product.is_new),
            image_url: Set(new_product.image_url),
            description: Set(new_product.description),
            rating: Set(new_product.rating),
            sales: Set(new_product.sales),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;
        product_from_entity(product)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let existing = match Products::find_by_id(id).one(&self.db).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let mut active: ProductActive = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(original_price) = patch.original_price {
            active.original_price = Set(Some(original_price));
        }
        if let Some(category) = patch.category {
            active.category = Set(category.as_str().to_string());
        }
        if let Some(stock) = patch.stock {
            active.stock = Set(stock);
        }
        if let Some(featured) = patch.featured {
            active.featured = Set(featured);
        }
        if let Some(is_new) = patch.is_new {
            active.is_new = Set(is_new);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        active.updated_at = Set(Utc::now().into());

        let product = active.update(&self.db).await?;
        product_from_entity(product).map(Some)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn product_totals(&self) -> StoreResult<ProductTotals> {
        let count = Products::find().count(&self.db).await?;
        let stock: Option<i64> = Products::find()
            .select_only()
            .column_as(Expr::col(ProdCol::Stock).sum(), "stock")
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await?
            .flatten();
        Ok(ProductTotals {
            count,
            stock: stock.unwrap_or(0),
        })
    }

    async fn cart_lines(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let rows = CartItems::find()
            .find_also_related(Products)
            .filter(CartCol::UserId.eq(user_id))
            .order_by_asc(CartCol::CreatedAt)
            .all(&self.db)
            .await?;

        let lines = rows
            .into_iter()
            .filter_map(|(item, product)| product.map(|product| cart_line(item, product)))
            .collect();
        Ok(lines)
    }

    async fn add_cart_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        let now = Utc::now();
        let active = CartActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let item = CartItems::insert(active)
            .on_conflict(
                OnConflict::columns([CartCol::UserId, CartCol::ProductId])
                    .value(
                        CartCol::Quantity,
                        Expr::cust("cart_items.quantity + EXCLUDED.quantity"),
                    )
                    .value(CartCol::UpdatedAt, Expr::cust("EXCLUDED.updated_at"))
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await?;
        Ok(cart_item_from_entity(item))
    }

    async fn set_cart_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<CartItem>> {
        let existing = CartItems::find()
            .filter(
                Condition::all()
                    .add(CartCol::Id.eq(item_id))
                    .add(CartCol::UserId.eq(user_id)),
            )
            .one(&self.db)
            .await?;
        let existing = match existing {
            Some(item) => item,
            None => return Ok(None),
        };

        let mut active: CartActive = existing.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now().into());
        let item = active.update(&self.db).await?;
        Ok(Some(cart_item_from_entity(item)))
    }

    async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<u64> {
        let result = CartItems::delete_many()
            .filter(CartCol::Id.eq(item_id))
            .filter(CartCol::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = CartItems::delete_many()
            .filter(CartCol::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn place_order(&self, draft: OrderDraft) -> StoreResult<OrderWithItems> {
        // Dropping `txn` without commit rolls every write back.
        let txn = self.db.begin().await?;

        for line in &draft.lines {
            let consumed = CartItems::delete_many()
                .filter(CartCol::Id.eq(line.cart_item_id))
                .filter(CartCol::UserId.eq(draft.user_id))
                .filter(CartCol::Quantity.eq(line.quantity))
                .exec(&txn)
                .await?;
            if consumed.rows_affected != 1 {
                return Err(StoreError::Stale(
                    "cart changed while the order was being placed".into(),
                ));
            }
        }

        let now = Utc::now();
        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(draft.user_id),
            order_number: Set(draft.order_number),
            total_amount: Set(draft.total_amount),
            shipping_address: Set(draft.shipping_address),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let item = OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                total_price: Set(line.total_price),
            }
            .insert(&txn)
            .await?;
            items.push(order_item_from_entity(item));
        }

        txn.commit().await?;

        Ok(OrderWithItems {
            order: order_from_entity(order)?,
            items,
        })
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<(Vec<Order>, u64)> {
        let mut condition = Condition::all();
        if let Some(user_id) = filter.user_id {
            condition = condition.add(OrderCol::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }

        let finder = Orders::find()
            .filter(condition)
            .order_by_desc(OrderCol::CreatedAt);
        let total = finder.clone().count(&self.db).await?;

        let mut paged = finder.offset(filter.offset);
        if let Some(limit) = filter.limit {
            paged = paged.limit(limit);
        }
        let orders = paged
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((orders, total))
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Orders::find_by_id(id)
            .one(&self.db)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn order_lines(&self, order_id: Uuid) -> StoreResult<Vec<OrderItemLine>> {
        let rows = OrderItems::find()
            .find_also_related(Products)
            .filter(OrderItemCol::OrderId.eq(order_id))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| OrderItemLine {
                item: order_item_from_entity(item),
                product: product.map(|p| ProductSummary {
                    name: p.name,
                    image_url: p.image_url,
                }),
            })
            .collect())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let existing = match Orders::find_by_id(id).one(&self.db).await? {
            Some(o) => o,
            None => return Ok(None),
        };

        let mut active: OrderActive = existing.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&self.db).await?;
        order_from_entity(order).map(Some)
    }

    async fn order_totals(&self) -> StoreResult<OrderTotals> {
        let count = Orders::find().count(&self.db).await?;
        let sales: Option<Decimal> = Orders::find()
            .select_only()
            .column_as(Expr::col(OrderCol::TotalAmount).sum(), "sales")
            .into_tuple::<Option<Decimal>>()
            .one(&self.db)
            .await?
            .flatten();
        Ok(OrderTotals {
            count,
            sales: sales.unwrap_or(Decimal::ZERO),
        })
    }

    async fn record_audit(&self, entry: AuditEntry) -> StoreResult<()> {
        AuditActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            resource: Set(entry.resource),
            metadata: Set(entry.metadata),
            created_at: NotSet,
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        name: model.name,
        phone: model.phone,
        address: model.address,
        city: model.city,
        postal_code: model.postal_code,
        country: model.country,
        is_admin: model.is_admin,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn product_from_entity(model: ProductModel) -> StoreResult<Product> {
    let category = model
        .category
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("product {}: {e}", model.id)))?;
    Ok(Product {
        id: model.id,
        name: model.name,
        price: model.price,
        original_price: model.original_price,
        category,
        stock: model.stock,
        featured: model.featured,
        is_new: model.is_new,
        image_url: model.image_url,
        description: model.description,
        rating: model.rating,
        sales: model.sales,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn cart_item_from_entity(model: CartModel) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn cart_line(item: CartModel, product: ProductModel) -> CartLine {
    CartLine {
        id: item.id,
        user_id: item.user_id,
        product_id: item.product_id,
        quantity: item.quantity,
        created_at: item.created_at.with_timezone(&Utc),
        updated_at: item.updated_at.with_timezone(&Utc),
        product: CartProduct {
            id: product.id,
            name: product.name,
            price: product.price,
            image_url: product.image_url,
            stock: product.stock,
        },
    }
}

fn order_from_entity(model: OrderModel) -> StoreResult<Order> {
    let status = model
        .status
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("order {}: {e}", model.id)))?;
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        order_number: model.order_number,
        total_amount: model.total_amount,
        shipping_address: model.shipping_address,
        status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
    }
}

/// `%term%` with LIKE wildcards in `term` matched literally. Backslash is the
/// escape character passed with the pattern.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
