use std::{env, str::FromStr};

use rust_decimal::Decimal;
use uuid::Uuid;
use xtech_storefront::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    models::Category,
    services::auth_service::hash_password,
    store::{NewProduct, NewUser, PgStore, Store},
};

struct DemoProduct {
    name: &'static str,
    price: &'static str,
    original_price: Option<&'static str>,
    category: Category,
    stock: i32,
    featured: bool,
    is_new: bool,
    rating: f64,
    description: &'static str,
}

const CATALOG: &[DemoProduct] = &[
    DemoProduct {
        name: "Nova X1 Smartphone",
        price: "799.99",
        original_price: Some("899.99"),
        category: Category::Smartphones,
        stock: 40,
        featured: true,
        is_new: true,
        rating: 4.7,
        description: "6.5\" OLED display, 256 GB storage",
    },
    DemoProduct {
        name: "Pixelbook Air 14",
        price: "1299.00",
        original_price: None,
        category: Category::Laptops,
        stock: 15,
        featured: true,
        is_new: false,
        rating: 4.5,
        description: "Lightweight 14\" laptop with all-day battery",
    },
    DemoProduct {
        name: "Slate 11 Tablet",
        price: "449.50",
        original_price: Some("499.00"),
        category: Category::Tablets,
        stock: 25,
        featured: false,
        is_new: true,
        rating: 4.2,
        description: "11\" tablet with stylus support",
    },
    DemoProduct {
        name: "Pulse ANC Headphones",
        price: "199.99",
        original_price: Some("249.99"),
        category: Category::Audio,
        stock: 60,
        featured: true,
        is_new: false,
        rating: 4.6,
        description: "Over-ear headphones with active noise cancelling",
    },
    DemoProduct {
        name: "Orbit Watch 2",
        price: "19.99",
        original_price: None,
        category: Category::Wearables,
        stock: 100,
        featured: false,
        is_new: false,
        rating: 3.9,
        description: "Fitness band with heart-rate tracking",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let store = PgStore::new(orm);

    let admin_password = env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let user_password = env::var("SEED_USER_PASSWORD").unwrap_or_else(|_| "user123".into());

    let admin_id = ensure_user(&store, "Store Admin", "admin@xtech.local", &admin_password, true).await?;
    let user_id = ensure_user(&store, "Demo Customer", "user@xtech.local", &user_password, false).await?;
    seed_products(&store).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    store: &PgStore,
    name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = store.find_credentials_by_email(email).await? {
        println!("User {email} already present");
        return Ok(existing.user.id);
    }

    let user = store
        .insert_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            phone: None,
            is_admin,
        })
        .await?;
    println!("Created user {email} (admin={is_admin})");
    Ok(user.id)
}

async fn seed_products(store: &PgStore) -> anyhow::Result<()> {
    if store.product_totals().await?.count > 0 {
        println!("Catalog already populated, skipping products");
        return Ok(());
    }

    for demo in CATALOG {
        store
            .insert_product(NewProduct {
                name: demo.name.to_string(),
                price: Decimal::from_str(demo.price)?,
                original_price: demo.original_price.map(Decimal::from_str).transpose()?,
                category: demo.category,
                stock: demo.stock,
                featured: demo.featured,
                is_new: demo.is_new,
                image_url: None,
                description: Some(demo.description.to_string()),
                rating: demo.rating,
                sales: 0,
            })
            .await?;
    }

    println!("Seeded {} products", CATALOG.len());
    Ok(())
}
