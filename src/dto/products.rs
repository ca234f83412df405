use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{Category, Product},
    store::{NewProduct, ProductPatch},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub category: Category,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_new: bool,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            name: req.name,
            price: req.price,
            original_price: req.original_price,
            category: req.category,
            stock: req.stock,
            featured: req.featured,
            is_new: req.is_new,
            image_url: req.image_url.filter(|s| !s.is_empty()),
            description: req.description.filter(|s| !s.is_empty()),
            rating: 0.0,
            sales: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
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

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: req.name,
            price: req.price,
            original_price: req.original_price,
            category: req.category,
            stock: req.stock,
            featured: req.featured,
            is_new: req.is_new,
            image_url: req.image_url,
            description: req.description,
            rating: req.rating,
        }
    }
}

/// A catalog entry as shown to shoppers.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub discount_percent: u32,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let discount_percent = product.discount_percent();
        Self {
            product,
            discount_percent,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductView>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub total_sales: Decimal,
    pub total_stock: i64,
}
