use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
        orders::{CheckoutRequest, OrderList, UpdateOrderStatusRequest},
        products::{
            CreateProductRequest, DashboardStats, ProductList, ProductView, UpdateProductRequest,
        },
        users::UpdateProfileRequest,
    },
    models::{
        CartItem, CartLine, CartProduct, Category, CustomerSummary, Order, OrderDetails,
        OrderItem, OrderItemLine, OrderStatus, OrderWithItems, Product, ProductSummary, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        profile::get_profile,
        profile::update_profile,
        profile::my_orders,
        products::list_products,
        products::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        admin::dashboard_stats,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status
    ),
    components(
        schemas(
            User,
            Category,
            OrderStatus,
            Product,
            ProductView,
            ProductSummary,
            CartItem,
            CartProduct,
            CartLine,
            CartView,
            Order,
            OrderItem,
            OrderItemLine,
            OrderWithItems,
            OrderDetails,
            CustomerSummary,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            AddToCartRequest,
            UpdateQuantityRequest,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            CreateProductRequest,
            UpdateProductRequest,
            DashboardStats,
            OrderList,
            ProductList,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<ProductView>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderDetails>,
            ApiResponse<OrderList>,
            ApiResponse<DashboardStats>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Auth", description = "Registration and sign-in"),
        (name = "Profile", description = "Current user's account and order history"),
        (name = "Products", description = "Public catalog"),
        (name = "Cart", description = "Shopping cart of the current user"),
        (name = "Orders", description = "Checkout and order lookup"),
        (name = "Admin", description = "Catalog, order and dashboard management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
