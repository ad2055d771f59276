//! OpenAPI documentation configuration.
//!
//! Served through Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    admin_handler, auth_handler, health_handler, jewelry_handler, order_handler, user_handler,
};
use crate::domain::{
    CatalogStats, Category, CreatedBy, DashboardOverview, DashboardStats, DeliveryAddress,
    DimensionUnit, Dimensions, Gender, GroupStat, ImageRef, JewelryResponse, JewelryUpdate,
    Material, NewJewelry, OrderConfirmation, OrderItem, ProfileUpdate, Subcategory, UserResponse,
    UserRole, WeightUnit,
};
use crate::types::{MessageResponse, PaginationMeta};

/// OpenAPI documentation for the Jewelry Showcase API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jewelry Showcase API",
        version = "0.1.0",
        description = "Catalog, accounts and order confirmations for the jewelry storefront",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        health_handler::health,
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::firebase_auth,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        auth_handler::get_profile,
        auth_handler::update_profile,
        auth_handler::change_password,
        auth_handler::logout,
        // User management
        user_handler::list_users,
        user_handler::get_user,
        user_handler::update_role,
        user_handler::toggle_user_status,
        user_handler::promote_admin,
        // Catalog
        jewelry_handler::list_jewelry,
        jewelry_handler::search_jewelry,
        jewelry_handler::featured_jewelry,
        jewelry_handler::catalog_stats,
        jewelry_handler::jewelry_by_category,
        jewelry_handler::get_jewelry,
        // Admin
        admin_handler::dashboard_stats,
        admin_handler::list_all_jewelry,
        admin_handler::create_jewelry,
        admin_handler::update_jewelry,
        admin_handler::delete_jewelry,
        admin_handler::toggle_jewelry_status,
        // Orders
        order_handler::confirm_order,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            ProfileUpdate,
            Category,
            Subcategory,
            Gender,
            Material,
            WeightUnit,
            DimensionUnit,
            Dimensions,
            ImageRef,
            CreatedBy,
            JewelryResponse,
            NewJewelry,
            JewelryUpdate,
            CatalogStats,
            DashboardOverview,
            DashboardStats,
            GroupStat,
            OrderConfirmation,
            OrderItem,
            DeliveryAddress,
            MessageResponse,
            PaginationMeta,
            // Handler types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::FirebaseAuthRequest,
            auth_handler::ChangePasswordRequest,
            auth_handler::ForgotPasswordRequest,
            auth_handler::ResetPasswordRequest,
            auth_handler::AuthResponse,
            auth_handler::ForgotPasswordResponse,
            user_handler::UpdateRoleRequest,
            user_handler::PromoteAdminRequest,
            user_handler::UserMessageResponse,
            jewelry_handler::JewelryListResponse,
            health_handler::HealthResponse,
            health_handler::ServiceHealth,
            health_handler::ServiceStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Registration, login and password recovery"),
        (name = "Account", description = "The signed-in user's own account"),
        (name = "Users", description = "User administration"),
        (name = "Catalog", description = "Public jewelry catalog"),
        (name = "Admin", description = "Catalog administration"),
        (name = "Orders", description = "Order confirmation emails")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Local token from /api/auth/login or an identity-provider ID token",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_catalog_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/jewelry/{id}"));
        assert!(doc.paths.paths.contains_key("/api/admin/jewelry"));
        assert!(doc.paths.paths.contains_key("/api/auth/users/{userId}/role"));
    }
}
