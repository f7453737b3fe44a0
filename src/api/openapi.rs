//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    auth, dashboard, declarations, health, items, messages, restitutions, stations, users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lost & Found API",
        version = "0.3.0",
        description = "Municipal lost and found service REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        // Items
        items::list_items,
        items::get_item,
        items::delete_item,
        items::recent_items,
        // Declarations
        declarations::create_declaration,
        declarations::update_declaration,
        declarations::delete_declaration,
        declarations::list_lost,
        declarations::list_found,
        declarations::list_mine,
        declarations::list_claimed,
        declarations::get_declaration,
        declarations::report_found,
        declarations::claim,
        // Restitutions
        restitutions::schedule,
        restitutions::list_restitutions,
        restitutions::list_mine,
        restitutions::get_restitution,
        restitutions::complete,
        restitutions::cancel,
        restitutions::delete_restitution,
        restitutions::reopen,
        restitutions::download_proof,
        restitutions::verify,
        // Stations
        stations::list_stations,
        stations::create_station,
        stations::update_station,
        stations::delete_station,
        // Users
        users::list_users,
        users::create_officer,
        users::create_admin,
        users::update_user,
        users::delete_user,
        users::ban_user,
        users::unban_user,
        // Messages
        messages::submit_contact,
        messages::list_messages,
        messages::reply_message,
        messages::list_notifications,
        messages::mark_notification_read,
        // Dashboards
        dashboard::admin_dashboard,
        dashboard::officer_dashboard,
        dashboard::citizen_dashboard,
    ),
    components(
        schemas(
            health::HealthResponse,
            crate::error::ErrorResponse,
            // Enums
            crate::models::enums::ItemState,
            crate::models::enums::DeclarationKind,
            crate::models::enums::RestitutionStatus,
            crate::models::enums::Role,
            // Users
            crate::models::user::User,
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            crate::models::user::UpdateProfile,
            crate::models::user::CreateOfficer,
            crate::models::user::CreateAdmin,
            crate::models::user::UpdateUser,
            crate::models::user::OfficerCreated,
            // Items
            crate::models::item::ItemDetails,
            crate::models::item::ItemPage,
            crate::models::item::StateChange,
            crate::models::item::RecentItems,
            // Declarations
            crate::models::declaration::Declaration,
            crate::models::declaration::DeclarationSummary,
            crate::models::declaration::DeclarationDetails,
            crate::models::declaration::Participant,
            crate::models::declaration::CreateDeclaration,
            crate::models::declaration::UpdateDeclaration,
            crate::models::declaration::ScheduleRestitution,
            // Restitutions
            crate::models::restitution::RestitutionDetails,
            crate::models::restitution::RestitutionVerification,
            // Stations
            crate::models::station::PoliceStation,
            crate::models::station::CreateStation,
            crate::models::station::UpdateStation,
            // Messages
            crate::models::message::ContactMessage,
            crate::models::message::CreateContactMessage,
            crate::models::message::ReplyMessage,
            crate::models::message::Notification,
            // Dashboards
            crate::models::dashboard::StateCount,
            crate::models::dashboard::MonthlyDeclarations,
            crate::models::dashboard::AdminDashboard,
            crate::models::dashboard::OfficerDashboard,
            crate::models::dashboard::CitizenDashboard,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and profile"),
        (name = "items", description = "Lost and found items"),
        (name = "declarations", description = "Lost and found declarations"),
        (name = "restitutions", description = "Handover of items to their owner"),
        (name = "stations", description = "Police stations"),
        (name = "users", description = "Account management"),
        (name = "messages", description = "Contact form and notifications"),
        (name = "dashboard", description = "Figures per role")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by secured paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

/// Create OpenAPI router with Swagger UI
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn document_lists_workflow_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/declarations/{id}/found",
            "/declarations/{id}/claim",
            "/declarations/{id}/restitution",
            "/restitutions/{id}/complete",
            "/restitutions/{id}/reopen",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
