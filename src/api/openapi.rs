//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, loans, settings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Equipment Loan API",
        version = "0.1.0",
        description = "Equipment borrowing, return and loss tracking REST API",
        license(name = "GPL-2.0", url = "https://www.gnu.org/licenses/gpl-2.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Settings
        settings::get_settings,
        // Loans
        loans::list_loans,
        loans::register_loan,
        loans::get_statistics,
        loans::get_loan,
        loans::get_history,
        loans::return_loan,
        loans::mark_lost,
        loans::extend_due_date,
    ),
    components(
        schemas(
            // Loans
            crate::models::enums::LoanStatus,
            crate::models::enums::HistoryEventType,
            crate::models::loan::RegisterLoan,
            crate::models::loan::ReturnLoan,
            crate::models::loan::ExtendLoan,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanShort,
            crate::models::loan::LoanStatistics,
            crate::models::history::LoanHistoryEntry,
            loans::LoanListResponse,
            // Settings
            crate::config::LoanPolicy,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Equipment loan lifecycle"),
        (name = "settings", description = "Loan policy")
    )
)]
pub struct ApiDoc;

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
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
