//! API handlers for the equipment loan REST endpoints

pub mod health;
pub mod loans;
pub mod openapi;
pub mod settings;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// JSON body whose rejections render as `AppError`
pub type ApiJson<T> = WithRejection<Json<T>, AppError>;

/// Path parameters whose rejections render as `AppError`
pub type ApiPath<T> = WithRejection<Path<T>, AppError>;

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Settings
        .route("/settings", get(settings::get_settings))
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::register_loan))
        .route("/loans/statistics", get(loans::get_statistics))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/history", get(loans::get_history))
        .route("/loans/:id/return", post(loans::return_loan))
        .route("/loans/:id/mark-lost", post(loans::mark_lost))
        .route("/loans/:id/extend", post(loans::extend_due_date))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{
        config::{AppConfig, AuthConfig, DatabaseConfig, LoanPolicy, LoggingConfig, ServerConfig},
        models::user::UserClaims,
        repository::MockLoanStore,
        services::Services,
        AppState,
    };

    pub const SECRET: &str = "test-secret";

    pub fn app(store: MockLoanStore, policy: LoanPolicy) -> Router {
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig {
                jwt_secret: SECRET.to_string(),
            },
            logging: LoggingConfig::default(),
            loans: policy.clone(),
        };
        let state = AppState {
            config: Arc::new(config),
            services: Arc::new(Services::new(Arc::new(store), policy)),
        };
        super::create_router(state)
    }

    pub fn bearer(claims: &UserClaims) -> String {
        format!("Bearer {}", claims.create_token(SECRET).unwrap())
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}
