use axum::{http::StatusCode, response::Json};
use common::{
    AccountDto, CalculationResultDto, CalculationWarningDto, OverrideDto, PeriodValuesDto,
    PurgeResultDto, RejectedValueDto, SaveValuesRequest, SaveValuesResponse, StatementDto,
    StatementRowDto, UpsertOverrideRequest,
};
use compute::{ComputeError, PeriodCalculator};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive read models, cleared on every write
    pub cache: Cache<String, CachedData>,
    /// Period calculator; clones share the per-period locks
    pub calculator: PeriodCalculator,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Statement(StatementDto),
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Builds an error response with the given status and code
pub fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Maps compute errors onto HTTP statuses and error codes
pub fn compute_error(err: ComputeError) -> ApiError {
    match err {
        ComputeError::InvalidPeriod { .. } => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_PERIOD", err.to_string())
        }
        ComputeError::Account(message) => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_ACCOUNT", message)
        }
        ComputeError::Database(db_error) => {
            error!("Database error: {}", db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database operation failed",
            )
        }
        other => {
            error!("Compute error: {}", other);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMPUTE_ERROR",
                other.to_string(),
            )
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::accounts::get_accounts,
        crate::handlers::values::get_period_values,
        crate::handlers::values::save_period_values,
        crate::handlers::values::purge_period_values,
        crate::handlers::calculations::calculate_period,
        crate::handlers::statements::get_statement,
        crate::handlers::overrides::get_overrides,
        crate::handlers::overrides::upsert_override,
        crate::handlers::overrides::delete_override,
    ),
    components(
        schemas(
            ApiResponse<Vec<AccountDto>>,
            ApiResponse<PeriodValuesDto>,
            ApiResponse<SaveValuesResponse>,
            ApiResponse<PurgeResultDto>,
            ApiResponse<CalculationResultDto>,
            ApiResponse<StatementDto>,
            ApiResponse<Vec<OverrideDto>>,
            ApiResponse<OverrideDto>,
            ErrorResponse,
            HealthResponse,
            AccountDto,
            PeriodValuesDto,
            SaveValuesRequest,
            SaveValuesResponse,
            RejectedValueDto,
            PurgeResultDto,
            CalculationResultDto,
            CalculationWarningDto,
            StatementDto,
            StatementRowDto,
            OverrideDto,
            UpsertOverrideRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Chart of accounts"),
        (name = "values", description = "Monthly values and manual data entry"),
        (name = "calculations", description = "Derived account recalculation"),
        (name = "statements", description = "Yearly reports"),
        (name = "overrides", description = "Per-period overrides of derived accounts"),
    ),
    info(
        title = "FinReport API",
        description = "Monthly financial reporting with formula-derived accounts",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
