use crate::schemas::{api_error, compute_error, ApiError, ApiResponse, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{OverrideDto, UpsertOverrideRequest};
use compute::{overrides, Period};
use model::entities::period_override;
use serde::Deserialize;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query parameters for listing overrides
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct OverrideQuery {
    /// Only overrides of this year
    #[validate(range(min = 1900, max = 9999))]
    pub year: Option<i32>,
}

fn override_dto(model: period_override::Model) -> OverrideDto {
    OverrideDto {
        id: model.id,
        account_id: model.account_id,
        month: u32::try_from(model.month).unwrap_or_default(),
        year: model.year,
        value: model.value,
        note: model.note,
    }
}

fn override_not_found(override_id: i32) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("Override {} not found", override_id),
    )
}

/// Recalculates the period an override belongs to so stored values follow
/// the override immediately. Historical periods are left untouched.
async fn recalculate(state: &AppState, period: Period) -> Result<(), ApiError> {
    let outcome = state
        .calculator
        .calculate_period(&state.db, period)
        .await
        .map_err(compute_error)?;
    debug!(
        "Recalculated {} after override change: {} computed, skipped: {}",
        period,
        outcome.computed_count(),
        outcome.is_skipped()
    );
    state.cache.invalidate_all();
    Ok(())
}

/// List overrides
#[utoipa::path(
    get,
    path = "/api/v1/overrides",
    tag = "overrides",
    params(OverrideQuery),
    responses(
        (status = 200, description = "Overrides retrieved successfully", body = ApiResponse<Vec<OverrideDto>>),
        (status = 400, description = "Invalid query", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_overrides(
    Valid(Query(query)): Valid<Query<OverrideQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OverrideDto>>>, ApiError> {
    trace!("Entering get_overrides function");

    let rows = overrides::list_overrides(&state.db, query.year)
        .await
        .map_err(compute_error)?;
    debug!("Found {} overrides", rows.len());

    let data = rows.into_iter().map(override_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Overrides retrieved successfully")))
}

/// Create or replace the override of a derived account for one period
///
/// The period is recalculated right away unless it is historical.
#[utoipa::path(
    put,
    path = "/api/v1/overrides",
    tag = "overrides",
    request_body = UpsertOverrideRequest,
    responses(
        (status = 200, description = "Override saved", body = ApiResponse<OverrideDto>),
        (status = 400, description = "Invalid period or account", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn upsert_override(
    State(state): State<AppState>,
    Json(request): Json<UpsertOverrideRequest>,
) -> Result<Json<ApiResponse<OverrideDto>>, ApiError> {
    trace!("Entering upsert_override function");
    let period = Period::new(request.month, request.year).map_err(compute_error)?;

    let saved = {
        let _guard = state.calculator.locks().acquire(period).await;
        overrides::upsert_override(
            &state.db,
            request.account_id,
            period,
            request.value,
            request.note,
        )
        .await
        .map_err(compute_error)?
    };
    recalculate(&state, period).await?;

    info!("Override {} saved for account {} in {}", saved.id, saved.account_id, period);
    Ok(Json(ApiResponse::ok(override_dto(saved), "Override saved successfully")))
}

/// Delete an override
#[utoipa::path(
    delete,
    path = "/api/v1/overrides/{override_id}",
    tag = "overrides",
    params(
        ("override_id" = i32, Path, description = "Override ID"),
    ),
    responses(
        (status = 200, description = "Override deleted", body = ApiResponse<OverrideDto>),
        (status = 404, description = "Override not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_override(
    Path(override_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OverrideDto>>, ApiError> {
    trace!("Entering delete_override function");

    let Some(existing) = overrides::find_override(&state.db, override_id)
        .await
        .map_err(compute_error)?
    else {
        warn!("Override {} not found", override_id);
        return Err(override_not_found(override_id));
    };
    let period = Period::from_db(existing.month, existing.year).map_err(compute_error)?;

    let deleted = {
        let _guard = state.calculator.locks().acquire(period).await;
        overrides::delete_override(&state.db, override_id)
            .await
            .map_err(compute_error)?
    };
    // Removed concurrently while waiting for the lock
    let Some(deleted) = deleted else {
        warn!("Override {} disappeared before deletion", override_id);
        return Err(override_not_found(override_id));
    };
    recalculate(&state, period).await?;

    info!("Override {} deleted", override_id);
    Ok(Json(ApiResponse::ok(override_dto(deleted), "Override deleted successfully")))
}
