use crate::handlers::calculations::calculation_dto;
use crate::schemas::{compute_error, ApiError, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    response::Json,
};
use common::{PeriodValuesDto, PurgeResultDto, RejectedValueDto, SaveValuesRequest, SaveValuesResponse};
use compute::{values, Period};
use tracing::{debug, info, instrument, trace};

/// Get every stored value of a period
#[utoipa::path(
    get,
    path = "/api/v1/periods/{year}/{month}/values",
    tag = "values",
    params(
        ("year" = i32, Path, description = "Year"),
        ("month" = i32, Path, description = "Month (1-12)"),
    ),
    responses(
        (status = 200, description = "Values retrieved successfully", body = ApiResponse<PeriodValuesDto>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_period_values(
    Path((year, month)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PeriodValuesDto>>, ApiError> {
    trace!("Entering get_period_values function");
    let period = Period::from_db(month, year).map_err(compute_error)?;

    let values = values::period_values(&state.db, period)
        .await
        .map_err(compute_error)?;
    debug!("Found {} values for {}", values.len(), period);

    let data = PeriodValuesDto {
        month: period.month(),
        year: period.year(),
        values,
    };
    Ok(Json(ApiResponse::ok(data, "Values retrieved successfully")))
}

/// Save manual values for a period and recalculate it
///
/// Values for derived or unknown accounts are rejected and reported; the
/// rest of the batch is saved.
#[utoipa::path(
    put,
    path = "/api/v1/periods/{year}/{month}/values",
    tag = "values",
    params(
        ("year" = i32, Path, description = "Year"),
        ("month" = i32, Path, description = "Month (1-12)"),
    ),
    request_body = SaveValuesRequest,
    responses(
        (status = 200, description = "Values saved and period recalculated", body = ApiResponse<SaveValuesResponse>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn save_period_values(
    Path((year, month)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<SaveValuesRequest>,
) -> Result<Json<ApiResponse<SaveValuesResponse>>, ApiError> {
    trace!("Entering save_period_values function");
    let period = Period::from_db(month, year).map_err(compute_error)?;
    debug!("Saving {} values for {}", request.values.len(), period);

    let entries: Vec<(i32, f64)> = request.values.into_iter().collect();
    let (saved, outcome) = state
        .calculator
        .save_and_recalculate(&state.db, period, &entries)
        .await
        .map_err(compute_error)?;
    state.cache.invalidate_all();

    info!(
        "Saved {} values for {}, rejected {}, computed {}",
        saved.saved,
        period,
        saved.rejected.len(),
        outcome.computed_count()
    );

    let data = SaveValuesResponse {
        saved: saved.saved,
        rejected: saved
            .rejected
            .into_iter()
            .map(|entry| RejectedValueDto {
                account_id: entry.account_id,
                value: entry.value,
                reason: entry.reason.to_string(),
            })
            .collect(),
        calculation: calculation_dto(&outcome),
    };
    Ok(Json(ApiResponse::ok(data, "Values saved successfully")))
}

/// Delete every value of a period
#[utoipa::path(
    delete,
    path = "/api/v1/periods/{year}/{month}/values",
    tag = "values",
    params(
        ("year" = i32, Path, description = "Year"),
        ("month" = i32, Path, description = "Month (1-12)"),
    ),
    responses(
        (status = 200, description = "Period purged", body = ApiResponse<PurgeResultDto>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn purge_period_values(
    Path((year, month)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PurgeResultDto>>, ApiError> {
    trace!("Entering purge_period_values function");
    let period = Period::from_db(month, year).map_err(compute_error)?;

    let deleted = {
        let _guard = state.calculator.locks().acquire(period).await;
        values::purge_period(&state.db, period)
            .await
            .map_err(compute_error)?
    };
    state.cache.invalidate_all();

    info!("Purged {} values for {}", deleted, period);
    let data = PurgeResultDto {
        month: period.month(),
        year: period.year(),
        deleted,
    };
    Ok(Json(ApiResponse::ok(data, "Period purged successfully")))
}
