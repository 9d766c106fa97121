use crate::schemas::{api_error, compute_error, ApiError, ApiResponse, AppState, CachedData};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::{format_brl, StatementDto, StatementRowDto};
use compute::values::yearly_statement;
use model::AccountKind;
use tracing::{debug, instrument, trace, warn};

/// Yearly statement of one report section
#[utoipa::path(
    get,
    path = "/api/v1/statements/{kind}/{year}",
    tag = "statements",
    params(
        ("kind" = String, Path, description = "Balance, IncomeStatement (dre) or WorkingCapital"),
        ("year" = i32, Path, description = "Year"),
    ),
    responses(
        (status = 200, description = "Statement retrieved successfully", body = ApiResponse<StatementDto>),
        (status = 404, description = "Unknown report section", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_statement(
    Path((kind, year)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatementDto>>, ApiError> {
    trace!("Entering get_statement function");
    let kind: AccountKind = kind.parse().map_err(|e: String| {
        warn!("Unknown statement kind: {}", e);
        api_error(StatusCode::NOT_FOUND, "NOT_FOUND", e)
    })?;

    // Create cache key
    let cache_key = format!("statement_{}_{}", kind, year);

    // Check cache first
    if let Some(CachedData::Statement(statement)) = state.cache.get(&cache_key).await {
        debug!("Statement {} served from cache", cache_key);
        return Ok(Json(ApiResponse::ok(
            statement,
            "Statement retrieved from cache",
        )));
    }

    let rows = yearly_statement(&state.db, kind, year)
        .await
        .map_err(compute_error)?;

    let statement = StatementDto {
        kind: kind.to_string(),
        year,
        rows: rows
            .into_iter()
            .map(|row| StatementRowDto {
                account_id: row.account_id,
                name: row.name,
                group_name: row.group_name,
                is_manual: row.is_manual,
                formatted: row.values.iter().copied().map(format_brl).collect(),
                values: row.values.to_vec(),
            })
            .collect(),
    };

    // Cache the result
    state
        .cache
        .insert(cache_key, CachedData::Statement(statement.clone()))
        .await;

    Ok(Json(ApiResponse::ok(
        statement,
        "Statement retrieved successfully",
    )))
}
