use crate::schemas::{compute_error, ApiError, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    response::Json,
};
use common::{CalculationResultDto, CalculationWarningDto};
use compute::{CalculationOutcome, Period};
use tracing::{info, instrument, trace};

pub(crate) fn calculation_dto(outcome: &CalculationOutcome) -> CalculationResultDto {
    let period = outcome.period();
    let (skipped_reason, overridden) = match outcome {
        CalculationOutcome::Computed(report) => (None, report.overridden.clone()),
        CalculationOutcome::SkippedHistorical { cutoff_year, .. } => (
            Some(format!("historical period: years before {} are frozen", cutoff_year)),
            Vec::new(),
        ),
    };

    CalculationResultDto {
        month: period.month(),
        year: period.year(),
        skipped: outcome.is_skipped(),
        skipped_reason,
        computed: outcome.computed_count(),
        overridden,
        warnings: outcome
            .warnings()
            .iter()
            .map(|warning| CalculationWarningDto {
                account_id: warning.account_id,
                account_name: warning.account_name.clone(),
                message: warning.message.clone(),
            })
            .collect(),
    }
}

/// Recalculate every derived account of a period
#[utoipa::path(
    post,
    path = "/api/v1/periods/{year}/{month}/calculate",
    tag = "calculations",
    params(
        ("year" = i32, Path, description = "Year"),
        ("month" = i32, Path, description = "Month (1-12)"),
    ),
    responses(
        (status = 200, description = "Period recalculated or skipped as historical", body = ApiResponse<CalculationResultDto>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn calculate_period(
    Path((year, month)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CalculationResultDto>>, ApiError> {
    trace!("Entering calculate_period function");
    let period = Period::from_db(month, year).map_err(compute_error)?;

    let outcome = state
        .calculator
        .calculate_period(&state.db, period)
        .await
        .map_err(compute_error)?;
    if !outcome.is_skipped() {
        state.cache.invalidate_all();
    }

    info!(
        "Calculation for {} finished: {} computed, skipped: {}",
        period,
        outcome.computed_count(),
        outcome.is_skipped()
    );
    let message = if outcome.is_skipped() {
        "Historical period, nothing was recalculated"
    } else {
        "Period recalculated successfully"
    };
    Ok(Json(ApiResponse::ok(calculation_dto(&outcome), message)))
}
