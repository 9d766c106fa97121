use crate::schemas::{api_error, compute_error, ApiError, ApiResponse, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::AccountDto;
use compute::registry::{load_accounts, AccountFilter};
use model::{entities::account, AccountKind};
use serde::Deserialize;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query parameters for listing accounts
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct AccountQuery {
    /// Section filter: `Balance`, `IncomeStatement` (or `dre`), `WorkingCapital`
    #[validate(length(min = 1, max = 32))]
    pub kind: Option<String>,
    /// Only manual (`true`) or only derived (`false`) accounts
    pub manual: Option<bool>,
}

pub(crate) fn account_dto(model: account::Model) -> AccountDto {
    AccountDto {
        id: model.id,
        name: model.name,
        group_name: model.group_name,
        kind: model.kind.to_string(),
        formula: model.formula,
        is_manual: model.is_manual,
        recurrence_source_id: model.recurrence_source_id,
    }
}

/// List the chart of accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    params(AccountQuery),
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountDto>>),
        (status = 400, description = "Invalid filter", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts(
    Valid(Query(query)): Valid<Query<AccountQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    trace!("Entering get_accounts function");

    let kind = match query.kind.as_deref().map(str::parse::<AccountKind>) {
        None => None,
        Some(Ok(kind)) => Some(kind),
        Some(Err(e)) => {
            warn!("Invalid account kind filter: {}", e);
            return Err(api_error(StatusCode::BAD_REQUEST, "INVALID_KIND", e));
        }
    };
    debug!("Listing accounts with kind {:?}, manual {:?}", kind, query.manual);

    let accounts = load_accounts(
        &state.db,
        AccountFilter {
            kind,
            manual: query.manual,
        },
    )
    .await
    .map_err(compute_error)?;

    info!("Retrieved {} accounts", accounts.len());
    let data: Vec<AccountDto> = accounts.into_iter().map(account_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Accounts retrieved successfully")))
}
