//! Common transport-layer types shared by the HTTP handlers and the CLI.
//! These structs are the request/response payloads of the reporting API.

pub mod money;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use money::format_brl;

// ===================== Accounts =====================

/// A line of the chart of accounts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AccountDto {
    pub id: i32,
    pub name: String,
    pub group_name: Option<String>,
    /// `Balance`, `IncomeStatement` or `WorkingCapital`.
    pub kind: String,
    /// Absent for manually entered accounts.
    pub formula: Option<String>,
    pub is_manual: bool,
    pub recurrence_source_id: Option<i32>,
}

// ===================== Values =====================

/// Stored values of one period, keyed by account id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PeriodValuesDto {
    pub month: u32,
    pub year: i32,
    pub values: BTreeMap<i32, f64>,
}

/// Manual values to save for a period, keyed by account id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct SaveValuesRequest {
    pub values: BTreeMap<i32, f64>,
}

/// An entry that was not saved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RejectedValueDto {
    pub account_id: i32,
    pub value: f64,
    pub reason: String,
}

/// Result of a manual save followed by recalculation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SaveValuesResponse {
    pub saved: usize,
    pub rejected: Vec<RejectedValueDto>,
    pub calculation: CalculationResultDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PurgeResultDto {
    pub month: u32,
    pub year: i32,
    pub deleted: u64,
}

// ===================== Calculation =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CalculationWarningDto {
    pub account_id: i32,
    pub account_name: String,
    pub message: String,
}

/// Outcome of recalculating one period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CalculationResultDto {
    pub month: u32,
    pub year: i32,
    /// True when the period is historical and nothing was computed.
    pub skipped: bool,
    pub skipped_reason: Option<String>,
    pub computed: usize,
    pub overridden: Vec<i32>,
    pub warnings: Vec<CalculationWarningDto>,
}

// ===================== Statements =====================

/// One account line with January to December values.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StatementRowDto {
    pub account_id: i32,
    pub name: String,
    pub group_name: Option<String>,
    pub is_manual: bool,
    pub values: Vec<f64>,
    /// `values` formatted as BRL.
    pub formatted: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StatementDto {
    pub kind: String,
    pub year: i32,
    pub rows: Vec<StatementRowDto>,
}

// ===================== Overrides =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OverrideDto {
    pub id: i32,
    pub account_id: i32,
    pub month: u32,
    pub year: i32,
    pub value: f64,
    pub note: Option<String>,
}

/// Creates or replaces the override of a derived account for one period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UpsertOverrideRequest {
    pub account_id: i32,
    pub month: u32,
    pub year: i32,
    pub value: f64,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_request_accepts_string_keys() {
        let request: SaveValuesRequest =
            serde_json::from_str(r#"{"values": {"1": 1500.5, "29": -20}}"#).unwrap();
        assert_eq!(request.values.get(&1), Some(&1500.5));
        assert_eq!(request.values.get(&29), Some(&-20.0));
    }

    #[test]
    fn test_calculation_result_shape() {
        let result = CalculationResultDto {
            month: 1,
            year: 2024,
            skipped: true,
            skipped_reason: Some("historical period".to_string()),
            computed: 0,
            overridden: vec![],
            warnings: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["skipped"], true);
        assert_eq!(json["computed"], 0);
    }
}
