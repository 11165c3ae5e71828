use crate::domain::assumptions::ReturnAssumption;
use crate::domain::projection::{Horizon, ProjectionResult};
use crate::domain::risk::RiskTier;
use crate::market::signal::MarketRow;
use crate::portfolio::markowitz::AllocationWeights;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    /// Free-text description of what the user is saving for.
    #[serde(default)]
    pub goal: Option<String>,
    pub answers: Vec<i32>,
    pub initial_capital: i64,
    pub target_amount: i64,
    pub horizon: Horizon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRow {
    pub asset_id: String,
    pub label: String,
    /// Weight in percent, one decimal.
    pub weight_pct: f64,
    /// Share of the initial capital in whole currency units.
    pub amount: i64,
}

/// Everything one advisory request produces. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryResult {
    pub goal: Option<String>,
    pub initial_capital: i64,
    pub target_amount: i64,
    pub horizon_months: i64,

    pub questionnaire_total: i32,
    pub tier: RiskTier,
    pub tier_label: String,

    pub assumption: ReturnAssumption,
    pub monthly_return_pct: f64,
    pub monthly_inflation_pct: f64,

    pub projection: ProjectionResult,
    pub inflation_adjusted_target: f64,

    pub allocation: Vec<AllocationRow>,
    pub portfolio: AllocationWeights,

    pub market: Vec<MarketRow>,
    pub market_available: bool,
}

impl AdvisoryResult {
    pub fn required_monthly_contribution(&self) -> i64 {
        self.projection.required_monthly_contribution
    }

    pub fn is_feasible(&self) -> bool {
        self.projection.is_feasible
    }
}

/// Rounds half to even, so `12.25` becomes `12.2`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

pub fn rate_to_pct(rate: f64, decimals: i32) -> f64 {
    round_to(rate * 100.0, decimals)
}

/// `capital × weight`, truncated to whole currency units.
pub fn currency_amount(capital: i64, weight: f64) -> i64 {
    (capital as f64 * weight).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::projection::HorizonUnit;
    use serde_json::json;

    #[test]
    fn deserializes_request_with_localized_unit() {
        let v = json!({
            "goal": "Rumah",
            "answers": [3, 3, 2, 2, 3, 2, 3, 2],
            "initial_capital": 10_000_000,
            "target_amount": 50_000_000,
            "horizon": {"value": 5, "unit": "tahun"}
        });
        let req: AdvisoryRequest = serde_json::from_value(v).unwrap();
        assert_eq!(req.horizon.unit, HorizonUnit::Years);
        assert_eq!(req.goal.as_deref(), Some("Rumah"));
    }

    #[test]
    fn goal_is_optional() {
        let v = json!({
            "answers": [1, 1, 1, 1, 1, 1, 1, 1],
            "initial_capital": 0,
            "target_amount": 0,
            "horizon": {"value": 1, "unit": "months"}
        });
        let req: AdvisoryRequest = serde_json::from_value(v).unwrap();
        assert!(req.goal.is_none());
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(rate_to_pct(0.015, 2), 1.5);
        assert_eq!(rate_to_pct(0.003, 2), 0.3);
        assert_eq!(round_to(13.333_333, 1), 13.3);
        assert_eq!(round_to(68.888_888, 1), 68.9);
        assert_eq!(round_to(12.25, 1), 12.2);
        assert_eq!(round_to(12.35, 1), 12.4);
        assert_eq!(rate_to_pct(0.001_25, 2), 0.12);
        assert_eq!(currency_amount(10_000_000, 0.177_777_777_777_777_8), 1_777_777);
        assert_eq!(currency_amount(0, 0.5), 0);
    }
}
