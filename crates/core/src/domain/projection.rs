use crate::error::{AdvisoryError, CoreResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizonUnit {
    #[serde(alias = "tahun")]
    Years,
    #[serde(alias = "bulan")]
    Months,
}

impl FromStr for HorizonUnit {
    type Err = AdvisoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "years" | "year" | "tahun" => Ok(Self::Years),
            "months" | "month" | "bulan" => Ok(Self::Months),
            other => Err(AdvisoryError::invalid(
                "horizon_unit",
                format!("unknown horizon unit {other:?} (expected years or months)"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub value: i64,
    pub unit: HorizonUnit,
}

impl Horizon {
    pub fn months(value: i64) -> Self {
        Self {
            value,
            unit: HorizonUnit::Months,
        }
    }

    pub fn years(value: i64) -> Self {
        Self {
            value,
            unit: HorizonUnit::Years,
        }
    }

    /// Normalizes to whole months. Anything below one month is rejected.
    pub fn to_months(self) -> CoreResult<i64> {
        let months = match self.unit {
            HorizonUnit::Months => Some(self.value),
            HorizonUnit::Years => self.value.checked_mul(12),
        }
        .ok_or_else(|| {
            AdvisoryError::invalid("horizon", format!("horizon {} years overflows", self.value))
        })?;

        if months < 1 {
            return Err(AdvisoryError::invalid(
                "horizon",
                format!("horizon must be at least 1 month (got {months})"),
            ));
        }
        Ok(months)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionInput {
    pub initial_capital: i64,
    pub target_amount: i64,
    pub horizon_months: i64,
    pub monthly_rate: f64,
}

impl ProjectionInput {
    pub fn validate(&self) -> CoreResult<()> {
        if self.initial_capital < 0 {
            return Err(AdvisoryError::invalid(
                "initial_capital",
                format!("must be >= 0 (got {})", self.initial_capital),
            ));
        }
        if self.target_amount < 0 {
            return Err(AdvisoryError::invalid(
                "target_amount",
                format!("must be >= 0 (got {})", self.target_amount),
            ));
        }
        if self.horizon_months < 1 {
            return Err(AdvisoryError::invalid(
                "horizon",
                format!("horizon must be at least 1 month (got {})", self.horizon_months),
            ));
        }
        if !self.monthly_rate.is_finite() || self.monthly_rate < 0.0 {
            return Err(AdvisoryError::invalid(
                "monthly_rate",
                format!("must be a finite rate >= 0 (got {})", self.monthly_rate),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub required_monthly_contribution: i64,
    pub future_value_lump_sum: f64,
    pub future_value_annuity: f64,
    pub projected_future_value: f64,
    pub is_feasible: bool,
}

pub fn future_value_lump_sum(present_value: f64, monthly_rate: f64, months: i64) -> f64 {
    present_value * (1.0 + monthly_rate).powf(months as f64)
}

/// Future value of an ordinary annuity; a zero rate degenerates to `payment * months`.
/// `((1 + r)^n - 1) / r` is evaluated as `expm1(n·ln1p(r)) / r` so tiny rates don't cancel to 0.
pub fn future_value_annuity(payment: f64, monthly_rate: f64, months: i64) -> f64 {
    if monthly_rate == 0.0 {
        return payment * months as f64;
    }
    let growth = (months as f64 * monthly_rate.ln_1p()).exp_m1() / monthly_rate;
    payment * growth
}

/// Flat monthly saving needed to close the gap, floored to whole currency units.
pub fn required_monthly_contribution(initial_capital: i64, target_amount: i64, months: i64) -> i64 {
    let gap = target_amount.saturating_sub(initial_capital);
    gap.div_euclid(months.max(1)).max(0)
}

pub fn project(input: &ProjectionInput) -> CoreResult<ProjectionResult> {
    input.validate()?;

    let n = input.horizon_months;
    let r = input.monthly_rate;

    let contribution = required_monthly_contribution(input.initial_capital, input.target_amount, n);
    let lump = future_value_lump_sum(input.initial_capital as f64, r, n);
    let annuity = future_value_annuity(contribution as f64, r, n);
    let total = lump + annuity;

    if !total.is_finite() {
        return Err(AdvisoryError::numerical(
            "projection",
            format!("future value overflowed (rate={r}, months={n})"),
        ));
    }

    Ok(ProjectionResult {
        required_monthly_contribution: contribution,
        future_value_lump_sum: lump,
        future_value_annuity: annuity,
        projected_future_value: total,
        is_feasible: total >= input.target_amount as f64,
    })
}

/// Target restated in future prices. Informational only: feasibility stays nominal.
pub fn inflation_adjusted_target(target_amount: i64, monthly_inflation: f64, months: i64) -> f64 {
    target_amount as f64 * (1.0 + monthly_inflation).powf(months as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(capital: i64, target: i64, months: i64, rate: f64) -> ProjectionInput {
        ProjectionInput {
            initial_capital: capital,
            target_amount: target,
            horizon_months: months,
            monthly_rate: rate,
        }
    }

    #[test]
    fn five_year_moderate_goal() {
        let months = Horizon::years(5).to_months().unwrap();
        assert_eq!(months, 60);

        let res = project(&input(10_000_000, 50_000_000, months, 0.015)).unwrap();
        assert_eq!(res.required_monthly_contribution, 666_666);
        assert!((res.future_value_lump_sum - 24_432_197.756_897).abs() < 1e-3);
        assert!((res.future_value_annuity - 64_143_036.998_665).abs() < 1e-3);
        assert!((res.projected_future_value - 88_575_234.755_562).abs() < 1e-3);
        assert!(res.is_feasible);
    }

    #[test]
    fn zero_goal_is_trivially_feasible() {
        let res = project(&input(0, 0, 1, 0.015)).unwrap();
        assert_eq!(res.required_monthly_contribution, 0);
        assert_eq!(res.projected_future_value, 0.0);
        assert!(res.is_feasible);
    }

    #[test]
    fn zero_rate_annuity_is_contribution_times_months() {
        let res = project(&input(1_000, 13_000, 12, 0.0)).unwrap();
        assert_eq!(res.required_monthly_contribution, 1_000);
        assert_eq!(res.future_value_annuity, 12_000.0);
        assert_eq!(res.future_value_lump_sum, 1_000.0);
        assert!(res.is_feasible);
    }

    #[test]
    fn tiny_rate_annuity_matches_the_zero_rate_limit() {
        let res = project(&input(0, 1_200, 12, 1e-17)).unwrap();
        assert_eq!(res.required_monthly_contribution, 100);
        assert!((res.future_value_annuity - 1_200.0).abs() < 1e-9);
        assert!(res.is_feasible);

        let fv = future_value_annuity(100.0, 1e-10, 12);
        assert!((fv - 1_200.0).abs() < 1e-5, "fv={fv}");
    }

    #[test]
    fn contribution_floors_and_never_goes_negative() {
        assert_eq!(required_monthly_contribution(0, 100, 3), 33);
        assert_eq!(required_monthly_contribution(500, 100, 3), 0);
        assert_eq!(required_monthly_contribution(0, 100, 0), 100);
    }

    #[test]
    fn floored_contribution_can_leave_a_zero_rate_goal_short() {
        // 100 / 3 floors to 33; 33 * 3 = 99 < 100.
        let res = project(&input(0, 100, 3, 0.0)).unwrap();
        assert_eq!(res.projected_future_value, 99.0);
        assert!(!res.is_feasible);
    }

    #[test]
    fn capital_above_target_needs_no_contribution() {
        let res = project(&input(60_000_000, 50_000_000, 24, 0.008)).unwrap();
        assert_eq!(res.required_monthly_contribution, 0);
        assert_eq!(res.future_value_annuity, 0.0);
        assert!(res.projected_future_value > 60_000_000.0);
        assert!(res.is_feasible);
    }

    #[test]
    fn projecting_twice_is_bit_identical() {
        let i = input(7_500_000, 120_000_000, 180, 0.03);
        let a = project(&i).unwrap();
        let b = project(&i).unwrap();
        assert_eq!(
            a.projected_future_value.to_bits(),
            b.projected_future_value.to_bits()
        );
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_malformed_inputs() {
        assert!(project(&input(-1, 0, 1, 0.01)).unwrap_err().is_invalid_input());
        assert!(project(&input(0, -5, 1, 0.01)).unwrap_err().is_invalid_input());
        assert!(project(&input(0, 0, 0, 0.01)).unwrap_err().is_invalid_input());
        assert!(project(&input(0, 0, 1, -0.01)).unwrap_err().is_invalid_input());
        assert!(project(&input(0, 0, 1, f64::NAN)).is_err());
    }

    #[test]
    fn horizon_normalization() {
        assert_eq!(Horizon::months(7).to_months().unwrap(), 7);
        assert_eq!(Horizon::years(2).to_months().unwrap(), 24);
        assert!(Horizon::years(0).to_months().is_err());
        assert!(Horizon::months(-3).to_months().is_err());
        assert!(Horizon::years(i64::MAX).to_months().is_err());
    }

    #[test]
    fn parses_horizon_units() {
        assert_eq!("years".parse::<HorizonUnit>().unwrap(), HorizonUnit::Years);
        assert_eq!("Tahun".parse::<HorizonUnit>().unwrap(), HorizonUnit::Years);
        assert_eq!("bulan".parse::<HorizonUnit>().unwrap(), HorizonUnit::Months);
        assert!("weeks".parse::<HorizonUnit>().is_err());
    }

    #[test]
    fn inflation_adjusted_target_grows_with_horizon() {
        let real = inflation_adjusted_target(50_000_000, 0.003, 60);
        assert!((real - 59_844_740.147).abs() < 1e-2);
        assert_eq!(inflation_adjusted_target(50_000_000, 0.0, 60), 50_000_000.0);
    }
}
