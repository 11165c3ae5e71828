use crate::domain::risk::RiskTier;
use crate::error::{AdvisoryError, CoreResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MONTHLY_INFLATION: f64 = 0.003;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnAssumption {
    pub monthly_rate: f64,
    pub monthly_inflation_rate: f64,
}

/// Expected monthly return per tier. Inflation is a single constant shared by all tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnAssumptionTable {
    pub conservative_monthly_rate: f64,
    pub moderate_monthly_rate: f64,
    pub aggressive_monthly_rate: f64,
    pub monthly_inflation_rate: f64,
}

impl Default for ReturnAssumptionTable {
    fn default() -> Self {
        Self {
            conservative_monthly_rate: 0.008,
            moderate_monthly_rate: 0.015,
            aggressive_monthly_rate: 0.03,
            monthly_inflation_rate: DEFAULT_MONTHLY_INFLATION,
        }
    }
}

impl ReturnAssumptionTable {
    pub fn validate(&self) -> CoreResult<()> {
        let rates = [
            ("conservative_monthly_rate", self.conservative_monthly_rate),
            ("moderate_monthly_rate", self.moderate_monthly_rate),
            ("aggressive_monthly_rate", self.aggressive_monthly_rate),
            ("monthly_inflation_rate", self.monthly_inflation_rate),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() || rate < 0.0 {
                return Err(AdvisoryError::invalid(
                    "return_assumptions",
                    format!("{name} must be a finite rate >= 0 (got {rate})"),
                ));
            }
        }
        Ok(())
    }

    pub fn lookup(&self, tier: RiskTier) -> ReturnAssumption {
        let monthly_rate = match tier {
            RiskTier::Conservative => self.conservative_monthly_rate,
            RiskTier::Moderate => self.moderate_monthly_rate,
            RiskTier::Aggressive => self.aggressive_monthly_rate,
        };
        ReturnAssumption {
            monthly_rate,
            monthly_inflation_rate: self.monthly_inflation_rate,
        }
    }
}
