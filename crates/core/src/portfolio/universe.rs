use crate::error::{AdvisoryError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub label: String,
    pub expected_return: f64,
}

/// Fixed, ordered set of investable assets with their return/covariance assumptions.
/// `covariance[i][j]` is index-aligned with `assets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetUniverse {
    pub assets: Vec<Asset>,
    pub covariance: Vec<Vec<f64>>,
}

impl Default for AssetUniverse {
    fn default() -> Self {
        let asset = |id: &str, label: &str, expected_return: f64| Asset {
            id: id.to_string(),
            label: label.to_string(),
            expected_return,
        };
        Self {
            assets: vec![
                asset("growth_equity", "Saham Growth", 0.15),
                asset("bluechip_equity", "Bluechip", 0.10),
                asset("bonds", "Obligasi", 0.05),
            ],
            covariance: vec![
                vec![0.10, 0.02, 0.01],
                vec![0.02, 0.08, 0.01],
                vec![0.01, 0.01, 0.03],
            ],
        }
    }
}

impl AssetUniverse {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn expected_returns(&self) -> Vec<f64> {
        self.assets.iter().map(|a| a.expected_return).collect()
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.assets.is_empty() {
            return Err(AdvisoryError::invalid(
                "asset_universe",
                "universe must contain at least one asset",
            ));
        }

        let mut seen = BTreeSet::new();
        for asset in &self.assets {
            let id = asset.id.trim();
            if id.is_empty() {
                return Err(AdvisoryError::invalid("asset_universe", "asset id must be non-empty"));
            }
            if !seen.insert(id) {
                return Err(AdvisoryError::invalid(
                    "asset_universe",
                    format!("duplicate asset id: {id}"),
                ));
            }
        }

        validate_covariance(&self.covariance, self.len())?;
        validate_returns(&self.expected_returns(), self.len())
    }
}

pub(crate) fn validate_returns(expected_returns: &[f64], n: usize) -> CoreResult<()> {
    if expected_returns.len() != n {
        return Err(AdvisoryError::invalid(
            "expected_returns",
            format!("expected {n} returns (got {})", expected_returns.len()),
        ));
    }
    if let Some(r) = expected_returns.iter().find(|r| !r.is_finite()) {
        return Err(AdvisoryError::invalid(
            "expected_returns",
            format!("returns must be finite (got {r})"),
        ));
    }
    Ok(())
}

/// Shape, finiteness, symmetry and non-negative variances. Definiteness is left to the
/// factorization, which reports it as a numerical failure.
pub(crate) fn validate_covariance(covariance: &[Vec<f64>], n: usize) -> CoreResult<()> {
    if covariance.len() != n {
        return Err(AdvisoryError::invalid(
            "covariance",
            format!("covariance must have {n} rows (got {})", covariance.len()),
        ));
    }

    let mut scale: f64 = 0.0;
    for (i, row) in covariance.iter().enumerate() {
        if row.len() != n {
            return Err(AdvisoryError::invalid(
                "covariance",
                format!("covariance row {i} must have {n} columns (got {})", row.len()),
            ));
        }
        for &v in row {
            if !v.is_finite() {
                return Err(AdvisoryError::invalid(
                    "covariance",
                    format!("covariance entries must be finite (got {v} in row {i})"),
                ));
            }
            scale = scale.max(v.abs());
        }
        if row[i] < 0.0 {
            return Err(AdvisoryError::invalid(
                "covariance",
                format!("variance of asset {i} must be >= 0 (got {})", row[i]),
            ));
        }
    }

    let tol = 1e-12 * scale.max(1.0);
    for i in 0..n {
        for j in (i + 1)..n {
            if (covariance[i][j] - covariance[j][i]).abs() > tol {
                return Err(AdvisoryError::invalid(
                    "covariance",
                    format!(
                        "covariance must be symmetric: [{i}][{j}]={} but [{j}][{i}]={}",
                        covariance[i][j], covariance[j][i]
                    ),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_universe_is_valid() {
        let u = AssetUniverse::default();
        u.validate().unwrap();
        assert_eq!(u.len(), 3);
        assert_eq!(u.expected_returns(), vec![0.15, 0.10, 0.05]);
        assert_eq!(u.assets[2].label, "Obligasi");
    }

    #[test]
    fn rejects_asymmetric_covariance() {
        let mut u = AssetUniverse::default();
        u.covariance[0][1] = 0.05;
        let err = u.validate().unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("symmetric"));
    }

    #[test]
    fn rejects_ragged_or_negative_variance() {
        let mut u = AssetUniverse::default();
        u.covariance[1].pop();
        assert!(u.validate().is_err());

        let mut u = AssetUniverse::default();
        u.covariance[2][2] = -0.01;
        assert!(u.validate().unwrap_err().to_string().contains("variance"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut u = AssetUniverse::default();
        u.assets[1].id = "growth_equity".to_string();
        assert!(u.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn deserializes_from_json() {
        let v = serde_json::json!({
            "assets": [
                {"id": "a", "label": "A", "expected_return": 0.1},
                {"id": "b", "label": "B", "expected_return": 0.2}
            ],
            "covariance": [[0.04, 0.0], [0.0, 0.09]]
        });
        let u: AssetUniverse = serde_json::from_value(v).unwrap();
        u.validate().unwrap();
        assert_eq!(u.len(), 2);
    }
}
