//! Long-only minimum-variance allocation.
//!
//! Solves `min wᵀΣw` subject to `Σw = 1` and `w >= 0` with a primal active-set method: each
//! iteration solves the budget-constrained problem on the currently free assets in closed form
//! (`w ∝ Σ_FF⁻¹·1`), steps towards it until an asset hits zero, and releases pinned assets whose
//! KKT multiplier turns negative. For the small universes this crate works with the loop
//! terminates in a handful of iterations.

use crate::error::{AdvisoryError, CoreResult};
use crate::portfolio::universe::{validate_covariance, validate_returns, AssetUniverse};
use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector, Dyn};
use serde::Serialize;

const DEFAULT_MAX_ITERATIONS: usize = 200;
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;
const STEP_TOLERANCE: f64 = 1e-12;
// Relative to the largest variance in the problem.
const PIVOT_TOLERANCE: f64 = 1e-12;
const KKT_TOLERANCE: f64 = 1e-12;

/// Portfolio weights index-aligned with the asset universe. Non-negative, summing to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationWeights {
    weights: Vec<f64>,
    expected_return: f64,
    volatility: f64,
}

impl AllocationWeights {
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn expected_return(&self) -> f64 {
        self.expected_return
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }
}

#[derive(Debug, Clone)]
pub struct MarkowitzOptimizer {
    universe_size: usize,
    max_iterations: usize,
}

impl MarkowitzOptimizer {
    pub fn new(universe_size: usize) -> Self {
        Self {
            universe_size,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn for_universe(universe: &AssetUniverse) -> Self {
        Self::new(universe.len())
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn optimize_universe(&self, universe: &AssetUniverse) -> CoreResult<AllocationWeights> {
        self.optimize(&universe.expected_returns(), &universe.covariance)
    }

    pub fn optimize(
        &self,
        expected_returns: &[f64],
        covariance: &[Vec<f64>],
    ) -> CoreResult<AllocationWeights> {
        let n = self.universe_size;
        if n == 0 {
            return Err(AdvisoryError::invalid(
                "asset_universe",
                "universe must contain at least one asset",
            ));
        }
        validate_returns(expected_returns, n)?;
        validate_covariance(covariance, n)?;

        let sigma = DMatrix::from_fn(n, n, |i, j| covariance[i][j]);
        let scale = sigma.diagonal().iter().fold(0.0_f64, |m, &v| m.max(v));
        if scale <= 0.0 {
            return Err(AdvisoryError::numerical(
                "covariance",
                "covariance matrix is zero; minimum-variance weights are undefined",
            ));
        }

        let mut w = DVector::from_element(n, 1.0 / n as f64);
        let mut pinned = vec![false; n];

        for iteration in 0..self.max_iterations {
            let free: Vec<usize> = (0..n).filter(|&i| !pinned[i]).collect();
            let target = budget_min_variance(&sigma, &free, scale)?;
            let step = &target - &w;

            if step.amax() <= STEP_TOLERANCE {
                w = target;
                let grad = &sigma * &w;
                let lambda = free.iter().map(|&i| grad[i]).sum::<f64>() / free.len() as f64;
                let release = (0..n)
                    .filter(|&j| pinned[j])
                    .map(|j| (j, grad[j] - lambda))
                    .filter(|&(_, mu)| mu < -KKT_TOLERANCE * scale)
                    .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

                match release {
                    Some((j, _)) => {
                        pinned[j] = false;
                        continue;
                    }
                    None => {
                        tracing::trace!(iterations = iteration + 1, "min-variance solve converged");
                        return finish(w, expected_returns, &sigma);
                    }
                }
            }

            let mut alpha = 1.0;
            let mut blocking = None;
            for &i in &free {
                if step[i] < 0.0 {
                    let ratio = -w[i] / step[i];
                    if ratio < alpha {
                        alpha = ratio;
                        blocking = Some(i);
                    }
                }
            }

            for &i in &free {
                w[i] += alpha * step[i];
            }
            if let Some(i) = blocking {
                w[i] = 0.0;
                pinned[i] = true;
            }
        }

        Err(AdvisoryError::numerical(
            "optimizer",
            format!(
                "active-set solve did not converge within {} iterations",
                self.max_iterations
            ),
        ))
    }
}

/// Closed-form minimum-variance weights over `free` with the budget constraint only.
/// Returns a full-length vector with zeros outside `free`.
fn budget_min_variance(
    sigma: &DMatrix<f64>,
    free: &[usize],
    scale: f64,
) -> CoreResult<DVector<f64>> {
    let k = free.len();
    let sub = DMatrix::from_fn(k, k, |i, j| sigma[(free[i], free[j])]);

    let x = factorize(sub, scale)?.solve(&DVector::from_element(k, 1.0));
    let denom = x.sum();
    if !denom.is_finite() || denom <= 0.0 {
        return Err(AdvisoryError::numerical(
            "min_variance",
            format!("1ᵀΣ⁻¹1 is not positive (got {denom})"),
        ));
    }

    let mut out = DVector::zeros(sigma.nrows());
    for (pos, &i) in free.iter().enumerate() {
        out[i] = x[pos] / denom;
    }
    Ok(out)
}

/// `A = L·Lᵀ`. A failed factorization, or a pivot `L[j][j]²` at or below
/// `PIVOT_TOLERANCE * scale`, is reported as a numerical failure.
fn factorize(a: DMatrix<f64>, scale: f64) -> CoreResult<Cholesky<f64, Dyn>> {
    let chol = a.cholesky().ok_or_else(|| {
        AdvisoryError::numerical(
            "cholesky",
            "covariance is singular or not positive semi-definite",
        )
    })?;

    let tol = PIVOT_TOLERANCE * scale;
    let small = chol
        .l_dirty()
        .diagonal()
        .iter()
        .map(|d| d * d)
        .enumerate()
        .find(|&(_, pivot)| pivot <= tol);
    if let Some((j, pivot)) = small {
        return Err(AdvisoryError::numerical(
            "cholesky",
            format!("covariance is singular or near-singular (pivot {j} = {pivot})"),
        ));
    }

    Ok(chol)
}

fn finish(
    mut w: DVector<f64>,
    expected_returns: &[f64],
    sigma: &DMatrix<f64>,
) -> CoreResult<AllocationWeights> {
    for x in w.iter_mut() {
        if *x < 0.0 {
            *x = 0.0;
        }
    }
    let sum = w.sum();
    if !sum.is_finite() || sum <= 0.0 {
        return Err(AdvisoryError::numerical(
            "renormalize",
            format!("weights sum to {sum}"),
        ));
    }
    w /= sum;

    let total = w.sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE || w.iter().any(|x| !x.is_finite()) {
        return Err(AdvisoryError::numerical(
            "renormalize",
            format!("weights do not sum to 1 (sum={total})"),
        ));
    }

    let expected_return = w.dot(&DVector::from_column_slice(expected_returns));
    let variance = w.dot(&(sigma * &w));

    Ok(AllocationWeights {
        weights: w.iter().copied().collect(),
        expected_return,
        volatility: variance.max(0.0).sqrt(),
    })
}
