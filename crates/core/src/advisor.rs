use crate::config::AdvisoryConfig;
use crate::domain::advisory::{
    currency_amount, rate_to_pct, round_to, AdvisoryRequest, AdvisoryResult, AllocationRow,
};
use crate::domain::projection::{inflation_adjusted_target, project, ProjectionInput};
use crate::domain::risk::{classify, Questionnaire};
use crate::error::{AdvisoryError, CoreResult};
use crate::market::feed::MarketFeed;
use crate::market::signal::{normalize_all, MarketRow, RawSignal};
use crate::portfolio::markowitz::MarkowitzOptimizer;

/// Composes classification, projection, allocation and market normalization into one result.
/// Holds only immutable configuration, so one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Advisor {
    config: AdvisoryConfig,
    optimizer: MarkowitzOptimizer,
}

impl Advisor {
    pub fn new(config: AdvisoryConfig) -> CoreResult<Self> {
        config.validate()?;
        let optimizer = MarkowitzOptimizer::for_universe(&config.universe);
        Ok(Self { config, optimizer })
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// `market` is the outcome of the external feed call. A failed feed never fails the
    /// advisory; it yields an empty market list instead.
    pub fn advise(
        &self,
        request: &AdvisoryRequest,
        market: CoreResult<Vec<RawSignal>>,
    ) -> CoreResult<AdvisoryResult> {
        let questionnaire = Questionnaire::try_new(&request.answers)?;
        let tier = classify(&questionnaire);
        let assumption = self.config.return_assumptions.lookup(tier);

        let horizon_months = request.horizon.to_months()?;
        let projection = project(&ProjectionInput {
            initial_capital: request.initial_capital,
            target_amount: request.target_amount,
            horizon_months,
            monthly_rate: assumption.monthly_rate,
        })?;

        let universe = &self.config.universe;
        let portfolio = self.optimizer.optimize_universe(universe)?;
        let allocation = universe
            .assets
            .iter()
            .zip(portfolio.weights())
            .map(|(asset, &w)| AllocationRow {
                asset_id: asset.id.clone(),
                label: asset.label.clone(),
                weight_pct: round_to(w * 100.0, 1),
                amount: currency_amount(request.initial_capital, w),
            })
            .collect();

        let (market, market_available) = match market {
            Ok(raw) => (normalize_all(&raw), true),
            Err(err) => {
                tracing::warn!(error = %err, "market data unavailable; continuing without it");
                (Vec::new(), false)
            }
        };

        tracing::debug!(
            %tier,
            horizon_months,
            contribution = projection.required_monthly_contribution,
            feasible = projection.is_feasible,
            market_rows = market.len(),
            "advisory computed"
        );

        Ok(AdvisoryResult {
            goal: request.goal.clone(),
            initial_capital: request.initial_capital,
            target_amount: request.target_amount,
            horizon_months,
            questionnaire_total: questionnaire.total(),
            tier,
            tier_label: tier.label().to_string(),
            assumption,
            monthly_return_pct: rate_to_pct(assumption.monthly_rate, 2),
            monthly_inflation_pct: rate_to_pct(assumption.monthly_inflation_rate, 2),
            projection,
            inflation_adjusted_target: inflation_adjusted_target(
                request.target_amount,
                assumption.monthly_inflation_rate,
                horizon_months,
            ),
            allocation,
            portfolio,
            market,
            market_available,
        })
    }

    pub async fn advise_with_feed(
        &self,
        request: &AdvisoryRequest,
        feed: &dyn MarketFeed,
    ) -> CoreResult<AdvisoryResult> {
        let market = fetch_market(feed).await;
        self.advise(request, market)
    }
}

pub async fn fetch_market(feed: &dyn MarketFeed) -> CoreResult<Vec<RawSignal>> {
    feed.fetch_signals()
        .await
        .map_err(|e| AdvisoryError::unavailable(feed.feed_name(), format!("{e:#}")))
}

/// Normalized rows for display, empty when the feed is down.
pub async fn market_rows(feed: &dyn MarketFeed) -> Vec<MarketRow> {
    match fetch_market(feed).await {
        Ok(raw) => normalize_all(&raw),
        Err(err) => {
            tracing::warn!(error = %err, "market data unavailable");
            Vec::new()
        }
    }
}
