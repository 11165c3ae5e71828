pub mod advisor;
pub mod domain;
pub mod error;
pub mod market;
pub mod portfolio;

pub mod config {
    use crate::domain::assumptions::ReturnAssumptionTable;
    use crate::error::CoreResult;
    use crate::portfolio::universe::AssetUniverse;
    use anyhow::Context;
    use serde::{Deserialize, Serialize};
    use std::path::Path;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_feed_base_url: Option<String>,
        pub market_feed_api_key: Option<String>,
        pub advisory_config_path: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                market_feed_base_url: std::env::var("MARKET_FEED_BASE_URL").ok(),
                market_feed_api_key: std::env::var("MARKET_FEED_API_KEY").ok(),
                advisory_config_path: std::env::var("ADVISORY_CONFIG_PATH").ok(),
            })
        }

        pub fn require_market_feed_base_url(&self) -> anyhow::Result<&str> {
            self.market_feed_base_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .context("MARKET_FEED_BASE_URL is required")
        }

        /// Built-in assumptions unless `ADVISORY_CONFIG_PATH` points at an override file.
        pub fn load_advisory_config(&self) -> anyhow::Result<AdvisoryConfig> {
            match self.advisory_config_path.as_deref() {
                Some(path) if !path.trim().is_empty() => AdvisoryConfig::from_json_file(path),
                _ => Ok(AdvisoryConfig::default()),
            }
        }
    }

    /// Immutable per-process inputs to every advisory: the asset universe and the return
    /// assumptions per risk tier.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct AdvisoryConfig {
        pub universe: AssetUniverse,
        pub return_assumptions: ReturnAssumptionTable,
    }

    impl AdvisoryConfig {
        pub fn validate(&self) -> CoreResult<()> {
            self.universe.validate()?;
            self.return_assumptions.validate()
        }

        pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read advisory config {}", path.display()))?;
            let config = serde_json::from_str::<Self>(&text)
                .with_context(|| format!("advisory config {} is not valid JSON", path.display()))?;
            config
                .validate()
                .with_context(|| format!("advisory config {} failed validation", path.display()))?;
            Ok(config)
        }
    }

}
