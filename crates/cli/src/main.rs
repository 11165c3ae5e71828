use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sicuan_core::advisor::{fetch_market, Advisor};
use sicuan_core::config::AdvisoryConfig;
use sicuan_core::domain::advisory::AdvisoryRequest;
use sicuan_core::domain::projection::{Horizon, HorizonUnit};
use sicuan_core::error::AdvisoryError;
use sicuan_core::market::feed::HttpJsonMarketFeed;

#[derive(Debug, Parser)]
#[command(name = "sicuan_cli")]
struct Args {
    /// Eight questionnaire answers on the 1-4 scale, comma separated.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    answers: Vec<i32>,

    /// Initial capital in whole currency units.
    #[arg(long)]
    capital: i64,

    /// Goal amount in whole currency units.
    #[arg(long)]
    target: i64,

    #[arg(long)]
    horizon: i64,

    /// years | months (tahun | bulan also accepted).
    #[arg(long, default_value = "years")]
    unit: String,

    #[arg(long)]
    goal: Option<String>,

    /// JSON file overriding the asset universe and return assumptions.
    #[arg(long)]
    config: Option<String>,

    /// Skip the market feed entirely.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = sicuan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => AdvisoryConfig::from_json_file(path)?,
        None => settings.load_advisory_config()?,
    };
    let advisor = Advisor::new(config)?;
    let request = build_request(&args)?;

    let market = if args.offline {
        Ok(Vec::new())
    } else {
        match HttpJsonMarketFeed::from_settings(&settings) {
            Ok(feed) => fetch_market(&feed).await,
            Err(e) => Err(AdvisoryError::unavailable("http_json", format!("{e:#}"))),
        }
    };

    let result = match advisor.advise(&request, market) {
        Ok(result) => result,
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            return Err(err).context("advisory failed");
        }
    };

    tracing::info!(
        tier = %result.tier,
        feasible = result.is_feasible(),
        contribution = result.required_monthly_contribution(),
        "advisory computed"
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn build_request(args: &Args) -> anyhow::Result<AdvisoryRequest> {
    let unit: HorizonUnit = args.unit.parse()?;
    Ok(AdvisoryRequest {
        goal: args.goal.clone(),
        answers: args.answers.clone(),
        initial_capital: args.capital,
        target_amount: args.target,
        horizon: Horizon {
            value: args.horizon,
            unit,
        },
    })
}

fn init_sentry(settings: &sicuan_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
