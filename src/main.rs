use std::sync::Arc;

use tracing::error;
use tracing_subscriber::EnvFilter;

use riskline::cache::MemoryCache;
use riskline::config::Config;
use riskline::gateway::HttpGateway;
use riskline::types::ProductType;
use riskline::{Result, RiskAssessor};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Assessment failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(postcode), Some(timestamp), Some(product)) =
        (args.next(), args.next(), args.next())
    else {
        eprintln!("usage: riskline <postcode> <YYYY-MM-DD> <BEAUTY|HOME|COMMERCIAL>");
        std::process::exit(2);
    };
    let product: ProductType = product.parse()?;

    let gateway = Arc::new(HttpGateway::new(cfg.request_timeout)?);
    let cache = Arc::new(MemoryCache::new());
    let assessor = RiskAssessor::new(&cfg, gateway, cache);

    let assessment = assessor.assess(&postcode, &timestamp, product).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&assessment).unwrap_or_else(|_| format!("{assessment:?}"))
    );

    Ok(())
}
