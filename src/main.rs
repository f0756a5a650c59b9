use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use promdash::config::CatalogConfig;
use promdash::dashboards::{self, CatalogContext};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("promdash=info")),
        )
        .init();

    let config_path =
        std::env::var("PROMDASH_CONFIG").unwrap_or_else(|_| "./promdash.toml".to_string());
    let out_dir = PathBuf::from(
        std::env::var("PROMDASH_OUT_DIR").unwrap_or_else(|_| "./build/dashboards".to_string()),
    );

    let config = CatalogConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    let ctx = CatalogContext::from_config(&config).context("invalid query overrides")?;
    for (name, _) in ctx.registry.overrides() {
        tracing::info!("using overridden query {name}");
    }

    let catalog = dashboards::build_catalog(&ctx, &config.dashboards)?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    for dashboard in &catalog {
        let path = out_dir.join(format!("{}.json", dashboard.name));
        let json = serde_json::to_string_pretty(dashboard)?;
        std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(
            "wrote {} ({} queries)",
            path.display(),
            dashboard.queries().count()
        );
    }

    tracing::info!("rendered {} dashboards into {}", catalog.len(), out_dir.display());
    Ok(())
}
