use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::promql::LabelFilter;

/// Top-level config loaded from `promdash.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Label that identifies a cluster in this deployment (`cluster`, `k8s_cluster`, ...).
    #[serde(default = "default_cluster_label")]
    pub cluster_label: String,
    #[serde(default = "default_datasource")]
    pub datasource: String,
    #[serde(default = "default_project")]
    pub project: String,
    /// Extra matchers injected into every query of every dashboard.
    #[serde(default)]
    pub extra_filters: Vec<LabelFilter>,
    #[serde(default)]
    pub dashboards: DashboardsConfig,
    /// Named query overrides, keyed by registry name (e.g. `kubernetes.cpu_usage`).
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cluster_label: default_cluster_label(),
            datasource: default_datasource(),
            project: default_project(),
            extra_filters: Vec::new(),
            dashboards: DashboardsConfig::default(),
            overrides: BTreeMap::new(),
        }
    }
}

fn default_cluster_label() -> String {
    "cluster".to_string()
}

fn default_datasource() -> String {
    "prometheus".to_string()
}

fn default_project() -> String {
    "monitoring".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardsConfig {
    #[serde(default = "default_true")]
    pub kubernetes: bool,
    #[serde(default = "default_true")]
    pub blackbox: bool,
    #[serde(default = "default_true")]
    pub otel_collector: bool,
    #[serde(default = "default_true")]
    pub tempo: bool,
}

impl Default for DashboardsConfig {
    fn default() -> Self {
        Self {
            kubernetes: true,
            blackbox: true,
            otel_collector: true,
            tempo: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl CatalogConfig {
    /// Load config from a TOML file. Returns defaults if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: CatalogConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cluster_label.trim().is_empty() {
            return Err(Error::Config("cluster_label must not be empty".to_string()));
        }
        // Matcher values are printed unescaped, so a quote would end the string early.
        if let Some(bad) = self.extra_filters.iter().find(|f| f.value.contains('"')) {
            return Err(Error::Config(format!(
                "extra filter {:?} has a value containing a double quote",
                bad.name
            )));
        }
        if let Some(bad) = self.extra_filters.iter().find(|f| f.is_noop()) {
            tracing::warn!("extra filter {bad:?} has an empty name or value and will be ignored");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = CatalogConfig::load("/nonexistent/promdash.toml").unwrap();
        assert_eq!(config.cluster_label, "cluster");
        assert_eq!(config.datasource, "prometheus");
        assert!(config.dashboards.kubernetes && config.dashboards.tempo);
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = CatalogConfig::from_toml(
            r#"
            cluster_label = "k8s_cluster"
            datasource = "thanos"

            [[extra_filters]]
            name = "env"
            value = "prod"

            [dashboards]
            tempo = false

            [overrides]
            "kubernetes.cpu_usage" = "sum(rate(node_cpu_seconds_total[$__rate_interval]))"
            "#,
        )
        .unwrap();
        assert_eq!(config.cluster_label, "k8s_cluster");
        assert_eq!(config.datasource, "thanos");
        assert_eq!(config.project, "monitoring");
        assert_eq!(config.extra_filters, vec![LabelFilter::equal("env", "prod")]);
        assert!(config.dashboards.kubernetes);
        assert!(!config.dashboards.tempo);
        assert_eq!(config.overrides.len(), 1);
    }

    #[test]
    fn test_empty_cluster_label_is_rejected() {
        let err = CatalogConfig::from_toml(r#"cluster_label = """#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_quoted_filter_value_is_rejected() {
        let err = CatalogConfig::from_toml(
            r#"
            [[extra_filters]]
            name = "team"
            value = 'a"b'
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("team")));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(
            CatalogConfig::from_toml("cluster_label = ["),
            Err(Error::Toml(_))
        ));
    }
}
