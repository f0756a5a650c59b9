//! The dashboard catalog.
//!
//! Every panel query goes through [`CatalogContext`], which scopes it to the
//! selected cluster (plus any configured extra filters) before it lands in a
//! [`Dashboard`]. Text queries live in the [`QueryRegistry`] under
//! `<dashboard>.<panel>` names so deployments can override them.

pub mod blackbox;
pub mod kubernetes;
pub mod otel_collector;
pub mod tempo;

use promql_parser::parser::Expr;

use crate::config::{CatalogConfig, DashboardsConfig};
use crate::error::Result;
use crate::models::dashboard::{Dashboard, Variable};
use crate::promql::{self, LabelFilter, Query};
use crate::registry::QueryRegistry;

/// Value every cluster matcher points at.
pub const CLUSTER_VARIABLE: &str = "$cluster";

#[derive(Debug, Clone)]
pub struct CatalogContext {
    pub cluster_label: String,
    pub datasource: String,
    pub project: String,
    pub extra_filters: Vec<LabelFilter>,
    pub registry: QueryRegistry,
}

impl CatalogContext {
    pub fn new(cluster_label: impl Into<String>) -> Self {
        let defaults = CatalogConfig::default();
        let mut registry = QueryRegistry::new();
        register_defaults(&mut registry);
        Self {
            cluster_label: cluster_label.into(),
            datasource: defaults.datasource,
            project: defaults.project,
            extra_filters: Vec::new(),
            registry,
        }
    }

    /// Build the context for one render: default queries, then config overrides.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let mut registry = QueryRegistry::new();
        register_defaults(&mut registry);
        for (name, query) in &config.overrides {
            registry.override_query(name, query.as_str())?;
        }
        Ok(Self {
            cluster_label: config.cluster_label.clone(),
            datasource: config.datasource.clone(),
            project: config.project.clone(),
            extra_filters: config.extra_filters.clone(),
            registry,
        })
    }

    pub fn cluster_filter(&self) -> LabelFilter {
        LabelFilter::equal(self.cluster_label.as_str(), CLUSTER_VARIABLE)
    }

    fn scope(&self, extra: &[LabelFilter]) -> Vec<LabelFilter> {
        let mut filters = Vec::with_capacity(1 + self.extra_filters.len() + extra.len());
        filters.push(self.cluster_filter());
        filters.extend(self.extra_filters.iter().cloned());
        filters.extend(extra.iter().cloned());
        filters
    }

    /// Resolve a registry query and scope it to the selected cluster.
    pub fn named_query(&self, name: &str, extra: &[LabelFilter]) -> Result<String> {
        let text = self.registry.get(name)?;
        promql::rewrite(text, &self.scope(extra))
    }

    /// Scope an AST built in code to the selected cluster.
    pub fn builder_query(&self, expr: &Expr, extra: &[LabelFilter]) -> String {
        let mut query = Query::from_expr(expr);
        query.merge_matchers(&self.scope(extra));
        query.to_string()
    }

    pub fn dashboard(&self, name: &str, display_name: &str) -> Dashboard {
        Dashboard::new(name, display_name, self.project.as_str(), self.datasource.as_str())
            .with_variable(self.cluster_variable())
    }

    pub fn cluster_variable(&self) -> Variable {
        Variable {
            name: "cluster".to_string(),
            display_name: "Cluster".to_string(),
            label: self.cluster_label.clone(),
            matcher_query: "up".to_string(),
        }
    }

    /// A variable whose values come from `series`, restricted to the selected cluster.
    pub fn variable(&self, name: &str, display_name: &str, series: &str) -> Result<Variable> {
        Ok(Variable {
            name: name.to_string(),
            display_name: display_name.to_string(),
            label: name.to_string(),
            matcher_query: promql::rewrite(series, &[self.cluster_filter()])?,
        })
    }
}

/// Register the default text of every named query in the catalog.
pub fn register_defaults(registry: &mut QueryRegistry) {
    let all = [
        kubernetes::NAMED_QUERIES,
        blackbox::NAMED_QUERIES,
        otel_collector::NAMED_QUERIES,
        tempo::NAMED_QUERIES,
    ];
    for (name, query) in all.into_iter().flatten() {
        registry.register(*name, *query);
    }
}

/// Build every enabled dashboard.
pub fn build_catalog(ctx: &CatalogContext, enabled: &DashboardsConfig) -> Result<Vec<Dashboard>> {
    let mut dashboards = Vec::new();
    if enabled.kubernetes {
        dashboards.push(kubernetes::cluster_resources(ctx)?);
    }
    if enabled.blackbox {
        dashboards.push(blackbox::overview(ctx)?);
    }
    if enabled.otel_collector {
        dashboards.push(otel_collector::overview(ctx)?);
    }
    if enabled.tempo {
        dashboards.push(tempo::overview(ctx)?);
    }
    tracing::debug!("built {} dashboards", dashboards.len());
    Ok(dashboards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::promql::matchers::collect_selector_matchers;

    fn assert_cluster_scoped(expr: &str, label: &str) {
        let parsed = Query::parse(expr).unwrap();
        let selectors = collect_selector_matchers(parsed.expr());
        assert!(!selectors.is_empty(), "no selectors in {expr}");
        for matchers in selectors {
            assert!(
                matchers.iter().any(|m| m.name == label && m.value == CLUSTER_VARIABLE),
                "selector without {label} in {expr}"
            );
        }
    }

    #[test]
    fn test_every_default_query_parses() {
        let ctx = CatalogContext::new("cluster");
        for name in ctx.registry.names() {
            ctx.named_query(name, &[]).unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }

    #[test]
    fn test_catalog_scopes_every_query_to_the_cluster() {
        let ctx = CatalogContext::new("k8s_cluster");
        let dashboards = build_catalog(&ctx, &DashboardsConfig::default()).unwrap();
        assert_eq!(dashboards.len(), 4);
        for dashboard in &dashboards {
            assert_eq!(dashboard.variables[0].label, "k8s_cluster");
            for query in dashboard.queries() {
                assert_cluster_scoped(&query.expr, "k8s_cluster");
            }
        }
    }

    #[test]
    fn test_disabled_dashboards_are_skipped() {
        let ctx = CatalogContext::new("cluster");
        let enabled = DashboardsConfig {
            kubernetes: false,
            blackbox: true,
            otel_collector: false,
            tempo: false,
        };
        let dashboards = build_catalog(&ctx, &enabled).unwrap();
        assert_eq!(dashboards.len(), 1);
        assert_eq!(dashboards[0].name, "blackbox-exporter");
    }

    #[test]
    fn test_overrides_flow_into_dashboards() {
        let mut config = CatalogConfig::default();
        config.overrides.insert(
            "blackbox.probe_success".to_string(),
            "min(probe_success)".to_string(),
        );
        let ctx = CatalogContext::from_config(&config).unwrap();
        let out = ctx.named_query("blackbox.probe_success", &[]).unwrap();
        assert_eq!(out, r#"min(probe_success{cluster="$cluster"})"#);
    }

    #[test]
    fn test_unknown_override_fails_the_render() {
        let mut config = CatalogConfig::default();
        config.overrides.insert("nope".to_string(), "up".to_string());
        assert!(matches!(
            CatalogContext::from_config(&config),
            Err(Error::UnknownQuery(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_broken_override_surfaces_parse_error() {
        let mut config = CatalogConfig::default();
        config.overrides.insert("tempo.p99_latency".to_string(), "sum(".to_string());
        let ctx = CatalogContext::from_config(&config).unwrap();
        let enabled = DashboardsConfig::default();
        assert!(matches!(build_catalog(&ctx, &enabled), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_extra_filters_follow_the_cluster_filter() {
        let mut ctx = CatalogContext::new("cluster");
        ctx.extra_filters.push(LabelFilter::equal("env", "prod"));
        let out = ctx.builder_query(&promql::builder::sum_by("up", &[], &[]), &[]);
        assert_eq!(out, r#"sum(up{cluster="$cluster",env="prod"})"#);
    }

    #[test]
    fn test_catalog_json_is_stable() {
        let ctx = CatalogContext::new("cluster");
        let enabled = DashboardsConfig::default();
        let first = serde_json::to_string(&build_catalog(&ctx, &enabled).unwrap()).unwrap();
        let second = serde_json::to_string(&build_catalog(&ctx, &enabled).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
