use super::CatalogContext;
use crate::error::Result;
use crate::models::dashboard::{Dashboard, Panel, PanelGroup};
use crate::promql::builder;
use crate::promql::LabelFilter;

pub const NAMED_QUERIES: &[(&str, &str)] = &[
    (
        "blackbox.probe_success",
        r#"probe_success{instance=~"$instance",job=~"$job"}"#,
    ),
    (
        "blackbox.uptime",
        r#"avg_over_time(probe_success{instance=~"$instance",job=~"$job"}[$__range]) * 100"#,
    ),
    (
        "blackbox.ssl_expiry",
        r#"min by (instance) (probe_ssl_earliest_cert_expiry{job=~"$job"}) - time()"#,
    ),
    (
        "blackbox.probe_phases",
        r#"sum by (phase) (probe_http_duration_seconds{instance=~"$instance",job=~"$job"})"#,
    ),
];

pub fn overview(ctx: &CatalogContext) -> Result<Dashboard> {
    let scope = [
        LabelFilter::regex("job", "$job"),
        LabelFilter::regex("instance", "$instance"),
    ];

    let status = PanelGroup::new(
        "Status",
        vec![
            Panel::new("Probe Success", "bool_yes_no").query(
                ctx.named_query("blackbox.probe_success", &[])?,
                Some("{{instance}}"),
            ),
            Panel::new("Uptime", "percent")
                .description("Share of successful probes over the dashboard time range.")
                .query(ctx.named_query("blackbox.uptime", &[])?, Some("{{instance}}")),
            Panel::new("SSL Certificate Expiry", "s").query(
                ctx.named_query("blackbox.ssl_expiry", &[])?,
                Some("{{instance}}"),
            ),
        ],
    );

    let timings = PanelGroup::new(
        "Timings",
        vec![
            Panel::new("Probe Duration", "s").query(
                ctx.builder_query(
                    &builder::max_by("probe_duration_seconds", &["instance"], &[]),
                    &scope,
                ),
                Some("{{instance}}"),
            ),
            Panel::new("DNS Lookup", "s").query(
                ctx.builder_query(
                    &builder::avg_by("probe_dns_lookup_time_seconds", &["instance"], &[]),
                    &scope,
                ),
                Some("{{instance}}"),
            ),
            Panel::new("HTTP Phases", "s")
                .query(ctx.named_query("blackbox.probe_phases", &[])?, Some("{{phase}}")),
            Panel::new("HTTP Status Code", "short").query(
                ctx.builder_query(
                    &builder::min_by("probe_http_status_code", &["instance"], &[]),
                    &scope,
                ),
                Some("{{instance}}"),
            ),
        ],
    );

    Ok(ctx
        .dashboard("blackbox-exporter", "Blackbox Exporter / Overview")
        .with_variable(ctx.variable("job", "Job", "probe_success")?)
        .with_variable(ctx.variable("instance", "Instance", r#"probe_success{job=~"$job"}"#)?)
        .with_group(status)
        .with_group(timings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_keeps_range_token() {
        let ctx = CatalogContext::new("cluster");
        let out = ctx.named_query("blackbox.uptime", &[]).unwrap();
        assert_eq!(
            out,
            r#"avg_over_time(probe_success{cluster="$cluster",instance=~"$instance",job=~"$job"}[$__range]) * 100"#
        );
    }

    #[test]
    fn test_builder_panels_use_regex_scope() {
        let ctx = CatalogContext::new("cluster");
        let dashboard = overview(&ctx).unwrap();
        let duration = &dashboard.panel_groups[1].panels[0].queries[0].expr;
        assert_eq!(
            duration,
            r#"max by (instance) (probe_duration_seconds{cluster="$cluster",instance=~"$instance",job=~"$job"})"#
        );
    }
}
