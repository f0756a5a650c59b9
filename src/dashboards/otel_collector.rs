use super::CatalogContext;
use crate::error::Result;
use crate::models::dashboard::{Dashboard, Panel, PanelGroup};
use crate::promql::builder::{self, RateTerm};
use crate::promql::LabelFilter;

pub const NAMED_QUERIES: &[(&str, &str)] = &[
    (
        "otel_collector.memory_rss",
        r#"sum by (service_instance_id) (otelcol_process_memory_rss{job=~"$job"})"#,
    ),
    (
        "otel_collector.cpu_seconds",
        r#"sum by (service_instance_id) (rate(otelcol_process_cpu_seconds{job=~"$job"}[$__rate_interval]))"#,
    ),
    (
        "otel_collector.uptime",
        r#"max by (service_instance_id) (otelcol_process_uptime{job=~"$job"})"#,
    ),
];

pub fn overview(ctx: &CatalogContext) -> Result<Dashboard> {
    let job = [LabelFilter::regex("job", "$job")];

    let receivers = PanelGroup::new(
        "Receivers",
        vec![
            Panel::new("Accepted Spans", "reqps").query(
                ctx.builder_query(
                    &builder::sum_by_rate("otelcol_receiver_accepted_spans", &["receiver"], &[]),
                    &job,
                ),
                Some("{{receiver}}"),
            ),
            Panel::new("Refused Spans", "reqps").query(
                ctx.builder_query(
                    &builder::sum_by_rate("otelcol_receiver_refused_spans", &["receiver"], &[]),
                    &job,
                ),
                Some("{{receiver}}"),
            ),
            Panel::new("Accepted Metric Points", "reqps").query(
                ctx.builder_query(
                    &builder::sum_by_rate(
                        "otelcol_receiver_accepted_metric_points",
                        &["receiver"],
                        &[],
                    ),
                    &job,
                ),
                Some("{{receiver}}"),
            ),
        ],
    );

    let failed_percentage = builder::error_case_percentage(
        RateTerm::new("otelcol_exporter_send_failed_spans", &["exporter"], &[]),
        RateTerm::new("otelcol_exporter_sent_spans", &["exporter"], &[]),
    );

    let exporters = PanelGroup::new(
        "Exporters",
        vec![
            Panel::new("Sent Spans", "short").query(
                ctx.builder_query(
                    &builder::sum_by_increase("otelcol_exporter_sent_spans", &["exporter"], &[]),
                    &job,
                ),
                Some("{{exporter}}"),
            ),
            Panel::new("Failed Span Percentage", "percent")
                .query(ctx.builder_query(&failed_percentage, &job), Some("{{exporter}}")),
            Panel::new("Queue Size", "short")
                .query(
                    ctx.builder_query(
                        &builder::max_by("otelcol_exporter_queue_size", &["exporter"], &[]),
                        &job,
                    ),
                    Some("{{exporter}} size"),
                )
                .query(
                    ctx.builder_query(
                        &builder::max_by("otelcol_exporter_queue_capacity", &["exporter"], &[]),
                        &job,
                    ),
                    Some("{{exporter}} capacity"),
                ),
        ],
    );

    let process = PanelGroup::new(
        "Process",
        vec![
            Panel::new("Memory RSS", "bytes").query(
                ctx.named_query("otel_collector.memory_rss", &[])?,
                Some("{{service_instance_id}}"),
            ),
            Panel::new("CPU", "cores").query(
                ctx.named_query("otel_collector.cpu_seconds", &[])?,
                Some("{{service_instance_id}}"),
            ),
            Panel::new("Uptime", "s").query(
                ctx.named_query("otel_collector.uptime", &[])?,
                Some("{{service_instance_id}}"),
            ),
        ],
    );

    Ok(ctx
        .dashboard("opentelemetry-collector", "OpenTelemetry Collector / Overview")
        .with_variable(ctx.variable("job", "Job", "otelcol_process_uptime")?)
        .with_group(receivers)
        .with_group(exporters)
        .with_group(process))
}
