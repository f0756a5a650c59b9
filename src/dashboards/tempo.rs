use super::CatalogContext;
use crate::error::Result;
use crate::models::dashboard::{Dashboard, Panel, PanelGroup};
use crate::promql::builder::{self, RateTerm};
use crate::promql::LabelFilter;

pub const NAMED_QUERIES: &[(&str, &str)] = &[
    (
        "tempo.p99_latency",
        r#"histogram_quantile(0.99, sum by (le, route) (rate(tempo_request_duration_seconds_bucket{job=~"$job"}[$__rate_interval])))"#,
    ),
    (
        "tempo.p50_latency",
        r#"histogram_quantile(0.5, sum by (le, route) (rate(tempo_request_duration_seconds_bucket{job=~"$job"}[$__rate_interval])))"#,
    ),
    (
        "tempo.compaction_errors",
        r#"sum(increase(tempodb_compaction_errors_total{job=~"$job"}[$__range]))"#,
    ),
    (
        "tempo.live_traces",
        r#"sum by (tenant) (tempo_ingester_live_traces{job=~"$job"})"#,
    ),
];

pub fn overview(ctx: &CatalogContext) -> Result<Dashboard> {
    let job = [LabelFilter::regex("job", "$job")];
    let server_errors = [LabelFilter::regex("status_code", "5..")];

    let errors = builder::error_case_percentage(
        RateTerm::new("tempo_request_duration_seconds_count", &["route"], &server_errors),
        RateTerm::new("tempo_request_duration_seconds_count", &["route"], &[]),
    );

    let requests = PanelGroup::new(
        "Requests",
        vec![
            Panel::new("Request Rate", "reqps").query(
                ctx.builder_query(
                    &builder::sum_by_rate("tempo_request_duration_seconds_count", &["route"], &[]),
                    &job,
                ),
                Some("{{route}}"),
            ),
            Panel::new("Error Percentage", "percent")
                .description("Share of requests answered with a 5xx status.")
                .query(ctx.builder_query(&errors, &job), Some("{{route}}")),
            Panel::new("Latency", "s")
                .query(ctx.named_query("tempo.p99_latency", &[])?, Some("p99 {{route}}"))
                .query(ctx.named_query("tempo.p50_latency", &[])?, Some("p50 {{route}}")),
        ],
    );

    let ingest = PanelGroup::new(
        "Ingest",
        vec![
            Panel::new("Spans Received", "reqps").query(
                ctx.builder_query(
                    &builder::sum_by_rate(
                        "tempo_distributor_spans_received_total",
                        &["tenant"],
                        &[],
                    ),
                    &job,
                ),
                Some("{{tenant}}"),
            ),
            Panel::new("Traces Created", "short").query(
                ctx.builder_query(
                    &builder::sum_by_increase(
                        "tempo_ingester_traces_created_total",
                        &["tenant"],
                        &[],
                    ),
                    &job,
                ),
                Some("{{tenant}}"),
            ),
            Panel::new("Live Traces", "short")
                .query(ctx.named_query("tempo.live_traces", &[])?, Some("{{tenant}}")),
        ],
    );

    let backend = PanelGroup::new(
        "Backend",
        vec![Panel::new("Compaction Errors", "short")
            .query(ctx.named_query("tempo.compaction_errors", &[])?, None)],
    );

    Ok(ctx
        .dashboard("tempo-overview", "Tempo / Overview")
        .with_variable(ctx.variable("job", "Job", "tempo_build_info")?)
        .with_group(requests)
        .with_group(ingest)
        .with_group(backend))
}
